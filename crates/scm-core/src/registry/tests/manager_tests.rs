use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::kernel::component::{Component, Configurable, ResolvedModule};
use crate::kernel::error::{Error, Result};
use crate::logger::{DefaultLogger, LogLevel, Logger};
use crate::registry::ComponentManager;

type Events = Arc<Mutex<Vec<String>>>;

/// Component recording its lifecycle calls into a shared list
#[derive(Debug)]
struct Tracked {
    name: String,
    deps: Vec<String>,
    events: Events,
    fail_init: bool,
}

impl Tracked {
    fn new(name: &str, deps: &[&str], events: &Events) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            events: Arc::clone(events),
            fail_init: false,
        })
    }

    fn failing(name: &str, events: &Events) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            deps: Vec::new(),
            events: Arc::clone(events),
            fail_init: true,
        })
    }
}

#[async_trait]
impl Component for Tracked {
    fn dependencies(&self) -> Vec<String> {
        self.deps.clone()
    }

    async fn init(&self) -> Result<()> {
        if self.fail_init {
            return Err(Error::component(&self.name, "refused to start"));
        }
        self.events.lock().unwrap().push(format!("init:{}", self.name));
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.events.lock().unwrap().push(format!("shutdown:{}", self.name));
        Ok(())
    }
}

/// Configurable component with a fixed feature list
#[derive(Debug, Default)]
struct Dial {
    applied: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl Component for Dial {
    fn configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }
}

#[async_trait]
impl Configurable for Dial {
    fn features(&self) -> Option<Vec<String>> {
        Some(vec!["volume".to_string(), "fail".to_string()])
    }

    async fn config(&self, feature: &str, value: Value) -> Result<Value> {
        if feature == "fail" {
            return Err(Error::component("dial", "cannot fail on demand"));
        }
        self.applied.lock().unwrap().push((feature.to_string(), value.clone()));
        Ok(json!({ "ok": value }))
    }
}

/// Component without any optional capability
#[derive(Debug)]
struct Inert;

impl Component for Inert {}

fn events() -> Events {
    Arc::new(Mutex::new(Vec::new()))
}

fn manager_with_generic() -> ComponentManager {
    let mut manager = ComponentManager::new();
    manager.register_type("gizmo", |_: &dyn Component| true).unwrap();
    manager
}

#[test]
fn test_register_and_get_same_instance() {
    let mut manager = manager_with_generic();
    let component: Arc<dyn Component> = Arc::new(Inert);
    manager.register("thing", "gizmo", Arc::clone(&component)).unwrap();

    let found = manager.get("thing").unwrap().expect("registered");
    assert!(Arc::ptr_eq(&found, &component));
    assert_eq!(manager.type_of("thing"), Some("gizmo"));
    assert!(manager.get_concrete::<Inert>("thing").unwrap().is_some());
    assert!(manager.get_concrete::<Dial>("thing").unwrap().is_none());
}

#[test]
fn test_register_type_then_get_type() {
    let mut manager = ComponentManager::new();
    manager
        .register_type("even", |c: &dyn Component| c.dependencies().len() % 2 == 0)
        .unwrap();

    let validator = manager.get_type("even").unwrap().expect("type registered");
    assert!(validator(&Inert));
    assert!(manager.types().contains("even"));
}

#[test]
fn test_unknown_type_rejected() {
    let mut manager = ComponentManager::new();
    let err = manager.register("thing", "gizmo", Arc::new(Inert)).unwrap_err();
    assert!(matches!(err, Error::TypeNotFound { ref type_name } if type_name == "gizmo"));
    assert!(!manager.contains("thing"));
}

#[test]
fn test_validator_rejection() {
    let mut manager = ComponentManager::new();
    let err = manager.register("logger", "logger", Arc::new(Inert)).unwrap_err();
    assert!(matches!(err, Error::ValidationFailed { .. }));
    assert!(manager.get("logger").unwrap().is_none());
}

#[test]
fn test_empty_arguments_rejected() {
    let mut manager = manager_with_generic();
    assert!(matches!(
        manager.register("", "gizmo", Arc::new(Inert)),
        Err(Error::InvalidArgument { ref argument, .. }) if argument == "name"
    ));
    assert!(matches!(
        manager.register("thing", "", Arc::new(Inert)),
        Err(Error::InvalidArgument { ref argument, .. }) if argument == "type"
    ));
    assert!(matches!(manager.get(""), Err(Error::InvalidArgument { .. })));
    assert!(matches!(manager.get_type(""), Err(Error::InvalidArgument { .. })));
}

#[test]
fn test_get_unknown_is_none() {
    let manager = ComponentManager::new();
    assert!(manager.get("nothing-here").unwrap().is_none());
}

#[test]
fn test_reregistration_overwrites_in_place() {
    let mut manager = manager_with_generic();
    let events = events();
    manager.register("first", "gizmo", Arc::new(Inert)).unwrap();
    manager.register("second", "gizmo", Arc::new(Inert)).unwrap();

    let replacement: Arc<dyn Component> = Tracked::new("first", &[], &events);
    manager.register("first", "generic", Arc::clone(&replacement)).unwrap();

    assert_eq!(manager.len(), 2);
    assert_eq!(manager.component_names(), ["first".to_string(), "second".to_string()]);
    assert!(Arc::ptr_eq(&manager.get("first").unwrap().unwrap(), &replacement));
    assert_eq!(manager.type_of("first"), Some("generic"));
}

#[test]
fn test_register_module_runs_factory() {
    let mut manager = manager_with_generic();
    let module = ResolvedModule::factory(|_| {
        let component: Arc<dyn Component> = Arc::new(Inert);
        Ok(component)
    });
    manager.register_module("made", "gizmo", module).unwrap();
    manager.register_module("given", "gizmo", ResolvedModule::instance(Inert)).unwrap();

    assert_eq!(manager.component_names(), ["made".to_string(), "given".to_string()]);
}

#[test]
fn test_register_module_factory_error_propagates() {
    let mut manager = manager_with_generic();
    let module = ResolvedModule::factory(|_| Err(Error::component("made", "no resources")));
    let err = manager.register_module("made", "gizmo", module).unwrap_err();
    assert!(matches!(err, Error::Component { .. }));
    assert!(manager.is_empty());
}

#[test]
fn test_clear_removes_everything() {
    let mut manager = manager_with_generic();
    manager.register("thing", "gizmo", Arc::new(Inert)).unwrap();

    manager.clear();

    assert!(manager.get("thing").unwrap().is_none());
    assert!(manager.is_empty());
    assert!(manager.get_type("gizmo").unwrap().is_none());
    assert!(manager.get_type("logger").unwrap().is_none());
}

#[tokio::test]
async fn test_config_delegates_to_component() {
    let mut manager = ComponentManager::new();
    let dial = Arc::new(Dial::default());
    manager.register("dial", "generic", dial.clone()).unwrap();

    let result = manager.config("dial", "volume", json!(11)).await.unwrap();

    assert_eq!(result, json!({ "ok": 11 }));
    assert_eq!(*dial.applied.lock().unwrap(), vec![("volume".to_string(), json!(11))]);
}

#[tokio::test]
async fn test_config_errors() {
    let mut manager = ComponentManager::new();
    manager.register("dial", "generic", Arc::new(Dial::default())).unwrap();
    manager.register("inert", "generic", Arc::new(Inert)).unwrap();

    let err = manager.config("missing", "volume", json!(1)).await.unwrap_err();
    assert!(matches!(err, Error::ComponentNotFound { ref name } if name == "missing"));

    let err = manager.config("inert", "volume", json!(1)).await.unwrap_err();
    assert!(matches!(err, Error::ConfigurationNotSupported { ref name } if name == "inert"));

    let err = manager.config("dial", "bass", json!(1)).await.unwrap_err();
    assert!(matches!(err, Error::FeatureNotFound { ref feature, .. } if feature == "bass"));

    let err = manager.config("dial", "fail", json!(1)).await.unwrap_err();
    assert!(matches!(err, Error::Component { .. }), "component errors propagate unchanged");

    let err = manager.config("dial", "", json!(1)).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { ref argument, .. } if argument == "feature"));
}

#[tokio::test]
async fn test_init_orders_by_dependencies() {
    let events = events();
    let mut manager = ComponentManager::new();
    manager.register("A", "generic", Tracked::new("A", &["B"], &events)).unwrap();
    manager.register("B", "generic", Tracked::new("B", &["C"], &events)).unwrap();
    manager.register("C", "generic", Tracked::new("C", &[], &events)).unwrap();

    let report = manager.init().await.unwrap();

    assert_eq!(*events.lock().unwrap(), vec!["init:C", "init:B", "init:A"]);
    assert_eq!(report.order, vec!["C", "B", "A", "logger"]);
    assert_eq!(manager.initialized(), report.initialized.as_slice());
}

#[tokio::test]
async fn test_init_missing_dependency() {
    let events = events();
    let mut manager = ComponentManager::new();
    manager.register("A", "generic", Tracked::new("A", &["B"], &events)).unwrap();

    let err = manager.init().await.unwrap_err();

    match err {
        Error::MissingDependency { dependent, dependency } => {
            assert_eq!(dependent, "A");
            assert_eq!(dependency, "B");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(events.lock().unwrap().is_empty(), "nothing initializes");
}

#[tokio::test]
async fn test_init_cycle() {
    let events = events();
    let mut manager = ComponentManager::new();
    manager.register("A", "generic", Tracked::new("A", &["B"], &events)).unwrap();
    manager.register("B", "generic", Tracked::new("B", &["C"], &events)).unwrap();
    manager.register("C", "generic", Tracked::new("C", &["A"], &events)).unwrap();

    let err = manager.init().await.unwrap_err();

    match &err {
        Error::DependencyCycle { path } => assert_eq!(path, &["A", "B", "C", "A"]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "Dependency cycle detected: A -> B -> C -> A");
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_default_logger_registered_on_init() {
    let mut manager = ComponentManager::new();
    assert!(manager.get("logger").unwrap().is_none());

    manager.init().await.unwrap();

    let logger = manager.get_concrete::<DefaultLogger>("logger").unwrap().expect("default logger");
    assert_eq!(logger.level(), LogLevel::Debug);
    assert_eq!(manager.type_of("logger"), Some("logger"));
    assert!(manager.logger().is_some());

    let level = manager.config("logger", "get-level", Value::Null).await.unwrap();
    assert_eq!(level, json!("debug"));
}

#[tokio::test]
async fn test_configured_logger_is_kept() {
    let mut manager = ComponentManager::new();
    let logger = Arc::new(DefaultLogger::named("custom"));
    logger.set_level(&json!("warn")).unwrap();
    manager.register("logger", "logger", logger.clone()).unwrap();

    manager.init().await.unwrap();

    let registered = manager.get_concrete::<DefaultLogger>("logger").unwrap().unwrap();
    assert!(Arc::ptr_eq(&registered, &logger));
    assert_eq!(manager.len(), 1);

    // The manager's child logger follows the registered logger's level
    manager.config("logger", "set-level", json!("silent")).await.unwrap();
    assert_eq!(logger.level(), LogLevel::Silent);
    let child = manager.create_logger("worker").expect("logger available");
    child.error("not shown");
}

#[tokio::test]
async fn test_init_after_clear_restores_logger_type() {
    let mut manager = ComponentManager::new();
    manager.clear();

    manager.init().await.unwrap();

    assert!(manager.get("logger").unwrap().is_some());
    assert!(manager.get_type("logger").unwrap().is_some());
}

#[tokio::test]
async fn test_init_failure_reports_initialized_prefix() {
    let events = events();
    let mut manager = ComponentManager::new();
    manager.register("A", "generic", Tracked::new("A", &[], &events)).unwrap();
    manager.register("B", "generic", Tracked::failing("B", &events)).unwrap();
    manager.register("C", "generic", Tracked::new("C", &[], &events)).unwrap();

    let err = manager.init().await.unwrap_err();

    match err {
        Error::InitializationFailed { component, initialized, .. } => {
            assert_eq!(component, "B");
            assert_eq!(initialized, vec!["A"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(manager.initialized(), ["A".to_string()]);

    // Only the initialized prefix is shut down
    manager.shutdown().await.unwrap();
    assert_eq!(*events.lock().unwrap(), vec!["init:A", "shutdown:A"]);
}

#[tokio::test]
async fn test_shutdown_in_reverse_order() {
    let events = events();
    let mut manager = ComponentManager::new();
    manager.register("web", "generic", Tracked::new("web", &["db"], &events)).unwrap();
    manager.register("db", "generic", Tracked::new("db", &[], &events)).unwrap();

    manager.init().await.unwrap();
    manager.shutdown().await.unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec!["init:db", "init:web", "shutdown:web", "shutdown:db"]
    );
    assert!(manager.initialized().is_empty());

    // A second shutdown has nothing left to do
    manager.shutdown().await.unwrap();
    assert_eq!(events.lock().unwrap().len(), 4);
}

#[test]
fn test_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = ComponentManager::new();
    assert!(manager.data_dir().is_none());

    manager.set_data_dir(dir.path()).unwrap();
    assert_eq!(manager.data_dir(), Some(dir.path().canonicalize().unwrap().as_path()));

    let err = manager.set_data_dir(dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}
