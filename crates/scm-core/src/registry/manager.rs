use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::kernel::component::{Component, ResolvedModule, downcast_component};
use crate::kernel::constants::{LOGGER_COMPONENT, LOGGER_TYPE, MANAGER_LOGGER_NAME};
use crate::kernel::error::{Error, Result};
use crate::logger::{DefaultLogger, Logger};
use crate::registry::dependency::DependencyGraphBuilder;
use crate::registry::ensure_argument;
use crate::registry::initializer::{InitReport, Initializer};
use crate::registry::types::{TypeRegistry, Validator, logger_validator};

/// A component instance together with the type it was registered under.
#[derive(Debug, Clone)]
struct RegisteredComponent {
    type_name: String,
    instance: Arc<dyn Component>,
}

/// Registry of named, typed components and the entry point for initializing
/// them in dependency order.
#[derive(Debug)]
pub struct ComponentManager {
    /// Validators for every known type
    types: TypeRegistry,
    /// Registered components by name
    components: HashMap<String, RegisteredComponent>,
    /// Component names in registration order
    order: Vec<String>,
    /// Components whose `init()` completed during the last `init()` call
    initialized: Vec<String>,
    data_dir: Option<PathBuf>,
    /// Child logger obtained from the `logger` component during `init()`
    log: Option<Arc<dyn Logger>>,
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentManager {
    /// Create a manager with the built-in `logger` and `generic` types.
    pub fn new() -> Self {
        Self {
            types: TypeRegistry::with_builtin_types(),
            components: HashMap::new(),
            order: Vec::new(),
            initialized: Vec::new(),
            data_dir: None,
            log: None,
        }
    }

    /// Register a component type, replacing any existing validator for it.
    pub fn register_type<F>(&mut self, name: &str, validator: F) -> Result<()>
    where
        F: Fn(&dyn Component) -> bool + Send + Sync + 'static,
    {
        self.types.register_type(name, validator)
    }

    pub fn get_type(&self, name: &str) -> Result<Option<Validator>> {
        self.types.get_type(name)
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Register `instance` under `name` as a `type_name` component.
    ///
    /// The instance must pass the type's validator. Registering an existing
    /// name replaces the previous instance but keeps its registration slot.
    pub fn register(&mut self, name: &str, type_name: &str, instance: Arc<dyn Component>) -> Result<()> {
        ensure_argument("name", name)?;
        ensure_argument("type", type_name)?;

        let validator = self.types.get_type(type_name)?.ok_or_else(|| Error::TypeNotFound {
            type_name: type_name.to_string(),
        })?;
        if !validator(&*instance) {
            return Err(Error::ValidationFailed {
                name: name.to_string(),
                type_name: type_name.to_string(),
            });
        }

        let entry = RegisteredComponent {
            type_name: type_name.to_string(),
            instance,
        };
        if self.components.insert(name.to_string(), entry).is_some() {
            log::debug!("replaced component \"{}\" ({})", name, type_name);
        } else {
            self.order.push(name.to_string());
            log::debug!("registered component \"{}\" ({})", name, type_name);
        }
        Ok(())
    }

    /// Resolve a loaded package (running its factory if it has one) and
    /// register the result.
    pub fn register_module(&mut self, name: &str, type_name: &str, module: ResolvedModule) -> Result<()> {
        ensure_argument("name", name)?;
        let instance = module.into_instance(self)?;
        self.register(name, type_name, instance)
    }

    /// Look up a component. An unknown name is `Ok(None)`, not an error.
    pub fn get(&self, name: &str) -> Result<Option<Arc<dyn Component>>> {
        ensure_argument("name", name)?;
        Ok(self.components.get(name).map(|entry| Arc::clone(&entry.instance)))
    }

    /// Look up a component and downcast it to its concrete type.
    pub fn get_concrete<T: Component>(&self, name: &str) -> Result<Option<Arc<T>>> {
        Ok(self.get(name)?.and_then(|component| downcast_component::<T>(&component)))
    }

    /// Type the component was registered under
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.components.get(name).map(|entry| entry.type_name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Registered component names in registration order
    pub fn component_names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Remove every component and every type, built-ins included.
    pub fn clear(&mut self) {
        self.types.clear();
        self.components.clear();
        self.order.clear();
        self.initialized.clear();
        self.log = None;
    }

    /// Apply a configuration `feature` to the component registered as `name`.
    pub async fn config(&self, name: &str, feature: &str, value: Value) -> Result<Value> {
        ensure_argument("name", name)?;
        ensure_argument("feature", feature)?;

        let component = self.get(name)?.ok_or_else(|| Error::ComponentNotFound {
            name: name.to_string(),
        })?;
        let configurable = component
            .configurable()
            .ok_or_else(|| Error::ConfigurationNotSupported { name: name.to_string() })?;

        if let Some(features) = configurable.features() {
            if !features.iter().any(|f| f == feature) {
                return Err(Error::FeatureNotFound {
                    name: name.to_string(),
                    feature: feature.to_string(),
                });
            }
        }

        log::trace!("configuring \"{}\": {} = {}", name, feature, value);
        configurable.config(feature, value).await
    }

    /// Set the data directory handed to component factories.
    pub fn set_data_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let resolved = std::fs::canonicalize(dir)
            .map_err(|e| Error::io(e, "resolve data directory", dir))?;
        self.data_dir = Some(resolved);
        Ok(())
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// The manager's own logger, available once `init()` has run.
    pub fn logger(&self) -> Option<Arc<dyn Logger>> {
        self.log.clone()
    }

    /// Child logger named `name` from the registered `logger` component.
    pub fn create_logger(&self, name: &str) -> Option<Arc<dyn Logger>> {
        let entry = self.components.get(LOGGER_COMPONENT)?;
        entry.instance.as_logger().map(|logger| logger.create(name))
    }

    /// Components whose `init()` completed during the last `init()` call.
    pub fn initialized(&self) -> &[String] {
        &self.initialized
    }

    /// Initialize every registered component in dependency order.
    ///
    /// Registers a [`DefaultLogger`] first when no `logger` component exists.
    /// On failure the returned [`Error::InitializationFailed`] lists the
    /// components that did initialize; they stay initialized and are covered
    /// by a later [`shutdown`](Self::shutdown).
    pub async fn init(&mut self) -> Result<InitReport> {
        self.ensure_logger()?;
        self.log = self.create_logger(MANAGER_LOGGER_NAME);

        let mut builder = DependencyGraphBuilder::new();
        for name in &self.order {
            if let Some(entry) = self.components.get(name) {
                builder.add_component(name, entry.instance.dependencies());
            }
        }
        let graph = builder.build()?;
        let order = graph.overall_order()?;

        if let Some(log) = &self.log {
            log.debug(&format!("initialization order: {}", order.join(", ")));
        }

        let plan = self.plan(&order);
        let initializer = match &self.log {
            Some(log) => Initializer::with_logger(Arc::clone(log)),
            None => Initializer::new(),
        };

        match initializer.run(&plan).await {
            Ok(report) => {
                self.initialized = report.initialized.clone();
                Ok(report)
            }
            Err(err) => {
                if let Error::InitializationFailed { initialized, .. } = &err {
                    self.initialized = initialized.clone();
                }
                Err(err)
            }
        }
    }

    /// Shut down initialized components in reverse initialization order.
    pub async fn shutdown(&mut self) -> Result<()> {
        let names = std::mem::take(&mut self.initialized);
        let plan = self.plan(&names);
        let initializer = match &self.log {
            Some(log) => Initializer::with_logger(Arc::clone(log)),
            None => Initializer::new(),
        };
        initializer.shutdown(&plan).await
    }

    fn ensure_logger(&mut self) -> Result<()> {
        if self.components.contains_key(LOGGER_COMPONENT) {
            return Ok(());
        }
        if !self.types.contains(LOGGER_TYPE) {
            self.types.register_validator(LOGGER_TYPE, Arc::new(logger_validator))?;
        }
        log::debug!("no logger configured, registering the default logger");
        self.register(LOGGER_COMPONENT, LOGGER_TYPE, Arc::new(DefaultLogger::named(LOGGER_COMPONENT)))
    }

    fn plan(&self, names: &[String]) -> Vec<(String, Arc<dyn Component>)> {
        names
            .iter()
            .filter_map(|name| {
                self.components
                    .get(name)
                    .map(|entry| (name.clone(), Arc::clone(&entry.instance)))
            })
            .collect()
    }
}
