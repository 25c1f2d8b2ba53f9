use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::kernel::error::Result;
use crate::logger::Logger;
use crate::registry::ComponentManager;

/// Type-erasure helper so registered components can be downcast again.
///
/// Implemented for every sized `Any + Send + Sync` type; component authors
/// never implement it by hand.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A named, typed unit managed by the [`ComponentManager`].
///
/// Every capability is optional. A component that does not override
/// `configurable()` cannot be configured, one that returns no dependencies is a
/// root of the dependency graph, and the default `init()`/`shutdown()` do
/// nothing.
#[async_trait]
pub trait Component: AsAny + Debug {
    /// Names of the components that must be initialized before this one.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Configuration capability, if the component accepts `config()` calls.
    fn configurable(&self) -> Option<&dyn Configurable> {
        None
    }

    /// Logger capability, required for components registered as `logger`.
    fn as_logger(&self) -> Option<&dyn Logger> {
        None
    }

    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Configuration capability of a component.
#[async_trait]
pub trait Configurable: Send + Sync {
    /// Features accepted by `config()`. `None` means any feature is accepted.
    fn features(&self) -> Option<Vec<String>> {
        None
    }

    /// Apply `value` to `feature`, returning whatever the component reports
    /// back (`Value::Null` when there is nothing to report).
    async fn config(&self, feature: &str, value: Value) -> Result<Value>;
}

/// Builds a component instance, with access to the manager it will live in.
pub type ComponentFactory =
    Box<dyn FnOnce(&ComponentManager) -> Result<Arc<dyn Component>> + Send>;

/// What a package resolves to: a factory to run or a ready-made instance.
pub enum ResolvedModule {
    Factory(ComponentFactory),
    Instance(Arc<dyn Component>),
}

impl ResolvedModule {
    pub fn factory<F>(factory: F) -> Self
    where
        F: FnOnce(&ComponentManager) -> Result<Arc<dyn Component>> + Send + 'static,
    {
        ResolvedModule::Factory(Box::new(factory))
    }

    pub fn instance<C: Component>(component: C) -> Self {
        ResolvedModule::Instance(Arc::new(component))
    }

    /// Collapse the variant into a single instance. Factories run exactly once.
    pub fn into_instance(self, manager: &ComponentManager) -> Result<Arc<dyn Component>> {
        match self {
            ResolvedModule::Factory(factory) => factory(manager),
            ResolvedModule::Instance(instance) => Ok(instance),
        }
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, ResolvedModule::Factory(_))
    }
}

impl Debug for ResolvedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedModule::Factory(_) => f.write_str("ResolvedModule::Factory(..)"),
            ResolvedModule::Instance(instance) => {
                f.debug_tuple("ResolvedModule::Instance").field(instance).finish()
            }
        }
    }
}

/// Downcast a registered component to its concrete type.
pub fn downcast_component<T: Component>(component: &Arc<dyn Component>) -> Option<Arc<T>> {
    AsAny::into_any_arc(Arc::clone(component)).downcast::<T>().ok()
}
