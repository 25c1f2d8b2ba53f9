use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::kernel::component::Component;
use crate::kernel::constants::{GENERIC_TYPE, LOGGER_TYPE, SET_LEVEL_FEATURE};
use crate::kernel::error::Result;
use crate::registry::ensure_argument;

/// Validation predicate a component must satisfy to be registered under a type.
pub type Validator = Arc<dyn Fn(&dyn Component) -> bool + Send + Sync>;

/// Maps type names to their validators.
#[derive(Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, Validator>,
}

impl TypeRegistry {
    /// Create an empty type registry
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Create a type registry holding the built-in `logger` and `generic` types
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_types();
        registry
    }

    pub fn register_builtin_types(&mut self) {
        self.types.insert(LOGGER_TYPE.to_string(), Arc::new(logger_validator));
        self.types.insert(GENERIC_TYPE.to_string(), Arc::new(|_: &dyn Component| true));
    }

    /// Register `validator` under `name`, replacing any previous entry.
    pub fn register_type<F>(&mut self, name: &str, validator: F) -> Result<()>
    where
        F: Fn(&dyn Component) -> bool + Send + Sync + 'static,
    {
        self.register_validator(name, Arc::new(validator))
    }

    /// Register an already shared validator under `name`.
    pub fn register_validator(&mut self, name: &str, validator: Validator) -> Result<()> {
        ensure_argument("type_name", name)?;
        log::trace!("registering type: \"{}\"", name);
        self.types.insert(name.to_string(), validator);
        Ok(())
    }

    pub fn get_type(&self, name: &str) -> Result<Option<Validator>> {
        ensure_argument("type_name", name)?;
        Ok(self.types.get(name).cloned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn clear(&mut self) {
        self.types.clear();
    }
}

impl Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

/// Built-in validator for the `logger` type: the component must expose the
/// logger capability and list the `set-level` feature.
pub fn logger_validator(component: &dyn Component) -> bool {
    component
        .as_logger()
        .is_some_and(|logger| logger.features().iter().any(|f| f == SET_LEVEL_FEATURE))
}
