use std::sync::Arc;

use crate::kernel::component::Component;
use crate::kernel::error::{Error, Result};
use crate::logger::Logger;

/// Outcome of a successful initialization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Order computed from the dependency graph
    pub order: Vec<String>,
    /// Components whose `init()` completed, in completion order
    pub initialized: Vec<String>,
}

/// Runs `init()` and `shutdown()` over an already ordered plan.
///
/// Steps are awaited one at a time; no two components are ever initialized
/// concurrently.
#[derive(Debug, Default, Clone)]
pub struct Initializer {
    log: Option<Arc<dyn Logger>>,
}

impl Initializer {
    pub fn new() -> Self {
        Self { log: None }
    }

    pub fn with_logger(log: Arc<dyn Logger>) -> Self {
        Self { log: Some(log) }
    }

    /// Initialize each component in `plan` order.
    ///
    /// Stops at the first failure. The error carries the failing component and
    /// the components initialized before it; nothing is rolled back.
    pub async fn run(&self, plan: &[(String, Arc<dyn Component>)]) -> Result<InitReport> {
        let order: Vec<String> = plan.iter().map(|(name, _)| name.clone()).collect();
        let mut initialized = Vec::with_capacity(plan.len());

        for (name, component) in plan {
            self.debug(&format!("initializing component: {}", name));
            if let Err(source) = component.init().await {
                self.error(&format!("component \"{}\" failed to initialize: {}", name, source));
                return Err(Error::InitializationFailed {
                    component: name.clone(),
                    initialized,
                    source: Box::new(source),
                });
            }
            initialized.push(name.clone());
        }

        Ok(InitReport { order, initialized })
    }

    /// Shut down each component in reverse `plan` order.
    ///
    /// Every component gets its `shutdown()` call even when an earlier one
    /// fails; all failures are returned together.
    pub async fn shutdown(&self, plan: &[(String, Arc<dyn Component>)]) -> Result<()> {
        let mut failures = Vec::new();

        for (name, component) in plan.iter().rev() {
            self.debug(&format!("shutting down component: {}", name));
            if let Err(err) = component.shutdown().await {
                self.error(&format!("component \"{}\" failed to shut down: {}", name, err));
                failures.push((name.clone(), err));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::ShutdownFailed { failures })
        }
    }

    fn debug(&self, message: &str) {
        match &self.log {
            Some(log) => log.debug(message),
            None => log::debug!("{}", message),
        }
    }

    fn error(&self, message: &str) {
        match &self.log {
            Some(log) => log.error(message),
            None => log::error!("{}", message),
        }
    }
}
