//! # SCM Component Registry
//!
//! Everything the [`ComponentManager`] needs to turn a set of registered
//! components into an initialized system:
//!
//! - [`types`]: type names mapped to validators.
//! - [`dependency`]: the "depends-on" graph and its deterministic ordering.
//! - [`initializer`]: sequential `init()`/`shutdown()` over an ordered plan.
//! - [`manager`]: the registry itself, tying the three together.
pub mod dependency;
pub mod initializer;
pub mod manager;
pub mod types;

pub use dependency::{DependencyError, DependencyGraph, DependencyGraphBuilder};
pub use initializer::{InitReport, Initializer};
pub use manager::ComponentManager;
pub use types::{TypeRegistry, Validator};

use crate::kernel::error::{Error, Result};

/// Reject empty (or whitespace-only) names passed to registry operations.
pub(crate) fn ensure_argument(argument: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_argument(argument, "must be a non-empty string"));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
