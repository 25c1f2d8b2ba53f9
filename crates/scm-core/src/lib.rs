pub mod config;
pub mod director;
pub mod kernel;
pub mod logger;
pub mod registry;

// Registry building blocks, also reachable at the crate root
pub use registry::{dependency, initializer, types};

pub use config::{ConfigFile, ConfigLoader, Id, ScmConfig};
pub use director::{ComponentDirector, SharedDirector};
pub use kernel::component::{Component, ComponentFactory, Configurable, ResolvedModule};
pub use kernel::error::{Error, Result};
pub use logger::{DefaultLogger, LogLevel, Logger};
pub use registry::{ComponentManager, DependencyGraph, InitReport};
