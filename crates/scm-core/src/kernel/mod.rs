//! # SCM Core Kernel
//!
//! Shared building blocks for the rest of `scm-core`:
//!
//! - **Component contract**: the [`Component`](component::Component) trait with
//!   its optional capabilities, and [`ResolvedModule`](component::ResolvedModule),
//!   the factory-or-instance value produced by package loading.
//! - **Constants**: names of built-in types, components, and config files.
//! - **Error Handling**: the crate-wide [`Error`](error::Error) type and
//!   `Result` alias.
pub mod component;
pub mod constants;
pub mod error;

pub use component::{Component, ComponentFactory, Configurable, ResolvedModule, downcast_component};
pub use error::{Error, Result};
