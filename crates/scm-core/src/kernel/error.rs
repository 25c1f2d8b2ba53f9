//! # SCM Kernel Errors
//!
//! Defines the error type shared by every part of `scm-core`.
//!
//! [`Error`] covers argument checks on the registries, registration-time
//! contract violations, configuration-time lookups, dependency resolution,
//! descriptor validation in the director, and failures reported by the
//! components themselves during `init()`/`shutdown()`.
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::registry::dependency::DependencyError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// An argument to a registry operation was empty or otherwise unusable.
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("type not found: {type_name}")]
    TypeNotFound { type_name: String },

    #[error("object not a valid type: {type_name} (component '{name}')")]
    ValidationFailed { name: String, type_name: String },

    #[error("'{name}' is not a valid component name")]
    ComponentNotFound { name: String },

    #[error("configuration of '{name}' not allowed")]
    ConfigurationNotSupported { name: String },

    #[error("feature not found for component '{name}': {feature}")]
    FeatureNotFound { name: String, feature: String },

    #[error("'{dependent}' cannot find dependency '{dependency}'")]
    MissingDependency { dependent: String, dependency: String },

    #[error("Dependency cycle detected: {}", .path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    #[error("component \"{component}\" is malformed: '{field}' {reason}")]
    MalformedComponent {
        component: String,
        field: String,
        reason: String,
    },

    #[error("no loader registered for package '{package}' (component '{component}')")]
    PackageNotFound { package: String, component: String },

    /// A component's `init()` failed. `initialized` lists the components that
    /// completed before it, in initialization order.
    #[error("Initialization of component '{component}' failed (initialized before failure: [{}]): {source}", .initialized.join(", "))]
    InitializationFailed {
        component: String,
        initialized: Vec<String>,
        #[source]
        source: Box<Error>,
    },

    #[error("Shutdown failed for {} component(s): {}", .failures.len(), describe_failures(.failures))]
    ShutdownFailed { failures: Vec<(String, Error)> },

    #[error("Configuration error in '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("I/O error during operation '{operation}' on path '{}': {source}", .path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Package installation failed: {message}")]
    Install { message: String },

    #[error("Privilege change failed: {message}")]
    Privilege { message: String },

    #[error("unknown level while configuring levels: {level}")]
    LoggerLevel { level: String },

    /// Failure reported by a component implementation.
    #[error("Component '{name}' failed: {message}")]
    Component { name: String, message: String },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

fn describe_failures(failures: &[(String, Error)]) -> String {
    failures
        .iter()
        .map(|(name, err)| format!("{}: {}", name, err))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    pub fn io(source: std::io::Error, operation: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::Io {
            source,
            operation: operation.into(),
            path: path.into(),
        }
    }

    pub fn malformed(
        component: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::MalformedComponent {
            component: component.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for component authors.
    pub fn component(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Component {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<DependencyError> for Error {
    fn from(err: DependencyError) -> Self {
        match err {
            DependencyError::MissingDependency { dependent, dependency } => {
                Error::MissingDependency { dependent, dependency }
            }
            DependencyError::Cycle(path) => Error::DependencyCycle { path },
            DependencyError::UnknownNode(name) => Error::ComponentNotFound { name },
        }
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
