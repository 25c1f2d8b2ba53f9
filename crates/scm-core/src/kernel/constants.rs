/// Application name
pub const APP_NAME: &str = "scm";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name under which the logger component is always available after `init()`
pub const LOGGER_COMPONENT: &str = "logger";

/// Built-in type for logger components
pub const LOGGER_TYPE: &str = "logger";

/// Built-in type that accepts any component
pub const GENERIC_TYPE: &str = "generic";

/// Logger feature every logger component must list
pub const SET_LEVEL_FEATURE: &str = "set-level";

/// Logger feature returning the current level name
pub const GET_LEVEL_FEATURE: &str = "get-level";

/// Child logger name used by the component manager
pub const MANAGER_LOGGER_NAME: &str = "ComponentManager";

/// Child logger name used by the director
pub const DIRECTOR_LOGGER_NAME: &str = "ComponentDirector";

/// Log target for everything the default logger emits
pub const LOG_TARGET: &str = "scm";

/// Config key for configuration applied before `init()`
pub const PRE_CONFIG_KEY: &str = "pre-config";

/// Config key for configuration applied after `init()`
pub const POST_CONFIG_KEY: &str = "post-config";

/// Configuration directory used when no config file sets one
pub const DEFAULT_CONFIG_DIR: &str = ".";

/// Data directory name, relative to the configuration directory
pub const DATA_DIR_NAME: &str = "data";

/// Directory under the data directory where packages are installed
pub const PACKAGES_DIR: &str = "packages";

/// Manifest file read when a package reference points at a directory
pub const PACKAGE_MANIFEST: &str = "package.json";

/// System-wide configuration file
pub const GLOBAL_CONFIG_FILE: &str = "/etc/scm/config.json";

/// Per-user configuration directory, relative to $HOME
pub const USER_CONFIG_DIR: &str = ".scm";

/// Per-user configuration file name
pub const USER_CONFIG_FILE_NAME: &str = "config.json";

/// Configuration file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "scm-config.json";

/// Package name of the built-in default logger
pub const DEFAULT_LOGGER_PACKAGE: &str = "scm-default-logger";
