use std::fmt;
use std::path::PathBuf;

use semver::VersionReq;
use serde_json::{Map, Value};

use crate::kernel::constants::{POST_CONFIG_KEY, PRE_CONFIG_KEY};
use crate::kernel::error::{Error, Result};

/// A single `feature: value` pair from a component's configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub feature: String,
    pub value: Value,
}

/// When a component's configuration entries are applied relative to `init()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPhase {
    Pre,
    Post,
}

impl ConfigPhase {
    /// Key holding this phase's entries in a component descriptor
    pub fn key(&self) -> &'static str {
        match self {
            ConfigPhase::Pre => PRE_CONFIG_KEY,
            ConfigPhase::Post => POST_CONFIG_KEY,
        }
    }
}

impl fmt::Display for ConfigPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A validated component entry from the configuration.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    pub name: String,
    pub component_type: String,
    /// Package reference as written in the configuration
    pub package: String,
    pub pre_config: Vec<ConfigEntry>,
    pub post_config: Vec<ConfigEntry>,
    /// Package name, without any version requirement
    pub package_name: String,
    /// Requirement from a `name@requirement` package name
    pub version_req: Option<VersionReq>,
    /// Where the package lives once installed
    pub package_path: PathBuf,
}

impl ComponentDescriptor {
    /// Validate a raw descriptor.
    ///
    /// `name`, `type` and `package` must be strings; `pre-config` and
    /// `post-config`, when present, must be an object or an array of objects.
    /// An explicit `packageName` is kept; otherwise the package name is
    /// resolved later by the director.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(Error::malformed("<unnamed>", "component", "must be an object"));
        };

        let name = required_string(object, "name", "<unnamed>")?;
        let component_type = required_string(object, "type", &name)?;
        let package = required_string(object, "package", &name)?;
        let pre_config = config_entries(object, ConfigPhase::Pre, &name)?;
        let post_config = config_entries(object, ConfigPhase::Post, &name)?;

        let (package_name, version_req) = match object.get("packageName") {
            None | Some(Value::Null) => (String::new(), None),
            Some(Value::String(explicit)) => split_version(explicit, &name)?,
            Some(_) => return Err(Error::malformed(&name, "packageName", "must be a string")),
        };

        Ok(Self {
            name,
            component_type,
            package,
            pre_config,
            post_config,
            package_name,
            version_req,
            package_path: PathBuf::new(),
        })
    }

    /// Configuration entries for `phase`, in declaration order
    pub fn entries(&self, phase: ConfigPhase) -> &[ConfigEntry] {
        match phase {
            ConfigPhase::Pre => &self.pre_config,
            ConfigPhase::Post => &self.post_config,
        }
    }
}

/// Split a `name@requirement` package name into its name and parsed
/// requirement. A leading `@` belongs to a scoped name, not a version.
/// URLs and `user@host:path` references are never split.
pub fn split_version(package_name: &str, component: &str) -> Result<(String, Option<VersionReq>)> {
    if package_name.contains("://") {
        return Ok((package_name.to_string(), None));
    }
    match package_name.rfind('@') {
        Some(pos) if pos > 0 && !package_name[pos + 1..].contains(['/', ':']) => {
            let (name, req) = (&package_name[..pos], &package_name[pos + 1..]);
            let version_req = VersionReq::parse(req).map_err(|e| {
                Error::malformed(component, "package", format!("has invalid version requirement '{}': {}", req, e))
            })?;
            Ok((name.to_string(), Some(version_req)))
        }
        _ => Ok((package_name.to_string(), None)),
    }
}

fn required_string(object: &Map<String, Value>, field: &str, component: &str) -> Result<String> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(Error::malformed(component, field, "must be a string")),
        None => Err(Error::malformed(component, field, "is missing")),
    }
}

fn config_entries(object: &Map<String, Value>, phase: ConfigPhase, component: &str) -> Result<Vec<ConfigEntry>> {
    let field = phase.key();
    match object.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => Ok(object_entries(map)),
        Some(Value::Array(items)) => {
            let mut entries = Vec::new();
            for item in items {
                let map = item
                    .as_object()
                    .ok_or_else(|| Error::malformed(component, field, "has an entry that is not an object"))?;
                entries.extend(object_entries(map));
            }
            Ok(entries)
        }
        Some(_) => Err(Error::malformed(component, field, "must be an array of objects or an object")),
    }
}

fn object_entries(map: &Map<String, Value>) -> Vec<ConfigEntry> {
    map.iter()
        .map(|(feature, value)| ConfigEntry {
            feature: feature.clone(),
            value: value.clone(),
        })
        .collect()
}
