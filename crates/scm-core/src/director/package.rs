use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::director::descriptor::ComponentDescriptor;
use crate::kernel::component::{Component, ResolvedModule};
use crate::kernel::constants::{DEFAULT_LOGGER_PACKAGE, PACKAGE_MANIFEST};
use crate::kernel::error::{Error, Result};
use crate::logger::DefaultLogger;

/// Turns a package reference from the configuration into a package name.
pub trait PackageResolver: Send + Sync + Debug {
    /// `base_dir` is where relative directory references are looked up.
    fn resolve(&self, package: &str, base_dir: &Path) -> String;
}

/// Resolution rules:
/// - `http(s)://…/x.tgz` and `…/x.tgz` resolve to `x`;
/// - a directory with a `package.json` resolves to its `name`;
/// - the empty reference means the base directory itself;
/// - anything else is already a package name.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPackageResolver;

#[derive(Deserialize)]
struct PackageManifest {
    name: String,
}

impl DefaultPackageResolver {
    fn tarball_name(reference: &str) -> Option<String> {
        let stem = reference.strip_suffix(".tgz")?;
        let stem = stem.split_once("://").map_or(stem, |(_, rest)| rest);
        stem.rsplit('/').next().filter(|s| !s.is_empty()).map(str::to_string)
    }

    fn manifest_name(dir: &Path) -> Option<String> {
        let data = std::fs::read_to_string(dir.join(PACKAGE_MANIFEST)).ok()?;
        serde_json::from_str::<PackageManifest>(&data).ok().map(|m| m.name)
    }
}

impl PackageResolver for DefaultPackageResolver {
    fn resolve(&self, package: &str, base_dir: &Path) -> String {
        if let Some(name) = Self::tarball_name(package) {
            return name;
        }
        let reference = if package.is_empty() { "." } else { package };
        Self::manifest_name(&base_dir.join(reference)).unwrap_or_else(|| reference.to_string())
    }
}

/// User and group an installation runs as; unset ids are inherited.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InstallOwner {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

/// Fetches packages into the data directory.
#[async_trait]
pub trait PackageInstaller: Send + Sync + Debug {
    async fn install(&self, data_dir: &Path, packages: &[String], owner: InstallOwner) -> Result<()>;
}

/// Installer that does nothing; packages are expected to be available already.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInstaller;

#[async_trait]
impl PackageInstaller for NoopInstaller {
    async fn install(&self, _data_dir: &Path, packages: &[String], _owner: InstallOwner) -> Result<()> {
        log::debug!("skipping installation of {} package(s)", packages.len());
        Ok(())
    }
}

/// Runs an external package manager as
/// `<program> [args…] --prefix <data_dir> install <packages…>`.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandInstaller {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra arguments placed before `--prefix`
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, data_dir: &Path, packages: &[String], owner: InstallOwner) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--prefix")
            .arg(data_dir)
            .arg("install")
            .args(packages);
        #[cfg(unix)]
        {
            if let Some(uid) = owner.uid {
                command.uid(uid);
            }
            if let Some(gid) = owner.gid {
                command.gid(gid);
            }
        }
        #[cfg(not(unix))]
        let _ = owner;
        command
    }
}

#[async_trait]
impl PackageInstaller for CommandInstaller {
    async fn install(&self, data_dir: &Path, packages: &[String], owner: InstallOwner) -> Result<()> {
        log::info!("Updating components:\n\t{}", packages.join("\n\t"));

        let output = self
            .command(data_dir, packages, owner)
            .output()
            .await
            .map_err(|e| Error::Install {
                message: format!("failed to run {}: {}", self.program.display(), e),
            })?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::Install {
            message: format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            ),
        })
    }
}

/// Produces the module backing a component.
pub trait ComponentLoader: Send + Sync + Debug {
    fn load(&self, descriptor: &ComponentDescriptor) -> Result<ResolvedModule>;
}

type ModuleProvider = Arc<dyn Fn(&ComponentDescriptor) -> ResolvedModule + Send + Sync>;

/// Loader backed by packages the host application registered up front.
#[derive(Default, Clone)]
pub struct StaticLoader {
    packages: HashMap<String, ModuleProvider>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that already knows the `scm-default-logger` package.
    pub fn with_builtin_packages() -> Self {
        let mut loader = Self::new();
        loader.register_package(DEFAULT_LOGGER_PACKAGE, |_| {
            ResolvedModule::factory(|_| {
                let logger: Arc<dyn Component> = Arc::new(DefaultLogger::new());
                Ok(logger)
            })
        });
        loader
    }

    /// Register the provider for `package`. It is called once per component
    /// that uses the package, with that component's descriptor.
    pub fn register_package<F>(&mut self, package: &str, provider: F)
    where
        F: Fn(&ComponentDescriptor) -> ResolvedModule + Send + Sync + 'static,
    {
        self.packages.insert(package.to_string(), Arc::new(provider));
    }

    pub fn contains(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }
}

impl Debug for StaticLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.packages.keys().collect();
        names.sort();
        f.debug_struct("StaticLoader").field("packages", &names).finish()
    }
}

impl ComponentLoader for StaticLoader {
    fn load(&self, descriptor: &ComponentDescriptor) -> Result<ResolvedModule> {
        let provider = self
            .packages
            .get(&descriptor.package_name)
            .or_else(|| self.packages.get(&descriptor.package))
            .ok_or_else(|| Error::PackageNotFound {
                package: descriptor.package_name.clone(),
                component: descriptor.name.clone(),
            })?;
        Ok(provider(descriptor))
    }
}
