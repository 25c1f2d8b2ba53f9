//! # SCM Component Director
//!
//! Drives a complete startup from configuration:
//!
//! 1. merge the loaded configuration files and validate component descriptors;
//! 2. install every distinct package;
//! 3. load and register each component, apply `pre-config`;
//! 4. initialize all components in dependency order, apply `post-config`;
//! 5. hand the data directory over and drop privileges.
//!
//! A process normally runs a single director, reachable through
//! [`ComponentDirector::instance`] until [`ComponentDirector::stop`].
pub mod descriptor;
pub mod package;
pub mod privileges;

use std::path::Path;
use std::sync::{Arc, PoisonError};

use once_cell::sync::Lazy;
use tokio::sync::Mutex;

use crate::config::{ConfigFile, ConfigLoader, ScmConfig};
use crate::kernel::constants::{
    APP_NAME, APP_VERSION, DIRECTOR_LOGGER_NAME, LOGGER_COMPONENT, PACKAGES_DIR,
};
use crate::kernel::error::{Error, Result};
use crate::logger::Logger;
use crate::registry::{ComponentManager, InitReport};

pub use descriptor::{ComponentDescriptor, ConfigEntry, ConfigPhase, split_version};
pub use package::{
    CommandInstaller, ComponentLoader, DefaultPackageResolver, InstallOwner, NoopInstaller,
    PackageInstaller, PackageResolver, StaticLoader,
};
pub use privileges::{PrivilegeManager, ProcessPrivileges, apply_privileges, resolve_ids};

/// Shared handle to a running director
pub type SharedDirector = Arc<Mutex<ComponentDirector>>;

static DIRECTOR: Lazy<std::sync::Mutex<Option<SharedDirector>>> = Lazy::new(|| std::sync::Mutex::new(None));

/// Owns the [`ComponentManager`] and the collaborators used to fill it.
#[derive(Debug)]
pub struct ComponentDirector {
    manager: ComponentManager,
    configs: ConfigLoader,
    config: Option<ScmConfig>,
    descriptors: Vec<ComponentDescriptor>,
    resolver: Arc<dyn PackageResolver>,
    installer: Arc<dyn PackageInstaller>,
    loader: Arc<dyn ComponentLoader>,
    privileges: Arc<dyn PrivilegeManager>,
    log: Option<Arc<dyn Logger>>,
    running: bool,
}

impl ComponentDirector {
    /// Create a director whose first configuration is `initial`.
    ///
    /// Defaults: packages are resolved with [`DefaultPackageResolver`], not
    /// installed ([`NoopInstaller`]), loaded from the built-in
    /// [`StaticLoader`], and privileges are changed on the real process.
    pub fn new(initial: ConfigFile) -> Self {
        Self {
            manager: ComponentManager::new(),
            configs: ConfigLoader::with_config(initial),
            config: None,
            descriptors: Vec::new(),
            resolver: Arc::new(DefaultPackageResolver),
            installer: Arc::new(NoopInstaller),
            loader: Arc::new(StaticLoader::with_builtin_packages()),
            privileges: Arc::new(ProcessPrivileges),
            log: None,
            running: false,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn PackageResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_installer(mut self, installer: Arc<dyn PackageInstaller>) -> Self {
        self.installer = installer;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ComponentLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_privileges(mut self, privileges: Arc<dyn PrivilegeManager>) -> Self {
        self.privileges = privileges;
        self
    }

    /// The process-wide director, created from `config` on first use.
    pub fn instance(config: ConfigFile) -> SharedDirector {
        Self::instance_with(|| Self::new(config))
    }

    /// The process-wide director, created by `make` on first use.
    pub fn instance_with<F>(make: F) -> SharedDirector
    where
        F: FnOnce() -> ComponentDirector,
    {
        let mut slot = DIRECTOR.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slot.get_or_insert_with(|| Arc::new(Mutex::new(make()))))
    }

    /// Whether a process-wide director currently exists
    pub fn is_active() -> bool {
        DIRECTOR.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Create (or reuse) the process-wide director and start it.
    pub async fn launch(config: ConfigFile) -> Result<SharedDirector> {
        let director = Self::instance(config);
        director.lock().await.start().await?;
        Ok(director)
    }

    /// Shut down and release the process-wide director, if there is one.
    pub async fn stop() -> Result<()> {
        let director = DIRECTOR.lock().unwrap_or_else(PoisonError::into_inner).take();
        match director {
            Some(director) => director.lock().await.shutdown().await,
            None => Ok(()),
        }
    }

    /// Load another configuration file; see [`ConfigLoader::load_file`].
    pub fn load_config(&mut self, path: impl AsRef<Path>) -> bool {
        self.configs.load_file(path)
    }

    /// Add an in-memory configuration after the ones already loaded.
    pub fn add_config(&mut self, config: ConfigFile) {
        self.configs.add(config);
    }

    /// Merge the configuration and turn its components into descriptors with
    /// resolved package names and paths.
    pub fn process_config(&mut self) -> Result<&ScmConfig> {
        let config = self.configs.merge()?;
        self.manager.set_data_dir(&config.data_dir)?;

        let mut descriptors = Vec::with_capacity(config.components.len());
        for raw in &config.components {
            let mut descriptor = ComponentDescriptor::from_value(raw)?;
            if descriptor.package_name.is_empty() {
                let resolved = self.resolver.resolve(&descriptor.package, &config.config_dir);
                let (name, version_req) = split_version(&resolved, &descriptor.name)?;
                descriptor.package_name = name;
                descriptor.version_req = version_req;
            }
            descriptor.package_path = config.data_dir.join(PACKAGES_DIR).join(&descriptor.package_name);
            descriptors.push(descriptor);
        }

        self.descriptors = descriptors;
        Ok(self.config.insert(config))
    }

    /// Install every distinct package referenced by the descriptors, as the
    /// configured user and group. The data directory is handed to them first
    /// when both are set. Returns the package references handed to the
    /// installer.
    pub async fn install_components(&self) -> Result<Vec<String>> {
        let config = self.merged_config()?;
        let (uid, gid) = self.ids()?;
        let mut packages: Vec<String> = Vec::new();
        for descriptor in &self.descriptors {
            if !packages.contains(&descriptor.package) {
                packages.push(descriptor.package.clone());
            }
        }
        if packages.is_empty() {
            return Ok(packages);
        }

        if let (Some(uid), Some(gid)) = (uid, gid) {
            self.privileges.chown_recursive(&config.data_dir, uid, gid)?;
        }
        log::info!("installing {} package(s)...", packages.len());
        self.installer
            .install(&config.data_dir, &packages, InstallOwner { uid, gid })
            .await?;
        Ok(packages)
    }

    /// Load and register every component, then configure and initialize them.
    pub async fn init_components(&mut self) -> Result<InitReport> {
        log::info!("loading {} component(s)...", self.descriptors.len());
        for descriptor in &self.descriptors {
            let module = self.loader.load(descriptor)?;
            self.manager
                .register_module(&descriptor.name, &descriptor.component_type, module)?;
        }

        self.apply_config(ConfigPhase::Pre).await?;
        let report = self.manager.init().await?;
        self.apply_config(ConfigPhase::Post).await?;
        Ok(report)
    }

    /// Run the whole startup sequence.
    pub async fn start(&mut self) -> Result<()> {
        log::info!("{} {} starting...", APP_NAME, APP_VERSION);
        self.process_config()?;
        self.install_components().await?;
        self.init_components().await?;

        let config = self.merged_config()?;
        let (uid, gid) = self.ids()?;
        apply_privileges(self.privileges.as_ref(), Some(config.data_dir.as_path()), uid, gid)?;

        let log = self
            .manager
            .create_logger(DIRECTOR_LOGGER_NAME)
            .ok_or_else(|| Error::ComponentNotFound {
                name: LOGGER_COMPONENT.to_string(),
            })?;
        log.debug("Started ComponentDirector.");
        self.log = Some(log);
        self.running = true;
        Ok(())
    }

    /// Shut every initialized component down and empty the registry.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(log) = &self.log {
            log.debug("Stopping ComponentDirector.");
        }
        let result = self.manager.shutdown().await;
        self.manager.clear();
        self.log = None;
        self.running = false;
        result
    }

    async fn apply_config(&self, phase: ConfigPhase) -> Result<()> {
        for descriptor in &self.descriptors {
            for entry in descriptor.entries(phase) {
                log::info!("{}: {} {} {}", phase, descriptor.name, entry.feature, entry.value);
                self.manager
                    .config(&descriptor.name, &entry.feature, entry.value.clone())
                    .await?;
            }
        }
        Ok(())
    }

    /// Configured user and group as numeric ids
    fn ids(&self) -> Result<(Option<u32>, Option<u32>)> {
        let config = self.merged_config()?;
        resolve_ids(self.privileges.as_ref(), config.setuid.as_ref(), config.setgid.as_ref())
    }

    fn merged_config(&self) -> Result<&ScmConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| Error::Other("configuration has not been processed".to_string()))
    }

    pub fn manager(&self) -> &ComponentManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ComponentManager {
        &mut self.manager
    }

    /// Merged configuration, once processed
    pub fn config(&self) -> Option<&ScmConfig> {
        self.config.as_ref()
    }

    pub fn descriptors(&self) -> &[ComponentDescriptor] {
        &self.descriptors
    }

    pub fn logger(&self) -> Option<Arc<dyn Logger>> {
        self.log.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
