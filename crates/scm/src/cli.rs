use std::path::PathBuf;

use clap::Parser;
use scm_core::kernel::constants::{
    GLOBAL_CONFIG_FILE, LOCAL_CONFIG_FILE, USER_CONFIG_DIR, USER_CONFIG_FILE_NAME,
};

/// scm: starts the components described by the configuration files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Print "pong" and exit
    #[arg(long)]
    pub ping: bool,

    /// Additional configuration file, loaded after the default ones
    #[arg(short, long = "config", value_name = "FILE")]
    pub configs: Vec<PathBuf>,

    /// Skip the global, user and local configuration files
    #[arg(long)]
    pub no_default_configs: bool,

    /// Package manager used to install component packages
    #[arg(long, value_name = "PROGRAM")]
    pub installer: Option<PathBuf>,

    /// Stop right after startup instead of waiting for Ctrl-C
    #[arg(long)]
    pub once: bool,
}

impl CliArgs {
    /// Configuration files to load, in load order
    pub fn config_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if !self.no_default_configs {
            files.push(PathBuf::from(GLOBAL_CONFIG_FILE));
            if let Some(home) = std::env::var_os("HOME") {
                files.push(PathBuf::from(home).join(USER_CONFIG_DIR).join(USER_CONFIG_FILE_NAME));
            }
            files.push(PathBuf::from(LOCAL_CONFIG_FILE));
        }
        files.extend(self.configs.iter().cloned());
        files
    }
}
