mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use scm_core::director::{CommandInstaller, ComponentDirector, NoopInstaller, PackageInstaller};
use scm_core::{ConfigFile, Result};
use tracing_subscriber::EnvFilter;

use cli::CliArgs;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore an already installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(args: &CliArgs) -> Result<()> {
    let installer: Arc<dyn PackageInstaller> = match &args.installer {
        Some(program) => Arc::new(CommandInstaller::new(program)),
        None => Arc::new(NoopInstaller),
    };

    let director = ComponentDirector::instance_with(|| {
        ComponentDirector::new(ConfigFile::default()).with_installer(installer)
    });
    {
        let mut director = director.lock().await;
        for file in args.config_files() {
            director.load_config(&file);
        }
        director.start().await?;
    }
    println!("Running...");

    if !args.once {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    }

    info!("Shutting down...");
    ComponentDirector::stop().await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    init_logging();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            if let Err(e) = ComponentDirector::stop().await {
                error!("Shutdown after failed start: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
