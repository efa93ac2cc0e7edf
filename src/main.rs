use anyhow::Context;
use clap::Parser;

use beanscope::Settings;
use beanscope::config::LoggingConfig;
use beanscope::cli::commands::{Workspace, init, navigate, scan, usages};
use beanscope::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init { force } = cli.command {
        beanscope::logging::init_with_config(&LoggingConfig::default());
        return init::run_init(force);
    }

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("cannot load settings from {}", path.display()))?,
        None => Settings::load().context("cannot load settings")?,
    };
    beanscope::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => init::run_config(&settings),
        Commands::Scan { file, json } => {
            let workspace = Workspace::open(settings)?;
            scan::run_scan(&workspace, &file, json).await
        }
        Commands::Resolve {
            type_name,
            file,
            line,
            qualifier,
        } => {
            let workspace = Workspace::open(settings)?;
            navigate::run_resolve(&workspace, &type_name, &file, line, qualifier.as_deref()).await
        }
        Commands::Class {
            type_name,
            file,
            line,
        } => {
            let workspace = Workspace::open(settings)?;
            navigate::run_class(&workspace, &type_name, &file, line).await
        }
        Commands::Usages {
            type_name,
            file,
            line,
            qualifier,
            primary,
        } => {
            let workspace = Workspace::open(settings)?;
            usages::run_usages(&workspace, &type_name, &file, line, qualifier, primary).await
        }
    }
}
