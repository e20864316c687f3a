mod batch;
mod cli;
mod commands;
mod compare;
mod config;
mod report;
mod source;

use clap::Parser;
use config::{CliOverrides, ResolvedRunConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose > 0 {
        "imgcmp=debug"
    } else {
        "imgcmp=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Command::Compare {
            left,
            right,
            output,
            diff,
        } => {
            let overrides = CliOverrides {
                config: cli.config,
                diff,
                ..CliOverrides::default()
            };
            let config = ResolvedRunConfig::new(overrides)?;
            let code = commands::compare(&config, &left, &right, output.as_deref()).await?;
            std::process::exit(code);
        }
        cli::Command::Info { image } => {
            commands::info(&image).await?;
        }
        cli::Command::Batch {
            manifest,
            output,
            diff,
            batch,
        } => {
            let overrides = CliOverrides {
                config: cli.config,
                diff,
                batch,
            };
            let config = ResolvedRunConfig::new(overrides)?;
            let code = commands::batch(&config, &manifest, output.as_deref()).await?;
            std::process::exit(code);
        }
        cli::Command::Init { force } => {
            commands::init(force)?;
        }
    }

    Ok(())
}
