use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use conforma_core::cli::{Args, Command};
use conforma_core::commands::{self, ValidateOptions};
use conforma_core::config::Config;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("CONFORMA_LOG").unwrap_or_else(|_| conforma_core::DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Conforma starting");

    let mut config = Config::load_or_default(args.config.as_deref())?;

    match args.command {
        Command::Validate {
            urls,
            input,
            output,
            no_store,
            strict,
            engine,
        } => {
            engine.apply(&mut config);
            let options = ValidateOptions {
                urls,
                input,
                output,
                store: !no_store,
                strict,
            };
            commands::validate(&config, options).await
        }
        Command::Serve { port, engine } => {
            engine.apply(&mut config);
            if let Some(port) = port {
                config.server.port = port;
            }
            commands::serve(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Results => {
            commands::results(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Clear => {
            commands::clear(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
