use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "conforma", version, about = "Web page compliance validation")]
pub struct Args {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(long, global = true, env = "CONFORMA_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate URLs in desktop and mobile viewports and print the reports.
    Validate {
        urls: Vec<String>,
        /// JSON array or newline-separated list of URLs.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Write the reports here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        no_store: bool,
        /// Exit with status 1 when any report failed.
        #[arg(long, default_value_t = false)]
        strict: bool,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Serve the validation API over HTTP.
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the stored reports.
    Results,
    /// Discard the stored reports.
    Clear,
}

#[derive(Debug, Clone, clap::Args)]
pub struct EngineArgs {
    #[arg(long, value_enum)]
    pub engine: Option<EngineChoice>,
    /// Fixture file replayed by the fixture engine.
    #[arg(long)]
    pub fixture: Option<PathBuf>,
    /// Show the browser window.
    #[arg(long, default_value_t = false)]
    pub headed: bool,
}

impl EngineArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(engine) = self.engine {
            config.browser.engine = engine.into();
        }
        if let Some(fixture) = &self.fixture {
            config.browser.fixture = Some(fixture.clone());
            if self.engine.is_none() {
                config.browser.engine = conforma_engines::EngineKind::Fixture;
            }
        }
        if self.headed {
            config.browser.headless = false;
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EngineChoice {
    Chromium,
    Fixture,
}

impl From<EngineChoice> for conforma_engines::EngineKind {
    fn from(value: EngineChoice) -> Self {
        match value {
            EngineChoice::Chromium => conforma_engines::EngineKind::Chromium,
            EngineChoice::Fixture => conforma_engines::EngineKind::Fixture,
        }
    }
}
