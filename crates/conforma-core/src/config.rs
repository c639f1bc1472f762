use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use conforma_engines::EngineKind;
use conforma_network::fetcher::DEFAULT_USER_AGENT;
use conforma_rules::RuleConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub browser: Browser,
    #[serde(default)]
    pub fetch: Fetch,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub server: Server,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// No path means built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let nav = self.browser.navigation_timeout_secs;
        if !(1..=120).contains(&nav) {
            bail!("browser.navigation_timeout_secs must be between 1 and 120, got {nav}");
        }
        if self.browser.max_settle_millis < self.browser.settle_millis {
            bail!(
                "browser.max_settle_millis ({}) must not be below browser.settle_millis ({})",
                self.browser.max_settle_millis,
                self.browser.settle_millis
            );
        }
        if self.fetch.timeout_secs == 0 {
            bail!("fetch.timeout_secs must be positive");
        }
        if self.rules.accepted_image_extensions.is_empty() {
            bail!("rules.accepted_image_extensions must not be empty");
        }
        if self.browser.engine == EngineKind::Fixture && self.browser.fixture.is_none() {
            bail!("browser.fixture is required when browser.engine = \"fixture\"");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Browser {
    pub engine: EngineKind,
    pub headless: bool,
    pub executable: Option<String>,
    pub no_sandbox: bool,
    pub extra_args: Vec<String>,
    pub fixture: Option<PathBuf>,
    pub navigation_timeout_secs: u64,
    pub settle_millis: u64,
    pub max_settle_millis: u64,
}
impl Default for Browser {
    fn default() -> Self {
        Self {
            engine: EngineKind::Chromium,
            headless: true,
            executable: None,
            no_sandbox: false,
            extra_args: Vec::new(),
            fixture: None,
            navigation_timeout_secs: 60,
            settle_millis: 500,
            max_settle_millis: 5000,
        }
    }
}
impl Browser {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }

    pub fn max_settle(&self) -> Duration {
        Duration::from_millis(self.max_settle_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Fetch {
    pub timeout_secs: u64,
    pub user_agent: String,
}
impl Default for Fetch {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    pub results_path: PathBuf,
}
impl Default for Store {
    fn default() -> Self {
        Self {
            results_path: PathBuf::from("results").join("results.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}
impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3000,
        }
    }
}
