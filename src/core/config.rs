use super::quote::Domain;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const GOLD_UPSTREAM: &str = "https://static.altinkaynak.com/Gold";
pub const CURRENCY_UPSTREAM: &str = "https://static.altinkaynak.com/Currency";

/// Where and how quotes for one domain are read.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum SourceConfig {
    Json {
        url: String,
    },
    Html {
        url: String,
        #[serde(default)]
        aliases: HashMap<String, String>,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourcesConfig {
    pub gold: SourceConfig,
    pub currency: SourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            gold: SourceConfig::Json {
                url: GOLD_UPSTREAM.to_string(),
            },
            currency: SourceConfig::Json {
                url: CURRENCY_UPSTREAM.to_string(),
            },
        }
    }
}

impl SourcesConfig {
    pub fn for_domain(&self, domain: Domain) -> &SourceConfig {
        match domain {
            Domain::Gold => &self.gold,
            Domain::Currency => &self.currency,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval_secs: 30,
            timeout_secs: 10,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpstreamConfig {
    pub gold: String,
    pub currency: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            gold: GOLD_UPSTREAM.to_string(),
            currency: CURRENCY_UPSTREAM.to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn for_domain(&self, domain: Domain) -> &str {
        match domain {
            Domain::Gold => &self.gold,
            Domain::Currency => &self.currency,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: String,
    pub upstream: UpstreamConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 3000,
            static_dir: "dist".to_string(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Port to listen on; a valid `PORT` value takes precedence over the file.
    pub fn effective_port(&self, env_port: Option<&str>) -> u16 {
        env_port
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(self.port)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Loads the file at the default location, or built-in defaults when there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "altinkur", "altinkur")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
