//! User configuration loaded from `~/.planit/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::repository::default_data_dir;
use crate::service::task_store::{StoreOptions, WritePolicy, DEFAULT_STORAGE_KEY};
use crate::time::parse_clock_time;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_ANCHOR: &str = "09:00";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where task files live. Defaults to `~/.planit`.
    pub data_dir: Option<PathBuf>,
    pub storage_key: String,
    /// Clock time rolled-over tasks are moved to, e.g. `09:00` or `8:30am`.
    pub rollover_anchor: String,
    pub write_policy: WritePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            rollover_anchor: DEFAULT_ANCHOR.to_string(),
            write_policy: WritePolicy::default(),
        }
    }
}

impl Config {
    /// Loads `path`, or the default location when `None`. A missing file
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => default_data_dir()?.join(CONFIG_FILE),
        };
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("failed to parse {}", config_path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            bail!("storage_key must not be empty");
        }
        parse_clock_time(&self.rollover_anchor)
            .with_context(|| format!("invalid rollover_anchor `{}`", self.rollover_anchor))?;
        Ok(())
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    pub fn store_options(&self) -> Result<StoreOptions> {
        Ok(StoreOptions {
            storage_key: self.storage_key.clone(),
            rollover_anchor: parse_clock_time(&self.rollover_anchor)?,
            write_policy: self.write_policy,
        })
    }
}
