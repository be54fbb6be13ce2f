use std::{collections::BTreeMap, path::Path, str::FromStr};

use anyhow::{Result, anyhow};
use serde::Deserialize;
use tracing::Level;

use crate::{
    StubContext,
    env::{EnvBackend, StdEnvBackend},
    store::StubValue,
};

const DEFAULT_LOG_LEVEL: Level = Level::INFO;

/// Variable naming a stub file to load in [`Config::from_env_backend`]
pub const FILE_VAR: &str = "STUB_ENV_FILE";
/// Variable overriding the configured log level
pub const LOG_LEVEL_VAR: &str = "STUB_ENV_LOG_LEVEL";

/// A fixture of environment stubs, usually loaded from a TOML file
///
/// ```toml
/// log_level = "debug"
/// unset = ["HOME"]
///
/// [vars]
/// API_URL = "http://localhost"
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(
        deserialize_with = "deserialize_log_level",
        default = "default_log_level"
    )]
    pub log_level: Level,
    /// Variables stubbed with a value
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    /// Variables stubbed as absent
    #[serde(default)]
    pub unset: Vec<String>,
}

const fn default_log_level() -> Level {
    DEFAULT_LOG_LEVEL
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let level: String = Deserialize::deserialize(deserializer)?;
    Level::from_str(&level).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL,
            vars: BTreeMap::new(),
            unset: Vec::new(),
        }
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(|e| anyhow!("Failed to parse stub config: {e}"))
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read stub file {}: {e}", path.display()))?;
        content.parse()
    }

    /// Build a configuration from the environment.
    ///
    /// Loads the file named by `STUB_ENV_FILE` if it is set, otherwise starts
    /// from the defaults, then applies [`Config::with_env_backend`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or an override is invalid.
    pub fn from_env_backend(env: &impl EnvBackend) -> Result<Self> {
        let config = match env.var(FILE_VAR) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.with_env_backend(env)
    }

    /// Update the configuration from the process environment
    ///
    /// Reads `STUB_ENV_LOG_LEVEL` to override the log level.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable is invalid or cannot be parsed.
    pub fn with_env(self) -> Result<Self> {
        self.with_env_backend(&StdEnvBackend)
    }

    /// Same as `with_env`, but reads from a custom environment backend.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable is invalid or cannot be parsed.
    pub fn with_env_backend(mut self, env: &impl EnvBackend) -> Result<Self> {
        if let Ok(value) = env.var(LOG_LEVEL_VAR) {
            self.log_level = Level::from_str(&value).map_err(|e| {
                anyhow!("Failed to parse environment variable '{LOG_LEVEL_VAR}': {e}")
            })?;
        }
        Ok(self)
    }

    /// Stub every configured variable in `ctx`.
    ///
    /// Values go in first, so a key that is also listed in `unset` ends up absent.
    pub fn apply<B: EnvBackend>(&self, ctx: &mut StubContext<B>) {
        ctx.stub_all(
            self.vars
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );
        ctx.stub_all(self.unset.iter().map(|key| (key.as_str(), StubValue::Unset)));
    }
}
