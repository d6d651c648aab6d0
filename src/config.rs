// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::error::{RemoteLockError, Result};
use crate::locking::options::{
    AcquireSettings, DEFAULT_EXPIRY, DEFAULT_INITIAL_WAIT, DEFAULT_RETRIES, DEFAULT_TIMEOUT,
};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const ENV_PREFIX: &str = "REMOTE_LOCK";
pub const HOME_ENV: &str = "REMOTE_LOCK_HOME";

const DEFAULT_HOME_DIR: &str = ".remote-lock";
const DEFAULT_LOCKS_DIR: &str = "locks";

/// Effective configuration: serde defaults, then `config.toml`, then
/// `REMOTE_LOCK_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteLockConfig {
    #[serde(skip)]
    home: PathBuf,

    /// Namespace segment placed before `lock` in every key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

/// Acquisition defaults, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default = "default_initial_wait_secs")]
    pub initial_wait_secs: f64,

    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: f64,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time_secs: Option<f64>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            initial_wait_secs: default_initial_wait_secs(),
            expiry_secs: default_expiry_secs(),
            retries: default_retries(),
            timeout_secs: default_timeout_secs(),
            wait_time_secs: None,
        }
    }
}

fn default_initial_wait_secs() -> f64 {
    DEFAULT_INITIAL_WAIT.as_secs_f64()
}

fn default_expiry_secs() -> f64 {
    DEFAULT_EXPIRY.as_secs_f64()
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT.as_secs_f64()
}

impl LockConfig {
    /// Validates the configured values and converts them into settings.
    ///
    /// A negative timeout is treated as zero: a single attempt with no wait.
    pub fn settings(&self) -> Result<AcquireSettings> {
        let expiry = seconds("lock.expiry_secs", self.expiry_secs)?;
        if expiry.is_zero() {
            return Err(RemoteLockError::InvalidConfig(
                "lock.expiry_secs must be greater than zero".to_string(),
            ));
        }

        let timeout = if self.timeout_secs.is_finite() && self.timeout_secs < 0.0 {
            Duration::ZERO
        } else {
            seconds("lock.timeout_secs", self.timeout_secs)?
        };

        Ok(AcquireSettings {
            initial_wait: seconds("lock.initial_wait_secs", self.initial_wait_secs)?,
            expiry,
            retries: self.retries,
            timeout,
            wait_time: self
                .wait_time_secs
                .map(|value| seconds("lock.wait_time_secs", value))
                .transpose()?,
        })
    }
}

/// Converts a non-negative, finite number of seconds into a `Duration`.
pub fn seconds(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        RemoteLockError::InvalidConfig(format!(
            "{name} must be a non-negative number of seconds, got {value}"
        ))
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Lock records as files in a shared directory.
    #[default]
    File,
    /// Process-local records, mostly useful for tests.
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Record directory for the file backend; `<home>/locks` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl StoreConfig {
    pub fn directory(&self, home: &Path) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| home.join(DEFAULT_LOCKS_DIR))
    }
}

impl RemoteLockConfig {
    /// Loads configuration for `home`, reading `file` when given or
    /// `<home>/config.toml` when present, then the process environment.
    pub fn load(home: &Path, file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(home, file, None)
    }

    /// Like [`load`](Self::load) with an explicit environment map in place of
    /// the process environment.
    pub fn load_with_env(
        home: &Path,
        file: Option<&Path>,
        env_source: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let (config_path, required) = match file {
            Some(path) => (path.to_path_buf(), true),
            None => (home.join(CONFIG_FILE_NAME), false),
        };

        if config_path.exists() {
            log::debug!("Loading config from {}", config_path.display());
        } else if !required {
            log::debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
        }

        let settings = Config::builder()
            .add_source(
                File::from(config_path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env_source),
            )
            .build()
            .map_err(|e| RemoteLockError::ConfigError(format!("Failed to load config: {e}")))?;

        let mut config: RemoteLockConfig = settings
            .try_deserialize()
            .map_err(|e| RemoteLockError::ConfigError(format!("Failed to parse config: {e}")))?;
        config.home = home.to_path_buf();
        Ok(config)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn store_directory(&self) -> PathBuf {
        self.store.directory(&self.home)
    }

    /// Renders the effective configuration.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RemoteLockError::ConfigError(format!("Failed to serialize config: {e}")))
    }
}

/// `REMOTE_LOCK_HOME`, or `~/.remote-lock`.
pub fn resolve_home() -> Result<PathBuf> {
    resolve_home_from(env::var_os(HOME_ENV))
}

fn resolve_home_from(explicit: Option<OsString>) -> Result<PathBuf> {
    if let Some(home) = explicit.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(home));
    }

    dirs::home_dir()
        .map(|home| home.join(DEFAULT_HOME_DIR))
        .ok_or_else(|| {
            RemoteLockError::ConfigError(format!(
                "Unable to determine home directory; set {HOME_ENV}"
            ))
        })
}

/// Loads the configuration from the default home and process environment.
pub fn new_remote_lock_config() -> Result<RemoteLockConfig> {
    let home = resolve_home()?;
    RemoteLockConfig::load(&home, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn no_env() -> Option<config::Map<String, String>> {
        Some(config::Map::new())
    }

    fn env_of(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = RemoteLockConfig::load_with_env(temp_dir.path(), None, no_env()).unwrap();

        assert_eq!(config.prefix, None);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store_directory(), temp_dir.path().join("locks"));
        assert_eq!(config.lock.settings().unwrap(), AcquireSettings::default());
    }

    #[test]
    fn test_file_layer() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            r#"
prefix = "billing"

[lock]
retries = 4
timeout_secs = 2.5

[store]
backend = "memory"
"#,
        )
        .unwrap();

        let config = RemoteLockConfig::load_with_env(temp_dir.path(), None, no_env()).unwrap();
        assert_eq!(config.prefix.as_deref(), Some("billing"));
        assert_eq!(config.store.backend, StoreBackend::Memory);

        let settings = config.lock.settings().unwrap();
        assert_eq!(settings.retries, 4);
        assert_eq!(settings.timeout, Duration::from_millis(2500));
        assert_eq!(settings.expiry, DEFAULT_EXPIRY);
    }

    #[test]
    fn test_environment_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "prefix = \"from-file\"\n[lock]\nretries = 4\n",
        )
        .unwrap();

        let config = RemoteLockConfig::load_with_env(
            temp_dir.path(),
            None,
            env_of(&[
                ("REMOTE_LOCK_PREFIX", "from-env"),
                ("REMOTE_LOCK_LOCK__RETRIES", "9"),
                ("REMOTE_LOCK_STORE__BACKEND", "memory"),
            ]),
        )
        .unwrap();

        assert_eq!(config.prefix.as_deref(), Some("from-env"));
        assert_eq!(config.lock.retries, 9);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.toml");
        let err = RemoteLockConfig::load_with_env(temp_dir.path(), Some(&missing), no_env())
            .unwrap_err();
        assert!(matches!(err, RemoteLockError::ConfigError(_)));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "[lock\nretries = ").unwrap();
        let err = RemoteLockConfig::load_with_env(temp_dir.path(), None, no_env()).unwrap_err();
        assert!(matches!(err, RemoteLockError::ConfigError(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let lock = LockConfig {
            expiry_secs: 0.0,
            ..LockConfig::default()
        };
        assert!(matches!(
            lock.settings(),
            Err(RemoteLockError::InvalidConfig(_))
        ));

        let lock = LockConfig {
            initial_wait_secs: -1.0,
            ..LockConfig::default()
        };
        assert!(matches!(
            lock.settings(),
            Err(RemoteLockError::InvalidConfig(_))
        ));

        let lock = LockConfig {
            wait_time_secs: Some(f64::NAN),
            ..LockConfig::default()
        };
        assert!(lock.settings().is_err());
    }

    #[test]
    fn test_negative_timeout_clamps_to_zero() {
        let lock = LockConfig {
            timeout_secs: -5.0,
            ..LockConfig::default()
        };
        assert_eq!(lock.settings().unwrap().timeout, Duration::ZERO);
    }

    #[test]
    fn test_toml_rendering_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let mut config =
            RemoteLockConfig::load_with_env(temp_dir.path(), None, no_env()).unwrap();
        config.prefix = Some("jobs".to_string());
        config.lock.wait_time_secs = Some(0.5);

        let rendered = config.to_toml_string().unwrap();
        assert!(rendered.contains("prefix = \"jobs\""));
        assert!(rendered.contains("[lock]"));
        assert!(rendered.contains("backend = \"file\""));

        let path = temp_dir.path().join("rendered.toml");
        fs::write(&path, &rendered).unwrap();
        let reloaded =
            RemoteLockConfig::load_with_env(temp_dir.path(), Some(&path), no_env()).unwrap();
        assert_eq!(reloaded.prefix.as_deref(), Some("jobs"));
        assert_eq!(reloaded.lock.wait_time_secs, Some(0.5));
    }

    #[test]
    fn test_home_resolution() {
        let explicit = resolve_home_from(Some(OsString::from("/tmp/rl-home"))).unwrap();
        assert_eq!(explicit, PathBuf::from("/tmp/rl-home"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                resolve_home_from(Some(OsString::new())).unwrap(),
                home.join(DEFAULT_HOME_DIR)
            );
            assert_eq!(resolve_home_from(None).unwrap(), home.join(DEFAULT_HOME_DIR));
        }
    }
}
