//! Configuration management for perfsink.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults. The
//! defaults reproduce the fixed layout runs have always been written with, so
//! no configuration is needed to run the sink.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name under the user's config dir.
const APP_DIR_NAME: &str = "perfsink";

/// Environment variable prefix.
const ENV_PREFIX: &str = "PERFSINK_";

/// Default directory that receives run files.
pub const DEFAULT_RUN_DIR: &str = "performanceruns";

/// Default run file name prefix.
pub const DEFAULT_FILE_PREFIX: &str = "data";

/// Default run file extension.
pub const DEFAULT_FILE_EXTENSION: &str = ".json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PERFSINK_`)
/// 2. TOML config file at `~/.config/perfsink/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Run file storage configuration.
    pub storage: StorageConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: String,
    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

/// Run file storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory run files are written to. Relative paths resolve against
    /// the working directory.
    pub dir: PathBuf,
    /// Prefix placed before the timestamp in run file names.
    pub file_prefix: String,
    /// Extension appended after the timestamp, including the dot.
    pub file_extension: String,
    /// Create the run directory if it is missing.
    pub create_dir: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_RUN_DIR),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            create_dir: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources, reading `config_path` instead of
    /// the default file when given.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(Self::figment(&config_file))
    }

    /// Build the provider stack for the given config file.
    #[must_use]
    pub fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration from a prepared figment.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self.server.max_body_bytes == 0 {
            return Err(Error::config_validation(
                "max_body_bytes must be greater than 0",
            ));
        }

        if self.storage.dir.as_os_str().is_empty() {
            return Err(Error::config_validation("storage dir must not be empty"));
        }

        for (name, value) in [
            ("file_prefix", &self.storage.file_prefix),
            ("file_extension", &self.storage.file_extension),
        ] {
            if value.contains(&['/', '\\'][..]) {
                return Err(Error::config_validation(format!(
                    "{name} must not contain path separators: {value}"
                )));
            }
        }

        Ok(())
    }

    /// Parse the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBindAddress`] if the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|_| Error::InvalidBindAddress {
                addr: self.server.bind.clone(),
            })
    }

    /// Directory run files are written to.
    #[must_use]
    pub fn run_dir(&self) -> &Path {
        &self.storage.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.max_body_bytes, 8 * 1024 * 1024);
        assert_eq!(config.storage.dir, PathBuf::from("performanceruns"));
        assert_eq!(config.storage.file_prefix, "data");
        assert_eq!(config.storage.file_extension, ".json");
        assert!(config.storage.create_dir);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_body_limit() {
        let mut config = Config::default();
        config.server.max_body_bytes = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_body_bytes"));
    }

    #[test]
    fn test_validate_bad_bind_address() {
        let mut config = Config::default();
        config.server.bind = "localhost".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidBindAddress { .. }));
    }

    #[test]
    fn test_validate_empty_dir() {
        let mut config = Config::default();
        config.storage.dir = PathBuf::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("storage dir"));
    }

    #[test]
    fn test_validate_prefix_with_separator() {
        let mut config = Config::default();
        config.storage.file_prefix = "../escape".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("file_prefix"));
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        assert_eq!(
            config.bind_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("perfsink"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        Jail::expect_with(|_jail| {
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .expect("defaults should load");
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "perfsink.toml",
                r#"
                [server]
                bind = "0.0.0.0:9000"

                [storage]
                dir = "/var/lib/perfsink/runs"
                create_dir = false
                "#,
            )?;

            let config = Config::load_from(Some(PathBuf::from("perfsink.toml")))
                .expect("config should load");
            assert_eq!(config.server.bind, "0.0.0.0:9000");
            assert_eq!(config.storage.dir, PathBuf::from("/var/lib/perfsink/runs"));
            assert!(!config.storage.create_dir);
            // Untouched keys keep their defaults
            assert_eq!(config.storage.file_prefix, "data");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "perfsink.toml",
                r#"
                [server]
                bind = "0.0.0.0:9000"
                "#,
            )?;
            jail.set_env("PERFSINK_SERVER__BIND", "127.0.0.1:7000");
            jail.set_env("PERFSINK_STORAGE__FILE_PREFIX", "run");

            let config = Config::load_from(Some(PathBuf::from("perfsink.toml")))
                .expect("config should load");
            assert_eq!(config.server.bind, "127.0.0.1:7000");
            assert_eq!(config.storage.file_prefix, "run");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "perfsink.toml",
                r"
                [server]
                max_body_bytes = 0
                ",
            )?;

            let result = Config::load_from(Some(PathBuf::from("perfsink.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("max_body_bytes"));
        assert!(json.contains("performanceruns"));
    }

    #[test]
    fn test_storage_config_deserialize_partial() {
        let json = r#"{"dir": "runs"}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.dir, PathBuf::from("runs"));
        assert_eq!(storage.file_extension, ".json");
    }
}
