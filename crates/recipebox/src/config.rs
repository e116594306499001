//! Configuration management for recipebox.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::store::CATALOG_FILE_NAME;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name under the platform config dir.
const APP_DIR_NAME: &str = "recipebox";

/// Environment variable that overrides the server port.
const PORT_ENV_VAR: &str = "PORT";

/// Port used when nothing else is configured.
pub const DEFAULT_PORT: u16 = 3000;

/// Extra ports tried after the base port when it is taken.
pub const DEFAULT_MAX_PORT_RETRIES: u32 = 10;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. The `PORT` environment variable (port only)
/// 2. Environment variables prefixed with `RECIPEBOX_`, nested with `__`
///    (e.g. `RECIPEBOX_SERVER__HOST`)
/// 3. TOML config file at `~/.config/recipebox/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Filesystem locations.
    pub paths: PathsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// First port to try.
    pub port: u16,
    /// How many successive ports to try after `port` when it is in use.
    pub max_port_retries: u32,
    /// Pause between bind attempts in milliseconds.
    pub retry_delay_ms: u64,
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root directory for static assets.
    pub public_dir: PathBuf,
    /// Directory holding the catalog file.
    /// Defaults to `<public_dir>/data`, so the catalog is also served statically.
    pub data_dir: Option<PathBuf>,
    /// Catalog file name inside `data_dir`.
    pub catalog_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_port_retries: DEFAULT_MAX_PORT_RETRIES,
            retry_delay_ms: 100,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("public"),
            data_dir: None, // Resolved against public_dir at runtime
            catalog_file: CATALOG_FILE_NAME.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("RECIPEBOX_").split("__"));
        if let Some(port) = port_from_env() {
            figment = figment.merge(Serialized::default("server.port", port));
        }

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
        if self.server.port == 0 {
            return Err(Error::ConfigValidation {
                message: "port must be greater than 0".to_string(),
            });
        }

        let catalog = Path::new(&self.paths.catalog_file);
        let plain_name = catalog
            .file_name()
            .is_some_and(|name| name == catalog.as_os_str());
        if !plain_name {
            return Err(Error::ConfigValidation {
                message: format!(
                    "catalog_file must be a plain file name, got '{}'",
                    self.paths.catalog_file
                ),
            });
        }

        Ok(())
    }

    /// Get the data directory, resolving the default if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(|| self.paths.public_dir.join("data"))
    }

    /// Get the full path of the catalog file.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir().join(&self.paths.catalog_file)
    }

    /// Get the pause between bind attempts as a Duration.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.server.retry_delay_ms)
    }
}

/// Read the `PORT` override.
///
/// Unset means no override. An empty, non-numeric or zero value is ignored
/// with a warning, leaving the configured port in place.
fn port_from_env() -> Option<u16> {
    let raw = std::env::var(PORT_ENV_VAR).ok()?;
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Some(port),
        _ => {
            warn!("Ignoring {PORT_ENV_VAR}={raw:?}; expected a port between 1 and 65535");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.max_port_retries, 10);
        assert_eq!(config.server.retry_delay_ms, 100);
        assert_eq!(config.paths.public_dir, PathBuf::from("public"));
        assert!(config.paths.data_dir.is_none());
        assert_eq!(config.paths.catalog_file, "recipes.json");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("port must be greater than 0"));
    }

    #[test]
    fn test_validate_accepts_ports_near_top_of_range() {
        let mut config = Config::default();
        config.server.max_port_retries = 10;
        for port in [65_530, u16::MAX] {
            config.server.port = port;
            assert!(config.validate().is_ok(), "rejected port {port}");
        }
    }

    #[test]
    fn test_high_port_env_loads() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("PORT", "65530");

            let config = Config::load_from(Some(PathBuf::from("missing.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 65_530);
            assert_eq!(config.server.max_port_retries, DEFAULT_MAX_PORT_RETRIES);
            Ok(())
        });
    }

    #[test]
    fn test_validate_catalog_file_with_directory() {
        for bad in ["", "../recipes.json", "nested/recipes.json", ".."] {
            let mut config = Config::default();
            config.paths.catalog_file = bad.to_string();

            let err = config.validate().unwrap_err().to_string();
            assert!(err.contains("catalog_file"), "accepted '{bad}'");
        }
    }

    #[test]
    fn test_data_dir_defaults_under_public_dir() {
        let mut config = Config::default();
        config.paths.public_dir = PathBuf::from("/srv/site");

        assert_eq!(config.data_dir(), PathBuf::from("/srv/site/data"));
        assert_eq!(
            config.catalog_path(),
            PathBuf::from("/srv/site/data/recipes.json")
        );
    }

    #[test]
    fn test_data_dir_custom() {
        let mut config = Config::default();
        config.paths.data_dir = Some(PathBuf::from("/var/lib/recipebox"));

        assert_eq!(
            config.catalog_path(),
            PathBuf::from("/var/lib/recipebox/recipes.json")
        );
    }

    #[test]
    fn test_retry_delay() {
        let config = Config::default();
        assert_eq!(config.retry_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("recipebox"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "recipebox.toml",
                r#"
                [server]
                port = 8080

                [paths]
                public_dir = "site"
                "#,
            )?;

            let config = Config::load_from(Some(PathBuf::from("recipebox.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.catalog_path(), PathBuf::from("site/data/recipes.json"));
            Ok(())
        });
    }

    #[test]
    fn test_port_env_overrides_everything() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("recipebox.toml", "[server]\nport = 8080\n")?;
            jail.set_env("RECIPEBOX_SERVER__PORT", "9000");
            jail.set_env("PORT", "4000");

            let config = Config::load_from(Some(PathBuf::from("recipebox.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 4000);
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_nested_keys() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("RECIPEBOX_SERVER__MAX_PORT_RETRIES", "3");
            jail.set_env("RECIPEBOX_PATHS__DATA_DIR", "/tmp/recipes");

            let config = Config::load_from(Some(PathBuf::from("missing.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.server.max_port_retries, 3);
            assert_eq!(config.data_dir(), PathBuf::from("/tmp/recipes"));
            Ok(())
        });
    }

    #[test]
    fn test_unusable_port_env_falls_back() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            for value in ["", "not-a-port", "0", "70000", "-1"] {
                jail.set_env("PORT", value);
                let config = Config::load_from(Some(PathBuf::from("missing.toml")))
                    .map_err(|e| e.to_string())?;
                assert_eq!(config.server.port, DEFAULT_PORT, "for PORT={value:?}");
            }
            Ok(())
        });
    }

    #[test]
    fn test_unusable_port_env_keeps_file_port() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("recipebox.toml", "[server]\nport = 8080\n")?;
            jail.set_env("PORT", "abc");

            let config = Config::load_from(Some(PathBuf::from("recipebox.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 8080);
            Ok(())
        });
    }

    #[test]
    fn test_port_from_env_trims_whitespace() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("PORT", " 4100 ");
            assert_eq!(port_from_env(), Some(4100));
            Ok(())
        });
    }

    #[test]
    fn test_server_config_serialize() {
        let server = ServerConfig::default();
        let json = serde_json::to_string(&server).unwrap();
        assert!(json.contains("max_port_retries"));
    }

    #[test]
    fn test_paths_config_deserialize() {
        let json = r#"{"public_dir": "www", "catalog_file": "book.json"}"#;
        let paths: PathsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(paths.public_dir, PathBuf::from("www"));
        assert_eq!(paths.catalog_file, "book.json");
        assert!(paths.data_dir.is_none());
    }

    #[test]
    fn test_config_clone() {
        let config = Config::default();
        let cloned = config.clone();
        assert_eq!(config, cloned);
    }
}
