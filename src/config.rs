use crate::constants::{
    DEFAULT_ALLOWED_ORIGIN, DEFAULT_CONFIG_PATH, DEFAULT_DATABASE_PATH, DEFAULT_HOST, DEFAULT_PORT,
};
use crate::error::ServiceError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by the CORS policy
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// When set, JSON logs are also written to a daily rolling file here
    pub directory: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path` (or `config.toml` when absent), then apply
    /// environment overrides. A missing default file is not an error; a missing
    /// explicitly requested file is.
    pub fn load(path: Option<&Path>) -> Result<Self, ServiceError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ServiceError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ServiceError> {
        Ok(toml::from_str(content)?)
    }

    /// Environment variables win over file values.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ServiceError::Config(format!("PORT must be a port number, got '{port}'")))?;
        }
        if let Some(origin) = lookup("FRONTEND_URL") {
            self.server.allowed_origin = origin;
        }
        if let Some(path) = lookup("DATABASE_URL") {
            self.database.path = path;
        }
        if let Some(dir) = lookup("LOG_DIR") {
            self.logging.directory = Some(PathBuf::from(dir));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config = Config::from_toml("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.database.path, DEFAULT_DATABASE_PATH);
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = Config::from_toml("[database]\npath = \"file.db\"\n").unwrap();
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "env.db"),
            ("FRONTEND_URL", "https://blog.example"),
            ("PORT", "4000"),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.path, "env.db");
        assert_eq!(config.server.allowed_origin, "https://blog.example");
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| (key == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::from_file(&missing),
            Err(ServiceError::Config(_))
        ));
    }
}
