use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Which durable event store backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Append-only file of JSON records, one per line.
    Jsonl,
    /// Embedded redb database.
    Redb,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" => Ok(StoreBackend::Jsonl),
            "redb" => Ok(StoreBackend::Redb),
            _ => Err(ConfigError::Invalid(
                "KANBAN_STORE_BACKEND",
                "must be one of: jsonl, redb",
            )),
        }
    }
}

/// Application configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store_path: PathBuf,
    pub backend: StoreBackend,
    pub cache_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// KANBAN_STORE_PATH defaults to "./kanban.events"
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store_path = lookup("KANBAN_STORE_PATH")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| "./kanban.events".to_string())
            .into();

        let backend = match lookup("KANBAN_STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Jsonl,
        };

        let cache_capacity = match lookup("KANBAN_CACHE_CAPACITY") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or(ConfigError::Invalid(
                    "KANBAN_CACHE_CAPACITY",
                    "must be a positive integer",
                ))?,
            None => kanban_replay::DEFAULT_CACHE_CAPACITY,
        };

        Ok(Config {
            store_path,
            backend,
            cache_capacity,
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.store_path, PathBuf::from("./kanban.events"));
        assert_eq!(config.backend, StoreBackend::Jsonl);
        assert_eq!(config.cache_capacity, 1000);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("KANBAN_STORE_PATH", "/var/lib/kanban.redb"),
            ("KANBAN_STORE_BACKEND", "REDB"),
            ("KANBAN_CACHE_CAPACITY", "16"),
        ])
        .unwrap();
        assert_eq!(config.store_path, PathBuf::from("/var/lib/kanban.redb"));
        assert_eq!(config.backend, StoreBackend::Redb);
        assert_eq!(config.cache_capacity, 16);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            load(&[("KANBAN_STORE_BACKEND", "postgres")]),
            Err(ConfigError::Invalid(
                "KANBAN_STORE_BACKEND",
                "must be one of: jsonl, redb"
            ))
        );
        for capacity in ["0", "-1", "many"] {
            assert!(matches!(
                load(&[("KANBAN_CACHE_CAPACITY", capacity)]),
                Err(ConfigError::Invalid("KANBAN_CACHE_CAPACITY", _))
            ));
        }
    }
}
