//! Runtime configuration from environment variables

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data/reference";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding the reference CSV/TXT tables
    pub data_dir: PathBuf,
    pub port: u16,
    /// Key required by the HTTP service; `None` means every keyed request fails
    pub api_key: Option<String>,
    pub parallel_scoring: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            port: DEFAULT_PORT,
            api_key: None,
            parallel_scoring: true,
        }
    }
}

impl AppConfig {
    /// Read `DATA_DIR`, `PORT`, `API_KEY` and `PARALLEL_SCORING`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("DATA_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let port = match lookup("PORT") {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got '{}'", p))?,
            None => defaults.port,
        };

        let api_key = lookup("API_KEY").filter(|k| !k.is_empty());

        let parallel_scoring = match lookup("PARALLEL_SCORING") {
            Some(v) => parse_bool(&v).with_context(|| format!("PARALLEL_SCORING must be true or false, got '{}'", v))?,
            None => defaults.parallel_scoring,
        };

        Ok(Self {
            data_dir,
            port,
            api_key,
            parallel_scoring,
        })
    }

    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
        tracing::info!("  PORT: {}", self.port);
        tracing::info!("  API_KEY: {}", if self.api_key.is_some() { "set" } else { "not set" });
        tracing::info!("  PARALLEL_SCORING: {}", self.parallel_scoring);
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.port, 8080);
        assert!(config.parallel_scoring);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATA_DIR", "/srv/greet"),
            ("PORT", "9000"),
            ("API_KEY", "secret"),
            ("PARALLEL_SCORING", "false"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/greet"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert!(!config.parallel_scoring);
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_empty_api_key_is_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[("API_KEY", "")])).unwrap();
        assert_eq!(config.api_key, None);
    }
}
