//! Configuration management for coderefine
//!
//! Built-in defaults, overridden by an optional TOML file
//! (`~/.config/coderefine/config.toml` or `$CODEREFINE_CONFIG`), overridden by
//! environment variables (a project `.env` file fills in unset ones). The API
//! key is only ever read from the environment.

use crate::llm::models::{ModelTier, TierKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// OpenRouter chat completions endpoint
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_REFERER: &str = "https://coderefine.app";
pub const DEFAULT_TITLE: &str = "CodeRefine - AI Code Review";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_ENDPOINT: &str = "OPENROUTER_API_URL";
pub const ENV_PRIMARY_MODELS: &str = "CODEREFINE_PRIMARY_MODELS";
pub const ENV_FALLBACK_MODELS: &str = "CODEREFINE_FALLBACK_MODELS";
pub const ENV_TIMEOUT_SECS: &str = "CODEREFINE_TIMEOUT_SECS";
pub const ENV_CONFIG_PATH: &str = "CODEREFINE_CONFIG";

/// Project dotenv file, read from the working directory
pub const DOTENV_FILE: &str = ".env";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("OPENROUTER_API_KEY is not set in environment variables")]
    MissingCredential,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0} model list is empty")]
    EmptyTier(TierKind),
}

/// Optional overrides read from the config file. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub referer: Option<String>,
    pub title: Option<String>,
    pub timeout_secs: Option<u64>,
    pub primary_models: Option<Vec<String>>,
    pub fallback_models: Option<Vec<String>>,
}

impl FileConfig {
    /// Get the config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("coderefine").join("config.toml"))
    }

    /// Load the file at `path`. A missing file yields defaults; an unreadable
    /// or corrupt one is reported and ignored.
    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not read config file, using defaults");
                return Self::default();
            }
        };
        match toml::from_str::<FileConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config file is corrupted, using defaults");
                Self::default()
            }
        }
    }
}

/// Process-wide settings. Immutable once loaded.
#[derive(Clone)]
pub struct Config {
    api_key: Option<String>,
    pub endpoint: String,
    pub referer: String,
    pub title: String,
    pub request_timeout: Duration,
    pub primary: ModelTier,
    pub fallback: ModelTier,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            primary: ModelTier::default_primary(),
            fallback: ModelTier::default_fallback(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("request_timeout", &self.request_timeout)
            .field("primary", &self.primary)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl Config {
    /// Load from the config file, a `.env` file in the working directory and
    /// the process environment. Real environment variables win over `.env`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .ok()
            .map(PathBuf::from)
            .or_else(FileConfig::default_path);
        let file = path
            .as_deref()
            .map(FileConfig::load_from)
            .unwrap_or_default();
        let dotenv = dotenv_vars(Path::new(DOTENV_FILE));
        Self::from_sources(file, |key| {
            std::env::var(key).ok().or_else(|| dotenv.get(key).cloned())
        })
    }

    /// Merge defaults, file overrides and environment overrides.
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(endpoint) = file.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(referer) = file.referer {
            config.referer = referer;
        }
        if let Some(title) = file.title {
            config.title = title;
        }
        if let Some(secs) = file.timeout_secs {
            config.request_timeout = timeout_from_secs("timeout_secs", secs)?;
        }
        if let Some(models) = file.primary_models {
            config.primary = ModelTier::new(models);
        }
        if let Some(models) = file.fallback_models {
            config.fallback = ModelTier::new(models);
        }

        if let Some(key) = env(ENV_API_KEY) {
            config = config.with_api_key(key);
        }
        if let Some(endpoint) = env(ENV_ENDPOINT) {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(raw) = env(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
            config.request_timeout = timeout_from_secs(ENV_TIMEOUT_SECS, secs)?;
        }
        if let Some(raw) = env(ENV_PRIMARY_MODELS) {
            config.primary = parse_model_list(&raw);
        }
        if let Some(raw) = env(ENV_FALLBACK_MODELS) {
            config.fallback = parse_model_list(&raw);
        }

        if config.primary.is_empty() {
            return Err(ConfigError::EmptyTier(TierKind::Primary));
        }
        if config.fallback.is_empty() {
            return Err(ConfigError::EmptyTier(TierKind::Fallback));
        }
        Ok(config)
    }

    /// Set the API key directly (embedding callers, tests).
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        let key = key.trim();
        self.api_key = if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };
        self
    }

    /// The API key, or [`ConfigError::MissingCredential`].
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingCredential)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Read `KEY=value` pairs from a dotenv file without touching the process
/// environment. A missing file is empty; a malformed one is reported and
/// whatever parsed before the bad line is kept.
pub fn dotenv_vars(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(err) if err.not_found() => return HashMap::new(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not read .env file");
            return HashMap::new();
        }
    };

    let mut vars = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "stopped reading malformed .env file");
                break;
            }
        }
    }
    vars
}

fn timeout_from_secs(key: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_model_list(raw: &str) -> ModelTier {
    ModelTier::new(raw.split(',').map(str::trim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::models::ModelId;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn ids(tier: &ModelTier) -> Vec<&str> {
        tier.iter().map(ModelId::as_str).collect()
    }

    #[test]
    fn test_defaults_without_key() {
        let config = Config::from_sources(FileConfig::default(), env_of(&[])).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.primary, ModelTier::default_primary());
        assert_eq!(config.api_key(), Err(ConfigError::MissingCredential));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config =
            Config::from_sources(FileConfig::default(), env_of(&[(ENV_API_KEY, "   ")])).unwrap();
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig {
            endpoint: Some("http://file.example/v1".into()),
            timeout_secs: Some(5),
            primary_models: Some(vec!["file-a".into(), "file-b".into()]),
            ..FileConfig::default()
        };
        let env = env_of(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_ENDPOINT, "http://env.example/v1"),
            (ENV_FALLBACK_MODELS, "x, y ,x,"),
        ]);
        let config = Config::from_sources(file, env).unwrap();

        assert_eq!(config.api_key(), Ok("sk-test"));
        assert_eq!(config.endpoint, "http://env.example/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(ids(&config.primary), vec!["file-a", "file-b"]);
        assert_eq!(ids(&config.fallback), vec!["x", "y"]);
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let err = Config::from_sources(FileConfig::default(), env_of(&[(ENV_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == ENV_TIMEOUT_SECS));

        let err = Config::from_sources(FileConfig::default(), env_of(&[(ENV_TIMEOUT_SECS, "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_empty_tier_is_rejected() {
        let file = FileConfig {
            fallback_models: Some(vec![]),
            ..FileConfig::default()
        };
        let err = Config::from_sources(file, env_of(&[])).unwrap_err();
        assert_eq!(err, ConfigError::EmptyTier(TierKind::Fallback));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::default().with_api_key("sk-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_file_config_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "timeout_secs = 30\nprimary_models = [\"a\", \"b\"]\nfallback_models = [\"c\"]\n",
        )
        .unwrap();

        let file = FileConfig::load_from(&path);
        assert_eq!(file.timeout_secs, Some(30));
        assert_eq!(file.fallback_models, Some(vec!["c".to_string()]));
    }

    #[test]
    fn test_file_config_missing_or_corrupt_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            FileConfig::load_from(&dir.path().join("absent.toml")),
            FileConfig::default()
        );

        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = [not toml").unwrap();
        assert_eq!(FileConfig::load_from(&path), FileConfig::default());
    }

    #[test]
    fn test_api_key_is_trimmed_from_every_source() {
        let from_env = Config::from_sources(
            FileConfig::default(),
            env_of(&[(ENV_API_KEY, "  sk-abc \n")]),
        )
        .unwrap();
        let direct = Config::default().with_api_key(" sk-abc\t");

        assert_eq!(from_env.api_key(), Ok("sk-abc"));
        assert_eq!(direct.api_key(), Ok("sk-abc"));
        assert!(!Config::default().with_api_key("   ").has_api_key());
    }

    #[test]
    fn test_dotenv_vars_reads_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "# local secrets\nOPENROUTER_API_KEY=sk-from-dotenv\nCODEREFINE_PRIMARY_MODELS=\"a, b\"\n",
        )
        .unwrap();

        let vars = dotenv_vars(&path);
        assert_eq!(vars.get(ENV_API_KEY).map(String::as_str), Some("sk-from-dotenv"));
        assert_eq!(
            vars.get(ENV_PRIMARY_MODELS).map(String::as_str),
            Some("a, b")
        );

        let config = Config::from_sources(FileConfig::default(), |key| vars.get(key).cloned()).unwrap();
        assert_eq!(config.api_key(), Ok("sk-from-dotenv"));
        assert_eq!(ids(&config.primary), vec!["a", "b"]);
    }

    #[test]
    fn test_dotenv_vars_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(dotenv_vars(&dir.path().join(".env")).is_empty());
    }
}
