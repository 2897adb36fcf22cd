//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_RETRY__MAX_ATTEMPTS=5`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Build a config from an inline TOML document layered over the defaults.
    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml));
        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed view over every section.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if matches!(env, "prod" | "production") && settings.notify.accept_invalid_certs {
            tracing::warn!("notify.accept_invalid_certs is enabled in production");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathsSettings,
    pub pipeline: PipelineSettings,
    pub naming: NamingSettings,
    pub dates: DateSettings,
    pub bookmarks: BookmarkSettings,
    pub model: ModelSettings,
    pub retry: RetrySettings,
    pub store: StoreSettings,
    pub notify: NotifySettings,
}

impl Settings {
    fn validate(&self) -> Result<(), Error> {
        if self.pipeline.processes_count == 0 {
            return Err(Error::InvalidConfig("pipeline.processes_count must be at least 1".into()));
        }
        if self.naming.delimiter.is_empty() {
            return Err(Error::InvalidConfig("naming.delimiter must not be empty".into()));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(Error::InvalidConfig("retry.max_attempts must be at least 1 when set".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSettings {
    /// Root under which every image set lives as a sub-directory.
    pub local_images_dir: String,
}

impl Default for PathsSettings {
    fn default() -> Self { Self { local_images_dir: "./data/images".to_string() } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Number of parallel OCR workers.
    pub processes_count: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self { Self { processes_count: 4 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingSettings {
    pub delimiter: String,
    pub prefix_segments: usize,
}

impl Default for NamingSettings {
    fn default() -> Self { Self { delimiter: "_".to_string(), prefix_segments: 2 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateSettings {
    /// Dates further than this many years from today are dropped.
    pub range_years: i32,
}

impl Default for DateSettings {
    fn default() -> Self { Self { range_years: 30 } }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookmarkSettings {
    /// Use the random predictor instead of the trained model.
    pub random: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub dir: String,
}

impl Default for ModelSettings {
    fn default() -> Self { Self { dir: "./models".to_string() } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    None,
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    pub cooldown_secs: u64,
    pub backoff: BackoffKind,
    pub max_backoff_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self { Self { max_attempts: None, cooldown_secs: 60, backoff: BackoffKind::None, max_backoff_secs: 900 } }
}

impl RetrySettings {
    pub fn cooldown(&self) -> Duration { Duration::from_secs(self.cooldown_secs) }
    pub fn max_backoff(&self) -> Duration { Duration::from_secs(self.max_backoff_secs) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub uri: String,
    pub created_by_tag: String,
    pub store_only_document: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { uri: "./data/lancedb".to_string(), created_by_tag: "ai".to_string(), store_only_document: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    pub results_endpoint: String,
    pub delete_images_endpoint: String,
    pub accept_invalid_certs: bool,
    pub timeout_secs: u64,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            results_endpoint: "http://localhost:8080/api/bookmarks/results".to_string(),
            delete_images_endpoint: "http://localhost:8080/api/documents/images".to_string(),
            accept_invalid_certs: true,
            timeout_secs: 30,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_behaviour() {
        let settings = Config::from_toml_str("").unwrap().settings().unwrap();
        assert_eq!(settings.retry.max_attempts, None);
        assert_eq!(settings.retry.cooldown(), Duration::from_secs(60));
        assert_eq!(settings.retry.backoff, BackoffKind::None);
        assert_eq!(settings.naming.delimiter, "_");
        assert_eq!(settings.naming.prefix_segments, 2);
        assert!(!settings.store.store_only_document);
    }

    #[test]
    fn toml_overrides_single_keys() {
        let config = Config::from_toml_str("[retry]\nmax_attempts = 3\nbackoff = \"exponential\"\n[pipeline]\nprocesses_count = 8\n").unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings.retry.max_attempts, Some(3));
        assert_eq!(settings.retry.backoff, BackoffKind::Exponential);
        assert_eq!(settings.pipeline.processes_count, 8);
        assert_eq!(settings.retry.cooldown_secs, 60);
        let workers: usize = config.get("pipeline.processes_count").unwrap();
        assert_eq!(workers, 8);
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(Config::from_toml_str("[pipeline]\nprocesses_count = 0\n").is_err());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/srv/docmark");
        assert_eq!(resolve_with_base(base, "images"), PathBuf::from("/srv/docmark/images"));
        assert_eq!(resolve_with_base(base, "/abs/images"), PathBuf::from("/abs/images"));
    }
}
