use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::reply::{FailureMode, ScriptedReply};
use crate::state::OfferList;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Simulated thinking time before the scripted reply arrives
    pub reply_delay_ms: u64,
    /// Probability in `0.0..=1.0` that the scripted reply fails
    pub failure_rate: f64,
    /// JSON file with the offers to reply with; the built-in list when unset
    pub offers_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1000,
            failure_rate: 0.0,
            offers_path: None,
        }
    }
}

impl Config {
    /// Load the user's config file (defaults when absent), then apply env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from `APEX_REPLY_DELAY_MS` and `APEX_FAILURE_RATE`.
    /// Unparseable values are ignored.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(ms) = var("APEX_REPLY_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.reply_delay_ms = ms;
        }
        if let Some(rate) = var("APEX_FAILURE_RATE")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|r| r.is_finite())
        {
            self.failure_rate = rate;
        }
    }

    pub fn offers(&self) -> Result<OfferList, ConfigError> {
        match &self.offers_path {
            Some(path) => OfferList::load(path),
            None => Ok(OfferList::builtin()),
        }
    }

    /// The scripted reply generator this config describes
    pub fn reply_generator(&self) -> Result<ScriptedReply, ConfigError> {
        Ok(ScriptedReply::new(self.offers()?)
            .with_delay(Duration::from_millis(self.reply_delay_ms))
            .with_failure(FailureMode::from_rate(self.failure_rate)))
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("apex-gpt").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::ReplyGenerator;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"failure_rate": 0.5}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.failure_rate, 0.5);
        assert_eq!(config.reply_delay_ms, 1000);
        assert!(config.offers_path.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("APEX_REPLY_DELAY_MS", "250"),
            ("APEX_FAILURE_RATE", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.reply_delay_ms, 250);
        assert_eq!(config.failure_rate, 0.0);
    }

    #[test]
    fn test_env_ignores_non_finite_failure_rate() {
        for raw in ["NaN", "inf", "-inf"] {
            let mut config = Config::default();
            config.apply_env(|k| (k == "APEX_FAILURE_RATE").then(|| raw.to_string()));
            assert_eq!(config.failure_rate, 0.0, "{raw} should be ignored");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_nan_failure_rate_still_generates() {
        let config = Config {
            failure_rate: f64::NAN,
            ..Config::default()
        };
        let generator = config.reply_generator().unwrap();
        assert!(generator.generate("hi").await.is_ok());
    }

    #[test]
    fn test_offers_default_to_builtin() {
        let offers = Config::default().offers().unwrap();
        assert_eq!(offers, OfferList::builtin());
    }
}
