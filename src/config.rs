use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dictionary::DEFAULT_KEEP_N;
use crate::error::{Error, Result};
use crate::lda::LdaConfig;
use crate::split::SplitConfig;
use crate::text::CleanerConfig;

/// Vocabulary pruning thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum number of documents a token must appear in
    pub no_below: usize,
    /// Maximum fraction of documents a token may appear in
    pub no_above: f64,
    pub keep_n: Option<usize>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            no_below: 10,
            no_above: 0.4,
            keep_n: Some(DEFAULT_KEEP_N),
        }
    }
}

/// Controls how many topics are reported for a new document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignConfig {
    pub topics_returned: usize,
    /// Topics weighted below this are left out
    pub min_top_freq: f64,
}

impl Default for AssignConfig {
    fn default() -> Self {
        AssignConfig {
            topics_returned: 1,
            min_top_freq: 0.05,
        }
    }
}

/// Central configuration: optional JSON file, then `.env` / environment
/// overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cleaner: CleanerConfig,
    pub split: SplitConfig,
    pub filter: FilterConfig,
    pub lda: LdaConfig,
    pub assign: AssignConfig,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let file = File::open(path).map_err(|e| Error::io(path, e))?;
                serde_json::from_reader(BufReader::new(file))?
            }
            None => Config::default(),
        };

        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "Loaded .env file");
        }
        config.apply_env()?;
        Ok(config)
    }

    /// Override settings from `REVIEW_TOPICS_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(topics) = env_var("REVIEW_TOPICS_NUM_TOPICS")? {
            self.lda.num_topics = topics;
        }
        if let Some(workers) = env_var("REVIEW_TOPICS_WORKERS")? {
            self.lda.workers = workers;
        }
        if let Some(seed) = env_var("REVIEW_TOPICS_SEED")? {
            self.lda.random_seed = Some(seed);
            self.split.random_state = seed;
        }
        if let Some(no_below) = env_var("REVIEW_TOPICS_NO_BELOW")? {
            self.filter.no_below = no_below;
        }
        if let Some(no_above) = env_var("REVIEW_TOPICS_NO_ABOVE")? {
            self.filter.no_above = no_above;
        }
        if let Some(min_top_freq) = env_var("REVIEW_TOPICS_MIN_TOP_FREQ")? {
            self.assign.min_top_freq = min_top_freq;
        }
        Ok(())
    }
}

fn env_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::InvalidParameter(format!("{}={:?}: {}", name, value, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_original_thresholds() {
        let config = Config::default();
        assert_eq!(config.filter.no_below, 10);
        assert_eq!(config.filter.no_above, 0.4);
        assert_eq!(config.assign.topics_returned, 1);
        assert_eq!(config.assign.min_top_freq, 0.05);
        assert_eq!(config.split.test_size, 0.15);
        assert_eq!(config.split.random_state, 22);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"lda": {{"num_topics": 12, "workers": 3}}, "filter": {{"no_below": 2}}}}"#).unwrap();

        let config: Config = serde_json::from_reader(File::open(file.path()).unwrap()).unwrap();
        assert_eq!(config.lda.num_topics, 12);
        assert_eq!(config.lda.workers, 3);
        assert_eq!(config.lda.iterations, 100);
        assert_eq!(config.filter.no_below, 2);
        assert_eq!(config.filter.no_above, 0.4);
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        env::set_var("REVIEW_TOPICS_TEST_BAD_VALUE", "many");
        let result: Result<Option<usize>> = env_var("REVIEW_TOPICS_TEST_BAD_VALUE");
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
        env::remove_var("REVIEW_TOPICS_TEST_BAD_VALUE");

        let missing: Option<usize> = env_var("REVIEW_TOPICS_TEST_UNSET").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_environment_overrides_file_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"lda": {{"num_topics": 12}}, "filter": {{"no_below": 2}}}}"#).unwrap();

        let overrides = [
            ("REVIEW_TOPICS_NUM_TOPICS", "7"),
            ("REVIEW_TOPICS_WORKERS", "3"),
            ("REVIEW_TOPICS_SEED", "99"),
            ("REVIEW_TOPICS_NO_BELOW", "4"),
            ("REVIEW_TOPICS_NO_ABOVE", "0.25"),
            ("REVIEW_TOPICS_MIN_TOP_FREQ", "0.2"),
        ];
        for (name, value) in overrides {
            env::set_var(name, value);
        }
        let loaded = Config::load(Some(file.path()));
        for (name, _) in overrides {
            env::remove_var(name);
        }

        let config = loaded.unwrap();
        assert_eq!(config.lda.num_topics, 7);
        assert_eq!(config.lda.workers, 3);
        assert_eq!(config.lda.random_seed, Some(99));
        assert_eq!(config.split.random_state, 99);
        assert_eq!(config.filter.no_below, 4);
        assert_eq!(config.filter.no_above, 0.25);
        assert_eq!(config.assign.min_top_freq, 0.2);
        // untouched settings keep their defaults
        assert_eq!(config.lda.iterations, 100);
        assert_eq!(config.split.test_size, 0.15);
    }
}
