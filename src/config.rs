use std::collections::HashMap;
use std::env;
use std::fs;
use std::str::FromStr;
use std::time::Duration;

use crate::clients::openai_client::{OpenAISettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::error::{Result, SchedulerError};
use crate::service::classifier::{ClassificationBoundaries, HourClassifier};
use crate::service::overlap::OverlapScorer;
use crate::service::ranker::{RankingOptions, SlotRanker};

#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
    use_env: bool,
}

impl AppConfig {
    pub fn from_file(path: &str) -> std::result::Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(format!("Invalid config line {}: {}", idx + 1, line));
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self {
            values,
            use_env: false,
        })
    }

    /// Falls back to process environment variables for keys the file lacks.
    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .cloned()
            .or_else(|| if self.use_env { env::var(key).ok() } else { None })
            .filter(|v| !v.trim().is_empty())
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|_| {
                SchedulerError::InvalidConfiguration(format!("{} has invalid value '{}'", key, raw))
            }),
        }
    }
}

/// Typed settings for the scheduling core and the reasoning service.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub boundaries: ClassificationBoundaries,
    pub ranking: RankingOptions,
    pub debounce: Duration,
    pub gateway_timeout: Duration,
    pub local_name: String,
    pub local_timezone: String,
    pub openai: Option<OpenAISettings>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            boundaries: ClassificationBoundaries::default(),
            ranking: RankingOptions::default(),
            debounce: Duration::from_millis(1000),
            gateway_timeout: Duration::from_secs(12),
            local_name: "You".to_string(),
            local_timezone: "UTC".to_string(),
            openai: None,
        }
    }
}

impl SchedulerConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let defaults = Self::default();
        let b = defaults.boundaries;
        let boundaries = ClassificationBoundaries {
            work_start: config.parsed("WORK_START", b.work_start)?,
            work_end: config.parsed("WORK_END", b.work_end)?,
            wake_start: config.parsed("WAKE_START", b.wake_start)?,
            wake_end: config.parsed("WAKE_END", b.wake_end)?,
        };
        boundaries.validate()?;

        let min_score: f64 = config.parsed("MIN_SCORE", defaults.ranking.min_score)?;
        if !min_score.is_finite() {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "MIN_SCORE must be a finite number, got {}",
                min_score
            )));
        }
        let ranking = RankingOptions {
            top_k: config.parsed("TOP_K", defaults.ranking.top_k)?,
            min_score,
            skip_invalid_timezones: config.parsed(
                "SKIP_INVALID_TIMEZONES",
                defaults.ranking.skip_invalid_timezones,
            )?,
        };

        let gateway_timeout = Duration::from_secs(config.parsed("GATEWAY_TIMEOUT_SECS", 12u64)?);
        let openai = config.get("OPENAI_API_KEY").map(|api_key| OpenAISettings {
            api_key,
            base_url: config.get("OPENAI_BASE_URL").unwrap_or(DEFAULT_BASE_URL.to_string()),
            model: config.get("OPENAI_MODEL").unwrap_or(DEFAULT_MODEL.to_string()),
            timeout: gateway_timeout,
        });

        Ok(Self {
            boundaries,
            ranking,
            debounce: Duration::from_millis(config.parsed("DEBOUNCE_MS", 1000u64)?),
            gateway_timeout,
            local_name: config.get("LOCAL_NAME").unwrap_or(defaults.local_name),
            local_timezone: config.get("LOCAL_TIMEZONE").unwrap_or(defaults.local_timezone),
            openai,
        })
    }

    pub fn ranker(&self) -> Result<SlotRanker> {
        let classifier = HourClassifier::new(self.boundaries)?;
        Ok(SlotRanker::new(OverlapScorer::new(classifier), self.ranking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_lines() {
        let config = AppConfig::parse(
            "# comment\nexport TOP_K=5\nLOCAL_TIMEZONE = \"Europe/Paris\"\n\nLOCAL_NAME='Me'\n",
        )
        .unwrap();
        assert_eq!(config.get("TOP_K").as_deref(), Some("5"));
        assert_eq!(config.get("LOCAL_TIMEZONE").as_deref(), Some("Europe/Paris"));
        assert_eq!(config.get("LOCAL_NAME").as_deref(), Some("Me"));
    }

    #[test]
    fn rejects_lines_without_equals() {
        let err = AppConfig::parse("TOP_K 5").unwrap_err();
        assert!(err.contains("line 1"));
    }

    #[test]
    fn defaults_when_empty() {
        let config = SchedulerConfig::from_app_config(&AppConfig::default()).unwrap();
        assert_eq!(config.boundaries, ClassificationBoundaries::default());
        assert_eq!(config.ranking.top_k, 3);
        assert_eq!(config.ranking.min_score, 0.0);
        assert_eq!(config.debounce, Duration::from_millis(1000));
        assert!(config.openai.is_none());
    }

    #[test]
    fn reads_overrides_and_openai_settings() {
        let app = AppConfig::parse(
            "WORK_START=8\nWORK_END=16\nTOP_K=4\nMIN_SCORE=0.5\nDEBOUNCE_MS=500\nOPENAI_API_KEY=sk-test\nOPENAI_MODEL=gpt-test\nGATEWAY_TIMEOUT_SECS=15",
        )
        .unwrap();
        let config = SchedulerConfig::from_app_config(&app).unwrap();
        assert_eq!(config.boundaries.work_start, 8);
        assert_eq!(config.boundaries.work_end, 16);
        assert_eq!(config.ranking.top_k, 4);
        assert_eq!(config.ranking.min_score, 0.5);
        assert_eq!(config.debounce, Duration::from_millis(500));
        let openai = config.openai.unwrap();
        assert_eq!(openai.api_key, "sk-test");
        assert_eq!(openai.model, "gpt-test");
        assert_eq!(openai.base_url, DEFAULT_BASE_URL);
        assert_eq!(openai.timeout, Duration::from_secs(15));
    }

    #[test]
    fn invalid_boundaries_are_configuration_errors() {
        let app = AppConfig::parse("WORK_START=19").unwrap();
        assert!(matches!(
            SchedulerConfig::from_app_config(&app),
            Err(SchedulerError::InvalidConfiguration(_))
        ));
        let app = AppConfig::parse("TOP_K=three").unwrap();
        assert!(matches!(
            SchedulerConfig::from_app_config(&app),
            Err(SchedulerError::InvalidConfiguration(_))
        ));
    }
}
