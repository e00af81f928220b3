use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::{AnalysisError, AnalysisResult};

/// Process-level settings for the CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> AnalysisResult<Self> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            AnalysisError::config("DATABASE_URL must be set to a production Postgres instance")
        })?;

        Ok(Self {
            database_url,
            max_connections: try_load("DATABASE_MAX_CONNECTIONS", 5)?,
        })
    }
}

/// Tunable constants of the aggregation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Points of consistency lost per percentage point of coefficient of variation.
    pub consistency_penalty: f64,
    pub positive_polarity_threshold: f64,
    pub negative_polarity_threshold: f64,
    pub improvement_area_limit: usize,
    pub sample_comment_limit: usize,
    pub top_comment_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            consistency_penalty: 2.0,
            positive_polarity_threshold: 0.1,
            negative_polarity_threshold: -0.1,
            improvement_area_limit: 2,
            sample_comment_limit: 2,
            top_comment_limit: 3,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> AnalysisResult<Self> {
        let defaults = Self::default();
        let config = Self {
            consistency_penalty: try_load(
                "FEEDBACK_CONSISTENCY_PENALTY",
                defaults.consistency_penalty,
            )?,
            positive_polarity_threshold: try_load(
                "FEEDBACK_POSITIVE_POLARITY",
                defaults.positive_polarity_threshold,
            )?,
            negative_polarity_threshold: try_load(
                "FEEDBACK_NEGATIVE_POLARITY",
                defaults.negative_polarity_threshold,
            )?,
            improvement_area_limit: try_load(
                "FEEDBACK_IMPROVEMENT_LIMIT",
                defaults.improvement_area_limit,
            )?,
            sample_comment_limit: try_load("FEEDBACK_SAMPLE_LIMIT", defaults.sample_comment_limit)?,
            top_comment_limit: try_load("FEEDBACK_TOP_COMMENTS", defaults.top_comment_limit)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if !self.consistency_penalty.is_finite() || self.consistency_penalty < 0.0 {
            return Err(AnalysisError::config(format!(
                "consistency penalty must be a non-negative number, got {}",
                self.consistency_penalty
            )));
        }
        if self.negative_polarity_threshold > self.positive_polarity_threshold {
            return Err(AnalysisError::config(format!(
                "negative polarity threshold {} is above positive threshold {}",
                self.negative_polarity_threshold, self.positive_polarity_threshold
            )));
        }
        Ok(())
    }
}

fn try_load<T>(key: &str, default: T) -> AnalysisResult<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            AnalysisError::config(format!("invalid {key} value `{raw}`: {e}"))
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
