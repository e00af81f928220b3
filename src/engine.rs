//! Orchestration of one day's analysis: store reads, aggregation, sentiment,
//! consistency and summary, assembled into a [`DailyReport`].

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::aggregate::{
    aggregate_records, meal_sentiment, participation_rate, round_to, score_comments,
    text_sentiment_summary, top_comments,
};
use crate::config::EngineConfig;
use crate::consistency::consistency_score;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{DailyAnalysis, DailyReport, FeedbackRecord, Overview};
use crate::sentiment::{LexiconModel, PolarityModel, TextSentimentScorer};
use crate::store::{day_range, FeedbackStore};
use crate::summary::synthesize;

/// Parses a `YYYY-MM-DD` day string.
pub fn parse_day(raw: &str) -> AnalysisResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AnalysisError::InvalidDate(raw.to_string()))
}

pub struct DailyAnalyzer<M = LexiconModel> {
    scorer: TextSentimentScorer<M>,
    config: EngineConfig,
}

impl DailyAnalyzer<LexiconModel> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_model(LexiconModel, config)
    }
}

impl<M: PolarityModel> DailyAnalyzer<M> {
    pub fn with_model(model: M, config: EngineConfig) -> Self {
        DailyAnalyzer {
            scorer: TextSentimentScorer::new(model, &config),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the full pipeline for one day.
    ///
    /// Days after `today` short-circuit without touching the store. Store failures
    /// and aggregation faults are returned as errors, never folded into `no_data`.
    #[tracing::instrument(skip(self, store), fields(date = %date))]
    pub async fn analyze_day<S>(
        &self,
        store: &S,
        date: NaiveDate,
        today: NaiveDate,
    ) -> AnalysisResult<DailyReport>
    where
        S: FeedbackStore + ?Sized,
    {
        if date > today {
            info!(%today, "requested day is in the future");
            return Ok(DailyReport::future_date(date));
        }

        let (start, end) = day_range(date)?;
        let total_students = store.count_students(true).await?;
        let records = store.query_feedback(start, end).await?;
        debug!(total_students, records = records.len(), "store reads complete");

        if records.is_empty() {
            info!(total_students, "no feedback recorded");
            return Ok(DailyReport::no_feedback(date, total_students));
        }

        let data = self.analyze_records(&records, total_students)?;
        info!(
            participating = data.overview.participating_students,
            overall_rating = data.overview.overall_rating,
            consistency = data.overview.quality_consistency_score,
            "daily analysis complete"
        );
        Ok(DailyReport::success(date, data))
    }

    /// The pure aggregation pass over an already-fetched record set.
    pub fn analyze_records(
        &self,
        records: &[FeedbackRecord],
        total_students: i64,
    ) -> AnalysisResult<DailyAnalysis> {
        let day = aggregate_records(records)?;
        let scored = score_comments(&day.all_comments, &self.scorer);

        let sentiment_analysis_per_meal = day.meals.map(|meal, aggregate| {
            meal_sentiment(aggregate, text_sentiment_summary(&scored, meal), &self.config)
        });

        let overall_rating = round_to(day.overall_rating(), 2);
        let participation = round_to(
            participation_rate(day.participating_students, total_students),
            1,
        );
        let consistency = round_to(
            consistency_score(&day.rated_meal_averages(), self.config.consistency_penalty),
            1,
        );

        let daily_summary = synthesize(
            overall_rating,
            participation,
            &sentiment_analysis_per_meal,
            consistency,
        );

        Ok(DailyAnalysis {
            overview: Overview {
                total_students,
                participating_students: day.participating_students,
                participation_rate: participation,
                overall_rating,
                quality_consistency_score: consistency,
            },
            daily_summary,
            average_rating_per_meal: day
                .meals
                .map(|_, meal| round_to(meal.average().unwrap_or(0.0), 2)),
            student_rating_per_meal: day.meals.map(|_, meal| meal.responses()),
            feedback_distribution_per_meal: day.meals.map(|_, meal| meal.distribution()),
            sentiment_analysis_per_meal,
            top_comments: top_comments(&scored, self.config.top_comment_limit),
            all_comments: day.all_comments,
        })
    }
}
