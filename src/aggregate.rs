//! Single-pass fold of a day's feedback records into per-meal aggregates,
//! plus the per-meal sentiment blocks derived from them.

use std::cmp::Ordering;

use crate::config::EngineConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{
    CommentRecord, FeedbackRecord, MealSentiment, MealType, NeutralShare, PerMeal, PolarShare,
    Rating, RatingDistribution, ScoredComment, SentimentDistribution, TextSentimentSummary,
    TopComments,
};
use crate::sentiment::{classify_rating, PolarityModel, SentimentBucket, TextSentimentScorer};

/// A non-empty, trimmed comment and the rating it accompanied.
#[derive(Debug, Clone, PartialEq)]
pub struct MealComment {
    pub rating: Rating,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealAggregate {
    pub ratings: Vec<Rating>,
    pub comments: Vec<MealComment>,
    counts: [usize; 5],
}

impl MealAggregate {
    fn record(&mut self, rating: Rating, comment: Option<&str>) {
        self.ratings.push(rating);
        self.counts[(rating.value() - Rating::MIN) as usize] += 1;

        if let Some(text) = comment {
            self.comments.push(MealComment {
                rating,
                text: text.to_string(),
            });
        }
    }

    pub fn responses(&self) -> usize {
        self.ratings.len()
    }

    pub fn average(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let total: u32 = self.ratings.iter().map(|r| u32::from(r.value())).sum();
        Some(total as f64 / self.ratings.len() as f64)
    }

    pub fn distribution(&self) -> RatingDistribution {
        RatingDistribution::from_counts(self.counts)
    }

    /// Comments whose rating falls in `bucket`, in record order, at most `limit`.
    pub fn comments_in(&self, bucket: SentimentBucket, limit: usize) -> Vec<String> {
        self.comments
            .iter()
            .filter(|comment| classify_rating(comment.rating) == bucket)
            .take(limit)
            .map(|comment| comment.text.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayAggregate {
    pub meals: PerMeal<MealAggregate>,
    pub participating_students: usize,
    pub all_comments: Vec<CommentRecord>,
}

impl DayAggregate {
    pub fn rating_count(&self) -> usize {
        self.meals.iter().map(|(_, meal)| meal.responses()).sum()
    }

    /// Mean over every rating of the day, 0 when nothing was rated.
    pub fn overall_rating(&self) -> f64 {
        let count = self.rating_count();
        if count == 0 {
            return 0.0;
        }
        let total: u32 = self
            .meals
            .iter()
            .flat_map(|(_, meal)| meal.ratings.iter())
            .map(|r| u32::from(r.value()))
            .sum();
        total as f64 / count as f64
    }

    /// Unrounded averages of the meals that received at least one rating, in meal order.
    pub fn rated_meal_averages(&self) -> Vec<f64> {
        self.meals
            .iter()
            .filter_map(|(_, meal)| meal.average())
            .collect()
    }
}

/// Folds the day's records into per-meal aggregates.
///
/// Ratings are validated here; an out-of-range rating aborts the pass.
pub fn aggregate_records(records: &[FeedbackRecord]) -> AnalysisResult<DayAggregate> {
    let mut day = DayAggregate::default();

    for record in records {
        let mut participated = false;

        for (meal, entry) in record.meals.iter() {
            let Some(raw) = entry.rating else {
                continue;
            };
            let rating = Rating::try_from(raw).map_err(|_| {
                AnalysisError::analysis(format!(
                    "{meal} rating {raw} from student {} on {} is outside 1..=5",
                    record.student_id, record.date
                ))
            })?;

            let comment = entry.trimmed_comment();
            day.meals[meal].record(rating, comment);
            if let Some(text) = comment {
                day.all_comments.push(CommentRecord {
                    text: text.to_string(),
                    meal,
                    rating,
                });
            }
            participated = true;
        }

        if participated {
            day.participating_students += 1;
        }
    }

    Ok(day)
}

pub fn participation_rate(participating: usize, total_students: i64) -> f64 {
    if total_students <= 0 {
        return 0.0;
    }
    (participating as f64 / total_students as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let mut counts = SentimentCounts::default();
        for rating in ratings {
            counts.add(classify_rating(*rating));
        }
        counts
    }

    pub fn add(&mut self, bucket: SentimentBucket) {
        match bucket {
            SentimentBucket::Positive => self.positive += 1,
            SentimentBucket::Negative => self.negative += 1,
            SentimentBucket::Neutral => self.neutral += 1,
        }
    }

    pub fn get(&self, bucket: SentimentBucket) -> usize {
        match bucket {
            SentimentBucket::Positive => self.positive,
            SentimentBucket::Negative => self.negative,
            SentimentBucket::Neutral => self.neutral,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    /// Bucket with the highest count; ties resolve in [`SentimentBucket::PRIORITY`] order.
    pub fn dominant(&self) -> Option<SentimentBucket> {
        if self.total() == 0 {
            return None;
        }
        let mut best = SentimentBucket::PRIORITY[0];
        for bucket in SentimentBucket::PRIORITY.into_iter().skip(1) {
            if self.get(bucket) > self.get(best) {
                best = bucket;
            }
        }
        Some(best)
    }
}

/// Rating-based sentiment block for one meal, with the comment-text summary attached.
pub fn meal_sentiment(
    meal: &MealAggregate,
    text_sentiment: TextSentimentSummary,
    config: &EngineConfig,
) -> MealSentiment {
    let total = meal.responses();
    if total == 0 {
        return MealSentiment {
            dominant_sentiment: None,
            text_sentiment,
            ..MealSentiment::default()
        };
    }

    let counts = SentimentCounts::from_ratings(&meal.ratings);
    let pct = |count: usize| round_to(count as f64 / total as f64 * 100.0, 1);

    MealSentiment {
        average_rating: round_to(meal.average().unwrap_or(0.0), 2),
        total_responses: total,
        sentiment_distribution: SentimentDistribution {
            positive: PolarShare {
                count: counts.positive,
                percentage: pct(counts.positive),
                sample_comments: meal
                    .comments_in(SentimentBucket::Positive, config.sample_comment_limit),
            },
            negative: PolarShare {
                count: counts.negative,
                percentage: pct(counts.negative),
                sample_comments: meal
                    .comments_in(SentimentBucket::Negative, config.sample_comment_limit),
            },
            neutral: NeutralShare {
                count: counts.neutral,
                percentage: pct(counts.neutral),
            },
        },
        dominant_sentiment: counts.dominant(),
        improvement_areas: meal
            .comments_in(SentimentBucket::Negative, config.improvement_area_limit),
        text_sentiment,
    }
}

/// Runs every collected comment through the text scorer, preserving record order.
pub fn score_comments<M: PolarityModel>(
    comments: &[CommentRecord],
    scorer: &TextSentimentScorer<M>,
) -> Vec<ScoredComment> {
    comments
        .iter()
        .map(|comment| {
            let scored = scorer.score(&comment.text);
            ScoredComment {
                text: comment.text.clone(),
                meal: comment.meal,
                rating: comment.rating,
                polarity: scored.polarity,
                sentiment: scored.bucket,
            }
        })
        .collect()
}

pub fn text_sentiment_summary(scored: &[ScoredComment], meal: MealType) -> TextSentimentSummary {
    let mut counts = SentimentCounts::default();
    let mut polarity_total = 0.0;

    for comment in scored.iter().filter(|c| c.meal == meal) {
        counts.add(comment.sentiment);
        polarity_total += comment.polarity;
    }

    let analyzed = counts.total();
    TextSentimentSummary {
        analyzed_comments: analyzed,
        average_polarity: if analyzed == 0 {
            0.0
        } else {
            round_to(polarity_total / analyzed as f64, 3)
        },
        positive: counts.positive,
        negative: counts.negative,
        neutral: counts.neutral,
    }
}

/// Strongest text-positive and text-negative comments. Equal polarities keep record order.
pub fn top_comments(scored: &[ScoredComment], limit: usize) -> TopComments {
    let mut positive: Vec<&ScoredComment> = scored
        .iter()
        .filter(|c| c.sentiment == SentimentBucket::Positive)
        .collect();
    positive.sort_by(|a, b| b.polarity.partial_cmp(&a.polarity).unwrap_or(Ordering::Equal));

    let mut negative: Vec<&ScoredComment> = scored
        .iter()
        .filter(|c| c.sentiment == SentimentBucket::Negative)
        .collect();
    negative.sort_by(|a, b| a.polarity.partial_cmp(&b.polarity).unwrap_or(Ordering::Equal));

    TopComments {
        positive: positive.into_iter().take(limit).cloned().collect(),
        negative: negative.into_iter().take(limit).cloned().collect(),
    }
}
