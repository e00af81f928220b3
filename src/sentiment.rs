//! Rating-based and comment-based sentiment classification.
//!
//! Ratings map onto buckets with fixed thresholds. Comment text is scored by a
//! [`PolarityModel`]; the bundled [`LexiconModel`] is a word-list scorer tuned for
//! mess food feedback. Model failures never escape [`TextSentimentScorer::score`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::config::EngineConfig;
use crate::models::Rating;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentBucket {
    Positive,
    Negative,
    Neutral,
}

impl SentimentBucket {
    /// Tie-break order when picking a dominant bucket: first one reaching the max wins.
    pub const PRIORITY: [SentimentBucket; 3] = [
        SentimentBucket::Positive,
        SentimentBucket::Negative,
        SentimentBucket::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SentimentBucket::Positive => "positive",
            SentimentBucket::Negative => "negative",
            SentimentBucket::Neutral => "neutral",
        }
    }
}

/// `>= 4` positive, `<= 2` negative, `3` neutral.
pub fn classify_rating(rating: Rating) -> SentimentBucket {
    match rating.value() {
        4..=5 => SentimentBucket::Positive,
        3 => SentimentBucket::Neutral,
        _ => SentimentBucket::Negative,
    }
}

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("comment is empty")]
    EmptyText,

    #[error("polarity model returned a non-finite score")]
    NonFinite,

    #[error("polarity model failed: {0}")]
    Model(String),
}

/// A natural-language polarity model: maps text to a score in `[-1, 1]`.
pub trait PolarityModel {
    fn polarity(&self, text: &str) -> Result<f64, SentimentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextSentiment {
    pub bucket: SentimentBucket,
    pub polarity: f64,
}

impl TextSentiment {
    pub const NEUTRAL: TextSentiment = TextSentiment {
        bucket: SentimentBucket::Neutral,
        polarity: 0.0,
    };
}

/// Best-effort comment scorer. Any model failure degrades to [`TextSentiment::NEUTRAL`].
#[derive(Debug, Clone)]
pub struct TextSentimentScorer<M = LexiconModel> {
    model: M,
    positive_threshold: f64,
    negative_threshold: f64,
}

impl<M: PolarityModel> TextSentimentScorer<M> {
    pub fn new(model: M, config: &EngineConfig) -> Self {
        TextSentimentScorer {
            model,
            positive_threshold: config.positive_polarity_threshold,
            negative_threshold: config.negative_polarity_threshold,
        }
    }

    pub fn score(&self, comment: &str) -> TextSentiment {
        let polarity = self.model.polarity(comment).and_then(|value| {
            if value.is_finite() {
                Ok(value.clamp(-1.0, 1.0))
            } else {
                Err(SentimentError::NonFinite)
            }
        });

        match polarity {
            Ok(polarity) => TextSentiment {
                bucket: self.bucket_for(polarity),
                polarity,
            },
            Err(err) => {
                warn!(error = %err, "text sentiment unavailable, treating comment as neutral");
                TextSentiment::NEUTRAL
            }
        }
    }

    pub fn bucket_for(&self, polarity: f64) -> SentimentBucket {
        if polarity > self.positive_threshold {
            SentimentBucket::Positive
        } else if polarity < self.negative_threshold {
            SentimentBucket::Negative
        } else {
            SentimentBucket::Neutral
        }
    }
}

impl Default for TextSentimentScorer<LexiconModel> {
    fn default() -> Self {
        TextSentimentScorer::new(LexiconModel, &EngineConfig::default())
    }
}

static LEXICON: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        // praise
        ("excellent", 1.0),
        ("delicious", 1.0),
        ("amazing", 0.9),
        ("awesome", 0.9),
        ("perfect", 1.0),
        ("fantastic", 0.9),
        ("wonderful", 0.9),
        ("best", 1.0),
        ("loved", 0.7),
        ("love", 0.5),
        ("great", 0.8),
        ("tasty", 0.8),
        ("yummy", 0.8),
        ("flavourful", 0.7),
        ("flavorful", 0.7),
        ("good", 0.7),
        ("nice", 0.6),
        ("fresh", 0.5),
        ("crispy", 0.4),
        ("crisp", 0.4),
        ("warm", 0.3),
        ("hot", 0.25),
        ("clean", 0.4),
        ("enjoyed", 0.5),
        ("satisfying", 0.5),
        ("better", 0.5),
        ("fine", 0.4),
        ("okay", 0.2),
        ("ok", 0.2),
        ("decent", 0.2),
        ("improved", 0.4),
        ("healthy", 0.5),
        // complaints
        ("average", -0.15),
        ("bland", -0.5),
        ("tasteless", -0.7),
        ("cold", -0.6),
        ("stale", -0.7),
        ("soggy", -0.6),
        ("oily", -0.4),
        ("greasy", -0.5),
        ("salty", -0.3),
        ("raw", -0.3),
        ("undercooked", -0.6),
        ("overcooked", -0.5),
        ("burnt", -0.6),
        ("hard", -0.3),
        ("dirty", -0.7),
        ("smelly", -0.7),
        ("spoiled", -0.9),
        ("rotten", -1.0),
        ("bad", -0.7),
        ("poor", -0.4),
        ("worse", -0.6),
        ("worst", -1.0),
        ("terrible", -1.0),
        ("awful", -1.0),
        ("horrible", -1.0),
        ("disgusting", -1.0),
        ("inedible", -1.0),
        ("hate", -0.8),
        ("disappointing", -0.6),
        ("disappointed", -0.75),
        ("insufficient", -0.4),
        ("less", -0.2),
        ("late", -0.3),
        ("sick", -0.7),
    ]
    .into_iter()
    .collect()
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("very", 1.3),
        ("really", 1.3),
        ("so", 1.3),
        ("too", 1.3),
        ("super", 1.3),
        ("extremely", 1.5),
        ("absolutely", 1.5),
    ]
    .into_iter()
    .collect()
});

const NEGATORS: &[&str] = &["not", "no", "never", "hardly", "nothing", "without"];

fn is_negator(token: &str) -> bool {
    NEGATORS.contains(&token) || token.ends_with("n't")
}

/// Lexicon polarity scorer.
///
/// Each word found in the lexicon contributes its weight; a preceding intensifier
/// scales it, a preceding negator flips and halves it. The comment score is the mean
/// over contributing words, so `"Great"` scores 0.8 and `"not good"` scores -0.35.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconModel;

impl PolarityModel for LexiconModel {
    fn polarity(&self, text: &str) -> Result<f64, SentimentError> {
        let lowered = text.trim().to_lowercase();
        if lowered.is_empty() {
            return Err(SentimentError::EmptyText);
        }

        let tokens: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphabetic() || c == '\''))
            .map(|token| token.trim_matches('\''))
            .filter(|token| !token.is_empty())
            .collect();

        let mut total = 0.0;
        let mut hits = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = LEXICON.get(*token) else {
                continue;
            };

            let mut score = base;
            let mut modifier_at = i;

            if i > 0 {
                if let Some(factor) = INTENSIFIERS.get(tokens[i - 1]) {
                    score *= factor;
                    modifier_at = i - 1;
                }
            }
            if modifier_at > 0 && is_negator(tokens[modifier_at - 1]) {
                score *= -0.5;
            }

            total += score.clamp(-1.0, 1.0);
            hits += 1;
        }

        if hits == 0 {
            return Ok(0.0);
        }
        Ok((total / hits as f64).clamp(-1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingModel;

    impl PolarityModel for FailingModel {
        fn polarity(&self, _text: &str) -> Result<f64, SentimentError> {
            Err(SentimentError::Model("corpus not loaded".to_string()))
        }
    }

    struct FixedModel(f64);

    impl PolarityModel for FixedModel {
        fn polarity(&self, _text: &str) -> Result<f64, SentimentError> {
            Ok(self.0)
        }
    }

    fn rating(value: i32) -> Rating {
        Rating::try_from(value).unwrap()
    }

    #[test]
    fn rating_buckets_cover_domain() {
        assert_eq!(classify_rating(rating(5)), SentimentBucket::Positive);
        assert_eq!(classify_rating(rating(4)), SentimentBucket::Positive);
        assert_eq!(classify_rating(rating(3)), SentimentBucket::Neutral);
        assert_eq!(classify_rating(rating(2)), SentimentBucket::Negative);
        assert_eq!(classify_rating(rating(1)), SentimentBucket::Negative);
    }

    #[test]
    fn lexicon_scores_simple_comments() {
        let model = LexiconModel;
        assert!((model.polarity("Great").unwrap() - 0.8).abs() < 1e-9);
        assert!((model.polarity("Cold").unwrap() + 0.6).abs() < 1e-9);
        assert_eq!(model.polarity("served at 8pm").unwrap(), 0.0);
    }

    #[test]
    fn lexicon_handles_negation_and_intensifiers() {
        let model = LexiconModel;
        assert!((model.polarity("not good").unwrap() + 0.35).abs() < 1e-9);
        assert!((model.polarity("wasn't tasty").unwrap() + 0.4).abs() < 1e-9);
        assert_eq!(model.polarity("very tasty").unwrap(), 1.0);
        assert!(model.polarity("not very good").unwrap() < 0.0);
    }

    #[test]
    fn lexicon_rejects_empty_text() {
        assert!(matches!(
            LexiconModel.polarity("   "),
            Err(SentimentError::EmptyText)
        ));
    }

    #[test]
    fn scorer_buckets_with_thresholds() {
        let scorer = TextSentimentScorer::default();
        assert_eq!(scorer.score("Great").bucket, SentimentBucket::Positive);
        assert_eq!(scorer.score("Cold").bucket, SentimentBucket::Negative);
        assert_eq!(scorer.score("rice and dal").bucket, SentimentBucket::Neutral);
        assert_eq!(scorer.bucket_for(0.1), SentimentBucket::Neutral);
        assert_eq!(scorer.bucket_for(-0.1), SentimentBucket::Neutral);
        assert_eq!(scorer.bucket_for(0.11), SentimentBucket::Positive);
    }

    #[test]
    fn scorer_falls_back_to_neutral_on_model_failure() {
        let scorer = TextSentimentScorer::new(FailingModel, &EngineConfig::default());
        assert_eq!(scorer.score("Great"), TextSentiment::NEUTRAL);

        let scorer = TextSentimentScorer::new(FixedModel(f64::NAN), &EngineConfig::default());
        assert_eq!(scorer.score("Great"), TextSentiment::NEUTRAL);
    }

    #[test]
    fn scorer_clamps_out_of_range_polarity() {
        let scorer = TextSentimentScorer::new(FixedModel(3.5), &EngineConfig::default());
        let scored = scorer.score("anything");
        assert_eq!(scored.polarity, 1.0);
        assert_eq!(scored.bucket, SentimentBucket::Positive);
    }
}
