use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::sentiment::SentimentBucket;

/// The four fixed daily meal slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MealType {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Morning,
        MealType::Afternoon,
        MealType::Evening,
        MealType::Night,
    ];

    /// Storage key, as written in the `meal_type` column.
    pub fn key(self) -> &'static str {
        match self {
            MealType::Morning => "morning",
            MealType::Afternoon => "afternoon",
            MealType::Evening => "evening",
            MealType::Night => "night",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MealType::Morning => "Breakfast",
            MealType::Afternoon => "Lunch",
            MealType::Evening => "Dinner",
            MealType::Night => "Night Snacks",
        }
    }

    fn slot(self) -> usize {
        match self {
            MealType::Morning => 0,
            MealType::Afternoon => 1,
            MealType::Evening => 2,
            MealType::Night => 3,
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for MealType {
    type Err = AnalysisError;

    /// Accepts either the storage key or the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        MealType::ALL
            .into_iter()
            .find(|meal| {
                meal.key().eq_ignore_ascii_case(wanted)
                    || meal.display_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| AnalysisError::analysis(format!("unknown meal type `{wanted}`")))
    }
}

impl Serialize for MealType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

/// One value per meal slot, serialized as a map keyed by display name in meal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerMeal<T> {
    slots: [T; 4],
}

impl<T> PerMeal<T> {
    pub fn from_fn(mut f: impl FnMut(MealType) -> T) -> Self {
        PerMeal {
            slots: MealType::ALL.map(&mut f),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MealType, &T)> {
        MealType::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(MealType, &T) -> U) -> PerMeal<U> {
        PerMeal::from_fn(|meal| f(meal, &self[meal]))
    }
}

impl<T> Index<MealType> for PerMeal<T> {
    type Output = T;

    fn index(&self, meal: MealType) -> &T {
        &self.slots[meal.slot()]
    }
}

impl<T> IndexMut<MealType> for PerMeal<T> {
    fn index_mut(&mut self, meal: MealType) -> &mut T {
        &mut self.slots[meal.slot()]
    }
}

impl<T: Serialize> Serialize for PerMeal<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for (meal, value) in self.iter() {
            map.serialize_entry(meal.display_name(), value)?;
        }
        map.end()
    }
}

/// A star rating that has passed boundary validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for Rating {
    type Error = AnalysisError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if (Rating::MIN as i32..=Rating::MAX as i32).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(AnalysisError::Analysis(format!(
                "rating {value} is outside 1..=5"
            )))
        }
    }
}

/// Raw meal slot as read from the store. Validation happens during aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealEntry {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

impl MealEntry {
    pub fn rated(rating: i32, comment: Option<&str>) -> Self {
        MealEntry {
            rating: Some(rating),
            comment: comment.map(str::to_string),
        }
    }

    /// The comment with surrounding whitespace removed, or `None` if nothing is left.
    pub fn trimmed_comment(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// One student's feedback document for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRecord {
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub meals: PerMeal<MealEntry>,
}

impl FeedbackRecord {
    pub fn new(student_id: Uuid, date: NaiveDate) -> Self {
        FeedbackRecord {
            student_id,
            date,
            meals: PerMeal::default(),
        }
    }

    pub fn with_meal(mut self, meal: MealType, entry: MealEntry) -> Self {
        self.meals[meal] = entry;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_students: i64,
    pub participating_students: usize,
    pub participation_rate: f64,
    pub overall_rating: f64,
    pub quality_consistency_score: f64,
}

impl Overview {
    pub fn empty(total_students: i64) -> Self {
        Overview {
            total_students,
            participating_students: 0,
            participation_rate: 0.0,
            overall_rating: 0.0,
            quality_consistency_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingDistribution {
    #[serde(rename = "1_star")]
    pub one_star: usize,
    #[serde(rename = "2_star")]
    pub two_star: usize,
    #[serde(rename = "3_star")]
    pub three_star: usize,
    #[serde(rename = "4_star")]
    pub four_star: usize,
    #[serde(rename = "5_star")]
    pub five_star: usize,
}

impl RatingDistribution {
    pub fn from_counts(counts: [usize; 5]) -> Self {
        let [one_star, two_star, three_star, four_star, five_star] = counts;
        RatingDistribution {
            one_star,
            two_star,
            three_star,
            four_star,
            five_star,
        }
    }

    pub fn total(&self) -> usize {
        self.one_star + self.two_star + self.three_star + self.four_star + self.five_star
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolarShare {
    pub count: usize,
    pub percentage: f64,
    pub sample_comments: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NeutralShare {
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentDistribution {
    pub positive: PolarShare,
    pub negative: PolarShare,
    pub neutral: NeutralShare,
}

/// Comment-text sentiment for one meal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextSentimentSummary {
    pub analyzed_comments: usize,
    pub average_polarity: f64,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MealSentiment {
    pub average_rating: f64,
    pub total_responses: usize,
    pub sentiment_distribution: SentimentDistribution,
    #[serde(serialize_with = "dominant_or_none")]
    pub dominant_sentiment: Option<SentimentBucket>,
    pub improvement_areas: Vec<String>,
    pub text_sentiment: TextSentimentSummary,
}

fn dominant_or_none<S: Serializer>(
    dominant: &Option<SentimentBucket>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match dominant {
        Some(bucket) => bucket.serialize(serializer),
        None => serializer.serialize_str("none"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub text: String,
    pub meal: MealType,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredComment {
    pub text: String,
    pub meal: MealType,
    pub rating: Rating,
    pub polarity: f64,
    pub sentiment: SentimentBucket,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopComments {
    pub positive: Vec<ScoredComment>,
    pub negative: Vec<ScoredComment>,
}

/// The `data` block of a successful daily report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnalysis {
    pub overview: Overview,
    pub daily_summary: String,
    pub average_rating_per_meal: PerMeal<f64>,
    pub student_rating_per_meal: PerMeal<usize>,
    pub feedback_distribution_per_meal: PerMeal<RatingDistribution>,
    pub sentiment_analysis_per_meal: PerMeal<MealSentiment>,
    pub all_comments: Vec<CommentRecord>,
    pub top_comments: TopComments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataKind {
    FutureDate,
    NoFeedback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoDataPayload {
    pub overview: Overview,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DailyReport {
    Success {
        date: NaiveDate,
        timestamp: DateTime<Utc>,
        data: DailyAnalysis,
    },
    NoData {
        date: NaiveDate,
        timestamp: DateTime<Utc>,
        #[serde(rename = "type")]
        kind: NoDataKind,
        message: String,
        data: NoDataPayload,
    },
}

impl DailyReport {
    pub fn success(date: NaiveDate, data: DailyAnalysis) -> Self {
        DailyReport::Success {
            date,
            timestamp: Utc::now(),
            data,
        }
    }

    pub fn future_date(date: NaiveDate) -> Self {
        DailyReport::NoData {
            date,
            timestamp: Utc::now(),
            kind: NoDataKind::FutureDate,
            message: format!("Feedback will be available after {date}"),
            data: NoDataPayload {
                overview: Overview::empty(0),
            },
        }
    }

    pub fn no_feedback(date: NaiveDate, total_students: i64) -> Self {
        DailyReport::NoData {
            date,
            timestamp: Utc::now(),
            kind: NoDataKind::NoFeedback,
            message: "No feedback found for this date".to_string(),
            data: NoDataPayload {
                overview: Overview::empty(total_students),
            },
        }
    }

    pub fn overview(&self) -> &Overview {
        match self {
            DailyReport::Success { data, .. } => &data.overview,
            DailyReport::NoData { data, .. } => &data.overview,
        }
    }

    pub fn analysis(&self) -> Option<&DailyAnalysis> {
        match self {
            DailyReport::Success { data, .. } => Some(data),
            DailyReport::NoData { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_parses_keys_and_display_names() {
        assert_eq!("morning".parse::<MealType>().unwrap(), MealType::Morning);
        assert_eq!("Night Snacks".parse::<MealType>().unwrap(), MealType::Night);
        assert_eq!(" lunch ".parse::<MealType>().unwrap(), MealType::Afternoon);
        assert!("brunch".parse::<MealType>().is_err());
    }

    #[test]
    fn rating_rejects_out_of_range_values() {
        assert_eq!(Rating::try_from(1).unwrap().value(), 1);
        assert_eq!(Rating::try_from(5).unwrap().value(), 5);
        assert!(Rating::try_from(0).is_err());
        assert!(Rating::try_from(6).is_err());
    }

    #[test]
    fn whitespace_comment_is_absent() {
        let entry = MealEntry::rated(4, Some("   "));
        assert_eq!(entry.trimmed_comment(), None);

        let entry = MealEntry::rated(4, Some("  crisp dosa "));
        assert_eq!(entry.trimmed_comment(), Some("crisp dosa"));
    }

    #[test]
    fn per_meal_serializes_in_meal_order() {
        let counts = PerMeal::from_fn(|meal| meal.key().len());
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(
            json,
            r#"{"Breakfast":7,"Lunch":9,"Dinner":7,"Night Snacks":5}"#
        );
    }

    #[test]
    fn no_feedback_report_shape() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let json = serde_json::to_value(DailyReport::no_feedback(date, 50)).unwrap();

        assert_eq!(json["status"], "no_data");
        assert_eq!(json["type"], "no_feedback");
        assert_eq!(json["date"], "2025-03-14");
        assert_eq!(json["data"]["overview"]["totalStudents"], 50);
        assert_eq!(json["data"]["overview"]["participatingStudents"], 0);
    }
}
