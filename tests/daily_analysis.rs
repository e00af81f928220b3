use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use mess_feedback_analytics::config::EngineConfig;
use mess_feedback_analytics::sentiment::SentimentBucket;
use mess_feedback_analytics::{
    AnalysisError, AnalysisResult, DailyAnalyzer, DailyReport, FeedbackRecord, FeedbackStore,
    MealEntry, MealType,
};

struct MemoryStore {
    students: i64,
    records: Vec<FeedbackRecord>,
    fail_reads: bool,
    count_calls: AtomicUsize,
    feedback_ranges: Mutex<Vec<(NaiveDate, NaiveDate)>>,
}

impl MemoryStore {
    fn new(students: i64, records: Vec<FeedbackRecord>) -> Self {
        MemoryStore {
            students,
            records,
            fail_reads: false,
            count_calls: AtomicUsize::new(0),
            feedback_ranges: Mutex::new(Vec::new()),
        }
    }

    fn unreachable() -> Self {
        MemoryStore {
            fail_reads: true,
            ..MemoryStore::new(0, Vec::new())
        }
    }

    fn feedback_queries(&self) -> Vec<(NaiveDate, NaiveDate)> {
        self.feedback_ranges.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn count_students(&self, exclude_admins: bool) -> AnalysisResult<i64> {
        assert!(exclude_admins);
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(AnalysisError::database("connection refused"));
        }
        Ok(self.students)
    }

    async fn query_feedback(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AnalysisResult<Vec<FeedbackRecord>> {
        self.feedback_ranges.lock().unwrap().push((start, end));
        if self.fail_reads {
            return Err(AnalysisError::database("connection refused"));
        }
        Ok(self
            .records
            .iter()
            .filter(|record| record.date >= start && record.date < end)
            .cloned()
            .collect())
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn analyzer() -> DailyAnalyzer {
    DailyAnalyzer::new(EngineConfig::default())
}

#[tokio::test]
async fn empty_day_reports_no_feedback_with_roster_size() {
    let store = MemoryStore::new(50, Vec::new());

    let report = analyzer().analyze_day(&store, day(14), day(14)).await.unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "no_data");
    assert_eq!(json["type"], "no_feedback");
    let overview = &json["data"]["overview"];
    assert_eq!(overview["totalStudents"], 50);
    assert_eq!(overview["participatingStudents"], 0);
    assert_eq!(overview["participationRate"], 0.0);
    assert_eq!(overview["overallRating"], 0.0);
}

#[tokio::test]
async fn future_day_skips_the_store() {
    let store = MemoryStore::new(50, Vec::new());

    let report = analyzer().analyze_day(&store, day(15), day(14)).await.unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "no_data");
    assert_eq!(json["type"], "future_date");
    assert_eq!(json["data"]["overview"]["totalStudents"], 0);
    assert!(store.feedback_queries().is_empty());
    assert_eq!(store.count_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn single_record_breakfast_and_lunch() {
    let record = FeedbackRecord::new(Uuid::new_v4(), day(14))
        .with_meal(MealType::Morning, MealEntry::rated(5, Some("Great")))
        .with_meal(MealType::Afternoon, MealEntry::rated(1, Some("Cold")));
    let store = MemoryStore::new(1, vec![record]);

    let report = analyzer().analyze_day(&store, day(14), day(14)).await.unwrap();
    let data = report.analysis().expect("success report");

    assert_eq!(data.overview.participating_students, 1);
    assert_eq!(data.overview.participation_rate, 100.0);
    assert_eq!(data.overview.overall_rating, 3.0);
    assert_eq!(data.average_rating_per_meal[MealType::Morning], 5.0);
    assert_eq!(data.average_rating_per_meal[MealType::Afternoon], 1.0);

    let breakfast = &data.sentiment_analysis_per_meal[MealType::Morning];
    let lunch = &data.sentiment_analysis_per_meal[MealType::Afternoon];
    assert_eq!(breakfast.dominant_sentiment, Some(SentimentBucket::Positive));
    assert_eq!(lunch.dominant_sentiment, Some(SentimentBucket::Negative));
    assert_eq!(lunch.improvement_areas, vec!["Cold".to_string()]);
    assert_eq!(breakfast.text_sentiment.positive, 1);
    assert_eq!(lunch.text_sentiment.negative, 1);

    assert_eq!(data.all_comments.len(), 2);
    assert_eq!(data.all_comments[0].text, "Great");
    assert_eq!(data.all_comments[1].meal, MealType::Afternoon);

    // averages 5 and 1 are far apart: cv ~94%, floored at zero
    assert_eq!(data.overview.quality_consistency_score, 0.0);
    assert!(data.daily_summary.starts_with("Mixed feedback today"));
    assert!(data.daily_summary.contains("Lunch needs attention"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["feedbackDistributionPerMeal"]["Lunch"]["1_star"], 1);
    assert_eq!(
        json["data"]["sentimentAnalysisPerMeal"]["Dinner"]["dominant_sentiment"],
        "none"
    );
    assert_eq!(json["data"]["allComments"][0]["meal"], "Breakfast");
}

#[tokio::test]
async fn store_is_queried_with_a_half_open_day() {
    let records = vec![
        FeedbackRecord::new(Uuid::new_v4(), day(13))
            .with_meal(MealType::Evening, MealEntry::rated(2, None)),
        FeedbackRecord::new(Uuid::new_v4(), day(14))
            .with_meal(MealType::Evening, MealEntry::rated(4, None)),
        FeedbackRecord::new(Uuid::new_v4(), day(15))
            .with_meal(MealType::Evening, MealEntry::rated(1, None)),
    ];
    let store = MemoryStore::new(3, records);

    let report = analyzer().analyze_day(&store, day(14), day(20)).await.unwrap();

    assert_eq!(store.feedback_queries(), vec![(day(14), day(15))]);
    assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
    let data = report.analysis().expect("success report");
    assert_eq!(data.student_rating_per_meal[MealType::Evening], 1);
    assert_eq!(data.overview.overall_rating, 4.0);
}

#[tokio::test]
async fn unreachable_store_is_a_database_error() {
    let store = MemoryStore::unreachable();

    let err = analyzer()
        .analyze_day(&store, day(14), day(14))
        .await
        .unwrap_err();

    assert_eq!(err.code().as_str(), "DATABASE_ERROR");
}

#[tokio::test]
async fn corrupt_rating_is_an_analysis_error() {
    let record = FeedbackRecord::new(Uuid::new_v4(), day(14))
        .with_meal(MealType::Night, MealEntry::rated(9, Some("??")));
    let store = MemoryStore::new(10, vec![record]);

    let err = analyzer()
        .analyze_day(&store, day(14), day(14))
        .await
        .unwrap_err();

    assert_eq!(err.code().as_str(), "ANALYSIS_ERROR");
}

#[tokio::test]
async fn full_day_metrics_hold_together() {
    let ratings: [[Option<i32>; 4]; 5] = [
        [Some(5), Some(3), Some(2), None],
        [Some(4), Some(2), None, Some(4)],
        [Some(4), Some(3), Some(4), Some(5)],
        [None, None, Some(1), None],
        [None, None, None, None],
    ];
    let records: Vec<FeedbackRecord> = ratings
        .iter()
        .map(|row| {
            MealType::ALL.into_iter().zip(row.iter()).fold(
                FeedbackRecord::new(Uuid::new_v4(), day(14)),
                |record, (meal, rating)| {
                    record.with_meal(
                        meal,
                        MealEntry {
                            rating: *rating,
                            comment: None,
                        },
                    )
                },
            )
        })
        .collect();
    let store = MemoryStore::new(8, records);

    let first = analyzer().analyze_day(&store, day(14), day(14)).await.unwrap();
    let second = analyzer().analyze_day(&store, day(14), day(14)).await.unwrap();

    let data = first.analysis().expect("success report");
    assert_eq!(data.overview.participating_students, 4);
    assert_eq!(data.overview.participation_rate, 50.0);
    // 37 stars over 11 ratings
    assert_eq!(data.overview.overall_rating, 3.36);

    for (meal, distribution) in data.feedback_distribution_per_meal.iter() {
        assert_eq!(distribution.total(), data.student_rating_per_meal[meal]);
    }

    let score = data.overview.quality_consistency_score;
    assert!(score > 0.0 && score < 100.0, "score {score}");

    match (&first, &second) {
        (DailyReport::Success { data: a, .. }, DailyReport::Success { data: b, .. }) => {
            assert_eq!(
                serde_json::to_string(a).unwrap(),
                serde_json::to_string(b).unwrap()
            );
        }
        _ => panic!("expected two successful reports"),
    }
}
