//! Read-side contract between the engine and the feedback document store.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::FeedbackRecord;

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Number of registered students, optionally leaving administrators out.
    async fn count_students(&self, exclude_admins: bool) -> AnalysisResult<i64>;

    /// Feedback records dated within `[start, end)`, in submission order.
    async fn query_feedback(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AnalysisResult<Vec<FeedbackRecord>>;
}

/// Half-open interval covering exactly `date`.
pub fn day_range(date: NaiveDate) -> AnalysisResult<(NaiveDate, NaiveDate)> {
    let end = date
        .succ_opt()
        .ok_or_else(|| AnalysisError::InvalidDate(date.to_string()))?;
    Ok((date, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_range_is_one_day_wide() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, end) = day_range(date).unwrap();
        assert_eq!(start, date);
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn day_range_rejects_last_representable_day() {
        assert!(day_range(NaiveDate::MAX).is_err());
    }
}
