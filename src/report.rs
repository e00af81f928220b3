use std::fmt::Write;

use crate::models::{DailyReport, NoDataKind};

/// Renders a daily report as markdown for the mess committee.
pub fn build_report(report: &DailyReport) -> String {
    let mut output = String::new();

    match report {
        DailyReport::NoData {
            date,
            kind,
            message,
            data,
            ..
        } => {
            let _ = writeln!(output, "# Daily Food Feedback Report");
            let _ = writeln!(output, "Generated for {date}");
            let _ = writeln!(output);
            let _ = writeln!(output, "{message}.");
            if *kind == NoDataKind::NoFeedback {
                let _ = writeln!(
                    output,
                    "{} registered students, none submitted a rating.",
                    data.overview.total_students
                );
            }
        }
        DailyReport::Success { date, data, .. } => {
            let overview = &data.overview;

            let _ = writeln!(output, "# Daily Food Feedback Report");
            let _ = writeln!(output, "Generated for {date}");
            let _ = writeln!(output);
            let _ = writeln!(output, "{}", data.daily_summary);
            let _ = writeln!(output);
            let _ = writeln!(output, "## Overview");
            let _ = writeln!(
                output,
                "- Participation: {} of {} students ({:.1}%)",
                overview.participating_students,
                overview.total_students,
                overview.participation_rate
            );
            let _ = writeln!(output, "- Overall rating: {:.2}/5", overview.overall_rating);
            let _ = writeln!(
                output,
                "- Quality consistency: {:.1}/100",
                overview.quality_consistency_score
            );

            let _ = writeln!(output);
            let _ = writeln!(output, "## Meals");
            let _ = writeln!(
                output,
                "| Meal | Responses | Average | Positive | Negative | Dominant |"
            );
            let _ = writeln!(output, "|---|---|---|---|---|---|");
            for (meal, sentiment) in data.sentiment_analysis_per_meal.iter() {
                let dominant = sentiment
                    .dominant_sentiment
                    .map(|bucket| bucket.as_str())
                    .unwrap_or("none");
                let _ = writeln!(
                    output,
                    "| {} | {} | {:.2} | {:.1}% | {:.1}% | {} |",
                    meal,
                    sentiment.total_responses,
                    sentiment.average_rating,
                    sentiment.sentiment_distribution.positive.percentage,
                    sentiment.sentiment_distribution.negative.percentage,
                    dominant
                );
            }

            let _ = writeln!(output);
            let _ = writeln!(output, "## Improvement Areas");
            let mut any_areas = false;
            for (meal, sentiment) in data.sentiment_analysis_per_meal.iter() {
                for area in &sentiment.improvement_areas {
                    let _ = writeln!(output, "- {meal}: {area}");
                    any_areas = true;
                }
            }
            if !any_areas {
                let _ = writeln!(output, "No low-rated comments today.");
            }

            let _ = writeln!(output);
            let _ = writeln!(output, "## Standout Comments");
            if data.top_comments.positive.is_empty() {
                let _ = writeln!(output, "No clearly positive comments today.");
            } else {
                for comment in &data.top_comments.positive {
                    let _ = writeln!(
                        output,
                        "- {} ({}, {} stars): {}",
                        comment.meal,
                        comment.sentiment.as_str(),
                        comment.rating.value(),
                        comment.text
                    );
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::DailyAnalyzer;
    use crate::models::{FeedbackRecord, MealEntry, MealType};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn success_report_lists_meals_and_improvements() {
        let records = vec![FeedbackRecord::new(Uuid::new_v4(), date())
            .with_meal(MealType::Morning, MealEntry::rated(5, Some("Great")))
            .with_meal(MealType::Afternoon, MealEntry::rated(1, Some("Cold")))];
        let data = DailyAnalyzer::new(EngineConfig::default())
            .analyze_records(&records, 1)
            .unwrap();

        let report = build_report(&DailyReport::success(date(), data));

        assert!(report.starts_with("# Daily Food Feedback Report\nGenerated for 2025-03-14\n"));
        assert!(report.contains("- Participation: 1 of 1 students (100.0%)"));
        assert!(report.contains("| Lunch | 1 | 1.00 | 0.0% | 100.0% | negative |"));
        assert!(report.contains("| Dinner | 0 | 0.00 | 0.0% | 0.0% | none |"));
        assert!(report.contains("- Lunch: Cold"));
        assert!(report.contains("- Breakfast (positive, 5 stars): Great"));
    }

    #[test]
    fn no_feedback_report_mentions_roster() {
        let report = build_report(&DailyReport::no_feedback(date(), 50));
        assert!(report.contains("No feedback found for this date."));
        assert!(report.contains("50 registered students"));
    }
}
