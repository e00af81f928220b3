use std::cmp::Ordering;

use crate::models::{MealSentiment, MealType, PerMeal};

pub const NO_DATA_SUMMARY: &str = "No feedback responses were recorded for this day.";

fn opening(overall_rating: f64) -> &'static str {
    match overall_rating {
        r if r >= 4.0 => "Excellent feedback today",
        r if r >= 3.5 => "Positive feedback today",
        r if r >= 2.5 => "Mixed feedback today",
        _ => "Concerns raised today",
    }
}

fn consistency_phrase(score: f64) -> &'static str {
    match score {
        s if s >= 70.0 => "Meal quality was good and consistent across the day",
        s if s >= 40.0 => "Meal quality showed moderate variation between meals",
        _ => "Meal quality showed significant variation between meals",
    }
}

/// Composes the daily narrative from the aggregated metrics.
///
/// Meals are ranked by average rating with a stable sort, so equal averages keep
/// meal order (Breakfast first). The consistency sentence needs at least two meals
/// with responses.
pub fn synthesize(
    overall_rating: f64,
    participation_rate: f64,
    per_meal: &PerMeal<MealSentiment>,
    consistency_score: f64,
) -> String {
    let mut ranked: Vec<(MealType, &MealSentiment)> = per_meal
        .iter()
        .filter(|(_, sentiment)| sentiment.total_responses > 0)
        .collect();

    if ranked.is_empty() {
        return NO_DATA_SUMMARY.to_string();
    }

    ranked.sort_by(|a, b| {
        b.1.average_rating
            .partial_cmp(&a.1.average_rating)
            .unwrap_or(Ordering::Equal)
    });

    let mut sentences = vec![format!(
        "{} with an average rating of {:.2}/5 and {:.1}% participation.",
        opening(overall_rating),
        overall_rating,
        participation_rate
    )];

    let (best_meal, best) = ranked[0];
    if best.average_rating >= 4.0 {
        sentences.push(format!(
            "{} was the standout meal at {:.2}/5.",
            best_meal, best.average_rating
        ));
    } else if best.average_rating >= 3.0 {
        sentences.push(format!(
            "{} performed best at {:.2}/5.",
            best_meal, best.average_rating
        ));
    }

    let (worst_meal, worst) = ranked[ranked.len() - 1];
    if worst.average_rating < 3.0 {
        sentences.push(format!(
            "{} needs attention at {:.2}/5, with {:.1}% negative responses.",
            worst_meal,
            worst.average_rating,
            worst.sentiment_distribution.negative.percentage
        ));
    }

    if ranked.len() >= 2 {
        sentences.push(format!(
            "{} (consistency score {:.1}/100).",
            consistency_phrase(consistency_score),
            consistency_score
        ));
    }

    sentences.join(" ")
}
