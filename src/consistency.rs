/// Arithmetic mean. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator) given a pre-computed mean.
/// Returns 0.0 for fewer than two values.
pub fn sample_stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

/// Coefficient of variation in percent, `None` when undefined.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values);
    if avg == 0.0 {
        return None;
    }
    Some(sample_stddev(values, avg) / avg * 100.0)
}

/// Scores how uniform the per-meal averages are on a 0-100 scale.
///
/// `averages` must only contain meals that received at least one rating. With
/// fewer than two such meals the dispersion is undefined and the score is 0.
/// Otherwise the score is `100 - penalty * CV`, clamped to `[0, 100]`.
pub fn consistency_score(averages: &[f64], penalty: f64) -> f64 {
    match coefficient_of_variation(averages) {
        Some(cv) => (100.0 - penalty * cv).clamp(0.0, 100.0),
        None => 0.0,
    }
}
