use super::raw::RawScores;
use super::{ScoreSet, ScoringPolicy};

const CEILING_MULTIPLIER: f64 = 1.5;

/// Stage 2: rescale raw 0–10 means to integer 0–100 scores.
///
/// Heavier categories get a larger multiplier (capped at 1.5x), so answers in sensitive
/// dimensions swing the score further before the clamp.
pub fn normalize(raw: &RawScores, policy: &ScoringPolicy) -> ScoreSet {
    raw.iter()
        .map(|(category, mean)| {
            let score = scale(*mean, policy.category_weight(category));
            (category.clone(), score)
        })
        .collect()
}

fn multiplier(category_weight: f64) -> f64 {
    (category_weight / 2.0 + 0.5).min(CEILING_MULTIPLIER)
}

fn scale(mean: f64, category_weight: f64) -> u8 {
    let scaled = (mean / 10.0) * 100.0 * multiplier(category_weight);
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 100.0).round() as u8
}
