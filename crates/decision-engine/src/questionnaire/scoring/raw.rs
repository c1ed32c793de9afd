use std::collections::BTreeMap;

use crate::questionnaire::domain::{Answer, Category};

/// Weighted mean per category on the 0–10 answer scale.
pub type RawScores = BTreeMap<Category, f64>;

#[derive(Default)]
struct Accumulator {
    sum: f64,
    weight_total: f64,
}

/// Stage 1: combine answers within each category into a weighted mean.
///
/// Answers without a category are skipped and a missing weight counts as 1.
pub fn accumulate(answers: &[Answer]) -> RawScores {
    let mut totals: BTreeMap<Category, Accumulator> = BTreeMap::new();

    for answer in answers {
        let Some(category) = answer.category.clone() else {
            continue;
        };
        let weight = answer.weight.unwrap_or(1.0);
        let entry = totals.entry(category).or_default();
        entry.sum += f64::from(answer.value) * weight;
        entry.weight_total += weight;
    }

    totals
        .into_iter()
        .map(|(category, acc)| {
            let mean = if acc.weight_total == 0.0 {
                0.0
            } else {
                acc.sum / acc.weight_total
            };
            (category, mean)
        })
        .collect()
}
