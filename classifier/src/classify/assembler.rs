use serde::Serialize;

use crate::service::ClassificationResult;

/// Normalized output fields for one classified record. Scores are percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledResult {
    pub primary_class: String,
    pub primary_score: f64,
    pub secondary_classes: Vec<String>,
    pub secondary_scores: Vec<f64>,
}

/// Map a raw response to output fields. `None` means the service answered
/// with no classes, which is a valid outcome rather than a failure.
pub fn assemble(raw: &ClassificationResult) -> Option<AssembledResult> {
    let (primary, secondary) = raw.classes.split_first()?;

    Some(AssembledResult {
        primary_class: primary.name.clone(),
        primary_score: to_percent(primary.score),
        secondary_classes: secondary.iter().map(|c| c.name.clone()).collect(),
        secondary_scores: secondary.iter().map(|c| to_percent(c.score)).collect(),
    })
}

fn to_percent(score: f64) -> f64 {
    score * 100.0
}

/// Two-decimal percentage, e.g. `91.37%`
pub fn format_score(score: f64) -> String {
    format!("{:.2}%", score)
}
