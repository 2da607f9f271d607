use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::scenario::ProblemType;

/// Single label/score pair as returned by a text-classification model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Result of classifying one user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Classification {
    /// Score per model label (the product type breakdown)
    pub scores: BTreeMap<String, f32>,
    pub primary_type: ProblemType,
    pub confidence: f32,
    #[serde(default)]
    pub processing_ms: u64,
}

impl Classification {
    /// Build a classification from raw model output.
    ///
    /// The highest score wins; ties resolve to the first label in A, B, C, Other
    /// order. Labels that are not a known problem type count as `Other`.
    pub fn from_scores(scores: &[LabelScore], processing_ms: u64) -> Self {
        let map: BTreeMap<String, f32> = scores
            .iter()
            .map(|s| (s.label.clone(), s.score))
            .collect();

        let mut best: Option<(ProblemType, f32)> = None;
        for problem_type in ProblemType::ALL {
            let score = scores
                .iter()
                .filter(|s| label_type(&s.label) == problem_type)
                .map(|s| s.score)
                .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))));

            if let Some(score) = score {
                match best {
                    Some((_, current)) if current >= score => {}
                    _ => best = Some((problem_type, score)),
                }
            }
        }

        let (primary_type, confidence) = best.unwrap_or((ProblemType::Other, 0.0));

        Self {
            scores: map,
            primary_type,
            confidence,
            processing_ms,
        }
    }

    /// Fallback used when the model could not be consulted
    pub fn other() -> Self {
        Self {
            scores: BTreeMap::new(),
            primary_type: ProblemType::Other,
            confidence: 0.0,
            processing_ms: 0,
        }
    }
}

fn label_type(label: &str) -> ProblemType {
    label.parse().unwrap_or(ProblemType::Other)
}
