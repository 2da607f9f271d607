use combot_types::{Classification, ProblemType};

pub const DEFAULT_RETURN_KEYWORDS: &[&str] = &["return", "refund", "send back", "bring back", "take back"];

/// Minimum confidence for keeping an A/B/C label on a return-style message
pub const DEFAULT_RETURN_CONFIDENCE: f32 = 0.3;

pub fn is_return_request<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|k| lowered.contains(&k.as_ref().to_lowercase()))
}

/// Return/refund requests are out of scope unless the model is confident
/// the message is really a product, delivery or staff complaint.
pub fn apply_return_override<S: AsRef<str>>(
    classification: &mut Classification,
    text: &str,
    keywords: &[S],
    threshold: f32,
) -> bool {
    if !is_return_request(text, keywords) {
        return false;
    }

    if classification.primary_type.is_on_topic() && classification.confidence > threshold {
        tracing::info!(
            class_type = %classification.primary_type,
            confidence = classification.confidence,
            "Return request, keeping confident classification"
        );
        return false;
    }

    tracing::info!(confidence = classification.confidence, "Return request with low confidence, using Other");
    classification.primary_type = ProblemType::Other;
    true
}
