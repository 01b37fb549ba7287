//! Result extraction from `generateContent` responses. Only the first candidate
//! is consulted and its parts are scanned in order.

use crate::models::{ImagePayload, ResponseEnvelope};

/// Returned by [`extract_text`] when the model produced no text.
pub const NO_ANALYSIS_TEXT: &str = "No analysis returned.";

/// First inline image of the first candidate, re-tagged as PNG.
pub fn extract_image(envelope: &ResponseEnvelope) -> Option<ImagePayload> {
    envelope
        .first_parts()
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty())
        .map(|inline| ImagePayload::png(inline.data.clone()))
}

/// Concatenated text of the first candidate, skipping thought summaries.
pub fn extract_text(envelope: &ResponseEnvelope) -> String {
    let text: String = envelope
        .first_parts()
        .iter()
        .filter(|part| !part.is_thought())
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.is_empty() {
        NO_ANALYSIS_TEXT.to_string()
    } else {
        text
    }
}

/// Message for a response that carried no image.
pub fn describe_missing_image(envelope: &ResponseEnvelope) -> String {
    let block_reason = envelope
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref());
    if let Some(reason) = block_reason {
        return format!("the prompt was blocked ({})", reason);
    }

    let Some(candidate) = envelope.first_candidate() else {
        return "the model returned no candidates".to_string();
    };

    match candidate.finish_reason.as_deref() {
        Some(reason) if reason != "STOP" => {
            format!("the model stopped without an image (finish reason: {})", reason)
        }
        _ => "the model did not return an image; it may have refused the prompt".to_string(),
    }
}
