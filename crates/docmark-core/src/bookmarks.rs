//! Turns raw per-page predictor output into hierarchical bookmark candidates.
use crate::error::{Error, Result};
use crate::types::{BookmarkCandidate, DateAnnotation, PageBookmarks, Prediction};

/// Separator between hierarchy levels inside a predicted label.
pub const SUBLEVEL_DELIMITER: &str = "@@@";

/// Lowest score a real prediction may carry; 0 is reserved for the placeholder.
pub const MIN_CONFIDENCE: f32 = 0.01;

pub fn clamp_confidence(raw: f32) -> f32 {
    if raw.is_nan() { MIN_CONFIDENCE } else { raw.clamp(MIN_CONFIDENCE, 1.0) }
}

pub fn candidate_from_label(label: &str, confidence: f32, dates: &DateAnnotation) -> BookmarkCandidate {
    let mut candidate = BookmarkCandidate { levels: Vec::new(), dates: dates.clone(), confidence_score: clamp_confidence(confidence) };
    for name in label.split(SUBLEVEL_DELIMITER) {
        candidate.add_sublevel(name);
    }
    candidate
}

/// Build the page → candidates mapping.
///
/// `predictions[i]` and `dates[i]` both belong to page `i`. Pages without
/// predictions get exactly one placeholder; pages with predictions get one
/// candidate per prediction and no placeholder.
pub fn aggregate(predictions: &[Vec<Prediction>], dates: &[DateAnnotation]) -> Result<PageBookmarks> {
    if predictions.len() != dates.len() {
        return Err(Error::AssemblyMismatch { what: "bookmark predictions", expected: dates.len(), actual: predictions.len() });
    }
    let mut bookmarks = PageBookmarks::new();
    for (page_index, (page_predictions, page_dates)) in predictions.iter().zip(dates).enumerate() {
        if page_predictions.is_empty() {
            bookmarks.push(page_index, BookmarkCandidate::placeholder(page_dates.clone()));
            continue;
        }
        for (label, confidence) in page_predictions {
            bookmarks.push(page_index, candidate_from_label(label, *confidence, page_dates));
        }
    }
    tracing::debug!(pages = bookmarks.len(), "aggregated bookmark candidates");
    Ok(bookmarks)
}
