//! Domain types shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized `YYYY-MM-DD` dates found on one page, in order of appearance.
pub type DateAnnotation = Vec<String>;

/// One `(label, confidence)` pair as returned by a bookmark predictor.
pub type Prediction = (String, f32);

/// One image's extracted text plus its position in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub filename: String,
    pub page_index: usize,
    pub text: String,
}

/// Row handed to a bookmark predictor: the page text and its dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRow {
    pub page_index: usize,
    pub provider: String,
    pub document_id: String,
    pub text: String,
    pub dates: DateAnnotation,
}

/// A hierarchical section label predicted for one page.
///
/// Empty `levels` with a zero score is the placeholder for "nothing predicted".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkCandidate {
    pub levels: Vec<String>,
    pub dates: DateAnnotation,
    pub confidence_score: f32,
}

impl BookmarkCandidate {
    pub fn placeholder(dates: DateAnnotation) -> Self {
        Self { levels: Vec::new(), dates, confidence_score: 0.0 }
    }

    pub fn add_sublevel(&mut self, name: impl Into<String>) {
        self.levels.push(name.into());
    }

    pub fn is_placeholder(&self) -> bool {
        self.levels.is_empty() && self.confidence_score == 0.0
    }
}

/// Page index → candidates. Built by the aggregator, which guarantees every
/// page of the document is a key with at least one candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageBookmarks(BTreeMap<usize, Vec<BookmarkCandidate>>);

impl PageBookmarks {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, page_index: usize, candidate: BookmarkCandidate) {
        self.0.entry(page_index).or_default().push(candidate);
    }

    pub fn get(&self, page_index: usize) -> Option<&[BookmarkCandidate]> {
        self.0.get(&page_index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn page_indices(&self) -> impl Iterator<Item = usize> + '_ { self.0.keys().copied() }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[BookmarkCandidate])> + '_ {
        self.0.iter().map(|(i, c)| (*i, c.as_slice()))
    }
}

/// The assembled, immutable unit of persistence and notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    document_id: String,
    cclr_id: String,
    provider: String,
    texts: Vec<String>,
    bookmarks: PageBookmarks,
}

impl Document {
    pub(crate) fn from_parts(document_id: String, cclr_id: String, provider: String, texts: Vec<String>, bookmarks: PageBookmarks) -> Self {
        Self { document_id, cclr_id, provider, texts, bookmarks }
    }

    pub fn document_id(&self) -> &str { &self.document_id }
    pub fn cclr_id(&self) -> &str { &self.cclr_id }
    pub fn provider(&self) -> &str { &self.provider }
    pub fn texts(&self) -> &[String] { &self.texts }
    pub fn bookmarks(&self) -> &PageBookmarks { &self.bookmarks }
    pub fn page_count(&self) -> usize { self.texts.len() }

    /// JSON body sent to the results endpoint.
    pub fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Identity of one pipeline job, shared by every attempt of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub document_id: String,
    pub cclr_id: String,
    pub provider: String,
}

/// How a document should be written by a `DocumentStore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub created_by: String,
    /// Store only the document row, without page texts and bookmarks.
    pub store_only_document: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_camel_case_and_string_page_keys() {
        let mut bookmarks = PageBookmarks::new();
        bookmarks.push(0, BookmarkCandidate::placeholder(vec!["2021-03-04".into()]));
        let doc = Document::from_parts("d1".into(), "7".into(), "acme".into(), vec!["hello".into()], bookmarks);
        let payload = doc.to_payload().unwrap();
        assert_eq!(payload["documentId"], "d1");
        assert_eq!(payload["cclrId"], "7");
        assert_eq!(payload["bookmarks"]["0"][0]["confidenceScore"], 0.0);
        assert_eq!(payload["bookmarks"]["0"][0]["dates"][0], "2021-03-04");
    }
}
