//! Merges ordered pages, texts, dates and bookmark candidates into a `Document`.
use crate::error::{Error, Result};
use crate::ordering::OrderedPage;
use crate::types::{DateAnnotation, Document, DocumentMeta, PageBookmarks, PageRecord};

/// In-progress document state. Only `build` produces a `Document`, and only
/// after every length and key invariant holds.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    meta: Option<DocumentMeta>,
    page_count: usize,
    texts: Vec<String>,
    dates: Option<Vec<DateAnnotation>>,
    bookmarks: PageBookmarks,
}

impl DocumentBuilder {
    pub fn new(meta: DocumentMeta, page_count: usize) -> Self {
        Self { meta: Some(meta), page_count, ..Self::default() }
    }

    pub fn texts(mut self, texts: Vec<String>) -> Self {
        self.texts = texts;
        self
    }

    pub fn dates(mut self, dates: Vec<DateAnnotation>) -> Self {
        self.dates = Some(dates);
        self
    }

    pub fn bookmarks(mut self, bookmarks: PageBookmarks) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    pub fn build(self) -> Result<Document> {
        let n = self.page_count;
        check_len("texts", n, self.texts.len())?;
        if let Some(dates) = &self.dates {
            check_len("date annotations", n, dates.len())?;
        }
        check_len("bookmark pages", n, self.bookmarks.len())?;
        // keys are unique and sorted, so len == n plus all keys < n means exactly 0..n
        if let Some(bad) = self.bookmarks.page_indices().find(|i| *i >= n) {
            return Err(Error::AssemblyMismatch { what: "bookmark page index", expected: n, actual: bad });
        }
        if let Some((page, _)) = self.bookmarks.iter().find(|(_, c)| c.is_empty()) {
            return Err(Error::AssemblyMismatch { what: "bookmark candidates for page", expected: 1, actual: page });
        }
        let meta = self.meta.ok_or_else(|| Error::InvalidConfig("document builder has no metadata".into()))?;
        Ok(Document::from_parts(meta.document_id, meta.cclr_id, meta.provider, self.texts, self.bookmarks))
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual { Ok(()) } else { Err(Error::AssemblyMismatch { what, expected, actual }) }
}

/// Zip the page list with extracted texts into page records.
pub fn page_records(pages: &[OrderedPage], texts: Vec<String>) -> Result<Vec<PageRecord>> {
    check_len("extracted texts", pages.len(), texts.len())?;
    Ok(pages
        .iter()
        .zip(texts)
        .map(|(page, text)| PageRecord { filename: page.filename.clone(), page_index: page.page_index, text })
        .collect())
}

/// Assemble the final document from every stage's output.
pub fn assemble(meta: DocumentMeta, records: Vec<PageRecord>, dates: Vec<DateAnnotation>, bookmarks: PageBookmarks) -> Result<Document> {
    let page_count = records.len();
    if let Some(r) = records.iter().enumerate().find(|(i, r)| r.page_index != *i).map(|(_, r)| r) {
        return Err(Error::AssemblyMismatch { what: "page order", expected: page_count, actual: r.page_index });
    }
    let texts = records.into_iter().map(|r| r.text).collect();
    DocumentBuilder::new(meta, page_count).texts(texts).dates(dates).bookmarks(bookmarks).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BookmarkCandidate;

    fn meta() -> DocumentMeta {
        DocumentMeta { document_id: "doc-1".into(), cclr_id: "0".into(), provider: "acme".into() }
    }

    fn records(n: usize) -> Vec<PageRecord> {
        (0..n).map(|i| PageRecord { filename: format!("a_b_{i}.jpg"), page_index: i, text: format!("page {i}") }).collect()
    }

    fn placeholders(n: usize) -> PageBookmarks {
        let mut b = PageBookmarks::new();
        for i in 0..n { b.push(i, BookmarkCandidate::placeholder(vec![])); }
        b
    }

    #[test]
    fn consistent_inputs_assemble() {
        let doc = assemble(meta(), records(3), vec![vec![]; 3], placeholders(3)).unwrap();
        assert_eq!(doc.document_id(), "doc-1");
        assert_eq!(doc.texts(), ["page 0", "page 1", "page 2"]);
        assert_eq!(doc.bookmarks().len(), 3);
    }

    #[test]
    fn every_length_disagreement_is_a_mismatch() {
        assert!(matches!(assemble(meta(), records(3), vec![vec![]; 2], placeholders(3)), Err(Error::AssemblyMismatch { .. })));
        assert!(matches!(assemble(meta(), records(3), vec![vec![]; 3], placeholders(2)), Err(Error::AssemblyMismatch { .. })));
        assert!(matches!(assemble(meta(), records(2), vec![vec![]; 2], placeholders(3)), Err(Error::AssemblyMismatch { .. })));
    }

    #[test]
    fn out_of_range_bookmark_key_is_a_mismatch() {
        let mut b = placeholders(2);
        b.push(5, BookmarkCandidate::placeholder(vec![]));
        let mut shifted = PageBookmarks::new();
        for (i, c) in b.iter() { if i != 0 { shifted.push(i, c[0].clone()); } }
        let err = assemble(meta(), records(2), vec![vec![]; 2], shifted).unwrap_err();
        assert!(matches!(err, Error::AssemblyMismatch { what: "bookmark page index", .. }));
    }

    #[test]
    fn page_records_require_equal_lengths() {
        let pages = crate::ordering::order_pages(["a_b_1.jpg", "a_b_0.jpg"], &Default::default()).unwrap();
        let recs = page_records(&pages, vec!["zero".into(), "one".into()]).unwrap();
        assert_eq!(recs[1], PageRecord { filename: "a_b_1.jpg".into(), page_index: 1, text: "one".into() });
        assert!(page_records(&pages, vec!["zero".into()]).is_err());
    }
}
