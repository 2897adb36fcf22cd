//! Page ordering derived from the integer components embedded in image filenames.
//!
//! A page image is named `<prefix>_<prefix>_<n>[_<m>...].<ext>`: the stem (up to
//! the first `.`) is split on the delimiter, the fixed prefix segments are
//! skipped and every remaining segment is an integer. The resulting tuple is the
//! sort key, compared component-wise with shorter tuples first.
use std::cmp::Ordering;

use crate::config::NamingSettings;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    pub delimiter: String,
    pub prefix_segments: usize,
}

impl Default for NamingConvention {
    fn default() -> Self { Self { delimiter: "_".to_string(), prefix_segments: 2 } }
}

impl From<&NamingSettings> for NamingConvention {
    fn from(s: &NamingSettings) -> Self { Self { delimiter: s.delimiter.clone(), prefix_segments: s.prefix_segments } }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageKey(Vec<u64>);

impl PageKey {
    pub fn components(&self) -> &[u64] { &self.0 }
}

/// A filename together with its position in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedPage {
    pub page_index: usize,
    pub filename: String,
    pub key: PageKey,
}

pub fn page_key(filename: &str, convention: &NamingConvention) -> Result<PageKey> {
    let malformed = |reason: String| Error::MalformedFilename { filename: filename.to_string(), reason };
    let stem = filename.split('.').next().unwrap_or_default();
    let segments: Vec<&str> = stem.split(convention.delimiter.as_str()).collect();
    if segments.len() <= convention.prefix_segments {
        return Err(malformed(format!(
            "expected {} prefix segments followed by at least one page number",
            convention.prefix_segments
        )));
    }
    segments[convention.prefix_segments..]
        .iter()
        .map(|seg| seg.parse::<u64>().map_err(|_| malformed(format!("segment '{}' is not a page number", seg))))
        .collect::<Result<Vec<_>>>()
        .map(PageKey)
}

/// Sort `filenames` into document order and assign page indices.
///
/// Equal keys (e.g. the same page saved twice with different extensions) are
/// broken by filename so the result never depends on input order.
pub fn order_pages<I, S>(filenames: I, convention: &NamingConvention) -> Result<Vec<OrderedPage>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut keyed = filenames
        .into_iter()
        .map(|name| {
            let filename = name.into();
            page_key(&filename, convention).map(|key| (key, filename))
        })
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by(|(ka, fa), (kb, fb)| match ka.cmp(kb) {
        Ordering::Equal => fa.cmp(fb),
        other => other,
    });
    Ok(keyed
        .into_iter()
        .enumerate()
        .map(|(page_index, (key, filename))| OrderedPage { page_index, filename, key })
        .collect())
}
