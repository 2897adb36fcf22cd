//! Keyword bookmark model persisted as JSON.
//!
//! Each rule maps a hierarchical label (`Chapter@@@Section`) to a keyword list.
//! A page scores `matched / total` keywords for a rule; rules scoring below
//! `min_confidence` are not reported.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use docmark_core::traits::BookmarkPredictor;
use docmark_core::types::{PageRow, Prediction};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRule {
    pub label: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordModel {
    #[serde(default)]
    pub version: String,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    #[serde(default)]
    pub top_k: Option<usize>,
    pub labels: Vec<LabelRule>,
}

fn default_min_confidence() -> f32 { 0.5 }

impl KeywordModel {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading model {}", path.display()))?;
        let model: Self = serde_json::from_str(&raw).with_context(|| format!("parsing model {}", path.display()))?;
        tracing::info!(model = %path.display(), version = %model.version, labels = model.labels.len(), "loaded bookmark model");
        Ok(model)
    }

    pub fn label_names(&self) -> Vec<String> { self.labels.iter().map(|r| r.label.clone()).collect() }

    fn score_page(&self, text: &str) -> Vec<Prediction> {
        let text = text.to_lowercase();
        let mut scored: Vec<Prediction> = self
            .labels
            .iter()
            .filter(|rule| !rule.keywords.is_empty())
            .filter_map(|rule| {
                let hits = rule.keywords.iter().filter(|k| text.contains(&k.to_lowercase())).count();
                let score = hits as f32 / rule.keywords.len() as f32;
                (hits > 0 && score >= self.min_confidence).then(|| (rule.label.clone(), score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(k) = self.top_k { scored.truncate(k); }
        scored
    }
}

impl BookmarkPredictor for KeywordModel {
    fn predict(&self, rows: &[PageRow]) -> Result<Vec<Vec<Prediction>>> {
        Ok(rows.iter().map(|row| self.score_page(&row.text)).collect())
    }
}

/// Newest model file in `dir`; model files are named so that they sort by training time.
pub fn last_trained_model_path(dir: &Path) -> Result<PathBuf> {
    let mut models: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    models.sort();
    models.pop().ok_or_else(|| anyhow!("no trained bookmark model (*.json) under {}", dir.display()))
}

pub fn load_last_trained_model(dir: &Path) -> Result<KeywordModel> {
    KeywordModel::from_file(&last_trained_model_path(dir)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(text: &str) -> PageRow {
        PageRow { page_index: 0, provider: "p".into(), document_id: "d".into(), text: text.into(), dates: vec![] }
    }

    fn model() -> KeywordModel {
        KeywordModel {
            version: "t".into(),
            min_confidence: 0.5,
            top_k: None,
            labels: vec![
                LabelRule { label: "Medical@@@Lab Results".into(), keywords: vec!["hemoglobin".into(), "platelets".into()] },
                LabelRule { label: "Medical".into(), keywords: vec!["patient".into()] },
                LabelRule { label: "Billing".into(), keywords: vec!["invoice".into(), "total".into(), "due".into()] },
            ],
        }
    }

    #[test]
    fn scores_are_ranked_and_thresholded() {
        let out = model().predict(&[row("Patient HEMOGLOBIN 13.2"), row("cover page")]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], [("Medical".to_string(), 1.0), ("Medical@@@Lab Results".to_string(), 0.5)]);
        assert!(out[1].is_empty());
    }

    #[test]
    fn top_k_limits_output() {
        let mut m = model();
        m.top_k = Some(1);
        let out = m.predict(&[row("patient hemoglobin platelets")]).unwrap();
        assert_eq!(out[0].len(), 1);
    }
}
