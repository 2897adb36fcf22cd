//! Bookmark predictors: the trained keyword model and a random baseline.
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use docmark_core::traits::BookmarkPredictor;

pub mod model;
pub mod random;

pub use model::{last_trained_model_path, load_last_trained_model, KeywordModel, LabelRule};
pub use random::RandomPredictor;

/// Load the newest trained model from `model_dir`, or a random predictor over
/// its labels when `random` is set.
pub fn get_default_predictor(model_dir: &Path, random: bool) -> Result<Arc<dyn BookmarkPredictor>> {
    let model = load_last_trained_model(model_dir)?;
    if random {
        tracing::warn!("using RandomPredictor: bookmarks will not reflect page content");
        return Ok(Arc::new(RandomPredictor::new(model.label_names())));
    }
    Ok(Arc::new(model))
}
