//! Baseline predictor that draws labels at random, used to exercise the
//! downstream consumers without a trained model.
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use docmark_core::traits::BookmarkPredictor;
use docmark_core::types::{PageRow, Prediction};

pub struct RandomPredictor {
    labels: Vec<String>,
    hit_rate: f64,
    rng: Mutex<StdRng>,
}

impl RandomPredictor {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels, hit_rate: 0.5, rng: Mutex::new(StdRng::from_entropy()) }
    }

    pub fn seeded(labels: Vec<String>, seed: u64) -> Self {
        Self { labels, hit_rate: 0.5, rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}

impl BookmarkPredictor for RandomPredictor {
    fn predict(&self, rows: &[PageRow]) -> Result<Vec<Vec<Prediction>>> {
        let mut rng = self.rng.lock().map_err(|_| anyhow::anyhow!("random predictor state poisoned"))?;
        Ok(rows
            .iter()
            .map(|_| {
                if self.labels.is_empty() || !rng.gen_bool(self.hit_rate) { return Vec::new(); }
                let label = self.labels[rng.gen_range(0..self.labels.len())].clone();
                vec![(label, rng.gen::<f32>())]
            })
            .collect())
    }
}
