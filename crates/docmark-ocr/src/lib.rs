//! Page text recognition and the ordered parallel extraction pool.
//!
//! Respects `APP_USE_FAKE_OCR=1` to switch to the `FakeRecognizer` for fast and
//! deterministic outputs in tests and development.
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Instant;

use docmark_core::traits::TextRecognizer;

pub mod pool;

pub use pool::{ExtractionObserver, PageProgress, TextExtractor};

/// Runs the `tesseract` CLI once per page and returns its non-empty lines.
pub struct TesseractRecognizer { binary: PathBuf, lang: String }

impl TesseractRecognizer {
    pub fn new() -> Result<Self> {
        let binary = resolve_tesseract_binary()?;
        let lang = std::env::var("APP_OCR_LANG").unwrap_or_else(|_| "eng".to_string());
        tracing::info!(binary = %binary.display(), %lang, "using tesseract recognizer");
        Ok(Self { binary, lang })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image_path: &Path) -> Result<Vec<String>> {
        let start = Instant::now();
        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.lang])
            .output()
            .with_context(|| format!("failed to spawn {}", self.binary.display()))?;
        if !output.status.success() {
            return Err(anyhow!(
                "tesseract exited with {} for {}: {}",
                output.status,
                image_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        let lines = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if start.elapsed().as_secs() > 30 { tracing::warn!(image = %image_path.display(), "slow OCR page"); }
        Ok(lines)
    }
}

/// Reads `<image>.txt` next to the image when present, otherwise echoes the
/// file stem. Fails like a real engine would when the image is missing.
pub struct FakeRecognizer;

impl TextRecognizer for FakeRecognizer {
    fn recognize(&self, image_path: &Path) -> Result<Vec<String>> {
        if !image_path.exists() { return Err(anyhow!("image not found: {}", image_path.display())); }
        let mut sidecar = image_path.as_os_str().to_owned();
        sidecar.push(".txt");
        let sidecar = PathBuf::from(sidecar);
        if sidecar.exists() {
            let text = std::fs::read_to_string(&sidecar).with_context(|| format!("reading {}", sidecar.display()))?;
            return Ok(text.lines().map(str::to_string).collect());
        }
        let stem = image_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        Ok(vec![stem])
    }
}

pub fn get_default_recognizer() -> Result<Arc<dyn TextRecognizer>> {
    let use_fake = std::env::var("APP_USE_FAKE_OCR").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake { tracing::info!("using FakeRecognizer"); return Ok(Arc::new(FakeRecognizer)); }
    Ok(Arc::new(TesseractRecognizer::new()?))
}

fn resolve_tesseract_binary() -> Result<PathBuf> {
    if let Ok(bin) = std::env::var("APP_TESSERACT_BIN") { let p = PathBuf::from(&bin); if p.exists() { return Ok(p); } }
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&path_var)
        .map(|dir| dir.join("tesseract"))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| anyhow!("Could not locate the tesseract binary (set APP_TESSERACT_BIN or APP_USE_FAKE_OCR=1)"))
}
