use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docmark_core::traits::TextRecognizer;
use docmark_core::Error;
use docmark_ocr::{ExtractionObserver, PageProgress, TextExtractor};

/// Echoes the filename as two OCR lines after a per-page delay.
struct SlowEcho { delays_ms: Vec<u64>, in_flight: AtomicUsize, peak: AtomicUsize }

impl SlowEcho {
    fn new(delays_ms: Vec<u64>) -> Self { Self { delays_ms, in_flight: AtomicUsize::new(0), peak: AtomicUsize::new(0) } }
}

impl TextRecognizer for SlowEcho {
    fn recognize(&self, image_path: &Path) -> anyhow::Result<Vec<String>> {
        let name = image_path.file_name().unwrap().to_string_lossy().to_string();
        let idx: usize = name.trim_start_matches("p_").trim_end_matches(".jpg").parse()?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(self.delays_ms[idx]));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if name == "p_2.jpg" && self.delays_ms.iter().all(|d| *d == 1) {
            anyhow::bail!("corrupt image");
        }
        Ok(vec![name, "text".to_string()])
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<PageProgress>>);

impl ExtractionObserver for Recorder {
    fn page_done(&self, progress: &PageProgress) { self.0.lock().unwrap().push(progress.clone()); }
}

fn names(n: usize) -> Vec<String> { (0..n).map(|i| format!("p_{i}.jpg")).collect() }

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn output_order_ignores_completion_order() {
    let files = names(6);
    let forward = TextExtractor::new(Arc::new(SlowEcho::new(vec![5, 10, 20, 30, 40, 50])), 6);
    let reversed = TextExtractor::new(Arc::new(SlowEcho::new(vec![50, 40, 30, 20, 10, 5])), 6);

    let a = forward.extract(Path::new("/pages"), &files).await.unwrap();
    let b = reversed.extract(Path::new("/pages"), &files).await.unwrap();

    assert_eq!(a.len(), files.len());
    assert_eq!(a, b);
    for (i, text) in a.iter().enumerate() {
        assert_eq!(text, &format!("p_{i}.jpg text"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn progress_is_reported_per_page_in_completion_order() {
    let recorder = Arc::new(Recorder::default());
    let extractor = TextExtractor::new(Arc::new(SlowEcho::new(vec![60, 5, 5])), 3).with_observer(recorder.clone());
    let texts = extractor.extract(Path::new("/pages"), &names(3)).await.unwrap();
    assert_eq!(texts.len(), 3);

    let events = recorder.0.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events.last().unwrap().page_index, 0, "slowest page finishes last");
    assert_eq!(events.iter().map(|e| e.completed).collect::<Vec<_>>(), [1, 2, 3]);
    assert!(events.iter().all(|e| e.total == 3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_count_is_bounded() {
    let recognizer = Arc::new(SlowEcho::new(vec![15; 12]));
    let extractor = TextExtractor::new(recognizer.clone(), 3);
    extractor.extract(Path::new("/pages"), &names(12)).await.unwrap();
    assert!(recognizer.peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_page_does_not_hold_back_other_workers() {
    let recorder = Arc::new(Recorder::default());
    let mut delays = vec![10; 9];
    delays[0] = 250;
    let extractor = TextExtractor::new(Arc::new(SlowEcho::new(delays)), 3).with_observer(recorder.clone());

    let texts = extractor.extract(Path::new("/pages"), &names(9)).await.unwrap();

    assert_eq!(texts[0], "p_0.jpg text");
    assert_eq!(texts[8], "p_8.jpg text");
    let events = recorder.0.lock().unwrap();
    assert_eq!(events.len(), 9);
    assert_eq!(events.last().unwrap().page_index, 0, "remaining pages finish while page 0 is still running");
}

#[tokio::test]
async fn failing_page_aborts_the_batch() {
    let extractor = TextExtractor::new(Arc::new(SlowEcho::new(vec![1; 5])), 2);
    let err = extractor.extract(Path::new("/pages"), &names(5)).await.unwrap_err();
    match err {
        Error::ExtractionFailure { page_index, filename, .. } => {
            assert_eq!(page_index, 2);
            assert_eq!(filename, "p_2.jpg");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_batch_yields_empty_output() {
    let extractor = TextExtractor::new(Arc::new(SlowEcho::new(vec![])), 4);
    assert!(extractor.extract(Path::new("/pages"), &[]).await.unwrap().is_empty());
}
