//! Whole-pipeline retry envelope.
//!
//! Every failed attempt is logged, followed by a cooldown, then the whole
//! pipeline runs again from scratch. The default policy never gives up.
use std::future::Future;
use std::time::Duration;

use docmark_core::config::{BackoffKind, RetrySettings};
use docmark_core::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    None,
    /// Double the cooldown after every failure, capped at `max`.
    Exponential { max: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    pub cooldown: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self { Self { max_attempts: None, cooldown: Duration::from_secs(60), backoff: Backoff::None } }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        let backoff = match s.backoff {
            BackoffKind::None => Backoff::None,
            BackoffKind::Exponential => Backoff::Exponential { max: s.max_backoff() },
        };
        Self { max_attempts: s.max_attempts, cooldown: s.cooldown(), backoff }
    }
}

impl RetryPolicy {
    /// Delay before the attempt that follows failed attempt number `failed` (1-based).
    pub fn delay_after(&self, failed: u32) -> Duration {
        match self.backoff {
            Backoff::None => self.cooldown,
            Backoff::Exponential { max } => {
                let factor = 1u32 << failed.saturating_sub(1).min(20);
                self.cooldown.saturating_mul(factor).min(max)
            }
        }
    }

    pub fn allows_another(&self, attempts_made: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts_made < max)
    }
}

/// Render an error with its whole source chain on one line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Run `attempt` until it succeeds, a non-retryable error occurs or the
/// policy runs out of attempts. The closure receives the 1-based attempt number.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut attempt: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let err = match attempt(attempts).await {
            Ok(value) => {
                if attempts > 1 { tracing::info!(%label, attempts, "pipeline succeeded after retrying"); }
                return Ok(value);
            }
            Err(err) => err,
        };
        tracing::error!(%label, attempt = attempts, error = %error_chain(&err), "pipeline attempt failed");
        if !err.is_retryable() {
            return Err(err);
        }
        if !policy.allows_another(attempts) {
            return Err(Error::RetryExhausted { attempts, last: Box::new(err) });
        }
        let delay = policy.delay_after(attempts);
        tracing::info!(%label, delay_secs = delay.as_secs_f64(), "retrying");
        tokio::time::sleep(delay).await;
    }
}
