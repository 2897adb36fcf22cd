//! Post-persistence effect: submit results or request image cleanup, never both.
use docmark_core::error::{Error, Result};
use docmark_core::traits::Notifier;
use docmark_core::types::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    SubmitResults,
    RequestCleanup,
}

impl Effect {
    pub fn for_job(send_results: bool) -> Self {
        if send_results { Effect::SubmitResults } else { Effect::RequestCleanup }
    }
}

pub async fn dispatch(notifier: &dyn Notifier, effect: Effect, document: &Document) -> Result<()> {
    let outcome = match effect {
        Effect::SubmitResults => notifier.submit_results(document).await,
        Effect::RequestCleanup => notifier.request_cleanup(document.document_id()).await,
    };
    outcome.map_err(|e| match e.downcast::<Error>() {
        Ok(Error::DispatchFailure(msg)) => Error::DispatchFailure(msg),
        Ok(other) => Error::DispatchFailure(other.to_string()),
        Err(e) => Error::DispatchFailure(format!("{:#}", e)),
    })
}
