//! Drives measure loads for the calculator.
//!
//! One load is live at a time. Requesting a new one cancels the previous
//! task's token; a cancelled task exits without reporting. Results are sent
//! as calculator `Event`s over an mpsc channel, so a result that slips past
//! cancellation is still filtered by request id in `calculator::reduce`.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::calculator::{Event, RequestId};
use crate::currency::Currency;
use crate::loader::retry::RetryPolicy;
use crate::loader::types::SeriesSource;
use crate::resolve::resolve_measures;

pub struct MeasureSession {
    source: Arc<dyn SeriesSource>,
    policy: RetryPolicy,
    events: mpsc::Sender<Event>,
    current: Mutex<Option<(RequestId, CancellationToken)>>,
}

impl MeasureSession {
    pub fn new(
        source: Arc<dyn SeriesSource>,
        policy: RetryPolicy,
        events: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            source,
            policy,
            events,
            current: Mutex::new(None),
        }
    }

    /// Start loading `currency` under `request`, superseding any live load.
    pub fn request(&self, request: RequestId, currency: Currency) {
        let token = CancellationToken::new();
        if let Some((prev, old)) = self.swap_current(Some((request, token.clone()))) {
            tracing::debug!(target: "session", superseded = prev, by = request, "cancelling load");
            old.cancel();
        }

        let source = Arc::clone(&self.source);
        let policy = self.policy;
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(target: "session", request, %currency, "load cancelled");
                }
                resolution = resolve_measures(source.as_ref(), currency, &policy) => {
                    if token.is_cancelled() {
                        return;
                    }
                    let event = Event::DataLoaded { request, resolution };
                    if events.send(event).await.is_err() {
                        tracing::debug!(target: "session", request, "receiver dropped");
                    }
                }
            }
        });
    }

    /// Id of the load currently allowed to report, if any.
    pub fn current_request(&self) -> Option<RequestId> {
        self.current
            .lock()
            .ok()
            .and_then(|g| g.as_ref().map(|(id, _)| *id))
    }

    pub fn cancel(&self) {
        if let Some((_, token)) = self.swap_current(None) {
            token.cancel();
        }
    }

    fn swap_current(
        &self,
        next: Option<(RequestId, CancellationToken)>,
    ) -> Option<(RequestId, CancellationToken)> {
        match self.current.lock() {
            Ok(mut g) => std::mem::replace(&mut *g, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        }
    }
}

impl Drop for MeasureSession {
    fn drop(&mut self) {
        self.cancel();
    }
}
