//! Autofill service for Lockbox.
//!
//! Answers fill requests from the host: parses the view structure, resolves
//! a domain, waits for the first login list the store publishes, and replies
//! through a single-use [`FillCallback`].

use std::sync::{Arc, Mutex};

use tokio::sync::{oneshot, watch};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::services::data_store::{CredentialSource, LoginList};
use crate::services::dispatcher::Dispatcher;
use crate::services::fill_response::{self, FillLabels};
use crate::services::structure_parser::ParsedStructureBuilder;
use crate::types::action::DataStoreAction;
use crate::types::errors::FillError;
use crate::types::fill::{FillRequest, FillResponse};
use crate::types::settings::AutofillSettings;

/// Outcome delivered to the host for one fill request.
pub type FillResult = Result<FillResponse, FillError>;

/// Host side of a [`FillCallback`]. Resolves to `Err(RecvError)` when the
/// request was cancelled and no outcome will ever be delivered.
pub type FillReceiver = oneshot::Receiver<FillResult>;

/// Reply channel for one fill request. Consumed by exactly one of
/// [`FillCallback::on_success`] or [`FillCallback::on_failure`].
#[derive(Debug)]
pub struct FillCallback {
    tx: oneshot::Sender<FillResult>,
}

impl FillCallback {
    pub fn channel() -> (Self, FillReceiver) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn on_success(self, response: FillResponse) {
        debug!(datasets = response.datasets.len(), "fill succeeded");
        self.deliver(Ok(response));
    }

    pub fn on_failure(self, error: FillError) {
        debug!(reason = %error, "fill failed");
        self.deliver(Err(error));
    }

    fn deliver(self, result: FillResult) {
        if self.tx.send(result).is_err() {
            debug!("host stopped listening for the fill result");
        }
    }
}

/// Host-owned cancellation flag for one fill request.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    flag: Arc<watch::Sender<bool>>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self { flag: Arc::new(flag) }
    }

    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives in `self`, so this only returns once cancelled.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Matches stored logins to on-screen forms.
pub struct AutofillService {
    store: Arc<dyn CredentialSource>,
    dispatcher: Dispatcher,
    unlock_on_connect: bool,
    labels: FillLabels,
    pending: Mutex<Vec<AbortHandle>>,
}

impl AutofillService {
    pub fn new(store: Arc<dyn CredentialSource>, dispatcher: Dispatcher, settings: &AutofillSettings) -> Self {
        Self {
            store,
            dispatcher,
            unlock_on_connect: settings.unlock_on_connect,
            labels: FillLabels {
                password_template: settings.password_label.clone(),
            },
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The host bound to the service.
    pub fn on_connected(&self) {
        info!("autofill service connected");
        if self.unlock_on_connect {
            self.dispatcher.dispatch(DataStoreAction::Unlock);
        }
    }

    /// The host unbound from the service. Every pending request is dropped
    /// without a reply.
    pub fn on_disconnected(&self) {
        let pending: Vec<AbortHandle> = self.pending_handles().drain(..).collect();
        info!(aborted = pending.len(), "autofill service disconnected");
        for handle in pending {
            handle.abort();
        }
    }

    /// Number of fill requests still waiting for the login list.
    pub fn pending_requests(&self) -> usize {
        let mut pending = self.pending_handles();
        pending.retain(|h| !h.is_finished());
        pending.len()
    }

    /// Handles one fill request. Field and domain failures are reported
    /// before the store is consulted; otherwise the reply follows the first
    /// login list the store publishes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_fill_request(&self, request: FillRequest, cancel: CancellationSignal, callback: FillCallback) {
        let structure = request.structure;
        let parsed = ParsedStructureBuilder::new(&structure).build();
        debug!(
            activity = %structure.activity_package,
            username = ?parsed.username_id,
            password = ?parsed.password_id,
            web_domain = ?parsed.web_domain,
            "parsed fill request"
        );

        let domain = match fill_response::prepare(&parsed, &structure.activity_package) {
            Ok(domain) => domain,
            Err(e) => return callback.on_failure(e),
        };

        let logins = self.store.list();
        let labels = self.labels.clone();
        let task = tokio::spawn(async move {
            let list = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(%domain, "fill request cancelled by host");
                    return;
                }
                list = first_list(logins) => list,
            };
            let Some(list) = list else {
                warn!(%domain, "credential source closed before publishing");
                return;
            };
            match fill_response::respond(&parsed, &domain, &list, &labels) {
                Ok(response) => callback.on_success(response),
                Err(e) => callback.on_failure(e),
            }
        });

        let mut pending = self.pending_handles();
        pending.retain(|h| !h.is_finished());
        pending.push(task.abort_handle());
    }

    fn pending_handles(&self) -> std::sync::MutexGuard<'_, Vec<AbortHandle>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// First published list; `None` if the source went away first.
async fn first_list(mut logins: watch::Receiver<Option<LoginList>>) -> Option<LoginList> {
    let current = logins.wait_for(Option::is_some).await.ok()?;
    current.clone()
}
