//! Debounced profile autosave
//!
//! Every edit restarts a debounce timer; independently an interval timer
//! saves any unsaved edits so a user who never pauses still gets saved.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::ComprehensiveProfile;
use crate::api::ApiClient;
use crate::config::AutosaveConfig;
use crate::{Error, Result};

/// Where profile documents are persisted
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Background save of a possibly incomplete document
    async fn autosave(&self, profile: &ComprehensiveProfile) -> Result<()>;

    /// Explicit save requested by the user
    async fn save(&self, profile: &ComprehensiveProfile) -> Result<()>;
}

#[async_trait]
impl ProfileStore for ApiClient {
    async fn autosave(&self, profile: &ComprehensiveProfile) -> Result<()> {
        self.autosave_profile(profile).await.map(|_| ())
    }

    async fn save(&self, profile: &ComprehensiveProfile) -> Result<()> {
        self.save_profile(profile).await.map(|_| ())
    }
}

enum Command {
    Update(ComprehensiveProfile),
    SaveNow(oneshot::Sender<Result<()>>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to a running autosave task
pub struct Autosaver {
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl Autosaver {
    /// Spawn the autosave task for `initial`
    #[must_use]
    pub fn spawn(
        store: Arc<dyn ProfileStore>,
        initial: ComprehensiveProfile,
        config: &AutosaveConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(store, initial, config.debounce, config.interval, rx));
        Self { tx, task }
    }

    /// Replace the working copy and restart the debounce timer
    pub fn update(&self, profile: ComprehensiveProfile) {
        if self.tx.send(Command::Update(profile)).is_err() {
            tracing::warn!("autosave task stopped, edit not queued");
        }
    }

    /// Save the working copy immediately through the explicit save endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the save fails or the task has stopped
    pub async fn save_now(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::SaveNow(reply))
            .map_err(|_| Error::InvalidState("autosave task stopped".to_string()))?;
        rx.await
            .map_err(|_| Error::InvalidState("autosave task stopped".to_string()))?
    }

    /// Flush unsaved edits and stop the task
    pub async fn shutdown(self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Shutdown(reply)).is_ok() {
            let _ = rx.await;
        }
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "autosave task ended abnormally");
        }
    }
}

async fn run(
    store: Arc<dyn ProfileStore>,
    mut profile: ComprehensiveProfile,
    debounce: Duration,
    interval: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut dirty = false;
    let mut deadline: Option<Instant> = None;

    // First tick one interval from now rather than immediately
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let pending_deadline = deadline;
        let debounce_elapsed = async move {
            match pending_deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(Command::Update(next)) => {
                    profile = next;
                    dirty = true;
                    deadline = Some(Instant::now() + debounce);
                }
                Some(Command::SaveNow(reply)) => {
                    let result = store.save(&profile).await;
                    if result.is_ok() {
                        dirty = false;
                        deadline = None;
                    }
                    let _ = reply.send(result);
                }
                Some(Command::Shutdown(reply)) => {
                    if dirty {
                        autosave(store.as_ref(), &profile, &mut dirty, "shutdown").await;
                    }
                    let _ = reply.send(());
                    break;
                }
                None => {
                    if dirty {
                        autosave(store.as_ref(), &profile, &mut dirty, "handle dropped").await;
                    }
                    break;
                }
            },
            () = debounce_elapsed => {
                deadline = None;
                if dirty {
                    autosave(store.as_ref(), &profile, &mut dirty, "debounce").await;
                }
            }
            _ = ticker.tick() => {
                if dirty {
                    autosave(store.as_ref(), &profile, &mut dirty, "interval").await;
                }
            }
        }
    }

    tracing::debug!("autosave task stopped");
}

async fn autosave(
    store: &dyn ProfileStore,
    profile: &ComprehensiveProfile,
    dirty: &mut bool,
    trigger: &str,
) {
    match store.autosave(profile).await {
        Ok(()) => {
            *dirty = false;
            tracing::debug!(trigger, "profile autosaved");
        }
        // Stays dirty; the next tick retries
        Err(e) => tracing::warn!(trigger, error = %e, "profile autosave failed"),
    }
}
