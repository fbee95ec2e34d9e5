//! Snapshot writers.
//!
//! The store hands every new cart state to a [`SnapshotWriter`] tagged with
//! its [`CartVersion`]. Writers never let a lower version overwrite a higher
//! one, regardless of when the underlying I/O completes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::CartPersistence;
use crate::error::PersistenceError;
use crate::model::{Cart, CartVersion};

/// A cart state tagged with the mutation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    pub version: CartVersion,
    pub cart: Cart,
}

/// Accepts cart snapshots for best-effort durable storage.
pub trait SnapshotWriter {
    /// Queue or perform a write of `snapshot`. Never blocks on slow storage
    /// longer than the implementation documents, and never fails.
    fn submit(&self, snapshot: CartSnapshot);

    /// Highest version this writer has accepted.
    ///
    /// A store opened over the writer starts counting from here, so a writer
    /// shared by successive stores keeps accepting their snapshots.
    fn latest_version(&self) -> CartVersion {
        CartVersion::default()
    }
}

/// Writes each snapshot synchronously on submit.
#[derive(Debug, Clone)]
pub struct ImmediateWriter {
    persistence: CartPersistence,
}

impl ImmediateWriter {
    #[must_use]
    pub const fn new(persistence: CartPersistence) -> Self {
        Self { persistence }
    }
}

impl SnapshotWriter for ImmediateWriter {
    fn submit(&self, snapshot: CartSnapshot) {
        self.persistence.save(&snapshot.cart);
    }
}

struct Shared {
    latest: watch::Sender<Option<CartSnapshot>>,
    persisted: watch::Receiver<CartVersion>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Coalesces rapid submissions into background writes.
///
/// A Tokio task waits for a new snapshot, sleeps for the debounce window,
/// then writes whatever snapshot is newest at that point. Only the newest
/// snapshot is ever held, so intermediate states that were superseded during
/// the window are never written.
///
/// Cloning yields another handle to the same background task.
#[derive(Clone)]
pub struct DebouncedWriter {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DebouncedWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedWriter")
            .field("persisted", &*self.shared.persisted.borrow())
            .finish_non_exhaustive()
    }
}

impl DebouncedWriter {
    /// Spawn the background writer task.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(persistence: CartPersistence, debounce: Duration) -> Self {
        let (latest_tx, latest_rx) = watch::channel(None);
        let (persisted_tx, persisted_rx) = watch::channel(CartVersion::default());

        let task = tokio::spawn(run_writer(latest_rx, persisted_tx, persistence, debounce));

        Self {
            shared: Arc::new(Shared {
                latest: latest_tx,
                persisted: persisted_rx,
                task: Mutex::new(Some(task)),
            }),
        }
    }

    /// Highest version the task has finished handling.
    #[must_use]
    pub fn persisted_version(&self) -> CartVersion {
        *self.shared.persisted.borrow()
    }

    /// Wait until the newest submitted snapshot has been handled.
    ///
    /// "Handled" includes writes that failed; those are logged by the task.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::WriterStopped` if the task exited first.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        let target = self
            .shared
            .latest
            .borrow()
            .as_ref()
            .map(|snapshot| snapshot.version);
        let Some(target) = target else {
            return Ok(());
        };

        let mut persisted = self.shared.persisted.clone();
        persisted
            .wait_for(|version| *version >= target)
            .await
            .map(|_| ())
            .map_err(|_| PersistenceError::WriterStopped)
    }

    /// Flush pending writes and stop the background task.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::WriterStopped` if the task exited before
    /// the pending snapshot was handled.
    pub async fn shutdown(&self) -> Result<(), PersistenceError> {
        let flushed = self.flush().await;

        let task = self
            .shared
            .task
            .lock()
            .map_err(|_| PersistenceError::WriterStopped)?
            .take();
        if let Some(task) = task {
            task.abort();
            // Aborting an idle task resolves to a cancellation error.
            let _ = task.await;
            debug!("Cart writer stopped");
        }

        flushed
    }
}

impl SnapshotWriter for DebouncedWriter {
    fn submit(&self, snapshot: CartSnapshot) {
        let version = snapshot.version;
        if self.shared.latest.is_closed() {
            error!(%version, "Cart writer stopped, dropping snapshot");
            return;
        }
        let accepted = self.shared.latest.send_if_modified(|current| {
            let newer = current
                .as_ref()
                .is_none_or(|existing| existing.version < snapshot.version);
            if newer {
                *current = Some(snapshot);
            }
            newer
        });
        if !accepted {
            warn!(%version, latest = %self.latest_version(), "Ignoring stale cart snapshot");
        }
    }

    fn latest_version(&self) -> CartVersion {
        let submitted = self
            .shared
            .latest
            .borrow()
            .as_ref()
            .map(|snapshot| snapshot.version)
            .unwrap_or_default();
        submitted.max(self.persisted_version())
    }
}

async fn run_writer(
    mut latest: watch::Receiver<Option<CartSnapshot>>,
    persisted: watch::Sender<CartVersion>,
    persistence: CartPersistence,
    debounce: Duration,
) {
    let mut last_written = CartVersion::default();

    // Exits once every writer handle is dropped and the last value was seen.
    while latest.changed().await.is_ok() {
        if !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
        }

        let Some(snapshot) = latest.borrow_and_update().clone() else {
            continue;
        };
        if snapshot.version <= last_written {
            continue;
        }

        let version = snapshot.version;
        let target = persistence.clone();
        match tokio::task::spawn_blocking(move || target.try_save(&snapshot.cart)).await {
            Ok(Ok(())) => debug!(%version, "Persisted cart snapshot"),
            Ok(Err(e)) => error!(%version, error = %e, "Failed to persist cart snapshot"),
            Err(e) => error!(%version, error = %e, "Cart persistence task panicked"),
        }

        last_written = version;
        persisted.send_replace(version);
    }

    info!(key = persistence.key(), "Cart writer finished");
}
