use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jobboard_core::{JobListing, SelectionSet};
use jobboard_logging::{board_debug, board_error, board_info, board_warn};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::{KeyValueStore, StorageError};

/// Storage key holding the JSON array of saved listings.
pub const SELECTED_JOBS_KEY: &str = "@selected_jobs";

/// The persisted snapshot could not be used; the store started empty.
#[derive(Debug, Error)]
pub enum CorruptStateError {
    #[error("saved jobs could not be read: {0}")]
    Unreadable(#[source] StorageError),
    #[error("saved jobs snapshot is malformed: {0}")]
    Malformed(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StorageWriteError {
    #[error("failed to encode saved jobs: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write saved jobs: {0}")]
    Write(#[from] StorageError),
}

enum WriteCommand {
    Persist(Vec<JobListing>),
    Flush(oneshot::Sender<()>),
}

/// The user's saved jobs, mirrored to a [`KeyValueStore`].
///
/// Memory is authoritative for the running process. Every mutation queues a
/// full snapshot for a single writer task, which writes snapshots in the order
/// they were queued, so an older snapshot never overwrites a newer one.
/// Failed writes are logged and counted; they do not undo the mutation.
pub struct SelectionStore {
    selection: Mutex<SelectionSet>,
    writes: mpsc::UnboundedSender<WriteCommand>,
    write_failures: Arc<AtomicUsize>,
}

impl SelectionStore {
    /// Restore the saved set from `storage` and start the writer task.
    ///
    /// Never fails: an unreadable or malformed snapshot yields an empty set
    /// and the reason is handed back for the caller to report. Must be called
    /// from within a tokio runtime.
    pub async fn initialize(
        storage: Arc<dyn KeyValueStore>,
    ) -> (Self, Option<CorruptStateError>) {
        let (selection, corrupt) = match load_snapshot(storage.as_ref()).await {
            Ok(selection) => {
                board_info!("Restored {} saved jobs", selection.len());
                (selection, None)
            }
            Err(err) => {
                board_warn!("Discarding saved jobs, starting empty: {}", err);
                (SelectionSet::new(), Some(err))
            }
        };

        let (writes, commands) = mpsc::unbounded_channel();
        let write_failures = Arc::new(AtomicUsize::new(0));
        tokio::spawn(run_writer(storage, commands, write_failures.clone()));

        let store = Self {
            selection: Mutex::new(selection),
            writes,
            write_failures,
        };
        (store, corrupt)
    }

    /// Save the listing if its id is not saved yet, unsave it otherwise.
    ///
    /// Queues a write of the whole updated set and returns without waiting
    /// for it. Returns whether the id is saved afterwards.
    pub fn toggle(&self, listing: &JobListing) -> bool {
        let mut selection = self.lock();
        let selected = selection.toggle(listing);
        board_debug!(
            "Toggled job {} -> {}",
            listing.id,
            if selected { "saved" } else { "removed" }
        );
        // Queue while still holding the lock so queue order is mutation order.
        self.queue_snapshot(&selection);
        selected
    }

    /// Remove every saved job and persist the empty set.
    pub fn clear(&self) {
        let mut selection = self.lock();
        selection.clear();
        self.queue_snapshot(&selection);
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    /// Saved listings in the order they were saved.
    pub fn list(&self) -> Vec<JobListing> {
        self.lock().as_slice().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of snapshot writes that failed since startup.
    pub fn write_failures(&self) -> usize {
        self.write_failures.load(Ordering::Relaxed)
    }

    /// Wait until every write queued before this call has been attempted.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.writes.send(WriteCommand::Flush(ack)).is_err() {
            return;
        }
        let _ = done.await;
    }

    fn queue_snapshot(&self, selection: &SelectionSet) {
        let snapshot = selection.as_slice().to_vec();
        if self.writes.send(WriteCommand::Persist(snapshot)).is_err() {
            self.write_failures.fetch_add(1, Ordering::Relaxed);
            board_error!("Saved jobs writer has stopped; change kept in memory only");
        }
    }

    fn lock(&self) -> MutexGuard<'_, SelectionSet> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn load_snapshot(storage: &dyn KeyValueStore) -> Result<SelectionSet, CorruptStateError> {
    let Some(text) = storage
        .get(SELECTED_JOBS_KEY)
        .await
        .map_err(CorruptStateError::Unreadable)?
    else {
        return Ok(SelectionSet::new());
    };
    let listings: Vec<JobListing> =
        serde_json::from_str(&text).map_err(CorruptStateError::Malformed)?;
    Ok(SelectionSet::from_listings(listings))
}

async fn write_snapshot(
    storage: &dyn KeyValueStore,
    snapshot: &[JobListing],
) -> Result<(), StorageWriteError> {
    let encoded = serde_json::to_string(snapshot)?;
    storage.set(SELECTED_JOBS_KEY, &encoded).await?;
    Ok(())
}

async fn run_writer(
    storage: Arc<dyn KeyValueStore>,
    mut commands: mpsc::UnboundedReceiver<WriteCommand>,
    write_failures: Arc<AtomicUsize>,
) {
    while let Some(command) = commands.recv().await {
        let mut latest = match command {
            WriteCommand::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
            WriteCommand::Persist(snapshot) => snapshot,
        };

        // Snapshots are whole-set overwrites: only the newest queued one matters.
        let mut acks = Vec::new();
        while let Ok(next) = commands.try_recv() {
            match next {
                WriteCommand::Persist(snapshot) => latest = snapshot,
                WriteCommand::Flush(ack) => acks.push(ack),
            }
        }

        match write_snapshot(storage.as_ref(), &latest).await {
            Ok(()) => board_debug!("Persisted {} saved jobs", latest.len()),
            Err(err) => {
                write_failures.fetch_add(1, Ordering::Relaxed);
                board_error!("Failed to persist {} saved jobs: {}", latest.len(), err);
            }
        }

        for ack in acks {
            let _ = ack.send(());
        }
    }
    board_debug!("Saved jobs writer stopped");
}
