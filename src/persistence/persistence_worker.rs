use super::{binding_store::BindingStore, BindingTable, PersistenceError};
use std::time::Duration;
use tokio::sync::mpsc::{channel, Sender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Sends the outcome back if somebody is waiting for it, logs failures otherwise
macro_rules! respond {
    ($result:expr, $response_tx:expr, $what:literal) => {{
        let result = $result;
        if let Err(e) = &result {
            error!("Failed to {} bindings: {}", $what, e);
        }
        if let Some(tx) = $response_tx {
            if tx.send(result).is_err() {
                warn!("Failed to send {} response", $what);
            }
        }
    }};
}

#[derive(Debug)]
pub enum PersistenceAction {
    Save {
        table: BindingTable,
        response_tx: Option<oneshot::Sender<Result<(), PersistenceError>>>,
    },
    Load {
        controller: String,
        response_tx: oneshot::Sender<Result<Option<BindingTable>, PersistenceError>>,
    },
    Reset {
        controller: String,
        response_tx: Option<oneshot::Sender<Result<bool, PersistenceError>>>,
    },
}

/// Owns the [`BindingStore`] and serializes all file access through one task
pub struct PersistenceWorker {
    tx: Sender<PersistenceAction>,
    worker_handle: JoinHandle<()>,
}

impl PersistenceWorker {
    pub fn spawn(store: BindingStore) -> Self {
        let (tx, mut rx) = channel::<PersistenceAction>(32);
        info!(
            "Starting persistence worker at {}",
            store.base_path().display()
        );

        let worker_handle = tokio::spawn(async move {
            while let Some(action) = rx.recv().await {
                match action {
                    PersistenceAction::Save { table, response_tx } => {
                        debug!("Saving bindings of {}", table.controller);
                        respond!(store.save(&table).await.map(|_| ()), response_tx, "save");
                    }
                    PersistenceAction::Load {
                        controller,
                        response_tx,
                    } => {
                        respond!(store.load(&controller).await, Some(response_tx), "load");
                    }
                    PersistenceAction::Reset {
                        controller,
                        response_tx,
                    } => {
                        respond!(store.reset(&controller).await, response_tx, "reset");
                    }
                }
            }
            info!("Persistence worker stopped");
        });

        Self { tx, worker_handle }
    }

    pub fn get_sender(&self) -> Sender<PersistenceAction> {
        self.tx.clone()
    }

    /// Lets queued writes finish once every sender is gone. Aborts the task
    /// if a sender is still alive after [`SHUTDOWN_GRACE`].
    pub async fn shutdown(self) {
        let Self {
            tx,
            mut worker_handle,
        } = self;
        drop(tx);
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut worker_handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Persistence worker failed: {}", e),
            Err(_) => {
                warn!("Persistence worker still has open senders, aborting");
                worker_handle.abort();
            }
        }
    }
}

/// Asks the worker for a controller's stored table
pub async fn load_table(
    tx: &Sender<PersistenceAction>,
    controller: &str,
) -> Result<Option<BindingTable>, PersistenceError> {
    let (response_tx, response_rx) = oneshot::channel();
    tx.send(PersistenceAction::Load {
        controller: controller.to_string(),
        response_tx,
    })
    .await
    .map_err(|e| PersistenceError::ChannelError(e.to_string()))?;

    response_rx
        .await
        .map_err(|e| PersistenceError::ChannelError(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::candidate::CandidateInput;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_load_reset_through_worker() {
        let dir = TempDir::new().unwrap();
        let worker = PersistenceWorker::spawn(BindingStore::new(dir.path()));
        let tx = worker.get_sender();

        let mut table = BindingTable::new("pad");
        table.bind_button("accept", CandidateInput::JoyButton { index: 1 });

        let (save_tx, save_rx) = oneshot::channel();
        tx.send(PersistenceAction::Save {
            table: table.clone(),
            response_tx: Some(save_tx),
        })
        .await
        .unwrap();
        save_rx.await.unwrap().unwrap();

        assert_eq!(load_table(&tx, "pad").await.unwrap(), Some(table));

        let (reset_tx, reset_rx) = oneshot::channel();
        tx.send(PersistenceAction::Reset {
            controller: "pad".to_string(),
            response_tx: Some(reset_tx),
        })
        .await
        .unwrap();
        assert!(reset_rx.await.unwrap().unwrap());
        assert_eq!(load_table(&tx, "pad").await.unwrap(), None);

        drop(tx);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_fire_and_forget_save_is_flushed_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let worker = PersistenceWorker::spawn(BindingStore::new(dir.path()));

        worker
            .get_sender()
            .send(PersistenceAction::Save {
                table: BindingTable::new("pad"),
                response_tx: None,
            })
            .await
            .unwrap();
        worker.shutdown().await;

        assert!(dir.path().join("pad.toml").exists());
    }
}
