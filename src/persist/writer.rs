use super::storage::ScopedStorage;
use log::warn;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum WriterCommand {
    Save(JsonValue),
    Remove,
    Flush(oneshot::Sender<()>),
}

/// Background task that applies snapshot writes in the order they were
/// scheduled. Failures are logged and dropped.
///
/// Dropping the writer closes the queue; the task applies whatever is still
/// queued and then exits.
pub struct SnapshotWriter {
    commands: mpsc::UnboundedSender<WriterCommand>,
    join_handle: JoinHandle<()>,
}

impl SnapshotWriter {
    /// Must be called from within a tokio runtime.
    pub fn spawn(storage: Arc<dyn ScopedStorage>, key: String) -> Self {
        let (commands, mut command_rx) = mpsc::unbounded_channel::<WriterCommand>();

        let join_handle = tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                match command {
                    WriterCommand::Save(value) => {
                        if let Err(err) = storage.save(&key, value).await {
                            warn!(
                                "pending edit snapshot write failed: key='{}' error='{}'",
                                key, err
                            );
                        }
                    }
                    WriterCommand::Remove => {
                        if let Err(err) = storage.remove(&key).await {
                            warn!(
                                "pending edit snapshot removal failed: key='{}' error='{}'",
                                key, err
                            );
                        }
                    }
                    WriterCommand::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });

        Self {
            commands,
            join_handle,
        }
    }

    pub fn schedule_save(&self, value: JsonValue) {
        if self.commands.send(WriterCommand::Save(value)).is_err() {
            warn!("pending edit snapshot writer has stopped; write dropped");
        }
    }

    pub fn schedule_remove(&self) {
        if self.commands.send(WriterCommand::Remove).is_err() {
            warn!("pending edit snapshot writer has stopped; removal dropped");
        }
    }

    /// Resolves once every write scheduled before this call has been applied.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(WriterCommand::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Closes the queue and waits for the task to apply what is left.
    pub async fn stop(self) {
        let Self {
            commands,
            join_handle,
        } = self;
        drop(commands);
        let _ = join_handle.await;
    }
}
