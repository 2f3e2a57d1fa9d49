#![allow(dead_code)]

use async_trait::async_trait;
use batchedit::{
    BatchResponse, BatchResultItem, BatchTransport, Notification, NotificationSink,
    RecordPatchPayload, TransportError,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

type Scripted = Result<BatchResponse, TransportError>;

/// Replays queued responses in order and records every batch it receives.
/// With nothing queued it accepts every record.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Vec<RecordPatchPayload>>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(self: &Arc<Self>, results: Vec<BatchResultItem>) -> Arc<Self> {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(BatchResponse::from_results(results)));
        self.clone()
    }

    pub fn fail(self: &Arc<Self>, err: TransportError) -> Arc<Self> {
        self.responses.lock().unwrap().push_back(Err(err));
        self.clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Vec<RecordPatchPayload>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Vec<RecordPatchPayload> {
        self.calls.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl BatchTransport for ScriptedTransport {
    async fn submit_batch(
        &self,
        payloads: Vec<RecordPatchPayload>,
    ) -> Result<BatchResponse, TransportError> {
        self.calls.lock().unwrap().push(payloads.clone());
        let scripted = self.responses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(BatchResponse::from_results(
                payloads
                    .into_iter()
                    .map(|payload| BatchResultItem::success(payload.id))
                    .collect(),
            ))
        })
    }
}

/// Holds the batch call open until the test releases it.
pub struct GatedTransport {
    entered: Mutex<Option<oneshot::Sender<Vec<RecordPatchPayload>>>>,
    release: tokio::sync::Mutex<Option<oneshot::Receiver<BatchResponse>>>,
}

pub struct Gate {
    pub entered: oneshot::Receiver<Vec<RecordPatchPayload>>,
    pub release: oneshot::Sender<BatchResponse>,
}

impl GatedTransport {
    pub fn new() -> (Arc<Self>, Gate) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let transport = Arc::new(Self {
            entered: Mutex::new(Some(entered_tx)),
            release: tokio::sync::Mutex::new(Some(release_rx)),
        });
        (
            transport,
            Gate {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }
}

#[async_trait]
impl BatchTransport for GatedTransport {
    async fn submit_batch(
        &self,
        payloads: Vec<RecordPatchPayload>,
    ) -> Result<BatchResponse, TransportError> {
        let entered = self.entered.lock().unwrap().take();
        if let Some(entered) = entered {
            let _ = entered.send(payloads);
        }
        let release = self.release.lock().await.take();
        match release {
            Some(release) => release
                .await
                .map_err(|_| TransportError::Network("gate dropped".into())),
            None => Err(TransportError::Network("gate already used".into())),
        }
    }
}

#[derive(Default)]
pub struct RecordingSink {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.notifications.lock().unwrap().last().cloned()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}
