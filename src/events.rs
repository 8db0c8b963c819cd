//! Central event channel.
//!
//! Permission denials and failed background writes are never returned to the
//! request that triggered them; they are published here, logged by
//! [`spawn_event_logger`] and forwarded to the owner's WebSocket.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{Operation, PermissionError};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    PermissionDenied {
        user_id: Uuid,
        path: String,
        operation: Operation,
    },
    WriteFailed {
        user_id: Uuid,
        path: String,
        operation: Operation,
        message: String,
    },
    RewardUnlocked {
        user_id: Uuid,
        reward_id: String,
        name: String,
    },
    PointsChanged {
        user_id: Uuid,
        delta: i64,
    },
    DiaryChanged {
        user_id: Uuid,
        entry_id: Uuid,
    },
}

impl AppEvent {
    pub fn user_id(&self) -> Uuid {
        match self {
            AppEvent::PermissionDenied { user_id, .. }
            | AppEvent::WriteFailed { user_id, .. }
            | AppEvent::RewardUnlocked { user_id, .. }
            | AppEvent::PointsChanged { user_id, .. }
            | AppEvent::DiaryChanged { user_id, .. } => *user_id,
        }
    }

    pub fn permission_denied(user_id: Uuid, err: &PermissionError) -> Self {
        AppEvent::PermissionDenied {
            user_id,
            path: err.path.clone(),
            operation: err.operation,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}

/// Log every error-class event in one place.
pub fn spawn_event_logger(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(AppEvent::PermissionDenied {
                    user_id,
                    path,
                    operation,
                }) => {
                    tracing::warn!(user_id = %user_id, path = %path, operation = %operation, "Permission denied");
                }
                Ok(AppEvent::WriteFailed {
                    user_id,
                    path,
                    operation,
                    message,
                }) => {
                    tracing::error!(
                        user_id = %user_id,
                        path = %path,
                        operation = %operation,
                        error = %message,
                        "Background write failed"
                    );
                }
                Ok(AppEvent::RewardUnlocked {
                    user_id, reward_id, ..
                }) => {
                    tracing::info!(user_id = %user_id, reward_id = %reward_id, "Reward unlocked");
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Event logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
