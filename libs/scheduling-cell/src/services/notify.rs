// libs/scheduling-cell/src/services/notify.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{Notification, NotificationIntent, NotificationKind, SchedulingError};
use crate::store::SchedulingStore;

/// Outbound seam for notification intents. The engine calls this inside its
/// transaction boundary; delivery (email, SMS, push) lives elsewhere.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Record a batch of intents all-or-nothing.
    async fn dispatch(&self, intents: &[NotificationIntent]) -> Result<(), SchedulingError>;

    async fn notify(
        &self,
        recipient_id: Uuid,
        message: &str,
        kind: NotificationKind,
    ) -> Result<(), SchedulingError> {
        self.dispatch(&[NotificationIntent {
            recipient_id,
            message: message.to_string(),
            kind,
        }])
        .await
    }
}

/// Dispatcher that records intents as notification rows in the store.
pub struct StoreNotifier {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
}

impl StoreNotifier {
    pub fn new(store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl NotificationDispatcher for StoreNotifier {
    async fn dispatch(&self, intents: &[NotificationIntent]) -> Result<(), SchedulingError> {
        if intents.is_empty() {
            return Ok(());
        }

        let now = self.clock.now();
        let rows: Vec<Notification> = intents
            .iter()
            .map(|intent| Notification {
                id: Uuid::new_v4(),
                recipient_id: intent.recipient_id,
                message: intent.message.clone(),
                kind: intent.kind,
                created_at: now,
                is_read: false,
            })
            .collect();

        self.store.insert_notifications(rows).await?;
        debug!("recorded {} notification intents", intents.len());
        Ok(())
    }
}
