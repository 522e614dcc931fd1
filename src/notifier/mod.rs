//! Change fan-out to connected sessions.
//!
//! Every committed booking or driver mutation publishes one [`ChangeEvent`].
//! Delivery is best effort: publishing never fails the mutation, and a
//! subscriber that falls behind the buffer gets a [`Notification::Resync`]
//! telling it to refetch instead of a replay of what it missed.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::observability::metrics::Metrics;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Booking,
    Driver,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Booking => "booking",
            EntityType::Driver => "driver",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Global publish order; gaps mean events were dropped for someone.
    pub sequence: u64,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub change_kind: ChangeKind,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Notification {
    Change(ChangeEvent),
    /// Refetch everything; `missed` is how many events were skipped.
    Resync { missed: u64 },
}

pub type NotificationStream = Pin<Box<dyn Stream<Item = Notification> + Send>>;

#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ChangeEvent>,
    sequence: Arc<AtomicU64>,
    metrics: Metrics,
}

impl ChangeNotifier {
    pub fn new(buffer_size: usize, metrics: Metrics) -> Self {
        let (tx, _unused_rx) = broadcast::channel(buffer_size.max(1));
        Self {
            tx,
            sequence: Arc::new(AtomicU64::new(0)),
            metrics,
        }
    }

    pub fn publish(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        change_kind: ChangeKind,
    ) -> ChangeEvent {
        let event = ChangeEvent {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            entity_type,
            entity_id: entity_id.to_string(),
            change_kind,
            occurred_at: Utc::now(),
        };

        match self.tx.send(event.clone()) {
            Ok(receivers) => {
                debug!(
                    entity = entity_type.as_str(),
                    entity_id = %entity_id,
                    sequence = event.sequence,
                    receivers,
                    "change published"
                );
            }
            Err(_) => {
                debug!(
                    entity = entity_type.as_str(),
                    entity_id = %entity_id,
                    "change not delivered: no active subscribers"
                );
            }
        }

        self.metrics
            .notifications_published_total
            .with_label_values(&[entity_type.as_str()])
            .inc();

        event
    }

    /// A fresh subscription. The first item is always a resync so a newly
    /// (re)connected session starts from a full fetch.
    pub fn subscribe(&self) -> NotificationStream {
        let changes = BroadcastStream::new(self.tx.subscribe()).map(|result| match result {
            Ok(event) => Notification::Change(event),
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                warn!(missed, "subscriber lagged behind; requesting resync");
                Notification::Resync { missed }
            }
        });

        Box::pin(tokio_stream::once(Notification::Resync { missed: 0 }).chain(changes))
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
