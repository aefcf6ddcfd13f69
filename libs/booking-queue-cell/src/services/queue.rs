use std::collections::VecDeque;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::{BookingQueueError, QueueStats, SchedulingEvent};

pub const DEFAULT_JOURNAL_CAPACITY: usize = 10_000;

/// In-process queue of scheduling side effects.
///
/// Every event is appended to a bounded journal and fanned out to live
/// subscribers. Once the journal is full the oldest entry is evicted.
/// Publishing with nobody listening is not an error; the journal still holds it.
pub struct EventQueue {
    journal: RwLock<VecDeque<SchedulingEvent>>,
    journal_capacity: usize,
    sender: broadcast::Sender<SchedulingEvent>,
    stats: RwLock<QueueStats>,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self::bounded(capacity, DEFAULT_JOURNAL_CAPACITY)
    }

    pub fn bounded(channel_capacity: usize, journal_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity.max(1));
        let journal_capacity = journal_capacity.max(1);

        Self {
            journal: RwLock::new(VecDeque::with_capacity(journal_capacity.min(1024))),
            journal_capacity,
            sender,
            stats: RwLock::new(QueueStats::default()),
        }
    }

    pub async fn publish(&self, event: SchedulingEvent) {
        debug!("Queueing {} event for appointment {}", event.kind.name(), event.appointment_id);

        let evicted = {
            let mut journal = self.journal.write().await;
            let evicted = if journal.len() >= self.journal_capacity {
                journal.pop_front()
            } else {
                None
            };
            journal.push_back(event.clone());
            evicted
        };

        let mut stats = self.stats.write().await;
        stats.published += 1;
        if let Some(oldest) = evicted {
            debug!("Journal full, evicted {} event {}", oldest.kind.name(), oldest.id);
            stats.evicted += 1;
        }
        match self.sender.send(event) {
            Ok(receivers) => stats.delivered_to_subscribers += receivers as u64,
            Err(_) => stats.undelivered += 1,
        }
    }

    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    /// Oldest retained event first.
    pub async fn journal(&self) -> Vec<SchedulingEvent> {
        self.journal.read().await.iter().cloned().collect()
    }

    pub async fn events_for(&self, appointment_id: Uuid) -> Vec<SchedulingEvent> {
        self.journal
            .read()
            .await
            .iter()
            .filter(|event| event.appointment_id == appointment_id)
            .cloned()
            .collect()
    }

    pub async fn stats(&self) -> QueueStats {
        self.stats.read().await.clone()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(1024)
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<SchedulingEvent>,
}

impl EventSubscriber {
    pub async fn recv(&mut self) -> Result<SchedulingEvent, BookingQueueError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Lagged(skipped) => BookingQueueError::Lagged { skipped },
            broadcast::error::RecvError::Closed => BookingQueueError::Closed,
        })
    }

    pub fn try_recv(&mut self) -> Option<Result<SchedulingEvent, BookingQueueError>> {
        match self.receiver.try_recv() {
            Ok(event) => Some(Ok(event)),
            Err(broadcast::error::TryRecvError::Empty) => None,
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => Some(Err(BookingQueueError::Lagged { skipped })),
            Err(broadcast::error::TryRecvError::Closed) => Some(Err(BookingQueueError::Closed)),
        }
    }
}
