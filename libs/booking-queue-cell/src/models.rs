use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Side effect recorded after a scheduling mutation commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingEvent {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub kind: SchedulingEventKind,
    pub occurred_at: DateTime<Utc>,
}

impl SchedulingEvent {
    pub fn new(appointment_id: Uuid, kind: SchedulingEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            appointment_id,
            kind,
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulingEventKind {
    Booked {
        slot_id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        walk_in: bool,
    },
    DoctorNotesUpdated {
        doctor_id: Uuid,
    },
    StatusChanged {
        from: String,
        to: String,
        changed_by: Uuid,
    },
    SlotReleased {
        slot_id: Uuid,
    },
}

impl SchedulingEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            SchedulingEventKind::Booked { .. } => "booked",
            SchedulingEventKind::DoctorNotesUpdated { .. } => "doctor_notes_updated",
            SchedulingEventKind::StatusChanged { .. } => "status_changed",
            SchedulingEventKind::SlotReleased { .. } => "slot_released",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStats {
    pub published: u64,
    pub delivered_to_subscribers: u64,
    pub undelivered: u64,
    /// Oldest journal entries dropped to stay within the journal bound.
    pub evicted: u64,
}
