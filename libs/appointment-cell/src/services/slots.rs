// libs/appointment-cell/src/services/slots.rs
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::Slot;
use crate::services::conflict::ScheduleIndex;

#[derive(Default)]
struct RegistryState {
    slots: HashMap<Uuid, Slot>,
    schedules: HashMap<Uuid, ScheduleIndex>,
}

/// Owns every slot and the per-doctor schedule index that keeps them
/// overlap-free. Availability only changes through the booking coordinator
/// and the ledger's cancel path.
#[derive(Default)]
pub struct SlotRegistry {
    state: RwLock<RegistryState>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_slot(
        &self,
        doctor_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Slot, SchedulingError> {
        if start_time >= end_time {
            return Err(SchedulingError::Validation(format!(
                "Slot start {} must be before its end {}",
                start_time, end_time
            )));
        }

        let mut state = self.state.write().await;

        let schedule = state.schedules.entry(doctor_id).or_default();
        if let Some(existing) = schedule.find_overlap(start_time, end_time) {
            warn!("Rejected slot {} - {} for doctor {}: overlaps slot {}", start_time, end_time, doctor_id, existing);
            return Err(SchedulingError::Conflict(format!(
                "Slot overlaps existing slot {} for doctor {}",
                existing, doctor_id
            )));
        }

        let slot = Slot::new(doctor_id, start_time, end_time);
        schedule.insert(slot.id, start_time, end_time);
        state.slots.insert(slot.id, slot.clone());

        info!("Created slot {} for doctor {} ({} - {})", slot.id, doctor_id, start_time, end_time);
        Ok(slot)
    }

    pub async fn get(&self, slot_id: Uuid) -> Result<Slot, SchedulingError> {
        self.state
            .read()
            .await
            .slots
            .get(&slot_id)
            .cloned()
            .ok_or(SchedulingError::slot_not_found(slot_id))
    }

    /// Available slots intersecting `[from, to)`, ascending by start.
    pub async fn list_available(
        &self,
        doctor_id: Option<Uuid>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, SchedulingError> {
        validate_range(from, to)?;

        let state = self.state.read().await;
        let mut slots: Vec<Slot> = match doctor_id {
            Some(doctor_id) => collect_for_doctor(&state, doctor_id, from, to),
            None => state
                .slots
                .values()
                .filter(|slot| slot.intersects(from, to))
                .cloned()
                .collect(),
        };
        drop(state);

        slots.retain(|slot| slot.is_available);
        slots.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));

        debug!("Found {} available slots between {} and {}", slots.len(), from, to);
        Ok(slots)
    }

    /// Every slot of one doctor intersecting `[from, to)`, booked or not.
    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>, SchedulingError> {
        validate_range(from, to)?;

        let state = self.state.read().await;
        let slots = collect_for_doctor(&state, doctor_id, from, to);

        debug!("Found {} slots for doctor {} between {} and {}", slots.len(), doctor_id, from, to);
        Ok(slots)
    }

    pub(crate) async fn mark_unavailable(&self, slot_id: Uuid) -> Result<Slot, SchedulingError> {
        self.set_availability(slot_id, false).await
    }

    pub(crate) async fn mark_available(&self, slot_id: Uuid) -> Result<Slot, SchedulingError> {
        self.set_availability(slot_id, true).await
    }

    async fn set_availability(&self, slot_id: Uuid, available: bool) -> Result<Slot, SchedulingError> {
        let mut state = self.state.write().await;
        let slot = state
            .slots
            .get_mut(&slot_id)
            .ok_or(SchedulingError::slot_not_found(slot_id))?;

        if slot.is_available == available {
            return Err(SchedulingError::State(format!(
                "Slot {} is already {}",
                slot_id,
                if available { "available" } else { "booked" }
            )));
        }

        slot.is_available = available;
        slot.updated_at = Utc::now();

        debug!("Slot {} availability set to {}", slot_id, available);
        Ok(slot.clone())
    }
}

fn validate_range(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(), SchedulingError> {
    if from >= to {
        return Err(SchedulingError::Validation(format!(
            "Range start {} must be before its end {}",
            from, to
        )));
    }
    Ok(())
}

fn collect_for_doctor(state: &RegistryState, doctor_id: Uuid, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Slot> {
    state
        .schedules
        .get(&doctor_id)
        .map(|schedule| {
            schedule
                .intersecting(from, to)
                .into_iter()
                .filter_map(|id| state.slots.get(&id).cloned())
                .collect()
        })
        .unwrap_or_default()
}
