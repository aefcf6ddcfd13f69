// libs/appointment-cell/src/services/ledger.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use booking_queue_cell::{EventQueue, SchedulingEvent, SchedulingEventKind};
use shared_config::SlotReleasePolicy;
use shared_models::auth::Actor;

use crate::error::SchedulingError;
use crate::models::{Appointment, AppointmentStatus, BookingChannel, Slot, StatusChange};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::locks::SlotLockTable;
use crate::services::policy::{authorize, AppointmentParties, Operation};
use crate::services::slots::SlotRegistry;

#[derive(Default)]
pub(crate) struct LedgerState {
    appointments: HashMap<Uuid, Appointment>,
    /// slot id -> the one non-cancelled appointment bound to it
    live_by_slot: HashMap<Uuid, Uuid>,
}

/// Record of every appointment and the single writer of its notes and status.
pub struct AppointmentLedger {
    state: RwLock<LedgerState>,
    registry: Arc<SlotRegistry>,
    locks: Arc<SlotLockTable>,
    lifecycle: AppointmentLifecycleService,
    release_policy: SlotReleasePolicy,
    events: Arc<EventQueue>,
}

impl AppointmentLedger {
    pub fn new(
        registry: Arc<SlotRegistry>,
        locks: Arc<SlotLockTable>,
        release_policy: SlotReleasePolicy,
        events: Arc<EventQueue>,
    ) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            registry,
            locks,
            lifecycle: AppointmentLifecycleService::new(),
            release_policy,
            events,
        }
    }

    pub fn release_policy(&self) -> SlotReleasePolicy {
        self.release_policy
    }

    #[cfg(test)]
    pub(crate) async fn hold_state(&self) -> tokio::sync::RwLockReadGuard<'_, LedgerState> {
        self.state.read().await
    }

    /// Bind a new SCHEDULED appointment to `slot`. Only the booking
    /// coordinator calls this, while it holds the slot's lock.
    pub(crate) async fn create(
        &self,
        slot: &Slot,
        patient_id: Uuid,
        intake_notes: Option<String>,
        channel: BookingChannel,
    ) -> Result<Appointment, SchedulingError> {
        let mut state = self.state.write().await;

        if let Some(existing) = state.live_by_slot.get(&slot.id) {
            return Err(SchedulingError::State(format!(
                "Slot {} is already bound to appointment {}",
                slot.id, existing
            )));
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            slot_id: slot.id,
            patient_id,
            doctor_id: slot.doctor_id,
            scheduled_start: slot.start_time,
            scheduled_end: slot.end_time,
            status: AppointmentStatus::Scheduled,
            channel,
            intake_notes: normalize_notes(intake_notes),
            doctor_notes: None,
            created_at: now,
            updated_at: now,
        };

        state.live_by_slot.insert(slot.id, appointment.id);
        state.appointments.insert(appointment.id, appointment.clone());

        Ok(appointment)
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.state
            .read()
            .await
            .appointments
            .get(&appointment_id)
            .cloned()
            .ok_or(SchedulingError::appointment_not_found(appointment_id))
    }

    /// Overwrite the doctor notes. Last write wins.
    pub async fn set_doctor_notes(
        &self,
        appointment_id: Uuid,
        text: &str,
        actor: &Actor,
    ) -> Result<Appointment, SchedulingError> {
        let updated = {
            let mut state = self.state.write().await;
            let appointment = state
                .appointments
                .get_mut(&appointment_id)
                .ok_or(SchedulingError::appointment_not_found(appointment_id))?;

            authorize(
                actor,
                &Operation::SetDoctorNotes {
                    parties: AppointmentParties::from(&*appointment),
                },
            )?;

            if !self.lifecycle.can_attach_notes(appointment.status) {
                warn!("Refused doctor notes on {} appointment {}", appointment.status, appointment_id);
                return Err(SchedulingError::State(format!(
                    "Cannot attach doctor notes to a {} appointment",
                    appointment.status
                )));
            }

            let text = text.trim();
            if text.is_empty() {
                return Err(SchedulingError::Validation("Doctor notes cannot be empty".to_string()));
            }

            appointment.doctor_notes = Some(text.to_string());
            appointment.updated_at = Utc::now();
            appointment.clone()
        };

        info!("{} {} updated notes on appointment {}", actor.role, actor.id, appointment_id);
        self.events
            .publish(SchedulingEvent::new(
                appointment_id,
                SchedulingEventKind::DoctorNotesUpdated { doctor_id: updated.doctor_id },
            ))
            .await;

        Ok(updated)
    }

    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        actor: &Actor,
    ) -> Result<StatusChange, SchedulingError> {
        let (updated, previous_status) = {
            let mut state = self.state.write().await;
            let appointment = state
                .appointments
                .get_mut(&appointment_id)
                .ok_or(SchedulingError::appointment_not_found(appointment_id))?;

            authorize(
                actor,
                &Operation::UpdateStatus {
                    parties: AppointmentParties::from(&*appointment),
                    to: new_status,
                },
            )?;
            self.lifecycle
                .validate_status_transition(appointment.status, new_status)?;

            let previous_status = appointment.status;
            appointment.status = new_status;
            appointment.updated_at = Utc::now();
            let updated = appointment.clone();

            if new_status == AppointmentStatus::Cancelled {
                state.live_by_slot.remove(&updated.slot_id);
            }

            (updated, previous_status)
        };

        info!(
            "Appointment {} moved from {} to {} by {} {}",
            appointment_id, previous_status, new_status, actor.role, actor.id
        );
        self.events
            .publish(SchedulingEvent::new(
                appointment_id,
                SchedulingEventKind::StatusChanged {
                    from: previous_status.to_string(),
                    to: new_status.to_string(),
                    changed_by: actor.id,
                },
            ))
            .await;

        let slot_released = if new_status == AppointmentStatus::Cancelled {
            self.reconsider_slot(&updated).await
        } else {
            false
        };

        Ok(StatusChange {
            appointment: updated,
            previous_status,
            slot_released,
        })
    }

    /// Newest first.
    pub async fn list_by_patient(&self, patient_id: Uuid) -> Vec<Appointment> {
        self.collect(|appointment| appointment.patient_id == patient_id).await
    }

    /// Newest first.
    pub async fn list_by_doctor(&self, doctor_id: Uuid) -> Vec<Appointment> {
        self.collect(|appointment| appointment.doctor_id == doctor_id).await
    }

    async fn collect<F>(&self, predicate: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut appointments: Vec<Appointment> = self
            .state
            .read()
            .await
            .appointments
            .values()
            .filter(|appointment| predicate(appointment))
            .cloned()
            .collect();

        appointments.sort_by(|a, b| {
            b.scheduled_start
                .cmp(&a.scheduled_start)
                .then(b.created_at.cmp(&a.created_at))
        });

        debug!("Listed {} appointments", appointments.len());
        appointments
    }

    /// Return a cancelled appointment's slot to the pool when the release
    /// policy allows it. A failed release leaves the slot consumed.
    async fn reconsider_slot(&self, cancelled: &Appointment) -> bool {
        match self.release_policy {
            SlotReleasePolicy::Never => return false,
            SlotReleasePolicy::BeforeNotes => {
                if cancelled.doctor_notes.is_some() || cancelled.scheduled_start <= Utc::now() {
                    debug!("Slot {} stays consumed after cancelling {}", cancelled.slot_id, cancelled.id);
                    return false;
                }
            }
        }

        let _guard = match self.locks.acquire(cancelled.slot_id).await {
            Ok(guard) => guard,
            Err(err) => {
                warn!("Could not release slot {}: {}", cancelled.slot_id, err);
                return false;
            }
        };

        if self.state.read().await.live_by_slot.contains_key(&cancelled.slot_id) {
            return false;
        }

        match self.registry.mark_available(cancelled.slot_id).await {
            Ok(_) => {
                info!("Released slot {} after cancelling {}", cancelled.slot_id, cancelled.id);
                self.events
                    .publish(SchedulingEvent::new(
                        cancelled.id,
                        SchedulingEventKind::SlotReleased { slot_id: cancelled.slot_id },
                    ))
                    .await;
                true
            }
            Err(err) => {
                warn!("Could not release slot {}: {}", cancelled.slot_id, err);
                false
            }
        }
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
