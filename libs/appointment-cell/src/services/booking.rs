// libs/appointment-cell/src/services/booking.rs
use std::future::Future;
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use booking_queue_cell::{EventQueue, SchedulingEvent, SchedulingEventKind};
use patient_cell::services::validate_profile;
use patient_cell::{Patient, PatientDirectory, WalkInProfile};
use shared_models::auth::Actor;

use crate::error::SchedulingError;
use crate::models::{Appointment, BookingChannel, Slot};
use crate::services::ledger::AppointmentLedger;
use crate::services::locks::SlotLockTable;
use crate::services::policy::{authorize, Operation};
use crate::services::slots::SlotRegistry;

/// The only path that flips a slot to booked, and it always creates the
/// matching appointment in the same step.
#[derive(Clone)]
pub struct BookingCoordinator {
    registry: Arc<SlotRegistry>,
    ledger: Arc<AppointmentLedger>,
    locks: Arc<SlotLockTable>,
    patients: Arc<dyn PatientDirectory>,
    events: Arc<EventQueue>,
}

impl BookingCoordinator {
    pub fn new(
        registry: Arc<SlotRegistry>,
        ledger: Arc<AppointmentLedger>,
        locks: Arc<SlotLockTable>,
        patients: Arc<dyn PatientDirectory>,
        events: Arc<EventQueue>,
    ) -> Self {
        Self {
            registry,
            ledger,
            locks,
            patients,
            events,
        }
    }

    /// A patient books an open slot for themself.
    pub async fn book_standard(
        &self,
        slot_id: Uuid,
        patient_id: Uuid,
        intake_notes: Option<String>,
        actor: &Actor,
    ) -> Result<Appointment, SchedulingError> {
        let coordinator = self.clone();
        let actor = *actor;
        run_detached(async move {
            coordinator
                .standard_booking(slot_id, patient_id, intake_notes, &actor)
                .await
        })
        .await
    }

    /// Front desk registers a new patient and books them in one step.
    pub async fn book_walk_in(
        &self,
        slot_id: Uuid,
        profile: WalkInProfile,
        intake_notes: Option<String>,
        actor: &Actor,
    ) -> Result<(Appointment, Patient), SchedulingError> {
        let coordinator = self.clone();
        let actor = *actor;
        run_detached(async move {
            coordinator
                .walk_in_booking(slot_id, profile, intake_notes, &actor)
                .await
        })
        .await
    }

    async fn standard_booking(
        &self,
        slot_id: Uuid,
        patient_id: Uuid,
        intake_notes: Option<String>,
        actor: &Actor,
    ) -> Result<Appointment, SchedulingError> {
        self.registry.get(slot_id).await?;
        let guard = self.locks.acquire(slot_id).await?;

        let slot = self.open_slot(slot_id).await?;
        authorize(actor, &Operation::BookStandard { patient_id })?;

        if self.patients.find(patient_id).await?.is_none() {
            warn!("Booking for unknown patient {} rejected", patient_id);
            return Err(SchedulingError::patient_not_found(patient_id));
        }

        let appointment = self
            .commit(&slot, patient_id, intake_notes, BookingChannel::Online)
            .await?;
        drop(guard);

        info!("Patient {} booked slot {} as appointment {}", patient_id, slot_id, appointment.id);
        self.publish_booked(&appointment, false).await;

        Ok(appointment)
    }

    async fn walk_in_booking(
        &self,
        slot_id: Uuid,
        profile: WalkInProfile,
        intake_notes: Option<String>,
        actor: &Actor,
    ) -> Result<(Appointment, Patient), SchedulingError> {
        validate_profile(&profile)?;

        self.registry.get(slot_id).await?;
        let guard = self.locks.acquire(slot_id).await?;

        let slot = self.open_slot(slot_id).await?;
        authorize(actor, &Operation::BookWalkIn { slot_doctor_id: slot.doctor_id })?;

        let patient = self.patients.register_walk_in(profile).await?;

        let appointment = match self
            .commit(&slot, patient.id, intake_notes, BookingChannel::WalkIn)
            .await
        {
            Ok(appointment) => appointment,
            Err(err) => {
                if let Err(discard_err) = self.patients.discard_walk_in(patient.id).await {
                    error!("Failed to discard walk-in patient {}: {}", patient.id, discard_err);
                }
                return Err(err);
            }
        };
        drop(guard);

        info!(
            "Walk-in patient {} booked into slot {} as appointment {} by {} {}",
            patient.id, slot_id, appointment.id, actor.role, actor.id
        );
        self.publish_booked(&appointment, true).await;

        Ok((appointment, patient))
    }

    /// Fresh read under the lock; the listing a caller saw may be stale.
    async fn open_slot(&self, slot_id: Uuid) -> Result<Slot, SchedulingError> {
        let slot = self.registry.get(slot_id).await?;
        if !slot.is_available {
            warn!("Slot {} already booked", slot_id);
            return Err(SchedulingError::Conflict("slot already booked".to_string()));
        }
        Ok(slot)
    }

    /// Flip the slot and record the appointment, or neither.
    async fn commit(
        &self,
        slot: &Slot,
        patient_id: Uuid,
        intake_notes: Option<String>,
        channel: BookingChannel,
    ) -> Result<Appointment, SchedulingError> {
        self.registry.mark_unavailable(slot.id).await.map_err(|err| {
            error!("Could not reserve slot {}: {}", slot.id, err);
            SchedulingError::Internal(format!("Failed to reserve slot {}", slot.id))
        })?;

        match self.ledger.create(slot, patient_id, intake_notes, channel).await {
            Ok(appointment) => Ok(appointment),
            Err(err) => {
                error!("Could not record appointment for slot {}: {}", slot.id, err);
                if let Err(rollback_err) = self.registry.mark_available(slot.id).await {
                    error!("Rollback of slot {} failed: {}", slot.id, rollback_err);
                }
                Err(SchedulingError::Internal(format!(
                    "Failed to record appointment for slot {}",
                    slot.id
                )))
            }
        }
    }

    async fn publish_booked(&self, appointment: &Appointment, walk_in: bool) {
        self.events
            .publish(SchedulingEvent::new(
                appointment.id,
                SchedulingEventKind::Booked {
                    slot_id: appointment.slot_id,
                    patient_id: appointment.patient_id,
                    doctor_id: appointment.doctor_id,
                    walk_in,
                },
            ))
            .await;
    }
}

/// Once started, a booking runs to completion on its own task even if the
/// caller stops polling; the slot flip and the ledger write are never split.
async fn run_detached<T, F>(booking: F) -> Result<T, SchedulingError>
where
    F: Future<Output = Result<T, SchedulingError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(booking).await.map_err(|err| {
        error!("Booking task did not complete: {}", err);
        SchedulingError::Internal("Booking task did not complete".to_string())
    })?
}
