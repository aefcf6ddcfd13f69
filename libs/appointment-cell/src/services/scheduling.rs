// libs/appointment-cell/src/services/scheduling.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use booking_queue_cell::EventQueue;
use patient_cell::{PatientDirectory, WalkInProfile};
use shared_config::AppConfig;
use shared_models::auth::{Actor, Role};

use crate::error::SchedulingError;
use crate::models::{Appointment, AppointmentStatus, Slot, StatusChange, WalkInBooking};
use crate::services::booking::BookingCoordinator;
use crate::services::ledger::AppointmentLedger;
use crate::services::locks::SlotLockTable;
use crate::services::policy::{authorize, AppointmentParties, Operation};
use crate::services::slots::SlotRegistry;

/// Actor-aware entry point to the slot registry, ledger and coordinator.
/// Handlers and tests go through here; nothing else touches the stores.
pub struct SchedulingService {
    registry: Arc<SlotRegistry>,
    ledger: Arc<AppointmentLedger>,
    coordinator: BookingCoordinator,
    patients: Arc<dyn PatientDirectory>,
    events: Arc<EventQueue>,
}

impl SchedulingService {
    pub fn new(config: &AppConfig, patients: Arc<dyn PatientDirectory>) -> Self {
        let events = Arc::new(EventQueue::bounded(config.event_queue_capacity, config.event_journal_capacity));
        Self::with_event_queue(config, patients, events)
    }

    pub fn with_event_queue(
        config: &AppConfig,
        patients: Arc<dyn PatientDirectory>,
        events: Arc<EventQueue>,
    ) -> Self {
        let registry = Arc::new(SlotRegistry::new());
        let locks = Arc::new(SlotLockTable::new(config.booking_lock_timeout()));
        let ledger = Arc::new(AppointmentLedger::new(
            Arc::clone(&registry),
            Arc::clone(&locks),
            config.slot_release_policy,
            Arc::clone(&events),
        ));
        let coordinator = BookingCoordinator::new(
            Arc::clone(&registry),
            Arc::clone(&ledger),
            locks,
            Arc::clone(&patients),
            Arc::clone(&events),
        );

        Self {
            registry,
            ledger,
            coordinator,
            patients,
            events,
        }
    }

    pub fn registry(&self) -> &Arc<SlotRegistry> {
        &self.registry
    }

    pub fn ledger(&self) -> &Arc<AppointmentLedger> {
        &self.ledger
    }

    pub fn patients(&self) -> &Arc<dyn PatientDirectory> {
        &self.patients
    }

    pub fn events(&self) -> &Arc<EventQueue> {
        &self.events
    }

    // ==============================================================================
    // SLOTS
    // ==============================================================================

    pub async fn create_slot(
        &self,
        doctor_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<Slot, SchedulingError> {
        authorize(actor, &Operation::CreateSlot { doctor_id })?;
        self.registry.create_slot(doctor_id, start_time, end_time).await
    }

    pub async fn list_available_slots(
        &self,
        doctor_id: Option<Uuid>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<Vec<Slot>, SchedulingError> {
        // Doctors only ever see their own schedule, filter or not.
        let doctor_id = match actor.role {
            Role::Doctor => doctor_id.or(Some(actor.id)),
            _ => doctor_id,
        };
        authorize(actor, &Operation::ListAvailableSlots { doctor_id })?;
        self.registry.list_available(doctor_id, from, to).await
    }

    pub async fn list_doctor_slots(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<Vec<Slot>, SchedulingError> {
        authorize(actor, &Operation::ListDoctorSlots { doctor_id })?;
        self.registry.list_for_doctor(doctor_id, from, to).await
    }

    // ==============================================================================
    // BOOKING
    // ==============================================================================

    pub async fn book_standard(
        &self,
        slot_id: Uuid,
        patient_id: Uuid,
        intake_notes: Option<String>,
        actor: &Actor,
    ) -> Result<Appointment, SchedulingError> {
        self.coordinator
            .book_standard(slot_id, patient_id, intake_notes, actor)
            .await
    }

    pub async fn book_walk_in(
        &self,
        slot_id: Uuid,
        profile: WalkInProfile,
        intake_notes: Option<String>,
        actor: &Actor,
    ) -> Result<WalkInBooking, SchedulingError> {
        let (appointment, patient) = self
            .coordinator
            .book_walk_in(slot_id, profile, intake_notes, actor)
            .await?;

        Ok(WalkInBooking {
            appointment,
            patient_id: patient.id,
        })
    }

    // ==============================================================================
    // APPOINTMENTS
    // ==============================================================================

    pub async fn set_doctor_notes(
        &self,
        appointment_id: Uuid,
        text: &str,
        actor: &Actor,
    ) -> Result<Appointment, SchedulingError> {
        self.ledger.set_doctor_notes(appointment_id, text, actor).await
    }

    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        actor: &Actor,
    ) -> Result<StatusChange, SchedulingError> {
        self.ledger.update_status(appointment_id, new_status, actor).await
    }

    pub async fn get_appointment(&self, appointment_id: Uuid, actor: &Actor) -> Result<Appointment, SchedulingError> {
        let appointment = self.ledger.get(appointment_id).await?;
        authorize(
            actor,
            &Operation::ViewAppointment {
                parties: AppointmentParties::from(&appointment),
            },
        )?;
        Ok(appointment)
    }

    pub async fn list_by_patient(&self, patient_id: Uuid, actor: &Actor) -> Result<Vec<Appointment>, SchedulingError> {
        authorize(actor, &Operation::ListPatientAppointments { patient_id })?;
        let appointments = self.ledger.list_by_patient(patient_id).await;
        debug!("Patient {} has {} appointments", patient_id, appointments.len());
        Ok(appointments)
    }

    pub async fn list_by_doctor(&self, doctor_id: Uuid, actor: &Actor) -> Result<Vec<Appointment>, SchedulingError> {
        authorize(actor, &Operation::ListDoctorAppointments { doctor_id })?;
        let appointments = self.ledger.list_by_doctor(doctor_id).await;
        debug!("Doctor {} has {} appointments", doctor_id, appointments.len());
        Ok(appointments)
    }
}
