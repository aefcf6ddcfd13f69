use thiserror::Error;
use uuid::Uuid;

use patient_cell::PatientError;
use shared_models::error::AppError;

use crate::models::AppointmentStatus;
use crate::services::policy::DenyReason;

/// Every failure the scheduling core can report. A failed call leaves the
/// slot registry and the appointment ledger exactly as they were.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Access denied: {0}")]
    Policy(DenyReason),

    #[error("Cannot transition appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Timed out after {waited_ms} ms waiting for exclusive access to slot {slot_id}")]
    Timeout { slot_id: Uuid, waited_ms: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchedulingError {
    pub fn slot_not_found(id: Uuid) -> Self {
        SchedulingError::NotFound { entity: "Slot", id }
    }

    pub fn appointment_not_found(id: Uuid) -> Self {
        SchedulingError::NotFound { entity: "Appointment", id }
    }

    pub fn patient_not_found(id: Uuid) -> Self {
        SchedulingError::NotFound { entity: "Patient", id }
    }
}

impl From<PatientError> for SchedulingError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound(id) => SchedulingError::patient_not_found(id),
            PatientError::AlreadyRegistered(_) => SchedulingError::Conflict(err.to_string()),
            PatientError::ValidationError(msg) => SchedulingError::Validation(msg),
            PatientError::Unavailable(_) => SchedulingError::Internal(err.to_string()),
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        let message = err.to_string();
        match err {
            SchedulingError::Validation(_) => AppError::ValidationError(message),
            SchedulingError::NotFound { .. } => AppError::NotFound(message),
            SchedulingError::Conflict(_) => AppError::Conflict(message),
            SchedulingError::Policy(_) => AppError::Forbidden(message),
            SchedulingError::InvalidTransition { .. } => AppError::InvalidTransition(message),
            SchedulingError::State(_) => AppError::InvalidState(message),
            SchedulingError::Timeout { .. } => AppError::Timeout(message),
            SchedulingError::Internal(_) => AppError::Internal(message),
        }
    }
}
