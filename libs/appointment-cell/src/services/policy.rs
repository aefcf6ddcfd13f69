// libs/appointment-cell/src/services/policy.rs
use std::fmt;

use tracing::warn;
use uuid::Uuid;

use shared_models::auth::{Actor, Role};

use crate::error::SchedulingError;
use crate::models::{Appointment, AppointmentStatus};

/// The parties bound to an existing appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentParties {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
}

impl From<&Appointment> for AppointmentParties {
    fn from(appointment: &Appointment) -> Self {
        Self {
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
        }
    }
}

/// An operation together with the entity it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateSlot { doctor_id: Uuid },
    ListAvailableSlots { doctor_id: Option<Uuid> },
    ListDoctorSlots { doctor_id: Uuid },
    BookStandard { patient_id: Uuid },
    BookWalkIn { slot_doctor_id: Uuid },
    SetDoctorNotes { parties: AppointmentParties },
    UpdateStatus { parties: AppointmentParties, to: AppointmentStatus },
    ViewAppointment { parties: AppointmentParties },
    ListPatientAppointments { patient_id: Uuid },
    ListDoctorAppointments { doctor_id: Uuid },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateSlot { .. } => "create_slot",
            Operation::ListAvailableSlots { .. } => "list_available_slots",
            Operation::ListDoctorSlots { .. } => "list_doctor_slots",
            Operation::BookStandard { .. } => "book_standard",
            Operation::BookWalkIn { .. } => "book_walk_in",
            Operation::SetDoctorNotes { .. } => "set_doctor_notes",
            Operation::UpdateStatus { .. } => "update_status",
            Operation::ViewAppointment { .. } => "view_appointment",
            Operation::ListPatientAppointments { .. } => "list_patient_appointments",
            Operation::ListDoctorAppointments { .. } => "list_doctor_appointments",
        }
    }
}

/// Reason code attached to every denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// A doctor reached into another doctor's schedule.
    NotOwnSchedule,
    /// A patient reached for an appointment or listing that belongs to someone else.
    NotOwnAppointment,
    /// A patient tried to book on behalf of another patient.
    NotSelf,
    /// The role never holds this permission.
    RoleNotPermitted { role: Role, operation: &'static str },
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::NotOwnSchedule => "not_own_schedule",
            DenyReason::NotOwnAppointment => "not_own_appointment",
            DenyReason::NotSelf => "not_self",
            DenyReason::RoleNotPermitted { .. } => "role_not_permitted",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NotOwnSchedule => write!(f, "doctors may only act on their own schedule"),
            DenyReason::NotOwnAppointment => write!(f, "patients may only act on their own appointments"),
            DenyReason::NotSelf => write!(f, "patients may only book for themselves"),
            DenyReason::RoleNotPermitted { role, operation } => {
                write!(f, "role {} may not perform {}", role, operation)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    fn when(condition: bool, reason: DenyReason) -> Self {
        if condition {
            Decision::Allow
        } else {
            Decision::Deny(reason)
        }
    }
}

/// Pure decision over (actor, operation, target).
pub fn evaluate(actor: &Actor, operation: &Operation) -> Decision {
    let forbidden = Decision::Deny(DenyReason::RoleNotPermitted {
        role: actor.role,
        operation: operation.name(),
    });

    match actor.role {
        Role::Doctor => {
            let own = |doctor_id: Uuid| Decision::when(doctor_id == actor.id, DenyReason::NotOwnSchedule);
            match *operation {
                Operation::CreateSlot { doctor_id }
                | Operation::ListDoctorSlots { doctor_id }
                | Operation::ListDoctorAppointments { doctor_id } => own(doctor_id),
                Operation::ListAvailableSlots { doctor_id } => own(doctor_id.unwrap_or(actor.id)),
                Operation::BookWalkIn { slot_doctor_id } => own(slot_doctor_id),
                Operation::SetDoctorNotes { parties } | Operation::ViewAppointment { parties } => {
                    own(parties.doctor_id)
                }
                Operation::UpdateStatus { parties, .. } => own(parties.doctor_id),
                Operation::BookStandard { .. } | Operation::ListPatientAppointments { .. } => forbidden,
            }
        }
        Role::Patient => {
            let own = |patient_id: Uuid| Decision::when(patient_id == actor.id, DenyReason::NotOwnAppointment);
            match *operation {
                Operation::ListAvailableSlots { .. } | Operation::ListDoctorSlots { .. } => Decision::Allow,
                Operation::BookStandard { patient_id } => {
                    Decision::when(patient_id == actor.id, DenyReason::NotSelf)
                }
                Operation::UpdateStatus { parties, to: AppointmentStatus::Cancelled } => own(parties.patient_id),
                Operation::ViewAppointment { parties } => own(parties.patient_id),
                Operation::ListPatientAppointments { patient_id } => own(patient_id),
                Operation::CreateSlot { .. }
                | Operation::BookWalkIn { .. }
                | Operation::SetDoctorNotes { .. }
                | Operation::UpdateStatus { .. }
                | Operation::ListDoctorAppointments { .. } => forbidden,
            }
        }
        Role::Receptionist => match *operation {
            Operation::ListAvailableSlots { .. }
            | Operation::ListDoctorSlots { .. }
            | Operation::BookWalkIn { .. }
            | Operation::UpdateStatus { to: AppointmentStatus::Cancelled, .. }
            | Operation::ViewAppointment { .. }
            | Operation::ListPatientAppointments { .. }
            | Operation::ListDoctorAppointments { .. } => Decision::Allow,
            Operation::CreateSlot { .. }
            | Operation::BookStandard { .. }
            | Operation::SetDoctorNotes { .. }
            | Operation::UpdateStatus { .. } => forbidden,
        },
    }
}

/// Evaluate and turn a denial into the uniform rejection.
pub fn authorize(actor: &Actor, operation: &Operation) -> Result<(), SchedulingError> {
    match evaluate(actor, operation) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            warn!(
                "Denied {} for {} {}: {}",
                operation.name(),
                actor.role,
                actor.id,
                reason.code()
            );
            Err(SchedulingError::Policy(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parties(doctor_id: Uuid, patient_id: Uuid) -> AppointmentParties {
        AppointmentParties { doctor_id, patient_id }
    }

    #[test]
    fn doctors_are_confined_to_their_own_schedule() {
        let doctor = Actor::doctor(Uuid::new_v4());
        let other = Uuid::new_v4();

        assert!(evaluate(&doctor, &Operation::CreateSlot { doctor_id: doctor.id }).is_allowed());
        assert_eq!(
            evaluate(&doctor, &Operation::CreateSlot { doctor_id: other }),
            Decision::Deny(DenyReason::NotOwnSchedule)
        );
        assert_eq!(
            evaluate(
                &doctor,
                &Operation::UpdateStatus { parties: parties(other, Uuid::new_v4()), to: AppointmentStatus::Cancelled }
            ),
            Decision::Deny(DenyReason::NotOwnSchedule)
        );
    }

    #[test]
    fn doctors_cannot_book_for_patients() {
        let doctor = Actor::doctor(Uuid::new_v4());
        assert_eq!(
            evaluate(&doctor, &Operation::BookStandard { patient_id: Uuid::new_v4() }),
            Decision::Deny(DenyReason::RoleNotPermitted { role: Role::Doctor, operation: "book_standard" })
        );
    }

    #[test]
    fn patients_may_only_cancel_their_own_appointments() {
        let patient = Actor::patient(Uuid::new_v4());
        let mine = parties(Uuid::new_v4(), patient.id);
        let theirs = parties(Uuid::new_v4(), Uuid::new_v4());

        assert!(evaluate(&patient, &Operation::UpdateStatus { parties: mine, to: AppointmentStatus::Cancelled }).is_allowed());
        assert_eq!(
            evaluate(&patient, &Operation::UpdateStatus { parties: theirs, to: AppointmentStatus::Cancelled }),
            Decision::Deny(DenyReason::NotOwnAppointment)
        );
        assert!(!evaluate(&patient, &Operation::UpdateStatus { parties: mine, to: AppointmentStatus::Completed }).is_allowed());
        assert!(!evaluate(&patient, &Operation::SetDoctorNotes { parties: mine }).is_allowed());
    }

    #[test]
    fn patients_book_only_for_themselves() {
        let patient = Actor::patient(Uuid::new_v4());
        assert!(evaluate(&patient, &Operation::BookStandard { patient_id: patient.id }).is_allowed());
        assert_eq!(
            evaluate(&patient, &Operation::BookStandard { patient_id: Uuid::new_v4() }),
            Decision::Deny(DenyReason::NotSelf)
        );
    }

    #[test]
    fn receptionists_register_walk_ins_and_cancel_anything() {
        let receptionist = Actor::receptionist(Uuid::new_v4());
        let any = parties(Uuid::new_v4(), Uuid::new_v4());

        assert!(evaluate(&receptionist, &Operation::BookWalkIn { slot_doctor_id: Uuid::new_v4() }).is_allowed());
        assert!(evaluate(&receptionist, &Operation::UpdateStatus { parties: any, to: AppointmentStatus::Cancelled }).is_allowed());
        assert!(!evaluate(&receptionist, &Operation::UpdateStatus { parties: any, to: AppointmentStatus::Completed }).is_allowed());
        assert!(!evaluate(&receptionist, &Operation::SetDoctorNotes { parties: any }).is_allowed());
        assert!(!evaluate(&receptionist, &Operation::CreateSlot { doctor_id: Uuid::new_v4() }).is_allowed());
    }

    #[test]
    fn denials_surface_as_policy_errors() {
        let patient = Actor::patient(Uuid::new_v4());
        let err = authorize(&patient, &Operation::CreateSlot { doctor_id: Uuid::new_v4() }).unwrap_err();
        assert!(matches!(err, SchedulingError::Policy(DenyReason::RoleNotPermitted { .. })));
    }
}
