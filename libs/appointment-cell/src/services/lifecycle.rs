// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::error::SchedulingError;
use crate::models::AppointmentStatus;

#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), SchedulingError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(SchedulingError::InvalidTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => vec![AppointmentStatus::Completed, AppointmentStatus::Cancelled],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => vec![],
        }
    }

    pub fn is_terminal(&self, status: AppointmentStatus) -> bool {
        self.get_valid_transitions(status).is_empty()
    }

    /// Doctor notes may be written on anything that was not cancelled.
    pub fn can_attach_notes(&self, status: AppointmentStatus) -> bool {
        status != AppointmentStatus::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn scheduled_moves_to_either_terminal_state() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Scheduled, AppointmentStatus::Completed)
            .is_ok());
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Scheduled, AppointmentStatus::Cancelled)
            .is_ok());
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        let lifecycle = AppointmentLifecycleService::new();

        for terminal in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            assert!(lifecycle.is_terminal(terminal));
            for target in [AppointmentStatus::Scheduled, AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
                assert_matches!(
                    lifecycle.validate_status_transition(terminal, target),
                    Err(SchedulingError::InvalidTransition { from, to }) if from == terminal && to == target
                );
            }
        }
    }

    #[test]
    fn scheduled_cannot_be_reapplied() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(!lifecycle.is_terminal(AppointmentStatus::Scheduled));
        assert_matches!(
            lifecycle.validate_status_transition(AppointmentStatus::Scheduled, AppointmentStatus::Scheduled),
            Err(SchedulingError::InvalidTransition { .. })
        );
    }

    #[test]
    fn notes_are_refused_only_once_cancelled() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.can_attach_notes(AppointmentStatus::Scheduled));
        assert!(lifecycle.can_attach_notes(AppointmentStatus::Completed));
        assert!(!lifecycle.can_attach_notes(AppointmentStatus::Cancelled));
    }
}
