// libs/scheduling-cell/src/services/lifecycle.rs
use tracing::warn;

use crate::models::{AppointmentStatus, SchedulingError};

pub struct AppointmentLifecycle;

impl AppointmentLifecycle {
    pub fn new() -> Self {
        Self
    }

    /// Valid next statuses for a given current status. Completed and
    /// Cancelled are terminal.
    pub fn valid_transitions(&self, current: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    pub fn validate_transition(
        &self,
        current: &AppointmentStatus,
        next: &AppointmentStatus,
    ) -> Result<(), SchedulingError> {
        if !self.valid_transitions(current).contains(next) {
            warn!("invalid status transition attempted: {} -> {}", current, next);
            return Err(SchedulingError::InvalidState(*current));
        }
        Ok(())
    }
}

impl Default for AppointmentLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
