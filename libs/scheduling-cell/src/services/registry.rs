// libs/scheduling-cell/src/services/registry.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, SchedulingError, SlotKey};

/// Materialized slot occupancy, keyed by (doctor, date, start time). This map
/// must always agree with the set of non-cancelled appointments in the store;
/// BookingEngine owns that consistency, the registry only guarantees
/// single-slot semantics. No method awaits, so no occupancy check can be torn
/// by a task switch.
#[derive(Default)]
pub struct SlotRegistry {
    occupancy: Arc<Mutex<HashMap<SlotKey, Uuid>>>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild occupancy from persisted appointments (startup).
    pub fn hydrate(&self, appointments: &[Appointment]) {
        let mut occupancy = self.occupancy.lock().unwrap();
        occupancy.clear();
        for appointment in appointments.iter().filter(|apt| apt.occupies_slot()) {
            occupancy.insert(appointment.slot_key(), appointment.id);
        }
    }

    pub fn is_free(&self, key: &SlotKey) -> bool {
        !self.occupancy.lock().unwrap().contains_key(key)
    }

    /// Mark the slot occupied by `appointment_id`. Re-reserving with the same
    /// id is a no-op so retried requests are tolerated; a different id gets
    /// Conflict. The returned guard undoes the reservation on drop unless
    /// committed, which keeps aborted bookings from leaking occupied slots.
    pub fn reserve(
        &self,
        key: SlotKey,
        appointment_id: Uuid,
    ) -> Result<ReservationGuard, SchedulingError> {
        let mut occupancy = self.occupancy.lock().unwrap();
        match occupancy.get(&key) {
            Some(existing) if *existing == appointment_id => Ok(ReservationGuard {
                occupancy: Arc::clone(&self.occupancy),
                key,
                appointment_id,
                committed: true,
            }),
            Some(_) => Err(SchedulingError::Conflict(
                "this time slot is already booked".to_string(),
            )),
            None => {
                occupancy.insert(key, appointment_id);
                debug!("slot {} reserved for appointment {}", key, appointment_id);
                Ok(ReservationGuard {
                    occupancy: Arc::clone(&self.occupancy),
                    key,
                    appointment_id,
                    committed: false,
                })
            }
        }
    }

    /// Free the slot. Idempotent.
    pub fn release(&self, key: &SlotKey) {
        if self.occupancy.lock().unwrap().remove(key).is_some() {
            debug!("slot {} released", key);
        }
    }
}

#[derive(Debug)]
pub struct ReservationGuard {
    occupancy: Arc<Mutex<HashMap<SlotKey, Uuid>>>,
    key: SlotKey,
    appointment_id: Uuid,
    committed: bool,
}

impl ReservationGuard {
    /// Keep the reservation past the guard's lifetime.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for ReservationGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut occupancy = self.occupancy.lock().unwrap();
        if occupancy.get(&self.key) == Some(&self.appointment_id) {
            occupancy.remove(&self.key);
            debug!("uncommitted reservation on {} rolled back", self.key);
        }
    }
}
