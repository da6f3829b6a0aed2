// libs/scheduling-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::clock::{Clock, SystemClock};
use crate::models::{
    Actor, Appointment, AppointmentQuery, AppointmentStatus, BookAppointmentRequest,
    DefineAvailabilityRequest, Equipment, NotificationIntent, NotificationKind, RoomType,
    SchedulingError, SchedulingPolicy, SlotKey, WeeklyAvailability,
};
use crate::services::allocation::RoomAllocator;
use crate::services::availability::AvailabilityCalendar;
use crate::services::lifecycle::AppointmentLifecycle;
use crate::services::locks::{patient_lock_key, slot_lock_key, SlotLockManager};
use crate::services::notify::{NotificationDispatcher, StoreNotifier};
use crate::services::registry::SlotRegistry;
use crate::store::SchedulingStore;

/// The scheduling state machine and transaction boundary. Every mutating
/// operation runs under per-key locks covering the slots and patient it
/// touches, validates against current state, and commits or rolls back as one
/// unit. Slot occupancy in the registry always matches the set of
/// non-cancelled appointments in the store.
pub struct BookingEngine {
    store: Arc<dyn SchedulingStore>,
    calendar: AvailabilityCalendar,
    registry: SlotRegistry,
    allocator: RoomAllocator,
    locks: SlotLockManager,
    lifecycle: AppointmentLifecycle,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    policy: SchedulingPolicy,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn SchedulingStore>, config: &AppConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn SchedulingStore>,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let policy = SchedulingPolicy::from(config);
        let calendar =
            AvailabilityCalendar::new(Arc::clone(&store), Arc::clone(&clock), policy.clone());
        let allocator = RoomAllocator::new(Arc::clone(&store));
        let dispatcher = Arc::new(StoreNotifier::new(Arc::clone(&store), Arc::clone(&clock)));

        Self {
            calendar,
            registry: SlotRegistry::new(),
            allocator,
            locks: SlotLockManager::new(config.lock_max_attempts, config.lock_retry_delay_ms),
            lifecycle: AppointmentLifecycle::new(),
            dispatcher,
            store,
            clock,
            policy,
        }
    }

    /// Swap the notification seam, e.g. for an external dispatcher.
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Rebuild slot occupancy from persisted appointments. Call once after
    /// construction when the store is not empty.
    pub async fn hydrate(&self) -> Result<usize, SchedulingError> {
        let active = self.store.active_appointments().await?;
        self.registry.hydrate(&active);
        info!("hydrated {} occupied slots from the store", active.len());
        Ok(active.len())
    }

    // ==============================================================================
    // QUERIES
    // ==============================================================================

    /// Candidate slots from the calendar minus those currently occupied.
    /// Advisory only: a slot reported free can still lose the race to a
    /// concurrent booking, which the write path catches.
    pub async fn query_available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, SchedulingError> {
        let slots = self.calendar.slots_for(doctor_id, date).await?;
        Ok(slots
            .into_iter()
            .filter(|time| {
                self.registry.is_free(&SlotKey {
                    doctor_id,
                    date,
                    start_time: *time,
                })
            })
            .collect())
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        self.store
            .appointment(id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("appointment {} not found", id)))
    }

    pub async fn list_appointments(
        &self,
        query: &AppointmentQuery,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.store.appointments(query).await?)
    }

    pub async fn define_availability(
        &self,
        doctor_id: Uuid,
        request: DefineAvailabilityRequest,
    ) -> Result<WeeklyAvailability, SchedulingError> {
        self.calendar.define_availability(doctor_id, request).await
    }

    pub async fn equipment_status(&self, id: Uuid) -> Result<Equipment, SchedulingError> {
        self.store
            .equipment(id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("equipment {} not found", id)))
    }

    pub async fn unread_notification_count(&self, user_id: Uuid) -> Result<u64, SchedulingError> {
        Ok(self.store.unread_notification_count(user_id).await?)
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> Result<(), SchedulingError> {
        if !self.store.mark_notification_read(id).await? {
            return Err(SchedulingError::NotFound(format!(
                "notification {} not found",
                id
            )));
        }
        Ok(())
    }

    // ==============================================================================
    // BOOK
    // ==============================================================================

    pub async fn book(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "booking appointment for patient {} with doctor {} on {} at {}",
            request.patient_id, request.doctor_id, request.date, request.start_time
        );

        let doctor = self
            .store
            .doctor(request.doctor_id)
            .await?
            .ok_or_else(|| {
                SchedulingError::NotFound(format!("doctor {} not found", request.doctor_id))
            })?;

        self.validate_booking_window(request.date)?;

        let key = SlotKey {
            doctor_id: request.doctor_id,
            date: request.date,
            start_time: request.start_time,
        };
        let _locks = self
            .locks
            .acquire(vec![
                slot_lock_key(&key),
                patient_lock_key(request.patient_id, request.date, request.start_time),
            ])
            .await?;

        // Legality: the calendar is the sole authority on which slots exist.
        let candidates = self
            .calendar
            .slots_for(request.doctor_id, request.date)
            .await?;
        if !candidates.contains(&request.start_time) {
            return Err(SchedulingError::Validation(
                "selected time is not a bookable slot for this doctor".to_string(),
            ));
        }

        // Occupancy, re-checked under lock.
        if !self.registry.is_free(&key) {
            warn!("booking conflict on slot {}", key);
            return Err(SchedulingError::Conflict(
                "this time slot is already booked".to_string(),
            ));
        }

        // One scheduled appointment per patient per slot, any doctor.
        if self
            .store
            .patient_appointment_at(request.patient_id, request.date, request.start_time, None)
            .await?
            .is_some()
        {
            return Err(SchedulingError::Conflict(
                "you already have an appointment at this time".to_string(),
            ));
        }

        let appointment_id = Uuid::new_v4();
        let reservation = self.registry.reserve(key, appointment_id)?;

        let end_time = request.start_time + self.slot_duration();
        let room_hold = self
            .allocator
            .assign(
                request.date,
                request.start_time,
                end_time,
                Some(RoomType::Consultation),
            )
            .await?;

        let now = self.clock.now();
        let appointment = Appointment {
            id: appointment_id,
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            date: request.date,
            start_time: request.start_time,
            end_time,
            status: AppointmentStatus::Scheduled,
            room_id: room_hold.as_ref().map(|hold| hold.room_id()),
            reason: request.reason,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.store.insert_appointment(appointment.clone()).await {
            warn!(
                "persisting appointment {} failed, rolling back reservation: {}",
                appointment_id, err
            );
            return Err(err.into());
        }

        let intents = [
            NotificationIntent {
                recipient_id: appointment.patient_id,
                message: format!(
                    "Your appointment has been confirmed with Dr. {} on {} at {}",
                    doctor.name, appointment.date, appointment.start_time
                ),
                kind: NotificationKind::Appointment,
            },
            NotificationIntent {
                recipient_id: appointment.doctor_id,
                message: format!(
                    "New appointment booked on {} at {}",
                    appointment.date, appointment.start_time
                ),
                kind: NotificationKind::Appointment,
            },
        ];
        if let Err(err) = self.dispatcher.dispatch(&intents).await {
            warn!(
                "notification dispatch failed, discarding appointment {}: {}",
                appointment_id, err
            );
            let _ = self.store.remove_appointment(appointment_id).await;
            return Err(err);
        }

        reservation.commit();
        info!(
            "appointment {} booked for patient {} (room: {:?})",
            appointment.id, appointment.patient_id, appointment.room_id
        );
        Ok(appointment)
    }

    // ==============================================================================
    // CANCEL
    // ==============================================================================

    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        actor: Actor,
    ) -> Result<Appointment, SchedulingError> {
        debug!("cancelling appointment {}", appointment_id);

        let current = self.get_appointment(appointment_id).await?;
        let key = current.slot_key();
        let _locks = self.locks.acquire(vec![slot_lock_key(&key)]).await?;

        // Re-read under lock; a concurrent cancel may have won.
        let mut appointment = self.get_appointment(appointment_id).await?;
        if appointment.slot_key() != key {
            // A concurrent reschedule moved it; the lock covers the wrong slot.
            return Err(SchedulingError::Busy);
        }
        if appointment.status == AppointmentStatus::Cancelled {
            return Err(SchedulingError::NotFound(format!(
                "appointment {} is already cancelled",
                appointment_id
            )));
        }
        self.lifecycle
            .validate_transition(&appointment.status, &AppointmentStatus::Cancelled)?;
        self.enforce_cancellation_lead_time(&appointment, actor)?;

        let previous = appointment.clone();
        appointment.status = AppointmentStatus::Cancelled;
        appointment.room_id = None;
        appointment.updated_at = self.clock.now();
        self.store.update_appointment(appointment.clone()).await?;

        let intents = [
            NotificationIntent {
                recipient_id: appointment.patient_id,
                message: format!(
                    "Your appointment on {} at {} has been cancelled",
                    appointment.date, appointment.start_time
                ),
                kind: NotificationKind::Cancellation,
            },
            NotificationIntent {
                recipient_id: appointment.doctor_id,
                message: format!(
                    "Appointment on {} at {} has been cancelled",
                    appointment.date, appointment.start_time
                ),
                kind: NotificationKind::Cancellation,
            },
        ];
        if let Err(err) = self.dispatcher.dispatch(&intents).await {
            warn!(
                "notification dispatch failed, restoring appointment {}: {}",
                appointment_id, err
            );
            let _ = self.store.update_appointment(previous).await;
            return Err(err);
        }

        self.registry.release(&key);
        info!("appointment {} cancelled by actor {}", appointment_id, actor.id);
        Ok(appointment)
    }

    // ==============================================================================
    // RESCHEDULE
    // ==============================================================================

    /// Atomic cancel-old + book-new on the same appointment id. The new slot
    /// is validated before the old one is released, so a failed reschedule
    /// leaves the original booking fully intact.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        new_date: NaiveDate,
        new_time: NaiveTime,
        actor: Actor,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "rescheduling appointment {} to {} at {}",
            appointment_id, new_date, new_time
        );

        let current = self.get_appointment(appointment_id).await?;
        let old_key = current.slot_key();
        let new_key = SlotKey {
            doctor_id: current.doctor_id,
            date: new_date,
            start_time: new_time,
        };
        let _locks = self
            .locks
            .acquire(vec![
                slot_lock_key(&old_key),
                slot_lock_key(&new_key),
                patient_lock_key(current.patient_id, new_date, new_time),
            ])
            .await?;

        let mut appointment = self.get_appointment(appointment_id).await?;
        if appointment.slot_key() != old_key {
            // A concurrent reschedule moved it; the lock covers the wrong slot.
            return Err(SchedulingError::Busy);
        }
        if appointment.status == AppointmentStatus::Cancelled {
            return Err(SchedulingError::NotFound(format!(
                "appointment {} is already cancelled",
                appointment_id
            )));
        }
        if appointment.status == AppointmentStatus::Completed {
            return Err(SchedulingError::InvalidState(appointment.status));
        }

        // Vacating the old slot is a cancellation of it; the lead-time rule
        // applies before anything about the new slot is considered.
        self.enforce_cancellation_lead_time(&appointment, actor)?;

        self.validate_booking_window(new_date)?;
        let candidates = self
            .calendar
            .slots_for(appointment.doctor_id, new_date)
            .await?;
        if !candidates.contains(&new_time) {
            return Err(SchedulingError::Validation(
                "selected time is not a bookable slot for this doctor".to_string(),
            ));
        }

        if self
            .store
            .patient_appointment_at(
                appointment.patient_id,
                new_date,
                new_time,
                Some(appointment_id),
            )
            .await?
            .is_some()
        {
            return Err(SchedulingError::Conflict(
                "you already have an appointment at this time".to_string(),
            ));
        }

        // Conflict here if another appointment holds the new slot; reserving
        // our own slot again (same-slot reschedule) is an idempotent no-op.
        let reservation = self.registry.reserve(new_key, appointment_id)?;

        let new_end = new_time + self.slot_duration();
        let room_hold = self
            .allocator
            .assign(new_date, new_time, new_end, Some(RoomType::Consultation))
            .await?;

        let previous = appointment.clone();
        appointment.date = new_date;
        appointment.start_time = new_time;
        appointment.end_time = new_end;
        appointment.room_id = room_hold.as_ref().map(|hold| hold.room_id());
        appointment.updated_at = self.clock.now();

        if let Err(err) = self.store.update_appointment(appointment.clone()).await {
            warn!(
                "persisting reschedule of {} failed, original left intact: {}",
                appointment_id, err
            );
            return Err(err.into());
        }

        let intent = NotificationIntent {
            recipient_id: appointment.patient_id,
            message: format!(
                "Your appointment has been rescheduled to {} at {}",
                new_date, new_time
            ),
            kind: NotificationKind::Appointment,
        };
        if let Err(err) = self.dispatcher.dispatch(std::slice::from_ref(&intent)).await {
            warn!(
                "notification dispatch failed, restoring appointment {}: {}",
                appointment_id, err
            );
            let _ = self.store.update_appointment(previous).await;
            return Err(err);
        }

        reservation.commit();
        if old_key != new_key {
            self.registry.release(&old_key);
        }

        info!(
            "appointment {} rescheduled to {} at {}",
            appointment_id, new_date, new_time
        );
        Ok(appointment)
    }

    // ==============================================================================
    // COMPLETE
    // ==============================================================================

    /// Mark a consultation as done. The slot stays occupied: used slots are
    /// not offered again for the same date and time.
    pub async fn complete(
        &self,
        appointment_id: Uuid,
        notes: Option<String>,
    ) -> Result<Appointment, SchedulingError> {
        debug!("completing appointment {}", appointment_id);

        let current = self.get_appointment(appointment_id).await?;
        let key = current.slot_key();
        let _locks = self.locks.acquire(vec![slot_lock_key(&key)]).await?;

        let mut appointment = self.get_appointment(appointment_id).await?;
        if appointment.slot_key() != key {
            return Err(SchedulingError::Busy);
        }
        self.lifecycle
            .validate_transition(&appointment.status, &AppointmentStatus::Completed)?;

        appointment.status = AppointmentStatus::Completed;
        if let Some(notes) = notes {
            appointment.notes = Some(notes);
        }
        appointment.updated_at = self.clock.now();
        self.store.update_appointment(appointment.clone()).await?;

        info!("appointment {} completed", appointment_id);
        Ok(appointment)
    }

    // ==============================================================================
    // PRIVATE HELPERS
    // ==============================================================================

    fn slot_duration(&self) -> Duration {
        Duration::minutes(self.policy.slot_duration_minutes as i64)
    }

    fn validate_booking_window(&self, date: NaiveDate) -> Result<(), SchedulingError> {
        let today = self.clock.today();
        if date < today {
            return Err(SchedulingError::Validation(
                "cannot book appointments for past dates".to_string(),
            ));
        }
        if date > today + Duration::days(self.policy.advance_booking_days) {
            return Err(SchedulingError::Validation(format!(
                "cannot book appointments more than {} days in advance",
                self.policy.advance_booking_days
            )));
        }
        Ok(())
    }

    /// Cancellation (and vacating a slot during reschedule) must happen
    /// strictly more than the lead time before the appointment starts. An
    /// elevated actor bypasses the window when the override is configured.
    fn enforce_cancellation_lead_time(
        &self,
        appointment: &Appointment,
        actor: Actor,
    ) -> Result<(), SchedulingError> {
        if actor.elevated && self.policy.elevated_cancel_override {
            debug!(
                "elevated actor {} bypassing cancellation lead time for {}",
                actor.id, appointment.id
            );
            return Ok(());
        }

        let lead = Duration::hours(self.policy.cancellation_lead_hours);
        if appointment.starts_at() - self.clock.now() <= lead {
            return Err(SchedulingError::PolicyViolation(format!(
                "cannot cancel less than {} hours before the scheduled time",
                self.policy.cancellation_lead_hours
            )));
        }
        Ok(())
    }
}
