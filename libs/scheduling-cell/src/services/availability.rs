// libs/scheduling-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{
    DefineAvailabilityRequest, SchedulingError, SchedulingPolicy, WeeklyAvailability,
};
use crate::store::SchedulingStore;

/// Derives the candidate time slots for a doctor on a date from the weekly
/// recurring schedule. This is the single source of truth for which slots can
/// legally exist; BookingEngine never accepts a start time absent from it.
pub struct AvailabilityCalendar {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
    policy: SchedulingPolicy,
}

impl AvailabilityCalendar {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        clock: Arc<dyn Clock>,
        policy: SchedulingPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Ordered candidate start times for (doctor, date) at the configured
    /// duration granularity, each fitting fully inside an active availability
    /// window. Empty when the doctor has no active window that weekday, the
    /// date is in the past, or the date lies beyond the booking horizon.
    pub async fn slots_for(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, SchedulingError> {
        let today = self.clock.today();
        if date < today {
            return Ok(Vec::new());
        }
        if date > today + Duration::days(self.policy.advance_booking_days) {
            return Ok(Vec::new());
        }

        let entries = self
            .store
            .availability_for_day(doctor_id, date.weekday())
            .await?;

        let step = Duration::minutes(self.policy.slot_duration_minutes as i64);
        let mut slots = Vec::new();

        for entry in entries.iter().filter(|entry| entry.is_active) {
            // Step on NaiveDateTime so times cannot wrap around midnight.
            let mut cursor = date.and_time(entry.start_time);
            let window_end = date.and_time(entry.end_time);

            while cursor + step <= window_end {
                slots.push(cursor.time());
                cursor += step;
            }
        }

        slots.sort();
        slots.dedup();

        debug!("{} candidate slots for doctor {} on {}", slots.len(), doctor_id, date);
        Ok(slots)
    }

    /// Insert or replace a weekly availability window. Changes affect future
    /// slot generation only; appointments already booked are honored as-is.
    pub async fn define_availability(
        &self,
        doctor_id: Uuid,
        request: DefineAvailabilityRequest,
    ) -> Result<WeeklyAvailability, SchedulingError> {
        debug!("defining availability for doctor {}", doctor_id);

        if self.store.doctor(doctor_id).await?.is_none() {
            return Err(SchedulingError::NotFound(format!(
                "doctor {} not found",
                doctor_id
            )));
        }

        if request.start_time >= request.end_time {
            return Err(SchedulingError::Validation(
                "start time must be before end time".to_string(),
            ));
        }

        let existing = self
            .store
            .availability_for_day(doctor_id, request.day_of_week)
            .await?;
        let overlapping = existing.iter().any(|entry| {
            entry.start_time != request.start_time
                && request.start_time < entry.end_time
                && request.end_time > entry.start_time
        });
        if overlapping {
            return Err(SchedulingError::Validation(
                "availability overlaps an existing window for this day".to_string(),
            ));
        }

        let entry = WeeklyAvailability {
            id: Uuid::new_v4(),
            doctor_id,
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            is_active: request.is_active,
        };
        self.store.upsert_availability(entry.clone()).await?;

        Ok(entry)
    }
}
