// libs/scheduling-cell/src/store/mod.rs
//
// Persistence seam for the scheduling engine. The engine never touches a
// database session directly; it is handed a SchedulingStore and composes its
// own transaction boundaries on top (reserve, mutate, commit-or-discard).

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentQuery, Doctor, Equipment, Notification, Room, WeeklyAvailability,
};

mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for crate::models::SchedulingError {
    fn from(err: StoreError) -> Self {
        crate::models::SchedulingError::Transaction(err.to_string())
    }
}

#[async_trait]
pub trait SchedulingStore: Send + Sync {
    // ----- doctors and availability -----

    async fn insert_doctor(&self, doctor: Doctor) -> Result<(), StoreError>;

    async fn doctor(&self, id: Uuid) -> Result<Option<Doctor>, StoreError>;

    /// Insert or replace the weekly entry for (doctor, weekday, start).
    async fn upsert_availability(&self, entry: WeeklyAvailability) -> Result<(), StoreError>;

    async fn availability_for_day(
        &self,
        doctor_id: Uuid,
        day: Weekday,
    ) -> Result<Vec<WeeklyAvailability>, StoreError>;

    // ----- appointments -----

    async fn insert_appointment(&self, appointment: Appointment) -> Result<(), StoreError>;

    async fn update_appointment(&self, appointment: Appointment) -> Result<(), StoreError>;

    /// Rollback of an insert that never committed. Not a user-facing delete:
    /// committed appointments are retained forever.
    async fn remove_appointment(&self, id: Uuid) -> Result<(), StoreError>;

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn appointments(&self, query: &AppointmentQuery) -> Result<Vec<Appointment>, StoreError>;

    /// All non-cancelled appointments; used to rebuild slot occupancy.
    async fn active_appointments(&self) -> Result<Vec<Appointment>, StoreError>;

    /// The patient's non-cancelled appointment at exactly (date, time), with
    /// any doctor, excluding the given appointment id if present.
    async fn patient_appointment_at(
        &self,
        patient_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        exclude: Option<Uuid>,
    ) -> Result<Option<Appointment>, StoreError>;

    /// Non-cancelled appointments holding `room_id` whose [start, end) overlaps
    /// the given window on `date`.
    async fn room_appointments_overlapping(
        &self,
        room_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Vec<Appointment>, StoreError>;

    // ----- rooms and equipment -----

    async fn insert_room(&self, room: Room) -> Result<(), StoreError>;

    async fn room(&self, id: Uuid) -> Result<Option<Room>, StoreError>;

    async fn rooms(&self) -> Result<Vec<Room>, StoreError>;

    async fn insert_equipment(&self, equipment: Equipment) -> Result<(), StoreError>;

    async fn equipment(&self, id: Uuid) -> Result<Option<Equipment>, StoreError>;

    // ----- notifications -----

    /// All-or-nothing batch insert; a failed mutation must record nothing.
    async fn insert_notifications(&self, batch: Vec<Notification>) -> Result<(), StoreError>;

    async fn notifications_for(&self, recipient_id: Uuid) -> Result<Vec<Notification>, StoreError>;

    async fn unread_notification_count(&self, recipient_id: Uuid) -> Result<u64, StoreError>;

    /// Returns false if the notification does not exist.
    async fn mark_notification_read(&self, id: Uuid) -> Result<bool, StoreError>;
}
