// libs/scheduling-cell/src/store/memory.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentQuery, Doctor, Equipment, Notification, Room, WeeklyAvailability,
};
use crate::store::{SchedulingStore, StoreError};

/// In-memory store. The default backing for tests and single-node
/// deployments; anything durable implements the same trait.
#[derive(Default)]
pub struct MemoryStore {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
    availability: RwLock<Vec<WeeklyAvailability>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    rooms: RwLock<HashMap<Uuid, Room>>,
    equipment: RwLock<HashMap<Uuid, Equipment>>,
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && a_end > b_start
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn insert_doctor(&self, doctor: Doctor) -> Result<(), StoreError> {
        self.doctors.write().await.insert(doctor.id, doctor);
        Ok(())
    }

    async fn doctor(&self, id: Uuid) -> Result<Option<Doctor>, StoreError> {
        Ok(self.doctors.read().await.get(&id).cloned())
    }

    async fn upsert_availability(&self, entry: WeeklyAvailability) -> Result<(), StoreError> {
        let mut rows = self.availability.write().await;
        if let Some(existing) = rows.iter_mut().find(|row| {
            row.doctor_id == entry.doctor_id
                && row.day_of_week == entry.day_of_week
                && row.start_time == entry.start_time
        }) {
            *existing = entry;
        } else {
            rows.push(entry);
        }
        Ok(())
    }

    async fn availability_for_day(
        &self,
        doctor_id: Uuid,
        day: Weekday,
    ) -> Result<Vec<WeeklyAvailability>, StoreError> {
        let mut rows: Vec<WeeklyAvailability> = self
            .availability
            .read()
            .await
            .iter()
            .filter(|row| row.doctor_id == doctor_id && row.day_of_week == day)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.start_time);
        Ok(rows)
    }

    async fn insert_appointment(&self, appointment: Appointment) -> Result<(), StoreError> {
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment);
        Ok(())
    }

    async fn update_appointment(&self, appointment: Appointment) -> Result<(), StoreError> {
        let mut rows = self.appointments.write().await;
        if !rows.contains_key(&appointment.id) {
            return Err(StoreError::Backend(format!(
                "appointment {} does not exist",
                appointment.id
            )));
        }
        rows.insert(appointment.id, appointment);
        Ok(())
    }

    async fn remove_appointment(&self, id: Uuid) -> Result<(), StoreError> {
        self.appointments.write().await.remove(&id);
        Ok(())
    }

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn appointments(&self, query: &AppointmentQuery) -> Result<Vec<Appointment>, StoreError> {
        let rows = self.appointments.read().await;
        let mut matched: Vec<Appointment> = rows
            .values()
            .filter(|apt| {
                query.patient_id.is_none_or(|id| apt.patient_id == id)
                    && query.doctor_id.is_none_or(|id| apt.doctor_id == id)
                    && query.status.is_none_or(|status| apt.status == status)
                    && query.from_date.is_none_or(|from| apt.date >= from)
                    && query.to_date.is_none_or(|to| apt.date <= to)
            })
            .cloned()
            .collect();
        matched.sort_by_key(|apt| (apt.date, apt.start_time));
        Ok(matched)
    }

    async fn active_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        Ok(self
            .appointments
            .read()
            .await
            .values()
            .filter(|apt| apt.occupies_slot())
            .cloned()
            .collect())
    }

    async fn patient_appointment_at(
        &self,
        patient_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        exclude: Option<Uuid>,
    ) -> Result<Option<Appointment>, StoreError> {
        Ok(self
            .appointments
            .read()
            .await
            .values()
            .find(|apt| {
                apt.patient_id == patient_id
                    && apt.date == date
                    && apt.start_time == time
                    && apt.occupies_slot()
                    && exclude != Some(apt.id)
            })
            .cloned())
    }

    async fn room_appointments_overlapping(
        &self,
        room_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Vec<Appointment>, StoreError> {
        Ok(self
            .appointments
            .read()
            .await
            .values()
            .filter(|apt| {
                apt.room_id == Some(room_id)
                    && apt.date == date
                    && apt.occupies_slot()
                    && overlaps(apt.start_time, apt.end_time, start, end)
            })
            .cloned()
            .collect())
    }

    async fn insert_room(&self, room: Room) -> Result<(), StoreError> {
        self.rooms.write().await.insert(room.id, room);
        Ok(())
    }

    async fn room(&self, id: Uuid) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.read().await.get(&id).cloned())
    }

    async fn rooms(&self) -> Result<Vec<Room>, StoreError> {
        let mut rows: Vec<Room> = self.rooms.read().await.values().cloned().collect();
        rows.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(rows)
    }

    async fn insert_equipment(&self, equipment: Equipment) -> Result<(), StoreError> {
        self.equipment.write().await.insert(equipment.id, equipment);
        Ok(())
    }

    async fn equipment(&self, id: Uuid) -> Result<Option<Equipment>, StoreError> {
        Ok(self.equipment.read().await.get(&id).cloned())
    }

    async fn insert_notifications(&self, batch: Vec<Notification>) -> Result<(), StoreError> {
        // Single write-lock extend keeps the batch all-or-nothing.
        self.notifications.write().await.extend(batch);
        Ok(())
    }

    async fn notifications_for(&self, recipient_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        Ok(self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect())
    }

    async fn unread_notification_count(&self, recipient_id: Uuid) -> Result<u64, StoreError> {
        Ok(self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.notifications.write().await;
        match rows.iter_mut().find(|n| n.id == id) {
            Some(row) => {
                row.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
