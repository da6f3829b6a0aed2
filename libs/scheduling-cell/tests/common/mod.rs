#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use uuid::Uuid;

use scheduling_cell::clock::ManualClock;
use scheduling_cell::models::{BookAppointmentRequest, Doctor, Room, RoomType, WeeklyAvailability};
use scheduling_cell::store::{MemoryStore, SchedulingStore};
use scheduling_cell::BookingEngine;
use shared_config::AppConfig;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// Every test starts on Wednesday 2026-03-04 at 10:00 facility time.
pub fn base_now() -> NaiveDateTime {
    date(2026, 3, 4).and_time(time(10, 0))
}

pub fn today() -> NaiveDate {
    date(2026, 3, 4)
}

/// The next Monday after `base_now`.
pub fn monday() -> NaiveDate {
    date(2026, 3, 9)
}

pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub engine: Arc<BookingEngine>,
}

pub fn test_env() -> TestEnv {
    env_with_config(AppConfig::default())
}

pub fn env_with_config(config: AppConfig) -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(base_now()));
    let engine = Arc::new(BookingEngine::with_clock(
        store.clone(),
        &config,
        clock.clone(),
    ));
    TestEnv {
        store,
        clock,
        engine,
    }
}

pub async fn doctor_with_window(
    store: &MemoryStore,
    day: Weekday,
    start: NaiveTime,
    end: NaiveTime,
) -> Doctor {
    let doctor = Doctor {
        id: Uuid::new_v4(),
        name: "Sarah Mitchell".to_string(),
        specialization: "General Medicine".to_string(),
    };
    store.insert_doctor(doctor.clone()).await.unwrap();
    store
        .upsert_availability(WeeklyAvailability {
            id: Uuid::new_v4(),
            doctor_id: doctor.id,
            day_of_week: day,
            start_time: start,
            end_time: end,
            is_active: true,
        })
        .await
        .unwrap();
    doctor
}

/// Doctor available Monday 09:00-12:00 (the canonical six-slot window).
pub async fn doctor_with_monday_morning(store: &MemoryStore) -> Doctor {
    doctor_with_window(store, Weekday::Mon, time(9, 0), time(12, 0)).await
}

pub async fn consultation_room(store: &MemoryStore, number: &str) -> Room {
    let room = Room {
        id: Uuid::new_v4(),
        room_number: number.to_string(),
        room_type: RoomType::Consultation,
        floor: 1,
        capacity: 3,
        is_available: true,
    };
    store.insert_room(room.clone()).await.unwrap();
    room
}

pub fn book_request(
    patient_id: Uuid,
    doctor_id: Uuid,
    date: NaiveDate,
    start_time: NaiveTime,
) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id,
        doctor_id,
        date,
        start_time,
        reason: "Routine check-up".to_string(),
    }
}
