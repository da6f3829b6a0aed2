mod common;

use assert_matches::assert_matches;
use chrono::Weekday;
use uuid::Uuid;

use common::*;
use scheduling_cell::models::{DefineAvailabilityRequest, SchedulingError, WeeklyAvailability};
use scheduling_cell::store::SchedulingStore;

#[tokio::test]
async fn monday_morning_yields_six_half_hour_slots() {
    let env = test_env();
    let doctor = doctor_with_monday_morning(&env.store).await;

    let slots = env
        .engine
        .query_available_slots(doctor.id, monday())
        .await
        .unwrap();

    assert_eq!(
        slots,
        vec![
            time(9, 0),
            time(9, 30),
            time(10, 0),
            time(10, 30),
            time(11, 0),
            time(11, 30),
        ]
    );
}

#[tokio::test]
async fn day_without_active_window_yields_nothing() {
    let env = test_env();
    let doctor = doctor_with_monday_morning(&env.store).await;

    // No entry for Tuesday at all.
    let tuesday = date(2026, 3, 10);
    assert!(env
        .engine
        .query_available_slots(doctor.id, tuesday)
        .await
        .unwrap()
        .is_empty());

    // An inactive entry generates nothing either.
    env.store
        .upsert_availability(WeeklyAvailability {
            id: Uuid::new_v4(),
            doctor_id: doctor.id,
            day_of_week: Weekday::Tue,
            start_time: time(9, 0),
            end_time: time(12, 0),
            is_active: false,
        })
        .await
        .unwrap();
    assert!(env
        .engine
        .query_available_slots(doctor.id, tuesday)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn past_dates_yield_nothing() {
    let env = test_env();
    let doctor = doctor_with_monday_morning(&env.store).await;

    let last_monday = date(2026, 3, 2);
    let slots = env
        .engine
        .query_available_slots(doctor.id, last_monday)
        .await
        .unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn dates_beyond_the_horizon_yield_nothing() {
    let env = test_env();
    let doctor = doctor_with_monday_morning(&env.store).await;

    // 2026-06-08 is a Monday 96 days past "today"; the horizon is 90.
    let far_monday = date(2026, 6, 8);
    let slots = env
        .engine
        .query_available_slots(doctor.id, far_monday)
        .await
        .unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn slots_must_fit_inside_the_window() {
    let env = test_env();
    let doctor = doctor_with_window(&env.store, Weekday::Mon, time(9, 0), time(9, 45)).await;

    // A second slot at 09:30 would run past 09:45.
    let slots = env
        .engine
        .query_available_slots(doctor.id, monday())
        .await
        .unwrap();
    assert_eq!(slots, vec![time(9, 0)]);
}

#[tokio::test]
async fn booked_slots_disappear_from_the_query() {
    let env = test_env();
    let doctor = doctor_with_monday_morning(&env.store).await;

    env.engine
        .book(book_request(Uuid::new_v4(), doctor.id, monday(), time(9, 0)))
        .await
        .unwrap();

    let slots = env
        .engine
        .query_available_slots(doctor.id, monday())
        .await
        .unwrap();
    assert_eq!(slots.len(), 5);
    assert!(!slots.contains(&time(9, 0)));
}

#[tokio::test]
async fn define_availability_validates_input() {
    let env = test_env();
    let doctor = doctor_with_monday_morning(&env.store).await;

    let backwards = env
        .engine
        .define_availability(
            doctor.id,
            DefineAvailabilityRequest {
                day_of_week: Weekday::Tue,
                start_time: time(12, 0),
                end_time: time(9, 0),
                is_active: true,
            },
        )
        .await;
    assert_matches!(backwards, Err(SchedulingError::Validation(_)));

    let overlapping = env
        .engine
        .define_availability(
            doctor.id,
            DefineAvailabilityRequest {
                day_of_week: Weekday::Mon,
                start_time: time(10, 0),
                end_time: time(13, 0),
                is_active: true,
            },
        )
        .await;
    assert_matches!(overlapping, Err(SchedulingError::Validation(_)));

    let unknown_doctor = env
        .engine
        .define_availability(
            Uuid::new_v4(),
            DefineAvailabilityRequest {
                day_of_week: Weekday::Mon,
                start_time: time(9, 0),
                end_time: time(12, 0),
                is_active: true,
            },
        )
        .await;
    assert_matches!(unknown_doctor, Err(SchedulingError::NotFound(_)));
}

#[tokio::test]
async fn shrinking_availability_never_cancels_existing_appointments() {
    let env = test_env();
    let doctor = doctor_with_monday_morning(&env.store).await;
    let patient = Uuid::new_v4();

    let appointment = env
        .engine
        .book(book_request(patient, doctor.id, monday(), time(11, 30)))
        .await
        .unwrap();

    // Shrink the Monday window to 09:00-10:00; the replacement shares the
    // start time, so the upsert replaces the old row.
    env.engine
        .define_availability(
            doctor.id,
            DefineAvailabilityRequest {
                day_of_week: Weekday::Mon,
                start_time: time(9, 0),
                end_time: time(10, 0),
                is_active: true,
            },
        )
        .await
        .unwrap();

    // Future generation reflects the new window...
    let slots = env
        .engine
        .query_available_slots(doctor.id, monday())
        .await
        .unwrap();
    assert_eq!(slots, vec![time(9, 0), time(9, 30)]);

    // ...but the 11:30 booking is honored untouched.
    let unchanged = env.engine.get_appointment(appointment.id).await.unwrap();
    assert_eq!(unchanged.start_time, time(11, 30));
    assert_eq!(
        serde_json::to_value(&appointment).unwrap(),
        serde_json::to_value(&unchanged).unwrap()
    );
}
