mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use common::*;
use scheduling_cell::models::{Equipment, EquipmentStatus};
use scheduling_cell::scheduling_routes;
use scheduling_cell::store::SchedulingStore;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn slots_endpoint_returns_the_monday_grid() {
    let env = test_env();
    let doctor = doctor_with_monday_morning(&env.store).await;
    let app: Router = scheduling_routes(env.engine.clone());

    let uri = format!("/slots?doctor_id={}&date=2026-03-09", doctor.id);
    let response = app.oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 6);
    assert_eq!(slots[0], "09:00:00");
}

#[tokio::test]
async fn booking_twice_over_http_is_a_conflict() {
    let env = test_env();
    let doctor = doctor_with_monday_morning(&env.store).await;
    let app: Router = scheduling_routes(env.engine.clone());

    let payload = json!({
        "patient_id": Uuid::new_v4(),
        "doctor_id": doctor.id,
        "date": "2026-03-09",
        "start_time": "09:00:00",
        "reason": "Routine check-up",
    });

    let first = app
        .clone()
        .oneshot(json_request("POST", "/appointments", payload.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let body = body_json(first).await;
    assert_eq!(body["appointment"]["status"], "scheduled");

    let mut second_payload = payload;
    second_payload["patient_id"] = json!(Uuid::new_v4());
    let second = app
        .oneshot(json_request("POST", "/appointments", second_payload))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn late_cancellation_is_forbidden_over_http() {
    let env = test_env();
    let doctor =
        doctor_with_window(&env.store, chrono::Weekday::Wed, time(11, 0), time(12, 0)).await;
    let patient = Uuid::new_v4();
    let app: Router = scheduling_routes(env.engine.clone());

    // Starts one hour from "now": inside the lead-time window.
    let appointment = env
        .engine
        .book(book_request(patient, doctor.id, today(), time(11, 0)))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/appointments/{}/cancel", appointment.id),
            json!({ "actor": { "id": patient, "elevated": false } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let env = test_env();
    let app: Router = scheduling_routes(env.engine.clone());

    let response = app
        .oneshot(get_request(&format!("/appointments/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reschedule_endpoint_moves_the_booking() {
    let env = test_env();
    let doctor = doctor_with_monday_morning(&env.store).await;
    let patient = Uuid::new_v4();
    let app: Router = scheduling_routes(env.engine.clone());

    let appointment = env
        .engine
        .book(book_request(patient, doctor.id, monday(), time(9, 0)))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/appointments/{}/reschedule", appointment.id),
            json!({
                "new_date": "2026-03-09",
                "new_time": "10:30:00",
                "actor": { "id": patient, "elevated": false },
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["appointment"]["start_time"], "10:30:00");
    assert_eq!(body["appointment"]["id"], json!(appointment.id));
}

#[tokio::test]
async fn equipment_status_lookup() {
    let env = test_env();
    let equipment_id = Uuid::new_v4();
    env.store
        .insert_equipment(Equipment {
            id: equipment_id,
            name: "ECG monitor".to_string(),
            equipment_type: "diagnostic".to_string(),
            serial_number: "ECG-0042".to_string(),
            room_id: None,
            status: EquipmentStatus::Maintenance,
        })
        .await
        .unwrap();
    let app: Router = scheduling_routes(env.engine.clone());

    let response = app
        .clone()
        .oneshot(get_request(&format!("/equipment/{}/status", equipment_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "maintenance");

    let missing = app
        .oneshot(get_request(&format!("/equipment/{}/status", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notification_unread_count_and_mark_read() {
    let env = test_env();
    let doctor = doctor_with_monday_morning(&env.store).await;
    let patient = Uuid::new_v4();
    let app: Router = scheduling_routes(env.engine.clone());

    env.engine
        .book(book_request(patient, doctor.id, monday(), time(9, 0)))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/notifications/{}/unread-count",
            patient
        )))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["unread"], 1);

    let notification_id = env.store.notifications_for(patient).await.unwrap()[0].id;
    let marked = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/notifications/{}/read", notification_id),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(marked.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request(&format!(
            "/notifications/{}/unread-count",
            patient
        )))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["unread"], 0);
}
