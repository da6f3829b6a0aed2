// libs/scheduling-cell/src/seed.rs
//
// Demo dataset for running the API against a fresh in-memory store. Gated
// behind the SEED_DEMO_DATA config flag; production deployments provision
// doctors and rooms through their own admin surface.

use anyhow::Result;
use chrono::{NaiveTime, Weekday};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    Doctor, Equipment, EquipmentStatus, Room, RoomType, WeeklyAvailability,
};
use crate::store::SchedulingStore;

pub async fn seed_demo_data(store: &dyn SchedulingStore) -> Result<()> {
    let doctors = [
        ("Sarah Mitchell", "General Medicine"),
        ("James Okafor", "Cardiology"),
        ("Elena Petrova", "Pediatrics"),
    ];

    let weekdays = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];

    for (name, specialization) in doctors {
        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: name.to_string(),
            specialization: specialization.to_string(),
        };
        store.insert_doctor(doctor.clone()).await?;

        for day in weekdays {
            store
                .upsert_availability(WeeklyAvailability {
                    id: Uuid::new_v4(),
                    doctor_id: doctor.id,
                    day_of_week: day,
                    start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                    is_active: true,
                })
                .await?;
            store
                .upsert_availability(WeeklyAvailability {
                    id: Uuid::new_v4(),
                    doctor_id: doctor.id,
                    day_of_week: day,
                    start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                    is_active: true,
                })
                .await?;
        }
    }

    let rooms = [
        ("101", RoomType::Consultation, 1, 3),
        ("102", RoomType::Consultation, 1, 3),
        ("103", RoomType::Consultation, 1, 2),
        ("201", RoomType::Operation, 2, 8),
        ("G01", RoomType::Emergency, 0, 6),
    ];

    for (number, room_type, floor, capacity) in rooms {
        let room = Room {
            id: Uuid::new_v4(),
            room_number: number.to_string(),
            room_type,
            floor,
            capacity,
            is_available: true,
        };
        store.insert_room(room.clone()).await?;

        if room_type == RoomType::Consultation {
            store
                .insert_equipment(Equipment {
                    id: Uuid::new_v4(),
                    name: "Examination table".to_string(),
                    equipment_type: "furniture".to_string(),
                    serial_number: format!("EXT-{}", number),
                    room_id: Some(room.id),
                    status: EquipmentStatus::Available,
                })
                .await?;
        }
    }

    info!("demo dataset seeded: 3 doctors, 5 rooms");
    Ok(())
}
