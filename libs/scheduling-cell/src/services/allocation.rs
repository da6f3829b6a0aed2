// libs/scheduling-cell/src/services/allocation.rs
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Room, RoomType, SchedulingError};
use crate::store::SchedulingStore;

/// Assigns rooms to appointments. A room qualifies when its long-term
/// availability flag is set and nothing occupies it for the requested window;
/// occupancy is derived from non-cancelled appointments referencing the room
/// plus the allocator's own pending holds, so two in-flight bookings can
/// never be granted the same room for overlapping times.
pub struct RoomAllocator {
    store: Arc<dyn SchedulingStore>,
    pending: Arc<Mutex<Vec<PendingHold>>>,
}

struct PendingHold {
    token: Uuid,
    room_id: Uuid,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

impl RoomAllocator {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self {
            store,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// First qualifying room in ascending room-number order, pinned by a
    /// RoomHold until the caller persists its appointment (or drops the hold).
    /// None is a normal outcome: booking proceeds without a room and an
    /// operator can attach one later.
    pub async fn assign(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        required_type: Option<RoomType>,
    ) -> Result<Option<RoomHold>, SchedulingError> {
        let rooms = self.store.rooms().await?;

        for room in rooms {
            if !room.is_available {
                continue;
            }
            if required_type.is_some_and(|required| room.room_type != required) {
                continue;
            }

            // Pin before the occupancy read: any committed appointment is
            // visible to the read, and any uncommitted one still holds its pin.
            let Some(hold) = self.try_hold(&room, date, start, end) else {
                continue;
            };

            let busy = self
                .store
                .room_appointments_overlapping(room.id, date, start, end)
                .await?;
            if busy.is_empty() {
                debug!(
                    "room {} assigned for {} {}-{}",
                    hold.room.room_number, date, start, end
                );
                return Ok(Some(hold));
            }
            // hold drops here, unpinning the room for other windows
        }

        debug!("no free room for {} {}-{}", date, start, end);
        Ok(None)
    }

    fn try_hold(&self, room: &Room, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Option<RoomHold> {
        let mut pending = self.pending.lock().unwrap();
        let contended = pending.iter().any(|hold| {
            hold.room_id == room.id && hold.date == date && hold.start < end && hold.end > start
        });
        if contended {
            return None;
        }

        let token = Uuid::new_v4();
        pending.push(PendingHold {
            token,
            room_id: room.id,
            date,
            start,
            end,
        });
        Some(RoomHold {
            pending: Arc::clone(&self.pending),
            token,
            room: room.clone(),
        })
    }
}

/// Pin on a room for one allocation. Must be kept alive until the appointment
/// referencing the room is persisted; dropping it releases the pin either way
/// (after persistence the appointment row itself carries the occupancy).
pub struct RoomHold {
    pending: Arc<Mutex<Vec<PendingHold>>>,
    token: Uuid,
    pub room: Room,
}

impl RoomHold {
    pub fn room_id(&self) -> Uuid {
        self.room.id
    }
}

impl Drop for RoomHold {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap()
            .retain(|hold| hold.token != self.token);
    }
}
