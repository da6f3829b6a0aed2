use std::env;
use std::str::FromStr;

use tracing::warn;

/// Scheduling engine configuration, loaded from the environment with
/// clinic defaults for anything unset.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// How far into the future appointments may be booked, in days.
    pub advance_booking_days: i64,
    /// Minimum hours between "now" and an appointment's start for a
    /// non-elevated cancellation to be accepted.
    pub cancellation_lead_hours: i64,
    /// Fixed consultation duration; every slot is this long.
    pub slot_duration_minutes: u32,
    /// Whether elevated actors may cancel inside the lead-time window.
    pub elevated_cancel_override: bool,
    /// Bounded lock acquisition: attempts before surfacing Busy.
    pub lock_max_attempts: u32,
    /// Base delay between lock attempts; grows linearly per attempt.
    pub lock_retry_delay_ms: u64,
    /// Populate the store with demo doctors/rooms on startup.
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            advance_booking_days: env_or("ADVANCE_BOOKING_DAYS", 90),
            cancellation_lead_hours: env_or("CANCELLATION_LEAD_HOURS", 2),
            slot_duration_minutes: env_or("SLOT_DURATION_MINUTES", 30),
            elevated_cancel_override: env_or("ELEVATED_CANCEL_OVERRIDE", true),
            lock_max_attempts: env_or("LOCK_MAX_ATTEMPTS", 3),
            lock_retry_delay_ms: env_or("LOCK_RETRY_DELAY_MS", 100),
            seed_demo_data: env_or("SEED_DEMO_DATA", false),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            advance_booking_days: 90,
            cancellation_lead_hours: 2,
            slot_duration_minutes: 30,
            elevated_cancel_override: true,
            lock_max_attempts: 3,
            lock_retry_delay_ms: 100,
            seed_demo_data: false,
        }
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has unparseable value {:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
