// src/application/ports/time.rs
use chrono::{DateTime, Utc};

/// Source of "now" for record expiry and token timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn unix_timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}
