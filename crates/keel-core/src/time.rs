//! Timestamp helpers.
//!
//! Project documents store local wall-clock time without an offset and with at
//! most microsecond precision (`2024-05-01T10:20:30.123456`).

use chrono::{Local, NaiveDateTime, Timelike};

/// Current local time truncated to microseconds.
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}
