use chrono::{DateTime, Duration, Utc};

pub fn attempt_deadline(started_at: DateTime<Utc>, time_limit_minutes: i32) -> DateTime<Utc> {
    started_at + Duration::minutes(time_limit_minutes as i64)
}

pub fn remaining_seconds(
    started_at: DateTime<Utc>,
    time_limit_minutes: i32,
    now: DateTime<Utc>,
) -> i64 {
    (attempt_deadline(started_at, time_limit_minutes) - now)
        .num_seconds()
        .max(0)
}

pub fn is_expired(started_at: DateTime<Utc>, time_limit_minutes: i32, now: DateTime<Utc>) -> bool {
    now >= attempt_deadline(started_at, time_limit_minutes)
}
