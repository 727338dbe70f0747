//! Task countdown and start-time labels.
//!
//! Task timestamps arrive from the backend as local wall-clock strings
//! (`2024-05-01 18:30:00`); the task list shows the time remaining until
//! expiry, refreshed once a second, and the formatted start time.

use std::fmt;

use chrono::{Duration, NaiveDateTime};

/// Formats the backend (and `datetime-local` inputs) use for timestamps.
const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised timestamp {0:?}")]
pub struct TimestampError(pub String);

/// Parse a task timestamp in any of the accepted formats.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| TimestampError(raw.to_string()))
}

/// Time left on a task, split the way the label shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Expired,
    Remaining {
        days: i64,
        hours: i64,
        minutes: i64,
        seconds: i64,
    },
}

impl Countdown {
    /// Countdown from `now` to `expiry`, truncated to whole seconds.
    pub fn between(expiry: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self::from_duration(expiry - now)
    }

    /// Countdown for a remaining duration; zero or less is expired.
    pub fn from_duration(left: Duration) -> Self {
        let total_ms = left.num_milliseconds();
        if total_ms <= 0 {
            return Countdown::Expired;
        }
        let total = total_ms / 1000;
        Countdown::Remaining {
            days: total / 86_400,
            hours: total % 86_400 / 3_600,
            minutes: total % 3_600 / 60,
            seconds: total % 60,
        }
    }

    /// True once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        matches!(self, Countdown::Expired)
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Countdown::Expired => f.write_str("已过期"),
            Countdown::Remaining {
                days,
                hours,
                minutes,
                seconds,
            } => {
                f.write_str("剩余: ")?;
                if days > 0 {
                    write!(f, "{days}天")?;
                }
                write!(f, "{hours}小时{minutes}分{seconds}秒")
            }
        }
    }
}

/// Label for a task start time: `开始时间: YYYY-MM-DD HH:MM:SS`.
pub fn start_time_label(start: NaiveDateTime) -> String {
    format!("开始时间: {}", start.format("%Y-%m-%d %H:%M:%S"))
}

#[cfg(test)]
mod tests {
    use super::{parse_timestamp, start_time_label, Countdown};
    use chrono::Duration;

    #[test]
    fn accepts_all_backend_formats() {
        let a = parse_timestamp("2024-05-01 18:30:00").unwrap();
        let b = parse_timestamp("2024-05-01T18:30:00").unwrap();
        let c = parse_timestamp("2024-05-01T18:30").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_timestamp("tomorrow").unwrap_err();
        assert!(err.to_string().contains("tomorrow"));
    }

    #[test]
    fn formats_days_when_present() {
        let expiry = parse_timestamp("2024-05-02 21:35:15").unwrap();
        let now = parse_timestamp("2024-05-01 18:30:00").unwrap();
        assert_eq!(
            Countdown::between(expiry, now).to_string(),
            "剩余: 1天3小时5分15秒"
        );
    }

    #[test]
    fn omits_zero_days() {
        let countdown = Countdown::from_duration(Duration::seconds(59));
        assert_eq!(countdown.to_string(), "剩余: 0小时0分59秒");
    }

    #[test]
    fn floors_partial_seconds() {
        let countdown = Countdown::from_duration(Duration::milliseconds(1_999));
        assert_eq!(countdown.to_string(), "剩余: 0小时0分1秒");
    }

    #[test]
    fn expired_at_and_after_deadline() {
        assert!(Countdown::from_duration(Duration::zero()).is_expired());
        assert_eq!(
            Countdown::from_duration(Duration::seconds(-5)).to_string(),
            "已过期"
        );
    }

    #[test]
    fn start_time_is_zero_padded() {
        let start = parse_timestamp("2024-01-02T03:04").unwrap();
        assert_eq!(start_time_label(start), "开始时间: 2024-01-02 03:04:00");
    }
}
