use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::BatchEvent;

/// A single user-activity event as submitted by producers.
///
/// Only `time` is required on the wire; every payload field falls back to its
/// zero value when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEvent {
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub credits: f64,
}

impl UserEvent {
    /// An event carrying only a timestamp.
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            time,
            uuid: String::new(),
            id: 0,
            active: false,
            email: String::new(),
            phone: String::new(),
            description: String::new(),
            credits: 0.0,
        }
    }
}

impl BatchEvent for UserEvent {
    fn event_time(&self) -> DateTime<Utc> {
        self.time
    }

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.time.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.uuid.clone(),
            self.id.to_string(),
            self.active.to_string(),
            self.email.clone(),
            self.phone.clone(),
            self.description.clone(),
            // f64 Display is the shortest round-trip form and never uses an exponent.
            self.credits.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn row_column_order_and_formats() {
        let event = UserEvent {
            time: Utc.with_ymd_and_hms(2024, 7, 1, 2, 3, 4).unwrap(),
            uuid: "8a1c1d7e".into(),
            id: -42,
            active: true,
            email: "a@example.com".into(),
            phone: "+1 555 0100".into(),
            description: "signed up, then left".into(),
            credits: 12.5,
        };
        assert_eq!(
            event.csv_row(),
            vec![
                "2024-07-01T02:03:04.000000000Z",
                "8a1c1d7e",
                "-42",
                "true",
                "a@example.com",
                "+1 555 0100",
                "signed up, then left",
                "12.5",
            ]
        );
    }

    #[test]
    fn timestamp_keeps_nanoseconds() {
        let time = Utc
            .with_ymd_and_hms(2024, 7, 1, 2, 3, 4)
            .unwrap()
            .checked_add_signed(chrono::TimeDelta::nanoseconds(123_456_789))
            .unwrap();
        assert_eq!(UserEvent::at(time).csv_row()[0], "2024-07-01T02:03:04.123456789Z");
    }

    #[test]
    fn whole_and_large_credits_have_no_exponent() {
        let mut event = UserEvent::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(event.csv_row()[7], "0");
        event.credits = 1e21;
        assert_eq!(event.csv_row()[7], "1000000000000000000000");
    }
}
