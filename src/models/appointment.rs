use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::Dentist;

// ============================================================================
// Appointment records as returned by the API
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub dentist_id: String,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    #[serde(default)]
    pub status: AppointmentStatus,
    /// Embedded by the "my appointments" listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dentist: Option<Dentist>,
}

impl Appointment {
    pub fn window(&self) -> AppointmentWindow {
        AppointmentWindow {
            start: self.start_ts,
            end: self.end_ts,
        }
    }
}

/// Appointment status. Unknown values coming from the server are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    #[default]
    Booked,
    Cancelled,
    Completed,
    Other(String),
}

impl From<String> for AppointmentStatus {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "booked" | "scheduled" | "confirmed" => AppointmentStatus::Booked,
            "cancelled" | "canceled" => AppointmentStatus::Cancelled,
            "completed" => AppointmentStatus::Completed,
            _ => AppointmentStatus::Other(value),
        }
    }
}

impl From<AppointmentStatus> for String {
    fn from(value: AppointmentStatus) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Booked => f.write_str("booked"),
            AppointmentStatus::Cancelled => f.write_str("cancelled"),
            AppointmentStatus::Completed => f.write_str("completed"),
            AppointmentStatus::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub dentist_id: String,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleInput {
    pub dentist_id: String,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
}

// ============================================================================
// Time windows
// ============================================================================

/// A half-open `[start, end)` appointment window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AppointmentWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if end <= start {
            return Err(AppError::Validation(format!(
                "appointment must end after it starts ({} - {})",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn starting_at(start: DateTime<Utc>, duration: Duration) -> AppResult<Self> {
        let end = start.checked_add_signed(duration).ok_or_else(|| {
            AppError::Validation(format!(
                "appointment starting at {} ends out of range",
                start.to_rfc3339()
            ))
        })?;
        Self::new(start, end)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Calendar day the window starts on, as seen from `offset`.
    pub fn calendar_day(&self, offset: &FixedOffset) -> NaiveDate {
        self.start.with_timezone(offset).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, h, m, 0).unwrap()
    }

    #[test]
    fn window_rejects_non_positive_duration() {
        assert!(AppointmentWindow::new(at(10, 0), at(10, 0)).is_err());
        assert!(AppointmentWindow::new(at(10, 0), at(9, 0)).is_err());
        let w = AppointmentWindow::starting_at(at(9, 0), Duration::hours(1)).unwrap();
        assert_eq!(w.end, at(10, 0));
        assert_eq!(w.duration(), Duration::hours(1));
    }

    #[test]
    fn window_ending_past_max_date_is_rejected() {
        let last_slot = DateTime::<Utc>::MAX_UTC - Duration::minutes(30);
        assert!(matches!(
            AppointmentWindow::starting_at(last_slot, Duration::hours(1)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn calendar_day_uses_offset() {
        let w = AppointmentWindow::new(at(2, 0), at(3, 0)).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(w.calendar_day(&utc), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(w.calendar_day(&new_york), NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
    }

    #[test]
    fn appointment_deserializes_from_api_json() {
        let raw = r#"{
            "id": "a1",
            "userId": "u1",
            "dentistId": "d1",
            "startTs": "2024-01-10T09:00:00.000Z",
            "endTs": "2024-01-10T10:00:00.000Z",
            "status": "CANCELED",
            "dentist": { "id": "d1", "name": "Dr. Molar", "specialization": "Orthodontics" }
        }"#;
        let appt: Appointment = serde_json::from_str(raw).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Cancelled);
        assert_eq!(appt.window().start, at(9, 0));
        assert_eq!(appt.dentist.unwrap().name, "Dr. Molar");
    }

    #[test]
    fn unknown_status_is_preserved() {
        let status = AppointmentStatus::from("no-show".to_string());
        assert_eq!(status, AppointmentStatus::Other("no-show".to_string()));
        assert_eq!(status.to_string(), "no-show");
    }
}
