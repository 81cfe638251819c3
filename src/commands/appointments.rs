use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::commands::{format_local, CommandResult};
use crate::error::AppError;
use crate::i18n;
use crate::models::Appointment;
use crate::services::booking::{BookingError, BookingRequest};
use crate::AppState;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a user-supplied start time. Values without an offset are read in
/// the configured calendar offset.
pub fn parse_start(input: &str, offset: &FixedOffset) -> Result<DateTime<Utc>, BookingError> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .ok_or_else(|| BookingError::InvalidRequest(format!("unrecognised time '{}'", input)))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| BookingError::InvalidRequest(format!("ambiguous time '{}'", input)))
}

fn render_appointment(appt: &Appointment, offset: &FixedOffset) -> String {
    let dentist = appt
        .dentist
        .as_ref()
        .map(|d| d.name.as_str())
        .unwrap_or(appt.dentist_id.as_str());
    format!(
        "{}  Dentist: {}  Date: {}  Status: {}",
        appt.id,
        dentist,
        format_local(appt.start_ts, offset),
        appt.status
    )
}

pub async fn list(state: &AppState) -> CommandResult {
    if !state.api.session().is_authenticated().await {
        return Err(AppError::Unauthorized.into());
    }

    let mut appointments = state.api.appointments().await.map_err(|e| {
        tracing::error!("Failed to load appointments: {}", e);
        e
    })?;

    if appointments.is_empty() {
        return Ok(i18n::tr(Some(state.lang()), "appointments.empty", None));
    }

    appointments.sort_by_key(|a| a.start_ts);
    let offset = state.config.calendar_offset();
    Ok(appointments
        .iter()
        .map(|a| render_appointment(a, &offset))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub async fn availability(state: &AppState, dentist_id: &str, date: NaiveDate) -> CommandResult {
    let mut booked = state.api.availability(dentist_id, date).await?;

    if booked.is_empty() {
        return Ok(i18n::tr(Some(state.lang()), "availability.free", None));
    }

    booked.sort_by_key(|a| a.start_ts);
    let offset = state.config.calendar_offset();
    Ok(booked
        .iter()
        .map(|a| {
            format!(
                "{} - {}  booked",
                format_local(a.start_ts, &offset),
                a.end_ts.with_timezone(&offset).format("%H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

pub async fn book(state: &AppState, dentist_id: String, at: &str) -> CommandResult {
    let offset = state.config.calendar_offset();
    let start = parse_start(at, &offset)?;

    let appointment = state
        .booking
        .submit(BookingRequest {
            dentist_id,
            start,
            existing_id: None,
        })
        .await?;

    let dentist_name = dentist_name(state, &appointment.dentist_id).await;
    let when = format_local(appointment.start_ts, &offset);
    Ok(i18n::tr(
        Some(state.lang()),
        "booking.booked",
        Some(&[("dentist", dentist_name.as_str()), ("start", when.as_str())]),
    ))
}

pub async fn reschedule(
    state: &AppState,
    id: String,
    dentist_id: Option<String>,
    at: &str,
) -> CommandResult {
    let offset = state.config.calendar_offset();
    let start = parse_start(at, &offset)?;

    let dentist_id = match dentist_id {
        Some(d) => d,
        None => current_dentist(state, &id).await?,
    };

    let appointment = state
        .booking
        .submit(BookingRequest {
            dentist_id,
            start,
            existing_id: Some(id),
        })
        .await?;

    let when = format_local(appointment.start_ts, &offset);
    Ok(i18n::tr(
        Some(state.lang()),
        "booking.rescheduled",
        Some(&[("start", when.as_str())]),
    ))
}

pub async fn cancel(state: &AppState, id: &str) -> CommandResult {
    state.booking.cancel(id).await?;
    Ok(i18n::tr(Some(state.lang()), "booking.cancelled", None))
}

/// Dentist currently assigned to one of the user's appointments.
async fn current_dentist(state: &AppState, appointment_id: &str) -> Result<String, AppError> {
    state
        .api
        .appointments()
        .await?
        .into_iter()
        .find(|a| a.id == appointment_id)
        .map(|a| a.dentist_id)
        .ok_or_else(|| AppError::NotFound(format!("appointment {}", appointment_id)))
}

async fn dentist_name(state: &AppState, dentist_id: &str) -> String {
    match state.api.dentists().await {
        Ok(dentists) => dentists
            .into_iter()
            .find(|d| d.id == dentist_id)
            .map(|d| d.name)
            .unwrap_or_else(|| dentist_id.to_string()),
        Err(e) => {
            tracing::debug!("Could not resolve dentist name for {}: {}", dentist_id, e);
            dentist_id.to_string()
        }
    }
}
