use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

use crate::config::Config;
use crate::error::AppError;
use crate::i18n;
use crate::models::{
    Appointment, AppointmentStatus, AppointmentWindow, NewAppointment, RescheduleInput,
};
use crate::services::api::SchedulingApi;
use crate::services::conflict::{find_conflict, CandidateBooking, ExistingAppointment};

/// A booking or reschedule submitted by the user.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub dentist_id: String,
    pub start: DateTime<Utc>,
    /// Set when moving an existing appointment.
    pub existing_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("No dentist selected")]
    MissingDentist,

    #[error("Invalid appointment time: {0}")]
    InvalidRequest(String),

    #[error("A booking request is already in flight")]
    Busy,

    /// Caught by the local pre-check; nothing was sent.
    #[error("Slot overlaps appointment {conflicting_id}")]
    LocalConflict { conflicting_id: String },

    /// The server rejected the write because the slot was taken meanwhile.
    #[error("Server rejected the slot: {0}")]
    RemoteConflict(String),

    #[error("Booking request failed: {0}")]
    TransportFailure(#[source] AppError),
}

impl BookingError {
    /// Local and remote conflicts deliberately render the same message.
    pub fn user_message(&self, lang: &str) -> String {
        let lang = Some(lang);
        match self {
            BookingError::NotAuthenticated => i18n::tr(lang, "auth.login_required", None),
            BookingError::MissingDentist => i18n::tr(lang, "booking.dentist_required", None),
            BookingError::InvalidRequest(err) => {
                i18n::tr(lang, "booking.invalid_time", Some(&[("err", err.as_str())]))
            }
            BookingError::Busy => i18n::tr(lang, "booking.busy", None),
            BookingError::LocalConflict { .. } | BookingError::RemoteConflict(_) => {
                i18n::tr(lang, "booking.slot_unavailable", None)
            }
            BookingError::TransportFailure(_) => i18n::tr(lang, "booking.failed", None),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BookingError::LocalConflict { .. } | BookingError::RemoteConflict(_)
        )
    }

    fn from_write(err: AppError) -> Self {
        match err {
            AppError::Conflict(msg) => BookingError::RemoteConflict(msg),
            AppError::Unauthorized => BookingError::NotAuthenticated,
            other => BookingError::TransportFailure(other),
        }
    }

    fn from_fetch(err: AppError) -> Self {
        match err {
            AppError::Unauthorized => BookingError::NotAuthenticated,
            other => BookingError::TransportFailure(other),
        }
    }
}

/// Submission handler for the booking form.
///
/// Every submit re-fetches the dentist's schedule, drops the appointment being
/// moved, runs the overlap check and only then writes.
pub struct BookingFlow<A> {
    api: A,
    duration: Duration,
    offset: FixedOffset,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the submission finishes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<A: SchedulingApi> BookingFlow<A> {
    pub fn new(api: A, config: &Config) -> Self {
        Self::with_settings(api, config.appointment_duration(), config.calendar_offset())
    }

    pub fn with_settings(api: A, duration: Duration, offset: FixedOffset) -> Self {
        Self {
            api,
            duration,
            offset,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<InFlight<'_>, BookingError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| InFlight(&self.in_flight))
            .map_err(|_| BookingError::Busy)
    }

    pub async fn submit(&self, request: BookingRequest) -> Result<Appointment, BookingError> {
        let _guard = self.begin()?;

        if !self.api.is_authenticated().await {
            return Err(BookingError::NotAuthenticated);
        }
        if request.dentist_id.trim().is_empty() {
            return Err(BookingError::MissingDentist);
        }

        let window = AppointmentWindow::starting_at(request.start, self.duration)
            .map_err(|e| BookingError::InvalidRequest(e.to_string()))?;

        let existing = self.current_schedule(&request.dentist_id, &window).await?;

        let candidate = CandidateBooking {
            dentist_id: request.dentist_id.clone(),
            window,
            exclude_id: request.existing_id.clone(),
        };

        if let Some(hit) = find_conflict(&candidate, &existing) {
            tracing::warn!(
                "Blocked booking for dentist {} at {}: overlaps appointment {}",
                candidate.dentist_id,
                window.start.to_rfc3339(),
                hit.id
            );
            return Err(BookingError::LocalConflict {
                conflicting_id: hit.id.clone(),
            });
        }

        let result = match &request.existing_id {
            Some(id) => {
                self.api
                    .reschedule(
                        id,
                        RescheduleInput {
                            dentist_id: request.dentist_id.clone(),
                            start_ts: window.start,
                            end_ts: window.end,
                        },
                    )
                    .await
            }
            None => {
                self.api
                    .book(NewAppointment {
                        dentist_id: request.dentist_id.clone(),
                        start_ts: window.start,
                        end_ts: window.end,
                    })
                    .await
            }
        };

        match result {
            Ok(appointment) => {
                tracing::info!(
                    "Appointment {} {} for dentist {} at {}",
                    appointment.id,
                    if request.existing_id.is_some() { "rescheduled" } else { "booked" },
                    appointment.dentist_id,
                    appointment.start_ts.to_rfc3339()
                );
                Ok(appointment)
            }
            Err(e) => {
                let err = BookingError::from_write(e);
                if err.is_conflict() {
                    tracing::warn!("Server reported a conflict the local check missed: {}", err);
                } else {
                    tracing::error!("Booking write failed: {}", err);
                }
                Err(err)
            }
        }
    }

    pub async fn cancel(&self, id: &str) -> Result<(), BookingError> {
        let _guard = self.begin()?;

        if !self.api.is_authenticated().await {
            return Err(BookingError::NotAuthenticated);
        }

        self.api.cancel(id).await.map_err(|e| {
            tracing::error!("Failed to cancel appointment {}: {}", id, e);
            BookingError::from_fetch(e)
        })?;
        tracing::info!("Appointment {} cancelled", id);
        Ok(())
    }

    /// Fresh schedule for every calendar day the window touches.
    async fn current_schedule(
        &self,
        dentist_id: &str,
        window: &AppointmentWindow,
    ) -> Result<Vec<ExistingAppointment>, BookingError> {
        let mut existing = Vec::new();
        for day in self.days_touched(window) {
            let appointments = self
                .api
                .fetch_availability(dentist_id, day)
                .await
                .map_err(BookingError::from_fetch)?;
            existing.extend(
                appointments
                    .into_iter()
                    .filter(|a| a.status != AppointmentStatus::Cancelled)
                    .map(ExistingAppointment::from),
            );
        }
        Ok(existing)
    }

    fn days_touched(&self, window: &AppointmentWindow) -> Vec<NaiveDate> {
        let first = window.calendar_day(&self.offset);
        let last = (window.end - Duration::nanoseconds(1))
            .with_timezone(&self.offset)
            .date_naive();
        first.iter_days().take_while(|d| *d <= last).collect()
    }
}
