use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand};

use crate::error::AppError;
use crate::i18n;
use crate::services::booking::BookingError;
use crate::AppState;

pub mod appointments;
pub mod auth;
pub mod dentists;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a patient account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Me,
    /// List dentists
    Dentists,
    /// Add a dentist to the office directory
    AddDentist {
        #[arg(long)]
        name: String,
        #[arg(long)]
        specialization: String,
        #[arg(long)]
        photo_url: Option<String>,
    },
    /// List your appointments
    Appointments,
    /// Show a dentist's booked slots on a day
    Availability {
        #[arg(long)]
        dentist: String,
        /// Calendar day, YYYY-MM-DD
        #[arg(long)]
        date: chrono::NaiveDate,
    },
    /// Book an appointment
    Book {
        #[arg(long)]
        dentist: String,
        /// Start time, RFC 3339 or YYYY-MM-DDTHH:MM in the calendar offset
        #[arg(long)]
        at: String,
    },
    /// Move an existing appointment
    Reschedule {
        #[arg(long)]
        id: String,
        /// Defaults to the appointment's current dentist
        #[arg(long)]
        dentist: Option<String>,
        #[arg(long)]
        at: String,
    },
    /// Cancel an appointment
    Cancel {
        #[arg(long)]
        id: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl CommandError {
    pub fn user_message(&self, lang: &str) -> String {
        match self {
            CommandError::Booking(e) => e.user_message(lang),
            CommandError::App(AppError::Validation(msg)) => msg.clone(),
            CommandError::App(AppError::Unauthorized) => {
                i18n::tr(Some(lang), "auth.login_required", None)
            }
            CommandError::App(e) => {
                let err = e.to_string();
                i18n::tr(Some(lang), "error.generic", Some(&[("err", err.as_str())]))
            }
        }
    }
}

pub type CommandResult = Result<String, CommandError>;

pub async fn run(state: &AppState, command: Command) -> CommandResult {
    match command {
        Command::Register {
            email,
            password,
            name,
            phone,
        } => auth::register(state, email, password, name, phone).await,
        Command::Login { email, password } => auth::login(state, email, password).await,
        Command::Logout => auth::logout(state).await,
        Command::Me => auth::me(state).await,
        Command::Dentists => dentists::list(state).await,
        Command::AddDentist {
            name,
            specialization,
            photo_url,
        } => dentists::create(state, name, specialization, photo_url).await,
        Command::Appointments => appointments::list(state).await,
        Command::Availability { dentist, date } => {
            appointments::availability(state, &dentist, date).await
        }
        Command::Book { dentist, at } => appointments::book(state, dentist, &at).await,
        Command::Reschedule { id, dentist, at } => {
            appointments::reschedule(state, id, dentist, &at).await
        }
        Command::Cancel { id } => appointments::cancel(state, &id).await,
    }
}

/// Render a timestamp in the configured calendar offset.
pub(crate) fn format_local(ts: DateTime<Utc>, offset: &FixedOffset) -> String {
    ts.with_timezone(offset).format("%b %-d, %Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cli_parses_book() {
        let cli = Cli::try_parse_from([
            "dental-scheduler",
            "book",
            "--dentist",
            "d1",
            "--at",
            "2024-01-10T09:00",
        ])
        .unwrap();
        match cli.command {
            Command::Book { dentist, at } => {
                assert_eq!(dentist, "d1");
                assert_eq!(at, "2024-01-10T09:00");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn cli_parses_availability_date() {
        let cli = Cli::try_parse_from([
            "dental-scheduler",
            "availability",
            "--dentist",
            "d1",
            "--date",
            "2024-01-10",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Availability { date, .. } if date == chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        ));
    }

    #[test]
    fn conflicts_render_the_same_message() {
        let local = CommandError::from(BookingError::LocalConflict {
            conflicting_id: "a1".to_string(),
        });
        let remote = CommandError::from(BookingError::RemoteConflict("taken".to_string()));
        assert_eq!(local.user_message("en"), remote.user_message("en"));
    }

    #[test]
    fn format_local_applies_offset() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 10, 14, 0, 0).unwrap();
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(format_local(ts, &offset), "Jan 10, 2024 09:00");
    }
}
