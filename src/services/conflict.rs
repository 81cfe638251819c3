//! Client-side double-booking pre-check.
//!
//! The server stays authoritative; this guard only rejects submissions that
//! obviously collide with the dentist's current schedule so they never reach
//! the write endpoint.

use crate::models::{Appointment, AppointmentWindow};

/// A slot already booked with a dentist, as seen by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingAppointment {
    pub id: String,
    pub dentist_id: String,
    pub window: AppointmentWindow,
}

impl From<&Appointment> for ExistingAppointment {
    fn from(appt: &Appointment) -> Self {
        Self {
            id: appt.id.clone(),
            dentist_id: appt.dentist_id.clone(),
            window: appt.window(),
        }
    }
}

impl From<Appointment> for ExistingAppointment {
    fn from(appt: Appointment) -> Self {
        let window = appt.window();
        Self {
            id: appt.id,
            dentist_id: appt.dentist_id,
            window,
        }
    }
}

/// The appointment a user is trying to create, or to move an existing one to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateBooking {
    pub dentist_id: String,
    pub window: AppointmentWindow,
    /// Appointment being rescheduled; never conflicts with itself.
    pub exclude_id: Option<String>,
}

/// Whether `candidate` collides with `existing`.
///
/// Both windows are half-open, so back-to-back appointments (one ending
/// exactly when the other starts) are allowed.
pub fn windows_overlap(candidate: &AppointmentWindow, existing: &AppointmentWindow) -> bool {
    let (s1, e1) = (candidate.start, candidate.end);
    let (s2, e2) = (existing.start, existing.end);

    (s1 >= s2 && s1 < e2) || (e1 > s2 && e1 <= e2) || (s1 <= s2 && e1 >= e2)
}

/// First appointment in `existing` that blocks `candidate`, if any.
///
/// Entries for other dentists and the appointment named by
/// `candidate.exclude_id` are skipped.
pub fn find_conflict<'a>(
    candidate: &CandidateBooking,
    existing: &'a [ExistingAppointment],
) -> Option<&'a ExistingAppointment> {
    let hit = existing
        .iter()
        .filter(|appt| appt.dentist_id == candidate.dentist_id)
        .filter(|appt| candidate.exclude_id.as_deref() != Some(appt.id.as_str()))
        .find(|appt| windows_overlap(&candidate.window, &appt.window))?;

    tracing::debug!(
        "Candidate {} - {} for dentist {} overlaps appointment {}",
        candidate.window.start.to_rfc3339(),
        candidate.window.end.to_rfc3339(),
        candidate.dentist_id,
        hit.id
    );
    Some(hit)
}

/// `true` when the submission must be blocked.
pub fn check_conflict(candidate: &CandidateBooking, existing: &[ExistingAppointment]) -> bool {
    find_conflict(candidate, existing).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, h, m, 0).unwrap()
    }

    fn window(start: (u32, u32), end: (u32, u32)) -> AppointmentWindow {
        AppointmentWindow::new(at(start.0, start.1), at(end.0, end.1)).unwrap()
    }

    fn existing(id: &str, start: (u32, u32), end: (u32, u32)) -> ExistingAppointment {
        ExistingAppointment {
            id: id.to_string(),
            dentist_id: "d1".to_string(),
            window: window(start, end),
        }
    }

    fn candidate(start: (u32, u32), end: (u32, u32), exclude: Option<&str>) -> CandidateBooking {
        CandidateBooking {
            dentist_id: "d1".to_string(),
            window: window(start, end),
            exclude_id: exclude.map(str::to_string),
        }
    }

    #[test]
    fn back_to_back_after_is_allowed() {
        let booked = vec![existing("a1", (9, 0), (10, 0))];
        assert!(!check_conflict(&candidate((10, 0), (11, 0), None), &booked));
    }

    #[test]
    fn back_to_back_before_is_allowed() {
        let booked = vec![existing("a1", (9, 0), (10, 0))];
        assert!(!check_conflict(&candidate((8, 0), (9, 0), None), &booked));
    }

    #[test]
    fn partial_overlap_conflicts() {
        let booked = vec![existing("a1", (9, 0), (10, 0))];
        assert!(check_conflict(&candidate((9, 30), (10, 30), None), &booked));
        assert!(check_conflict(&candidate((8, 30), (9, 30), None), &booked));
    }

    #[test]
    fn identical_window_conflicts_unless_excluded() {
        let booked = vec![existing("a1", (9, 0), (10, 0))];
        assert!(check_conflict(&candidate((9, 0), (10, 0), None), &booked));
        assert!(!check_conflict(&candidate((9, 0), (10, 0), Some("a1")), &booked));
    }

    #[test]
    fn exclusion_only_drops_the_named_appointment() {
        let booked = vec![
            existing("a1", (9, 0), (10, 0)),
            existing("a2", (10, 0), (11, 0)),
        ];
        let moving = candidate((9, 30), (10, 30), Some("a1"));
        assert_eq!(find_conflict(&moving, &booked).map(|a| a.id.as_str()), Some("a2"));
    }

    #[test]
    fn containing_a_shorter_appointment_conflicts() {
        let booked = vec![existing("a1", (9, 15), (9, 45))];
        assert!(check_conflict(&candidate((9, 0), (10, 0), None), &booked));
    }

    #[test]
    fn candidate_inside_longer_appointment_conflicts() {
        let booked = vec![existing("a1", (9, 0), (12, 0))];
        assert!(check_conflict(&candidate((10, 0), (11, 0), None), &booked));
    }

    #[test]
    fn other_dentists_are_ignored() {
        let mut other = existing("a1", (9, 0), (10, 0));
        other.dentist_id = "d2".to_string();
        assert!(!check_conflict(&candidate((9, 0), (10, 0), None), &[other]));
    }

    #[test]
    fn empty_schedule_never_conflicts() {
        assert!(!check_conflict(&candidate((9, 0), (10, 0), None), &[]));
    }

    #[test]
    fn predicate_matches_interval_intersection() {
        // Sweep every quarter-hour pair in a two hour span against a fixed slot.
        let slot = window((10, 0), (11, 0));
        let quarters: Vec<DateTime<Utc>> = (0..=16)
            .map(|q| at(9, 0) + chrono::Duration::minutes(15 * q))
            .collect();
        for (i, s) in quarters.iter().enumerate() {
            for e in &quarters[i + 1..] {
                let w = AppointmentWindow::new(*s, *e).unwrap();
                let expected = w.start < slot.end && w.end > slot.start;
                assert_eq!(windows_overlap(&w, &slot), expected, "{:?}", w);
            }
        }
    }

    #[test]
    fn check_and_find_agree_on_every_candidate() {
        let booked = vec![
            existing("a1", (9, 0), (10, 0)),
            existing("a2", (11, 0), (12, 0)),
        ];
        for (start, end, exclude) in [
            ((8, 0), (9, 0), None),
            ((9, 30), (10, 30), None),
            ((9, 30), (10, 30), Some("a1")),
            ((10, 0), (11, 0), None),
            ((10, 30), (11, 30), Some("a1")),
        ] {
            let c = candidate(start, end, exclude);
            assert_eq!(check_conflict(&c, &booked), find_conflict(&c, &booked).is_some());
        }
    }
}
