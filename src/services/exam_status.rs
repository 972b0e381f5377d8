use serde::Serialize;
use time::PrimitiveDateTime;

use crate::db::types::SessionStatus;

/// Time- and session-dependent exam status shown to a student. Derived on
/// every read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum DisplayStatus {
    Upcoming,
    Pending,
    InProgress,
    Completed,
    Expired,
}

/// Ordered derivation rule: a session outcome wins over the time window, an
/// elapsed window wins over an open one, and the fallback is `Pending`.
pub(crate) fn derive_display_status(
    now: PrimitiveDateTime,
    start_time: PrimitiveDateTime,
    end_time: Option<PrimitiveDateTime>,
    session_status: Option<SessionStatus>,
) -> DisplayStatus {
    match session_status {
        Some(SessionStatus::Completed) => return DisplayStatus::Completed,
        Some(SessionStatus::InProgress) => return DisplayStatus::InProgress,
        None => {}
    }

    if let Some(end_time) = end_time {
        if now > end_time {
            return DisplayStatus::Expired;
        }
    }

    if now >= start_time {
        return DisplayStatus::Pending;
    }

    if now < start_time {
        return DisplayStatus::Upcoming;
    }

    DisplayStatus::Pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month, Time};

    fn at(hour: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2026, Month::May, 10).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(hour, 0, 0).unwrap())
    }

    #[test]
    fn upcoming_before_window_opens() {
        let status = derive_display_status(at(8), at(10), Some(at(12)), None);
        assert_eq!(status, DisplayStatus::Upcoming);
    }

    #[test]
    fn pending_inside_window_without_session() {
        let status = derive_display_status(at(11), at(10), Some(at(12)), None);
        assert_eq!(status, DisplayStatus::Pending);
    }

    #[test]
    fn pending_after_start_without_end_time() {
        let status = derive_display_status(at(23), at(10), None, None);
        assert_eq!(status, DisplayStatus::Pending);
    }

    #[test]
    fn expired_after_window_without_completed_session() {
        let status = derive_display_status(at(13), at(10), Some(at(12)), None);
        assert_eq!(status, DisplayStatus::Expired);
    }

    #[test]
    fn in_progress_session_wins_over_window() {
        let status =
            derive_display_status(at(13), at(10), Some(at(12)), Some(SessionStatus::InProgress));
        assert_eq!(status, DisplayStatus::InProgress);
    }

    #[test]
    fn completed_session_wins_regardless_of_window() {
        for now in [at(8), at(11), at(13)] {
            let status =
                derive_display_status(now, at(10), Some(at(12)), Some(SessionStatus::Completed));
            assert_eq!(status, DisplayStatus::Completed);
        }
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        assert_eq!(derive_display_status(at(10), at(10), Some(at(12)), None), DisplayStatus::Pending);
        assert_eq!(derive_display_status(at(12), at(10), Some(at(12)), None), DisplayStatus::Pending);
    }

    #[test]
    fn serializes_kebab_case() {
        let json = serde_json::to_value(DisplayStatus::InProgress).unwrap();
        assert_eq!(json, serde_json::json!("in-progress"));
    }
}
