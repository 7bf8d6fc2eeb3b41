//! crates/tutorlink_core/src/availability.rs
//!
//! The availability rules: slot activity resolution, the schedule-override
//! guard, and validation for the weekly-slot writer. Everything here is a pure
//! function over domain values; persistence happens behind the store port.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::domain::{DatedSlot, DomainError, RecurringSlot, TimeOfDay};

//=========================================================================================
// Slot Activity Resolver
//=========================================================================================

/// Whether a dated slot's date range intersects the given calendar day.
///
/// The comparison is on calendar days only (time-of-day is ignored), with both
/// bounds inclusive: a slot running 2024-03-01 .. 2024-03-05 is active on the
/// 1st and on the 5th. Soft-deleted slots (cleared date fields) and slots
/// flagged inactive are never active.
pub fn dated_slot_active_on(slot: &DatedSlot, today: NaiveDate) -> bool {
    if !slot.is_active {
        return false;
    }
    match (slot.start_date, slot.end_date) {
        (Some(start), Some(end)) => {
            start.date_naive() <= today && end.date_naive() >= today
        }
        _ => false,
    }
}

/// Resolves a tutor's effective "available now" state.
///
/// The manual toggle and the schedule-derived state are kept as separate
/// inputs and combined in exactly one place: when the tutor has at least one
/// scheduled (non-cleared) dated slot, the derived value wins; the manual
/// toggle only governs tutors with zero scheduled slots.
pub fn resolve_available_now(manual_flag: bool, slots: &[DatedSlot], today: NaiveDate) -> bool {
    let has_schedule = slots
        .iter()
        .any(|s| s.start_date.is_some() && s.end_date.is_some());
    if has_schedule {
        slots.iter().any(|s| dated_slot_active_on(s, today))
    } else {
        manual_flag
    }
}

/// Whether a recurring weekly slot covers the instant `now`.
///
/// `now` is converted into the slot's own timezone before comparing. The time
/// window is half-open, start inclusive and end exclusive, so that a
/// 09:00-10:00 slot and a 10:00-11:00 slot never both claim 10:00. A slot
/// whose stored timezone fails to parse is treated as not active.
pub fn recurring_slot_active_at(slot: &RecurringSlot, now: DateTime<Utc>) -> bool {
    if !slot.is_active {
        return false;
    }
    let Ok(tz) = slot.timezone.parse::<Tz>() else {
        return false;
    };
    let local = now.with_timezone(&tz);
    // Sunday = 0, matching how slots are stored.
    if local.weekday().num_days_from_sunday() != u32::from(slot.day_of_week) {
        return false;
    }
    let t = local.time();
    slot.start_time.as_naive() <= t && t < slot.end_time.as_naive()
}

//=========================================================================================
// Override Guard
//=========================================================================================

/// Returns the first active recurring slot covering `now`, if any.
///
/// Used to gate the manual "go offline" transition: while a published
/// recurring slot is live, the flag may not be flipped off and the tutor is
/// told to adjust the calendar instead. Turning the flag on is never gated.
pub fn active_schedule_conflict<'a>(
    slots: &'a [RecurringSlot],
    now: DateTime<Utc>,
) -> Option<&'a RecurringSlot> {
    slots.iter().find(|s| recurring_slot_active_at(s, now))
}

//=========================================================================================
// Availability Writer Validation
//=========================================================================================

/// A weekly slot as submitted by a client, prior to validation.
#[derive(Debug, Clone)]
pub struct WeeklySlotInput {
    pub day_of_week: i64,
    pub start: String,
    pub end: String,
}

/// A weekly slot that passed validation and is ready to persist.
#[derive(Debug, Clone)]
pub struct WeeklySlot {
    pub day_of_week: u8,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// Validates a batch of weekly slots for the replace-all write.
///
/// Checks run in order over the whole batch, failing before anything is
/// persisted:
///   1. every `day_of_week` must lie in 0..=6 (Sunday = 0);
///   2. every start/end must parse as "HH:mm";
///   3. a window must not run backwards (start > end).
///
/// Zero-duration slots (start == end) are silently dropped rather than
/// rejected; they carry no bookable time.
pub fn validate_weekly_slots(inputs: &[WeeklySlotInput]) -> Result<Vec<WeeklySlot>, DomainError> {
    for input in inputs {
        if !(0..=6).contains(&input.day_of_week) {
            return Err(DomainError::InvalidDayOfWeek(input.day_of_week));
        }
    }

    let mut parsed = Vec::with_capacity(inputs.len());
    for input in inputs {
        let start: TimeOfDay = input.start.parse()?;
        let end: TimeOfDay = input.end.parse()?;
        if start > end {
            return Err(DomainError::BackwardsWindow(
                input.start.clone(),
                input.end.clone(),
            ));
        }
        parsed.push(WeeklySlot {
            day_of_week: input.day_of_week as u8,
            start,
            end,
        });
    }

    Ok(parsed.into_iter().filter(|s| s.start != s.end).collect())
}

/// Parses an IANA timezone name, rejecting anything chrono-tz does not know.
pub fn validate_timezone(name: &str) -> Result<Tz, DomainError> {
    name.parse::<Tz>()
        .map_err(|_| DomainError::InvalidTimezone(name.to_string()))
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn dated(start: Option<&str>, end: Option<&str>) -> DatedSlot {
        let parse = |s: &str| {
            s.parse::<NaiveDate>()
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
                .and_utc()
        };
        DatedSlot {
            id: Uuid::new_v4(),
            tutor_id: Uuid::new_v4(),
            subject_id: None,
            start_date: start.map(parse),
            end_date: end.map(parse),
            start_time: Some("09:00".parse().unwrap()),
            end_time: Some("17:00".parse().unwrap()),
            is_active: true,
        }
    }

    fn recurring(day: u8, start: &str, end: &str, tz: &str) -> RecurringSlot {
        RecurringSlot {
            id: Uuid::new_v4(),
            tutor_id: Uuid::new_v4(),
            day_of_week: day,
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            timezone: tz.to_string(),
            is_active: true,
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    //--- dated slot activity ---------------------------------------------------------

    #[test]
    fn dated_slot_active_across_its_inclusive_range() {
        let slot = dated(Some("2024-03-01"), Some("2024-03-05"));
        assert!(!dated_slot_active_on(&slot, day("2024-02-29")));
        assert!(dated_slot_active_on(&slot, day("2024-03-01")));
        assert!(dated_slot_active_on(&slot, day("2024-03-03")));
        assert!(dated_slot_active_on(&slot, day("2024-03-05")));
        assert!(!dated_slot_active_on(&slot, day("2024-03-06")));
    }

    #[test]
    fn single_day_slot_is_active_only_on_that_day() {
        let slot = dated(Some("2024-03-04"), Some("2024-03-04"));
        assert!(dated_slot_active_on(&slot, day("2024-03-04")));
        assert!(!dated_slot_active_on(&slot, day("2024-03-03")));
        assert!(!dated_slot_active_on(&slot, day("2024-03-05")));
    }

    #[test]
    fn soft_deleted_and_inactive_slots_are_never_active() {
        let cleared = dated(None, None);
        assert!(!dated_slot_active_on(&cleared, day("2024-03-04")));

        let mut inactive = dated(Some("2024-03-01"), Some("2024-03-05"));
        inactive.is_active = false;
        assert!(!dated_slot_active_on(&inactive, day("2024-03-03")));
    }

    //--- available-now resolution ----------------------------------------------------

    #[test]
    fn derived_state_wins_when_a_schedule_exists() {
        let today = day("2024-03-10");
        let past = vec![dated(Some("2024-03-01"), Some("2024-03-05"))];
        // Manual flag says available, but the only slot ended days ago.
        assert!(!resolve_available_now(true, &past, today));

        let current = vec![dated(Some("2024-03-08"), Some("2024-03-12"))];
        // Manual flag says offline, but a slot covers today.
        assert!(resolve_available_now(false, &current, today));
    }

    #[test]
    fn manual_flag_governs_tutors_without_scheduled_slots() {
        let today = day("2024-03-10");
        assert!(resolve_available_now(true, &[], today));
        assert!(!resolve_available_now(false, &[], today));

        // Cleared (soft-deleted) rows do not count as a schedule.
        let cleared = vec![dated(None, None)];
        assert!(resolve_available_now(true, &cleared, today));
    }

    //--- recurring slot activity -----------------------------------------------------

    // 2024-01-01 is a Monday.
    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn recurring_window_is_half_open() {
        let slot = recurring(1, "09:00", "10:00", "UTC");
        assert!(!recurring_slot_active_at(&slot, utc(8, 59)));
        assert!(recurring_slot_active_at(&slot, utc(9, 0)));
        assert!(recurring_slot_active_at(&slot, utc(9, 30)));
        assert!(recurring_slot_active_at(&slot, utc(9, 59)));
        // Exact end is exclusive.
        assert!(!recurring_slot_active_at(&slot, utc(10, 0)));
    }

    #[test]
    fn recurring_slot_only_matches_its_weekday() {
        // Sunday slot, checked on a Monday.
        let slot = recurring(0, "09:00", "10:00", "UTC");
        assert!(!recurring_slot_active_at(&slot, utc(9, 30)));
    }

    #[test]
    fn weekday_and_time_are_taken_in_the_slots_timezone() {
        // Monday 21:00-23:00 in New York. At 03:00 UTC Tuesday it is still
        // Monday 22:00 in New York, so the slot is live.
        let slot = recurring(1, "21:00", "23:00", "America/New_York");
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();
        assert!(recurring_slot_active_at(&slot, now));

        // The same instant read as UTC (Tuesday) does not match.
        let utc_slot = recurring(1, "21:00", "23:00", "UTC");
        assert!(!recurring_slot_active_at(&utc_slot, now));
    }

    #[test]
    fn inactive_or_unparseable_timezone_slots_never_match() {
        let mut slot = recurring(1, "09:00", "10:00", "UTC");
        slot.is_active = false;
        assert!(!recurring_slot_active_at(&slot, utc(9, 30)));

        let bad_tz = recurring(1, "09:00", "10:00", "Mars/Olympus_Mons");
        assert!(!recurring_slot_active_at(&bad_tz, utc(9, 30)));
    }

    //--- override guard --------------------------------------------------------------

    #[test]
    fn guard_blocks_during_a_live_slot_and_releases_at_its_end() {
        let slots = vec![recurring(1, "09:00", "10:00", "UTC")];
        assert!(active_schedule_conflict(&slots, utc(9, 30)).is_some());
        // At exactly 10:00 the window has closed; going offline is allowed.
        assert!(active_schedule_conflict(&slots, utc(10, 0)).is_none());
        assert!(active_schedule_conflict(&[], utc(9, 30)).is_none());
    }

    //--- writer validation -----------------------------------------------------------

    fn input(day: i64, start: &str, end: &str) -> WeeklySlotInput {
        WeeklySlotInput {
            day_of_week: day,
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    #[test]
    fn valid_slots_pass_through() {
        let out = validate_weekly_slots(&[input(1, "09:00", "12:00"), input(5, "14:30", "16:00")])
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].day_of_week, 1);
        assert_eq!(out[0].start.to_string(), "09:00");
        assert_eq!(out[1].end.to_string(), "16:00");
    }

    #[test]
    fn day_of_week_out_of_range_is_rejected() {
        let err = validate_weekly_slots(&[input(7, "09:00", "10:00")]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidDayOfWeek(7)));
        assert!(validate_weekly_slots(&[input(-1, "09:00", "10:00")]).is_err());
    }

    #[test]
    fn malformed_times_are_rejected() {
        assert!(validate_weekly_slots(&[input(1, "9am", "10:00")]).is_err());
        assert!(validate_weekly_slots(&[input(1, "09:00", "24:30")]).is_err());
    }

    #[test]
    fn zero_duration_slots_are_dropped_not_rejected() {
        let out = validate_weekly_slots(&[
            input(1, "09:00", "09:00"),
            input(2, "10:00", "11:00"),
        ])
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].day_of_week, 2);
    }

    #[test]
    fn backwards_windows_are_rejected() {
        assert!(validate_weekly_slots(&[input(1, "12:00", "09:00")]).is_err());
    }

    #[test]
    fn timezone_names_are_validated() {
        assert!(validate_timezone("Europe/Berlin").is_ok());
        assert!(validate_timezone("UTC").is_ok());
        assert!(validate_timezone("Not/A_Zone").is_err());
    }
}
