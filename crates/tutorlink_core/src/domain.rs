//! crates/tutorlink_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Value Types
//=========================================================================================

/// A wall-clock time of day, exchanged on the wire as a 24-hour "HH:mm" string.
///
/// All of the repo's time-of-day handling funnels through this one type so that
/// parsing and formatting happen in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(pub NaiveTime);

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, "%H:%M")
            .map(Self)
            .map_err(|_| DomainError::InvalidTimeOfDay(s.to_string()))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// Errors produced while constructing or validating domain values.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("'{0}' is not a valid HH:mm time of day")]
    InvalidTimeOfDay(String),
    #[error("time window {0}-{1} ends before it starts")]
    BackwardsWindow(String, String),
    #[error("day of week {0} is out of range (expected 0-6, Sunday = 0)")]
    InvalidDayOfWeek(i64),
    #[error("'{0}' is not a recognized IANA timezone")]
    InvalidTimezone(String),
    #[error("'{0}' is not a valid session status")]
    InvalidSessionStatus(String),
    #[error("'{0}' is not a valid profile role")]
    InvalidRole(String),
}

//=========================================================================================
// Profiles and Subjects
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Tutor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "tutor" => Ok(Role::Tutor),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

/// An identity record for a student, tutor, or admin.
///
/// `is_available_now` is the manually-set toggle. The effective "available now"
/// state is derived in `availability::resolve_available_now`; the two are never
/// conflated in storage.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub hourly_rate: Option<i32>,
    pub is_available_now: bool,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub profile_setup: bool,
    pub created_at: DateTime<Utc>,
}

/// A catalog entry. Referenced, not owned, by profiles and availability slots.
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub grade: Option<String>,
    pub category: Option<String>,
}

/// A tutor-to-subject link with per-link pricing/duration overrides.
#[derive(Debug, Clone)]
pub struct ProfileSubject {
    pub profile_id: Uuid,
    pub subject_id: Uuid,
    pub price: Option<i32>,
    pub duration_minutes: Option<i32>,
}

//=========================================================================================
// Availability
//=========================================================================================

/// A weekly-repeating availability window: day-of-week plus a time-of-day range
/// interpreted in the slot's own timezone.
#[derive(Debug, Clone)]
pub struct RecurringSlot {
    pub id: Uuid,
    pub tutor_id: Uuid,
    /// Sunday = 0 .. Saturday = 6.
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    /// IANA timezone name, e.g. "America/New_York".
    pub timezone: String,
    pub is_active: bool,
}

/// An availability window bound to a specific calendar date range.
///
/// Soft delete is modeled by nulling the four date/time fields rather than
/// removing the row; a slot with any of them missing is never active.
#[derive(Debug, Clone)]
pub struct DatedSlot {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
    pub is_active: bool,
}

impl DatedSlot {
    /// True once the slot has been soft-deleted (date/time fields cleared).
    pub fn is_cleared(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }
}

/// A per-date override that punches a hole in (or adds to) recurring
/// availability for one calendar day. Persisted for the calendar UI; the
/// activity resolver does not consult these records.
#[derive(Debug, Clone)]
pub struct AvailabilityException {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
    pub is_active: bool,
    pub timezone: String,
}

//=========================================================================================
// Sessions
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Pending,
    Accepted,
    Declined,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Accepted => "accepted",
            SessionStatus::Declined => "declined",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    /// Whether a session may move from `self` to `next`.
    ///
    /// pending -> accepted | declined | cancelled
    /// accepted -> in_progress | cancelled
    /// in_progress -> completed
    /// declined, completed and cancelled are terminal.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Declined)
                | (Pending, Cancelled)
                | (Accepted, InProgress)
                | (Accepted, Cancelled)
                | (InProgress, Completed)
        )
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "accepted" => Ok(SessionStatus::Accepted),
            "declined" => Ok(SessionStatus::Declined),
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            other => Err(DomainError::InvalidSessionStatus(other.to_string())),
        }
    }
}

/// A booking between a tutor and a student.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub topic: Option<String>,
    pub notes: Option<String>,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Only the two parties to a booking may mutate it.
    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.tutor_id == user_id || self.student_id == user_id
    }
}

//=========================================================================================
// Tests
//=========================================================================================
