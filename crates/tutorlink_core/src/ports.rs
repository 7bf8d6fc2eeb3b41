//! crates/tutorlink_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete database behind it.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::availability::WeeklySlot;
use crate::domain::{
    AvailabilityException, DatedSlot, Profile, ProfileSubject, RecurringSlot, Session,
    SessionStatus, Subject, TimeOfDay,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations, mirroring the failure
/// taxonomy the HTTP layer maps onto status codes.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Malformed or missing input, detected before any mutation.
    #[error("Invalid input: {0}")]
    Validation(String),
    /// A referenced entity does not exist.
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The caller is not a party to the resource.
    #[error("Unauthorized")]
    Unauthorized,
    /// The requested change contradicts current schedule state.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// A backing-store failure; surfaced, never retried here.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Write-side Argument Structs
//=========================================================================================

/// A partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub hourly_rate: Option<i32>,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub profile_setup: Option<bool>,
}

/// A full reschedule of one dated slot: the new calendar dates are recombined
/// with the new times-of-day into the stored instants.
#[derive(Debug, Clone)]
pub struct DatedSlotPatch {
    pub start_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_date: NaiveDate,
    pub end_time: TimeOfDay,
}

impl DatedSlotPatch {
    /// The full start instant: calendar date recombined with time-of-day.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start_date.and_time(self.start_time.as_naive()).and_utc()
    }

    /// The full end instant: calendar date recombined with time-of-day.
    pub fn end_instant(&self) -> DateTime<Utc> {
        self.end_date.and_time(self.end_time.as_naive()).and_utc()
    }
}

/// A subject link to attach to a tutor profile during a replace-all save.
#[derive(Debug, Clone)]
pub struct SubjectLink {
    pub subject_id: Uuid,
    pub price: Option<i32>,
    pub duration_minutes: Option<i32>,
}

/// A new per-date availability exception.
#[derive(Debug, Clone)]
pub struct NewException {
    pub tutor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
    pub is_active: bool,
    pub timezone: String,
}

//=========================================================================================
// Store Port (Trait)
//=========================================================================================

#[async_trait]
pub trait StoreService: Send + Sync {
    // --- Profiles ---
    async fn get_profile_by_id(&self, profile_id: Uuid) -> PortResult<Profile>;

    async fn get_profile_by_email(&self, email: &str) -> PortResult<Profile>;

    async fn update_profile(&self, profile_id: Uuid, patch: ProfilePatch) -> PortResult<Profile>;

    /// Writes the manual "available now" toggle. The override guard runs
    /// before this is called; the store itself does not re-check.
    async fn set_available_now(&self, profile_id: Uuid, available: bool) -> PortResult<Profile>;

    async fn list_tutors(&self) -> PortResult<Vec<Profile>>;

    // --- Subjects ---
    async fn list_subjects(&self) -> PortResult<Vec<Subject>>;

    async fn list_profile_subjects(&self, profile_id: Uuid) -> PortResult<Vec<ProfileSubject>>;

    /// Delete-all-then-recreate of a profile's subject links, atomically.
    async fn replace_profile_subjects(
        &self,
        profile_id: Uuid,
        links: Vec<SubjectLink>,
    ) -> PortResult<()>;

    // --- Availability ---
    async fn list_recurring_slots(&self, tutor_id: Uuid) -> PortResult<Vec<RecurringSlot>>;

    /// Delete-all-then-recreate of a tutor's recurring slots, atomically.
    /// Readers never observe the intermediate empty set.
    async fn replace_recurring_slots(
        &self,
        tutor_id: Uuid,
        timezone: &str,
        slots: Vec<WeeklySlot>,
    ) -> PortResult<()>;

    async fn list_dated_slots(&self, tutor_id: Uuid) -> PortResult<Vec<DatedSlot>>;

    async fn update_dated_slot(
        &self,
        slot_id: Uuid,
        patch: DatedSlotPatch,
    ) -> PortResult<DatedSlot>;

    /// Clears the slot's date/time fields, keeping the row for history.
    async fn soft_delete_dated_slot(&self, slot_id: Uuid) -> PortResult<()>;

    async fn create_exception(&self, exception: NewException)
        -> PortResult<AvailabilityException>;

    // --- Sessions ---
    async fn create_session(
        &self,
        tutor_id: Uuid,
        student_id: Uuid,
        topic: Option<String>,
        notes: Option<String>,
    ) -> PortResult<Session>;

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session>;

    /// Persists a status change together with any lifecycle timestamps the
    /// transition stamped (started_at / ended_at).
    async fn update_session_status(
        &self,
        session_id: Uuid,
        status: SessionStatus,
        started_at: Option<DateTime<Utc>>,
        ended_at: Option<DateTime<Utc>>,
    ) -> PortResult<Session>;

    async fn list_sessions_for_user(&self, user_id: Uuid) -> PortResult<Vec<Session>>;
}
