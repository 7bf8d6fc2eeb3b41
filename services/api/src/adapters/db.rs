//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `StoreService` port from the core crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.
//!
//! Queries are runtime-checked (`query_as` + `bind`) so the crate builds
//! without a live database at compile time.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use tutorlink_core::availability::WeeklySlot;
use tutorlink_core::domain::{
    AvailabilityException, DatedSlot, Profile, ProfileSubject, RecurringSlot, Role, Session,
    SessionStatus, Subject, TimeOfDay,
};
use tutorlink_core::ports::{
    DatedSlotPatch, NewException, PortError, PortResult, ProfilePatch, StoreService, SubjectLink,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StoreService` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn store_err(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProfileRecord {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    bio: Option<String>,
    avatar_url: Option<String>,
    hourly_rate: Option<i32>,
    is_available_now: bool,
    education: Option<String>,
    experience: Option<String>,
    profile_setup: bool,
    created_at: DateTime<Utc>,
}

impl ProfileRecord {
    fn to_domain(self) -> PortResult<Profile> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Profile {
            id: self.id,
            email: self.email,
            name: self.name,
            role,
            bio: self.bio,
            avatar_url: self.avatar_url,
            hourly_rate: self.hourly_rate,
            is_available_now: self.is_available_now,
            education: self.education,
            experience: self.experience,
            profile_setup: self.profile_setup,
            created_at: self.created_at,
        })
    }
}

const PROFILE_COLUMNS: &str = "id, email, name, role, bio, avatar_url, hourly_rate, \
     is_available_now, education, experience, profile_setup, created_at";

#[derive(FromRow)]
struct SubjectRecord {
    id: Uuid,
    name: String,
    code: String,
    grade: Option<String>,
    category: Option<String>,
}

impl SubjectRecord {
    fn to_domain(self) -> Subject {
        Subject {
            id: self.id,
            name: self.name,
            code: self.code,
            grade: self.grade,
            category: self.category,
        }
    }
}

#[derive(FromRow)]
struct ProfileSubjectRecord {
    profile_id: Uuid,
    subject_id: Uuid,
    price: Option<i32>,
    duration_minutes: Option<i32>,
}

impl ProfileSubjectRecord {
    fn to_domain(self) -> ProfileSubject {
        ProfileSubject {
            profile_id: self.profile_id,
            subject_id: self.subject_id,
            price: self.price,
            duration_minutes: self.duration_minutes,
        }
    }
}

#[derive(FromRow)]
struct RecurringSlotRecord {
    id: Uuid,
    tutor_id: Uuid,
    day_of_week: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
    timezone: String,
    is_active: bool,
}

impl RecurringSlotRecord {
    fn to_domain(self) -> RecurringSlot {
        RecurringSlot {
            id: self.id,
            tutor_id: self.tutor_id,
            day_of_week: self.day_of_week as u8,
            start_time: TimeOfDay(self.start_time),
            end_time: TimeOfDay(self.end_time),
            timezone: self.timezone,
            is_active: self.is_active,
        }
    }
}

#[derive(FromRow)]
struct DatedSlotRecord {
    id: Uuid,
    tutor_id: Uuid,
    subject_id: Option<Uuid>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    is_active: bool,
}

impl DatedSlotRecord {
    fn to_domain(self) -> DatedSlot {
        DatedSlot {
            id: self.id,
            tutor_id: self.tutor_id,
            subject_id: self.subject_id,
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time.map(TimeOfDay),
            end_time: self.end_time.map(TimeOfDay),
            is_active: self.is_active,
        }
    }
}

const DATED_SLOT_COLUMNS: &str =
    "id, tutor_id, subject_id, start_date, end_date, start_time, end_time, is_active";

#[derive(FromRow)]
struct ExceptionRecord {
    id: Uuid,
    tutor_id: Uuid,
    date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    is_active: bool,
    timezone: String,
}

impl ExceptionRecord {
    fn to_domain(self) -> AvailabilityException {
        AvailabilityException {
            id: self.id,
            tutor_id: self.tutor_id,
            date: self.date,
            start_time: self.start_time.map(TimeOfDay),
            end_time: self.end_time.map(TimeOfDay),
            is_active: self.is_active,
            timezone: self.timezone,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    tutor_id: Uuid,
    student_id: Uuid,
    topic: Option<String>,
    notes: Option<String>,
    status: String,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl SessionRecord {
    fn to_domain(self) -> PortResult<Session> {
        let status = self
            .status
            .parse::<SessionStatus>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Session {
            id: self.id,
            tutor_id: self.tutor_id,
            student_id: self.student_id,
            topic: self.topic,
            notes: self.notes,
            status,
            started_at: self.started_at,
            ended_at: self.ended_at,
            created_at: self.created_at,
        })
    }
}

const SESSION_COLUMNS: &str =
    "id, tutor_id, student_id, topic, notes, status, started_at, ended_at, created_at";

//=========================================================================================
// `StoreService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoreService for PgStore {
    async fn get_profile_by_id(&self, profile_id: Uuid) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", profile_id)))?;
        record.to_domain()
    }

    async fn get_profile_by_email(&self, email: &str) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| PortError::NotFound(format!("Profile for {} not found", email)))?;
        record.to_domain()
    }

    async fn update_profile(&self, profile_id: Uuid, patch: ProfilePatch) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "UPDATE profiles SET \
                 name = COALESCE($1, name), \
                 bio = COALESCE($2, bio), \
                 avatar_url = COALESCE($3, avatar_url), \
                 hourly_rate = COALESCE($4, hourly_rate), \
                 education = COALESCE($5, education), \
                 experience = COALESCE($6, experience), \
                 profile_setup = COALESCE($7, profile_setup) \
             WHERE id = $8 \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(patch.name)
        .bind(patch.bio)
        .bind(patch.avatar_url)
        .bind(patch.hourly_rate)
        .bind(patch.education)
        .bind(patch.experience)
        .bind(patch.profile_setup)
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", profile_id)))?;
        record.to_domain()
    }

    async fn set_available_now(&self, profile_id: Uuid, available: bool) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "UPDATE profiles SET is_available_now = $1 WHERE id = $2 RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(available)
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", profile_id)))?;
        record.to_domain()
    }

    async fn list_tutors(&self) -> PortResult<Vec<Profile>> {
        let records = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = 'tutor' ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn list_subjects(&self) -> PortResult<Vec<Subject>> {
        let records = sqlx::query_as::<_, SubjectRecord>(
            "SELECT id, name, code, grade, category FROM subjects ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_profile_subjects(&self, profile_id: Uuid) -> PortResult<Vec<ProfileSubject>> {
        let records = sqlx::query_as::<_, ProfileSubjectRecord>(
            "SELECT profile_id, subject_id, price, duration_minutes \
             FROM profile_subjects WHERE profile_id = $1",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn replace_profile_subjects(
        &self,
        profile_id: Uuid,
        links: Vec<SubjectLink>,
    ) -> PortResult<()> {
        // Delete-all-then-recreate inside one transaction so concurrent
        // readers never observe the intermediate empty set.
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        sqlx::query("DELETE FROM profile_subjects WHERE profile_id = $1")
            .bind(profile_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        for link in links {
            sqlx::query(
                "INSERT INTO profile_subjects (profile_id, subject_id, price, duration_minutes) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(profile_id)
            .bind(link.subject_id)
            .bind(link.price)
            .bind(link.duration_minutes)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }
        tx.commit().await.map_err(store_err)?;
        Ok(())
    }

    async fn list_recurring_slots(&self, tutor_id: Uuid) -> PortResult<Vec<RecurringSlot>> {
        let records = sqlx::query_as::<_, RecurringSlotRecord>(
            "SELECT id, tutor_id, day_of_week, start_time, end_time, timezone, is_active \
             FROM recurring_slots WHERE tutor_id = $1 \
             ORDER BY day_of_week ASC, start_time ASC",
        )
        .bind(tutor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn replace_recurring_slots(
        &self,
        tutor_id: Uuid,
        timezone: &str,
        slots: Vec<WeeklySlot>,
    ) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        sqlx::query("DELETE FROM recurring_slots WHERE tutor_id = $1")
            .bind(tutor_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        for slot in slots {
            sqlx::query(
                "INSERT INTO recurring_slots \
                     (id, tutor_id, day_of_week, start_time, end_time, timezone, is_active) \
                 VALUES ($1, $2, $3, $4, $5, $6, TRUE)",
            )
            .bind(Uuid::new_v4())
            .bind(tutor_id)
            .bind(i16::from(slot.day_of_week))
            .bind(slot.start.as_naive())
            .bind(slot.end.as_naive())
            .bind(timezone)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }
        tx.commit().await.map_err(store_err)?;
        Ok(())
    }

    async fn list_dated_slots(&self, tutor_id: Uuid) -> PortResult<Vec<DatedSlot>> {
        let records = sqlx::query_as::<_, DatedSlotRecord>(&format!(
            "SELECT {DATED_SLOT_COLUMNS} FROM dated_slots WHERE tutor_id = $1 \
             ORDER BY start_date ASC NULLS LAST"
        ))
        .bind(tutor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_dated_slot(
        &self,
        slot_id: Uuid,
        patch: DatedSlotPatch,
    ) -> PortResult<DatedSlot> {
        // The instant columns get the recombined date+time values; the
        // time-only columns keep the pure times for comparisons.
        let record = sqlx::query_as::<_, DatedSlotRecord>(&format!(
            "UPDATE dated_slots SET \
                 start_date = $1, end_date = $2, start_time = $3, end_time = $4 \
             WHERE id = $5 \
             RETURNING {DATED_SLOT_COLUMNS}"
        ))
        .bind(patch.start_instant())
        .bind(patch.end_instant())
        .bind(patch.start_time.as_naive())
        .bind(patch.end_time.as_naive())
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| PortError::NotFound(format!("Availability slot {} not found", slot_id)))?;
        Ok(record.to_domain())
    }

    async fn soft_delete_dated_slot(&self, slot_id: Uuid) -> PortResult<()> {
        // The row is kept for history; only the date/time fields are cleared.
        let cleared = sqlx::query(
            "UPDATE dated_slots SET \
                 start_date = NULL, end_date = NULL, start_time = NULL, end_time = NULL \
             WHERE id = $1",
        )
        .bind(slot_id)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        if cleared.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Availability slot {} not found",
                slot_id
            )));
        }
        Ok(())
    }

    async fn create_exception(
        &self,
        exception: NewException,
    ) -> PortResult<AvailabilityException> {
        let record = sqlx::query_as::<_, ExceptionRecord>(
            "INSERT INTO availability_exceptions \
                 (id, tutor_id, date, start_time, end_time, is_active, timezone) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, tutor_id, date, start_time, end_time, is_active, timezone",
        )
        .bind(Uuid::new_v4())
        .bind(exception.tutor_id)
        .bind(exception.date)
        .bind(exception.start_time.map(|t| t.as_naive()))
        .bind(exception.end_time.map(|t| t.as_naive()))
        .bind(exception.is_active)
        .bind(exception.timezone)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(record.to_domain())
    }

    async fn create_session(
        &self,
        tutor_id: Uuid,
        student_id: Uuid,
        topic: Option<String>,
        notes: Option<String>,
    ) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "INSERT INTO sessions (id, tutor_id, student_id, topic, notes, status) \
             VALUES ($1, $2, $3, $4, $5, 'pending') \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(tutor_id)
        .bind(student_id)
        .bind(topic)
        .bind(notes)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        record.to_domain()
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;
        record.to_domain()
    }

    async fn update_session_status(
        &self,
        session_id: Uuid,
        status: SessionStatus,
        started_at: Option<DateTime<Utc>>,
        ended_at: Option<DateTime<Utc>>,
    ) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "UPDATE sessions SET \
                 status = $1, \
                 started_at = COALESCE($2, started_at), \
                 ended_at = COALESCE($3, ended_at) \
             WHERE id = $4 \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(started_at)
        .bind(ended_at)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;
        record.to_domain()
    }

    async fn list_sessions_for_user(&self, user_id: Uuid) -> PortResult<Vec<Session>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE tutor_id = $1 OR student_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }
}
