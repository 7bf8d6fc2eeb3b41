//! services/api/src/web/test_support.rs
//!
//! An in-memory `StoreService` double for handler-level tests. Behaves like
//! the Postgres adapter for the operations the tests exercise, without a
//! database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::config::Config;
use crate::web::state::AppState;

use tutorlink_core::availability::WeeklySlot;
use tutorlink_core::domain::{
    AvailabilityException, DatedSlot, Profile, ProfileSubject, RecurringSlot, Role, Session,
    SessionStatus, Subject, TimeOfDay,
};
use tutorlink_core::ports::{
    DatedSlotPatch, NewException, PortError, PortResult, ProfilePatch, StoreService, SubjectLink,
};

#[derive(Default)]
struct Inner {
    profiles: Vec<Profile>,
    recurring: Vec<RecurringSlot>,
    dated: Vec<DatedSlot>,
    subjects: Vec<Subject>,
    links: Vec<ProfileSubject>,
    exceptions: Vec<AvailabilityException>,
    sessions: Vec<Session>,
}

pub struct MockStore {
    inner: Mutex<Inner>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn add_profile(&self, email: &str, role: Role, available: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().profiles.push(Profile {
            id,
            email: email.to_string(),
            name: email.split('@').next().unwrap_or("user").to_string(),
            role,
            bio: None,
            avatar_url: None,
            hourly_rate: None,
            is_available_now: available,
            education: None,
            experience: None,
            profile_setup: true,
            created_at: Utc::now(),
        });
        id
    }

    pub fn add_tutor(&self, email: &str, available: bool) -> Uuid {
        self.add_profile(email, Role::Tutor, available)
    }

    pub fn add_student(&self, email: &str) -> Uuid {
        self.add_profile(email, Role::Student, false)
    }

    pub fn add_recurring_slot(&self, tutor_id: Uuid, day: u8, start: &str, end: &str, tz: &str) {
        self.inner.lock().unwrap().recurring.push(RecurringSlot {
            id: Uuid::new_v4(),
            tutor_id,
            day_of_week: day,
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            timezone: tz.to_string(),
            is_active: true,
        });
    }

    pub fn add_dated_slot(&self, tutor_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().dated.push(DatedSlot {
            id,
            tutor_id,
            subject_id: None,
            start_date: Some(start),
            end_date: Some(end),
            start_time: Some(TimeOfDay(start.time())),
            end_time: Some(TimeOfDay(end.time())),
            is_active: true,
        });
        id
    }

    pub fn profile(&self, id: Uuid) -> Profile {
        self.inner
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .expect("profile not seeded")
    }

    pub fn session(&self, id: Uuid) -> Session {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .expect("session not seeded")
    }

    pub fn dated_slot(&self, id: Uuid) -> DatedSlot {
        self.inner
            .lock()
            .unwrap()
            .dated
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .expect("dated slot not seeded")
    }
}

/// Wraps a mock store in the shared handler state with a throwaway config.
/// Takes an `Arc` so the test keeps its own handle for assertions.
pub fn app_state(store: Arc<MockStore>) -> Arc<AppState> {
    Arc::new(AppState {
        store: store as Arc<dyn StoreService>,
        config: Arc::new(Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            database_url: String::new(),
            log_level: tracing::Level::INFO,
            frontend_origin: "http://localhost:3000".to_string(),
            db_max_connections: 1,
        }),
    })
}

#[async_trait]
impl StoreService for MockStore {
    async fn get_profile_by_id(&self, profile_id: Uuid) -> PortResult<Profile> {
        self.inner
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.id == profile_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", profile_id)))
    }

    async fn get_profile_by_email(&self, email: &str) -> PortResult<Profile> {
        self.inner
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Profile for {} not found", email)))
    }

    async fn update_profile(&self, profile_id: Uuid, patch: ProfilePatch) -> PortResult<Profile> {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner
            .profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
            .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", profile_id)))?;
        if let Some(name) = patch.name {
            profile.name = name;
        }
        if let Some(bio) = patch.bio {
            profile.bio = Some(bio);
        }
        if let Some(avatar_url) = patch.avatar_url {
            profile.avatar_url = Some(avatar_url);
        }
        if let Some(rate) = patch.hourly_rate {
            profile.hourly_rate = Some(rate);
        }
        if let Some(education) = patch.education {
            profile.education = Some(education);
        }
        if let Some(experience) = patch.experience {
            profile.experience = Some(experience);
        }
        if let Some(setup) = patch.profile_setup {
            profile.profile_setup = setup;
        }
        Ok(profile.clone())
    }

    async fn set_available_now(&self, profile_id: Uuid, available: bool) -> PortResult<Profile> {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner
            .profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
            .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", profile_id)))?;
        profile.is_available_now = available;
        Ok(profile.clone())
    }

    async fn list_tutors(&self) -> PortResult<Vec<Profile>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .profiles
            .iter()
            .filter(|p| p.role == Role::Tutor)
            .cloned()
            .collect())
    }

    async fn list_subjects(&self) -> PortResult<Vec<Subject>> {
        Ok(self.inner.lock().unwrap().subjects.clone())
    }

    async fn list_profile_subjects(&self, profile_id: Uuid) -> PortResult<Vec<ProfileSubject>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .links
            .iter()
            .filter(|l| l.profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn replace_profile_subjects(
        &self,
        profile_id: Uuid,
        links: Vec<SubjectLink>,
    ) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.links.retain(|l| l.profile_id != profile_id);
        inner.links.extend(links.into_iter().map(|l| ProfileSubject {
            profile_id,
            subject_id: l.subject_id,
            price: l.price,
            duration_minutes: l.duration_minutes,
        }));
        Ok(())
    }

    async fn list_recurring_slots(&self, tutor_id: Uuid) -> PortResult<Vec<RecurringSlot>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .recurring
            .iter()
            .filter(|s| s.tutor_id == tutor_id)
            .cloned()
            .collect())
    }

    async fn replace_recurring_slots(
        &self,
        tutor_id: Uuid,
        timezone: &str,
        slots: Vec<WeeklySlot>,
    ) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.recurring.retain(|s| s.tutor_id != tutor_id);
        inner
            .recurring
            .extend(slots.into_iter().map(|s| RecurringSlot {
                id: Uuid::new_v4(),
                tutor_id,
                day_of_week: s.day_of_week,
                start_time: s.start,
                end_time: s.end,
                timezone: timezone.to_string(),
                is_active: true,
            }));
        Ok(())
    }

    async fn list_dated_slots(&self, tutor_id: Uuid) -> PortResult<Vec<DatedSlot>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .dated
            .iter()
            .filter(|s| s.tutor_id == tutor_id)
            .cloned()
            .collect())
    }

    async fn update_dated_slot(
        &self,
        slot_id: Uuid,
        patch: DatedSlotPatch,
    ) -> PortResult<DatedSlot> {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .dated
            .iter_mut()
            .find(|s| s.id == slot_id)
            .ok_or_else(|| PortError::NotFound(format!("Availability slot {} not found", slot_id)))?;
        slot.start_date = Some(patch.start_instant());
        slot.end_date = Some(patch.end_instant());
        slot.start_time = Some(patch.start_time);
        slot.end_time = Some(patch.end_time);
        Ok(slot.clone())
    }

    async fn soft_delete_dated_slot(&self, slot_id: Uuid) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner
            .dated
            .iter_mut()
            .find(|s| s.id == slot_id)
            .ok_or_else(|| PortError::NotFound(format!("Availability slot {} not found", slot_id)))?;
        slot.start_date = None;
        slot.end_date = None;
        slot.start_time = None;
        slot.end_time = None;
        Ok(())
    }

    async fn create_exception(
        &self,
        exception: NewException,
    ) -> PortResult<AvailabilityException> {
        let record = AvailabilityException {
            id: Uuid::new_v4(),
            tutor_id: exception.tutor_id,
            date: exception.date,
            start_time: exception.start_time,
            end_time: exception.end_time,
            is_active: exception.is_active,
            timezone: exception.timezone,
        };
        self.inner.lock().unwrap().exceptions.push(record.clone());
        Ok(record)
    }

    async fn create_session(
        &self,
        tutor_id: Uuid,
        student_id: Uuid,
        topic: Option<String>,
        notes: Option<String>,
    ) -> PortResult<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            tutor_id,
            student_id,
            topic,
            notes,
            status: SessionStatus::Pending,
            started_at: None,
            ended_at: None,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    async fn update_session_status(
        &self,
        session_id: Uuid,
        status: SessionStatus,
        started_at: Option<DateTime<Utc>>,
        ended_at: Option<DateTime<Utc>>,
    ) -> PortResult<Session> {
        let mut inner = self.inner.lock().unwrap();
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;
        session.status = status;
        // Same COALESCE semantics as the Postgres adapter: a supplied stamp
        // always wins, an absent one leaves the column alone.
        if let Some(at) = started_at {
            session.started_at = Some(at);
        }
        if let Some(at) = ended_at {
            session.ended_at = Some(at);
        }
        Ok(session.clone())
    }

    async fn list_sessions_for_user(&self, user_id: Uuid) -> PortResult<Vec<Session>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .sessions
            .iter()
            .filter(|s| s.tutor_id == user_id || s.student_id == user_id)
            .cloned()
            .collect())
    }
}
