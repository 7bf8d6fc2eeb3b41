//! services/api/src/web/tutors.rs
//!
//! The tutor browse endpoint: every tutor profile together with today's
//! active dated slots and the resolved "available now" state.

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::availability::DatedSlotView;
use crate::web::state::AppState;
use tutorlink_core::availability::{dated_slot_active_on, resolve_available_now};

//=========================================================================================
// Views and Payloads
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TutorsQuery {
    /// When set, only tutors whose resolved availability matches are returned.
    pub available_now: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TutorView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub hourly_rate: Option<i32>,
    /// The resolved state, not the raw manual toggle.
    pub available_now: bool,
    pub slots_today: Vec<DatedSlotView>,
}

#[derive(Serialize, ToSchema)]
pub struct TutorsResponse {
    pub tutors: Vec<TutorView>,
}

//=========================================================================================
// Handler
//=========================================================================================

/// GET /tutors - List tutors with today's slots and resolved availability.
#[utoipa::path(
    get,
    path = "/tutors",
    params(TutorsQuery),
    responses(
        (status = 200, description = "All tutors, optionally filtered by availability", body = TutorsResponse),
        (status = 500, description = "Store failure")
    )
)]
pub async fn list_tutors_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TutorsQuery>,
) -> Result<Json<TutorsResponse>, ApiError> {
    let today = Utc::now().date_naive();
    let profiles = state.store.list_tutors().await?;

    let mut tutors = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let slots = state.store.list_dated_slots(profile.id).await?;
        let available_now = resolve_available_now(profile.is_available_now, &slots, today);
        let slots_today = slots
            .iter()
            .filter(|s| dated_slot_active_on(s, today))
            .map(|s| DatedSlotView::from(s))
            .collect();
        tutors.push(TutorView {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            hourly_rate: profile.hourly_rate,
            available_now,
            slots_today,
        });
    }

    if let Some(want) = query.available_now {
        tutors.retain(|t| t.available_now == want);
    }

    Ok(Json(TutorsResponse { tutors }))
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{app_state, MockStore};
    use chrono::Duration;

    #[tokio::test]
    async fn scheduled_tutors_override_their_manual_toggle() {
        let store = Arc::new(MockStore::new());
        // Toggle says available, but the only slot ended yesterday.
        let stale = store.add_tutor("stale@example.com", true);
        let past = Utc::now() - Duration::days(2);
        store.add_dated_slot(stale, past, past);
        // Toggle says offline, but a slot covers today.
        let live = store.add_tutor("live@example.com", false);
        let now = Utc::now();
        store.add_dated_slot(live, now - Duration::days(1), now + Duration::days(1));

        let state = app_state(store);
        let Json(body) = list_tutors_handler(
            State(state),
            Query(TutorsQuery {
                available_now: Some(true),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body.tutors.len(), 1);
        assert_eq!(body.tutors[0].id, live);
        assert!(body.tutors[0].available_now);
        assert_eq!(body.tutors[0].slots_today.len(), 1);
    }

    #[tokio::test]
    async fn manual_toggle_counts_for_tutors_without_slots() {
        let store = Arc::new(MockStore::new());
        store.add_tutor("on@example.com", true);
        store.add_tutor("off@example.com", false);

        let state = app_state(store);
        let Json(body) =
            list_tutors_handler(State(state), Query(TutorsQuery { available_now: None }))
                .await
                .unwrap();

        assert_eq!(body.tutors.len(), 2);
        let by_email = |email: &str| {
            body.tutors
                .iter()
                .find(|t| t.email == email)
                .unwrap()
                .available_now
        };
        assert!(by_email("on@example.com"));
        assert!(!by_email("off@example.com"));
    }
}
