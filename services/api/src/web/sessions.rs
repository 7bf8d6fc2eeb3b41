//! services/api/src/web/sessions.rs
//!
//! Handlers for session bookings: creation and the status lifecycle.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;
use tutorlink_core::domain::{Session, SessionStatus};
use tutorlink_core::ports::{PortError, PortResult, StoreService};

//=========================================================================================
// Views and Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub tutor_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub topic: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SessionsQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionStatusRequest {
    pub status: String,
    /// The caller; must be the tutor or student party to the session.
    pub user_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub topic: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            tutor_id: session.tutor_id,
            student_id: session.student_id,
            topic: session.topic.clone(),
            notes: session.notes.clone(),
            status: session.status.as_str().to_string(),
            started_at: session.started_at,
            ended_at: session.ended_at,
            created_at: session.created_at,
        }
    }
}

//=========================================================================================
// Status Change Logic
//=========================================================================================

/// Applies a status change to a session on behalf of `user_id`.
///
/// Unknown status values are rejected before anything is read or written;
/// only the tutor or student party may mutate the booking. Moving to
/// `in_progress` stamps `started_at` with `now`, moving to `completed`
/// stamps `ended_at`.
pub async fn apply_status_change(
    store: &dyn StoreService,
    session_id: Uuid,
    raw_status: &str,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> PortResult<Session> {
    let status = raw_status
        .parse::<SessionStatus>()
        .map_err(|e| PortError::Validation(e.to_string()))?;

    let session = store.get_session_by_id(session_id).await?;
    if !session.is_party(user_id) {
        return Err(PortError::Unauthorized);
    }

    if !session.status.can_transition_to(status) {
        // Historical clients jump steps (e.g. pending straight to
        // in_progress); accepted for compatibility but worth surfacing.
        warn!(
            session = %session_id,
            from = session.status.as_str(),
            to = status.as_str(),
            "session status change outside the usual lifecycle"
        );
    }

    let started_at = (status == SessionStatus::InProgress).then_some(now);
    let ended_at = (status == SessionStatus::Completed).then_some(now);
    store
        .update_session_status(session_id, status, started_at, ended_at)
        .await
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /sessions - Book a session between a tutor and a student.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created with status 'pending'", body = SessionView),
        (status = 400, description = "Missing tutorId or studentId"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let (Some(tutor_id), Some(student_id)) = (req.tutor_id, req.student_id) else {
        return Err(PortError::Validation(
            "tutorId and studentId are required".to_string(),
        )
        .into());
    };

    let session = state
        .store
        .create_session(tutor_id, student_id, req.topic, req.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(SessionView::from(&session))))
}

/// GET /sessions - List the bookings a user is a party to.
#[utoipa::path(
    get,
    path = "/sessions",
    params(SessionsQuery),
    responses(
        (status = 200, description = "The user's sessions, newest first", body = [SessionView]),
        (status = 400, description = "Missing userId")
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionsQuery>,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    let user_id = query
        .user_id
        .ok_or_else(|| PortError::Validation("userId is required".to_string()))?;
    let sessions = state.store.list_sessions_for_user(user_id).await?;
    Ok(Json(sessions.iter().map(SessionView::from).collect()))
}

/// PATCH /sessions/{id} - Change a session's status.
#[utoipa::path(
    patch,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "The session to update")),
    request_body = UpdateSessionStatusRequest,
    responses(
        (status = 200, description = "The updated session", body = SessionView),
        (status = 400, description = "Unknown status value or missing userId"),
        (status = 403, description = "Caller is not a party to the session"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn update_session_status_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<UpdateSessionStatusRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let user_id = req
        .user_id
        .ok_or_else(|| PortError::Validation("userId is required".to_string()))?;
    let session =
        apply_status_change(&*state.store, session_id, &req.status, user_id, Utc::now()).await?;
    Ok(Json(SessionView::from(&session)))
}

//=========================================================================================
// Tests
//=========================================================================================
