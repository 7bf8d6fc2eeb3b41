//! services/api/src/web/profiles.rs
//!
//! Handlers for profiles and the subject catalog.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;
use crate::web::SuccessResponse;
use tutorlink_core::domain::{Profile, ProfileSubject, Subject};
use tutorlink_core::ports::{PortError, ProfilePatch, SubjectLink};

//=========================================================================================
// Views and Payloads
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub hourly_rate: Option<i32>,
    pub is_available_now: bool,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub profile_setup: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            name: profile.name.clone(),
            role: profile.role.as_str().to_string(),
            bio: profile.bio.clone(),
            avatar_url: profile.avatar_url.clone(),
            hourly_rate: profile.hourly_rate,
            is_available_now: profile.is_available_now,
            education: profile.education.clone(),
            experience: profile.experience.clone(),
            profile_setup: profile.profile_setup,
            created_at: profile.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectLinkView {
    pub subject_id: Uuid,
    pub price: Option<i32>,
    pub duration_minutes: Option<i32>,
}

impl From<&ProfileSubject> for SubjectLinkView {
    fn from(link: &ProfileSubject) -> Self {
        Self {
            subject_id: link.subject_id,
            price: link.price,
            duration_minutes: link.duration_minutes,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub profile: ProfileView,
    pub subjects: Vec<SubjectLinkView>,
}

#[derive(Serialize, ToSchema)]
pub struct SubjectView {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub grade: Option<String>,
    pub category: Option<String>,
}

impl From<&Subject> for SubjectView {
    fn from(subject: &Subject) -> Self {
        Self {
            id: subject.id,
            name: subject.name.clone(),
            code: subject.code.clone(),
            grade: subject.grade.clone(),
            category: subject.category.clone(),
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQuery {
    pub email: Option<String>,
    pub profile_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub hourly_rate: Option<i32>,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub profile_setup: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectLinkDto {
    pub subject_id: Uuid,
    pub price: Option<i32>,
    pub duration_minutes: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReplaceSubjectsRequest {
    pub subjects: Vec<SubjectLinkDto>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /profiles - Fetch a profile with its subject links.
#[utoipa::path(
    get,
    path = "/profiles",
    params(ProfileQuery),
    responses(
        (status = 200, description = "The profile and its subject links", body = ProfileResponse),
        (status = 400, description = "Neither email nor profileId supplied"),
        (status = 404, description = "Unknown profile")
    )
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = match (query.profile_id, query.email.as_deref()) {
        (Some(id), _) => state.store.get_profile_by_id(id).await?,
        (None, Some(email)) => state.store.get_profile_by_email(email).await?,
        (None, None) => {
            return Err(
                PortError::Validation("Either email or profileId is required".to_string()).into(),
            )
        }
    };
    let links = state.store.list_profile_subjects(profile.id).await?;
    Ok(Json(ProfileResponse {
        profile: ProfileView::from(&profile),
        subjects: links.iter().map(SubjectLinkView::from).collect(),
    }))
}

/// PATCH /profiles/{id} - Partially update a profile.
#[utoipa::path(
    patch,
    path = "/profiles/{id}",
    params(("id" = Uuid, Path, description = "The profile to update")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "The updated profile", body = ProfileView),
        (status = 404, description = "Unknown profile")
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileView>, ApiError> {
    let patch = ProfilePatch {
        name: req.name,
        bio: req.bio,
        avatar_url: req.avatar_url,
        hourly_rate: req.hourly_rate,
        education: req.education,
        experience: req.experience,
        profile_setup: req.profile_setup,
    };
    let profile = state.store.update_profile(profile_id, patch).await?;
    Ok(Json(ProfileView::from(&profile)))
}

/// PUT /profiles/{id}/subjects - Replace a tutor's subject links.
///
/// Delete-all-then-recreate, in one transaction.
#[utoipa::path(
    put,
    path = "/profiles/{id}/subjects",
    params(("id" = Uuid, Path, description = "The profile whose links to replace")),
    request_body = ReplaceSubjectsRequest,
    responses(
        (status = 200, description = "Links replaced", body = SuccessResponse),
        (status = 404, description = "Unknown profile")
    )
)]
pub async fn replace_subjects_handler(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
    Json(req): Json<ReplaceSubjectsRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    // Resolve first so an unknown profile is a 404, not a dangling write.
    let profile = state.store.get_profile_by_id(profile_id).await?;
    let links = req
        .subjects
        .into_iter()
        .map(|s| SubjectLink {
            subject_id: s.subject_id,
            price: s.price,
            duration_minutes: s.duration_minutes,
        })
        .collect();
    state.store.replace_profile_subjects(profile.id, links).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// GET /subjects - The subject catalog.
#[utoipa::path(
    get,
    path = "/subjects",
    responses(
        (status = 200, description = "All catalog subjects", body = [SubjectView])
    )
)]
pub async fn list_subjects_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SubjectView>>, ApiError> {
    let subjects = state.store.list_subjects().await?;
    Ok(Json(subjects.iter().map(SubjectView::from).collect()))
}
