//! services/api/src/web/availability.rs
//!
//! Handlers for tutor availability: recurring weekly slots, dated slots,
//! per-date exceptions, and the manual "available now" flag with its
//! schedule-override guard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::profiles::ProfileView;
use crate::web::state::AppState;
use crate::web::SuccessResponse;
use tutorlink_core::availability::{
    active_schedule_conflict, validate_timezone, validate_weekly_slots, WeeklySlotInput,
};
use tutorlink_core::domain::{AvailabilityException, DatedSlot, Profile, RecurringSlot, TimeOfDay};
use tutorlink_core::ports::{DatedSlotPatch, NewException, PortError, PortResult, StoreService};

//=========================================================================================
// Views and Payloads
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecurringSlotView {
    pub id: Uuid,
    pub day_of_week: u8,
    /// "HH:mm", interpreted in `timezone`.
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
    pub is_active: bool,
}

impl From<&RecurringSlot> for RecurringSlotView {
    fn from(slot: &RecurringSlot) -> Self {
        Self {
            id: slot.id,
            day_of_week: slot.day_of_week,
            start_time: slot.start_time.to_string(),
            end_time: slot.end_time.to_string(),
            timezone: slot.timezone.clone(),
            is_active: slot.is_active,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatedSlotView {
    pub id: Uuid,
    pub subject_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_active: bool,
}

impl From<&DatedSlot> for DatedSlotView {
    fn from(slot: &DatedSlot) -> Self {
        Self {
            id: slot.id,
            subject_id: slot.subject_id,
            start_date: slot.start_date,
            end_date: slot.end_date,
            start_time: slot.start_time.map(|t| t.to_string()),
            end_time: slot.end_time.map(|t| t.to_string()),
            is_active: slot.is_active,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub email: Option<String>,
    pub tutor_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySlotDto {
    pub day_of_week: i64,
    pub start: String,
    pub end: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveAvailabilityRequest {
    pub user_email: Option<String>,
    pub tutor_id: Option<Uuid>,
    pub timezone: String,
    pub slots: Vec<WeeklySlotDto>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSlotRequest {
    /// New start calendar date, "YYYY-MM-DD".
    pub date: NaiveDate,
    pub start_time: String,
    pub end_date: NaiveDate,
    pub end_time: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionRequest {
    pub tutor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub timezone: String,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionView {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_active: bool,
    pub timezone: String,
}

impl From<&AvailabilityException> for ExceptionView {
    fn from(ex: &AvailabilityException) -> Self {
        Self {
            id: ex.id,
            tutor_id: ex.tutor_id,
            date: ex.date,
            start_time: ex.start_time.map(|t| t.to_string()),
            end_time: ex.end_time.map(|t| t.to_string()),
            is_active: ex.is_active,
            timezone: ex.timezone.clone(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetFlagRequest {
    pub user_email: String,
    pub is_available_now: bool,
}

//=========================================================================================
// Shared Lookup
//=========================================================================================

/// Resolves a tutor profile from either an email or a profile id; exactly the
/// lookup the availability endpoints share.
async fn resolve_tutor(
    store: &dyn StoreService,
    email: Option<&str>,
    tutor_id: Option<Uuid>,
) -> PortResult<Profile> {
    match (tutor_id, email) {
        (Some(id), _) => store.get_profile_by_id(id).await,
        (None, Some(email)) => store.get_profile_by_email(email).await,
        (None, None) => Err(PortError::Validation(
            "Either email or tutorId is required".to_string(),
        )),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /availability - A tutor's recurring weekly slots.
#[utoipa::path(
    get,
    path = "/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "The tutor's recurring slots", body = [RecurringSlotView]),
        (status = 400, description = "Neither email nor tutorId supplied"),
        (status = 404, description = "Unknown tutor")
    )
)]
pub async fn get_availability_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<RecurringSlotView>>, ApiError> {
    let tutor = resolve_tutor(&*state.store, query.email.as_deref(), query.tutor_id).await?;
    let slots = state.store.list_recurring_slots(tutor.id).await?;
    Ok(Json(slots.iter().map(RecurringSlotView::from).collect()))
}

/// POST /availability - Replace a tutor's recurring weekly slots.
///
/// Validation happens before any write; the delete-and-insert then runs in a
/// single transaction so partial states are never observable.
#[utoipa::path(
    post,
    path = "/availability",
    request_body = SaveAvailabilityRequest,
    responses(
        (status = 200, description = "Slots replaced", body = SuccessResponse),
        (status = 400, description = "Invalid day, time format or timezone"),
        (status = 404, description = "Unknown tutor")
    )
)]
pub async fn save_availability_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveAvailabilityRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let tutor = resolve_tutor(&*state.store, req.user_email.as_deref(), req.tutor_id).await?;
    validate_timezone(&req.timezone)?;

    let inputs: Vec<WeeklySlotInput> = req
        .slots
        .iter()
        .map(|s| WeeklySlotInput {
            day_of_week: s.day_of_week,
            start: s.start.clone(),
            end: s.end.clone(),
        })
        .collect();
    let slots = validate_weekly_slots(&inputs)?;

    info!(tutor = %tutor.id, count = slots.len(), "replacing recurring slots");
    state
        .store
        .replace_recurring_slots(tutor.id, &req.timezone, slots)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

/// PATCH /availability/{event_id} - Reschedule a dated slot.
///
/// The recombined window must end after it starts; a backwards window is
/// rejected before the store is touched, like weekly-slot validation does.
#[utoipa::path(
    patch,
    path = "/availability/{event_id}",
    params(("event_id" = Uuid, Path, description = "The dated slot to reschedule")),
    request_body = UpdateSlotRequest,
    responses(
        (status = 200, description = "The updated slot", body = DatedSlotView),
        (status = 400, description = "Malformed date or time"),
        (status = 404, description = "Unknown slot")
    )
)]
pub async fn update_slot_handler(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<UpdateSlotRequest>,
) -> Result<Json<DatedSlotView>, ApiError> {
    let patch = DatedSlotPatch {
        start_date: req.date,
        start_time: req.start_time.parse::<TimeOfDay>()?,
        end_date: req.end_date,
        end_time: req.end_time.parse::<TimeOfDay>()?,
    };
    if patch.end_instant() <= patch.start_instant() {
        return Err(PortError::Validation(format!(
            "The slot must end after it starts ({} {} to {} {})",
            req.date, req.start_time, req.end_date, req.end_time
        ))
        .into());
    }
    let slot = state.store.update_dated_slot(event_id, patch).await?;
    Ok(Json(DatedSlotView::from(&slot)))
}

/// DELETE /availability/{event_id} - Soft-delete a dated slot.
///
/// Clears the slot's date/time fields but keeps the row for history.
#[utoipa::path(
    delete,
    path = "/availability/{event_id}",
    params(("event_id" = Uuid, Path, description = "The dated slot to clear")),
    responses(
        (status = 200, description = "Slot cleared", body = SuccessResponse),
        (status = 404, description = "Unknown slot")
    )
)]
pub async fn delete_slot_handler(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.store.soft_delete_dated_slot(event_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /availability/exceptions - Record a per-date availability exception.
///
/// Exceptions are persisted for the calendar UI; the activity resolver does
/// not consult them.
#[utoipa::path(
    post,
    path = "/availability/exceptions",
    request_body = ExceptionRequest,
    responses(
        (status = 201, description = "Exception recorded", body = ExceptionView),
        (status = 400, description = "Malformed time or timezone")
    )
)]
pub async fn create_exception_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExceptionRequest>,
) -> Result<(StatusCode, Json<ExceptionView>), ApiError> {
    validate_timezone(&req.timezone)?;
    let start_time = req
        .start_time
        .as_deref()
        .map(str::parse::<TimeOfDay>)
        .transpose()?;
    let end_time = req
        .end_time
        .as_deref()
        .map(str::parse::<TimeOfDay>)
        .transpose()?;

    let exception = state
        .store
        .create_exception(NewException {
            tutor_id: req.tutor_id,
            date: req.date,
            start_time,
            end_time,
            is_active: req.is_active,
            timezone: req.timezone,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ExceptionView::from(&exception))))
}

/// Applies a manual availability-flag change, enforcing the override guard.
///
/// Turning the flag off while a recurring slot covers `now` is refused with a
/// conflict; the flag is left untouched and the tutor is told to adjust the
/// calendar instead. Turning the flag on is never gated.
pub async fn apply_availability_flag(
    store: &dyn StoreService,
    user_email: &str,
    available: bool,
    now: DateTime<Utc>,
) -> PortResult<Profile> {
    let profile = store.get_profile_by_email(user_email).await?;

    if !available {
        let slots = store.list_recurring_slots(profile.id).await?;
        if let Some(slot) = active_schedule_conflict(&slots, now) {
            return Err(PortError::Conflict(format!(
                "You have scheduled availability right now ({} to {}). \
                 Adjust your calendar availability instead of going offline.",
                slot.start_time, slot.end_time
            )));
        }
    }

    store.set_available_now(profile.id, available).await
}

/// PATCH /availability-flag - Set the manual "available now" toggle.
#[utoipa::path(
    patch,
    path = "/availability-flag",
    request_body = SetFlagRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileView),
        (status = 404, description = "Unknown profile"),
        (status = 409, description = "A recurring slot is active right now (SCHEDULE_OVERRIDE)")
    )
)]
pub async fn set_availability_flag_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetFlagRequest>,
) -> Result<Json<ProfileView>, ApiError> {
    let profile = apply_availability_flag(
        &*state.store,
        &req.user_email,
        req.is_available_now,
        Utc::now(),
    )
    .await?;
    Ok(Json(ProfileView::from(&profile)))
}

//=========================================================================================
// Tests
//=========================================================================================
