//! services/api/src/web/mod.rs
//!
//! The HTTP boundary: route handlers grouped by resource, the shared state,
//! and the master OpenAPI definition.

pub mod availability;
pub mod profiles;
pub mod sessions;
pub mod state;
pub mod tutors;

#[cfg(test)]
pub(crate) mod test_support;

use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// The body returned by write endpoints that carry no resource-level detail.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        tutors::list_tutors_handler,
        availability::get_availability_handler,
        availability::save_availability_handler,
        availability::update_slot_handler,
        availability::delete_slot_handler,
        availability::create_exception_handler,
        availability::set_availability_flag_handler,
        profiles::get_profile_handler,
        profiles::update_profile_handler,
        profiles::replace_subjects_handler,
        profiles::list_subjects_handler,
        sessions::create_session_handler,
        sessions::list_sessions_handler,
        sessions::update_session_status_handler,
    ),
    components(schemas(
        SuccessResponse,
        tutors::TutorView,
        tutors::TutorsResponse,
        availability::RecurringSlotView,
        availability::DatedSlotView,
        availability::SaveAvailabilityRequest,
        availability::WeeklySlotDto,
        availability::UpdateSlotRequest,
        availability::ExceptionRequest,
        availability::ExceptionView,
        availability::SetFlagRequest,
        profiles::ProfileView,
        profiles::ProfileResponse,
        profiles::SubjectView,
        profiles::SubjectLinkView,
        profiles::UpdateProfileRequest,
        profiles::ReplaceSubjectsRequest,
        profiles::SubjectLinkDto,
        sessions::CreateSessionRequest,
        sessions::UpdateSessionStatusRequest,
        sessions::SessionView,
    )),
    tags(
        (name = "TutorLink API", description = "Tutoring marketplace: profiles, availability scheduling and session booking.")
    )
)]
pub struct ApiDoc;
