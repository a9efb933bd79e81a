use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::collaborators::{ActorRole, Caller, NotifyTarget};
use crate::error::AppError;
use crate::models::rider::{ApprovalStatus, Rider, UserProfile};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/riders", post(onboard_rider))
        .route("/admin/riders/pending", get(list_pending_riders))
        .route("/admin/riders/:id/approval", patch(review_rider))
}

pub fn dev_session_router() -> Router<Arc<AppState>> {
    Router::new().route("/admin/sessions", post(issue_session))
}

#[derive(Deserialize)]
pub struct OnboardRiderRequest {
    pub full_name: String,
    pub phone: String,
    pub vehicle_type: String,
    pub avatar_asset_id: Option<Uuid>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
}

#[derive(Deserialize)]
pub struct IssueSessionRequest {
    pub actor_id: Uuid,
    pub role: ActorRole,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_in_secs: u64,
}

async fn onboard_rider(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OnboardRiderRequest>,
) -> Result<Json<Rider>, AppError> {
    if payload.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("full_name cannot be empty".to_string()));
    }
    if payload.phone.trim().is_empty() {
        return Err(AppError::BadRequest("phone cannot be empty".to_string()));
    }

    let mut rider = Rider::new(
        UserProfile {
            full_name: payload.full_name.trim().to_string(),
            phone: payload.phone.trim().to_string(),
            avatar_asset_id: payload.avatar_asset_id,
        },
        payload.vehicle_type,
    );
    if let Some(rating) = payload.rating {
        rider.rating = rating.clamp(0.0, 5.0);
    }

    let rider = state.riders.register(rider).await?;
    info!(rider_id = %rider.id, "rider onboarded");
    Ok(Json(rider))
}

async fn list_pending_riders(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Rider>>, AppError> {
    Ok(Json(
        state.riders.list_by_approval(ApprovalStatus::Pending).await?,
    ))
}

async fn review_rider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<Rider>, AppError> {
    let (status, message) = match payload.decision {
        ReviewDecision::Approve => (
            ApprovalStatus::Approved,
            "Your rider account has been approved. You can now go online and receive delivery requests.",
        ),
        ReviewDecision::Reject => (
            ApprovalStatus::Rejected,
            "Your rider account request has been rejected. Please contact support for further information.",
        ),
    };

    let rider = state.riders.set_approval(id, status).await?;
    info!(rider_id = %id, status = ?status, "rider reviewed");
    state
        .coordinator
        .notify_best_effort(
            NotifyTarget::Phone(rider.profile.phone.clone()),
            message.to_string(),
        )
        .await;

    Ok(Json(rider))
}

async fn issue_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IssueSessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let token = state
        .sessions
        .issue(
            Caller {
                actor_id: payload.actor_id,
                role: payload.role,
            },
            state.session_ttl,
        )
        .await;

    Ok(Json(SessionResponse {
        token,
        expires_in_secs: state.session_ttl.as_secs(),
    }))
}
