use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::rest::auth::Authenticated;
use crate::collaborators::ActorRole;
use crate::error::AppError;
use crate::models::rider::Rider;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/riders/online", get(list_online_riders))
        .route("/riders/:id/location", patch(update_rider_location))
        .route("/rider/online", post(toggle_online))
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Serialize)]
pub struct OnlineResponse {
    pub online: bool,
}

async fn list_online_riders(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Rider>>, AppError> {
    Ok(Json(state.riders.list_online().await?))
}

async fn update_rider_location(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Rider>, AppError> {
    let rider_id = caller.require(ActorRole::Rider)?;
    if rider_id != id {
        return Err(AppError::Forbidden(format!(
            "rider {rider_id} cannot move rider {id}"
        )));
    }

    let rider = state
        .coordinator
        .update_rider_location(id, payload.lat, payload.lng)
        .await?;
    Ok(Json(rider))
}

async fn toggle_online(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
) -> Result<Json<OnlineResponse>, AppError> {
    let rider_id = caller.require(ActorRole::Rider)?;
    let online = state.coordinator.set_rider_online(rider_id).await?;
    Ok(Json(OnlineResponse { online }))
}
