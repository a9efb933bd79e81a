use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::Authenticated;
use crate::collaborators::ActorRole;
use crate::error::AppError;
use crate::models::dispatch::{Decision, DecisionOutcome, DispatchRequest};
use crate::models::fulfillment::FulfillmentView;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/:id/dispatch", post(dispatch_order))
        .route("/orders/:id/dispatch-requests", get(list_dispatch_requests))
        .route("/orders/:id/fulfillment", get(get_fulfillment))
        .route("/dispatch-requests/:id", get(get_dispatch_request))
        .route("/dispatch-requests/:id/decision", post(decide))
        .route("/dispatch-requests/:id/proof", post(submit_proof))
}

#[derive(Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
}

#[derive(Deserialize)]
pub struct ProofParams {
    pub tags: Option<String>,
}

async fn dispatch_order(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
    Path(order_id): Path<Uuid>,
) -> Result<Json<DispatchRequest>, AppError> {
    let seller_id = caller.require(ActorRole::Seller)?;
    let request = state.coordinator.dispatch(order_id, seller_id).await?;
    Ok(Json(request))
}

async fn list_dispatch_requests(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<DispatchRequest>>, AppError> {
    let seller_id = caller.require(ActorRole::Seller)?;
    let history = state.coordinator.history(order_id).await?;
    if history.iter().any(|request| request.seller_id != seller_id) {
        return Err(AppError::Forbidden(format!(
            "seller {seller_id} did not dispatch order {order_id}"
        )));
    }

    Ok(Json(history))
}

async fn get_fulfillment(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<FulfillmentView>, AppError> {
    Ok(Json(state.fulfillment.view(order_id).await?))
}

async fn get_dispatch_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DispatchRequest>, AppError> {
    Ok(Json(state.coordinator.get(id).await?))
}

async fn decide(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<DecisionOutcome>, AppError> {
    let rider_id = caller.require(ActorRole::Rider)?;
    let request = state.coordinator.get(id).await?;
    if request.rider_id != Some(rider_id) {
        return Err(AppError::Forbidden(format!(
            "dispatch request {id} was not offered to rider {rider_id}"
        )));
    }

    let outcome = state.coordinator.decide(id, payload.decision).await?;
    Ok(Json(outcome))
}

async fn submit_proof(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
    Path(id): Path<Uuid>,
    Query(params): Query<ProofParams>,
    body: Bytes,
) -> Result<Json<DispatchRequest>, AppError> {
    let rider_id = caller.require(ActorRole::Rider)?;
    let tags = params
        .tags
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let request = state
        .coordinator
        .submit_delivery_proof(id, rider_id, body.to_vec(), tags)
        .await?;
    Ok(Json(request))
}
