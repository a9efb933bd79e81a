use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::collaborators::{Collaborators, NotifyTarget};
use crate::config::DispatchPolicy;
use crate::engine::matcher;
use crate::engine::pricing::{self, Leg};
use crate::error::AppError;
use crate::models::dispatch::{Decision, DecisionOutcome, DispatchRequest, DispatchStatus};
use crate::models::event::{DispatchEvent, DispatchEventKind};
use crate::models::rider::{GeoPoint, Rider};
use crate::observability::metrics::Metrics;
use crate::store::{DispatchRequestStore, Inserted, RiderRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchOutcome {
    Offered,
    Exhausted,
    Existing,
}

impl DispatchOutcome {
    fn as_str(self) -> &'static str {
        match self {
            DispatchOutcome::Offered => "pending",
            DispatchOutcome::Exhausted => "failed",
            DispatchOutcome::Existing => "existing",
        }
    }
}

pub struct DispatchCoordinator {
    riders: Arc<dyn RiderRegistry>,
    requests: Arc<dyn DispatchRequestStore>,
    collaborators: Collaborators,
    events_tx: broadcast::Sender<DispatchEvent>,
    metrics: Metrics,
    policy: DispatchPolicy,
}

impl DispatchCoordinator {
    pub fn new(
        riders: Arc<dyn RiderRegistry>,
        requests: Arc<dyn DispatchRequestStore>,
        collaborators: Collaborators,
        events_tx: broadcast::Sender<DispatchEvent>,
        metrics: Metrics,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            riders,
            requests,
            collaborators,
            events_tx,
            metrics,
            policy,
        }
    }

    pub async fn dispatch(&self, order_id: Uuid, seller_id: Uuid) -> Result<DispatchRequest, AppError> {
        let start = Instant::now();
        let result =
            retry_on_conflict("dispatch", move || self.try_dispatch(order_id, seller_id)).await;

        let outcome = match &result {
            Ok((_, outcome)) => outcome.as_str(),
            Err(_) => "error",
        };
        self.metrics
            .dispatch_attempts_total
            .with_label_values(&[outcome])
            .inc();
        self.metrics
            .dispatch_latency_seconds
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        result.map(|(request, _)| request)
    }

    async fn try_dispatch(
        &self,
        order_id: Uuid,
        seller_id: Uuid,
    ) -> Result<(DispatchRequest, DispatchOutcome), AppError> {
        if let Some(active) = self.requests.find_active(order_id).await? {
            debug!(order_id = %order_id, request_id = %active.id, "order already has an active attempt");
            return Ok((active, DispatchOutcome::Existing));
        }

        let history = self.requests.history(order_id).await?;
        if !self.policy.allow_redispatch_after_failure {
            if let Some(failed) = history
                .last()
                .filter(|last| last.status == DispatchStatus::Failed)
            {
                debug!(order_id = %order_id, "dispatch chain already exhausted");
                return Ok((failed.clone(), DispatchOutcome::Existing));
            }
        }

        let order = self.collaborators.ledger.get_order(order_id).await?;
        let seller = self.collaborators.directory.seller(seller_id).await?;
        let pickup_address = seller.shop_address.one_line();
        let dropoff_address = order.shipping_address.one_line();
        let origin = self.collaborators.geocoder.geocode(&pickup_address).await?;
        let destination = self.collaborators.geocoder.geocode(&dropoff_address).await?;

        let exclude: HashSet<Uuid> = history.iter().filter_map(|request| request.rider_id).collect();
        let candidates = self.riders.list_available().await?;
        let chosen = matcher::rank(&origin, &candidates, &exclude)
            .into_iter()
            .next();

        let quote = pricing::quote(
            &self.policy,
            Leg {
                address: &pickup_address,
                point: origin,
            },
            Leg {
                address: &dropoff_address,
                point: destination,
            },
            chosen.as_ref().and_then(|candidate| candidate.rider.location.as_ref()),
        );
        let attempt_sequence = history.len() as u32 + 1;
        let request = DispatchRequest::new(
            order_id,
            seller_id,
            chosen.as_ref().map(|candidate| candidate.rider.id),
            attempt_sequence,
            quote,
        );

        let request = match self.requests.insert(request).await? {
            Inserted::Created(request) => request,
            Inserted::AlreadyActive(existing) => {
                info!(
                    order_id = %order_id,
                    request_id = %existing.id,
                    "concurrent dispatch won; returning its attempt"
                );
                return Ok((existing, DispatchOutcome::Existing));
            }
        };

        match chosen {
            Some(candidate) => {
                info!(
                    order_id = %order_id,
                    request_id = %request.id,
                    rider_id = %candidate.rider.id,
                    attempt = attempt_sequence,
                    distance_km = candidate.distance_km,
                    "dispatch offered to rider"
                );
                self.publish(DispatchEventKind::Submitted, &request);
                self.notify_best_effort(
                    NotifyTarget::Phone(candidate.rider.profile.phone.clone()),
                    offer_message(&request),
                )
                .await;
                Ok((request, DispatchOutcome::Offered))
            }
            None => {
                warn!(
                    order_id = %order_id,
                    request_id = %request.id,
                    attempt = attempt_sequence,
                    excluded = exclude.len(),
                    "no candidate riders left; dispatch failed"
                );
                self.publish(DispatchEventKind::Exhausted, &request);
                Ok((request, DispatchOutcome::Exhausted))
            }
        }
    }

    pub async fn decide(&self, request_id: Uuid, decision: Decision) -> Result<DecisionOutcome, AppError> {
        let decided =
            retry_on_conflict("decide", move || self.apply_decision(request_id, decision)).await?;

        self.metrics
            .decisions_total
            .with_label_values(&[decision.as_str()])
            .inc();
        self.publish(DispatchEventKind::Processed, &decided);
        info!(
            order_id = %decided.order_id,
            request_id = %decided.id,
            decision = decision.as_str(),
            "dispatch decision applied"
        );

        match decision {
            Decision::Accept => {
                self.notify_seller_of_acceptance(&decided).await;
                Ok(DecisionOutcome {
                    decided,
                    next: None,
                })
            }
            Decision::Dismiss => {
                let next = match self.dispatch(decided.order_id, decided.seller_id).await {
                    Ok(next) => Some(next),
                    Err(err) => {
                        error!(
                            order_id = %decided.order_id,
                            error = %err,
                            "re-dispatch after dismissal failed"
                        );
                        None
                    }
                };
                Ok(DecisionOutcome { decided, next })
            }
        }
    }

    async fn apply_decision(&self, request_id: Uuid, decision: Decision) -> Result<DispatchRequest, AppError> {
        let request = self.requests.get(request_id).await?;
        if request.status != DispatchStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "dispatch request {request_id} is already {:?}",
                request.status
            )));
        }

        let next = match decision {
            Decision::Accept => DispatchStatus::Accepted,
            Decision::Dismiss => DispatchStatus::Dismissed,
        };
        self.requests
            .update_status(request_id, DispatchStatus::Pending, next)
            .await
    }

    pub async fn submit_delivery_proof(
        &self,
        request_id: Uuid,
        rider_id: Uuid,
        bytes: Vec<u8>,
        tags: Vec<String>,
    ) -> Result<DispatchRequest, AppError> {
        let request = self.requests.get(request_id).await?;
        if request.rider_id != Some(rider_id) {
            return Err(AppError::Forbidden(format!(
                "dispatch request {request_id} is not assigned to rider {rider_id}"
            )));
        }
        if request.status != DispatchStatus::Accepted {
            return Err(AppError::InvalidState(format!(
                "proof of delivery needs an accepted request, {request_id} is {:?}",
                request.status
            )));
        }
        if bytes.is_empty() {
            return Err(AppError::BadRequest("proof of delivery is empty".to_string()));
        }

        let asset_id = self.collaborators.assets.create_asset(bytes, tags).await?;
        let updated = self.requests.attach_proof(request_id, asset_id).await?;
        info!(request_id = %request_id, asset_id = %asset_id, "proof of delivery stored");
        Ok(updated)
    }

    pub async fn update_rider_location(&self, rider_id: Uuid, lat: f64, lng: f64) -> Result<Rider, AppError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::BadRequest(format!(
                "coordinates out of range: {lat}, {lng}"
            )));
        }
        self.riders.update_location(rider_id, GeoPoint { lat, lng }).await
    }

    pub async fn set_rider_online(&self, rider_id: Uuid) -> Result<bool, AppError> {
        let online = self.riders.toggle_online(rider_id).await?;
        info!(rider_id = %rider_id, online, "rider availability changed");
        Ok(online)
    }

    pub async fn get(&self, request_id: Uuid) -> Result<DispatchRequest, AppError> {
        self.requests.get(request_id).await
    }

    pub async fn history(&self, order_id: Uuid) -> Result<Vec<DispatchRequest>, AppError> {
        self.requests.history(order_id).await
    }

    pub async fn notify_best_effort(&self, target: NotifyTarget, message: String) {
        let sent = tokio::time::timeout(
            self.policy.notify_timeout,
            self.collaborators.notifier.notify(&target, &message),
        )
        .await;

        match sent {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                self.metrics.notification_failures_total.inc();
                warn!(recipient = ?target, error = %err, "notification failed");
            }
            Err(_) => {
                self.metrics.notification_failures_total.inc();
                warn!(recipient = ?target, "notification timed out");
            }
        }
    }

    async fn notify_seller_of_acceptance(&self, request: &DispatchRequest) {
        match self.collaborators.directory.seller(request.seller_id).await {
            Ok(seller) => {
                self.notify_best_effort(
                    NotifyTarget::Phone(seller.profile.phone),
                    format!(
                        "A rider accepted delivery of order {}. Pickup in about {} minutes.",
                        request.order_id, request.quote.estimated_minutes
                    ),
                )
                .await;
            }
            Err(err) => {
                warn!(seller_id = %request.seller_id, error = %err, "cannot notify seller");
            }
        }
    }

    fn publish(&self, kind: DispatchEventKind, request: &DispatchRequest) {
        let _ = self.events_tx.send(DispatchEvent::new(kind, request.clone()));
    }
}

fn offer_message(request: &DispatchRequest) -> String {
    format!(
        "New delivery request {}: pickup at {}, drop-off at {}, {:.1} km, pays {:.2}.",
        request.id,
        request.quote.pickup_address,
        request.quote.dropoff_address,
        request.quote.total_distance_km,
        request.quote.payment
    )
}

/// Runs `attempt` and, after a write conflict, once more with a fresh read.
async fn retry_on_conflict<T, F, Fut>(operation: &'static str, mut attempt: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match attempt().await {
        Err(err) if err.is_conflict() => {
            warn!(operation, error = %err, "write conflict; retrying once");
            attempt().await
        }
        other => other,
    }
}
