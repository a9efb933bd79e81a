use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::rider::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Pending,
    Accepted,
    Dismissed,
    Failed,
}

impl DispatchStatus {
    /// Pending and accepted attempts count towards the one-per-order limit.
    pub fn is_active(self) -> bool {
        matches!(self, DispatchStatus::Pending | DispatchStatus::Accepted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Dismiss,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Dismiss => "dismiss",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub pickup_address: String,
    pub pickup_point: GeoPoint,
    pub dropoff_address: String,
    pub dropoff_point: GeoPoint,
    pub pickup_distance_km: Option<f64>,
    pub dropoff_distance_km: f64,
    pub total_distance_km: f64,
    pub payment: f64,
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub id: Uuid,
    pub order_id: Uuid,
    pub seller_id: Uuid,
    pub rider_id: Option<Uuid>,
    pub status: DispatchStatus,
    pub attempt_sequence: u32,
    pub quote: DeliveryQuote,
    pub proof_of_delivery_asset_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DispatchRequest {
    pub fn new(
        order_id: Uuid,
        seller_id: Uuid,
        rider_id: Option<Uuid>,
        attempt_sequence: u32,
        quote: DeliveryQuote,
    ) -> Self {
        let now = Utc::now();
        let status = if rider_id.is_some() {
            DispatchStatus::Pending
        } else {
            DispatchStatus::Failed
        };

        Self {
            id: Uuid::new_v4(),
            order_id,
            seller_id,
            rider_id,
            status,
            attempt_sequence,
            quote,
            proof_of_delivery_asset_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub decided: DispatchRequest,
    pub next: Option<DispatchRequest>,
}
