use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::dispatch::DispatchStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartySummary {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub avatar_asset_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderSummary {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub avatar_asset_id: Option<Uuid>,
    pub vehicle_type: String,
    pub rating: f64,
    pub distance_km: Option<f64>,
    pub eta_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverySummary {
    pub request_id: Uuid,
    pub status: DispatchStatus,
    pub attempt_sequence: u32,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub pickup_distance_km: Option<f64>,
    pub dropoff_distance_km: f64,
    pub total_distance_km: f64,
    pub payment: f64,
    pub estimated_minutes: u32,
    pub proof_of_delivery_asset_id: Option<Uuid>,
    pub rider: Option<RiderSummary>,
    pub seller: Option<PartySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentView {
    pub order_id: Uuid,
    pub order_state: String,
    pub total_amount: f64,
    pub shipping_address: String,
    pub billing_address: String,
    pub customer: Option<PartySummary>,
    pub delivery: Option<DeliverySummary>,
}
