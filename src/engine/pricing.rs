use crate::config::DispatchPolicy;
use crate::geo::{haversine_km, travel_minutes};
use crate::models::dispatch::DeliveryQuote;
use crate::models::rider::GeoPoint;

pub struct Leg<'a> {
    pub address: &'a str,
    pub point: GeoPoint,
}

pub fn quote(
    policy: &DispatchPolicy,
    pickup: Leg<'_>,
    dropoff: Leg<'_>,
    rider_point: Option<&GeoPoint>,
) -> DeliveryQuote {
    let pickup_distance_km = rider_point.map(|point| haversine_km(point, &pickup.point));
    let dropoff_distance_km = haversine_km(&pickup.point, &dropoff.point);
    let total_distance_km = pickup_distance_km.unwrap_or(0.0) + dropoff_distance_km;

    DeliveryQuote {
        pickup_address: pickup.address.to_string(),
        pickup_point: pickup.point,
        dropoff_address: dropoff.address.to_string(),
        dropoff_point: dropoff.point,
        pickup_distance_km,
        dropoff_distance_km,
        total_distance_km,
        payment: round_cents(policy.base_fare + policy.per_km_rate * total_distance_km),
        estimated_minutes: travel_minutes(total_distance_km, policy.average_speed_kmh),
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
