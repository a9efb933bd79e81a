use std::cmp::Ordering;
use std::collections::HashSet;

use uuid::Uuid;

use crate::geo::haversine_km;
use crate::models::rider::{GeoPoint, Rider};

/// Distances closer than this are treated as a tie.
const DISTANCE_QUANTUM_KM: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub rider: Rider,
    pub distance_km: f64,
}

pub fn rank(origin: &GeoPoint, candidates: &[Rider], exclude: &HashSet<Uuid>) -> Vec<MatchCandidate> {
    let mut ranked: Vec<MatchCandidate> = candidates
        .iter()
        .filter(|rider| rider.is_available() && !exclude.contains(&rider.id))
        .filter_map(|rider| {
            let location = rider.location?;
            Some(MatchCandidate {
                rider: rider.clone(),
                distance_km: haversine_km(origin, &location),
            })
        })
        .collect();

    ranked.sort_by(compare_candidates);
    ranked
}

fn compare_candidates(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    distance_bucket(a.distance_km)
        .cmp(&distance_bucket(b.distance_km))
        .then_with(|| b.rider.rating.total_cmp(&a.rider.rating))
        .then_with(|| a.rider.id.cmp(&b.rider.id))
}

fn distance_bucket(distance_km: f64) -> i64 {
    (distance_km / DISTANCE_QUANTUM_KM).round() as i64
}
