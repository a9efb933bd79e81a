use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::collaborators::Collaborators;
use crate::error::AppError;
use crate::geo::{haversine_km, travel_minutes};
use crate::models::dispatch::DispatchRequest;
use crate::models::fulfillment::{DeliverySummary, FulfillmentView, PartySummary, RiderSummary};
use crate::models::rider::{GeoPoint, Rider, UserProfile};
use crate::store::{DispatchRequestStore, RiderRegistry};

pub struct FulfillmentReader {
    riders: Arc<dyn RiderRegistry>,
    requests: Arc<dyn DispatchRequestStore>,
    collaborators: Collaborators,
    average_speed_kmh: f64,
}

impl FulfillmentReader {
    pub fn new(
        riders: Arc<dyn RiderRegistry>,
        requests: Arc<dyn DispatchRequestStore>,
        collaborators: Collaborators,
        average_speed_kmh: f64,
    ) -> Self {
        Self {
            riders,
            requests,
            collaborators,
            average_speed_kmh,
        }
    }

    pub async fn view(&self, order_id: Uuid) -> Result<FulfillmentView, AppError> {
        let order = self.collaborators.ledger.get_order(order_id).await?;

        let customer = match order.customer_id {
            Some(customer_id) => match self.collaborators.directory.customer(customer_id).await {
                Ok(customer) => Some(party_summary(customer.id, &customer.profile)),
                Err(err) => {
                    warn!(order_id = %order_id, customer_id = %customer_id, error = %err, "customer lookup failed");
                    None
                }
            },
            None => None,
        };

        let latest = match self.requests.find_active(order_id).await? {
            Some(active) => Some(active),
            None => self.requests.history(order_id).await?.pop(),
        };
        let delivery = match latest {
            Some(request) => Some(self.delivery_summary(request).await),
            None => None,
        };

        Ok(FulfillmentView {
            order_id: order.id,
            order_state: order.state,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address.one_line(),
            billing_address: order.billing_address.one_line(),
            customer,
            delivery,
        })
    }

    async fn delivery_summary(&self, request: DispatchRequest) -> DeliverySummary {
        let rider = match request.rider_id {
            Some(rider_id) => match self.riders.get(rider_id).await {
                Ok(rider) => Some(self.rider_summary(&rider, &request.quote.pickup_point)),
                Err(err) => {
                    warn!(rider_id = %rider_id, error = %err, "rider lookup failed");
                    None
                }
            },
            None => None,
        };

        let seller = match self.collaborators.directory.seller(request.seller_id).await {
            Ok(seller) => Some(party_summary(seller.id, &seller.profile)),
            Err(err) => {
                warn!(seller_id = %request.seller_id, error = %err, "seller lookup failed");
                None
            }
        };

        DeliverySummary {
            request_id: request.id,
            status: request.status,
            attempt_sequence: request.attempt_sequence,
            pickup_address: request.quote.pickup_address,
            dropoff_address: request.quote.dropoff_address,
            pickup_distance_km: request.quote.pickup_distance_km,
            dropoff_distance_km: request.quote.dropoff_distance_km,
            total_distance_km: request.quote.total_distance_km,
            payment: request.quote.payment,
            estimated_minutes: request.quote.estimated_minutes,
            proof_of_delivery_asset_id: request.proof_of_delivery_asset_id,
            rider,
            seller,
        }
    }

    fn rider_summary(&self, rider: &Rider, pickup: &GeoPoint) -> RiderSummary {
        let distance_km = rider.location.map(|point| haversine_km(&point, pickup));

        RiderSummary {
            id: rider.id,
            full_name: rider.profile.full_name.clone(),
            phone: rider.profile.phone.clone(),
            avatar_asset_id: rider.profile.avatar_asset_id,
            vehicle_type: rider.vehicle_type.clone(),
            rating: rider.rating,
            distance_km,
            eta_minutes: distance_km.map(|km| travel_minutes(km, self.average_speed_kmh)),
        }
    }
}

fn party_summary(id: Uuid, profile: &UserProfile) -> PartySummary {
    PartySummary {
        id,
        full_name: profile.full_name.clone(),
        phone: profile.phone.clone(),
        avatar_asset_id: profile.avatar_asset_id,
    }
}
