use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::collaborators::memory::{InMemoryDirectory, InMemoryGeocoder, InMemoryOrderLedger};
use crate::error::AppError;
use crate::models::order::{Customer, OrderSummary, Seller};
use crate::models::rider::GeoPoint;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub sellers: Vec<Seller>,
    pub customers: Vec<Customer>,
    pub orders: Vec<OrderSummary>,
    pub places: Vec<Place>,
}

#[derive(Debug, Deserialize)]
pub struct Place {
    pub address: String,
    pub point: GeoPoint,
}

impl Fixtures {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| AppError::Internal(format!("cannot read {}: {err}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|err| AppError::Internal(format!("invalid fixtures {}: {err}", path.display())))
    }

    pub fn apply(
        self,
        geocoder: &InMemoryGeocoder,
        ledger: &InMemoryOrderLedger,
        directory: &InMemoryDirectory,
    ) {
        info!(
            sellers = self.sellers.len(),
            customers = self.customers.len(),
            orders = self.orders.len(),
            places = self.places.len(),
            "loading fixtures"
        );

        for place in self.places {
            geocoder.register(&place.address, place.point);
        }
        for seller in self.sellers {
            directory.upsert_seller(seller);
        }
        for customer in self.customers {
            directory.upsert_customer(customer);
        }
        for order in self.orders {
            ledger.upsert(order);
        }
    }
}
