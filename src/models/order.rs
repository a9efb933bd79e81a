use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::rider::UserProfile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub street_line1: String,
    pub city: String,
}

impl Address {
    pub fn one_line(&self) -> String {
        if self.city.is_empty() {
            self.street_line1.clone()
        } else {
            format!("{}, {}", self.street_line1, self.city)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub total_amount: f64,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    pub id: Uuid,
    pub profile: UserProfile,
    pub shop_address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub profile: UserProfile,
}
