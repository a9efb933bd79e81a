pub mod memory;
pub mod sessions;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{Customer, OrderSummary, Seller};
use crate::models::rider::GeoPoint;

pub use sessions::{ActorRole, Caller, InMemorySessionStore, SessionStore};

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum NotifyTarget {
    Phone(String),
    DeviceToken(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, target: &NotifyTarget, message: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn create_asset(&self, bytes: Vec<u8>, tags: Vec<String>) -> Result<Uuid, AppError>;
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
    async fn get_order(&self, id: Uuid) -> Result<OrderSummary, AppError>;
}

#[async_trait]
pub trait PartyDirectory: Send + Sync {
    async fn seller(&self, id: Uuid) -> Result<Seller, AppError>;

    async fn customer(&self, id: Uuid) -> Result<Customer, AppError>;
}

#[derive(Clone)]
pub struct Collaborators {
    pub geocoder: Arc<dyn Geocoder>,
    pub notifier: Arc<dyn Notifier>,
    pub assets: Arc<dyn AssetStore>,
    pub ledger: Arc<dyn OrderLedger>,
    pub directory: Arc<dyn PartyDirectory>,
}
