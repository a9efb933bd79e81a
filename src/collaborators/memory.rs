use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::collaborators::{AssetStore, Geocoder, Notifier, NotifyTarget, OrderLedger, PartyDirectory};
use crate::error::AppError;
use crate::models::order::{Customer, OrderSummary, Seller};
use crate::models::rider::GeoPoint;

#[derive(Default)]
pub struct InMemoryGeocoder {
    points: DashMap<String, GeoPoint>,
}

impl InMemoryGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, address: &str, point: GeoPoint) {
        self.points.insert(normalise(address), point);
    }
}

fn normalise(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[async_trait]
impl Geocoder for InMemoryGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, AppError> {
        self.points
            .get(&normalise(address))
            .map(|entry| *entry.value())
            .ok_or_else(|| AppError::UpstreamUnavailable(format!("cannot geocode {address:?}")))
    }
}

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, target: &NotifyTarget, message: &str) -> Result<(), AppError> {
        info!(recipient = ?target, message, "notification sent");
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(NotifyTarget, String)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<(NotifyTarget, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, target: &NotifyTarget, message: &str) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::UpstreamUnavailable(
                "notification gateway unreachable".to_string(),
            ));
        }
        self.sent
            .lock()
            .await
            .push((target.clone(), message.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub bytes: Vec<u8>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemoryAssetStore {
    assets: DashMap<Uuid, StoredAsset>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Uuid) -> Option<StoredAsset> {
        self.assets.get(&id).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn create_asset(&self, bytes: Vec<u8>, tags: Vec<String>) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.assets.insert(
            id,
            StoredAsset {
                bytes,
                tags,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }
}

#[derive(Default)]
pub struct InMemoryOrderLedger {
    orders: DashMap<Uuid, OrderSummary>,
}

impl InMemoryOrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, order: OrderSummary) {
        self.orders.insert(order.id, order);
    }
}

#[async_trait]
impl OrderLedger for InMemoryOrderLedger {
    async fn get_order(&self, id: Uuid) -> Result<OrderSummary, AppError> {
        self.orders
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    sellers: DashMap<Uuid, Seller>,
    customers: DashMap<Uuid, Customer>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_seller(&self, seller: Seller) {
        self.sellers.insert(seller.id, seller);
    }

    pub fn upsert_customer(&self, customer: Customer) {
        self.customers.insert(customer.id, customer);
    }
}

#[async_trait]
impl PartyDirectory for InMemoryDirectory {
    async fn seller(&self, id: Uuid) -> Result<Seller, AppError> {
        self.sellers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("seller {id} not found")))
    }

    async fn customer(&self, id: Uuid) -> Result<Customer, AppError> {
        self.customers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))
    }
}
