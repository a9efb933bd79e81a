pub mod requests;
pub mod riders;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::dispatch::{DispatchRequest, DispatchStatus};
use crate::models::rider::{ApprovalStatus, GeoPoint, Rider};

pub use requests::InMemoryDispatchStore;
pub use riders::InMemoryRiderRegistry;

#[async_trait]
pub trait RiderRegistry: Send + Sync {
    async fn register(&self, rider: Rider) -> Result<Rider, AppError>;

    async fn get(&self, id: Uuid) -> Result<Rider, AppError>;

    async fn list_available(&self) -> Result<Vec<Rider>, AppError>;

    async fn list_online(&self) -> Result<Vec<Rider>, AppError>;

    async fn list_by_approval(&self, status: ApprovalStatus) -> Result<Vec<Rider>, AppError>;

    async fn update_location(&self, id: Uuid, location: GeoPoint) -> Result<Rider, AppError>;

    async fn set_online(&self, id: Uuid, online: bool) -> Result<bool, AppError>;

    async fn toggle_online(&self, id: Uuid) -> Result<bool, AppError>;

    async fn set_approval(&self, id: Uuid, status: ApprovalStatus) -> Result<Rider, AppError>;

    async fn count(&self) -> usize;
}

#[derive(Debug, Clone)]
pub enum Inserted {
    Created(DispatchRequest),
    AlreadyActive(DispatchRequest),
}

#[async_trait]
pub trait DispatchRequestStore: Send + Sync {
    /// Conditional insert. A pending attempt is only stored when the order has
    /// no active attempt; otherwise the existing one is returned. Fails with
    /// `Conflict` when `attempt_sequence` is not the next one for the order.
    async fn insert(&self, request: DispatchRequest) -> Result<Inserted, AppError>;

    async fn get(&self, id: Uuid) -> Result<DispatchRequest, AppError>;

    async fn find_active(&self, order_id: Uuid) -> Result<Option<DispatchRequest>, AppError>;

    async fn history(&self, order_id: Uuid) -> Result<Vec<DispatchRequest>, AppError>;

    /// Compare-and-set on status. Fails with `Conflict` when the stored status
    /// is no longer `expected`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: DispatchStatus,
        next: DispatchStatus,
    ) -> Result<DispatchRequest, AppError>;

    async fn attach_proof(&self, id: Uuid, asset_id: Uuid) -> Result<DispatchRequest, AppError>;

    async fn list_pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<DispatchRequest>, AppError>;

    async fn count(&self) -> usize;
}
