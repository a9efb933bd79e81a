use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::dispatch::{DispatchRequest, DispatchStatus};
use crate::store::{DispatchRequestStore, Inserted};

#[derive(Default)]
pub struct InMemoryDispatchStore {
    chains: DashMap<Uuid, Vec<DispatchRequest>>,
    order_of: DashMap<Uuid, Uuid>,
}

impl InMemoryDispatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn order_of(&self, id: Uuid) -> Result<Uuid, AppError> {
        self.order_of
            .get(&id)
            .map(|entry| *entry.value())
            .ok_or_else(|| AppError::NotFound(format!("dispatch request {id} not found")))
    }

    fn with_record<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Vec<DispatchRequest>, usize) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let order_id = self.order_of(id)?;
        let mut chain = self
            .chains
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("dispatch request {id} not found")))?;
        let index = chain
            .iter()
            .position(|request| request.id == id)
            .ok_or_else(|| AppError::NotFound(format!("dispatch request {id} not found")))?;

        f(chain.value_mut(), index)
    }
}

#[async_trait]
impl DispatchRequestStore for InMemoryDispatchStore {
    async fn insert(&self, request: DispatchRequest) -> Result<Inserted, AppError> {
        let mut chain = self.chains.entry(request.order_id).or_default();

        if let Some(active) = chain.iter().find(|existing| existing.status.is_active()) {
            return Ok(Inserted::AlreadyActive(active.clone()));
        }

        let next_sequence = chain.len() as u32 + 1;
        if request.attempt_sequence != next_sequence {
            return Err(AppError::Conflict(format!(
                "attempt {} already taken for order {}",
                request.attempt_sequence, request.order_id
            )));
        }

        self.order_of.insert(request.id, request.order_id);
        chain.push(request.clone());
        Ok(Inserted::Created(request))
    }

    async fn get(&self, id: Uuid) -> Result<DispatchRequest, AppError> {
        self.with_record(id, |chain, index| Ok(chain[index].clone()))
    }

    async fn find_active(&self, order_id: Uuid) -> Result<Option<DispatchRequest>, AppError> {
        let Some(chain) = self.chains.get(&order_id) else {
            return Ok(None);
        };

        let mut active = chain.iter().filter(|request| request.status.is_active());
        let first = active.next().cloned();
        if active.next().is_some() {
            return Err(AppError::Internal(format!(
                "order {order_id} has more than one active dispatch request"
            )));
        }

        Ok(first)
    }

    async fn history(&self, order_id: Uuid) -> Result<Vec<DispatchRequest>, AppError> {
        Ok(self
            .chains
            .get(&order_id)
            .map(|chain| chain.value().clone())
            .unwrap_or_default())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: DispatchStatus,
        next: DispatchStatus,
    ) -> Result<DispatchRequest, AppError> {
        self.with_record(id, |chain, index| {
            let current = chain[index].status;
            if current != expected {
                return Err(AppError::Conflict(format!(
                    "dispatch request {id} is {current:?}, expected {expected:?}"
                )));
            }

            let activates = next.is_active() && !current.is_active();
            if activates && chain.iter().any(|request| request.status.is_active()) {
                return Err(AppError::Conflict(format!(
                    "order {} already has an active dispatch request",
                    chain[index].order_id
                )));
            }

            let record = &mut chain[index];
            record.status = next;
            record.updated_at = Utc::now();
            Ok(record.clone())
        })
    }

    async fn attach_proof(&self, id: Uuid, asset_id: Uuid) -> Result<DispatchRequest, AppError> {
        self.with_record(id, |chain, index| {
            let record = &mut chain[index];
            record.proof_of_delivery_asset_id = Some(asset_id);
            record.updated_at = Utc::now();
            Ok(record.clone())
        })
    }

    async fn list_pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<DispatchRequest>, AppError> {
        Ok(self
            .chains
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|request| {
                        request.status == DispatchStatus::Pending && request.created_at <= cutoff
                    })
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect())
    }

    async fn count(&self) -> usize {
        self.order_of.len()
    }
}
