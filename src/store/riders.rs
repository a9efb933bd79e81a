use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::rider::{ApprovalStatus, GeoPoint, Rider};
use crate::store::RiderRegistry;

#[derive(Default)]
pub struct InMemoryRiderRegistry {
    riders: DashMap<Uuid, Rider>,
    phones: DashMap<String, Uuid>,
}

impl InMemoryRiderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<T>(&self, id: Uuid, f: impl FnOnce(&mut Rider) -> T) -> Result<T, AppError> {
        let mut rider = self
            .riders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("rider {id} not found")))?;

        rider.updated_at = Utc::now();
        Ok(f(rider.value_mut()))
    }

    fn filtered(&self, predicate: impl Fn(&Rider) -> bool) -> Vec<Rider> {
        self.riders
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl RiderRegistry for InMemoryRiderRegistry {
    async fn register(&self, rider: Rider) -> Result<Rider, AppError> {
        match self.phones.entry(rider.profile.phone.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "phone {} is already registered",
                rider.profile.phone
            ))),
            Entry::Vacant(slot) => {
                slot.insert(rider.id);
                self.riders.insert(rider.id, rider.clone());
                Ok(rider)
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Rider, AppError> {
        self.riders
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("rider {id} not found")))
    }

    async fn list_available(&self) -> Result<Vec<Rider>, AppError> {
        Ok(self.filtered(Rider::is_available))
    }

    async fn list_online(&self) -> Result<Vec<Rider>, AppError> {
        Ok(self.filtered(|rider| rider.online))
    }

    async fn list_by_approval(&self, status: ApprovalStatus) -> Result<Vec<Rider>, AppError> {
        Ok(self.filtered(|rider| rider.approval_status == status))
    }

    async fn update_location(&self, id: Uuid, location: GeoPoint) -> Result<Rider, AppError> {
        self.update(id, |rider| {
            rider.location = Some(location);
        })?;
        self.get(id).await
    }

    async fn set_online(&self, id: Uuid, online: bool) -> Result<bool, AppError> {
        self.update(id, |rider| {
            rider.online = online;
            rider.online
        })
    }

    async fn toggle_online(&self, id: Uuid) -> Result<bool, AppError> {
        self.update(id, |rider| {
            rider.online = !rider.online;
            rider.online
        })
    }

    async fn set_approval(&self, id: Uuid, status: ApprovalStatus) -> Result<Rider, AppError> {
        self.update(id, |rider| {
            rider.approval_status = status;
            rider.clone()
        })
    }

    async fn count(&self) -> usize {
        self.riders.len()
    }
}
