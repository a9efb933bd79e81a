use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::collaborators::{Collaborators, InMemorySessionStore, SessionStore};
use crate::config::DispatchPolicy;
use crate::engine::coordinator::DispatchCoordinator;
use crate::engine::fulfillment::FulfillmentReader;
use crate::models::event::DispatchEvent;
use crate::observability::metrics::Metrics;
use crate::store::{DispatchRequestStore, InMemoryDispatchStore, InMemoryRiderRegistry, RiderRegistry};

pub struct AppState {
    pub riders: Arc<dyn RiderRegistry>,
    pub requests: Arc<dyn DispatchRequestStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub coordinator: DispatchCoordinator,
    pub fulfillment: FulfillmentReader,
    pub dispatch_events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
    pub session_ttl: Duration,
    pub dev_sessions: bool,
}

impl AppState {
    pub fn new(
        collaborators: Collaborators,
        policy: DispatchPolicy,
        event_buffer_size: usize,
        session_ttl: Duration,
    ) -> Self {
        let riders: Arc<dyn RiderRegistry> = Arc::new(InMemoryRiderRegistry::new());
        let requests: Arc<dyn DispatchRequestStore> = Arc::new(InMemoryDispatchStore::new());
        let (dispatch_events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));
        let metrics = Metrics::new();

        let fulfillment = FulfillmentReader::new(
            riders.clone(),
            requests.clone(),
            collaborators.clone(),
            policy.average_speed_kmh,
        );
        let coordinator = DispatchCoordinator::new(
            riders.clone(),
            requests.clone(),
            collaborators,
            dispatch_events_tx.clone(),
            metrics.clone(),
            policy,
        );

        Self {
            riders,
            requests,
            sessions: Arc::new(InMemorySessionStore::new()),
            coordinator,
            fulfillment,
            dispatch_events_tx,
            metrics,
            session_ttl,
            dev_sessions: false,
        }
    }

    pub fn with_dev_sessions(mut self, enabled: bool) -> Self {
        self.dev_sessions = enabled;
        self
    }
}
