use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Seller,
    Rider,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub actor_id: Uuid,
    pub role: ActorRole,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn issue(&self, caller: Caller, ttl: Duration) -> String;

    async fn resolve(&self, token: &str) -> Result<Caller, AppError>;

    async fn purge_expired(&self) -> usize;
}

struct Session {
    caller: Caller,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn issue(&self, caller: Caller, ttl: Duration) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                caller,
                expires_at: Instant::now() + ttl,
            },
        );
        token
    }

    async fn resolve(&self, token: &str) -> Result<Caller, AppError> {
        let now = Instant::now();
        let caller = self
            .sessions
            .get(token)
            .filter(|session| session.expires_at > now)
            .map(|session| session.caller);

        match caller {
            Some(caller) => Ok(caller),
            None => {
                self.sessions
                    .remove_if(token, |_, session| session.expires_at <= now);
                Err(AppError::Unauthenticated)
            }
        }
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            debug!(purged, "expired sessions evicted");
        }
        purged
    }
}
