use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::dispatch::DispatchRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchEventKind {
    Submitted,
    Processed,
    Exhausted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEvent {
    pub kind: DispatchEventKind,
    pub request: DispatchRequest,
    pub at: DateTime<Utc>,
}

impl DispatchEvent {
    pub fn new(kind: DispatchEventKind, request: DispatchRequest) -> Self {
        Self {
            kind,
            request,
            at: Utc::now(),
        }
    }
}
