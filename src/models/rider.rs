use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: String,
    pub phone: String,
    pub avatar_asset_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rider {
    pub id: Uuid,
    pub profile: UserProfile,
    pub vehicle_type: String,
    pub location: Option<GeoPoint>,
    pub online: bool,
    pub approval_status: ApprovalStatus,
    pub rating: f64,
    pub updated_at: DateTime<Utc>,
}

impl Rider {
    pub fn new(profile: UserProfile, vehicle_type: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile,
            vehicle_type,
            location: None,
            online: false,
            approval_status: ApprovalStatus::Pending,
            rating: 5.0,
            updated_at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.online && self.approval_status == ApprovalStatus::Approved
    }
}
