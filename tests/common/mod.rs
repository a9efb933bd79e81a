#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rider_dispatch::collaborators::memory::{
    InMemoryAssetStore, InMemoryDirectory, InMemoryGeocoder, InMemoryOrderLedger,
    RecordingNotifier,
};
use rider_dispatch::collaborators::Collaborators;
use rider_dispatch::config::DispatchPolicy;
use rider_dispatch::geo::EARTH_RADIUS_KM;
use rider_dispatch::models::order::{Address, Customer, OrderSummary, Seller};
use rider_dispatch::models::rider::{ApprovalStatus, GeoPoint, Rider, UserProfile};
use rider_dispatch::state::AppState;
use uuid::Uuid;

pub const SELLER_ID: u128 = 9_000;
pub const CUSTOMER_ID: u128 = 9_100;
pub const SELLER_PHONE: &str = "+2348090000000";
pub const SHOP_STREET: &str = "1 Marina Road";
pub const HOME_STREET: &str = "8 Awolowo Road";
pub const CITY: &str = "Lagos";

/// Seller shop sits at the origin; the customer lives 10 km north of it.
pub struct Harness {
    pub state: Arc<AppState>,
    pub geocoder: Arc<InMemoryGeocoder>,
    pub ledger: Arc<InMemoryOrderLedger>,
    pub directory: Arc<InMemoryDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub assets: Arc<InMemoryAssetStore>,
}

pub fn north_of_origin(km: f64) -> GeoPoint {
    GeoPoint {
        lat: (km / EARTH_RADIUS_KM).to_degrees(),
        lng: 0.0,
    }
}

pub fn seller_id() -> Uuid {
    Uuid::from_u128(SELLER_ID)
}

fn address(street: &str) -> Address {
    Address {
        street_line1: street.to_string(),
        city: CITY.to_string(),
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(DispatchPolicy::default())
    }

    pub fn with_policy(policy: DispatchPolicy) -> Self {
        Self::build(policy, false)
    }

    /// Also mounts the unauthenticated `/admin/sessions` route.
    pub fn with_dev_sessions() -> Self {
        Self::build(DispatchPolicy::default(), true)
    }

    fn build(policy: DispatchPolicy, dev_sessions: bool) -> Self {
        let geocoder = Arc::new(InMemoryGeocoder::new());
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let assets = Arc::new(InMemoryAssetStore::new());

        geocoder.register(&address(SHOP_STREET).one_line(), north_of_origin(0.0));
        geocoder.register(&address(HOME_STREET).one_line(), north_of_origin(10.0));

        directory.upsert_seller(Seller {
            id: seller_id(),
            profile: UserProfile {
                full_name: "Iya Basira Kitchen".to_string(),
                phone: SELLER_PHONE.to_string(),
                avatar_asset_id: None,
            },
            shop_address: address(SHOP_STREET),
        });
        directory.upsert_customer(Customer {
            id: Uuid::from_u128(CUSTOMER_ID),
            profile: UserProfile {
                full_name: "Tunde Bakare".to_string(),
                phone: "+2348070000000".to_string(),
                avatar_asset_id: None,
            },
        });

        let collaborators = Collaborators {
            geocoder: geocoder.clone(),
            notifier: notifier.clone(),
            assets: assets.clone(),
            ledger: ledger.clone(),
            directory: directory.clone(),
        };
        let state = Arc::new(
            AppState::new(collaborators, policy, 64, Duration::from_secs(3_600))
                .with_dev_sessions(dev_sessions),
        );

        Self {
            state,
            geocoder,
            ledger,
            directory,
            notifier,
            assets,
        }
    }

    pub fn add_order(&self, id: u128) -> Uuid {
        let order_id = Uuid::from_u128(id);
        self.ledger.upsert(OrderSummary {
            id: order_id,
            customer_id: Some(Uuid::from_u128(CUSTOMER_ID)),
            shipping_address: address(HOME_STREET),
            billing_address: address(HOME_STREET),
            total_amount: 54.75,
            state: "PaymentSettled".to_string(),
        });
        order_id
    }

    /// Registers an approved, online rider `km` north of the shop.
    pub async fn add_rider(&self, id: u128, km: f64, rating: f64) -> Rider {
        let rider = Rider {
            id: Uuid::from_u128(id),
            profile: UserProfile {
                full_name: format!("Rider {id}"),
                phone: format!("+234801{id:07}"),
                avatar_asset_id: None,
            },
            vehicle_type: "motorbike".to_string(),
            location: Some(north_of_origin(km)),
            online: true,
            approval_status: ApprovalStatus::Approved,
            rating,
            updated_at: Utc::now(),
        };
        self.state.riders.register(rider).await.unwrap()
    }
}
