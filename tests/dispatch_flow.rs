mod common;

use std::collections::HashSet;
use std::time::Duration;

use rider_dispatch::collaborators::NotifyTarget;
use rider_dispatch::config::DispatchPolicy;
use rider_dispatch::engine::sweeper::sweep_expired_offers;
use rider_dispatch::error::AppError;
use rider_dispatch::models::dispatch::{Decision, DispatchStatus};
use rider_dispatch::models::event::DispatchEventKind;
use uuid::Uuid;

use common::{seller_id, Harness, SELLER_PHONE};

async fn three_riders(harness: &Harness) {
    harness.add_rider(1, 5.0, 4.5).await;
    harness.add_rider(2, 2.0, 4.5).await;
    harness.add_rider(3, 8.0, 4.5).await;
}

#[tokio::test]
async fn dispatch_offers_the_nearest_rider() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);

    let request = harness
        .state
        .coordinator
        .dispatch(order_id, seller_id())
        .await
        .unwrap();

    assert_eq!(request.status, DispatchStatus::Pending);
    assert_eq!(request.rider_id, Some(Uuid::from_u128(2)));
    assert_eq!(request.attempt_sequence, 1);
    assert!((request.quote.pickup_distance_km.unwrap() - 2.0).abs() < 1e-6);
    assert!((request.quote.dropoff_distance_km - 10.0).abs() < 1e-6);
    assert_eq!(request.quote.payment, 16.9);

    let sent = harness.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, NotifyTarget::Phone("+2348010000002".to_string()));
}

#[tokio::test]
async fn dismissal_redispatches_to_next_nearest_rider() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    let coordinator = &harness.state.coordinator;

    let first = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    let outcome = coordinator.decide(first.id, Decision::Dismiss).await.unwrap();

    assert_eq!(outcome.decided.id, first.id);
    assert_eq!(outcome.decided.status, DispatchStatus::Dismissed);
    let next = outcome.next.unwrap();
    assert_eq!(next.status, DispatchStatus::Pending);
    assert_eq!(next.rider_id, Some(Uuid::from_u128(1)));
    assert_eq!(next.attempt_sequence, 2);
    assert_ne!(next.id, first.id);
}

#[tokio::test]
async fn chain_fails_once_every_rider_dismissed() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    let coordinator = &harness.state.coordinator;

    let mut current = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    let mut offered = Vec::new();
    for _ in 0..3 {
        offered.push(current.rider_id.unwrap());
        current = coordinator
            .decide(current.id, Decision::Dismiss)
            .await
            .unwrap()
            .next
            .unwrap();
    }

    assert_eq!(
        offered,
        vec![Uuid::from_u128(2), Uuid::from_u128(1), Uuid::from_u128(3)]
    );
    assert_eq!(current.status, DispatchStatus::Failed);
    assert_eq!(current.rider_id, None);
    assert_eq!(current.attempt_sequence, 4);
    assert!(current.quote.pickup_distance_km.is_none());

    let history = coordinator.history(order_id).await.unwrap();
    let distinct: HashSet<Uuid> = history.iter().filter_map(|r| r.rider_id).collect();
    assert_eq!(history.len(), 4);
    assert_eq!(distinct.len(), 3);
    assert!(history.iter().all(|r| !r.status.is_active()));
}

#[tokio::test]
async fn repeated_dispatch_returns_the_same_attempt() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    let coordinator = &harness.state.coordinator;

    let first = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    let second = coordinator.dispatch(order_id, seller_id()).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(coordinator.history(order_id).await.unwrap().len(), 1);
    assert_eq!(harness.notifier.sent().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatches_share_one_pending_attempt() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = harness.state.clone();
            tokio::spawn(async move { state.coordinator.dispatch(order_id, seller_id()).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap().id);
    }

    assert_eq!(ids.len(), 1);
    let history = harness.state.coordinator.history(order_id).await.unwrap();
    let pending: Vec<_> = history
        .iter()
        .filter(|r| r.status == DispatchStatus::Pending)
        .collect();
    assert_eq!(pending.len(), 1);
    assert!(ids.contains(&pending[0].id));
}

#[tokio::test]
async fn second_accept_is_rejected() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    let coordinator = &harness.state.coordinator;

    let request = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    let accepted = coordinator.decide(request.id, Decision::Accept).await.unwrap();
    assert_eq!(accepted.decided.status, DispatchStatus::Accepted);
    assert!(accepted.next.is_none());

    let err = coordinator
        .decide(request.id, Decision::Accept)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    let err = coordinator
        .decide(request.id, Decision::Dismiss)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_decisions_apply_exactly_once() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    let request = harness
        .state
        .coordinator
        .dispatch(order_id, seller_id())
        .await
        .unwrap();
    let request_id = request.id;

    let handles: Vec<_> = [Decision::Accept, Decision::Accept, Decision::Dismiss]
        .into_iter()
        .map(|decision| {
            let state = harness.state.clone();
            tokio::spawn(async move { state.coordinator.decide(request_id, decision).await })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => applied += 1,
            Err(err) => assert!(matches!(err, AppError::InvalidState(_)), "{err}"),
        }
    }

    assert_eq!(applied, 1);
    let active: Vec<_> = harness
        .state
        .coordinator
        .history(order_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.status.is_active())
        .collect();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn attempts_never_exceed_rider_pool() {
    let harness = Harness::new();
    for id in 1..=5u128 {
        harness.add_rider(id, id as f64, 4.0).await;
    }
    let order_id = harness.add_order(7);
    let coordinator = &harness.state.coordinator;

    let mut current = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    let mut offers = 0;
    while current.status == DispatchStatus::Pending {
        offers += 1;
        assert!(offers <= 5);
        current = coordinator
            .decide(current.id, Decision::Dismiss)
            .await
            .unwrap()
            .next
            .unwrap();
    }

    assert_eq!(offers, 5);
    assert_eq!(current.status, DispatchStatus::Failed);
}

#[tokio::test]
async fn failed_chain_is_final_by_default() {
    let harness = Harness::new();
    let order_id = harness.add_order(42);
    let coordinator = &harness.state.coordinator;

    let failed = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    assert_eq!(failed.status, DispatchStatus::Failed);
    assert_eq!(failed.attempt_sequence, 1);

    harness.add_rider(1, 1.0, 5.0).await;
    let again = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    assert_eq!(again.id, failed.id);
}

#[tokio::test]
async fn failed_chain_can_be_redispatched_when_allowed() {
    let harness = Harness::with_policy(DispatchPolicy {
        allow_redispatch_after_failure: true,
        ..DispatchPolicy::default()
    });
    let order_id = harness.add_order(42);
    let coordinator = &harness.state.coordinator;

    let failed = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    assert_eq!(failed.status, DispatchStatus::Failed);

    harness.add_rider(1, 1.0, 5.0).await;
    let retried = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    assert_eq!(retried.status, DispatchStatus::Pending);
    assert_eq!(retried.attempt_sequence, 2);
    assert_eq!(retried.rider_id, Some(Uuid::from_u128(1)));
}

#[tokio::test]
async fn notification_outage_does_not_block_dispatch() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    harness.notifier.set_failing(true);

    let request = harness
        .state
        .coordinator
        .dispatch(order_id, seller_id())
        .await
        .unwrap();

    assert_eq!(request.status, DispatchStatus::Pending);
    assert_eq!(harness.state.metrics.notification_failures_total.get(), 1);
}

#[tokio::test]
async fn geocoding_failure_aborts_dispatch() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    let unknown_seller = Uuid::from_u128(77);
    harness.directory.upsert_seller(rider_dispatch::models::order::Seller {
        id: unknown_seller,
        profile: rider_dispatch::models::rider::UserProfile {
            full_name: "Nowhere Stores".to_string(),
            phone: "+2348099999999".to_string(),
            avatar_asset_id: None,
        },
        shop_address: rider_dispatch::models::order::Address {
            street_line1: "Unmapped Lane".to_string(),
            city: "Atlantis".to_string(),
        },
    });

    let err = harness
        .state
        .coordinator
        .dispatch(order_id, unknown_seller)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    assert!(harness.state.coordinator.history(order_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_order_and_request_are_not_found() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let coordinator = &harness.state.coordinator;

    assert!(matches!(
        coordinator.dispatch(Uuid::from_u128(404), seller_id()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        coordinator.decide(Uuid::new_v4(), Decision::Accept).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn acceptance_notifies_the_seller() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    let coordinator = &harness.state.coordinator;

    let request = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    coordinator.decide(request.id, Decision::Accept).await.unwrap();

    let sent = harness.notifier.sent().await;
    assert!(sent
        .iter()
        .any(|(target, _)| *target == NotifyTarget::Phone(SELLER_PHONE.to_string())));
}

#[tokio::test]
async fn proof_of_delivery_is_attached_for_the_assigned_rider() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    let coordinator = &harness.state.coordinator;

    let request = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    let rider_id = request.rider_id.unwrap();

    let err = coordinator
        .submit_delivery_proof(request.id, rider_id, vec![1, 2, 3], vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    coordinator.decide(request.id, Decision::Accept).await.unwrap();

    let err = coordinator
        .submit_delivery_proof(request.id, Uuid::from_u128(3), vec![1, 2, 3], vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let updated = coordinator
        .submit_delivery_proof(
            request.id,
            rider_id,
            vec![0xff, 0xd8, 0xff],
            vec!["doorstep".to_string()],
        )
        .await
        .unwrap();

    let asset_id = updated.proof_of_delivery_asset_id.unwrap();
    let stored = harness.assets.get(asset_id).unwrap();
    assert_eq!(stored.bytes, vec![0xff, 0xd8, 0xff]);
    assert_eq!(stored.tags, vec!["doorstep".to_string()]);
}

#[tokio::test]
async fn sweep_dismisses_expired_offers() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    let first = harness
        .state
        .coordinator
        .dispatch(order_id, seller_id())
        .await
        .unwrap();

    let expired = sweep_expired_offers(&harness.state, Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(expired, 1);
    assert_eq!(harness.state.metrics.offers_expired_total.get(), 1);
    let history = harness.state.coordinator.history(order_id).await.unwrap();
    assert_eq!(history[0].id, first.id);
    assert_eq!(history[0].status, DispatchStatus::Dismissed);
    assert_eq!(history[1].status, DispatchStatus::Pending);
    assert_eq!(history[1].rider_id, Some(Uuid::from_u128(1)));
}

#[tokio::test]
async fn sweep_leaves_fresh_offers_alone() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    harness
        .state
        .coordinator
        .dispatch(order_id, seller_id())
        .await
        .unwrap();

    let expired = sweep_expired_offers(&harness.state, Duration::from_secs(600))
        .await
        .unwrap();

    assert_eq!(expired, 0);
}

#[tokio::test]
async fn lifecycle_events_are_published() {
    let harness = Harness::new();
    harness.add_rider(1, 1.0, 4.0).await;
    let order_id = harness.add_order(42);
    let mut events = harness.state.dispatch_events_tx.subscribe();
    let coordinator = &harness.state.coordinator;

    let request = coordinator.dispatch(order_id, seller_id()).await.unwrap();
    coordinator.decide(request.id, Decision::Dismiss).await.unwrap();

    let kinds: Vec<DispatchEventKind> = (0..3)
        .map(|_| events.try_recv().unwrap().kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            DispatchEventKind::Submitted,
            DispatchEventKind::Processed,
            DispatchEventKind::Exhausted,
        ]
    );
}

#[tokio::test]
async fn fulfillment_view_tracks_the_latest_attempt() {
    let harness = Harness::new();
    three_riders(&harness).await;
    let order_id = harness.add_order(42);
    let fulfillment = &harness.state.fulfillment;

    assert!(matches!(
        fulfillment.view(Uuid::from_u128(404)).await,
        Err(AppError::NotFound(_))
    ));

    let empty = fulfillment.view(order_id).await.unwrap();
    assert!(empty.delivery.is_none());
    assert_eq!(empty.customer.unwrap().full_name, "Tunde Bakare");
    assert_eq!(empty.shipping_address, "8 Awolowo Road, Lagos");

    let first = harness
        .state
        .coordinator
        .dispatch(order_id, seller_id())
        .await
        .unwrap();
    harness
        .state
        .coordinator
        .decide(first.id, Decision::Dismiss)
        .await
        .unwrap();

    let view = fulfillment.view(order_id).await.unwrap();
    let delivery = view.delivery.unwrap();
    assert_eq!(delivery.status, DispatchStatus::Pending);
    assert_eq!(delivery.attempt_sequence, 2);
    let rider = delivery.rider.unwrap();
    assert_eq!(rider.id, Uuid::from_u128(1));
    assert!((rider.distance_km.unwrap() - 5.0).abs() < 1e-6);
    assert_eq!(rider.eta_minutes, Some(12));
    assert_eq!(delivery.seller.unwrap().phone, SELLER_PHONE);
}
