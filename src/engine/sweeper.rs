use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::dispatch::Decision;
use crate::state::AppState;

pub async fn run_offer_sweeper(state: Arc<AppState>, timeout: Duration, every: Duration) {
    info!(
        timeout_secs = timeout.as_secs(),
        interval_secs = every.as_secs(),
        "offer timeout sweeper started"
    );

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match sweep_expired_offers(&state, timeout).await {
            Ok(0) => {}
            Ok(expired) => info!(expired, "expired offers dismissed"),
            Err(err) => warn!(error = %err, "offer sweep failed"),
        }
        state.sessions.purge_expired().await;
    }
}

pub async fn sweep_expired_offers(state: &AppState, timeout: Duration) -> Result<usize, AppError> {
    let timeout = chrono::Duration::from_std(timeout)
        .map_err(|err| AppError::Internal(format!("invalid offer timeout: {err}")))?;
    let stale = state
        .requests
        .list_pending_created_before(Utc::now() - timeout)
        .await?;

    let mut expired = 0;
    for request in stale {
        match state.coordinator.decide(request.id, Decision::Dismiss).await {
            Ok(_) => {
                expired += 1;
                state.metrics.offers_expired_total.inc();
            }
            Err(AppError::InvalidState(_)) => {
                debug!(request_id = %request.id, "offer decided before the sweep reached it");
            }
            Err(err) => {
                warn!(request_id = %request.id, error = %err, "failed to expire offer");
            }
        }
    }

    Ok(expired)
}
