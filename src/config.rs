use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub enable_dev_sessions: bool,
    pub dispatch: DispatchPolicy,
}

#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    pub base_fare: f64,
    pub per_km_rate: f64,
    pub average_speed_kmh: f64,
    pub notify_timeout: Duration,
    /// `None` disables the offer timeout sweep.
    pub offer_timeout: Option<Duration>,
    pub allow_redispatch_after_failure: bool,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            base_fare: 2.5,
            per_km_rate: 1.2,
            average_speed_kmh: 25.0,
            notify_timeout: Duration::from_millis(2_000),
            offer_timeout: None,
            allow_redispatch_after_failure: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let defaults = DispatchPolicy::default();
        let offer_timeout_secs: u64 = parse_or_default("OFFER_TIMEOUT_SECS", 0)?;
        let average_speed_kmh: f64 =
            parse_or_default("AVERAGE_SPEED_KMH", defaults.average_speed_kmh)?;
        if average_speed_kmh <= 0.0 {
            return Err(AppError::Internal(
                "invalid AVERAGE_SPEED_KMH: must be > 0".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            session_ttl_secs: parse_or_default("SESSION_TTL_SECS", 86_400)?,
            sweep_interval_secs: parse_or_default("SWEEP_INTERVAL_SECS", 15)?,
            enable_dev_sessions: parse_or_default("ENABLE_DEV_SESSIONS", false)?,
            dispatch: DispatchPolicy {
                base_fare: parse_or_default("BASE_FARE", defaults.base_fare)?,
                per_km_rate: parse_or_default("PER_KM_RATE", defaults.per_km_rate)?,
                average_speed_kmh,
                notify_timeout: Duration::from_millis(parse_or_default(
                    "NOTIFY_TIMEOUT_MS",
                    2_000,
                )?),
                offer_timeout: (offer_timeout_secs > 0)
                    .then(|| Duration::from_secs(offer_timeout_secs)),
                allow_redispatch_after_failure: parse_or_default(
                    "ALLOW_REDISPATCH_AFTER_FAILURE",
                    false,
                )?,
            },
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
