use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use quell_concierge::ConciergeController;
use quell_core::config::{AppConfig, ConfigError, LoadOptions, SessionConfig, TelephonyConfig};
use quell_store::{InMemoryCallSessionStore, InMemoryReservationStore};
use quell_telephony::{CallInitiator, NoopCallInitiator, TwilioCallClient};

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

/// Shared handles for every route module.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub reservations: Arc<InMemoryReservationStore>,
    pub sessions: Arc<InMemoryCallSessionStore>,
    pub controller: Arc<ConciergeController>,
    pub initiator: Arc<dyn CallInitiator>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    Ok(bootstrap_with_config(config))
}

pub fn bootstrap_with_config(config: AppConfig) -> Application {
    let reservations = Arc::new(InMemoryReservationStore::default());
    let sessions = Arc::new(InMemoryCallSessionStore::default());
    let controller =
        Arc::new(ConciergeController::new(reservations.clone(), sessions.clone()));
    let initiator = build_initiator(&config.telephony);

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        telephony_enabled = config.telephony.enabled,
        "stores and controller wired"
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        reservations,
        sessions,
        controller,
        initiator,
    };
    Application { config, state }
}

fn build_initiator(telephony: &TelephonyConfig) -> Arc<dyn CallInitiator> {
    if telephony.enabled {
        if let (Some(account_sid), Some(auth_token), Some(from_number)) = (
            telephony.account_sid.clone(),
            telephony.auth_token.clone(),
            telephony.from_number.clone(),
        ) {
            return Arc::new(TwilioCallClient::new(
                telephony.api_base_url.clone(),
                account_sid,
                auth_token,
                from_number,
            ));
        }
    }
    Arc::new(NoopCallInitiator)
}

/// Periodically drops sessions for calls that went silent; without another
/// callback their state would live until process restart.
pub fn spawn_session_sweeper(sessions: Arc<InMemoryCallSessionStore>, config: &SessionConfig) {
    let ttl = chrono::Duration::seconds(i64::try_from(config.ttl_secs).unwrap_or(i64::MAX));
    let every = std::time::Duration::from_secs(config.sweep_interval_secs);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = sessions.sweep_expired(ttl, Utc::now()).await;
            if removed > 0 {
                info!(
                    event_name = "system.sessions.swept",
                    removed, "stale call sessions removed"
                );
            }
        }
    });
}
