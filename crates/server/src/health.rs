use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::bootstrap::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub sessions: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let active_sessions = state.sessions.active_count().await;

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "quell-server runtime initialized".to_string(),
        },
        sessions: HealthCheck {
            status: "ready",
            detail: format!("{active_sessions} active call sessions"),
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode};

    use quell_core::config::AppConfig;

    use crate::bootstrap::bootstrap_with_config;
    use crate::health::health;

    #[tokio::test]
    async fn health_reports_ready_and_counts_sessions() {
        let app = bootstrap_with_config(AppConfig::default());

        let (status, payload) = health(State(app.state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.sessions.detail, "0 active call sessions");
    }
}
