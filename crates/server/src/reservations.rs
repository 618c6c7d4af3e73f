//! Reservation CRUD consumed by the marketing site's booking form, plus the
//! endpoint that kicks off an AI concierge call.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use quell_concierge::{BeginCall, ConciergeError};
use quell_core::domain::reservation::{
    NewReservation, Reservation, ReservationId, ReservationSource,
};
use quell_core::errors::{ApplicationError, DomainError, InterfaceError};
use quell_store::ReservationStore;

use crate::bootstrap::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub party_size: u32,
    pub dining_date: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartCallRequest {
    pub phone: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallResponse {
    pub call_sid: String,
    pub reservation: Reservation,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/reservations", get(list_reservations).post(create_reservation))
        .route("/api/reservations/{id}", get(get_reservation))
        .route("/api/concierge/calls", post(start_concierge_call))
        .with_state(state)
}

pub async fn list_reservations(State(state): State<AppState>) -> Response {
    match state.reservations.list().await {
        Ok(reservations) => Json(reservations).into_response(),
        Err(error) => error_response(ApplicationError::Persistence(error.to_string())),
    }
}

pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.reservations.get(&ReservationId(id)).await {
        Ok(Some(reservation)) => Json(reservation).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: "reservation not found".to_string(),
                correlation_id: Uuid::new_v4().to_string(),
            }),
        )
            .into_response(),
        Err(error) => error_response(ApplicationError::Persistence(error.to_string())),
    }
}

pub async fn create_reservation(
    State(state): State<AppState>,
    Json(payload): Json<CreateReservationRequest>,
) -> Response {
    let input = match validate(payload) {
        Ok(input) => input,
        Err(error) => return error_response(ApplicationError::Domain(error)),
    };

    match state.reservations.create(input).await {
        Ok(reservation) => {
            info!(
                event_name = "reservations.web.created",
                reservation_id = %reservation.id.0,
                "web reservation created"
            );
            (StatusCode::CREATED, Json(reservation)).into_response()
        }
        Err(error) => error_response(ApplicationError::Persistence(error.to_string())),
    }
}

pub async fn start_concierge_call(
    State(state): State<AppState>,
    Json(payload): Json<StartCallRequest>,
) -> Response {
    if !state.config.telephony.enabled {
        return error_response(ApplicationError::Telephony(
            "outbound calling is disabled in this deployment".to_string(),
        ));
    }
    let Some(public_base_url) = state.config.server.public_base_url.clone() else {
        return error_response(ApplicationError::Configuration(
            "server.public_base_url is not configured".to_string(),
        ));
    };

    let request = BeginCall { phone: payload.phone, notes: payload.notes };
    match state.controller.begin_call(request, state.initiator.as_ref(), &public_base_url).await {
        Ok(placement) => Json(StartCallResponse {
            call_sid: placement.call_sid.0,
            reservation: placement.reservation,
        })
        .into_response(),
        Err(ConciergeError::MissingPhone) => {
            error_response(ApplicationError::Domain(DomainError::MissingPhone))
        }
        Err(ConciergeError::Telephony(error)) => {
            error_response(ApplicationError::Telephony(error.to_string()))
        }
        Err(ConciergeError::Store(error)) => {
            error_response(ApplicationError::Persistence(error.to_string()))
        }
    }
}

fn validate(payload: CreateReservationRequest) -> Result<NewReservation, DomainError> {
    let name = payload.name.trim().to_string();
    if name.chars().count() < 2 {
        return Err(DomainError::InvariantViolation("Name is required".to_string()));
    }

    let phone = payload.phone.trim().to_string();
    if phone.chars().count() < 5 {
        return Err(DomainError::MissingPhone);
    }

    let email = payload
        .email
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    if let Some(email) = &email {
        if !email.contains('@') {
            return Err(DomainError::InvariantViolation("Enter a valid email".to_string()));
        }
    }

    if !(1..=20).contains(&payload.party_size) {
        return Err(DomainError::PartySizeOutOfRange(payload.party_size));
    }

    let dining_at = DateTime::parse_from_rfc3339(payload.dining_date.trim())
        .map_err(|_| {
            DomainError::InvariantViolation("Unable to parse reservation time".to_string())
        })?
        .with_timezone(&Utc);

    if let Some(notes) = &payload.notes {
        if notes.chars().count() > 600 {
            return Err(DomainError::InvariantViolation(
                "Notes are limited to 600 characters".to_string(),
            ));
        }
    }

    Ok(NewReservation {
        name: Some(name),
        phone,
        email,
        party_size: Some(payload.party_size),
        dining_at: Some(dining_at),
        notes: payload.notes,
        source: ReservationSource::Web,
        status: None,
    })
}

fn error_response(error: ApplicationError) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let interface = error.into_interface(correlation_id.clone());
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiError { error: interface.to_string(), correlation_id })).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use quell_concierge::ConciergeController;
    use quell_core::config::AppConfig;
    use quell_store::{InMemoryCallSessionStore, InMemoryReservationStore};
    use quell_telephony::NoopCallInitiator;

    use crate::bootstrap::{bootstrap_with_config, AppState};

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn valid_payload() -> Value {
        json!({
            "name": "Lena Hofbauer",
            "phone": "+43 660 123 4567",
            "partySize": 2,
            "diningDate": "2026-06-26T19:00:00+02:00"
        })
    }

    #[tokio::test]
    async fn web_reservation_is_created_confirmed_and_listed() {
        let app = bootstrap_with_config(AppConfig::default());
        let router = super::router(app.state.clone());

        let response = router
            .clone()
            .oneshot(json_request("POST", "/api/reservations", valid_payload()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = body_json(response).await;
        assert_eq!(created["status"], "confirmed");
        assert_eq!(created["source"], "web");
        assert_eq!(created["partySize"], 2);
        assert_eq!(created["phone"], "+436601234567");

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/reservations")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().expect("array").len(), 1);
    }

    #[tokio::test]
    async fn oversized_party_is_rejected() {
        let app = bootstrap_with_config(AppConfig::default());
        let router = super::router(app.state);

        let mut payload = valid_payload();
        payload["partySize"] = json!(25);

        let response = router
            .oneshot(json_request("POST", "/api/reservations", payload))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("error").contains("party size"));
    }

    #[tokio::test]
    async fn unparseable_dining_date_is_rejected() {
        let app = bootstrap_with_config(AppConfig::default());
        let router = super::router(app.state);

        let mut payload = valid_payload();
        payload["diningDate"] = json!("next Friday-ish");

        let response = router
            .oneshot(json_request("POST", "/api/reservations", payload))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_reservation_is_not_found() {
        let app = bootstrap_with_config(AppConfig::default());
        let router = super::router(app.state);

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/reservations/missing")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn concierge_calls_are_unavailable_when_telephony_is_disabled() {
        let app = bootstrap_with_config(AppConfig::default());
        let router = super::router(app.state);

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/concierge/calls",
                json!({"phone": "+43 660 123 4567"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn concierge_call_places_and_echoes_the_pending_reservation() {
        let mut config = AppConfig::default();
        config.telephony.enabled = true;
        config.server.public_base_url = Some("https://quell.example".to_string());

        let reservations = Arc::new(InMemoryReservationStore::default());
        let sessions = Arc::new(InMemoryCallSessionStore::default());
        let state = AppState {
            config: Arc::new(config),
            reservations: reservations.clone(),
            sessions: sessions.clone(),
            controller: Arc::new(ConciergeController::new(
                reservations.clone(),
                sessions.clone(),
            )),
            initiator: Arc::new(NoopCallInitiator),
        };
        let router = super::router(state);

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/concierge/calls",
                json!({"phone": "+43 660 123 4567", "notes": "anniversary"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["callSid"].as_str().expect("sid").starts_with("noop-"));
        assert_eq!(body["reservation"]["status"], "pending");
        assert_eq!(body["reservation"]["source"], "phone-call");
        assert_eq!(sessions.active_count().await, 1);
    }
}
