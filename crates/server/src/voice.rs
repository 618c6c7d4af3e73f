//! The provider-facing voice callback endpoint. Each POST carries one
//! conversation turn; the step marker in the query string tells the
//! controller which state the transcript belongs to.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Form, Router};
use chrono::Utc;
use serde::Deserialize;

use quell_concierge::{voice_script_url, VoiceCallback, VoiceReply};
use quell_core::domain::reservation::ReservationId;
use quell_telephony::VoiceResponse;

use crate::bootstrap::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct VoiceQuery {
    pub reservation_id: Option<String>,
    pub step: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoiceForm {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
    #[serde(rename = "To")]
    pub to: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/voice/script", post(voice_script).get(voice_script_get))
        .with_state(state)
}

pub async fn voice_script(
    State(state): State<AppState>,
    Query(query): Query<VoiceQuery>,
    Form(form): Form<VoiceForm>,
) -> impl IntoResponse {
    let reservation_id = query.reservation_id.clone();
    let callback = VoiceCallback {
        call_sid: form.call_sid,
        reservation_id: query.reservation_id,
        step: query.step,
        speech: form.speech_result,
        dialed_number: form.to,
    };

    let reply = state.controller.handle_turn(callback, Utc::now()).await;
    let base = state.config.server.public_base_url.as_deref().unwrap_or("");
    xml_response(render_reply(&reply, base, reservation_id.as_deref()))
}

/// The provider probes callback URLs with GET; there is no turn to process,
/// so ask the caller to ring again.
pub async fn voice_script_get() -> impl IntoResponse {
    let mut response = VoiceResponse::new();
    response.say("Please place the call again so we may complete your reservation.").hangup();
    xml_response(response.to_xml())
}

fn render_reply(reply: &VoiceReply, base: &str, reservation_id: Option<&str>) -> String {
    let mut response = VoiceResponse::new();
    match (reply.gather, reservation_id) {
        (Some(next), Some(reservation_id)) => {
            let action = voice_script_url(
                base,
                &ReservationId(reservation_id.to_string()),
                Some(next),
            );
            response.gather(action, reply.messages.join(" "));
        }
        _ => {
            for message in &reply.messages {
                response.say(message);
            }
            response.hangup();
        }
    }
    response.to_xml()
}

fn xml_response(xml: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/xml")], xml)
}
