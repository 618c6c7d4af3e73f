use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use quell_core::callflow::{advance, CallStep, Turn};
use quell_core::domain::reservation::{NewReservation, Reservation, ReservationId};
use quell_core::domain::session::{CallSid, SessionPatch};
use quell_store::{CallSessionStore, ReservationStore, StoreError};
use quell_telephony::{CallInitiator, TelephonyError};

/// One turn of provider callback input, as it arrives over the wire. Every
/// field is optional there; validation happens here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoiceCallback {
    pub call_sid: Option<String>,
    pub reservation_id: Option<String>,
    pub step: Option<String>,
    pub speech: Option<String>,
    pub dialed_number: Option<String>,
}

/// Provider-neutral reply: spoken messages plus either the step the next
/// gather belongs to, or a hang-up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceReply {
    pub messages: Vec<String>,
    pub gather: Option<CallStep>,
}

impl VoiceReply {
    fn hangup(message: impl Into<String>) -> Self {
        Self { messages: vec![message.into()], gather: None }
    }

    pub fn ends_call(&self) -> bool {
        self.gather.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeginCall {
    pub phone: String,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallPlacement {
    pub call_sid: CallSid,
    pub reservation: Reservation,
}

#[derive(Debug, Error)]
pub enum ConciergeError {
    #[error("customer phone number is required")]
    MissingPhone,
    #[error(transparent)]
    Telephony(#[from] TelephonyError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Builds the callback address for a conversation step. The step marker in
/// the query string is how the state survives between stateless provider
/// requests.
pub fn voice_script_url(
    public_base_url: &str,
    reservation_id: &ReservationId,
    step: Option<CallStep>,
) -> String {
    let base = public_base_url.trim_end_matches('/');
    match step {
        Some(step) => format!(
            "{base}/voice/script?reservation_id={}&step={}",
            reservation_id.0,
            step.marker()
        ),
        None => format!("{base}/voice/script?reservation_id={}", reservation_id.0),
    }
}

/// Drives phone reservations: one instance per process, shared by all calls.
/// Same-call callbacks are serialized by the provider; distinct calls may
/// run through here concurrently.
pub struct ConciergeController {
    reservations: Arc<dyn ReservationStore>,
    sessions: Arc<dyn CallSessionStore>,
}

impl ConciergeController {
    pub fn new(reservations: Arc<dyn ReservationStore>, sessions: Arc<dyn CallSessionStore>) -> Self {
        Self { reservations, sessions }
    }

    /// Creates the pending reservation, places the outbound call and
    /// pre-registers the session under the provider's call sid.
    pub async fn begin_call(
        &self,
        request: BeginCall,
        initiator: &dyn CallInitiator,
        public_base_url: &str,
    ) -> Result<CallPlacement, ConciergeError> {
        let phone = request.phone.trim();
        if phone.is_empty() {
            return Err(ConciergeError::MissingPhone);
        }
        let notes = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let reservation = self
            .reservations
            .create(NewReservation { notes: notes.clone(), ..NewReservation::for_phone(phone) })
            .await?;

        let callback_url = voice_script_url(public_base_url, &reservation.id, None);
        let placed = initiator.start_call(phone, &callback_url).await?;
        let call_sid = CallSid(placed.sid);

        self.sessions.create(call_sid.clone(), reservation.id.clone(), phone).await?;
        if notes.is_some() {
            self.sessions
                .update(&call_sid, SessionPatch { notes: Some(notes), ..SessionPatch::default() })
                .await?;
        }

        info!(
            event_name = "concierge.call.started",
            call_sid = %call_sid.0,
            reservation_id = %reservation.id.0,
            "outbound concierge call started"
        );

        Ok(CallPlacement { call_sid, reservation })
    }

    /// Handles one provider callback. Missing context short-circuits to a
    /// terminal apology; everything else goes through the state machine.
    pub async fn handle_turn(&self, callback: VoiceCallback, now: DateTime<Utc>) -> VoiceReply {
        let Some(reservation_id) =
            callback.reservation_id.filter(|value| !value.trim().is_empty())
        else {
            warn!(event_name = "concierge.turn.missing_reservation", "callback without reservation");
            return VoiceReply::hangup("Reservation reference missing.");
        };
        let Some(call_sid) = callback.call_sid.filter(|value| !value.trim().is_empty()) else {
            warn!(
                event_name = "concierge.turn.missing_call_sid",
                reservation_id = %reservation_id,
                "callback without call sid"
            );
            return VoiceReply::hangup("Call session not recognised.");
        };

        let step_marker = callback.step.unwrap_or_else(|| CallStep::Intro.marker().to_string());
        let Some(step) = CallStep::from_marker(&step_marker) else {
            warn!(
                event_name = "concierge.turn.unknown_step",
                call_sid = %call_sid,
                step = %step_marker,
                "callback with unknown step marker"
            );
            return VoiceReply::hangup("Unrecognised conversation step.");
        };

        let call_sid = CallSid(call_sid);
        let reservation_id = ReservationId(reservation_id);

        let session = match self.sessions.get(&call_sid).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                let phone = callback.dialed_number.as_deref().unwrap_or("");
                match self.sessions.create(call_sid.clone(), reservation_id.clone(), phone).await {
                    Ok(session) => session,
                    Err(error) => return self.store_failure(&call_sid, error),
                }
            }
            Err(error) => return self.store_failure(&call_sid, error),
        };

        let speech =
            callback.speech.as_deref().map(str::trim).filter(|value| !value.is_empty());

        match advance(step, &session, speech, now) {
            Turn::Gather { prompt, next, patch } => {
                if !patch.is_empty() {
                    match self.sessions.update(&call_sid, patch).await {
                        Ok(Some(_)) => {}
                        Ok(None) => warn!(
                            event_name = "concierge.turn.session_vanished",
                            call_sid = %call_sid.0,
                            "session disappeared while applying a turn"
                        ),
                        Err(error) => return self.store_failure(&call_sid, error),
                    }
                }
                info!(
                    event_name = "concierge.turn.gather",
                    call_sid = %call_sid.0,
                    reservation_id = %reservation_id.0,
                    step = step.marker(),
                    next = next.marker(),
                    "gathering next utterance"
                );
                VoiceReply { messages: vec![prompt], gather: Some(next) }
            }

            Turn::Complete { messages, update } => {
                // Confirmation reads back through the store so a session that
                // vanished mid-call is noticed rather than half-written.
                match self.sessions.get(&call_sid).await {
                    Ok(Some(_)) => {}
                    _ => {
                        warn!(
                            event_name = "concierge.turn.session_lost",
                            call_sid = %call_sid.0,
                            "session lost at confirmation"
                        );
                        return VoiceReply::hangup("Reservation details were lost.");
                    }
                }

                match self.reservations.update(&reservation_id, update).await {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        error!(
                            event_name = "concierge.turn.reservation_missing",
                            call_sid = %call_sid.0,
                            reservation_id = %reservation_id.0,
                            "confirmed reservation no longer exists"
                        );
                        return VoiceReply::hangup(
                            "We are sorry, your reservation could not be saved. Please call us \
                             again.",
                        );
                    }
                    Err(error) => {
                        error!(
                            event_name = "concierge.turn.reservation_update_failed",
                            call_sid = %call_sid.0,
                            reservation_id = %reservation_id.0,
                            error = %error,
                            "reservation update failed at confirmation"
                        );
                        return VoiceReply::hangup(
                            "We are sorry, your reservation could not be saved. Please call us \
                             again.",
                        );
                    }
                }

                let _ = self
                    .sessions
                    .update(&call_sid, SessionPatch::advance_to(CallStep::Completed))
                    .await;
                if let Err(error) = self.sessions.delete(&call_sid).await {
                    warn!(
                        event_name = "concierge.turn.session_cleanup_failed",
                        call_sid = %call_sid.0,
                        error = %error,
                        "completed session could not be removed"
                    );
                }

                info!(
                    event_name = "concierge.call.confirmed",
                    call_sid = %call_sid.0,
                    reservation_id = %reservation_id.0,
                    "reservation confirmed, call ending"
                );
                VoiceReply { messages, gather: None }
            }

            Turn::Fail { message } => {
                warn!(
                    event_name = "concierge.turn.failed",
                    call_sid = %call_sid.0,
                    step = step.marker(),
                    "terminal conversation failure"
                );
                VoiceReply::hangup(message)
            }
        }
    }

    fn store_failure(&self, call_sid: &CallSid, error: StoreError) -> VoiceReply {
        error!(
            event_name = "concierge.turn.store_failure",
            call_sid = %call_sid.0,
            error = %error,
            "session store failure during a turn"
        );
        VoiceReply::hangup("We are sorry, something went wrong. Please call us again.")
    }
}
