use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::callflow::CallStep;
use crate::domain::reservation::ReservationId;

/// Provider-assigned identifier for one phone call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSid(pub String);

/// Per-call conversation state, alive only while the call is in flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSession {
    pub call_sid: CallSid,
    pub reservation_id: ReservationId,
    pub customer_phone: String,
    pub last_speech: Option<String>,
    pub name: Option<String>,
    pub party_size: Option<u32>,
    pub dining_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub step: CallStep,
    pub last_updated: DateTime<Utc>,
}

impl CallSession {
    pub fn open(
        call_sid: CallSid,
        reservation_id: ReservationId,
        customer_phone: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            call_sid,
            reservation_id,
            customer_phone: customer_phone.into(),
            last_speech: None,
            name: None,
            party_size: None,
            dining_at: None,
            notes: None,
            step: CallStep::Intro,
            last_updated: now,
        }
    }

    /// Merges collected fields over the session. `call_sid`,
    /// `reservation_id` and `customer_phone` are structurally out of reach.
    pub fn apply(&mut self, patch: SessionPatch, now: DateTime<Utc>) {
        if let Some(last_speech) = patch.last_speech {
            self.last_speech = Some(last_speech);
        }
        if let Some(name) = patch.name {
            self.name = Some(name);
        }
        if let Some(party_size) = patch.party_size {
            self.party_size = Some(party_size);
        }
        if let Some(dining_at) = patch.dining_at {
            self.dining_at = Some(dining_at);
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(step) = patch.step {
            self.step = step;
        }
        self.last_updated = now;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub last_speech: Option<String>,
    pub name: Option<String>,
    pub party_size: Option<u32>,
    pub dining_at: Option<DateTime<Utc>>,
    /// `Some(None)` records an explicit "no notes".
    pub notes: Option<Option<String>>,
    pub step: Option<CallStep>,
}

impl SessionPatch {
    pub fn advance_to(step: CallStep) -> Self {
        Self { step: Some(step), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
