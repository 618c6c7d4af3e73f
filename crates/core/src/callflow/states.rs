use serde::{Deserialize, Serialize};

use crate::domain::reservation::ReservationUpdate;
use crate::domain::session::SessionPatch;

/// One conversation state per gather round. The marker string travels in the
/// callback address, so the provider's next request lands on the state the
/// previous response asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallStep {
    Intro,
    CollectName,
    CollectPartySize,
    CollectDateTime,
    CollectNotes,
    Confirm,
    Completed,
}

impl CallStep {
    pub fn marker(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::CollectName => "collectName",
            Self::CollectPartySize => "collectPartySize",
            Self::CollectDateTime => "collectDateTime",
            Self::CollectNotes => "collectNotes",
            Self::Confirm => "confirm",
            Self::Completed => "completed",
        }
    }

    /// Parses a step marker from a callback address. `completed` is terminal
    /// and never travels, so it is rejected here like any unknown marker.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "intro" => Some(Self::Intro),
            "collectName" => Some(Self::CollectName),
            "collectPartySize" => Some(Self::CollectPartySize),
            "collectDateTime" => Some(Self::CollectDateTime),
            "collectNotes" => Some(Self::CollectNotes),
            "confirm" => Some(Self::Confirm),
            _ => None,
        }
    }
}

/// Result of one turn of the conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Turn {
    /// Speak `prompt` and gather the caller's next utterance for `next`.
    /// Self-loops re-prompt with `next` equal to the current step and an
    /// empty patch.
    Gather { prompt: String, next: CallStep, patch: SessionPatch },
    /// Terminal confirmation: speak `messages` in order, write `update` to
    /// the linked reservation, end the call, drop the session.
    Complete { messages: Vec<String>, update: ReservationUpdate },
    /// Terminal failure: apologise and hang up.
    Fail { message: String },
}

#[cfg(test)]
mod tests {
    use super::CallStep;

    #[test]
    fn gatherable_step_markers_round_trip() {
        let steps = [
            CallStep::Intro,
            CallStep::CollectName,
            CallStep::CollectPartySize,
            CallStep::CollectDateTime,
            CallStep::CollectNotes,
            CallStep::Confirm,
        ];

        for step in steps {
            assert_eq!(CallStep::from_marker(step.marker()), Some(step), "{}", step.marker());
        }
    }

    #[test]
    fn completed_marker_does_not_parse() {
        assert_eq!(CallStep::from_marker("completed"), None);
        assert_eq!(CallStep::from_marker("collectname"), None);
        assert_eq!(CallStep::from_marker(""), None);
    }
}
