use chrono::{DateTime, Utc};

use crate::callflow::states::{CallStep, Turn};
use crate::domain::reservation::{ReservationStatus, ReservationUpdate};
use crate::domain::session::{CallSession, SessionPatch};
use crate::speech::{
    extract_party_size, format_for_speech, normalize_name, normalize_notes, parse_dining_time,
};

/// Any of these as a case-insensitive substring counts as a confirmation.
const CONFIRMATION_WORDS: [&str; 6] = ["confirm", "yes", "ja", "passt", "correct", "stimmt"];

/// Advances the conversation one turn. `speech` is the provider's transcript
/// for this turn, already trimmed; `None` covers both a missing field and an
/// empty transcript. The function is pure: the caller applies the returned
/// patch to the session store and renders the reply.
pub fn advance(
    step: CallStep,
    session: &CallSession,
    speech: Option<&str>,
    now: DateTime<Utc>,
) -> Turn {
    match step {
        CallStep::Intro => Turn::Gather {
            prompt: "Gruss Gott and welcome to Gasthaus Quell. May I have the name for the \
                     reservation?"
                .to_string(),
            next: CallStep::CollectName,
            patch: SessionPatch::advance_to(CallStep::CollectName),
        },

        CallStep::CollectName => {
            let Some(speech) = speech else {
                return retry("I did not catch the name, please say it once more.", step);
            };

            let name = normalize_name(speech);
            Turn::Gather {
                prompt: format!("Danke, {name}. For how many guests shall we set the table?"),
                next: CallStep::CollectPartySize,
                patch: SessionPatch {
                    name: Some(name),
                    last_speech: Some(speech.to_string()),
                    step: Some(CallStep::CollectPartySize),
                    ..SessionPatch::default()
                },
            }
        }

        CallStep::CollectPartySize => {
            let Some(speech) = speech else {
                return retry("Please tell me the number of guests joining you.", step);
            };

            let Some(party_size) = extract_party_size(speech) else {
                return retry(
                    "I did not understand the party size. Please say a number, such as two or \
                     four guests.",
                    step,
                );
            };

            Turn::Gather {
                prompt: "Wonderful. Please share the date and time you wish to dine, for example \
                         this Friday at seven in the evening."
                    .to_string(),
                next: CallStep::CollectDateTime,
                patch: SessionPatch {
                    party_size: Some(party_size),
                    last_speech: Some(speech.to_string()),
                    step: Some(CallStep::CollectDateTime),
                    ..SessionPatch::default()
                },
            }
        }

        CallStep::CollectDateTime => {
            let Some(speech) = speech else {
                return retry("Kindly mention the date and time you would like to visit.", step);
            };

            let Some(dining_at) = parse_dining_time(speech, now) else {
                return retry(
                    "I was unable to understand the time. Please restate the date and time, such \
                     as Saturday the twenty sixth at seven thirty.",
                    step,
                );
            };

            Turn::Gather {
                prompt: "Do you have any dietary notes or celebration details we should prepare \
                         for? You may say none if there are no special requests."
                    .to_string(),
                next: CallStep::CollectNotes,
                patch: SessionPatch {
                    dining_at: Some(dining_at),
                    last_speech: Some(speech.to_string()),
                    step: Some(CallStep::CollectNotes),
                    ..SessionPatch::default()
                },
            }
        }

        // Empty speech is a valid answer here: it means no special requests.
        CallStep::CollectNotes => {
            let notes = normalize_notes(speech.unwrap_or(""));
            Turn::Gather {
                prompt: confirmation_prompt(session),
                next: CallStep::Confirm,
                patch: SessionPatch {
                    notes: Some(notes),
                    last_speech: speech.map(str::to_string),
                    step: Some(CallStep::Confirm),
                    ..SessionPatch::default()
                },
            }
        }

        CallStep::Confirm => {
            let lowered = speech.map(str::to_lowercase).unwrap_or_default();
            if !CONFIRMATION_WORDS.iter().any(|word| lowered.contains(word)) {
                return retry(
                    "Please say confirm or yes so we can finalise your reservation.",
                    step,
                );
            }

            Turn::Complete { messages: farewell(session), update: confirmed_update(session) }
        }

        CallStep::Completed => {
            Turn::Fail { message: "Unrecognised conversation step.".to_string() }
        }
    }
}

fn retry(prompt: &str, step: CallStep) -> Turn {
    Turn::Gather { prompt: prompt.to_string(), next: step, patch: SessionPatch::default() }
}

fn confirmation_prompt(session: &CallSession) -> String {
    let name = session.name.as_deref().unwrap_or("your party");
    let guests = session.party_size.unwrap_or(2);
    let date_speech = session
        .dining_at
        .map(format_for_speech)
        .unwrap_or_else(|| "your selected time".to_string());

    format!(
        "{name}, please say confirm to finalise your reservation for {guests} guests on \
         {date_speech}."
    )
}

fn farewell(session: &CallSession) -> Vec<String> {
    let name = session.name.as_deref().unwrap_or("Dear guest");
    let guest_count = session
        .party_size
        .map(|size| format!("{size} guests"))
        .unwrap_or_else(|| "your party".to_string());
    let spoken_date = session
        .dining_at
        .map(format_for_speech)
        .unwrap_or_else(|| "your preferred time".to_string());

    let mut messages = vec![format!(
        "Wunderbar. {name}, your reservation for {guest_count} on {spoken_date} is confirmed."
    )];
    if let Some(notes) = &session.notes {
        messages.push(format!("We have noted: {notes}."));
    }
    messages.push(
        "If you need adjustments, please call us at any time. We look forward to welcoming you \
         to Gasthaus Quell. Auf Wiedersehen!"
            .to_string(),
    );
    messages
}

fn confirmed_update(session: &CallSession) -> ReservationUpdate {
    ReservationUpdate {
        name: Some(session.name.clone()),
        party_size: Some(session.party_size),
        dining_at: Some(session.dining_at),
        notes: Some(session.notes.clone()),
        status: Some(ReservationStatus::Confirmed),
        ..ReservationUpdate::default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::Europe::Vienna;

    use crate::callflow::states::{CallStep, Turn};
    use crate::domain::reservation::{ReservationId, ReservationStatus};
    use crate::domain::session::{CallSession, CallSid, SessionPatch};

    use super::advance;

    // 2026-06-24 is a Wednesday.
    fn now() -> DateTime<Utc> {
        Vienna
            .with_ymd_and_hms(2026, 6, 24, 12, 0, 0)
            .single()
            .expect("unambiguous local time")
            .with_timezone(&Utc)
    }

    fn session() -> CallSession {
        CallSession::open(
            CallSid("CA-1".to_string()),
            ReservationId("R-1".to_string()),
            "+436601234567",
            now(),
        )
    }

    #[test]
    fn intro_prompts_for_name_unconditionally() {
        let turn = advance(CallStep::Intro, &session(), None, now());
        match turn {
            Turn::Gather { next, patch, prompt } => {
                assert_eq!(next, CallStep::CollectName);
                assert_eq!(patch, SessionPatch::advance_to(CallStep::CollectName));
                assert!(prompt.contains("Gasthaus Quell"));
            }
            other => panic!("intro should gather, got {other:?}"),
        }
    }

    #[test]
    fn empty_speech_self_loops_on_required_states() {
        let session = session();
        for step in [
            CallStep::CollectName,
            CallStep::CollectPartySize,
            CallStep::CollectDateTime,
            CallStep::Confirm,
        ] {
            match advance(step, &session, None, now()) {
                Turn::Gather { next, patch, .. } => {
                    assert_eq!(next, step, "{} must stay put", step.marker());
                    assert!(patch.is_empty(), "{} must not touch the session", step.marker());
                }
                other => panic!("{} should re-prompt, got {other:?}", step.marker()),
            }
        }
    }

    #[test]
    fn name_is_normalized_and_stored() {
        let turn = advance(CallStep::CollectName, &session(), Some("  lena!! hofbauer-smith "), now());
        match turn {
            Turn::Gather { next, patch, prompt } => {
                assert_eq!(next, CallStep::CollectPartySize);
                assert_eq!(patch.name.as_deref(), Some("Lena Hofbauer-smith"));
                assert_eq!(patch.last_speech.as_deref(), Some("  lena!! hofbauer-smith "));
                assert!(prompt.contains("Danke, Lena Hofbauer-smith"));
            }
            other => panic!("expected gather, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_party_size_re_prompts_without_advancing() {
        let turn = advance(CallStep::CollectPartySize, &session(), Some("a cosy corner"), now());
        match turn {
            Turn::Gather { next, patch, prompt } => {
                assert_eq!(next, CallStep::CollectPartySize);
                assert!(patch.is_empty());
                assert!(prompt.contains("party size"));
            }
            other => panic!("expected gather, got {other:?}"),
        }
    }

    #[test]
    fn party_size_from_number_word_advances() {
        let turn = advance(CallStep::CollectPartySize, &session(), Some("two guests"), now());
        match turn {
            Turn::Gather { next, patch, .. } => {
                assert_eq!(next, CallStep::CollectDateTime);
                assert_eq!(patch.party_size, Some(2));
            }
            other => panic!("expected gather, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_date_re_prompts_without_advancing() {
        let turn =
            advance(CallStep::CollectDateTime, &session(), Some("whenever suits you"), now());
        match turn {
            Turn::Gather { next, patch, .. } => {
                assert_eq!(next, CallStep::CollectDateTime);
                assert!(patch.is_empty());
            }
            other => panic!("expected gather, got {other:?}"),
        }
    }

    #[test]
    fn declined_notes_are_stored_as_absent_and_flow_advances() {
        let mut session = session();
        session.name = Some("Lena Hofbauer".to_string());
        session.party_size = Some(2);

        let turn = advance(CallStep::CollectNotes, &session, Some("none"), now());
        match turn {
            Turn::Gather { next, patch, prompt } => {
                assert_eq!(next, CallStep::Confirm);
                assert_eq!(patch.notes, Some(None));
                assert!(prompt.contains("Lena Hofbauer"));
                assert!(prompt.contains("2 guests"));
            }
            other => panic!("expected gather, got {other:?}"),
        }
    }

    #[test]
    fn missing_notes_speech_counts_as_no_notes() {
        let turn = advance(CallStep::CollectNotes, &session(), None, now());
        match turn {
            Turn::Gather { next, patch, .. } => {
                assert_eq!(next, CallStep::Confirm);
                assert_eq!(patch.notes, Some(None));
                assert_eq!(patch.last_speech, None);
            }
            other => panic!("expected gather, got {other:?}"),
        }
    }

    #[test]
    fn hesitation_at_confirm_re_prompts() {
        let turn = advance(CallStep::Confirm, &session(), Some("hmm let me think"), now());
        match turn {
            Turn::Gather { next, patch, .. } => {
                assert_eq!(next, CallStep::Confirm);
                assert!(patch.is_empty());
            }
            other => panic!("expected gather, got {other:?}"),
        }
    }

    #[test]
    fn confirmation_completes_with_accumulated_fields() {
        let mut session = session();
        session.name = Some("Lena Hofbauer".to_string());
        session.party_size = Some(2);
        session.dining_at =
            Some(Vienna.with_ymd_and_hms(2026, 6, 26, 19, 0, 0).unwrap().with_timezone(&Utc));
        session.notes = Some("birthday dinner".to_string());

        let turn = advance(CallStep::Confirm, &session, Some("yes, confirm please"), now());
        match turn {
            Turn::Complete { messages, update } => {
                assert_eq!(update.status, Some(ReservationStatus::Confirmed));
                assert_eq!(update.name, Some(Some("Lena Hofbauer".to_string())));
                assert_eq!(update.party_size, Some(Some(2)));
                assert_eq!(update.notes, Some(Some("birthday dinner".to_string())));
                assert!(messages[0].contains("2 guests"));
                assert!(messages[0].contains("Friday 26 June 2026 at 19:00"));
                assert!(messages.iter().any(|line| line.contains("We have noted: birthday dinner.")));
                assert!(messages.last().expect("farewell").contains("Auf Wiedersehen"));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn german_confirmation_words_also_complete() {
        let mut session = session();
        session.party_size = Some(4);

        for word in ["ja", "passt schon", "stimmt genau"] {
            let turn = advance(CallStep::Confirm, &session, Some(word), now());
            assert!(matches!(turn, Turn::Complete { .. }), "{word} should confirm");
        }
    }

    #[test]
    fn completion_falls_back_politely_when_fields_are_missing() {
        let turn = advance(CallStep::Confirm, &session(), Some("confirm"), now());
        match turn {
            Turn::Complete { messages, update } => {
                assert!(messages[0].contains("Dear guest"));
                assert!(messages[0].contains("your party"));
                assert!(messages[0].contains("your preferred time"));
                assert_eq!(update.name, Some(None));
                assert_eq!(update.status, Some(ReservationStatus::Confirmed));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn completed_step_is_terminal() {
        let turn = advance(CallStep::Completed, &session(), Some("hello?"), now());
        assert!(matches!(turn, Turn::Fail { .. }));
    }

    #[test]
    fn full_walk_reaches_confirmation() {
        let mut session = session();
        let mut step = CallStep::Intro;

        let script: [Option<&str>; 5] = [
            None,
            Some("Lena Hofbauer"),
            Some("two"),
            Some("this Friday at seven pm"),
            Some("none"),
        ];
        for speech in script {
            match advance(step, &session, speech, now()) {
                Turn::Gather { next, patch, .. } => {
                    session.apply(patch, now());
                    step = next;
                }
                other => panic!("walk should keep gathering, got {other:?}"),
            }
        }
        assert_eq!(step, CallStep::Confirm);
        assert_eq!(session.name.as_deref(), Some("Lena Hofbauer"));
        assert_eq!(session.party_size, Some(2));
        assert_eq!(session.notes, None);
        assert!(session.dining_at.is_some());

        let turn = advance(step, &session, Some("yes confirm"), now());
        assert!(matches!(turn, Turn::Complete { .. }));
    }
}
