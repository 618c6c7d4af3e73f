/// Phrases that decline to leave notes, matched as substrings of the
/// lowercased utterance. Substring matching means "nothing in particular"
/// also declines (it contains "no"); that behaviour is load-bearing for
/// callers who answer tersely and is kept as-is.
const DECLINED_PHRASES: [&str; 4] = ["no", "none", "no notes", "no special requests"];

/// Empty or declining utterances become absent notes; anything else is kept
/// verbatim.
pub fn normalize_notes(speech: &str) -> Option<String> {
    if speech.is_empty() {
        return None;
    }

    let lowered = speech.to_lowercase();
    if DECLINED_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return None;
    }

    Some(speech.to_string())
}
