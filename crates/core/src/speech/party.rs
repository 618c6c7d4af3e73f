/// Largest party accepted from a spoken digit run.
const MAX_PARTY_SIZE: u32 = 20;

/// Spoken number words recognised for the party size. Scanned in table
/// order; the first word present in the utterance wins.
const NUMBER_WORDS: [(&str, u32); 12] = [
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
];

/// Pulls a party size out of a transcribed utterance. A contiguous digit run
/// is preferred and must land in 1..=20; otherwise the utterance is scanned
/// for a number word. Tokens keep internal hyphens, so "twenty-five" matches
/// neither path and yields nothing.
pub fn extract_party_size(speech: &str) -> Option<u32> {
    if let Some(run) = first_digit_run(speech) {
        if let Ok(value) = run.parse::<u32>() {
            if (1..=MAX_PARTY_SIZE).contains(&value) {
                return Some(value);
            }
        }
    }

    let lowered = speech.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split_whitespace()
        .map(|token| token.trim_matches(|character: char| !character.is_ascii_alphabetic()))
        .collect();

    for (word, value) in NUMBER_WORDS {
        if tokens.iter().any(|token| *token == word) {
            return Some(value);
        }
    }

    None
}

fn first_digit_run(speech: &str) -> Option<&str> {
    let start = speech.find(|character: char| character.is_ascii_digit())?;
    let run = &speech[start..];
    let end =
        run.find(|character: char| !character.is_ascii_digit()).unwrap_or(run.len());
    Some(&run[..end])
}

#[cfg(test)]
mod tests {
    use super::extract_party_size;

    #[test]
    fn number_word_is_recognised() {
        assert_eq!(extract_party_size("two guests"), Some(2));
        assert_eq!(extract_party_size("a table for seven, please"), Some(7));
    }

    #[test]
    fn digit_run_is_preferred() {
        assert_eq!(extract_party_size("we are 15"), Some(15));
        assert_eq!(extract_party_size("15 people, maybe sixteen"), Some(15));
    }

    #[test]
    fn zero_is_not_a_party() {
        assert_eq!(extract_party_size("zero"), None);
        assert_eq!(extract_party_size("0"), None);
    }

    #[test]
    fn out_of_range_digits_are_rejected() {
        assert_eq!(extract_party_size("25"), None);
        assert_eq!(extract_party_size("we are 21 people"), None);
    }

    #[test]
    fn hyphenated_compound_words_do_not_match() {
        assert_eq!(extract_party_size("twenty-five"), None);
    }

    #[test]
    fn word_table_order_decides_ties() {
        // "one" precedes "four" in the table even though "four" comes first
        // in the utterance.
        assert_eq!(extract_party_size("four adults and one child"), Some(1));
    }

    #[test]
    fn unusable_speech_yields_nothing() {
        assert_eq!(extract_party_size("a cosy table please"), None);
        assert_eq!(extract_party_size(""), None);
    }
}
