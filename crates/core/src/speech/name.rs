/// Cleans a transcribed name for storage and for speaking back to the
/// caller: anything outside ASCII letters, apostrophe and hyphen becomes a
/// space, runs of whitespace collapse, and each space-separated segment is
/// title-cased (first letter upper, remainder lower). Hyphenated segments
/// keep a single leading capital.
pub fn normalize_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|character| {
            if character.is_ascii_alphabetic() || matches!(character, '\'' | '-') {
                character
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().map(capitalize_segment).collect::<Vec<_>>().join(" ")
}

fn capitalize_segment(segment: &str) -> String {
    let mut characters = segment.chars();
    match characters.next() {
        Some(first) => {
            first.to_ascii_uppercase().to_string() + &characters.as_str().to_ascii_lowercase()
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_name;

    #[test]
    fn strips_punctuation_and_title_cases_segments() {
        assert_eq!(normalize_name("  lena!! hofbauer-smith "), "Lena Hofbauer-smith");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize_name("anna   MARIA    gruber"), "Anna Maria Gruber");
    }

    #[test]
    fn keeps_apostrophes() {
        assert_eq!(normalize_name("sean o'brien"), "Sean O'brien");
    }

    #[test]
    fn digits_and_symbols_become_separators() {
        assert_eq!(normalize_name("lena2hofbauer"), "Lena Hofbauer");
    }

    #[test]
    fn empty_and_symbol_only_input_normalizes_to_empty() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("!!! ???"), "");
    }
}
