use chrono::{DateTime, Utc};
use chrono_tz::Europe::Vienna;

/// Renders an instant the way it is spoken in the confirmation: full date
/// plus short 24-hour time, in the restaurant's own timezone.
pub fn format_for_speech(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Vienna).format("%A %-d %B %Y at %H:%M").to_string()
}
