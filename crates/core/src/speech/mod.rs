//! Pure normalizers for transcribed caller speech. All functions are
//! deterministic given their input; date resolution additionally takes the
//! reference instant as a parameter.

pub mod datetime;
pub mod format;
pub mod name;
pub mod notes;
pub mod party;

pub use datetime::parse_dining_time;
pub use format::format_for_speech;
pub use name::normalize_name;
pub use notes::normalize_notes;
pub use party::extract_party_size;
