pub mod callflow;
pub mod config;
pub mod domain;
pub mod errors;
pub mod speech;

pub use callflow::{advance, CallStep, Turn};
pub use domain::reservation::{
    NewReservation, Reservation, ReservationId, ReservationSource, ReservationStatus,
    ReservationUpdate,
};
pub use domain::session::{CallSession, CallSid, SessionPatch};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use speech::{
    extract_party_size, format_for_speech, normalize_name, normalize_notes, parse_dining_time,
};
