pub mod client;
pub mod twiml;

pub use client::{CallInitiator, NoopCallInitiator, PlacedCall, TelephonyError, TwilioCallClient};
pub use twiml::VoiceResponse;
