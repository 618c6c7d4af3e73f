pub mod controller;

pub use controller::{
    voice_script_url, BeginCall, CallPlacement, ConciergeController, ConciergeError,
    VoiceCallback, VoiceReply,
};
