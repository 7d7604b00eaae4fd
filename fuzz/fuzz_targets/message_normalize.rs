//! Fuzz target for envelope normalization.
//!
//! Anything that decodes must also normalize without panicking; the only
//! acceptable failure is the addressing-conflict error.

#![no_main]

use chrono::DateTime;
use libfuzzer_sys::fuzz_target;
use parlor_proto::{Envelope, Message};

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else { return };
    let Ok(envelope) = Envelope::decode(body) else { return };

    let fallback = DateTime::from_timestamp(0, 0).unwrap_or_default();
    let _ = Message::from_envelope(&envelope, "fuzz".to_string(), fallback);
});
