//! Fuzz target for Envelope::decode
//!
//! The decoder faces whatever the broker relays, so it must never panic:
//! all invalid inputs return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use parlor_proto::Envelope;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data) {
        let _ = Envelope::decode(body);
    }
});
