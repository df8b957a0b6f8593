//! Fuzz the `PUT /state` body parser.
//!
//! Any byte sequence must either parse into one change per entry or be
//! rejected; never panic.

#![no_main]

use floodlight::control::payload::parse_state_update;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok((doc, changes)) = parse_state_update(body) {
        assert_eq!(doc.len(), changes.len());
        // the echo must serialize back
        let _ = serde_json::to_string(&doc);
    }
});
