//! Fuzz URI splitting, query decoding, and the `/` form parser.

#![no_main]

use floodlight::control::payload::{parse_light_arg, parse_root_query};
use floodlight::control::request::{ControlRequest, Method};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let uri = String::from_utf8_lossy(data);
    let req = ControlRequest::new(Method::Get, &uri, "");
    let _ = parse_root_query(&req);
    let _ = parse_light_arg(&req);
});
