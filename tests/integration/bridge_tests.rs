//! HTTP task ↔ control loop hand-off through the [`RequestBridge`].
//!
//! A client thread plays the httpd handler; the test thread plays the
//! control loop.  Each test owns its bridge so they can run in parallel.

use std::thread;
use std::time::Duration;

use crate::mock_hw::{MockHardware, MockNvs, RecordingSink};

use floodlight::app::service::LightService;
use floodlight::config::LightConfig;
use floodlight::control::bridge::RESPONSE_TIMEOUT_MS;
use floodlight::control::{ControlRequest, HttpResponse, Method, RequestBridge, dispatch};
use floodlight::prefs::Preferences;

fn real_sleep(ms: u32) {
    thread::sleep(Duration::from_millis(u64::from(ms)));
}

/// Serve `bridge` until `client` finishes, ticking between drains.
fn serve(
    bridge: &'static RequestBridge,
    svc: &mut LightService,
    client: thread::JoinHandle<Vec<HttpResponse>>,
) -> Vec<HttpResponse> {
    let mut hw = MockHardware::new();
    let mut nvs = MockNvs::new();
    let mut sink = RecordingSink::new();
    while !client.is_finished() {
        while let Some(req) = bridge.next_request() {
            let routed = dispatch(svc, &req, &mut nvs, &mut sink);
            bridge.respond(req.seq, routed.response);
        }
        svc.tick(&mut hw, &mut sink);
        thread::sleep(Duration::from_millis(1));
    }
    client.join().unwrap()
}

fn light_service() -> LightService {
    LightService::new(LightConfig::default(), Preferences::default(), [0; 6])
}

#[test]
fn requests_round_trip_through_the_loop() {
    static BRIDGE: RequestBridge = RequestBridge::new();
    let mut svc = light_service();

    let client = thread::spawn(|| {
        let put = ControlRequest::new(Method::Put, "/state", r#"{"1":{"on":true,"bri":90}}"#);
        let get = ControlRequest::new(Method::Get, "/state?light=1", "");
        vec![
            BRIDGE.round_trip(put, RESPONSE_TIMEOUT_MS, real_sleep),
            BRIDGE.round_trip(get, RESPONSE_TIMEOUT_MS, real_sleep),
        ]
    });

    let responses = serve(&BRIDGE, &mut svc, client);
    assert_eq!(responses[0].status, 200);
    assert_eq!(responses[1].body, r#"{"on":true,"bri":90}"#);
    assert!(svc.get_state(0).unwrap().on);
}

#[test]
fn unserved_request_times_out_with_503() {
    static BRIDGE: RequestBridge = RequestBridge::new();

    let resp = BRIDGE.round_trip(ControlRequest::new(Method::Get, "/detect", ""), 30, real_sleep);
    assert_eq!(resp.status, 503);

    // the loop still sees the stale request; its late answer is discarded
    let req = BRIDGE.next_request().unwrap();
    BRIDGE.respond(req.seq, HttpResponse::text(200, "late"));

    let mut svc = light_service();
    let client = thread::spawn(|| vec![BRIDGE.round_trip(ControlRequest::new(Method::Get, "/detect", ""), RESPONSE_TIMEOUT_MS, real_sleep)]);
    let responses = serve(&BRIDGE, &mut svc, client);
    assert_eq!(responses[0].status, 200);
    assert_ne!(responses[0].body, "late");
}
