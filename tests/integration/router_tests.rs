//! Integration tests for the HTTP control surface: request in, response
//! and light state out.

use crate::mock_hw::{MockHardware, MockNvs, RecordingSink};

use floodlight::app::commands::SystemAction;
use floodlight::app::service::LightService;
use floodlight::config::LightConfig;
use floodlight::control::request::ContentType;
use floodlight::control::{ControlRequest, Method, Routed, dispatch};
use floodlight::prefs::{PREFS_KEY, PREFS_NAMESPACE, Preferences, StartupBehavior};
use serde_json::{Value, json};

const MAC: [u8; 6] = [0xA4, 0xCF, 0x12, 0x0B, 0x3C, 0xD1];

struct Rig {
    svc: LightService,
    hw: MockHardware,
    nvs: MockNvs,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        Self {
            svc: LightService::new(LightConfig::default(), Preferences::default(), MAC),
            hw: MockHardware::new(),
            nvs: MockNvs::new(),
            sink: RecordingSink::new(),
        }
    }

    fn call(&mut self, method: Method, uri: &str, body: &str) -> Routed {
        let req = ControlRequest::new(method, uri, body);
        dispatch(&mut self.svc, &req, &mut self.nvs, &mut self.sink)
    }

    fn get(&mut self, uri: &str) -> Routed {
        self.call(Method::Get, uri, "")
    }

    fn put_state(&mut self, body: &str) -> Routed {
        self.call(Method::Put, "/state", body)
    }

    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.svc.tick(&mut self.hw, &mut self.sink);
        }
    }
}

fn body_json(r: &Routed) -> Value {
    assert_eq!(r.response.content_type, ContentType::Json);
    serde_json::from_str(&r.response.body).unwrap()
}

// ── /detect ───────────────────────────────────────────────────

#[test]
fn detect_describes_the_device() {
    let mut rig = Rig::new();
    let r = rig.get("/detect");
    assert_eq!(r.response.status, 200);

    let v = body_json(&r);
    assert_eq!(v["name"], "Dimmable LED Floodlight");
    assert_eq!(v["lights"], 1);
    assert_eq!(v["protocol"], "native_multi");
    assert_eq!(v["modelid"], "LWB010");
    assert_eq!(v["type"], "dimmable_light");
    assert_eq!(v["mac"], "A4:CF:12:0B:3C:D1");
    assert!((v["version"].as_f64().unwrap() - 2.1).abs() < 1e-3);
}

// ── /state ────────────────────────────────────────────────────

#[test]
fn put_then_get_reports_target() {
    let mut rig = Rig::new();

    let r = rig.put_state(r#"{"1":{"on":true,"bri":200,"transitiontime":10}}"#);
    assert_eq!(r.response.status, 200);
    assert_eq!(body_json(&r), json!({"1": {"on": true, "bri": 200, "transitiontime": 10}}));

    // target is reported while the ramp is still at the start
    let r = rig.get("/state?light=1");
    assert_eq!(r.response.status, 200);
    assert_eq!(r.response.body, r#"{"on":true,"bri":200}"#);

    rig.ticks(330);
    assert_eq!(rig.svc.engine().light(0).unwrap().current(), 200.0);
    assert_eq!(rig.hw.led_duty(0), rig.svc.engine().duty(0));
}

#[test]
fn echo_drops_unknown_fields() {
    let mut rig = Rig::new();
    let r = rig.put_state(r#"{"1":{"on":true,"hue":12000}}"#);
    assert_eq!(r.response.status, 200);
    assert_eq!(body_json(&r), json!({"1": {"on": true}}));
}

#[test]
fn bri_inc_clamps_into_protocol_range() {
    let mut rig = Rig::new();
    rig.put_state(r#"{"1":{"bri":250}}"#);
    rig.put_state(r#"{"1":{"bri_inc":20}}"#);
    assert_eq!(rig.svc.get_state(0).unwrap().bri, 255);

    rig.put_state(r#"{"1":{"bri_inc":-300}}"#);
    assert_eq!(rig.svc.get_state(0).unwrap().bri, 1);
}

#[test]
fn malformed_put_is_rejected_without_mutation() {
    let mut rig = Rig::new();
    let r = rig.put_state("{bad");
    assert_eq!(r.response.status, 400);
    assert_eq!(r.response.body, "FAIL. {bad");
    assert_eq!(rig.nvs.writes, 0);
    assert!(!rig.svc.get_state(0).unwrap().on);
}

#[test]
fn out_of_range_light_rejects_whole_request() {
    let mut rig = Rig::new();
    let r = rig.put_state(r#"{"1":{"on":true},"2":{"on":true}}"#);
    assert_eq!(r.response.status, 400);
    assert!(r.response.body.starts_with("FAIL. "));
    assert!(!rig.svc.get_state(0).unwrap().on, "valid entry must not be applied");
    assert_eq!(rig.nvs.writes, 0);
}

#[test]
fn get_state_validates_light_argument() {
    let mut rig = Rig::new();
    for uri in ["/state", "/state?light=0", "/state?light=2", "/state?light=x"] {
        assert_eq!(rig.get(uri).response.status, 400, "{uri}");
    }
}

#[test]
fn storage_failure_answers_500() {
    let mut rig = Rig::new();
    rig.nvs.fail_writes = true;
    let r = rig.put_state(r#"{"1":{"on":true}}"#);
    assert_eq!(r.response.status, 500);
    assert!(!rig.svc.get_state(0).unwrap().on);
}

// ── / ────────────────────────────────────────────────────────

#[test]
fn root_reports_status() {
    let mut rig = Rig::new();
    rig.hw.temperature = Some(28.5);
    rig.ticks(1);

    let r = rig.get("/");
    assert_eq!(r.response.status, 200);
    assert_eq!(r.action, None);
    let v = body_json(&r);
    assert_eq!(v["on"], false);
    assert_eq!(v["bri"], 144);
    assert_eq!(v["startup"], 0);
    assert_eq!(v["scene"], 0);
    assert_eq!(v["led_duty"], 0);
    assert_eq!(v["fan_duty"], 500);
    assert!((v["led_temp"].as_f64().unwrap() - 28.5).abs() < 1e-3);
}

#[test]
fn root_scene_sets_target_and_persists() {
    let mut rig = Rig::new();
    let r = rig.get("/?scene=2");
    assert_eq!(body_json(&r)["scene"], 2);
    assert_eq!(rig.svc.get_state(0).unwrap().bri, 1);
    assert_eq!(rig.nvs.get(PREFS_NAMESPACE, PREFS_KEY), Some(&[0u8, 0, 2][..]));
}

#[test]
fn root_unknown_scene_is_ignored() {
    let mut rig = Rig::new();
    let r = rig.get("/?scene=9");
    assert_eq!(r.response.status, 200);
    assert_eq!(rig.svc.get_state(0).unwrap().bri, 144);
    assert_eq!(rig.svc.prefs().scene, 0);
    assert_eq!(rig.nvs.writes, 0);
}

#[test]
fn root_bri_wins_over_scene_and_is_unscaled() {
    let mut rig = Rig::new();
    rig.get("/?scene=1&bri=50");
    assert_eq!(rig.svc.get_state(0).unwrap().bri, 50);
    assert_eq!(rig.svc.prefs().scene, 0);

    rig.get("/?scene=1&bri=0");
    assert_eq!(rig.svc.get_state(0).unwrap().bri, 1);
}

#[test]
fn root_power_and_startup() {
    let mut rig = Rig::new();
    let r = rig.get("/?startup=1&on=true");
    let v = body_json(&r);
    assert_eq!(v["on"], true);
    assert_eq!(v["startup"], 1);
    assert_eq!(rig.svc.prefs().startup, StartupBehavior::ForceOn);
    // force-on does not track last power
    assert!(!rig.svc.prefs().last_on);

    assert_eq!(rig.get("/?startup=7").response.status, 400);
    assert_eq!(rig.svc.prefs().startup, StartupBehavior::ForceOn);
}

#[test]
fn root_alert_flashes_then_ramps_back() {
    let mut rig = Rig::new();
    rig.get("/?alert=1");
    assert_eq!(rig.svc.engine().light(0).unwrap().current(), 255.0);

    rig.ticks(1);
    assert!(rig.hw.led_duty(0) > 0);
    rig.ticks(131);
    assert_eq!(rig.svc.engine().light(0).unwrap().current(), 0.0);
    assert_eq!(rig.hw.led_duty(0), 0);
}

#[test]
fn root_status_read_leaves_ramp_in_flight() {
    let mut rig = Rig::new();
    rig.put_state(r#"{"1":{"on":true,"bri":200,"transitiontime":10}}"#);
    rig.ticks(100);
    let step = rig.svc.engine().light(0).unwrap().step();

    rig.get("/");
    assert_eq!(rig.svc.engine().light(0).unwrap().step(), step);
    rig.get("/?startup=2");
    assert_eq!(rig.svc.engine().light(0).unwrap().step(), step);

    // the requested 330-tick ramp still lands on time
    rig.ticks(230);
    assert_eq!(rig.svc.engine().light(0).unwrap().current(), 200.0);
}

#[test]
fn root_reset_flag_requests_restart() {
    let mut rig = Rig::new();
    assert_eq!(rig.get("/?reset=1").action, Some(SystemAction::Restart));
}

// ── System routes ─────────────────────────────────────────────

#[test]
fn reset_and_factory_routes() {
    let mut rig = Rig::new();

    let r = rig.get("/reset");
    assert_eq!((r.response.status, r.response.body.as_str()), (200, "reset"));
    assert_eq!(r.action, Some(SystemAction::Restart));

    let r = rig.get("/factory");
    assert_eq!(r.response.status, 200);
    assert_eq!(r.action, Some(SystemAction::FactoryReset));
}

#[test]
fn unknown_route_is_404_with_details() {
    let mut rig = Rig::new();
    let r = rig.call(Method::Delete, "/lights?id=3", "");
    assert_eq!(r.response.status, 404);
    assert_eq!(r.response.content_type, ContentType::Text);
    assert_eq!(
        r.response.body,
        "File Not Found\n\nURI: /lights\nMethod: DELETE\nArguments: 1\n id: 3\n"
    );
}
