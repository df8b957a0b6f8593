//! Floodlight firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter    EspSystem      │
//! │  (Sensor+Actuator) (EventSink)    (Config+NVS)  (SystemPort)   │
//! │  WifiAdapter       http_server ──▶ RequestBridge               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              LightService (pure logic)                 │    │
//! │  │  TransitionEngine · DutyMapper · ThermalController     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::{Duration, Instant};

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use floodlight::adapters::device_id;
use floodlight::adapters::hardware::HardwareAdapter;
use floodlight::adapters::http_server;
use floodlight::adapters::log_sink::LogEventSink;
use floodlight::adapters::nvs::NvsAdapter;
use floodlight::adapters::system::EspSystem;
use floodlight::adapters::wifi::{Credentials, WifiAdapter};
use floodlight::app::events::AppEvent;
use floodlight::app::ports::{ConfigPort, EventSink, SystemPort};
use floodlight::app::service::LightService;
use floodlight::config::LightConfig;
use floodlight::control::{self, RequestBridge};
use floodlight::drivers::{hw_init, pwm::PwmChannel};
use floodlight::error::Error;
use floodlight::prefs::{self, Preferences};
use floodlight::sensors::Thermistor;
use floodlight::ota;

/// Pause between answering `/reset` or `/factory` and acting on it.
const ACTION_DELAY_MS: u32 = 1000;

static BRIDGE: RequestBridge = RequestBridge::new();

/// Open NVS and read config and preferences.  Unreadable entries fall back
/// to defaults; only a dead NVS partition is fatal.
fn load_settings() -> floodlight::error::Result<(NvsAdapter, LightConfig, Preferences)> {
    let nvs = NvsAdapter::new()?;
    let config = nvs.load_or_seed().unwrap_or_else(|e| {
        warn!("NVS config load failed ({}), using defaults", e);
        LightConfig::default()
    });
    let prefs = prefs::load(&nvs).unwrap_or_else(|e| {
        warn!("preferences unreadable ({}), using defaults", e);
        Preferences::default()
    });
    Ok((nvs, config, prefs))
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Floodlight v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    ota::check_rollback();

    // ── 2. Config and preferences ─────────────────────────────
    let (mut nvs, config, prefs) = load_settings()?;

    // ── 3. Hardware ───────────────────────────────────────────
    hw_init::init_peripherals(&config).map_err(Error::from)?;
    let bits = u32::from(config.pwm_resolution_bits);
    let mut hw = HardwareAdapter::new(
        Thermistor::new(),
        PwmChannel::new(hw_init::LEDC_CH_LED, bits),
        PwmChannel::new(hw_init::LEDC_CH_FAN, bits),
    );
    let mut sys = EspSystem;
    let mut log_sink = LogEventSink::new();

    let mac = device_id::read_mac();
    info!("Device: {}", device_id::hostname(&mac));

    // ── 4. Light service and boot sequence ────────────────────
    let mut light = LightService::new(config.clone(), prefs, mac);
    light.startup_blink(&mut hw, &mut sys);
    light.boot(&mut hw, &mut log_sink);

    // ── 5. Networking ─────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let mut wifi = WifiAdapter::new(peripherals.modem, sys_loop, nvs_partition)?;
    let timeout = Duration::from_secs(u64::from(config.wifi_connect_timeout_secs));
    if let Err(e) = wifi.connect(Credentials::from_build_env().as_ref(), timeout) {
        error!("WiFi unavailable ({}), restarting", e);
        sys.restart();
    }
    light.connected_flash(&mut hw, &mut sys);

    let _server = http_server::start(&BRIDGE, config.update_token.as_str())?;

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    let telemetry_every = Duration::from_secs(u64::from(config.telemetry_interval_secs));
    let mut last_telemetry = Instant::now();

    loop {
        while let Some(req) = BRIDGE.next_request() {
            let routed = control::dispatch(&mut light, &req, &mut nvs, &mut log_sink);
            BRIDGE.respond(req.seq, routed.response);
            if let Some(action) = routed.action {
                sys.sleep_ms(ACTION_DELAY_MS);
                light.execute(action, &mut hw, &mut nvs, &mut sys, &mut log_sink);
            }
        }

        let moving = light.tick(&mut hw, &mut log_sink);

        if last_telemetry.elapsed() >= telemetry_every {
            log_sink.emit(&AppEvent::Telemetry(light.telemetry()));
            last_telemetry = Instant::now();
        }

        let pause = if moving { config.transition_pause_ms } else { config.loop_interval_ms };
        sys.sleep_ms(pause);
    }
}
