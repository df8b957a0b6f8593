//! Light service: the hexagonal core.
//!
//! [`LightService`] owns every light, the thermal controller, and the
//! persisted preferences.  It exposes data-in / data-out operations for the
//! control surface and a per-tick entry point for the control loop.  All I/O
//! flows through port traits injected at call sites.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │         LightService          │
//! ActuatorPort ◀──│ Transition · Thermal · Prefs  │──▶ StoragePort
//!                 └──────────────────────────────┘
//! ```

use core::fmt::Write as _;

use log::{error, info, warn};
use serde::Serialize;

use crate::config::LightConfig;
use crate::error::ControlError;
use crate::light::{ScenePreset, TransitionEngine, apply_scene};
use crate::prefs::{self, Preferences};
use crate::thermal::ThermalController;

use super::commands::{RootAction, RootCommand, StateChange, SystemAction};
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, EventSink, SensorPort, StoragePort, SystemPort};

pub const PROTOCOL: &str = "native_multi";
pub const MODEL_ID: &str = "LWB010";
pub const LIGHT_TYPE: &str = "dimmable_light";
pub const LIGHT_VERSION: f32 = 2.1;

/// Fine-scale value driven during indicator blinks.
pub const INDICATOR_LEVEL: u32 = 50;
pub const STARTUP_BLINKS: u8 = 5;
pub const FACTORY_RESET_BLINKS: u8 = 5;
pub const BLINK_INTERVAL_MS: u32 = 500;

// ───────────────────────────────────────────────────────────────
// Response documents
// ───────────────────────────────────────────────────────────────

/// `/detect` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceDescriptor {
    pub name: heapless::String<32>,
    pub lights: u8,
    pub protocol: &'static str,
    pub modelid: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mac: heapless::String<17>,
    pub version: f32,
}

/// `GET /state` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LightState {
    pub on: bool,
    pub bri: u8,
}

/// `/` body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusReport {
    pub on: bool,
    pub bri: u8,
    pub startup: u8,
    pub scene: u8,
    pub led_temp: Option<f32>,
    pub led_duty: u32,
    pub fan_duty: u32,
}

// ───────────────────────────────────────────────────────────────
// LightService
// ───────────────────────────────────────────────────────────────

pub struct LightService {
    config: LightConfig,
    engine: TransitionEngine,
    thermal: ThermalController,
    prefs: Preferences,
    mac: [u8; 6],
    temperature: Option<f32>,
    fault_flags: u8,
    led_inhibited: bool,
    tick_count: u64,
}

impl LightService {
    /// Build the service from config and the preferences read at boot.
    ///
    /// Every light is off and dark, aiming at the stored scene's brightness
    /// (Relax if the stored id is unknown).
    pub fn new(config: LightConfig, prefs: Preferences, mac: [u8; 6]) -> Self {
        let count = usize::from(config.light_count.clamp(1, crate::pins::MAX_LIGHTS));
        let mut engine = TransitionEngine::new(
            count,
            ScenePreset::Relax.brightness(),
            config.duty_limits(),
            config.ticks_per_unit,
            config.default_transition_units,
        );
        for index in 0..count {
            if let Some(light) = engine.light_mut(index) {
                if apply_scene(light, prefs.scene).is_none() {
                    warn!("stored scene {} unknown, keeping default", prefs.scene);
                }
            }
        }
        let thermal = ThermalController::new(&config);

        Self {
            config,
            engine,
            thermal,
            prefs,
            mac,
            temperature: None,
            fault_flags: 0,
            led_inhibited: false,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Apply the startup policy.  If it powers the light on, ramp up over
    /// the boot ramp and settle synchronously.  Returns the power state.
    pub fn boot(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) -> bool {
        let power_on = self.prefs.boot_power_on();
        if power_on {
            let ramp = self.config.boot_ramp_ticks;
            for index in 0..self.engine.len() {
                if let Some(light) = self.engine.light_mut(index) {
                    light.set_on(true);
                    light.start_ramp(ramp);
                }
            }
            for _ in 0..self.config.boot_settle_ticks {
                if !self.engine.tick(|ch, duty| hw.set_led_duty(ch, duty)) {
                    break;
                }
            }
        }
        info!(
            "LightService started: {} light(s), power {}",
            self.engine.len(),
            if power_on { "on" } else { "off" }
        );
        sink.emit(&AppEvent::Started {
            lights: self.engine.len(),
            power_on,
        });
        power_on
    }

    /// Blink every LED channel `count` times: `interval` dark, then twice
    /// that at the indicator level.  Leaves the LEDs dark.
    pub fn blink(&mut self, hw: &mut impl ActuatorPort, sys: &mut impl SystemPort, count: u8, interval_ms: u32) {
        let level = self.engine.limits().map(INDICATOR_LEVEL);
        for _ in 0..count {
            self.write_all_leds(hw, 0);
            sys.sleep_ms(interval_ms);
            self.write_all_leds(hw, level);
            sys.sleep_ms(interval_ms.saturating_mul(2));
        }
        self.write_all_leds(hw, 0);
    }

    /// Power-on indicator shown before the startup policy runs.
    pub fn startup_blink(&mut self, hw: &mut impl ActuatorPort, sys: &mut impl SystemPort) {
        self.blink(hw, sys, STARTUP_BLINKS, BLINK_INTERVAL_MS);
    }

    /// Short flash once networking is up, only while the first light is off.
    pub fn connected_flash(&mut self, hw: &mut impl ActuatorPort, sys: &mut impl SystemPort) {
        if self.engine.light(0).is_some_and(|l| l.is_on()) {
            return;
        }
        let level = self.engine.limits().map(INDICATOR_LEVEL);
        hw.set_led_duty(0, level);
        sys.sleep_ms(BLINK_INTERVAL_MS);
        hw.set_led_duty(0, 0);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One control cycle: ramps → temperature → thermal decision → outputs.
    ///
    /// Returns `true` if any light moved this tick.
    pub fn tick(&mut self, hw: &mut (impl SensorPort + ActuatorPort), sink: &mut impl EventSink) -> bool {
        self.tick_count += 1;

        // 1. Ramps (outputs held dark while inhibited)
        let inhibited = self.led_inhibited;
        let moved = self.engine.tick(|ch, duty| {
            if !inhibited {
                hw.set_led_duty(ch, duty);
            }
        });

        // 2. Temperature and thermal decision
        let sample = hw.read_temperature();
        self.temperature = sample;
        let prev_fan = self.thermal.fan().duty;
        let decision = self.thermal.update(sample);

        if decision.faults != self.fault_flags {
            if decision.faults != 0 {
                warn!("Thermal fault! flags=0b{:08b}", decision.faults);
                sink.emit(&AppEvent::ThermalFault(decision.faults));
            } else {
                sink.emit(&AppEvent::ThermalFaultCleared);
            }
            self.fault_flags = decision.faults;
        }

        // 3. Fan
        hw.set_fan_duty(decision.fan_duty);
        if decision.fan_duty != prev_fan {
            sink.emit(&AppEvent::FanDutyChanged {
                from: prev_fan,
                to: decision.fan_duty,
            });
        }

        // 4. LED inhibit edges
        if decision.inhibit_led && !self.led_inhibited {
            self.led_inhibited = true;
            self.write_all_leds(hw, 0);
        } else if !decision.inhibit_led && self.led_inhibited {
            self.led_inhibited = false;
            self.engine.refresh(|ch, duty| hw.set_led_duty(ch, duty));
        }

        moved
    }

    // ── Control surface operations ────────────────────────────

    pub fn detect(&self) -> DeviceDescriptor {
        let mut mac = heapless::String::new();
        for (i, b) in self.mac.iter().enumerate() {
            let sep = if i == 0 { "" } else { ":" };
            let _ = write!(mac, "{sep}{b:02X}");
        }
        DeviceDescriptor {
            name: self.config.light_name.clone(),
            lights: self.engine.len() as u8,
            protocol: PROTOCOL,
            modelid: MODEL_ID,
            kind: LIGHT_TYPE,
            mac,
            version: LIGHT_VERSION,
        }
    }

    /// Requested state of light `index` (0-based).
    pub fn get_state(&self, index: usize) -> Result<LightState, ControlError> {
        let light = self
            .engine
            .light(index)
            .ok_or(ControlError::LightOutOfRange(index + 1))?;
        Ok(LightState {
            on: light.is_on(),
            bri: light.target(),
        })
    }

    /// Apply a `PUT /state` body.  Every entry is validated and the
    /// resulting preferences persisted before any light is touched.
    pub fn set_state(
        &mut self,
        changes: &[StateChange],
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Result<(), ControlError> {
        if let Some(bad) = changes.iter().find(|c| c.light >= self.engine.len()) {
            return Err(ControlError::LightOutOfRange(bad.light + 1));
        }

        let mut next = self.prefs;
        for on in changes.iter().filter_map(|c| c.on) {
            next.record_power(on);
        }
        self.persist(next, store, sink)?;

        for change in changes {
            let Some(light) = self.engine.light_mut(change.light) else {
                continue;
            };
            if let Some(on) = change.on {
                light.set_on(on);
            }
            if let Some(bri) = change.bri {
                light.set_target(bri);
            }
            if let Some(delta) = change.bri_inc {
                light.adjust_target(delta);
            }
            let (on, bri) = (light.is_on(), light.target());
            self.engine.retarget(change.light, change.transition);
            sink.emit(&AppEvent::LightChanged {
                light: change.light,
                on,
                bri,
            });
        }
        Ok(())
    }

    /// Apply a `/` query.  Returns the follow-up system action, if any.
    ///
    /// `bri` here is applied unscaled: a 0–100 form value lands on the
    /// 1–255 protocol scale as-is.
    pub fn apply_root(
        &mut self,
        cmd: &RootCommand,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Result<Option<SystemAction>, ControlError> {
        let mut next = self.prefs;
        if let Some(startup) = cmd.startup {
            next.startup = startup;
        }
        match cmd.action {
            RootAction::Scene(id) if ScenePreset::from_id(id).is_some() => next.scene = id,
            RootAction::Power(on) => {
                next.record_power(on);
            }
            _ => {}
        }
        self.persist(next, store, sink)?;

        if cmd.action == RootAction::None {
            return Ok(cmd.reset.then_some(SystemAction::Restart));
        }

        for index in 0..self.engine.len() {
            let Some(light) = self.engine.light_mut(index) else {
                continue;
            };
            match cmd.action {
                RootAction::Scene(id) => {
                    apply_scene(light, id);
                }
                RootAction::Brightness(bri) => light.set_target(bri),
                RootAction::Power(on) => light.set_on(on),
                RootAction::Alert => {
                    let flash = if light.is_on() { 0.0 } else { 255.0 };
                    light.snap_to(flash);
                }
                RootAction::None => {}
            }
            let (on, bri) = (light.is_on(), light.target());
            self.engine.retarget(index, None);
            sink.emit(&AppEvent::LightChanged { light: index, on, bri });
        }

        Ok(cmd.reset.then_some(SystemAction::Restart))
    }

    pub fn status(&self) -> StatusReport {
        let first = self.get_state(0).unwrap_or(LightState { on: false, bri: 0 });
        StatusReport {
            on: first.on,
            bri: first.bri,
            startup: self.prefs.startup.as_u8(),
            scene: self.prefs.scene,
            led_temp: self.temperature,
            led_duty: self.led_duty(),
            fan_duty: self.thermal.fan().duty,
        }
    }

    // ── System actions ────────────────────────────────────────

    pub fn execute(
        &mut self,
        action: SystemAction,
        hw: &mut impl ActuatorPort,
        store: &mut impl StoragePort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) {
        match action {
            SystemAction::Restart => self.restart(hw, sys, sink),
            SystemAction::FactoryReset => self.factory_reset(hw, store, sys, sink),
        }
    }

    /// Outputs go dark before the chip reboots.
    pub fn restart(&mut self, hw: &mut impl ActuatorPort, sys: &mut impl SystemPort, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::RestartRequested);
        hw.all_off();
        sys.restart();
    }

    /// Wipe the store, drop credentials, blink, restart.  Terminal.
    pub fn factory_reset(
        &mut self,
        hw: &mut impl ActuatorPort,
        store: &mut impl StoragePort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) {
        if let Err(e) = store.erase_all() {
            error!("factory reset: store wipe failed: {e}");
        }
        self.prefs = Preferences::default();
        sys.forget_network_credentials();
        self.blink(hw, sys, FACTORY_RESET_BLINKS, BLINK_INTERVAL_MS);
        sink.emit(&AppEvent::FactoryReset);
        hw.all_off();
        sys.restart();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn telemetry(&self) -> TelemetryData {
        TelemetryData {
            temperature_c: self.temperature,
            led_duty: self.led_duty(),
            fan_duty: self.thermal.fan().duty,
            lights_on: self.engine.lights().iter().filter(|l| l.is_on()).count(),
            in_transition: self.engine.in_transition(),
            fault_flags: self.fault_flags,
        }
    }

    /// Duty actually driven on the first LED channel.
    pub fn led_duty(&self) -> u32 {
        if self.led_inhibited { 0 } else { self.engine.duty(0) }
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn prefs(&self) -> Preferences {
        self.prefs
    }

    pub fn config(&self) -> &LightConfig {
        &self.config
    }

    pub fn light_count(&self) -> usize {
        self.engine.len()
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn fault_flags(&self) -> u8 {
        self.fault_flags
    }

    pub fn led_inhibited(&self) -> bool {
        self.led_inhibited
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn persist(
        &mut self,
        next: Preferences,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Result<(), ControlError> {
        if next == self.prefs {
            return Ok(());
        }
        prefs::save(store, &next).map_err(|e| {
            error!("preference write failed: {e}");
            ControlError::StorageFailed
        })?;
        self.prefs = next;
        sink.emit(&AppEvent::PreferencesSaved(next));
        Ok(())
    }

    fn write_all_leds(&self, hw: &mut impl ActuatorPort, duty: u32) {
        for ch in 0..self.engine.len() {
            hw.set_led_duty(ch, duty);
        }
    }
}
