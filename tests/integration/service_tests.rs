//! Integration tests for the LightService → TransitionEngine → actuators
//! pipeline: boot sequence, ramps, thermal handling, and system actions.

use crate::mock_hw::{ActuatorCall, MockHardware, MockNvs, MockSystem, RecordingSink};

use floodlight::app::commands::{StateChange, SystemAction};
use floodlight::app::events::AppEvent;
use floodlight::app::service::{BLINK_INTERVAL_MS, INDICATOR_LEVEL, LightService, STARTUP_BLINKS};
use floodlight::config::LightConfig;
use floodlight::error::{ControlError, ThermalFault};
use floodlight::prefs::{PREFS_KEY, PREFS_NAMESPACE, Preferences, StartupBehavior};
use floodlight::thermal::{FAN_DUTY_IDLE, FAN_DUTY_MAX};

const MAC: [u8; 6] = [0x24, 0x6F, 0x28, 0x01, 0x02, 0x03];

fn service(prefs: Preferences) -> LightService {
    LightService::new(LightConfig::default(), prefs, MAC)
}

fn turn_on(bri: i64, transition: i32) -> StateChange {
    StateChange {
        light: 0,
        on: Some(true),
        bri: Some(bri),
        transition: Some(transition),
        ..Default::default()
    }
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn first_boot_stays_dark() {
    let mut svc = service(Preferences::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();

    assert!(!svc.boot(&mut hw, &mut sink));
    assert!(hw.led_writes().is_empty());
    assert_eq!(svc.get_state(0).unwrap().bri, 144, "Relax is the default target");
    assert!(matches!(
        sink.events[0],
        AppEvent::Started {
            lights: 1,
            power_on: false
        }
    ));
}

#[test]
fn force_on_boot_ramps_to_stored_scene() {
    let prefs = Preferences {
        last_on: false,
        startup: StartupBehavior::ForceOn,
        scene: 1,
    };
    let mut svc = service(prefs);
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();

    assert!(svc.boot(&mut hw, &mut sink));

    let light = svc.engine().light(0).unwrap();
    assert_eq!(light.target(), 254);
    assert_eq!(light.current(), 254.0, "boot ramp settles before the loop starts");

    let expected = svc.engine().limits().map(254 * 16);
    assert_eq!(hw.led_duty(0), expected);
    assert!((180..=2500).contains(&expected));
}

#[test]
fn resume_last_restores_power() {
    let prefs = Preferences {
        last_on: true,
        ..Default::default()
    };
    let mut svc = service(prefs);
    assert!(svc.boot(&mut MockHardware::new(), &mut RecordingSink::new()));
    assert!(svc.get_state(0).unwrap().on);
}

#[test]
fn unknown_stored_scene_keeps_default_target() {
    let prefs = Preferences {
        scene: 9,
        ..Default::default()
    };
    let svc = service(prefs);
    assert_eq!(svc.get_state(0).unwrap().bri, 144);
}

// ── Indicators ────────────────────────────────────────────────

#[test]
fn startup_blink_pattern() {
    let mut svc = service(Preferences::default());
    let mut hw = MockHardware::new();
    let mut sys = MockSystem::new();

    svc.startup_blink(&mut hw, &mut sys);

    let level = svc.engine().limits().map(INDICATOR_LEVEL);
    let mut expected = Vec::new();
    for _ in 0..STARTUP_BLINKS {
        expected.extend([0, level]);
    }
    expected.push(0);
    assert_eq!(hw.led_writes(), expected);
    assert_eq!(sys.slept_ms(), u32::from(STARTUP_BLINKS) * BLINK_INTERVAL_MS * 3);
}

#[test]
fn connected_flash_only_while_off() {
    let mut svc = service(Preferences::default());
    let mut hw = MockHardware::new();
    let mut sys = MockSystem::new();

    svc.connected_flash(&mut hw, &mut sys);
    let level = svc.engine().limits().map(INDICATOR_LEVEL);
    assert_eq!(hw.led_writes(), vec![level, 0]);
    assert_eq!(sys.sleeps, vec![BLINK_INTERVAL_MS]);

    let on = Preferences {
        startup: StartupBehavior::ForceOn,
        ..Default::default()
    };
    let mut svc = service(on);
    let mut hw = MockHardware::new();
    svc.boot(&mut hw, &mut RecordingSink::new());
    hw.clear();
    svc.connected_flash(&mut hw, &mut sys);
    assert!(hw.led_writes().is_empty());
}

// ── Ramps ─────────────────────────────────────────────────────

#[test]
fn ten_unit_transition_converges_in_330_ticks() {
    let mut svc = service(Preferences::default());
    let mut hw = MockHardware::new();
    let mut nvs = MockNvs::new();
    let mut sink = RecordingSink::new();

    svc.set_state(&[turn_on(200, 10)], &mut nvs, &mut sink).unwrap();
    let step = svc.engine().light(0).unwrap().step();
    assert!((step - 200.0 / 330.0).abs() < 1e-6, "step was {step}");

    for _ in 0..329 {
        assert!(svc.tick(&mut hw, &mut sink));
    }
    assert!(svc.engine().light(0).unwrap().current() < 200.0);

    svc.tick(&mut hw, &mut sink);
    let light = svc.engine().light(0).unwrap();
    assert_eq!(light.current(), 200.0);
    let duty = hw.led_duty(0);
    assert!((180..=2500).contains(&duty), "duty {duty} outside limits");
    assert_eq!(duty, svc.engine().duty(0));

    assert!(!svc.tick(&mut hw, &mut sink), "settled light does not move");
}

#[test]
fn zero_transition_jumps_in_one_tick() {
    let mut svc = service(Preferences::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();

    svc.set_state(&[turn_on(80, 0)], &mut MockNvs::new(), &mut sink).unwrap();
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.engine().light(0).unwrap().current(), 80.0);
}

#[test]
fn turning_off_ramps_to_zero_duty() {
    let mut svc = service(Preferences::default());
    let mut hw = MockHardware::new();
    let mut nvs = MockNvs::new();
    let mut sink = RecordingSink::new();

    svc.set_state(&[turn_on(100, 0)], &mut nvs, &mut sink).unwrap();
    svc.tick(&mut hw, &mut sink);

    let off = StateChange {
        light: 0,
        on: Some(false),
        transition: Some(1),
        ..Default::default()
    };
    svc.set_state(&[off], &mut nvs, &mut sink).unwrap();
    assert_eq!(svc.get_state(0).unwrap().bri, 100, "target survives power-off");
    for _ in 0..33 {
        svc.tick(&mut hw, &mut sink);
    }
    assert_eq!(hw.led_duty(0), 0);
}

// ── Preferences ───────────────────────────────────────────────

#[test]
fn power_change_is_persisted_before_ack() {
    let mut svc = service(Preferences::default());
    let mut nvs = MockNvs::new();
    let mut sink = RecordingSink::new();

    svc.set_state(&[turn_on(200, 4)], &mut nvs, &mut sink).unwrap();
    assert_eq!(nvs.get(PREFS_NAMESPACE, PREFS_KEY), Some(&[1u8, 0, 0][..]));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::PreferencesSaved(_))), 1);
}

#[test]
fn storage_failure_leaves_state_untouched() {
    let mut svc = service(Preferences::default());
    let mut nvs = MockNvs {
        fail_writes: true,
        ..Default::default()
    };
    let mut sink = RecordingSink::new();

    let err = svc.set_state(&[turn_on(200, 4)], &mut nvs, &mut sink).unwrap_err();
    assert_eq!(err, ControlError::StorageFailed);
    let state = svc.get_state(0).unwrap();
    assert!(!state.on);
    assert_eq!(state.bri, 144);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::LightChanged { .. })), 0);
}

#[test]
fn brightness_only_change_needs_no_write() {
    let mut svc = service(Preferences::default());
    let mut nvs = MockNvs {
        fail_writes: true,
        ..Default::default()
    };
    let change = StateChange {
        light: 0,
        bri: Some(30),
        ..Default::default()
    };
    svc.set_state(&[change], &mut nvs, &mut RecordingSink::new()).unwrap();
    assert_eq!(svc.get_state(0).unwrap().bri, 30);
}

#[test]
fn forced_startup_does_not_track_power() {
    let prefs = Preferences {
        startup: StartupBehavior::ForceOff,
        ..Default::default()
    };
    let mut svc = service(prefs);
    let mut nvs = MockNvs::new();
    svc.set_state(&[turn_on(200, 4)], &mut nvs, &mut RecordingSink::new()).unwrap();
    assert_eq!(nvs.writes, 0);
    assert!(!svc.prefs().last_on);
}

// ── Thermal ───────────────────────────────────────────────────

#[test]
fn fan_follows_heatsink_bands() {
    let mut svc = service(Preferences::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();

    for (temp, duty) in [(25.0, FAN_DUTY_IDLE), (30.5, 2000), (35.5, 3000), (40.5, FAN_DUTY_MAX), (40.0, 3000)] {
        hw.temperature = Some(temp);
        svc.tick(&mut hw, &mut sink);
        assert_eq!(hw.fan_duty(), duty, "at {temp} °C");
    }
    assert!(sink.count(|e| matches!(e, AppEvent::FanDutyChanged { .. })) >= 4);
}

#[test]
fn lost_sensor_forces_fan_and_inhibits_led() {
    let mut svc = service(Preferences::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();

    svc.set_state(&[turn_on(200, 0)], &mut MockNvs::new(), &mut sink).unwrap();
    svc.tick(&mut hw, &mut sink);
    let lit = hw.led_duty(0);
    assert!(lit > 0);

    hw.temperature = None;
    svc.tick(&mut hw, &mut sink);
    assert_eq!(hw.fan_duty(), FAN_DUTY_MAX);
    assert_eq!(hw.led_duty(0), 0);
    assert!(svc.led_inhibited());
    assert_eq!(svc.fault_flags(), ThermalFault::SensorUnavailable.mask());
    assert_eq!(svc.led_duty(), 0);

    hw.temperature = Some(25.0);
    svc.tick(&mut hw, &mut sink);
    assert!(!svc.led_inhibited());
    assert_eq!(hw.led_duty(0), lit, "duty restored once the fault clears");
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ThermalFaultCleared)), 1);
}

#[test]
fn over_critical_temperature_is_a_fault() {
    let mut svc = service(Preferences::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();

    hw.temperature = Some(85.0);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.fault_flags(), ThermalFault::OverTemperature.mask());
    assert_eq!(hw.fan_duty(), FAN_DUTY_MAX);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ThermalFault(_))), 1);

    // staying hot does not re-announce
    svc.tick(&mut hw, &mut sink);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ThermalFault(_))), 1);
}

#[test]
fn telemetry_snapshot() {
    let mut svc = service(Preferences::default());
    let mut hw = MockHardware::new();
    hw.temperature = Some(31.0);
    svc.tick(&mut hw, &mut RecordingSink::new());

    let t = svc.telemetry();
    assert_eq!(t.temperature_c, Some(31.0));
    assert_eq!(t.fan_duty, 2000);
    assert_eq!(t.lights_on, 0);
    assert_eq!(t.fault_flags, 0);
    assert!(!t.in_transition);
}

// ── System actions ────────────────────────────────────────────

#[test]
fn factory_reset_wipes_everything_and_restarts() {
    let mut svc = service(Preferences::default());
    let mut hw = MockHardware::new();
    let mut nvs = MockNvs::new();
    let mut sys = MockSystem::new();
    let mut sink = RecordingSink::new();

    svc.set_state(&[turn_on(200, 4)], &mut nvs, &mut sink).unwrap();
    assert!(!nvs.data.is_empty());

    svc.execute(SystemAction::FactoryReset, &mut hw, &mut nvs, &mut sys, &mut sink);

    assert!(nvs.data.is_empty());
    assert!(sys.credentials_forgotten);
    assert_eq!(sys.restarts, 1);
    assert_eq!(svc.prefs(), Preferences::default());
    assert_eq!(hw.led_duty(0), 0);
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert!(sys.slept_ms() > 0, "reset blinks before restarting");
    assert!(matches!(sink.events.last(), Some(AppEvent::FactoryReset)));
}

#[test]
fn restart_keeps_the_store() {
    let mut svc = service(Preferences::default());
    let mut nvs = MockNvs::new();
    let mut sys = MockSystem::new();
    let mut sink = RecordingSink::new();

    let mut hw = MockHardware::new();

    svc.set_state(&[turn_on(200, 4)], &mut nvs, &mut sink).unwrap();
    for _ in 0..10 {
        svc.tick(&mut hw, &mut sink);
    }
    assert!(hw.led_duty(0) > 0);
    svc.execute(SystemAction::Restart, &mut hw, &mut nvs, &mut sys, &mut sink);

    assert_eq!(sys.restarts, 1);
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert_eq!((hw.led_duty(0), hw.fan_duty()), (0, 0));
    assert!(!sys.credentials_forgotten);
    assert!(nvs.get(PREFS_NAMESPACE, PREFS_KEY).is_some());
}
