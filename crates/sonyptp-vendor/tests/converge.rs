mod support;

use std::time::{Duration, Instant};

use sonyptp_transport::ScriptedTransport;
use sonyptp_vendor::codes::property;
use sonyptp_vendor::{
    converge, ControlError, ConvergeConfig, Direction, ShutterSpeed, SonyCamera, Target,
};
use sonyptp_wire::codes::property as pima_property;
use sonyptp_wire::Scalar;
use support::{shutter_table, SimCamera, F_NUMBER_TABLE, ISO_TABLE};

fn camera(config: ConvergeConfig) -> (SimCamera, SonyCamera<ScriptedTransport>) {
    let sim = SimCamera::new();
    let mut camera = SonyCamera::new(sim.transport.clone()).with_converge_config(config);
    camera.connect().unwrap();
    (sim, camera)
}

fn quick() -> ConvergeConfig {
    ConvergeConfig::default()
        .with_change_timeout(Duration::from_millis(150))
        .with_poll_interval(Duration::from_millis(5))
}

#[test]
fn shutter_reaches_every_table_entry() {
    let table = shutter_table();
    for &raw in &table {
        let (sim, mut camera) = camera(quick());
        let target = ShutterSpeed::from_raw(raw);
        assert_eq!(camera.set_shutter_speed(target).unwrap(), target);
        assert_eq!(sim.dial(property::SHUTTER_SPEED), Scalar::Uint32(raw));
        assert!(sim.sim().steps <= table.len());
    }
}

#[test]
fn shutter_from_slow_end_steps_down() {
    let (sim, mut camera) = camera(quick());
    sim.sim()
        .dials
        .get_mut(&property::SHUTTER_SPEED)
        .unwrap()
        .index = shutter_table().len() - 1;

    let target = ShutterSpeed::new(1, 1000);
    assert_eq!(camera.set_shutter_speed(target).unwrap(), target);
    assert_eq!(sim.sim().steps, shutter_table().len() - 3);
}

#[test]
fn shutter_between_entries_is_unreachable() {
    let (sim, mut camera) = camera(quick());
    let err = camera
        .set_shutter_speed(ShutterSpeed::new(1, 750))
        .unwrap_err();
    assert!(matches!(
        err,
        ControlError::Unreachable {
            code: property::SHUTTER_SPEED,
            below,
            above,
        } if below == Scalar::Uint32(ShutterSpeed::new(1, 1000).raw())
            && above == Scalar::Uint32(ShutterSpeed::new(1, 500).raw())
    ));
    // Stopped on the step that overshot.
    assert_eq!(sim.sim().steps, 3);
}

#[test]
fn iso_converges_upward() {
    let (sim, mut camera) = camera(quick());
    assert_eq!(camera.set_iso(1600).unwrap(), 1600);
    assert_eq!(sim.sim().steps, 4);
    assert!(sim.sim().steps <= ISO_TABLE.len());
}

#[test]
fn iso_between_entries_is_unreachable() {
    let (_sim, mut camera) = camera(quick());
    let err = camera.set_iso(300).unwrap_err();
    assert!(matches!(
        err,
        ControlError::Unreachable {
            below: Scalar::Uint32(200),
            above: Scalar::Uint32(400),
            ..
        }
    ));
    assert!(!err.is_retryable());
}

#[test]
fn f_number_converges_downward() {
    let (sim, mut camera) = camera(quick());
    assert_eq!(camera.set_f_number(F_NUMBER_TABLE[0]).unwrap(), 350);
    assert_eq!(sim.sim().steps, 2);
    assert_eq!(
        sim.dial(pima_property::F_NUMBER),
        Scalar::Uint16(F_NUMBER_TABLE[0])
    );
}

#[test]
fn frozen_property_times_out_after_configured_bound() {
    let (sim, mut camera) = camera(quick());
    sim.sim().frozen = true;

    let started = Instant::now();
    let err = camera.set_iso(800).unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(150));
    assert!(matches!(
        err,
        ControlError::ConvergeTimeout { code: property::ISO, waited }
            if waited == Duration::from_millis(150)
    ));
    assert_eq!(sim.sim().steps, 1);
    // The session survives a convergence timeout.
    assert!(camera.session().is_open());
}

#[test]
fn adjust_property_sends_signed_byte() {
    let (sim, mut camera) = camera(quick());
    camera
        .adjust_property(property::ISO, Direction::Up)
        .unwrap();
    camera
        .adjust_property(property::ISO, Direction::Up)
        .unwrap();
    camera
        .adjust_property(property::ISO, Direction::Down)
        .unwrap();
    assert_eq!(sim.dial(property::ISO), Scalar::Uint32(200));
    assert_eq!(sim.sim().steps, 3);
}

#[test]
fn property_absent_from_block_is_not_found() {
    let (sim, mut camera) = camera(quick());
    let err = converge(
        &mut camera,
        property::COLOR_TEMP,
        Target::Numeric(5500),
        &quick(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ControlError::NotFound {
            code: property::COLOR_TEMP
        }
    ));
    assert_eq!(sim.sim().steps, 0);
}
