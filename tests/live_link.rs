use controller_link::controller::{
    ControllerAxis, ControllerButton, DeviceKind, DevicePreference, DeviceSession,
    ScriptedBackend, ScriptedDevice,
};
use controller_link::outputs::{OutputGroup, OutputStructure, PropertyValue};
use controller_link::LiveLink;

fn names(group: &OutputGroup) -> Vec<String> {
    group.slots().iter().map(|slot| slot.name.to_string()).collect()
}

#[test]
fn mapped_controller_drives_outputs() {
    let backend = ScriptedBackend::new(vec![ScriptedDevice::controller("Pad")
        .with_axis(ControllerAxis::LeftX, 0)
        .with_axis(ControllerAxis::LeftY, 0)
        .with_button(ControllerButton::A, false)]);
    let controls = backend.controls();
    let session = DeviceSession::start(Box::new(backend), DevicePreference::Auto);
    assert_eq!(session.kind(), Some(DeviceKind::MappedController));

    let mut link = LiveLink::new(session, OutputGroup::new());
    assert!(link.tick().rebuilt);
    assert_eq!(
        names(link.structure()),
        vec![
            "controller_axis_leftx",
            "controller_axis_lefty",
            "controller_button_a"
        ]
    );

    controls.set_axis(0, ControllerAxis::LeftX, i16::MIN);
    controls.set_button(0, ControllerButton::A, true);
    let report = link.tick();
    assert!(!report.rebuilt);
    assert_eq!(
        link.properties().get("controller_axis_leftx"),
        Some(&PropertyValue::Float(-1.0))
    );

    let resolved = link.structure().resolve(link.properties());
    assert!(resolved.contains(&("controller_button_a".into(), Some(1.0))));
}

#[test]
fn new_capability_forces_full_rebuild() {
    let backend = ScriptedBackend::new(vec![
        ScriptedDevice::controller("Pad").with_axis(ControllerAxis::LeftX, 0)
    ]);
    let controls = backend.controls();
    let mut link = LiveLink::new(
        DeviceSession::start(Box::new(backend), DevicePreference::Auto),
        OutputGroup::new(),
    );
    link.tick();
    let before = link.structure().rebuilds();

    controls.set_axis(0, ControllerAxis::TriggerLeft, 32767);
    assert!(link.tick().rebuilt);
    assert_eq!(link.structure().rebuilds(), before + 1);
    assert_eq!(link.structure().output_names().len(), 2);
}

#[test]
fn lost_capability_keeps_its_output() {
    let backend = ScriptedBackend::new(vec![ScriptedDevice::controller("Pad")
        .with_axis(ControllerAxis::LeftX, 0)
        .with_axis(ControllerAxis::RightX, 16384)]);
    let controls = backend.controls();
    let mut link = LiveLink::new(
        DeviceSession::start(Box::new(backend), DevicePreference::Auto),
        OutputGroup::new(),
    );
    assert_eq!(link.tick().samples, 2);

    controls.remove_axis(0, ControllerAxis::RightX);
    let report = link.tick();
    assert_eq!(report.samples, 1);
    assert!(!report.rebuilt);

    // The last reading stays in the store and still counts as desired
    assert_eq!(
        link.properties().get("controller_axis_rightx"),
        Some(&PropertyValue::Float(f64::from(16384.0_f32 / 32767.0)))
    );
    assert_eq!(
        names(link.structure()),
        vec!["controller_axis_leftx", "controller_axis_rightx"]
    );
}

#[test]
fn raw_joystick_fallback_end_to_end() {
    let backend = ScriptedBackend::new(vec![ScriptedDevice::joystick("Stick")
        .with_raw_axes(vec![0, 0, 0, 0])
        .with_raw_buttons(vec![false, false])]);
    let controls = backend.controls();
    let mut link = LiveLink::new(
        DeviceSession::start(Box::new(backend), DevicePreference::Auto),
        OutputGroup::new(),
    );

    assert_eq!(link.tick().samples, 6);
    assert_eq!(link.structure().slots().len(), 6);

    controls.set_raw_axis(0, 3, 32767);
    link.tick();
    assert_eq!(
        link.properties().get("controller_axis_3"),
        Some(&PropertyValue::Float(1.0))
    );

    link.stop();
    assert!(controls.open_devices().is_empty());
}

#[test]
fn no_device_never_fails() {
    let mut link = LiveLink::new(
        DeviceSession::start(Box::new(ScriptedBackend::new(Vec::new())), DevicePreference::Auto),
        OutputGroup::new(),
    );
    for _ in 0..5 {
        let report = link.tick();
        assert_eq!(report.samples, 0);
        assert!(!report.rebuilt);
    }
    assert!(link.structure().slots().is_empty());
}
