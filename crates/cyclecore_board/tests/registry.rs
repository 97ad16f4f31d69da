use cyclecore_common::{device_types, find_device_type, EmuError};

#[test]
fn builtin_devices_are_registered() {
    cyclecore_board::register_builtin_devices();

    let names: Vec<_> = device_types().iter().map(|t| t.shortname).collect();
    assert!(names.contains(&"mcs96"));
    assert!(names.contains(&"scc68070"));

    let cpu = find_device_type("mcs96").unwrap().create("maincpu", 0);
    assert_eq!(cpu.tag(), "maincpu");
    assert_eq!(cpu.shortname(), "mcs96");
    let exec = cpu.as_executable().unwrap();
    assert_eq!(exec.clock(), 12_000_000);
    assert_eq!(exec.total_cycles(), 0);

    let scc = find_device_type("scc68070").unwrap().create("scc", 0);
    assert_eq!(scc.shortname(), "scc68070");
    assert!(scc.as_executable().is_none());
}

#[test]
fn unknown_device_type() {
    assert_eq!(
        find_device_type("z80").unwrap_err(),
        EmuError::UnknownDeviceType("z80".into())
    );
}
