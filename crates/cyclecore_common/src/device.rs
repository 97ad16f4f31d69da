//! Device capabilities and the device type registry.
//!
//! A device is assembled from small capability traits rather than a deep
//! hierarchy: every device has a tag, can be reset and has saved state;
//! CPUs are additionally `Executable`; memory-mapped peripherals answer
//! `DeviceAccess` through their owning machine.

use std::collections::HashMap;
use std::sync::RwLock;

use lazy_static::lazy_static;

use crate::error::{EmuError, Result};
use crate::lines::LineState;
use crate::state::Saveable;
use crate::time::Attotime;

pub trait Device: Saveable {
    /// Instance name, e.g. `"maincpu"`.
    fn tag(&self) -> &str;

    /// Registry short name of the device type.
    fn shortname(&self) -> &'static str;

    fn reset(&mut self);

    fn as_executable(&self) -> Option<&dyn Executable> {
        None
    }
}

/// A device that consumes clock cycles.
pub trait Executable {
    fn clock(&self) -> u32;
    fn min_cycles(&self) -> u32;
    fn max_cycles(&self) -> u32;
    fn input_lines(&self) -> u8;
    fn set_input(&mut self, line: u8, state: LineState);

    /// Cycles executed since the device was created.
    fn total_cycles(&self) -> u64;

    fn local_time(&self) -> Attotime {
        Attotime::from_cycles(self.total_cycles(), self.clock())
    }
}

pub type DeviceFactory = fn(tag: &str, clock: u32) -> Box<dyn Device>;

#[derive(Clone, Copy)]
pub struct DeviceType {
    pub shortname: &'static str,
    pub fullname: &'static str,
    pub default_clock: u32,
    pub factory: DeviceFactory,
}

impl DeviceType {
    /// Instantiate the device; a clock of 0 selects the default.
    pub fn create(&self, tag: &str, clock: u32) -> Box<dyn Device> {
        let clock = if clock == 0 { self.default_clock } else { clock };
        (self.factory)(tag, clock)
    }
}

impl std::fmt::Debug for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceType")
            .field("shortname", &self.shortname)
            .field("fullname", &self.fullname)
            .field("default_clock", &self.default_clock)
            .finish()
    }
}

lazy_static! {
    static ref DEVICE_TYPES: RwLock<HashMap<&'static str, DeviceType>> =
        RwLock::new(HashMap::new());
}

/// Register a device type. Re-registering a short name replaces it.
pub fn register_device_type(device_type: DeviceType) {
    let mut types = DEVICE_TYPES
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if types
        .insert(device_type.shortname, device_type)
        .is_some()
    {
        log::debug!("device type '{}' re-registered", device_type.shortname);
    }
}

pub fn find_device_type(shortname: &str) -> Result<DeviceType> {
    let types = DEVICE_TYPES
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    types
        .get(shortname)
        .copied()
        .ok_or_else(|| EmuError::UnknownDeviceType(shortname.to_string()))
}

/// All registered types, sorted by short name.
pub fn device_types() -> Vec<DeviceType> {
    let types = DEVICE_TYPES
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut list: Vec<_> = types.values().copied().collect();
    list.sort_by_key(|t| t.shortname);
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateVisitor;

    struct Counter {
        tag: String,
        clock: u32,
        cycles: u64,
        line: LineState,
    }

    impl Saveable for Counter {
        fn save_state(&mut self, state: &mut dyn StateVisitor) {
            state.u64("cycles", &mut self.cycles);
        }
    }

    impl Device for Counter {
        fn tag(&self) -> &str {
            &self.tag
        }

        fn shortname(&self) -> &'static str {
            "test_counter"
        }

        fn reset(&mut self) {
            self.cycles = 0;
        }

        fn as_executable(&self) -> Option<&dyn Executable> {
            Some(self)
        }
    }

    impl Executable for Counter {
        fn clock(&self) -> u32 {
            self.clock
        }
        fn min_cycles(&self) -> u32 {
            1
        }
        fn max_cycles(&self) -> u32 {
            1
        }
        fn input_lines(&self) -> u8 {
            1
        }
        fn set_input(&mut self, _line: u8, state: LineState) {
            self.line = state;
        }
        fn total_cycles(&self) -> u64 {
            self.cycles
        }
    }

    fn make_counter(tag: &str, clock: u32) -> Box<dyn Device> {
        Box::new(Counter {
            tag: tag.to_string(),
            clock,
            cycles: 1000,
            line: LineState::Clear,
        })
    }

    #[test]
    fn registered_type_is_found_and_creates_devices() {
        register_device_type(DeviceType {
            shortname: "test_counter",
            fullname: "Test counter",
            default_clock: 1_000,
            factory: make_counter,
        });

        let ty = find_device_type("test_counter").unwrap();
        assert_eq!(ty.fullname, "Test counter");
        assert!(device_types().iter().any(|t| t.shortname == "test_counter"));

        let device = ty.create("counter", 0);
        assert_eq!(device.tag(), "counter");
        let exec = device.as_executable().unwrap();
        assert_eq!(exec.clock(), 1_000);
        assert_eq!(exec.local_time(), Attotime::from_seconds(1));
    }

    #[test]
    fn unknown_type_is_an_error() {
        let err = find_device_type("no_such_device").unwrap_err();
        assert_eq!(err, EmuError::UnknownDeviceType("no_such_device".into()));
    }
}
