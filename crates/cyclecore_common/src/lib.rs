pub mod device;
pub mod error;
pub mod lines;
pub mod machine;
pub mod memory;
pub mod scheduler;
pub mod state;
pub mod time;

pub use device::{
    device_types, find_device_type, register_device_type, Device, DeviceType, Executable,
};
pub use error::{EmuError, Result};
pub use lines::{LineQueue, LineState};
pub use machine::Machine;
pub use memory::{
    combine_data, AccessMode, AddressSpace, DataWidth, DeviceAccess, DeviceTag, Endianness,
    MapTarget, NoDevices, SpaceConfig,
};
pub use scheduler::{FiredTimer, Scheduler, TimerId};
pub use state::{Saveable, StateVisitor};
pub use time::Attotime;
