//! Address spaces.
//!
//! An `AddressSpace` decodes addresses through a table of
//! `(start, end, mirror, target)` entries. Plain memory (RAM, ROM, banked
//! windows) is handled here; device windows are forwarded to the owning
//! machine through `DeviceAccess`, which matches on the `DeviceTag` the
//! same way a hand-written bus matches on address ranges.

use typed_builder::TypedBuilder;

use crate::error::{EmuError, Result};
use crate::state::{Saveable, StateVisitor};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataWidth {
    Bits8,
    Bits16,
}

impl DataWidth {
    pub fn bits(self) -> u8 {
        match self {
            DataWidth::Bits8 => 8,
            DataWidth::Bits16 => 16,
        }
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(DataWidth::Bits8),
            16 => Some(DataWidth::Bits16),
            _ => None,
        }
    }
}

/// Whether an access may have side effects. Debugger reads use `Debug` so
/// that peeking at a FIFO or an acknowledge register changes nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessMode {
    #[default]
    Normal,
    Debug,
}

impl AccessMode {
    #[inline]
    pub fn side_effects_disabled(self) -> bool {
        self == AccessMode::Debug
    }
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct SpaceConfig {
    #[builder(setter(into))]
    pub name: String,
    #[builder(default = 16)]
    pub address_bits: u8,
    #[builder(default = DataWidth::Bits8)]
    pub data_width: DataWidth,
    #[builder(default = Endianness::Little)]
    pub endianness: Endianness,
    /// Value returned for unmapped reads (open bus).
    #[builder(default = 0xff)]
    pub unmap_value: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BankId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceTag(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapTarget {
    Region(RegionId),
    Bank(BankId),
    Device(DeviceTag),
    Nop,
}

#[derive(Clone, Copy, Debug)]
pub struct MapEntry {
    pub start: u32,
    pub end: u32,
    pub mirror: u32,
    pub target: MapTarget,
}

impl MapEntry {
    fn describe(&self) -> String {
        format!(
            "{:#x}-{:#x} mirror {:#x} ({:?})",
            self.start, self.end, self.mirror, self.target
        )
    }

    /// Every concrete address range the entry decodes, sorted.
    fn expanded(&self) -> Vec<(u32, u32)> {
        let mut ranges = Vec::new();
        let mut sub = self.mirror;
        loop {
            ranges.push((self.start | sub, self.end | sub));
            if sub == 0 {
                break;
            }
            sub = (sub - 1) & self.mirror;
        }
        ranges.sort_unstable();
        ranges
    }
}

/// Memory-mapped device handlers.
///
/// `offset` is the byte offset into the device window, aligned to the
/// space's data width. `mem_mask` selects the active byte lanes of the
/// data bus: `0x00ff` for an 8-bit space, or any lane combination of a
/// 16-bit one.
pub trait DeviceAccess {
    fn device_read(&mut self, tag: DeviceTag, offset: u32, mem_mask: u16, mode: AccessMode)
        -> u16;
    fn device_write(
        &mut self,
        tag: DeviceTag,
        offset: u32,
        data: u16,
        mem_mask: u16,
        mode: AccessMode,
    );
}

/// For spaces with no device windows.
pub struct NoDevices;

impl DeviceAccess for NoDevices {
    fn device_read(
        &mut self,
        tag: DeviceTag,
        offset: u32,
        _mem_mask: u16,
        _mode: AccessMode,
    ) -> u16 {
        log::debug!("read from unbound device {tag:?} at {offset:#x}");
        0xffff
    }

    fn device_write(
        &mut self,
        tag: DeviceTag,
        offset: u32,
        _data: u16,
        _mem_mask: u16,
        _mode: AccessMode,
    ) {
        log::debug!("write to unbound device {tag:?} at {offset:#x}");
    }
}

/// `COMBINE_DATA`: merge `data` into `target` on the lanes in `mem_mask`.
#[inline]
pub fn combine_data(target: &mut u16, data: u16, mem_mask: u16) {
    *target = (*target & !mem_mask) | (data & mem_mask);
}

struct Region {
    name: String,
    data: Vec<u8>,
    writable: bool,
}

struct Bank {
    name: String,
    entries: Vec<(RegionId, u32)>,
    current: u32,
}

enum Resolved {
    Memory { region: RegionId, offset: u32 },
    Device { tag: DeviceTag, offset: u32 },
    Unmapped,
}

pub struct AddressSpace {
    config: SpaceConfig,
    addr_mask: u32,
    entries: Vec<MapEntry>,
    regions: Vec<Region>,
    banks: Vec<Bank>,
}

impl AddressSpace {
    pub fn new(config: SpaceConfig) -> Self {
        let addr_mask = match config.address_bits {
            0 => 0,
            bits if bits >= 32 => u32::MAX,
            bits => (1u32 << bits) - 1,
        };
        Self {
            config,
            addr_mask,
            entries: Vec::new(),
            regions: Vec::new(),
            banks: Vec::new(),
        }
    }

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn add_region(
        &mut self,
        name: impl Into<String>,
        size: usize,
        writable: bool,
    ) -> RegionId {
        let id = RegionId(self.regions.len());
        self.regions.push(Region {
            name: name.into(),
            data: vec![0; size],
            writable,
        });
        id
    }

    pub fn region(&self, id: RegionId) -> &[u8] {
        &self.regions[id.0].data
    }

    pub fn region_mut(&mut self, id: RegionId) -> &mut [u8] {
        &mut self.regions[id.0].data
    }

    /// Copy `data` into a region starting at `offset`.
    pub fn load_region(&mut self, id: RegionId, offset: usize, data: &[u8]) -> Result<()> {
        let region = &mut self.regions[id.0];
        let end = offset.checked_add(data.len()).filter(|end| *end <= region.data.len());
        match end {
            Some(end) => {
                region.data[offset..end].copy_from_slice(data);
                Ok(())
            }
            None => Err(EmuError::InvalidMapping {
                space: self.config.name.clone(),
                reason: format!(
                    "{} bytes at {offset:#x} do not fit region '{}' ({} bytes)",
                    data.len(),
                    region.name,
                    region.data.len()
                ),
            }),
        }
    }

    pub fn add_bank(
        &mut self,
        name: impl Into<String>,
        entries: Vec<(RegionId, u32)>,
    ) -> Result<BankId> {
        let name = name.into();
        if entries.is_empty() {
            return Err(self.invalid(format!("bank '{name}' has no entries")));
        }
        for &(region, base) in &entries {
            let region = &self.regions[region.0];
            if base as usize >= region.data.len() {
                let reason = format!(
                    "bank '{name}' starts at {base:#x}, past the end of region '{}'",
                    region.name
                );
                return Err(self.invalid(reason));
            }
        }
        let id = BankId(self.banks.len());
        self.banks.push(Bank {
            name,
            entries,
            current: 0,
        });
        Ok(id)
    }

    pub fn set_bank(&mut self, id: BankId, entry: usize) -> Result<()> {
        let bank = &self.banks[id.0];
        if entry >= bank.entries.len() {
            let reason = format!(
                "bank '{}' has {} entries, {entry} selected",
                bank.name,
                bank.entries.len()
            );
            return Err(self.invalid(reason));
        }
        self.banks[id.0].current = entry as u32;
        Ok(())
    }

    pub fn bank_entry(&self, id: BankId) -> usize {
        self.banks[id.0].current as usize
    }

    /// Map `start..=end` (and every mirror of it) to `target`.
    ///
    /// The range must not use mirror bits, and after mirror expansion it
    /// must not overlap any entry already installed.
    pub fn install(&mut self, start: u32, end: u32, mirror: u32, target: MapTarget) -> Result<()> {
        let entry = MapEntry {
            start,
            end,
            mirror,
            target,
        };
        if start > end {
            return Err(self.invalid(format!("empty range {}", entry.describe())));
        }
        if (start | end | mirror) & !self.addr_mask != 0 {
            return Err(self.invalid(format!(
                "{} exceeds {}-bit addressing",
                entry.describe(),
                self.config.address_bits
            )));
        }
        if (start | end) & mirror != 0 {
            return Err(self.invalid(format!("{} uses mirror bits", entry.describe())));
        }
        if mirror.count_ones() > 16 {
            return Err(self.invalid(format!("{} mirrors too widely", entry.describe())));
        }
        if let MapTarget::Region(region) = target {
            let span = (end - start) as usize + 1;
            if self.regions[region.0].data.len() < span {
                return Err(self.invalid(format!(
                    "{} is larger than region '{}'",
                    entry.describe(),
                    self.regions[region.0].name
                )));
            }
        }

        let ranges = entry.expanded();
        for existing in &self.entries {
            if ranges_overlap(&ranges, &existing.expanded()) {
                return Err(EmuError::MapOverlap {
                    space: self.config.name.clone(),
                    new: entry.describe(),
                    existing: existing.describe(),
                });
            }
        }

        log::debug!("{}: installed {}", self.config.name, entry.describe());
        self.entries.push(entry);
        Ok(())
    }

    fn invalid(&self, reason: String) -> EmuError {
        EmuError::InvalidMapping {
            space: self.config.name.clone(),
            reason,
        }
    }

    fn resolve(&self, addr: u32) -> Resolved {
        let addr = addr & self.addr_mask;
        let Some(entry) = self.entries.iter().find(|e| {
            let base = addr & !e.mirror;
            base >= e.start && base <= e.end
        }) else {
            return Resolved::Unmapped;
        };
        let offset = (addr & !entry.mirror) - entry.start;
        match entry.target {
            MapTarget::Region(region) => Resolved::Memory { region, offset },
            MapTarget::Bank(bank) => {
                let bank = &self.banks[bank.0];
                match bank.entries.get(bank.current as usize) {
                    Some(&(region, base)) => match base.checked_add(offset) {
                        Some(offset) => Resolved::Memory { region, offset },
                        None => Resolved::Unmapped,
                    },
                    None => Resolved::Unmapped,
                }
            }
            MapTarget::Device(tag) => Resolved::Device { tag, offset },
            MapTarget::Nop => Resolved::Unmapped,
        }
    }

    /// Byte lane of `addr` on this space's data bus: (mask, shift).
    fn lane(&self, addr: u32) -> (u16, u32) {
        if self.config.data_width == DataWidth::Bits8 {
            return (0x00ff, 0);
        }
        let even = addr & 1 == 0;
        let low = match self.config.endianness {
            Endianness::Little => even,
            Endianness::Big => !even,
        };
        if low {
            (0x00ff, 0)
        } else {
            (0xff00, 8)
        }
    }

    fn unit_offset(&self, offset: u32) -> u32 {
        match self.config.data_width {
            DataWidth::Bits8 => offset,
            DataWidth::Bits16 => offset & !1,
        }
    }

    fn memory_byte(&self, region: RegionId, offset: u32, addr: u32) -> u8 {
        match self.regions[region.0].data.get(offset as usize) {
            Some(byte) => *byte,
            None => {
                log::debug!("{}: read past region end at {addr:#x}", self.config.name);
                self.config.unmap_value
            }
        }
    }

    pub fn read8(&mut self, addr: u32, mode: AccessMode, devices: &mut dyn DeviceAccess) -> u8 {
        match self.resolve(addr) {
            Resolved::Memory { region, offset } => self.memory_byte(region, offset, addr),
            Resolved::Device { tag, offset } => {
                let (mask, shift) = self.lane(addr);
                let unit = self.unit_offset(offset);
                (devices.device_read(tag, unit, mask, mode) >> shift) as u8
            }
            Resolved::Unmapped => {
                if !mode.side_effects_disabled() {
                    log::debug!("{}: unmapped read at {addr:#x}", self.config.name);
                }
                self.config.unmap_value
            }
        }
    }

    pub fn write8(
        &mut self,
        addr: u32,
        value: u8,
        mode: AccessMode,
        devices: &mut dyn DeviceAccess,
    ) {
        match self.resolve(addr) {
            Resolved::Memory { region, offset } => {
                let region = &mut self.regions[region.0];
                match region.data.get_mut(offset as usize) {
                    Some(byte) if region.writable => *byte = value,
                    _ => log::debug!(
                        "{}: ignored write {value:#04x} to '{}' at {addr:#x}",
                        self.config.name,
                        region.name
                    ),
                }
            }
            Resolved::Device { tag, offset } => {
                let (mask, shift) = self.lane(addr);
                let unit = self.unit_offset(offset);
                devices.device_write(tag, unit, u16::from(value) << shift, mask, mode);
            }
            Resolved::Unmapped => {
                log::debug!("{}: unmapped write {value:#04x} at {addr:#x}", self.config.name);
            }
        }
    }

    /// Word read. On a 16-bit space an aligned access reaches a device as a
    /// single full-width cycle; everything else is assembled from bytes.
    pub fn read16(&mut self, addr: u32, mode: AccessMode, devices: &mut dyn DeviceAccess) -> u16 {
        self.read16_masked(addr, 0xffff, mode, devices)
    }

    pub fn write16(
        &mut self,
        addr: u32,
        value: u16,
        mode: AccessMode,
        devices: &mut dyn DeviceAccess,
    ) {
        self.write16_masked(addr, value, 0xffff, mode, devices);
    }

    /// Word read with a byte-enable mask. Lanes outside `mem_mask` read as 0.
    pub fn read16_masked(
        &mut self,
        addr: u32,
        mem_mask: u16,
        mode: AccessMode,
        devices: &mut dyn DeviceAccess,
    ) -> u16 {
        if self.config.data_width == DataWidth::Bits16 && addr & 1 == 0 {
            if let Resolved::Device { tag, offset } = self.resolve(addr) {
                return devices.device_read(tag, offset & !1, mem_mask, mode) & mem_mask;
            }
        }
        let (first, second) = self.word_bytes(addr);
        let mut value = 0u16;
        for byte_addr in [first, second] {
            let (lane, shift) = self.word_lane(byte_addr, addr);
            if mem_mask & lane != 0 {
                value |= u16::from(self.read8(byte_addr, mode, devices)) << shift;
            }
        }
        value
    }

    pub fn write16_masked(
        &mut self,
        addr: u32,
        value: u16,
        mem_mask: u16,
        mode: AccessMode,
        devices: &mut dyn DeviceAccess,
    ) {
        if self.config.data_width == DataWidth::Bits16 && addr & 1 == 0 {
            if let Resolved::Device { tag, offset } = self.resolve(addr) {
                devices.device_write(tag, offset & !1, value, mem_mask, mode);
                return;
            }
        }
        let (first, second) = self.word_bytes(addr);
        for byte_addr in [first, second] {
            let (lane, shift) = self.word_lane(byte_addr, addr);
            if mem_mask & lane != 0 {
                self.write8(byte_addr, (value >> shift) as u8, mode, devices);
            }
        }
    }

    fn word_bytes(&self, addr: u32) -> (u32, u32) {
        (addr & self.addr_mask, addr.wrapping_add(1) & self.addr_mask)
    }

    /// Lane of `byte_addr` inside the word starting at `word_addr`.
    fn word_lane(&self, byte_addr: u32, word_addr: u32) -> (u16, u32) {
        let low_first = self.config.endianness == Endianness::Little;
        if (byte_addr == word_addr & self.addr_mask) == low_first {
            (0x00ff, 0)
        } else {
            (0xff00, 8)
        }
    }
}

impl Saveable for AddressSpace {
    fn save_state(&mut self, state: &mut dyn StateVisitor) {
        let space = self.config.name.clone();
        for region in self.regions.iter_mut().filter(|r| r.writable) {
            state.bytes(&format!("{space}.{}", region.name), &mut region.data);
        }
        for bank in &mut self.banks {
            state.u32(&format!("{space}.bank.{}", bank.name), &mut bank.current);
        }
    }
}

/// Both inputs sorted by start.
fn ranges_overlap(a: &[(u32, u32)], b: &[(u32, u32)]) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (a_start, a_end) = a[i];
        let (b_start, b_end) = b[j];
        if a_start <= b_end && b_start <= a_end {
            return true;
        }
        if a_end < b_end {
            i += 1;
        } else {
            j += 1;
        }
    }
    false
}
