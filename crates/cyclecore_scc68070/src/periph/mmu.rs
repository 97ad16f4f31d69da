use cyclecore_common::combine_data;

use crate::logging::{scc_log, LogChannels};
use crate::regs;
use crate::Scc68070;

pub const MMU_DESCRIPTORS: usize = 8;

/// Segment descriptor. Stored only; no translation is performed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Descriptor {
    pub attr: u16,
    pub length: u16,
    pub segment: u8,
    pub base: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mmu {
    pub status: u8,
    pub control: u8,
    pub desc: [Descriptor; MMU_DESCRIPTORS],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Attr,
    Length,
    Segment,
    Base,
}

fn decode(offset: u32) -> Option<(usize, Field)> {
    if !(regs::MMU_DESC_BASE..=regs::MMU_DESC_END).contains(&offset) {
        return None;
    }
    let rel = offset - regs::MMU_DESC_BASE;
    let field = match rel % regs::MMU_DESC_STRIDE {
        0 => Field::Attr,
        2 => Field::Length,
        4 => Field::Segment,
        _ => Field::Base,
    };
    Some(((rel / regs::MMU_DESC_STRIDE) as usize, field))
}

impl Scc68070 {
    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    pub(crate) fn mmu_r(&mut self, offset: u32, mem_mask: u16) -> Option<u16> {
        let value = if offset == regs::MMU_STATUS_CONTROL {
            // The low byte is control, the high byte status.
            if regs::low_lane(mem_mask) {
                u16::from(self.mmu.control)
            } else {
                u16::from(self.mmu.status)
            }
        } else {
            let (index, field) = decode(offset)?;
            let desc = &self.mmu.desc[index];
            match field {
                Field::Attr => desc.attr,
                Field::Length => desc.length,
                Field::Segment if regs::low_lane(mem_mask) => u16::from(desc.segment),
                Field::Segment => 0,
                Field::Base => desc.base,
            }
        };
        scc_log!(self, LogChannels::MMU, "read {offset:04x} = {value:04x} & {mem_mask:04x}");
        Some(value)
    }

    pub(crate) fn mmu_w(&mut self, offset: u32, data: u16, mem_mask: u16) -> bool {
        if offset == regs::MMU_STATUS_CONTROL {
            if regs::low_lane(mem_mask) {
                self.mmu.control = data as u8;
            }
        } else {
            let Some((index, field)) = decode(offset) else {
                return false;
            };
            let desc = &mut self.mmu.desc[index];
            match field {
                Field::Attr => combine_data(&mut desc.attr, data, mem_mask),
                Field::Length => combine_data(&mut desc.length, data, mem_mask),
                Field::Segment => {
                    if regs::low_lane(mem_mask) {
                        desc.segment = data as u8;
                    }
                }
                Field::Base => combine_data(&mut desc.base, data, mem_mask),
            }
        }
        scc_log!(self, LogChannels::MMU, "write {offset:04x} = {data:04x} & {mem_mask:04x}");
        true
    }
}
