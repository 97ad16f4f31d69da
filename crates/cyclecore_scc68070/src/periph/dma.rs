use cyclecore_common::combine_data;

use crate::logging::{scc_log, LogChannels};
use crate::regs::{self, CCR_INE, CCR_IPL, CCR_SO, CSR_COC};
use crate::Scc68070;

pub const DMA_CHANNELS: usize = 2;

/// Status bits a write to the high byte of the status/error register can
/// clear.
const STATUS_CLEARABLE: u8 = 0xb0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DmaChannel {
    pub channel_status: u8,
    pub channel_error: u8,
    pub device_control: u8,
    pub operation_control: u8,
    pub sequence_control: u8,
    pub channel_control: u8,
    pub transfer_counter: u16,
    pub memory_address_counter: u32,
    pub device_address_counter: u32,
}

impl DmaChannel {
    /// Interrupt level requested on operation complete.
    pub fn level(&self) -> u8 {
        if self.channel_status & CSR_COC != 0 && self.channel_control & CCR_INE != 0 {
            self.channel_control & CCR_IPL
        } else {
            0
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dma {
    pub channel: [DmaChannel; DMA_CHANNELS],
}

impl Dma {
    pub fn level(&self, channel: usize) -> u8 {
        self.channel.get(channel).map_or(0, DmaChannel::level)
    }
}

/// Replace the half of `counter` selected by `high` on the lanes in
/// `mem_mask`.
fn write_half(counter: &mut u32, high: bool, data: u16, mem_mask: u16) {
    let shift = if high { 16 } else { 0 };
    let mask = u32::from(mem_mask) << shift;
    *counter = (*counter & !mask) | ((u32::from(data) << shift) & mask);
}

fn split(offset: u32) -> (usize, u32) {
    let rel = offset - regs::DMA_BASE;
    (
        (rel / regs::DMA_CHANNEL_STRIDE) as usize,
        rel % regs::DMA_CHANNEL_STRIDE,
    )
}

impl Scc68070 {
    pub fn dma(&self) -> &Dma {
        &self.dma
    }

    pub(crate) fn dma_r(&mut self, offset: u32, mem_mask: u16) -> Option<u16> {
        let (index, reg) = split(offset);
        let ch = self.dma.channel.get(index)?;
        let value = match reg {
            regs::DMA_STATUS_ERROR => {
                (u16::from(ch.channel_status) << 8) | u16::from(ch.channel_error)
            }
            regs::DMA_DEVICE_OPERATION => {
                (u16::from(ch.device_control) << 8) | u16::from(ch.operation_control)
            }
            regs::DMA_SEQUENCE_CHANNEL => {
                (u16::from(ch.sequence_control) << 8) | u16::from(ch.channel_control)
            }
            regs::DMA_TRANSFER_COUNTER => ch.transfer_counter,
            regs::DMA_MEMORY_ADDRESS_HI => (ch.memory_address_counter >> 16) as u16,
            regs::DMA_MEMORY_ADDRESS_LO => ch.memory_address_counter as u16,
            regs::DMA_DEVICE_ADDRESS_HI => (ch.device_address_counter >> 16) as u16,
            regs::DMA_DEVICE_ADDRESS_LO => ch.device_address_counter as u16,
            _ => return None,
        };
        scc_log!(
            self,
            LogChannels::DMA,
            "channel {index} read {reg:02x} = {value:04x} & {mem_mask:04x}"
        );
        Some(value)
    }

    pub(crate) fn dma_w(&mut self, offset: u32, data: u16, mem_mask: u16) -> bool {
        let (index, reg) = split(offset);
        let Some(ch) = self.dma.channel.get_mut(index) else {
            return false;
        };
        let mut irq_changed = false;
        match reg {
            regs::DMA_STATUS_ERROR => {
                if regs::high_lane(mem_mask) {
                    ch.channel_status &= !((data >> 8) as u8 & STATUS_CLEARABLE);
                    irq_changed = true;
                }
            }
            regs::DMA_DEVICE_OPERATION => {
                if regs::low_lane(mem_mask) {
                    ch.operation_control = data as u8;
                }
                if regs::high_lane(mem_mask) {
                    ch.device_control = (data >> 8) as u8;
                }
            }
            regs::DMA_SEQUENCE_CHANNEL => {
                if regs::low_lane(mem_mask) {
                    ch.channel_control = data as u8 & 0x7f;
                    if data as u8 & CCR_SO != 0 {
                        ch.channel_status |= CSR_COC;
                    }
                    irq_changed = true;
                }
                if regs::high_lane(mem_mask) {
                    ch.sequence_control = (data >> 8) as u8;
                }
            }
            regs::DMA_TRANSFER_COUNTER => combine_data(&mut ch.transfer_counter, data, mem_mask),
            regs::DMA_MEMORY_ADDRESS_HI | regs::DMA_MEMORY_ADDRESS_LO => write_half(
                &mut ch.memory_address_counter,
                reg == regs::DMA_MEMORY_ADDRESS_HI,
                data,
                mem_mask,
            ),
            regs::DMA_DEVICE_ADDRESS_HI | regs::DMA_DEVICE_ADDRESS_LO => write_half(
                &mut ch.device_address_counter,
                reg == regs::DMA_DEVICE_ADDRESS_HI,
                data,
                mem_mask,
            ),
            _ => return false,
        }
        scc_log!(
            self,
            LogChannels::DMA,
            "channel {index} write {reg:02x} = {data:04x} & {mem_mask:04x}"
        );
        if irq_changed {
            self.update_ipl();
        }
        true
    }
}
