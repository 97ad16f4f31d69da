use crate::logging::{scc_log, LogChannels};
use crate::regs;
use crate::Scc68070;

/// I2C interface registers. There is no bus engine behind them; firmware
/// sees whatever it last wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct I2c {
    pub data: u8,
    pub address: u8,
    pub status: u8,
    pub control: u8,
    pub clock_control: u8,
}

/// Status bit 4 (LRB) always reads clear.
const STATUS_READ_MASK: u8 = 0xef;

impl I2c {
    fn register(&mut self, offset: u32) -> Option<&mut u8> {
        Some(match offset {
            regs::I2C_DATA => &mut self.data,
            regs::I2C_ADDRESS => &mut self.address,
            regs::I2C_STATUS => &mut self.status,
            regs::I2C_CONTROL => &mut self.control,
            regs::I2C_CLOCK_CONTROL => &mut self.clock_control,
            _ => return None,
        })
    }
}

impl Scc68070 {
    pub(crate) fn i2c_r(&mut self, offset: u32, mem_mask: u16) -> Option<u16> {
        let value = *self.i2c.register(offset)?;
        let value = if offset == regs::I2C_STATUS {
            value & STATUS_READ_MASK
        } else {
            value
        };
        if regs::low_lane(mem_mask) {
            scc_log!(self, LogChannels::I2C, "read {offset:04x} = {value:02x}");
        }
        Some(u16::from(value))
    }

    pub(crate) fn i2c_w(&mut self, offset: u32, data: u16, mem_mask: u16) -> bool {
        let Some(register) = self.i2c.register(offset) else {
            return false;
        };
        if regs::low_lane(mem_mask) {
            *register = data as u8;
            scc_log!(self, LogChannels::I2C, "write {offset:04x} = {:02x}", data as u8);
        }
        true
    }

    pub fn i2c(&self) -> &I2c {
        &self.i2c
    }
}
