#![no_std]

use consts::PcdError;
use embedded_hal::spi::Operation;

pub mod consts;
pub mod debug;
pub mod pcd;
pub mod picc;

/// Knobs for the two bounded wait loops. Defaults match the chip's
/// expected response times; tests shrink them to run without real delays.
#[derive(Debug, Clone, Copy)]
pub struct Rc522Config {
    /// Wall-clock budget for one command engine invocation, in milliseconds.
    pub timeout_ms: u64,
    /// Iteration bound for the CRC coprocessor ready poll.
    pub crc_poll_limit: u16,
}

impl Default for Rc522Config {
    fn default() -> Self {
        Self {
            timeout_ms: 200,
            crc_poll_limit: 255,
        }
    }
}

/// Driver handle for one RC522 chip behind one SPI device.
///
/// The chip is a singleton and none of its commands are reentrant, so every
/// operation takes `&mut self`; a concurrent host has to serialize access
/// around a single owner.
pub struct Rc522<S>
where
    S: embedded_hal::spi::SpiDevice,
{
    spi: S,
    get_current_time: fn() -> u64,
    config: Rc522Config,
    initialized: bool,
}

impl<S> Rc522<S>
where
    S: embedded_hal::spi::SpiDevice,
{
    /// `get_current_time` returns microseconds from any monotonic source.
    pub fn new(spi: S, get_current_time: fn() -> u64) -> Self {
        Self::with_config(spi, get_current_time, Rc522Config::default())
    }

    pub fn with_config(spi: S, get_current_time: fn() -> u64, config: Rc522Config) -> Self {
        Self {
            spi,
            get_current_time,
            config,
            initialized: false,
        }
    }

    /// Busy-waits on the injected clock. The driver has no async context to
    /// yield to, same as the rest of the wait loops.
    pub fn sleep(&self, time_ms: u64) {
        let start_time = (self.get_current_time)();
        while (self.get_current_time)() - start_time < time_ms * 1_000 {}
    }

    pub fn write_reg(&mut self, reg: u8, val: u8) -> Result<(), PcdError> {
        self.spi
            .transaction(&mut [Operation::Write(&[(reg << 1) & 0x7E, val])])
            .map_err(|_| PcdError::Comm)?;

        Ok(())
    }

    pub fn write_reg_buff(&mut self, reg: u8, values: &[u8]) -> Result<(), PcdError> {
        self.spi
            .transaction(&mut [
                Operation::Write(&[(reg << 1) & 0x7E]),
                Operation::Write(values),
            ])
            .map_err(|_| PcdError::Comm)?;

        Ok(())
    }

    /// Diagnostic escape hatch; also the read half of every RMW helper.
    pub fn read_reg(&mut self, reg: u8) -> Result<u8, PcdError> {
        let mut read = [0; 1];
        self.spi
            .transaction(&mut [
                Operation::Write(&[((reg << 1) & 0x7E) | 0x80]),
                Operation::Transfer(&mut read, &[0]),
            ])
            .map_err(|_| PcdError::Comm)?;

        Ok(read[0])
    }

    /// Burst read. The chip streams the addressed register on every clocked
    /// byte, so the framed read address is re-sent for all but the last byte
    /// and a zero terminates the burst.
    pub fn read_reg_buff(&mut self, reg: u8, buff: &mut [u8]) -> Result<(), PcdError> {
        if buff.is_empty() {
            return Ok(());
        }

        let addr = ((reg << 1) & 0x7E) | 0x80;
        let count = buff.len();
        buff[..count - 1].fill(addr);
        buff[count - 1] = 0;

        self.spi
            .transaction(&mut [
                Operation::Write(&[addr]),
                Operation::TransferInPlace(buff),
            ])
            .map_err(|_| PcdError::Comm)?;

        Ok(())
    }

    pub fn set_register_bit_mask(&mut self, reg: u8, mask: u8) -> Result<(), PcdError> {
        let tmp = self.read_reg(reg)?;
        self.write_reg(reg, tmp | mask)?;

        Ok(())
    }

    pub fn clear_register_bit_mask(&mut self, reg: u8, mask: u8) -> Result<(), PcdError> {
        let tmp = self.read_reg(reg)?;
        self.write_reg(reg, tmp & !mask)?;

        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> Rc522Config {
        self.config
    }

    pub(crate) fn now(&self) -> u64 {
        (self.get_current_time)()
    }

    pub(crate) fn ensure_ready(&self) -> Result<(), PcdError> {
        if self.initialized {
            Ok(())
        } else {
            Err(PcdError::NotReady)
        }
    }

    pub(crate) fn mark_ready(&mut self) {
        self.initialized = true;
    }
}
