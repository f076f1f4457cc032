use crate::{
    consts::{PcdCommand, PcdError, PcdRegister, ERROR_REG_FAIL_MASK},
    Rc522,
};
use heapless::Vec;

/// Interrupt enable / wait masks for the Transceive command. Everything else
/// runs with a narrow enable and no wait flag at all, meaning the engine
/// returns as soon as the command is issued.
const TRANSCEIVE_IRQ_EN: u8 = 0x77;
const TRANSCEIVE_WAIT_IRQ: u8 = 0x30;
const DEFAULT_IRQ_EN: u8 = 0x12;

const TIMER_IRQ: u8 = 0x01;
const CRC_IRQ: u8 = 0x04;

/// FIFO depth of the chip.
pub const FIFO_SIZE: usize = 64;

/// What came back from one command engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiccResponse {
    /// Bytes drained from the FIFO, in receive order. Empty for every
    /// command other than Transceive.
    pub data: Vec<u8, FIFO_SIZE>,
    /// Valid bits in the last byte, 0 meaning the whole byte counts.
    pub valid_bits: u8,
}

impl PiccResponse {
    fn empty() -> Self {
        Self {
            data: Vec::new(),
            valid_bits: 0,
        }
    }
}

impl<S> Rc522<S>
where
    S: embedded_hal::spi::SpiDevice,
{
    /// Chip bring-up: soft reset, protocol timer, 100% ASK modulation,
    /// CRC preset 0x6363, antenna on. Runs the full sequence every time it
    /// is called; redundant but harmless on a second call.
    pub fn init(&mut self) -> Result<(), PcdError> {
        self.pcd_reset()?;

        // Timeout timer: TAuto=1, prescaler and reload chosen so a silent
        // card trips the timer IRQ a few ms after transmission ends.
        self.write_reg(PcdRegister::TModeReg, 0x8D)?;
        self.write_reg(PcdRegister::TPrescalerReg, 0x3E)?;
        self.write_reg(PcdRegister::TReloadRegH, 0x00)?;
        self.write_reg(PcdRegister::TReloadRegL, 0x1E)?;

        self.write_reg(PcdRegister::TxASKReg, 0x40)?;
        self.write_reg(PcdRegister::ModeReg, 0x3D)?;

        self.pcd_antenna_on()?;

        self.mark_ready();
        Ok(())
    }

    pub fn pcd_reset(&mut self) -> Result<(), PcdError> {
        self.write_reg(PcdRegister::CommandReg, PcdCommand::SoftReset)?;

        // The power-down bit stays up while the chip reboots, max 3 tries.
        for _ in 0..3 {
            let out = self.read_reg(PcdRegister::CommandReg)?;
            if out & (1 << 4) == 0 {
                break;
            }

            self.sleep(50);
        }

        Ok(())
    }

    /// Turns the antenna drivers on, skipping the write when they already are.
    pub fn pcd_antenna_on(&mut self) -> Result<(), PcdError> {
        let val = self.read_reg(PcdRegister::TxControlReg)?;
        if (val & 0x03) != 0x03 {
            self.write_reg(PcdRegister::TxControlReg, val | 0x03)?;
        }

        Ok(())
    }

    pub fn pcd_antenna_off(&mut self) -> Result<(), PcdError> {
        self.clear_register_bit_mask(PcdRegister::TxControlReg, 0x03)
    }

    pub fn pcd_version(&mut self) -> Result<u8, PcdError> {
        self.read_reg(PcdRegister::VersionReg)
    }

    /// Runs the chip's CRC coprocessor over `data` and returns `[low, high]`.
    ///
    /// The ready poll is a bounded busy loop, not wall-clock: the coprocessor
    /// finishes in well under a millisecond, so exhausting the bound means the
    /// chip is gone, reported as `CrcTimeout` rather than a zeroed result.
    pub fn pcd_calc_crc(&mut self, data: &[u8]) -> Result<[u8; 2], PcdError> {
        self.ensure_ready()?;

        self.write_reg(PcdRegister::CommandReg, PcdCommand::Idle)?;
        self.write_reg(PcdRegister::DivIrqReg, CRC_IRQ)?;
        self.write_reg(PcdRegister::FIFOLevelReg, 0x80)?;
        self.write_reg_buff(PcdRegister::FIFODataReg, data)?;
        self.write_reg(PcdRegister::CommandReg, PcdCommand::CalcCRC)?;

        for _ in 0..self.config().crc_poll_limit {
            let n = self.read_reg(PcdRegister::DivIrqReg)?;
            if n & CRC_IRQ != 0 {
                let low = self.read_reg(PcdRegister::CRCResultRegL)?;
                let high = self.read_reg(PcdRegister::CRCResultRegH)?;
                return Ok([low, high]);
            }
        }

        Err(PcdError::CrcTimeout)
    }

    /// Transceive with the configured default timeout.
    pub fn pcd_transceive(&mut self, send_data: &[u8]) -> Result<PiccResponse, PcdError> {
        let timeout_ms = self.config().timeout_ms;
        self.pcd_to_card(PcdCommand::Transceive, send_data, timeout_ms)
    }

    /// The command engine: loads `send_data` into the FIFO, issues `cmd`,
    /// waits for completion and, for Transceive, drains the response.
    ///
    /// Chip error flags, the card-silence timer and the `timeout_ms`
    /// wall-clock guard all surface as the same `Comm` failure.
    pub fn pcd_to_card(
        &mut self,
        cmd: u8,
        send_data: &[u8],
        timeout_ms: u64,
    ) -> Result<PiccResponse, PcdError> {
        self.ensure_ready()?;

        let (irq_en, wait_irq) = if cmd == PcdCommand::Transceive {
            (TRANSCEIVE_IRQ_EN, TRANSCEIVE_WAIT_IRQ)
        } else {
            (DEFAULT_IRQ_EN, 0x00)
        };

        self.write_reg(PcdRegister::ComIEnReg, irq_en | 0x80)?;
        self.clear_register_bit_mask(PcdRegister::ComIrqReg, 0x80)?;
        self.set_register_bit_mask(PcdRegister::FIFOLevelReg, 0x80)?;
        self.write_reg(PcdRegister::CommandReg, PcdCommand::Idle)?;

        self.write_reg_buff(PcdRegister::FIFODataReg, send_data)?;

        self.write_reg(PcdRegister::CommandReg, cmd)?;
        if cmd == PcdCommand::Transceive {
            // StartSend kicks off the RF transmission.
            self.set_register_bit_mask(PcdRegister::BitFramingReg, 0x80)?;
        }

        let wait_result = self.wait_for_irq(wait_irq, timeout_ms);

        // StartSend comes back down on every exit path.
        self.clear_register_bit_mask(PcdRegister::BitFramingReg, 0x80)?;
        wait_result?;

        let error = self.read_reg(PcdRegister::ErrorReg)?;
        let irq = self.read_reg(PcdRegister::ComIrqReg)?;
        if irq & TIMER_IRQ != 0 || error & ERROR_REG_FAIL_MASK != 0 {
            return Err(PcdError::Comm);
        }

        let mut response = PiccResponse::empty();
        if cmd == PcdCommand::Transceive {
            let n = self.read_reg(PcdRegister::FIFOLevelReg)? as usize;
            response
                .data
                .resize_default(n)
                .map_err(|_| PcdError::NoRoom)?;
            self.read_reg_buff(PcdRegister::FIFODataReg, &mut response.data)?;
            response.valid_bits = self.read_reg(PcdRegister::ControlReg)? & 0x07;
        }

        Ok(response)
    }

    /// Tight spin on ComIrqReg. A zero `wait_irq` returns after the first
    /// read; commands that do not transmit have nothing to wait for.
    fn wait_for_irq(&mut self, wait_irq: u8, timeout_ms: u64) -> Result<(), PcdError> {
        let start = self.now();
        loop {
            let n = self.read_reg(PcdRegister::ComIrqReg)?;
            if wait_irq == 0 || n & wait_irq != 0 {
                return Ok(());
            }
            if n & TIMER_IRQ != 0 {
                // Timer IRQ: the card never answered.
                return Err(PcdError::Comm);
            }
            if self.now() - start >= timeout_ms * 1_000 {
                // Wall-clock guard against a wedged chip.
                return Err(PcdError::Comm);
            }
        }
    }
}
