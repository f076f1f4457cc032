use crate::{
    consts::{PcdError, PcdRegister, PiccCommand},
    pcd::PiccResponse,
    Rc522,
};
use heapless::Vec;

/// A 4-byte identifier pulled out of anti-collision, tagged with the outcome
/// of its BCC check.
///
/// A mismatching check byte does not discard the read: the identifier is
/// still handed back, the caller decides whether to trust it. See
/// [`UidRead::bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UidRead {
    /// The 5th byte matched the XOR of the identifier bytes.
    Valid([u8; 4]),
    /// The check byte disagreed; these 4 bytes may be corrupt.
    BccMismatch([u8; 4]),
}

impl UidRead {
    pub fn bytes(&self) -> &[u8; 4] {
        match self {
            UidRead::Valid(b) | UidRead::BccMismatch(b) => b,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, UidRead::Valid(_))
    }
}

impl<S> Rc522<S>
where
    S: embedded_hal::spi::SpiDevice,
{
    /// True when a card in the field answers a REQA. Fail-closed before
    /// `init()` and on any communication failure.
    pub fn is_card_present(&mut self) -> bool {
        match self.picc_request_a() {
            Ok(atqa) => !atqa.data.is_empty(),
            Err(_) => false,
        }
    }

    /// Polls idle cards with REQA and returns the raw ATQA response.
    pub fn picc_request_a(&mut self) -> Result<PiccResponse, PcdError> {
        self.picc_request(PiccCommand::REQA)
    }

    /// Wakes halted cards too.
    pub fn picc_wakeup_a(&mut self) -> Result<PiccResponse, PcdError> {
        self.picc_request(PiccCommand::WUPA)
    }

    fn picc_request(&mut self, cmd: u8) -> Result<PiccResponse, PcdError> {
        self.ensure_ready()?;

        // REQA/WUPA are 7-bit short frames.
        self.write_reg(PcdRegister::BitFramingReg, 0x07)?;
        self.pcd_transceive(&[cmd])
    }

    /// Single-card anti-collision: REQA, then cascade level 1 with NVB 0x20,
    /// yielding 4 identifier bytes plus their XOR check byte.
    ///
    /// `None` means no card answered or the exchange broke down partway;
    /// the two are not told apart.
    pub fn read_uid(&mut self) -> Option<UidRead> {
        let atqa = self.picc_request_a().ok()?;
        if atqa.data.is_empty() {
            return None;
        }

        // Anti-collision frames are byte-aligned again.
        self.write_reg(PcdRegister::BitFramingReg, 0x00).ok()?;
        let response = self
            .pcd_transceive(&[PiccCommand::ANTICOLL, 0x20])
            .ok()?;
        if response.data.len() < 5 {
            return None;
        }

        let uid: [u8; 4] = response.data[..4].try_into().ok()?;
        let bcc = uid.iter().fold(0u8, |acc, b| acc ^ b);

        if bcc == response.data[4] {
            Some(UidRead::Valid(uid))
        } else {
            Some(UidRead::BccMismatch(uid))
        }
    }

    /// Sends HLTA with its hardware CRC. A halted card stays silent, which
    /// the engine reports as a communication failure; that silence is the
    /// success outcome here, and an actual reply is the failure.
    pub fn halt(&mut self) -> Result<(), PcdError> {
        self.ensure_ready()?;

        let mut buff: Vec<u8, 4> = Vec::new();
        _ = buff.push(PiccCommand::HLTA);
        _ = buff.push(0);
        let crc = self.pcd_calc_crc(&buff)?;
        _ = buff.extend_from_slice(&crc);

        self.write_reg(PcdRegister::BitFramingReg, 0x00)?;
        match self.pcd_transceive(&buff) {
            Err(PcdError::Comm) => Ok(()),
            Ok(_) => Err(PcdError::Comm),
            Err(e) => Err(e),
        }
    }
}
