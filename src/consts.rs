#![allow(non_upper_case_globals)]

/// Register addresses of the chip (6-bit, framed by the bus layer before
/// they ever hit the wire).
pub struct PcdRegister;

impl PcdRegister {
    pub const CommandReg: u8 = 0x01;
    pub const ComIEnReg: u8 = 0x02;
    pub const ComIrqReg: u8 = 0x04;
    pub const DivIrqReg: u8 = 0x05;
    pub const ErrorReg: u8 = 0x06;
    pub const FIFODataReg: u8 = 0x09;
    pub const FIFOLevelReg: u8 = 0x0A;
    pub const ControlReg: u8 = 0x0C;
    pub const BitFramingReg: u8 = 0x0D;
    pub const ModeReg: u8 = 0x11;
    pub const TxControlReg: u8 = 0x14;
    pub const TxASKReg: u8 = 0x15;
    pub const CRCResultRegH: u8 = 0x21;
    pub const CRCResultRegL: u8 = 0x22;
    pub const TModeReg: u8 = 0x2A;
    pub const TPrescalerReg: u8 = 0x2B;
    pub const TReloadRegH: u8 = 0x2C;
    pub const TReloadRegL: u8 = 0x2D;
    pub const VersionReg: u8 = 0x37;
}

/// Hardware commands written to CommandReg.
pub struct PcdCommand;

impl PcdCommand {
    pub const Idle: u8 = 0x00;
    pub const CalcCRC: u8 = 0x03;
    pub const Transmit: u8 = 0x04;
    pub const Receive: u8 = 0x08;
    pub const Transceive: u8 = 0x0C;
    pub const MFAuthent: u8 = 0x0E;
    pub const SoftReset: u8 = 0x0F;
}

/// Command bytes sent over RF to the card. Separate namespace from
/// [`PcdCommand`], these go into the FIFO as payload.
pub struct PiccCommand;

impl PiccCommand {
    /// REQuest type A, invites idle cards. 7-bit short frame.
    pub const REQA: u8 = 0x26;
    /// Wake-UP type A, also invites halted cards. 7-bit short frame.
    pub const WUPA: u8 = 0x52;
    /// Anti-collision, cascade level 1.
    pub const ANTICOLL: u8 = 0x93;
    /// Select. Same byte as ANTICOLL, distinguished by the NVB that follows.
    pub const SELECT: u8 = 0x93;
    pub const AUTH_KEY_A: u8 = 0x60;
    pub const AUTH_KEY_B: u8 = 0x61;
    pub const READ: u8 = 0x30;
    pub const WRITE: u8 = 0xA0;
    pub const HLTA: u8 = 0x50;
}

/// ErrorReg bits that fail a command: BufferOvfl | CollErr | CRCErr | ProtocolErr.
pub const ERROR_REG_FAIL_MASK: u8 = 0x1B;

/// Driver failures. Expected conditions (no card in the field, card went
/// silent) are not in here, they are ordinary return values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcdError {
    /// Chip error flags, card timeout or wall-clock timeout. The engine
    /// cannot tell these apart and does not pretend to.
    Comm,
    /// The CRC coprocessor never raised its ready flag within the poll bound.
    CrcTimeout,
    /// The response would not fit the receive buffer.
    NoRoom,
    /// Operation attempted before `init()` completed on this handle.
    NotReady,
}
