#![allow(dead_code)]

use std::cell::{Cell, RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use embedded_hal::spi::{ErrorType, Operation, SpiDevice};

thread_local! {
    static CLOCK_US: Cell<u64> = Cell::new(0);
    static TICK_US: Cell<u64> = Cell::new(1_000);
}

/// Deterministic stand-in for the driver's microsecond clock: every call
/// advances time by the configured tick, so spin loops always make progress.
pub fn fake_now() -> u64 {
    let tick = TICK_US.with(|t| t.get());
    CLOCK_US.with(|c| {
        let v = c.get();
        c.set(v + tick);
        v
    })
}

/// Resets the fake clock and sets how far it jumps per observation.
pub fn set_clock_tick_us(tick: u64) {
    TICK_US.with(|t| t.set(tick));
    CLOCK_US.with(|c| c.set(0));
}

/// Scripted SPI device. Records every chip-select-bracketed MOSI frame and
/// every decoded register write; serves register reads from per-register
/// queues, falling back to per-register defaults, then zero.
#[derive(Default)]
pub struct MockSpi {
    defaults: HashMap<u8, u8>,
    queues: HashMap<u8, VecDeque<u8>>,
    /// Raw outgoing bytes of each transaction, in order.
    pub frames: Vec<Vec<u8>>,
    /// (register, value) for every payload byte written.
    pub writes: Vec<(u8, u8)>,
    /// Register address of every read performed.
    pub reads: Vec<u8>,
}

impl MockSpi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default(&mut self, reg: u8, val: u8) {
        self.defaults.insert(reg, val);
    }

    pub fn queue_read(&mut self, reg: u8, val: u8) {
        self.queues.entry(reg).or_default().push_back(val);
    }

    pub fn queue_reads(&mut self, reg: u8, vals: &[u8]) {
        for &v in vals {
            self.queue_read(reg, v);
        }
    }

    /// Drops recorded traffic, keeping the read script.
    pub fn clear_log(&mut self) {
        self.frames.clear();
        self.writes.clear();
        self.reads.clear();
    }

    /// Values written to one register, in order.
    pub fn writes_to(&self, reg: u8) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(r, _)| *r == reg)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn read_count(&self, reg: u8) -> usize {
        self.reads.iter().filter(|&&r| r == reg).count()
    }

    fn next_read(&mut self, reg: u8) -> u8 {
        self.reads.push(reg);
        if let Some(v) = self.queues.get_mut(&reg).and_then(|q| q.pop_front()) {
            return v;
        }
        self.defaults.get(&reg).copied().unwrap_or(0)
    }
}

fn reg_of(framed_addr: u8) -> u8 {
    (framed_addr >> 1) & 0x3F
}

impl ErrorType for MockSpi {
    type Error = core::convert::Infallible;
}

impl SpiDevice for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut frame: Vec<u8> = Vec::new();
        let mut addr: Option<u8> = None;

        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    for &b in bytes.iter() {
                        frame.push(b);
                        match addr {
                            None => addr = Some(b),
                            Some(a) => {
                                assert_eq!(a & 0x80, 0, "payload write in a read transaction");
                                self.writes.push((reg_of(a), b));
                            }
                        }
                    }
                }
                Operation::Transfer(read, write) => {
                    frame.extend_from_slice(write);
                    let a = addr.expect("transfer before an address byte");
                    assert_ne!(a & 0x80, 0, "transfer in a write transaction");
                    for slot in read.iter_mut() {
                        *slot = self.next_read(reg_of(a));
                    }
                }
                Operation::TransferInPlace(buff) => {
                    frame.extend_from_slice(buff);
                    let a = addr.expect("transfer before an address byte");
                    assert_ne!(a & 0x80, 0, "transfer in a write transaction");
                    for slot in buff.iter_mut() {
                        *slot = self.next_read(reg_of(a));
                    }
                }
                _ => panic!("unexpected SPI operation"),
            }
        }

        self.frames.push(frame);
        Ok(())
    }
}

/// Cloneable handle so a test can keep scripting and inspecting the mock
/// after handing it to the driver.
#[derive(Clone, Default)]
pub struct SharedSpi(Rc<RefCell<MockSpi>>);

impl SharedSpi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mock(&self) -> RefMut<'_, MockSpi> {
        self.0.borrow_mut()
    }
}

impl ErrorType for SharedSpi {
    type Error = core::convert::Infallible;
}

impl SpiDevice for SharedSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.0.borrow_mut().transaction(operations)
    }
}
