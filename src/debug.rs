//! Display helpers. Pure transforms over already-read data, nothing in here
//! touches the bus.

use core::fmt::Write;

use heapless::String;

/// Uppercase hex rendering of a 4-byte identifier, e.g. `12345A78`.
pub fn uid_hex(uid: &[u8; 4]) -> String<8> {
    let mut out: String<8> = String::new();
    for b in uid {
        _ = out.write_fmt(format_args!("{:02X}", b));
    }

    out
}
