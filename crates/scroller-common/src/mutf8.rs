//! Modified UTF-8, the string encoding of tag files.
//!
//! Differs from standard UTF-8 in two ways:
//! - U+0000 is written as the two bytes `C0 80`
//! - Supplementary characters are written as a surrogate pair, three bytes
//!   per surrogate
//!
//! Any string without either of those encodes to the same bytes as UTF-8.

/// Encodes `s` as modified UTF-8.
pub(crate) fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

/// Decodes modified UTF-8. Returns `None` on a malformed sequence or an
/// unpaired surrogate.
pub(crate) fn decode(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();

    while let Some(byte) = iter.next() {
        let unit = match byte {
            0x01..=0x7F => u16::from(byte),
            0xC0..=0xDF => {
                let low = continuation(iter.next())?;
                (u16::from(byte & 0x1F) << 6) | low
            }
            0xE0..=0xEF => {
                let mid = continuation(iter.next())?;
                let low = continuation(iter.next())?;
                (u16::from(byte & 0x0F) << 12) | (mid << 6) | low
            }
            _ => return None,
        };
        units.push(unit);
    }

    String::from_utf16(&units).ok()
}

fn continuation(byte: Option<u8>) -> Option<u16> {
    byte.filter(|b| b & 0xC0 == 0x80).map(|b| u16::from(b & 0x3F))
}
