//! Little endian base-128 integers as used throughout Cryptonote serialization

pub fn serialize(mut n: u64) -> Vec<u8> {
    let mut vec = Vec::new();

    while n > 127 {
        vec.push(128 | n as u8);
        n >>= 7;
    }

    vec.push(n as u8);

    vec
}

/// Decodes a varint from the start of `bytes`
///
/// # Returns
/// The decoded value and the number of bytes it occupied, or `None` if the input ends
/// before the varint does or the value overflows a u64
pub fn deserialize(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut n: u64 = 0;
    let mut shift = 0;

    for (position, byte) in bytes.iter().enumerate() {
        if shift >= 64 || (shift == 63 && byte & 127 > 1) {
            return None;
        }
        n |= ((byte & 127) as u64) << shift;
        shift += 7;

        if *byte < 128 {
            return Some((n, position + 1));
        }
    }

    None
}
