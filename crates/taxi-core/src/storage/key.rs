//! Key encoding.
//!
//! Ids are stored as 8-byte big-endian integers so lexicographic key order
//! matches numeric order. Relation rows use a 16-byte composite key
//! `[left id][right id]`, which makes "all rows for a left id" a prefix scan.

/// Size of an encoded id.
pub const ID_SIZE: usize = 8;

/// Size of an encoded composite key.
pub const PAIR_KEY_SIZE: usize = ID_SIZE * 2;

/// Encode an id.
pub fn encode_id(id: u64) -> [u8; ID_SIZE] {
    id.to_be_bytes()
}

/// Decode an id, or `None` when the slice has the wrong length.
pub fn decode_id(bytes: &[u8]) -> Option<u64> {
    let bytes: [u8; ID_SIZE] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Composite key of a relation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub left: u64,
    pub right: u64,
}

impl PairKey {
    pub fn new(left: u64, right: u64) -> Self {
        Self { left, right }
    }

    pub fn encode(&self) -> [u8; PAIR_KEY_SIZE] {
        let mut buf = [0u8; PAIR_KEY_SIZE];
        buf[..ID_SIZE].copy_from_slice(&self.left.to_be_bytes());
        buf[ID_SIZE..].copy_from_slice(&self.right.to_be_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PAIR_KEY_SIZE {
            return None;
        }
        Some(Self {
            left: decode_id(&bytes[..ID_SIZE])?,
            right: decode_id(&bytes[ID_SIZE..])?,
        })
    }

    /// Scan prefix for every row with the given left id.
    pub fn prefix(left: u64) -> [u8; ID_SIZE] {
        encode_id(left)
    }
}
