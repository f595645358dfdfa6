use std::cmp::Ordering;
use std::fmt;

/// Length in bytes of every record.
pub const RECORD_LEN: usize = 100;
/// Length of the sort key prefix.
pub const KEY_LEN: usize = 10;

/// A fixed-size record. The first `KEY_LEN` bytes are the sort key, compared
/// as an unsigned big-endian byte string; the rest is opaque payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Record([u8; RECORD_LEN]);

impl Record {
    pub fn new(bytes: [u8; RECORD_LEN]) -> Self {
        Self(bytes)
    }

    /// Copies a record out of a slice of exactly `RECORD_LEN` bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; RECORD_LEN] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn key(&self) -> &[u8] {
        &self.0[..KEY_LEN]
    }

    /// The high-order key byte, the only part the partition function reads.
    pub fn first_key_byte(&self) -> u8 {
        self.0[0]
    }

    pub fn as_bytes(&self) -> &[u8; RECORD_LEN] {
        &self.0
    }

    pub fn cmp_key(&self, other: &Record) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record(key=")?;
        for byte in self.key() {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

/// Stable ascending sort by key prefix. Payload bytes never affect the order.
pub fn sort_records(records: &mut [Record]) {
    records.sort_by(Record::cmp_key);
}
