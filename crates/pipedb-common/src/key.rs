//! Repository keys
//!
//! A [`Key`] borrows the caller's bytes for the duration of a single
//! repository call. It never copies on construction; the only copies are
//! the explicit [`Key::copy_as_string`] and [`Key::to_vec`].
//!
//! Keys also carry two derived numbers:
//! - a partition index that shards the key space into `N` equal-width
//!   buckets by reading the key's leading bytes as a big-endian unsigned
//!   integer of the requested width,
//! - a 32-bit one-at-a-time hash for in-memory lookup tables.

use crate::chunk::Chunk;
use crate::error::{Error, Result};

/// Unsigned integer widths a key can be partitioned by
pub trait PartitionWidth: Copy + Into<u64> {
    /// Number of leading key bytes consumed
    const BYTES: usize;
    /// Upper bound of the value range
    const MAX: u64;

    /// Narrow a bucket index known to fit this width
    fn from_bucket(bucket: u64) -> Self;
}

macro_rules! impl_partition_width {
    ($($t:ty),*) => {$(
        impl PartitionWidth for $t {
            const BYTES: usize = std::mem::size_of::<$t>();
            const MAX: u64 = <$t>::MAX as u64;

            fn from_bucket(bucket: u64) -> Self {
                <$t>::try_from(bucket).unwrap_or(<$t>::MAX)
            }
        }
    )*};
}

impl_partition_width!(u8, u16, u32, u64);

/// Bucket of `value` among `n` equal-width buckets over `[0, max]`.
///
/// The last bucket absorbs the remainder of the range. When there are more
/// buckets than values, each value is its own bucket.
const fn bucket_of(value: u64, max: u64, n: u64) -> u64 {
    let increment = max / n;
    if increment == 0 {
        return value;
    }
    let bucket = value / increment;
    if bucket < n { bucket } else { n - 1 }
}

/// Immutable key referring to caller-owned bytes
#[derive(Debug)]
pub struct Key<'a> {
    data: &'a [u8],
}

impl<'a> Key<'a> {
    /// Create a key that refers to `data`
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Number of bytes referenced
    #[must_use]
    pub const fn size(&self) -> usize {
        self.data.len()
    }

    /// The referenced bytes
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// True if the key starts at the same address as `other`
    #[must_use]
    pub fn referencing(&self, other: &[u8]) -> bool {
        std::ptr::eq(self.data.as_ptr(), other.as_ptr())
    }

    /// Copy of the referenced bytes as a string, invalid UTF-8 replaced
    #[must_use]
    pub fn copy_as_string(&self) -> String {
        String::from_utf8_lossy(self.data).into_owned()
    }

    /// Copy of the referenced bytes
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Partition index among `n` buckets using the first `T::BYTES` bytes.
    pub fn partition<T: PartitionWidth>(&self, n: usize) -> Result<T> {
        if n == 0 {
            return Err(Error::NoPartitions);
        }
        let prefix = self.data.get(..T::BYTES).ok_or(Error::KeyTooShort {
            required: T::BYTES,
            actual: self.data.len(),
        })?;
        let value = prefix
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        let n = u64::try_from(n).unwrap_or(u64::MAX);
        Ok(T::from_bucket(bucket_of(value, T::MAX, n)))
    }

    pub fn to_8bit_index(&self, n: usize) -> Result<u8> {
        self.partition::<u8>(n)
    }

    pub fn to_16bit_index(&self, n: usize) -> Result<u16> {
        self.partition::<u16>(n)
    }

    pub fn to_32bit_index(&self, n: usize) -> Result<u32> {
        self.partition::<u32>(n)
    }

    pub fn to_64bit_index(&self, n: usize) -> Result<u64> {
        self.partition::<u64>(n)
    }

    /// Bob Jenkins' one-at-a-time hash of the key bytes
    #[must_use]
    pub fn lookup_hash(&self) -> u32 {
        let mut h: u32 = 0;
        for &b in self.data {
            h = h.wrapping_add(u32::from(b));
            h = h.wrapping_add(h << 10);
            h ^= h >> 6;
        }
        h = h.wrapping_add(h << 3);
        h ^= h >> 11;
        h.wrapping_add(h << 15)
    }
}

impl PartialEq for Key<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.data.len() == other.data.len()
            && (self.referencing(other.data) || self.data == other.data)
    }
}

impl Eq for Key<'_> {}

impl Chunk for Key<'_> {
    fn data(&self) -> &[u8] {
        self.data
    }
}

impl<'a> From<&'a [u8]> for Key<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Key<'a> {
    fn from(data: &'a [u8; N]) -> Self {
        Self::new(data)
    }
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(s: &'a str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl<'a> From<&'a String> for Key<'a> {
    fn from(s: &'a String) -> Self {
        Self::new(s.as_bytes())
    }
}

impl<'a> From<&'a Vec<u8>> for Key<'a> {
    fn from(v: &'a Vec<u8>) -> Self {
        Self::new(v)
    }
}
