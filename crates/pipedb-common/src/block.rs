//! Value blocks exchanged with a repository
//!
//! [`InputBlock`] borrows the bytes to be written. [`OutputBlock`] owns the
//! bytes produced by a read, since they must outlive the backend call that
//! produced them.

use crate::chunk::Chunk;

/// Immutable block referring to caller-owned bytes to be written
#[derive(Debug)]
pub struct InputBlock<'a> {
    data: &'a [u8],
}

impl<'a> InputBlock<'a> {
    /// Create a block that refers to `data`
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

    /// True if the block starts at the same address as `other`
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
}

impl PartialEq for InputBlock<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.data.len() == other.data.len()
            && (self.referencing(other.data) || self.data == other.data)
    }
}

impl Eq for InputBlock<'_> {}

impl Chunk for InputBlock<'_> {
    fn data(&self) -> &[u8] {
        self.data
    }
}

impl<'a> From<&'a [u8]> for InputBlock<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for InputBlock<'a> {
    fn from(data: &'a [u8; N]) -> Self {
        Self::new(data)
    }
}

impl<'a> From<&'a str> for InputBlock<'a> {
    fn from(s: &'a str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl<'a> From<&'a String> for InputBlock<'a> {
    fn from(s: &'a String) -> Self {
        Self::new(s.as_bytes())
    }
}

impl<'a> From<&'a Vec<u8>> for InputBlock<'a> {
    fn from(v: &'a Vec<u8>) -> Self {
        Self::new(v)
    }
}

/// Owned block filled by a successful read
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputBlock {
    data: Vec<u8>,
}

impl OutputBlock {
    /// Create an empty output block
    #[must_use]
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Replace the contents with a copy of `data`
    pub fn set_data(&mut self, data: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(data);
    }

    /// Copy of the bytes as a string, invalid UTF-8 replaced
    #[must_use]
    pub fn copy_as_string(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Take ownership of the bytes
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl Chunk for OutputBlock {
    fn data(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for OutputBlock {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}
