//! Read-only byte view shared by keys and blocks

/// Anything exposing a size and a read-only view of its bytes.
pub trait Chunk {
    /// Read-only view of the bytes
    fn data(&self) -> &[u8];

    /// Number of bytes in the view
    fn size(&self) -> usize {
        self.data().len()
    }

    /// True when the view holds no bytes
    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}
