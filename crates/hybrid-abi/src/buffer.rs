//! Shared byte buffers.
//!
//! Buffers cross the bridge by sharing, never by copying: both sides hold
//! a reference to the same allocation and the bytes live until the last
//! reference is dropped.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// An immutable, reference-counted view over a byte allocation.
#[derive(Clone)]
pub struct SharedBuffer {
    data: Arc<[u8]>,
    start: usize,
    end: usize,
}

impl SharedBuffer {
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let data: Arc<[u8]> = Arc::from(bytes);
        let end = data.len();
        Self { data, start: 0, end }
    }

    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self::from_vec(bytes.to_vec())
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_slice(&self) -> &[u8] {
        self.data.get(self.start..self.end).unwrap_or(&[])
    }

    /// A sub-view of this buffer sharing the same allocation.
    ///
    /// Returns `None` when the range does not fit inside this view.
    pub fn slice(&self, range: Range<usize>) -> Option<SharedBuffer> {
        if range.start > range.end || range.end > self.len() {
            return None;
        }
        Some(Self {
            data: Arc::clone(&self.data),
            start: self.start + range.start,
            end: self.start + range.end,
        })
    }

    /// Whether both views are backed by the same allocation.
    pub fn shares_allocation(&self, other: &SharedBuffer) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Number of live views on the underlying allocation.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }
}

impl From<Vec<u8>> for SharedBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_vec(bytes)
    }
}

impl AsRef<[u8]> for SharedBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl PartialEq for SharedBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for SharedBuffer {}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("len", &self.len())
            .field("holders", &self.holders())
            .finish()
    }
}
