//! In-process arena backed by a growable `Vec<u8>`.

use parking_lot::RwLock;

use super::{check_align, checked_layout, Arena};
use crate::error::{Error, Result};

/// An [`Arena`] backed by a plain heap buffer, doubling capacity on growth.
///
/// No file is involved; `sync()` is a no-op. Useful for tests and for
/// workloads that don't need persistence across process restarts.
pub struct HeapArena {
    inner: RwLock<HeapInner>,
}

struct HeapInner {
    buf: Vec<u8>,
    used: usize,
}

impl HeapArena {
    /// Create a new heap arena with the given initial capacity.
    #[must_use]
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            inner: RwLock::new(HeapInner {
                buf: vec![0u8; initial_capacity],
                used: 0,
            }),
        }
    }
}

impl Default for HeapArena {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl Arena for HeapArena {
    fn alloc(&self, size: usize, align: usize) -> Result<u32> {
        check_align(align)?;
        let mut inner = self.inner.write();
        let (aligned, end) = checked_layout(inner.used, size, align)
            .ok_or_else(|| Error::Full("allocation would overflow arena".into()))?;
        if end > inner.buf.len() {
            let mut new_cap = inner.buf.len().max(1);
            while new_cap < end {
                new_cap = new_cap.saturating_mul(2);
            }
            inner.buf.resize(new_cap, 0);
        }
        inner.used = end;
        u32::try_from(aligned)
            .map_err(|_| Error::Full("arena offset exceeds u32 range".into()))
    }

    fn slice(&self, offset: u32, len: usize) -> Result<Vec<u8>> {
        let inner = self.inner.read();
        let start = offset as usize;
        let end = start
            .checked_add(len)
            .ok_or_else(|| Error::InvalidArg("slice range overflows".into()))?;
        if end > inner.used {
            return Err(Error::InvalidArg(format!(
                "slice [{start}, {end}) out of bounds (used = {})",
                inner.used
            )));
        }
        Ok(inner.buf[start..end].to_vec())
    }

    fn write_at(&self, offset: u32, bytes: &[u8]) -> Result<()> {
        let mut inner = self.inner.write();
        let start = offset as usize;
        let end = start
            .checked_add(bytes.len())
            .ok_or_else(|| Error::InvalidArg("write range overflows".into()))?;
        if end > inner.used {
            return Err(Error::InvalidArg(format!(
                "write [{start}, {end}) out of bounds (used = {})",
                inner.used
            )));
        }
        inner.buf[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn reset(&self) {
        self.inner.write().used = 0;
    }

    fn reset_secure(&self) {
        let mut inner = self.inner.write();
        inner.buf.iter_mut().for_each(|b| *b = 0);
        inner.used = 0;
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }

    fn grow(&self, new_size: usize) -> Result<()> {
        let mut inner = self.inner.write();
        if new_size > inner.buf.len() {
            inner.buf.resize(new_size, 0);
        }
        Ok(())
    }

    fn used(&self) -> usize {
        self.inner.read().used
    }

    fn capacity(&self) -> usize {
        self.inner.read().buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_advances_bump_pointer() {
        let arena = HeapArena::new(16);
        let a = arena.alloc(4, 4).unwrap();
        let b = arena.alloc(4, 4).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 4);
    }

    #[test]
    fn alloc_grows_past_initial_capacity() {
        let arena = HeapArena::new(4);
        let off = arena.alloc(100, 1).unwrap();
        assert_eq!(off, 0);
        assert!(arena.capacity() >= 100);
    }

    #[test]
    fn write_then_slice_round_trips() {
        let arena = HeapArena::new(16);
        let off = arena.alloc(5, 1).unwrap();
        arena.write_at(off, b"hello").unwrap();
        assert_eq!(arena.slice(off, 5).unwrap(), b"hello");
    }

    #[test]
    fn reset_rewinds_without_clearing() {
        let arena = HeapArena::new(16);
        let off = arena.alloc(5, 1).unwrap();
        arena.write_at(off, b"hello").unwrap();
        arena.reset();
        assert_eq!(arena.used(), 0);
        let off2 = arena.alloc(4, 1).unwrap();
        assert_eq!(off2, 0);
    }

    #[test]
    fn reset_secure_zeroes_buffer() {
        let arena = HeapArena::new(16);
        let off = arena.alloc(5, 1).unwrap();
        arena.write_at(off, b"hello").unwrap();
        arena.reset_secure();
        arena.grow(16).unwrap();
        let off2 = arena.alloc(5, 1).unwrap();
        assert_eq!(arena.slice(off2, 5).unwrap(), vec![0u8; 5]);
    }

    #[test]
    fn slice_out_of_bounds_errors() {
        let arena = HeapArena::new(16);
        assert!(arena.slice(0, 4).is_err());
    }

    fn odd_align_rejected() -> Result<()> {
        let arena = HeapArena::new(16);
        arena.alloc(4, 3)?;
        Ok(())
    }

    #[test]
    fn rejects_non_power_of_two_alignment() {
        assert!(odd_align_rejected().is_err());
    }
}
