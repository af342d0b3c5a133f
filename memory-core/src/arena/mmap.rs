//! Arena backed by a `MAP_SHARED` memory-mapped file.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use parking_lot::RwLock;

use super::{check_align, checked_layout, Arena};
use crate::error::{Error, Result};

/// An [`Arena`] backed by `memmap2::MmapMut` over a file on disk.
///
/// `grow()` remaps the file when the OS can't extend the mapping in place;
/// any previously returned byte slices are plain owned `Vec<u8>` copies, so
/// a remap can never leave a caller holding a dangling reference — that is
/// the entire point of `Arena::slice` returning owned bytes instead of a
/// pointer into the mapping.
pub struct MmapArena {
    path: PathBuf,
    inner: RwLock<MmapInner>,
}

struct MmapInner {
    file: File,
    mmap: MmapMut,
    used: usize,
}

impl MmapArena {
    /// Open (creating if absent) a memory-mapped arena backed by `path`,
    /// with at least `initial_capacity` bytes reserved.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be created, sized, or mapped.
    pub fn open(path: impl AsRef<Path>, initial_capacity: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        let capacity = initial_capacity.max(1);
        file.set_len(capacity as u64)?;
        // SAFETY: `file` is owned exclusively by this arena for its lifetime;
        // no other process is expected to truncate it concurrently.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self {
            path,
            inner: RwLock::new(MmapInner {
                file,
                mmap,
                used: 0,
            }),
        })
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Arena for MmapArena {
    fn alloc(&self, size: usize, align: usize) -> Result<u32> {
        check_align(align)?;
        let mut inner = self.inner.write();
        let (aligned, end) = checked_layout(inner.used, size, align)
            .ok_or_else(|| Error::Full("allocation would overflow arena".into()))?;
        if end > inner.mmap.len() {
            let mut new_cap = inner.mmap.len().max(1);
            while new_cap < end {
                new_cap = new_cap.saturating_mul(2);
            }
            grow_inner(&mut inner, new_cap)?;
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
        Ok(inner.mmap[start..end].to_vec())
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
        inner.mmap[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn reset(&self) {
        self.inner.write().used = 0;
    }

    fn reset_secure(&self) {
        let mut inner = self.inner.write();
        inner.mmap.iter_mut().for_each(|b| *b = 0);
        inner.used = 0;
    }

    fn sync(&self) -> Result<()> {
        let inner = self.inner.read();
        inner.mmap.flush()?;
        Ok(())
    }

    fn grow(&self, new_size: usize) -> Result<()> {
        let mut inner = self.inner.write();
        if new_size > inner.mmap.len() {
            grow_inner(&mut inner, new_size)?;
        }
        Ok(())
    }

    fn used(&self) -> usize {
        self.inner.read().used
    }

    fn capacity(&self) -> usize {
        self.inner.read().mmap.len()
    }
}

/// Extends the backing file and remaps it. The old mapping is dropped only
/// after the new one is established, so a failed remap leaves `inner`
/// untouched (the `?` propagates before any field is overwritten).
fn grow_inner(inner: &mut MmapInner, new_size: usize) -> Result<()> {
    inner.mmap.flush()?;
    inner.file.set_len(new_size as u64)?;
    // SAFETY: same invariant as `open` — exclusive ownership of `file`.
    let new_mmap = unsafe { MmapMut::map_mut(&inner.file)? };
    inner.mmap = new_mmap;
    Ok(())
}
