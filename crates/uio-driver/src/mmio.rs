//! Memory-mapped register window
//!
//! Maps a UIO device's first map region into the process and exposes a
//! bounds-checked 32-bit little-endian register write. Unsafe code is
//! confined to the mmap/munmap calls and the volatile byte stores, each
//! with its preconditions established immediately before use.

use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use rustix::fs::OFlags;
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};

use crate::discovery::UioDescriptor;
use crate::error::{Result, UioError};

/// A live shared read-write mapping of a device register window.
///
/// The device node is opened `O_RDWR | O_SYNC` so stores reach the hardware
/// page immediately rather than a writeback cache. The descriptor is closed
/// as soon as the mapping exists; the mapping itself keeps the device
/// pinned and is released in `Drop` on every exit path.
///
/// The backing device file may be concurrently mapped by another process or
/// by the kernel driver. Register writes are not transactional and provide
/// no isolation from such external access.
pub struct MappedRegister {
    ptr: NonNull<u8>,
    size: usize,
    path: PathBuf,
}

impl std::fmt::Debug for MappedRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegister")
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("size", &self.size)
            .field("path", &self.path)
            .finish()
    }
}

// SAFETY: MappedRegister owns the mapping exclusively; moving it between
// threads does not invalidate it (mmap'd memory is process-wide) and no
// thread-local state is involved.
unsafe impl Send for MappedRegister {}

// SAFETY: writes require &mut self, so the borrow checker enforces
// exclusive access; the remaining &self methods never touch the mapped
// memory.
unsafe impl Sync for MappedRegister {}

impl MappedRegister {
    /// Open and map the register window of a validated device.
    ///
    /// Derives the device node path (`/dev/<name>`) and window size from
    /// the descriptor.
    ///
    /// # Errors
    ///
    /// See [`open_path`](Self::open_path).
    pub fn open(descriptor: &UioDescriptor) -> Result<Self> {
        // Truncation acceptable: UIO map sizes fit in usize on 64-bit
        // (our only target).
        #[allow(clippy::cast_possible_truncation)]
        let size = descriptor.map_size() as usize;

        Self::open_path(&descriptor.device_path(), size)
    }

    /// Open `path` read-write synchronous and map `size` bytes from file
    /// offset 0, shared.
    ///
    /// # Errors
    ///
    /// Returns [`UioError::OpenDevice`] if the node cannot be opened and
    /// [`UioError::Mmap`] if the kernel refuses the mapping.
    ///
    /// # Panics
    ///
    /// Panics if `rustix::mm::mmap` returns a null pointer on success
    /// (should never happen per rustix API contract).
    pub fn open_path(path: &Path, size: usize) -> Result<Self> {
        tracing::debug!("Opening device {}", path.display());

        // OFlags bits are small positive values, the wrap cannot occur.
        #[allow(clippy::cast_possible_wrap)]
        let sync_flag = OFlags::SYNC.bits() as i32;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(sync_flag)
            .open(path)
            .map_err(|source| UioError::OpenDevice {
                path: path.to_path_buf(),
                source,
            })?;

        // SAFETY: mmap is required to reach the register window. The fd was
        // just opened read-write, size comes from the caller and a failure
        // for any size the kernel rejects (including 0) surfaces as Err.
        // MAP_SHARED + PROT_READ|PROT_WRITE matches device-memory semantics;
        // the returned pointer is valid for `size` bytes until munmap.
        let ptr = unsafe {
            let addr = mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                0,
            )
            .map_err(|source| UioError::Mmap { source })?;

            NonNull::new(addr.cast::<u8>()).expect("mmap returned null on success")
        };

        tracing::info!("Mapped {size:#x} bytes of {} at {ptr:p}", path.display());

        // `file` drops here: the mapping keeps the device open, the
        // descriptor itself is no longer needed.
        Ok(Self {
            ptr,
            size,
            path: path.to_path_buf(),
        })
    }

    /// Store `value` little-endian at `offset..offset + 4`.
    ///
    /// The store is byte-wise: no assumption that the device tolerates a
    /// single 32-bit bus-width access. With `O_SYNC` device semantics the
    /// write is immediately visible to anything else mapping the window.
    ///
    /// # Errors
    ///
    /// Returns [`UioError::OutOfRange`] if the four bytes would not fit in
    /// the mapped window; the mapping is not touched in that case.
    pub fn write_u32_le(&mut self, offset: usize, value: u32) -> Result<()> {
        const WIDTH: usize = 4;

        let in_bounds = offset
            .checked_add(WIDTH)
            .is_some_and(|end| end <= self.size);
        if !in_bounds {
            return Err(UioError::OutOfRange {
                offset,
                width: WIDTH,
                size: self.size,
            });
        }

        tracing::trace!("Write u32 @ {offset:#x} = {value:#x}");

        let bytes = value.to_le_bytes();
        // SAFETY: bounds validated above (offset + 4 <= self.size, no
        // overflow); ptr is valid for self.size bytes for the lifetime of
        // the mapping; byte stores have alignment 1; write_volatile keeps
        // the compiler from reordering or eliding device-memory stores.
        unsafe {
            let base = self.ptr.as_ptr().add(offset);
            for (i, byte) in bytes.iter().enumerate() {
                base.add(i).write_volatile(*byte);
            }
        }

        Ok(())
    }

    /// Size of the mapped window in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Path of the device node this window was mapped from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MappedRegister {
    fn drop(&mut self) {
        // SAFETY: ptr/size are exactly what mmap returned in open_path, and
        // Drop runs at most once.
        unsafe {
            if let Err(e) = munmap(self.ptr.as_ptr().cast(), self.size) {
                tracing::error!("munmap failed during drop: {e}");
            }
        }
        tracing::debug!("Unmapped {}", self.path.display());
    }
}

/// One requested register write, as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRequest {
    /// Byte offset into the mapped window.
    pub offset: usize,
    /// Requested access width in bits. Only 32 is supported.
    pub width_bits: u32,
    /// Value to store.
    pub value: u32,
}

impl WriteRequest {
    /// Validate the width and perform the write.
    ///
    /// # Errors
    ///
    /// Returns [`UioError::UnsupportedWidth`] for any width other than 32
    /// bits, before the mapping is touched; otherwise propagates
    /// [`MappedRegister::write_u32_le`] errors.
    pub fn apply(&self, register: &mut MappedRegister) -> Result<()> {
        if self.width_bits != 32 {
            return Err(UioError::UnsupportedWidth {
                bits: self.width_bits,
            });
        }
        register.write_u32_le(self.offset, self.value)
    }
}
