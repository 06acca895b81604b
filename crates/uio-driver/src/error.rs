//! Error types for UIO device operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for UIO operations
pub type Result<T> = std::result::Result<T, UioError>;

/// Errors that can occur while discovering, mapping, or writing a UIO device
#[derive(Debug, Error)]
pub enum UioError {
    /// Sysfs attribute file could not be opened
    #[error("Cannot open attribute {path}: {source}")]
    AttrOpen {
        /// Full path of the attribute file
        path: PathBuf,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// Sysfs attribute file could not be read
    #[error("Cannot read attribute {path}: {source}")]
    AttrRead {
        /// Full path of the attribute file
        path: PathBuf,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// Device name contains path separators or other rejected characters
    #[error("Invalid UIO device name: {name:?}")]
    InvalidDeviceName {
        /// The offending name
        name: String,
    },

    /// The `name` attribute did not match the expected device type
    #[error("Unexpected UIO type: {found}")]
    UnexpectedType {
        /// Value actually read from the `name` attribute
        found: String,
    },

    /// The `version` attribute did not match the expected value
    #[error("Unexpected UIO version: {found}")]
    UnexpectedVersion {
        /// Value actually read from the `version` attribute
        found: String,
    },

    /// `maps/map0/offset` did not parse as a base-0 integer
    #[error("Malformed map0 offset attribute: {text:?}")]
    MalformedOffset {
        /// The attribute text that failed to parse
        text: String,
    },

    /// `maps/map0/size` did not parse as a base-0 integer
    #[error("Malformed map0 size attribute: {text:?}")]
    MalformedSize {
        /// The attribute text that failed to parse
        text: String,
    },

    /// `maps/map0/size` parsed to zero; a zero-length window cannot be mapped
    #[error("Map window size is zero")]
    ZeroSizeWindow,

    /// Device node could not be opened read-write
    #[error("Cannot open device {path}: {source}")]
    OpenDevice {
        /// Device node path
        path: PathBuf,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// The mmap syscall failed
    #[error("mmap failed: {source}")]
    Mmap {
        /// Errno returned by the kernel
        source: rustix::io::Errno,
    },

    /// A register access would fall outside the mapped window
    #[error("Out of bounds write: offset={offset:#x}, width={width}, window={size:#x}")]
    OutOfRange {
        /// Requested byte offset
        offset: usize,
        /// Access width in bytes
        width: usize,
        /// Size of the mapped window
        size: usize,
    },

    /// Only 32-bit register writes are supported
    #[error("Unsupported write width: {bits} bits")]
    UnsupportedWidth {
        /// Requested width in bits
        bits: u32,
    },
}

impl UioError {
    /// Process exit code for this error's pipeline stage.
    ///
    /// Each stage gets a distinct non-zero code so a failing invocation can
    /// be attributed from the exit status alone. The specific values are not
    /// a stable interface; callers should rely only on zero versus non-zero.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::AttrOpen { .. } | Self::AttrRead { .. } => 2,
            Self::InvalidDeviceName { .. }
            | Self::UnexpectedType { .. }
            | Self::UnexpectedVersion { .. } => 3,
            Self::MalformedOffset { .. } | Self::MalformedSize { .. } | Self::ZeroSizeWindow => 4,
            Self::OpenDevice { .. } | Self::Mmap { .. } => 5,
            Self::OutOfRange { .. } => 6,
            Self::UnsupportedWidth { .. } => 7,
        }
    }
}
