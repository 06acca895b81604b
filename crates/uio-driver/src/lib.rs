//! Userspace driver for the `scratch` UIO device.
//!
//! Linux UIO exposes a hardware register window through two kernel
//! interfaces: a sysfs attribute tree under `/sys/class/uio/<dev>/`
//! describing the device, and a character node `/dev/<dev>` whose first
//! map region can be `mmap`ed into the process. This crate walks that
//! pipeline end to end:
//!
//! 1. read and normalize the device's sysfs attributes ([`attr`]),
//! 2. validate identity and derive the window geometry ([`UioDescriptor`]),
//! 3. map the register window ([`MappedRegister`]),
//! 4. perform a bounds-checked 32-bit little-endian register write
//!    ([`WriteRequest`]).
//!
//! # Quick start
//!
//! ```no_run
//! use uio_driver::{MappedRegister, UioDescriptor, WriteRequest};
//!
//! # fn main() -> uio_driver::Result<()> {
//! let desc = UioDescriptor::probe("uio0")?;
//! let mut reg = MappedRegister::open(&desc)?;
//!
//! WriteRequest { offset: 0x10, width_bits: 32, value: 0x1 }.apply(&mut reg)?;
//! # Ok(())
//! # }
//! ```
//!
//! Every failure is a typed [`UioError`] carrying the path, attribute text,
//! or OS error needed to diagnose it without re-running. All operations are
//! single-shot: there is no retry policy anywhere in the pipeline.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod attr;
mod discovery;
mod error;
mod mmio;
pub mod parse;

pub use discovery::{UioDescriptor, EXPECTED_NAME, EXPECTED_VERSION, SYSFS_UIO_PATH};
pub use error::{Result, UioError};
pub use mmio::{MappedRegister, WriteRequest};
