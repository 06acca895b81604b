//! `uio` — command-line tool for the scratch UIO device.
//!
//! ```text
//! USAGE:
//!   uio DEVICE_NAME                      Discover, validate and map the device
//!   uio DEVICE_NAME OFFSET BITS VALUE    Additionally perform one register write
//! ```
//!
//! OFFSET, BITS and VALUE are base-0 integers (decimal or `0x`-prefixed
//! hex). Only 32-bit writes are supported. Exit status is 0 on full
//! success and non-zero otherwise, with a distinct code per pipeline
//! stage; callers should rely only on zero versus non-zero.

use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use uio_driver::parse::parse_base0;
use uio_driver::{MappedRegister, UioDescriptor, UioError, WriteRequest};

#[derive(Debug, Parser)]
#[command(name = "uio", about = "Map a scratch UIO device and optionally write one register", version)]
struct Cli {
    /// UIO device name under /sys/class/uio (e.g. uio0).
    #[arg(value_name = "DEVICE_NAME")]
    device: String,

    /// Byte offset of the register write (base-0 integer).
    #[arg(value_name = "OFFSET", requires = "bits")]
    offset: Option<String>,

    /// Write width in bits; only 32 is supported.
    #[arg(value_name = "BITS", requires = "value")]
    bits: Option<String>,

    /// Value to store (base-0 integer, must fit in 32 bits).
    #[arg(value_name = "VALUE")]
    value: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("uio: {e:#}");
            let code = e.downcast_ref::<UioError>().map_or(1, UioError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let desc = UioDescriptor::probe(&cli.device)?;
    println!("Map size: {:#x}", desc.map_size());

    let mut register = MappedRegister::open(&desc)?;

    if let (Some(offset), Some(bits), Some(value)) = (&cli.offset, &cli.bits, &cli.value) {
        let request = parse_write(offset, bits, value)?;
        request.apply(&mut register)?;
        println!("Wrote {:#x} at offset {:#x}", request.value, request.offset);
    }

    Ok(())
}

/// Parse the three write operands, each independently from its own slot.
fn parse_write(offset: &str, bits: &str, value: &str) -> Result<WriteRequest> {
    let offset = parse_base0(offset)
        .ok_or_else(|| anyhow!("OFFSET is not a base-0 integer: {offset:?}"))?;
    let offset = usize::try_from(offset).context("OFFSET does not fit in usize")?;

    let bits = parse_base0(bits)
        .and_then(|b| u32::try_from(b).ok())
        .ok_or_else(|| anyhow!("BITS is not a base-0 integer: {bits:?}"))?;

    let value_text = value;
    let value = parse_base0(value_text)
        .ok_or_else(|| anyhow!("VALUE is not a base-0 integer: {value_text:?}"))?;
    let value = u32::try_from(value)
        .map_err(|_| anyhow!("VALUE does not fit in 32 bits: {value_text:?}"))?;

    Ok(WriteRequest {
        offset,
        width_bits: bits,
        value,
    })
}
