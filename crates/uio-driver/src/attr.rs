//! Sysfs attribute reading
//!
//! UIO attribute files are small single-line text files with a trailing
//! newline. [`read_attr`] reads one into a bounded buffer and normalizes it
//! so the result can be compared and parsed directly.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, UioError};

/// Buffer size for a single attribute read.
///
/// Large enough for every attribute this driver consumes (`name`, `version`,
/// and the hex-formatted map geometry). Content beyond this is truncated, so
/// a returned value never exceeds `ATTR_LEN - 1` characters.
pub const ATTR_LEN: usize = 20;

/// Read one attribute file under `root` and normalize its content.
///
/// Reads at most `max_len` bytes, then truncates at the first line
/// terminator (or NUL) since attribute files append a trailing newline.
/// The file descriptor is closed before returning, on success and failure
/// alike.
///
/// # Errors
///
/// Returns [`UioError::AttrOpen`] if the file cannot be opened and
/// [`UioError::AttrRead`] if a read fails mid-way.
pub fn read_attr(root: &Path, relative: &str, max_len: usize) -> Result<String> {
    let path = root.join(relative);

    tracing::debug!("Reading attribute {}", path.display());

    let mut file = File::open(&path).map_err(|source| UioError::AttrOpen {
        path: path.clone(),
        source,
    })?;

    let mut buf = vec![0u8; max_len];
    let mut filled = 0;
    while filled < buf.len() {
        let n = file
            .read(&mut buf[filled..])
            .map_err(|source| UioError::AttrRead {
                path: path.clone(),
                source,
            })?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    // Reserve one slot for the terminator, matching the attribute
    // convention of a bounded C string.
    let end = filled.min(max_len.saturating_sub(1));
    let cut = buf[..end]
        .iter()
        .position(|&b| b == b'\n' || b == b'\0')
        .unwrap_or(end);
    let value = String::from_utf8_lossy(&buf[..cut]).into_owned();

    tracing::debug!("Attribute {} = {value:?}", path.display());

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_attr(dir: &TempDir, name: &str, content: &[u8]) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn strips_trailing_newline() {
        let dir = TempDir::new().unwrap();
        write_attr(&dir, "name", b"scratch\n");

        let value = read_attr(dir.path(), "name", ATTR_LEN).unwrap();
        assert_eq!(value, "scratch");
    }

    #[test]
    fn value_without_newline_passes_through() {
        let dir = TempDir::new().unwrap();
        write_attr(&dir, "name", b"scratch");

        let value = read_attr(dir.path(), "name", ATTR_LEN).unwrap();
        assert_eq!(value, "scratch");
    }

    #[test]
    fn truncates_at_first_newline() {
        let dir = TempDir::new().unwrap();
        write_attr(&dir, "multi", b"first\nsecond\n");

        let value = read_attr(dir.path(), "multi", ATTR_LEN).unwrap();
        assert_eq!(value, "first");
    }

    #[test]
    fn long_content_bounded_to_max_len_minus_one() {
        let dir = TempDir::new().unwrap();
        write_attr(&dir, "long", &[b'x'; 64]);

        let value = read_attr(dir.path(), "long", ATTR_LEN).unwrap();
        assert_eq!(value.len(), ATTR_LEN - 1);
    }

    #[test]
    fn missing_attribute_is_open_error() {
        let dir = TempDir::new().unwrap();

        let err = read_attr(dir.path(), "absent", ATTR_LEN).unwrap_err();
        assert!(matches!(err, UioError::AttrOpen { .. }), "{err}");
    }

    #[test]
    fn joins_nested_relative_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("maps/map0")).unwrap();
        write_attr(&dir, "maps/map0/size", b"0x1000\n");

        let value = read_attr(dir.path(), "maps/map0/size", ATTR_LEN).unwrap();
        assert_eq!(value, "0x1000");
    }
}
