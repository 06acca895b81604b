//! UIO device discovery and validation
//!
//! Builds a [`UioDescriptor`] from the device's sysfs attribute tree,
//! gating on device identity before any mapping is attempted. Mapping and
//! writing an unexpected device's register window is exactly the failure
//! this check exists to prevent, so both the type and version attributes
//! must match their expected literals.

use std::path::{Path, PathBuf};

use crate::attr::{read_attr, ATTR_LEN};
use crate::error::{Result, UioError};
use crate::parse::parse_base0;

/// Sysfs class directory where the kernel registers UIO devices.
pub const SYSFS_UIO_PATH: &str = "/sys/class/uio";

/// Expected content of the `name` attribute.
pub const EXPECTED_NAME: &str = "scratch";

/// Expected content of the `version` attribute.
pub const EXPECTED_VERSION: &str = "devicetree";

/// A validated UIO device and the geometry of its first map region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UioDescriptor {
    /// Device name as registered by the kernel (e.g. `uio0`).
    name: String,

    /// Attribute tree root this descriptor was built from.
    sysfs_root: PathBuf,

    /// Offset of the window within the device's address space.
    /// Informational only; the mapping itself always starts at file
    /// offset 0.
    map_offset: u64,

    /// Byte length of the mappable register window. Always > 0.
    map_size: u64,
}

impl UioDescriptor {
    /// Probe a device under the system sysfs tree (`/sys/class/uio`).
    ///
    /// # Errors
    ///
    /// See [`probe_root`](Self::probe_root).
    pub fn probe(device_name: &str) -> Result<Self> {
        Self::probe_root(Path::new(SYSFS_UIO_PATH), device_name)
    }

    /// Probe a device under an explicit sysfs root.
    ///
    /// Validates the device name, reads the identity attributes, and parses
    /// the map0 geometry. Attribute reads happen strictly in order: `name`
    /// is checked before `version` is even read, and geometry only after
    /// both identity checks pass.
    ///
    /// # Errors
    ///
    /// Returns [`UioError::InvalidDeviceName`] for names that could escape
    /// the sysfs root, [`UioError::UnexpectedType`] /
    /// [`UioError::UnexpectedVersion`] on identity mismatch,
    /// [`UioError::MalformedOffset`] / [`UioError::MalformedSize`] /
    /// [`UioError::ZeroSizeWindow`] on bad geometry, and the
    /// [`UioError::AttrOpen`] / [`UioError::AttrRead`] variants when an
    /// attribute file is missing or unreadable.
    pub fn probe_root(sysfs_root: &Path, device_name: &str) -> Result<Self> {
        validate_device_name(device_name)?;

        let root = sysfs_root.join(device_name);

        let name = read_attr(&root, "name", ATTR_LEN)?;
        if name != EXPECTED_NAME {
            return Err(UioError::UnexpectedType { found: name });
        }

        let version = read_attr(&root, "version", ATTR_LEN)?;
        if version != EXPECTED_VERSION {
            return Err(UioError::UnexpectedVersion { found: version });
        }

        let offset_text = read_attr(&root, "maps/map0/offset", ATTR_LEN)?;
        let map_offset =
            parse_base0(&offset_text).ok_or(UioError::MalformedOffset { text: offset_text })?;

        let size_text = read_attr(&root, "maps/map0/size", ATTR_LEN)?;
        let map_size =
            parse_base0(&size_text).ok_or(UioError::MalformedSize { text: size_text })?;
        if map_size == 0 {
            return Err(UioError::ZeroSizeWindow);
        }

        tracing::info!("Map size: {map_size:#x}");

        Ok(Self {
            name: device_name.to_owned(),
            sysfs_root: root,
            map_offset,
            map_size,
        })
    }

    /// Device name this descriptor was probed from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute tree root of the device.
    pub fn sysfs_root(&self) -> &Path {
        &self.sysfs_root
    }

    /// Offset of the register window within the device's address space.
    pub const fn map_offset(&self) -> u64 {
        self.map_offset
    }

    /// Byte length of the mappable register window.
    pub const fn map_size(&self) -> u64 {
        self.map_size
    }

    /// Character device node backing this device.
    pub fn device_path(&self) -> PathBuf {
        Path::new("/dev").join(&self.name)
    }
}

/// Reject device names that would change the constructed paths.
///
/// The name is an opaque identifier supplied on the command line and is
/// concatenated into both the sysfs root and the `/dev` node path, so path
/// separators, NUL, and the dot entries must never pass through.
fn validate_device_name(name: &str) -> Result<()> {
    let rejected = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\0');

    if rejected {
        return Err(UioError::InvalidDeviceName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Lay out a fake `/sys/class/uio/<name>` tree.
    fn fake_tree(root: &TempDir, device: &str, attrs: &[(&str, &str)]) {
        let dev_root = root.path().join(device);
        fs::create_dir_all(dev_root.join("maps/map0")).unwrap();
        for (rel, content) in attrs {
            fs::write(dev_root.join(rel), content).unwrap();
        }
    }

    const GOOD: &[(&str, &str)] = &[
        ("name", "scratch\n"),
        ("version", "devicetree\n"),
        ("maps/map0/offset", "0x0\n"),
        ("maps/map0/size", "0x1000\n"),
    ];

    #[test]
    fn probes_well_formed_device() {
        let root = TempDir::new().unwrap();
        fake_tree(&root, "uio0", GOOD);

        let desc = UioDescriptor::probe_root(root.path(), "uio0").unwrap();
        assert_eq!(desc.name(), "uio0");
        assert_eq!(desc.map_offset(), 0);
        assert_eq!(desc.map_size(), 0x1000);
        assert_eq!(desc.device_path(), Path::new("/dev/uio0"));
    }

    #[test]
    fn decimal_geometry_accepted() {
        let root = TempDir::new().unwrap();
        fake_tree(
            &root,
            "uio0",
            &[
                ("name", "scratch\n"),
                ("version", "devicetree\n"),
                ("maps/map0/offset", "4096\n"),
                ("maps/map0/size", "4096\n"),
            ],
        );

        let desc = UioDescriptor::probe_root(root.path(), "uio0").unwrap();
        assert_eq!(desc.map_offset(), 4096);
        assert_eq!(desc.map_size(), 4096);
    }

    #[test]
    fn wrong_type_rejected_before_version_is_read() {
        let root = TempDir::new().unwrap();
        // No version attribute at all: the type check must fire first.
        let dev_root = root.path().join("uio0");
        fs::create_dir_all(&dev_root).unwrap();
        fs::write(dev_root.join("name"), "other\n").unwrap();

        let err = UioDescriptor::probe_root(root.path(), "uio0").unwrap_err();
        assert!(
            matches!(err, UioError::UnexpectedType { ref found } if found == "other"),
            "{err}"
        );
    }

    #[test]
    fn wrong_version_rejected() {
        let root = TempDir::new().unwrap();
        fake_tree(
            &root,
            "uio0",
            &[("name", "scratch\n"), ("version", "pci\n")],
        );

        let err = UioDescriptor::probe_root(root.path(), "uio0").unwrap_err();
        assert!(
            matches!(err, UioError::UnexpectedVersion { ref found } if found == "pci"),
            "{err}"
        );
    }

    #[test]
    fn unparseable_offset_rejected() {
        let root = TempDir::new().unwrap();
        fake_tree(
            &root,
            "uio0",
            &[
                ("name", "scratch\n"),
                ("version", "devicetree\n"),
                ("maps/map0/offset", "junk\n"),
                ("maps/map0/size", "0x1000\n"),
            ],
        );

        let err = UioDescriptor::probe_root(root.path(), "uio0").unwrap_err();
        assert!(matches!(err, UioError::MalformedOffset { .. }), "{err}");
    }

    #[test]
    fn zero_size_window_rejected() {
        let root = TempDir::new().unwrap();
        fake_tree(
            &root,
            "uio0",
            &[
                ("name", "scratch\n"),
                ("version", "devicetree\n"),
                ("maps/map0/offset", "0x0\n"),
                ("maps/map0/size", "0\n"),
            ],
        );

        let err = UioDescriptor::probe_root(root.path(), "uio0").unwrap_err();
        assert!(matches!(err, UioError::ZeroSizeWindow), "{err}");
    }

    #[test]
    fn missing_device_is_attr_open_error() {
        let root = TempDir::new().unwrap();

        let err = UioDescriptor::probe_root(root.path(), "uio9").unwrap_err();
        assert!(matches!(err, UioError::AttrOpen { .. }), "{err}");
    }

    #[test]
    fn traversal_names_rejected() {
        let root = TempDir::new().unwrap();

        for name in ["", ".", "..", "../uio0", "a/b", "uio\0"] {
            let err = UioDescriptor::probe_root(root.path(), name).unwrap_err();
            assert!(
                matches!(err, UioError::InvalidDeviceName { .. }),
                "{name:?} not rejected"
            );
        }
    }
}
