//! Device registration.
//!
//! [`register`] validates a lower half, builds the [`PowerLed`] session
//! around it and publishes that session in a [`DeviceRegistry`] under a
//! path such as `/dev/powerled0`. [`DevTable`] is a flat in-memory
//! registry for kernels without a device filesystem and for tests.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::config::PowerLedConfig;
use crate::dispatch::Command;
use crate::error::PowerError;
use crate::log::LogLevel;
use crate::ops::{OpSet, PowerLedOps};
use crate::services::PlatformServices;
use crate::session::PowerLed;
use crate::sync::SpinLock;
use crate::{powerled_info, powerled_log};

bitflags::bitflags! {
    /// Unix-style access mode of a device node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileMode: u16 {
        /// Owner may read.
        const OWNER_READ = 0o400;
        /// Owner may write.
        const OWNER_WRITE = 0o200;
        /// Group may read.
        const GROUP_READ = 0o040;
        /// Group may write.
        const GROUP_WRITE = 0o020;
        /// Others may read.
        const OTHER_READ = 0o004;
        /// Others may write.
        const OTHER_WRITE = 0o002;
    }
}

impl FileMode {
    /// Read-only for everyone (`0444`). Power LED nodes are published
    /// with this mode; control goes through `ioctl`.
    pub const READ_ALL: Self = Self::OWNER_READ
        .union(Self::GROUP_READ)
        .union(Self::OTHER_READ);
}

/// Character-device face of a registered driver.
pub trait DeviceNode: Send + Sync {
    /// Opens a reference to the device.
    fn open(&self) -> Result<(), PowerError>;

    /// Closes a reference to the device.
    fn close(&self) -> Result<(), PowerError>;

    /// Executes a control command.
    fn ioctl(&self, cmd: Command<'_>) -> Result<usize, PowerError>;

    /// Returns the access mode the node should be published with.
    fn permissions(&self) -> FileMode;

    /// Reads from the device. Power LEDs have no data path.
    fn read(&self, _buf: &mut [u8]) -> Result<usize, PowerError> {
        Err(PowerError::Unsupported)
    }

    /// Writes to the device. Power LEDs have no data path.
    fn write(&self, _buf: &[u8]) -> Result<usize, PowerError> {
        Err(PowerError::Unsupported)
    }
}

impl DeviceNode for PowerLed {
    fn open(&self) -> Result<(), PowerError> {
        PowerLed::open(self)
    }

    fn close(&self) -> Result<(), PowerError> {
        PowerLed::close(self)
    }

    fn ioctl(&self, cmd: Command<'_>) -> Result<usize, PowerError> {
        PowerLed::ioctl(self, cmd)
    }

    fn permissions(&self) -> FileMode {
        FileMode::READ_ALL
    }
}

/// A namespace that device nodes can be published in.
pub trait DeviceRegistry {
    /// Publishes `node` at `path` with access `mode`.
    ///
    /// On error the registry must not retain `node`.
    fn register_driver(
        &self,
        path: &str,
        node: Arc<dyn DeviceNode>,
        mode: FileMode,
    ) -> Result<(), PowerError>;
}

struct DevEntry {
    node: Arc<dyn DeviceNode>,
    mode: FileMode,
}

/// Flat, path-keyed device registry.
pub struct DevTable {
    entries: SpinLock<BTreeMap<String, DevEntry>>,
}

impl DevTable {
    /// Creates an empty table.
    pub const fn new() -> Self {
        Self {
            entries: SpinLock::new(BTreeMap::new()),
        }
    }

    /// Returns the node published at `path`.
    pub fn lookup(&self, path: &str) -> Option<Arc<dyn DeviceNode>> {
        self.entries.lock().get(path).map(|e| e.node.clone())
    }

    /// Returns the access mode of the node at `path`.
    pub fn mode(&self, path: &str) -> Option<FileMode> {
        self.entries.lock().get(path).map(|e| e.mode)
    }

    /// Returns all published paths in sorted order.
    pub fn paths(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Returns the number of published nodes.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is published.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for DevTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry for DevTable {
    fn register_driver(
        &self,
        path: &str,
        node: Arc<dyn DeviceNode>,
        mode: FileMode,
    ) -> Result<(), PowerError> {
        if path.is_empty() {
            return Err(PowerError::InvalidArgument);
        }
        let mut entries = self.entries.lock();
        if entries.contains_key(path) {
            return Err(PowerError::AlreadyExists);
        }
        entries.insert(path.to_string(), DevEntry { node, mode });
        Ok(())
    }
}

/// Registers a power LED device at `path`.
///
/// Builds a closed session around `ops` with a zeroed control block and
/// publishes it in `registry` with mode [`FileMode::READ_ALL`]. The
/// returned handle is the same session the registry hands out.
///
/// # Errors
///
/// Returns the registry's error unchanged. Nothing is retained in that
/// case: the session, and with it the lower half, is dropped.
///
/// # Panics
///
/// Panics if `path` is empty, if `config.max_opens` is zero, or if the
/// lower half does not provide all twelve operations.
pub fn register(
    path: &str,
    ops: Box<dyn PowerLedOps>,
    services: Arc<dyn PlatformServices>,
    config: PowerLedConfig,
    registry: &dyn DeviceRegistry,
) -> Result<Arc<PowerLed>, PowerError> {
    assert!(!path.is_empty(), "powerled: empty device path");
    assert!(config.max_opens >= 1, "powerled: max_opens must be at least 1");

    let missing = OpSet::all().difference(ops.provided());
    if !missing.is_empty() {
        powerled_log!(LogLevel::Fatal, "{}: lower half lacks {:?}", path, missing);
        panic!("powerled: {path}: lower half lacks {missing:?}");
    }

    let dev = Arc::new(PowerLed::new(ops, services, config));
    registry.register_driver(path, dev.clone(), dev.permissions())?;
    powerled_info!("registered {}", path);
    Ok(dev)
}
