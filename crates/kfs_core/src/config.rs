//! Partition file configuration.

use std::time::Duration;

/// Default wait for the next message before a read returns what it has.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration shared by the partition files of one mount.
#[derive(Debug, Clone)]
pub struct FileConfig {
    /// How long a read waits for the next message before returning.
    pub idle_timeout: Duration,

    /// Byte appended after every message payload.
    pub separator: u8,

    /// Whether to ask the host to bypass the kernel page cache.
    pub direct_io: bool,

    /// Permission bits reported for partition files.
    pub permissions: u16,

    /// Owner reported for partition files.
    pub uid: u32,

    /// Group reported for partition files.
    pub gid: u32,

    /// Preferred I/O block size reported for partition files.
    pub block_size: u32,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            separator: b'\n',
            direct_io: false,
            permissions: 0o444,
            uid: 0,
            gid: 0,
            block_size: 4096,
        }
    }
}

impl FileConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the idle timeout.
    #[must_use]
    pub const fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets the message separator byte.
    #[must_use]
    pub const fn separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Sets whether opens request direct I/O.
    #[must_use]
    pub const fn direct_io(mut self, value: bool) -> Self {
        self.direct_io = value;
        self
    }

    /// Sets the reported permission bits.
    #[must_use]
    pub const fn permissions(mut self, mode: u16) -> Self {
        self.permissions = mode;
        self
    }

    /// Sets the reported owner and group.
    #[must_use]
    pub const fn owner(mut self, uid: u32, gid: u32) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }

    /// Sets the reported block size.
    #[must_use]
    pub const fn block_size(mut self, size: u32) -> Self {
        self.block_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = FileConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_secs(5));
        assert_eq!(config.separator, b'\n');
        assert!(!config.direct_io);
        assert_eq!(config.permissions, 0o444);
    }

    #[test]
    fn builder_pattern() {
        let config = FileConfig::new()
            .idle_timeout(Duration::from_millis(200))
            .separator(0)
            .owner(1000, 100)
            .direct_io(true);

        assert_eq!(config.idle_timeout, Duration::from_millis(200));
        assert_eq!(config.separator, 0);
        assert_eq!(config.uid, 1000);
        assert_eq!(config.gid, 100);
        assert!(config.direct_io);
    }
}
