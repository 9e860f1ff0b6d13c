//! Kernel file-interface contract.

use crate::attr::FileAttributes;
use crate::error::FsResult;

/// Reply to a successful open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenReply {
    /// Bypass the kernel page cache.
    pub direct_io: bool,
    /// Keep previously cached pages for this file.
    pub keep_cache: bool,
}

/// Operations a virtual-filesystem host invokes on a file.
///
/// Implementors must be `Send + Sync`; the host may issue calls for the same
/// file concurrently.
pub trait FileNode: Send + Sync {
    /// Returns the file's attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if the attributes cannot be resolved.
    fn attributes(&self) -> FsResult<FileAttributes>;

    /// Opens the file for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    fn open(&self) -> FsResult<OpenReply>;

    /// Reads everything currently available.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not open or the read failed.
    fn read_all(&self) -> FsResult<Vec<u8>>;

    /// Reads at most `max_size` bytes.
    ///
    /// Returning fewer bytes than requested is a short read, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not open or the read failed.
    fn read(&self, offset: u64, max_size: usize) -> FsResult<Vec<u8>>;

    /// Releases the file after its last close.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing underlying resources failed.
    fn release(&self) -> FsResult<()>;

    /// Writes to the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not accept writes.
    fn write(&self, offset: u64, data: &[u8]) -> FsResult<usize>;
}
