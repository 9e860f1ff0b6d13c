//! Partition file adapter.
//!
//! A [`PartitionFile`] exposes one topic partition as a read-only regular file.
//! It reconciles an append-only, push-style message stream with a file
//! interface that expects a size, offset reads and calls that return.
//!
//! # Lifecycle
//!
//! ```text
//! Closed ──open──▶ Opening ──subscribed──▶ Open ──release──▶ Closed
//!                     │
//!                     └──failed──▶ Closed
//! ```
//!
//! Re-opening an open file subscribes while the file stays `Open`, so reads
//! keep using the installed session until the new one replaces it. A release
//! that lands while an open is subscribing wins: the open closes its new
//! session and fails with [`FsError::NotOpen`].
//!
//! Every open subscribes from the oldest retained offset; there is no per-opener
//! read cursor. Reads drain the installed session through a
//! [`ReadAccumulator`], so they return after at most one idle timeout once the
//! partition goes quiet.
//!
//! # Locking
//!
//! The state lock guards the attributes, the installed session and the state,
//! and is only held for short critical sections. A drain holds the session's
//! own read lock instead, so [`release`](FileNode::release) can close the
//! session while a read is parked on it; the read wakes with the session
//! closed and returns what it has.

use crate::accumulator::{ReadAccumulator, StopReason};
use crate::attr::{FileAttributes, FileSize};
use crate::config::FileConfig;
use crate::error::{FsError, FsResult};
use crate::handle::PartitionHandle;
use crate::node::{FileNode, OpenReply};
use crate::stats::{FileStats, StatsSnapshot};
use bytes::Bytes;
use kfs_bus::{
    ConnectionProvider, ConsumerSession, Offset, OffsetBoundary, SessionFactory, StartOffset,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, trace, warn};

/// Open/closed state of a partition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// No session installed.
    Closed,
    /// A subscription is being established.
    Opening,
    /// A session is installed and readable.
    Open,
}

/// A consumer session installed on a file.
struct SessionSlot {
    /// Bumped on every install; stale drains must not touch the size.
    generation: u64,
    session: Arc<dyn ConsumerSession>,
    /// Payload pulled by a windowed read that had no room for it.
    pending: Mutex<Option<Bytes>>,
}

struct Inner {
    state: FileState,
    attrs: FileAttributes,
    slot: Option<Arc<SessionSlot>>,
    generation: u64,
    /// Bumped on every release, so an open that raced one can back off.
    releases: u64,
}

/// One topic partition exposed as a read-only file.
pub struct PartitionFile {
    handle: PartitionHandle,
    provider: Arc<dyn ConnectionProvider>,
    sessions: Arc<dyn SessionFactory>,
    config: FileConfig,
    inner: Mutex<Inner>,
    stats: FileStats,
}

impl PartitionFile {
    /// Creates a closed file for `handle`.
    pub fn new(
        handle: PartitionHandle,
        provider: Arc<dyn ConnectionProvider>,
        sessions: Arc<dyn SessionFactory>,
        config: FileConfig,
    ) -> Self {
        let attrs = FileAttributes::new(&config);
        Self {
            handle,
            provider,
            sessions,
            config,
            inner: Mutex::new(Inner {
                state: FileState::Closed,
                attrs,
                slot: None,
                generation: 0,
                releases: 0,
            }),
            stats: FileStats::new(),
        }
    }

    /// Creates a closed file backed by a bus that is both connection provider
    /// and session factory.
    pub fn with_bus<B>(handle: PartitionHandle, bus: Arc<B>, config: FileConfig) -> Self
    where
        B: ConnectionProvider + SessionFactory + 'static,
    {
        let provider = Arc::clone(&bus) as Arc<dyn ConnectionProvider>;
        Self::new(handle, provider, bus, config)
    }

    /// The partition this file exposes.
    pub fn handle(&self) -> &PartitionHandle {
        &self.handle
    }

    /// The file's configuration.
    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> FileState {
        self.inner.lock().state
    }

    /// Returns true if a session is installed and readable.
    pub fn is_open(&self) -> bool {
        self.state() == FileState::Open
    }

    /// Returns a copy of the file's counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Replaces the open session with one starting at `start`.
    ///
    /// On failure the current session stays installed and usable. On success
    /// the replaced session is closed; a failure to close it is logged only.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotOpen`] if the file is not open, or the connection
    /// or subscribe error that prevented the new session.
    pub fn reconsume(&self, start: StartOffset) -> FsResult<()> {
        if !self.is_open() {
            return Err(self.fail("reconsume", FsError::NotOpen(self.handle.clone())));
        }
        let session = self
            .subscribe_at(start)
            .map_err(|e| self.fail("reconsume", e))?;

        let replaced = {
            let mut inner = self.inner.lock();
            if inner.state != FileState::Open {
                drop(inner);
                let _ = session.close();
                return Err(self.fail("reconsume", FsError::NotOpen(self.handle.clone())));
            }
            Self::install(&mut inner, Arc::clone(&session))
        };
        self.close_replaced(replaced);
        debug!(file = %self.handle, %start, session = %session.id(), "reconsumed");
        Ok(())
    }

    fn subscribe_at(&self, start: StartOffset) -> FsResult<Arc<dyn ConsumerSession>> {
        self.provider
            .ensure_connected()
            .map_err(FsError::Connection)?;
        self.sessions
            .subscribe(self.handle.topic(), self.handle.partition(), start)
            .map_err(FsError::subscribe)
    }

    fn install(inner: &mut Inner, session: Arc<dyn ConsumerSession>) -> Option<Arc<SessionSlot>> {
        inner.generation += 1;
        let slot = SessionSlot {
            generation: inner.generation,
            session,
            pending: Mutex::new(None),
        };
        inner.slot.replace(Arc::new(slot))
    }

    fn close_replaced(&self, replaced: Option<Arc<SessionSlot>>) {
        if let Some(old) = replaced {
            if let Err(err) = old.session.close() {
                warn!(file = %self.handle, session = %old.session.id(), error = %err, "failed to close replaced session");
            }
        }
    }

    fn current_slot(&self) -> FsResult<Arc<SessionSlot>> {
        let inner = self.inner.lock();
        match (inner.state, &inner.slot) {
            (FileState::Open, Some(slot)) => Ok(Arc::clone(slot)),
            _ => Err(FsError::NotOpen(self.handle.clone())),
        }
    }

    fn resolve(&self, boundary: OffsetBoundary) -> FsResult<Offset> {
        self.provider
            .resolve_offset(self.handle.topic(), self.handle.partition(), boundary)
            .map_err(FsError::offset_lookup)
    }

    fn record_bytes(&self, generation: u64, bytes: u64) {
        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.attrs.size.add_measured(bytes);
        }
    }

    fn fail(&self, op: &'static str, err: FsError) -> FsError {
        self.stats.record_error();
        error!(file = %self.handle, op, error = %err, "partition file operation failed");
        err
    }

    /// Reads whole records into `buf`, returning how many bytes were written.
    ///
    /// `offset` is accepted for the host's benefit but not honored: reads are
    /// sequential from the session cursor.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotOpen`] without an installed session, or
    /// [`FsError::Stream`] if the session fails mid-drain.
    pub fn read_into(&self, offset: u64, buf: &mut [u8]) -> FsResult<usize> {
        trace!(file = %self.handle, offset, size = buf.len(), "read");
        let slot = self.current_slot().map_err(|e| self.fail("read", e))?;

        let mut pending = slot.pending.lock();
        let drain = ReadAccumulator::with_config(slot.session.as_ref(), &self.config)
            .fill(&mut pending, buf, |n| self.record_bytes(slot.generation, n))
            .map_err(|e| self.fail("read", FsError::Stream(e)))?;
        drop(pending);

        if drain.dropped > 0 {
            self.stats.record_dropped(drain.dropped as u64);
        }
        self.stats.record_read(
            drain.bytes as u64,
            drain.messages as u64,
            drain.bytes < buf.len(),
            drain.stop == StopReason::IdleTimeout,
        );
        trace!(file = %self.handle, bytes = drain.bytes, stop = %drain.stop, "read done");
        Ok(drain.bytes)
    }
}

impl FileNode for PartitionFile {
    fn attributes(&self) -> FsResult<FileAttributes> {
        trace!(file = %self.handle, "attributes");
        {
            let inner = self.inner.lock();
            if inner.state == FileState::Open {
                return Ok(inner.attrs.clone());
            }
        }

        self.provider
            .ensure_connected()
            .map_err(|e| self.fail("attributes", FsError::Connection(e)))?;
        let newest = self
            .resolve(OffsetBoundary::Newest)
            .map_err(|e| self.fail("attributes", e))?;
        let oldest = self
            .resolve(OffsetBoundary::Oldest)
            .map_err(|e| self.fail("attributes", e))?;
        if newest < oldest {
            warn!(file = %self.handle, oldest, newest, "newest offset precedes oldest");
        }

        let size = FileSize::Estimated { oldest, newest };
        let mut inner = self.inner.lock();
        if inner.state != FileState::Open {
            inner.attrs.size = size;
            inner.attrs.mtime = SystemTime::now();
        }
        let mut attrs = inner.attrs.clone();
        attrs.size = size;
        Ok(attrs)
    }

    fn open(&self) -> FsResult<OpenReply> {
        trace!(file = %self.handle, "open");
        let releases = {
            let mut inner = self.inner.lock();
            // A re-open keeps serving reads from the installed session.
            if inner.slot.is_none() {
                inner.state = FileState::Opening;
            }
            inner.releases
        };

        let session = match self.subscribe_at(StartOffset::Oldest) {
            Ok(session) => session,
            Err(err) => {
                let mut inner = self.inner.lock();
                if inner.state == FileState::Opening {
                    inner.state = FileState::Closed;
                }
                drop(inner);
                return Err(self.fail("open", err));
            }
        };

        let replaced = {
            let mut inner = self.inner.lock();
            if inner.releases != releases {
                // Released while subscribing; the release wins.
                drop(inner);
                let _ = session.close();
                return Err(self.fail("open", FsError::NotOpen(self.handle.clone())));
            }
            let replaced = Self::install(&mut inner, Arc::clone(&session));
            inner.state = FileState::Open;
            replaced
        };
        self.close_replaced(replaced);
        self.stats.record_open();
        debug!(file = %self.handle, session = %session.id(), "opened from oldest offset");

        Ok(OpenReply {
            direct_io: self.config.direct_io,
            keep_cache: false,
        })
    }

    fn read_all(&self) -> FsResult<Vec<u8>> {
        trace!(file = %self.handle, "read all");
        let slot = self.current_slot().map_err(|e| self.fail("read_all", e))?;
        {
            let mut inner = self.inner.lock();
            if inner.generation == slot.generation {
                inner.attrs.size = FileSize::Measured(0);
            }
        }

        let mut out = Vec::new();
        let mut pending = slot.pending.lock();
        let drain = ReadAccumulator::with_config(slot.session.as_ref(), &self.config)
            .drain_all(&mut pending, &mut out, |n| {
                self.record_bytes(slot.generation, n)
            })
            .map_err(|e| self.fail("read_all", FsError::Stream(e)))?;
        drop(pending);

        self.stats.record_read(
            drain.bytes as u64,
            drain.messages as u64,
            false,
            drain.stop == StopReason::IdleTimeout,
        );
        debug!(
            file = %self.handle,
            bytes = drain.bytes,
            messages = drain.messages,
            stop = %drain.stop,
            "read all drained"
        );
        Ok(out)
    }

    fn read(&self, offset: u64, max_size: usize) -> FsResult<Vec<u8>> {
        let mut buf = vec![0u8; max_size];
        let written = self.read_into(offset, &mut buf)?;
        buf.truncate(written);
        Ok(buf)
    }

    fn release(&self) -> FsResult<()> {
        trace!(file = %self.handle, "release");
        let slot = {
            let mut inner = self.inner.lock();
            inner.state = FileState::Closed;
            inner.releases += 1;
            inner.slot.take()
        };
        self.stats.record_release();

        let Some(slot) = slot else {
            debug!(file = %self.handle, "release with no session installed");
            return Ok(());
        };
        slot.session
            .close()
            .map_err(|e| self.fail("release", FsError::Close(e)))?;
        debug!(file = %self.handle, session = %slot.session.id(), "session closed");
        Ok(())
    }

    fn write(&self, offset: u64, data: &[u8]) -> FsResult<usize> {
        trace!(file = %self.handle, offset, len = data.len(), "write rejected");
        Err(FsError::PermissionDenied)
    }
}

impl Drop for PartitionFile {
    fn drop(&mut self) {
        if let Some(slot) = self.inner.get_mut().slot.take() {
            let _ = slot.session.close();
        }
    }
}

impl fmt::Debug for PartitionFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionFile")
            .field("handle", &self.handle)
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfs_bus::{BusError, BusResult, InMemoryBus};
    use std::thread;
    use std::time::Duration;

    const IDLE: Duration = Duration::from_millis(50);

    /// Subscribes through the bus after a configurable delay.
    struct SlowSessions {
        bus: Arc<InMemoryBus>,
        delay: Mutex<Duration>,
    }

    impl SessionFactory for SlowSessions {
        fn subscribe(
            &self,
            topic: &str,
            partition: u32,
            start: StartOffset,
        ) -> BusResult<Arc<dyn ConsumerSession>> {
            let delay = *self.delay.lock();
            thread::sleep(delay);
            self.bus.subscribe(topic, partition, start)
        }
    }

    fn slow_setup(
        messages: &[&'static str],
    ) -> (Arc<InMemoryBus>, Arc<SlowSessions>, Arc<PartitionFile>) {
        let (bus, _) = setup(messages);
        let sessions = Arc::new(SlowSessions {
            bus: Arc::clone(&bus),
            delay: Mutex::new(Duration::ZERO),
        });
        let file = PartitionFile::new(
            PartitionHandle::new("t", 0),
            Arc::clone(&bus) as Arc<dyn ConnectionProvider>,
            Arc::clone(&sessions) as Arc<dyn SessionFactory>,
            FileConfig::new().idle_timeout(IDLE),
        );
        (bus, sessions, Arc::new(file))
    }

    fn setup(messages: &[&'static str]) -> (Arc<InMemoryBus>, PartitionFile) {
        let bus = Arc::new(InMemoryBus::new());
        bus.create_topic("t", 1);
        for m in messages {
            bus.produce("t", 0, *m).unwrap();
        }
        let file = PartitionFile::with_bus(
            PartitionHandle::new("t", 0),
            Arc::clone(&bus),
            FileConfig::new().idle_timeout(IDLE),
        );
        (bus, file)
    }

    #[test]
    fn starts_closed() {
        let (_bus, file) = setup(&[]);
        assert_eq!(file.state(), FileState::Closed);
        assert!(!file.is_open());
    }

    #[test]
    fn open_failure_restores_previous_state() {
        let (bus, file) = setup(&["a"]);
        bus.fail_subscribe("no slots");
        assert!(matches!(file.open(), Err(FsError::Subscribe(_))));
        assert_eq!(file.state(), FileState::Closed);

        bus.clear_faults();
        file.open().unwrap();
        bus.fail_subscribe("no slots");
        assert!(file.open().is_err());
        assert_eq!(file.state(), FileState::Open);
        assert_eq!(file.read_all().unwrap(), b"a\n");
    }

    #[test]
    fn reopen_closes_replaced_session() {
        let (bus, file) = setup(&["a"]);
        file.open().unwrap();
        file.open().unwrap();
        assert_eq!(bus.live_sessions("t", 0), 1);
    }

    #[test]
    fn reconsume_requires_open() {
        let (_bus, file) = setup(&["a"]);
        assert!(matches!(
            file.reconsume(StartOffset::Newest),
            Err(FsError::NotOpen(_))
        ));
    }

    #[test]
    fn reconsume_failure_keeps_session() {
        let (bus, file) = setup(&["a", "bb"]);
        file.open().unwrap();

        bus.set_reachable(false);
        assert!(matches!(
            file.reconsume(StartOffset::At(1)),
            Err(FsError::Connection(_))
        ));
        assert_eq!(file.read_all().unwrap(), b"a\nbb\n");
    }

    #[test]
    fn reconsume_subscribe_failure_keeps_session() {
        let (bus, file) = setup(&["a", "bb"]);
        file.open().unwrap();

        bus.fail_subscribe("no consumer slots");
        assert!(matches!(
            file.reconsume(StartOffset::At(1)),
            Err(FsError::Subscribe(_))
        ));
        assert!(file.is_open());
        assert_eq!(file.read_all().unwrap(), b"a\nbb\n");
        assert_eq!(bus.live_sessions("t", 0), 1);
    }

    #[test]
    fn reopen_keeps_serving_reads() {
        let (bus, sessions, file) = slow_setup(&["a"]);
        file.open().unwrap();

        *sessions.delay.lock() = Duration::from_millis(300);
        let opener = Arc::clone(&file);
        let handle = thread::spawn(move || opener.open());

        thread::sleep(Duration::from_millis(100));
        assert_eq!(file.state(), FileState::Open);
        assert_eq!(file.read(0, 64).unwrap(), b"a\n");

        handle.join().unwrap().unwrap();
        assert!(file.is_open());
        assert_eq!(bus.live_sessions("t", 0), 1);
    }

    #[test]
    fn release_during_open_wins() {
        let (bus, sessions, file) = slow_setup(&["a"]);
        file.open().unwrap();

        *sessions.delay.lock() = Duration::from_millis(300);
        let opener = Arc::clone(&file);
        let handle = thread::spawn(move || opener.open());

        thread::sleep(Duration::from_millis(100));
        file.release().unwrap();

        let result = handle.join().unwrap();
        assert!(matches!(result, Err(FsError::NotOpen(_))));
        assert_eq!(file.state(), FileState::Closed);
        assert_eq!(bus.live_sessions("t", 0), 0);
    }

    #[test]
    fn reconsume_moves_cursor() {
        let (bus, file) = setup(&["a", "bb"]);
        file.open().unwrap();
        file.reconsume(StartOffset::At(1)).unwrap();

        assert_eq!(file.read_all().unwrap(), b"bb\n");
        assert_eq!(bus.live_sessions("t", 0), 1);
    }

    #[test]
    fn stream_error_surfaces_from_read() {
        let (bus, file) = setup(&[]);
        file.open().unwrap();
        bus.inject_stream_error("t", 0, "broker gone").unwrap();

        let err = file.read_all().unwrap_err();
        assert!(matches!(err, FsError::Stream(BusError::Stream(_))));
        assert_eq!(file.stats().errors, 1);
    }

    #[test]
    fn drop_closes_session() {
        let (bus, file) = setup(&["a"]);
        file.open().unwrap();
        drop(file);
        assert_eq!(bus.live_sessions("t", 0), 0);
    }
}
