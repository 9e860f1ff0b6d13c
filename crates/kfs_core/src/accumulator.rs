//! Bounded-wait drain of a consumer session into bytes.
//!
//! Every iteration waits for the next message for at most the idle timeout,
//! measured from the previous message. A quiet partition therefore ends a read
//! after one timeout instead of blocking it forever. Each message is framed as
//! its payload followed by the separator byte.

use crate::config::FileConfig;
use bytes::Bytes;
use kfs_bus::{BusResult, ConsumerSession, Delivery};
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Why a drain stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No message arrived within the idle timeout.
    IdleTimeout,
    /// The next record does not fit the remaining window.
    WindowFull,
    /// The session was closed.
    SessionClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::IdleTimeout => f.write_str("idle timeout"),
            StopReason::WindowFull => f.write_str("window full"),
            StopReason::SessionClosed => f.write_str("session closed"),
        }
    }
}

/// Summary of one drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drain {
    /// Bytes written, separators included.
    pub bytes: usize,
    /// Messages written.
    pub messages: usize,
    /// Messages discarded because they exceed the whole window.
    pub dropped: usize,
    /// Why the drain stopped.
    pub stop: StopReason,
}

enum Next {
    Payload(Bytes),
    Stop(StopReason),
}

/// Drains a [`ConsumerSession`] under a bounded wait.
///
/// `pending` is a payload read from the session by an earlier windowed read
/// that had no room for it. It is served before anything new is pulled.
pub struct ReadAccumulator<'a> {
    session: &'a dyn ConsumerSession,
    idle_timeout: Duration,
    separator: u8,
}

impl<'a> ReadAccumulator<'a> {
    /// Creates an accumulator over `session`.
    pub fn new(session: &'a dyn ConsumerSession, idle_timeout: Duration, separator: u8) -> Self {
        Self {
            session,
            idle_timeout,
            separator,
        }
    }

    /// Creates an accumulator using the timeout and separator of `config`.
    pub fn with_config(session: &'a dyn ConsumerSession, config: &FileConfig) -> Self {
        Self::new(session, config.idle_timeout, config.separator)
    }

    fn next(&self, pending: &mut Option<Bytes>) -> BusResult<Next> {
        if let Some(payload) = pending.take() {
            return Ok(Next::Payload(payload));
        }
        Ok(match self.session.next_message(self.idle_timeout)? {
            Delivery::Message(message) => Next::Payload(message.payload),
            Delivery::Idle => Next::Stop(StopReason::IdleTimeout),
            Delivery::Closed => Next::Stop(StopReason::SessionClosed),
        })
    }

    /// Appends every message that arrives before the partition goes quiet.
    ///
    /// `on_append` is called with the length of each record as it lands in
    /// `out`.
    ///
    /// # Errors
    ///
    /// Returns the session's error if the stream fails mid-drain.
    pub fn drain_all(
        &self,
        pending: &mut Option<Bytes>,
        out: &mut Vec<u8>,
        mut on_append: impl FnMut(u64),
    ) -> BusResult<Drain> {
        let mut drain = Drain {
            bytes: 0,
            messages: 0,
            dropped: 0,
            stop: StopReason::IdleTimeout,
        };

        loop {
            match self.next(pending)? {
                Next::Payload(payload) => {
                    out.extend_from_slice(&payload);
                    out.push(self.separator);

                    let record = payload.len() + 1;
                    drain.bytes += record;
                    drain.messages += 1;
                    on_append(record as u64);
                }
                Next::Stop(reason) => {
                    drain.stop = reason;
                    return Ok(drain);
                }
            }
        }
    }

    /// Fills `buf` with whole records, stopping short rather than splitting one.
    ///
    /// A record that does not fit the remaining space is left in `pending`. A
    /// record longer than `buf` itself can never be served; it is dropped and
    /// the read returns at once with what it has.
    ///
    /// # Errors
    ///
    /// Returns the session's error if the stream fails mid-drain.
    pub fn fill(
        &self,
        pending: &mut Option<Bytes>,
        buf: &mut [u8],
        mut on_append: impl FnMut(u64),
    ) -> BusResult<Drain> {
        let capacity = buf.len();
        let mut drain = Drain {
            bytes: 0,
            messages: 0,
            dropped: 0,
            stop: StopReason::WindowFull,
        };
        if capacity == 0 {
            return Ok(drain);
        }

        loop {
            let payload = match self.next(pending)? {
                Next::Payload(payload) => payload,
                Next::Stop(reason) => {
                    drain.stop = reason;
                    return Ok(drain);
                }
            };

            let record = payload.len() + 1;
            if record > capacity {
                warn!(
                    record,
                    capacity, "dropping message larger than the read window"
                );
                drain.dropped += 1;
                return Ok(drain);
            }
            if drain.bytes + record > capacity {
                *pending = Some(payload);
                return Ok(drain);
            }

            let start = drain.bytes;
            buf[start..start + payload.len()].copy_from_slice(&payload);
            buf[start + payload.len()] = self.separator;
            drain.bytes += record;
            drain.messages += 1;
            on_append(record as u64);

            if drain.bytes == capacity {
                return Ok(drain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfs_bus::{BusError, ChannelSession, Message};
    use std::time::Instant;

    const IDLE: Duration = Duration::from_millis(50);

    fn session_with(payloads: &[&'static str]) -> std::sync::Arc<ChannelSession> {
        let (session, feeder) = ChannelSession::new();
        for (i, p) in payloads.iter().enumerate() {
            feeder.deliver(Message::new(i as i64, *p));
        }
        session
    }

    #[test]
    fn drain_all_frames_messages() {
        let session = session_with(&["a", "bb", "ccc"]);
        let acc = ReadAccumulator::new(&*session, IDLE, b'\n');

        let mut out = Vec::new();
        let mut appended = 0;
        let drain = acc
            .drain_all(&mut None, &mut out, |n| appended += n)
            .unwrap();

        assert_eq!(out, b"a\nbb\nccc\n");
        assert_eq!(appended, 9);
        assert_eq!(drain.messages, 3);
        assert_eq!(drain.stop, StopReason::IdleTimeout);
    }

    #[test]
    fn drain_all_on_quiet_partition_is_bounded() {
        let session = session_with(&[]);
        let acc = ReadAccumulator::new(&*session, IDLE, b'\n');

        let start = Instant::now();
        let mut out = Vec::new();
        let drain = acc.drain_all(&mut None, &mut out, |_| {}).unwrap();

        assert!(out.is_empty());
        assert_eq!(drain.stop, StopReason::IdleTimeout);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn drain_all_serves_pending_first() {
        let session = session_with(&["bb"]);
        let acc = ReadAccumulator::new(&*session, IDLE, b'\n');

        let mut pending = Some(Bytes::from_static(b"a"));
        let mut out = Vec::new();
        acc.drain_all(&mut pending, &mut out, |_| {}).unwrap();

        assert_eq!(out, b"a\nbb\n");
        assert!(pending.is_none());
    }

    #[test]
    fn fill_short_reads_and_keeps_remainder() {
        let session = session_with(&["a", "bb", "ccc"]);
        let acc = ReadAccumulator::new(&*session, IDLE, b'\n');

        let mut pending = None;
        let mut buf = [0u8; 6];
        let drain = acc.fill(&mut pending, &mut buf, |_| {}).unwrap();

        assert_eq!(drain.bytes, 5);
        assert_eq!(&buf[..drain.bytes], b"a\nbb\n");
        assert_eq!(drain.stop, StopReason::WindowFull);
        assert_eq!(pending, Some(Bytes::from_static(b"ccc")));

        let drain = acc.fill(&mut pending, &mut buf, |_| {}).unwrap();
        assert_eq!(&buf[..drain.bytes], b"ccc\n");
        assert_eq!(drain.stop, StopReason::IdleTimeout);
    }

    #[test]
    fn fill_returns_as_soon_as_window_is_exact() {
        let session = session_with(&["a", "bb", "ccc"]);
        let acc = ReadAccumulator::new(&*session, Duration::from_secs(30), b'\n');

        let start = Instant::now();
        let mut pending = None;
        let mut buf = [0u8; 5];
        let drain = acc.fill(&mut pending, &mut buf, |_| {}).unwrap();

        assert_eq!(&buf, b"a\nbb\n");
        assert_eq!(drain.stop, StopReason::WindowFull);
        assert!(pending.is_none());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn fill_drops_oversized_record_and_returns() {
        let session = session_with(&["a", "toolarge", "ok"]);
        let acc = ReadAccumulator::new(&*session, Duration::from_secs(30), b'\n');

        let start = Instant::now();
        let mut pending = None;
        let mut buf = [0u8; 3];
        let drain = acc.fill(&mut pending, &mut buf, |_| {}).unwrap();

        assert_eq!(drain.dropped, 1);
        assert_eq!(&buf[..drain.bytes], b"a\n");
        assert_eq!(drain.stop, StopReason::WindowFull);
        assert!(pending.is_none());
        assert!(start.elapsed() < Duration::from_secs(5));

        let drain = acc.fill(&mut pending, &mut buf, |_| {}).unwrap();
        assert_eq!(&buf[..drain.bytes], b"ok\n");
    }

    #[test]
    fn fill_zero_window_reads_nothing() {
        let session = session_with(&["a"]);
        let acc = ReadAccumulator::new(&*session, IDLE, b'\n');

        let drain = acc.fill(&mut None, &mut [], |_| {}).unwrap();
        assert_eq!(drain.bytes, 0);
        assert_eq!(drain.messages, 0);
    }

    #[test]
    fn closed_session_stops_drain() {
        let session = session_with(&["a"]);
        let acc = ReadAccumulator::new(&*session, Duration::from_secs(30), b'\n');
        session.close().unwrap();

        let mut out = Vec::new();
        let drain = acc.drain_all(&mut None, &mut out, |_| {}).unwrap();
        assert_eq!(drain.stop, StopReason::SessionClosed);
    }

    #[test]
    fn stream_error_propagates() {
        let (session, feeder) = ChannelSession::new();
        feeder.deliver(Message::new(0, "a"));
        feeder.fail(BusError::Stream("broker gone".into()));
        let acc = ReadAccumulator::new(&*session, IDLE, b'\n');

        let result = acc.drain_all(&mut None, &mut Vec::new(), |_| {});
        assert!(matches!(result, Err(BusError::Stream(_))));
    }
}
