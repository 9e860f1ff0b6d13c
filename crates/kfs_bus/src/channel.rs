//! Channel-backed consumer session.
//!
//! The producer side holds a [`SessionFeeder`]; the consumer side is the
//! [`ChannelSession`]. Closing the session pushes a close marker into the same
//! channel, so a reader blocked in `recv_timeout` wakes immediately.

use crate::error::{BusError, BusResult};
use crate::session::{ConsumerSession, Delivery, Message};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug)]
enum Event {
    Message(Message),
    Error(BusError),
    Closed,
}

/// A consumer session fed through a `std::sync::mpsc` channel.
#[derive(Debug)]
pub struct ChannelSession {
    id: Uuid,
    rx: Mutex<Receiver<Event>>,
    tx: Sender<Event>,
    closed: Arc<AtomicBool>,
    close_failure: Mutex<Option<BusError>>,
}

impl ChannelSession {
    /// Creates a session and the feeder that delivers into it.
    pub fn new() -> (Arc<Self>, SessionFeeder) {
        let (tx, rx) = mpsc::channel();
        let closed = Arc::new(AtomicBool::new(false));
        let session = Arc::new(Self {
            id: Uuid::new_v4(),
            rx: Mutex::new(rx),
            tx: tx.clone(),
            closed: Arc::clone(&closed),
            close_failure: Mutex::new(None),
        });
        let feeder = SessionFeeder { tx, closed };
        (session, feeder)
    }

    /// Makes the next `close` report `error` after shutting down.
    pub fn fail_next_close(&self, error: BusError) {
        *self.close_failure.lock() = Some(error);
    }
}

impl ConsumerSession for ChannelSession {
    fn id(&self) -> Uuid {
        self.id
    }

    fn next_message(&self, timeout: Duration) -> BusResult<Delivery> {
        if self.is_closed() {
            return Ok(Delivery::Closed);
        }

        let deadline = Instant::now() + timeout;

        // Another reader may be parked on the receiver; never wait past the deadline for it.
        let Some(rx) = self.rx.try_lock_for(timeout) else {
            return Ok(Delivery::Idle);
        };
        if self.is_closed() {
            return Ok(Delivery::Closed);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Event::Message(message)) => Ok(Delivery::Message(message)),
            Ok(Event::Error(error)) => Err(error),
            Ok(Event::Closed) | Err(RecvTimeoutError::Disconnected) => {
                self.closed.store(true, Ordering::SeqCst);
                Ok(Delivery::Closed)
            }
            Err(RecvTimeoutError::Timeout) => Ok(Delivery::Idle),
        }
    }

    fn close(&self) -> BusResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        // Receiver lives as long as self, so the send cannot fail.
        let _ = self.tx.send(Event::Closed);

        match self.close_failure.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Producer-side handle of a [`ChannelSession`].
#[derive(Debug, Clone)]
pub struct SessionFeeder {
    tx: Sender<Event>,
    closed: Arc<AtomicBool>,
}

impl SessionFeeder {
    /// Delivers a message. Returns false once the session is closed.
    pub fn deliver(&self, message: Message) -> bool {
        !self.is_closed() && self.tx.send(Event::Message(message)).is_ok()
    }

    /// Reports an out-of-band stream error to the session.
    pub fn fail(&self, error: BusError) -> bool {
        !self.is_closed() && self.tx.send(Event::Error(error)).is_ok()
    }

    /// Ends the stream from the bus side.
    pub fn end(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.tx.send(Event::Closed);
        }
    }

    /// Returns true once the session has been closed from either side.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn delivers_in_order() {
        let (session, feeder) = ChannelSession::new();
        assert!(feeder.deliver(Message::new(0, "a")));
        assert!(feeder.deliver(Message::new(1, "bb")));

        let timeout = Duration::from_millis(50);
        assert_eq!(
            session.next_message(timeout).unwrap(),
            Delivery::Message(Message::new(0, "a"))
        );
        assert_eq!(
            session.next_message(timeout).unwrap(),
            Delivery::Message(Message::new(1, "bb"))
        );
        assert_eq!(session.next_message(timeout).unwrap(), Delivery::Idle);
    }

    #[test]
    fn stream_error_surfaces() {
        let (session, feeder) = ChannelSession::new();
        feeder.fail(BusError::Stream("broker gone".into()));

        let result = session.next_message(Duration::from_millis(50));
        assert!(matches!(result, Err(BusError::Stream(_))));
    }

    #[test]
    fn close_is_idempotent() {
        let (session, feeder) = ChannelSession::new();
        session.close().unwrap();
        session.close().unwrap();
        assert!(session.is_closed());
        assert!(feeder.is_closed());
        assert!(!feeder.deliver(Message::new(0, "late")));
        assert_eq!(
            session.next_message(Duration::from_millis(10)).unwrap(),
            Delivery::Closed
        );
    }

    #[test]
    fn close_failure_reported_once() {
        let (session, _feeder) = ChannelSession::new();
        session.fail_next_close(BusError::Close("socket reset".into()));

        assert!(matches!(session.close(), Err(BusError::Close(_))));
        assert!(session.is_closed());
        session.close().unwrap();
    }

    #[test]
    fn close_wakes_blocked_reader() {
        let (session, _feeder) = ChannelSession::new();

        let reader = Arc::clone(&session);
        let handle = thread::spawn(move || {
            let start = Instant::now();
            let delivery = reader.next_message(Duration::from_secs(10)).unwrap();
            (delivery, start.elapsed())
        });

        thread::sleep(Duration::from_millis(50));
        session.close().unwrap();

        let (delivery, waited) = handle.join().unwrap();
        assert_eq!(delivery, Delivery::Closed);
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn bus_side_end() {
        let (session, feeder) = ChannelSession::new();
        feeder.deliver(Message::new(0, "x"));
        feeder.end();

        // Closed flag wins over anything still queued.
        assert_eq!(
            session.next_message(Duration::from_millis(10)).unwrap(),
            Delivery::Closed
        );
    }
}
