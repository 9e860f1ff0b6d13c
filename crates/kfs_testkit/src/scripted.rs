//! Deterministic consumer sessions.
//!
//! A [`ScriptedSession`] replays a fixed list of deliveries and never waits:
//! once the script runs out it reports the partition as idle. Useful for
//! driving a [`ReadAccumulator`](kfs_core::ReadAccumulator) without timing.

use kfs_bus::{BusError, BusResult, ConsumerSession, Delivery, Message, Offset};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// One step of a session script.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver a message.
    Message(Vec<u8>),
    /// Report the partition as idle once.
    Idle,
    /// Report a stream error.
    Fail(String),
}

/// A consumer session that replays a script.
#[derive(Debug)]
pub struct ScriptedSession {
    id: Uuid,
    script: Mutex<VecDeque<Step>>,
    next_offset: Mutex<Offset>,
    closed: AtomicBool,
}

impl ScriptedSession {
    /// Creates a session that replays `steps`.
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            id: Uuid::new_v4(),
            script: Mutex::new(steps.into_iter().collect()),
            next_offset: Mutex::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a session that delivers `payloads` and then goes idle.
    pub fn from_payloads<P: AsRef<[u8]>>(payloads: &[P]) -> Self {
        Self::new(payloads.iter().map(|p| Step::Message(p.as_ref().to_vec())))
    }

    /// Number of steps not yet replayed.
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

impl ConsumerSession for ScriptedSession {
    fn id(&self) -> Uuid {
        self.id
    }

    fn next_message(&self, _timeout: Duration) -> BusResult<Delivery> {
        if self.is_closed() {
            return Ok(Delivery::Closed);
        }
        match self.script.lock().pop_front() {
            Some(Step::Message(payload)) => {
                let mut offset = self.next_offset.lock();
                let message = Message::new(*offset, payload);
                *offset += 1;
                Ok(Delivery::Message(message))
            }
            Some(Step::Fail(message)) => Err(BusError::Stream(message)),
            Some(Step::Idle) | None => Ok(Delivery::Idle),
        }
    }

    fn close(&self) -> BusResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_then_idles() {
        let session = ScriptedSession::new(vec![
            Step::Message(b"a".to_vec()),
            Step::Idle,
            Step::Fail("boom".into()),
        ]);
        let wait = Duration::ZERO;

        assert!(matches!(
            session.next_message(wait).unwrap(),
            Delivery::Message(m) if m.offset == 0
        ));
        assert_eq!(session.next_message(wait).unwrap(), Delivery::Idle);
        assert!(session.next_message(wait).is_err());
        assert_eq!(session.next_message(wait).unwrap(), Delivery::Idle);
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn closed_session() {
        let session = ScriptedSession::from_payloads(&["a"]);
        session.close().unwrap();
        assert_eq!(
            session.next_message(Duration::ZERO).unwrap(),
            Delivery::Closed
        );
    }
}
