//! Consumer session trait definition.

use crate::error::BusResult;
use crate::offset::Offset;
use bytes::Bytes;
use std::time::Duration;
use uuid::Uuid;

/// A single message delivered by a consumer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Position of the message within its partition.
    pub offset: Offset,
    /// Message value.
    pub payload: Bytes,
}

impl Message {
    /// Creates a message.
    pub fn new(offset: Offset, payload: impl Into<Bytes>) -> Self {
        Self {
            offset,
            payload: payload.into(),
        }
    }

    /// Length of the payload in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Outcome of waiting for the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A message arrived before the wait elapsed.
    Message(Message),
    /// The wait elapsed with no message. Not an error.
    Idle,
    /// The session was closed, locally or by the bus.
    Closed,
}

/// A live, cancellable subscription to one partition.
///
/// Sessions produce an unbounded, non-restartable sequence of messages in the
/// partition's native order. Out-of-band stream errors surface as `Err` from
/// [`next_message`](Self::next_message).
///
/// # Invariants
///
/// - `next_message` never blocks longer than the given timeout
/// - `close` is idempotent
/// - `close` wakes a concurrent `next_message` promptly with [`Delivery::Closed`]
/// - Sessions must be `Send + Sync` so a close can race an in-flight read
pub trait ConsumerSession: Send + Sync {
    /// Identifier of this session, for logging.
    fn id(&self) -> Uuid;

    /// Waits up to `timeout` for the next message.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus reported a stream failure.
    fn next_message(&self, timeout: Duration) -> BusResult<Delivery>;

    /// Closes the session and releases its network resource.
    ///
    /// # Errors
    ///
    /// Returns an error if shutdown failed. The session is closed regardless.
    fn close(&self) -> BusResult<()>;

    /// Returns true once the session has been closed.
    fn is_closed(&self) -> bool;
}
