//! # kfs bus
//!
//! Message-bus seam for the kfs partition filesystem.
//!
//! Partition files never talk to the cluster directly. They consume three
//! narrow contracts owned by the directory-level component:
//!
//! - [`ConnectionProvider`] - reconnect-if-necessary and boundary offset lookup
//! - [`SessionFactory`] - subscribe to one partition at a start offset
//! - [`ConsumerSession`] - a cancellable, bounded-wait message stream
//!
//! ## Available Implementations
//!
//! - [`ChannelSession`] - a session fed through an mpsc channel
//! - [`InMemoryBus`] - provider and factory over in-memory partition logs,
//!   with scriptable connectivity and failures
//!
//! ## Example
//!
//! ```rust
//! use kfs_bus::{ConsumerSession, Delivery, InMemoryBus, SessionFactory, StartOffset};
//! use std::time::Duration;
//!
//! let bus = InMemoryBus::new();
//! bus.create_topic("orders", 1);
//! bus.produce("orders", 0, "hello").unwrap();
//!
//! let session = bus.subscribe("orders", 0, StartOffset::Oldest).unwrap();
//! match session.next_message(Duration::from_millis(100)).unwrap() {
//!     Delivery::Message(m) => assert_eq!(&m.payload[..], b"hello"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod error;
mod memory;
mod offset;
mod provider;
mod session;
mod snapshot;

pub use channel::{ChannelSession, SessionFeeder};
pub use error::{BusError, BusResult};
pub use memory::InMemoryBus;
pub use offset::{Offset, OffsetBoundary, StartOffset};
pub use provider::{ConnectionProvider, SessionFactory};
pub use session::{ConsumerSession, Delivery, Message};
pub use snapshot::{BusSnapshot, PartitionSnapshot, TopicSnapshot};
