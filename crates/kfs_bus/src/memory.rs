//! In-memory message bus for testing and snapshot inspection.

use crate::channel::{ChannelSession, SessionFeeder};
use crate::error::{BusError, BusResult};
use crate::offset::{Offset, OffsetBoundary, StartOffset};
use crate::provider::{ConnectionProvider, SessionFactory};
use crate::session::{ConsumerSession, Message};
use crate::snapshot::{BusSnapshot, PartitionSnapshot, TopicSnapshot};
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// An in-memory bus implementing both [`ConnectionProvider`] and
/// [`SessionFactory`].
///
/// Messages produced to a partition are appended to its retained log and
/// pushed to every live session on that partition. Connectivity and failures
/// can be scripted for tests.
///
/// # Example
///
/// ```rust
/// use kfs_bus::{ConnectionProvider, InMemoryBus, OffsetBoundary};
///
/// let bus = InMemoryBus::new();
/// bus.create_topic("orders", 1);
/// bus.produce("orders", 0, "a").unwrap();
/// assert_eq!(bus.resolve_offset("orders", 0, OffsetBoundary::Newest).unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryBus {
    topics: RwLock<BTreeMap<String, Vec<PartitionLog>>>,
    connected: AtomicBool,
    reachable: AtomicBool,
    reconnects: AtomicU64,
    faults: Mutex<Faults>,
}

#[derive(Debug, Default)]
struct PartitionLog {
    base_offset: Offset,
    messages: VecDeque<Bytes>,
    subscribers: Vec<SessionFeeder>,
}

#[derive(Debug, Default)]
struct Faults {
    offset_lookup: HashMap<OffsetBoundary, String>,
    subscribe: Option<String>,
    close: Option<String>,
}

impl PartitionLog {
    fn newest(&self) -> Offset {
        self.base_offset + self.messages.len() as Offset
    }

    fn prune(&mut self) {
        self.subscribers.retain(|feeder| !feeder.is_closed());
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBus {
    /// Creates an empty, connected bus.
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(BTreeMap::new()),
            connected: AtomicBool::new(true),
            reachable: AtomicBool::new(true),
            reconnects: AtomicU64::new(0),
            faults: Mutex::new(Faults::default()),
        }
    }

    /// Creates a bus pre-loaded with the contents of a snapshot.
    pub fn from_snapshot(snapshot: &BusSnapshot) -> Self {
        let bus = Self::new();
        {
            let mut topics = bus.topics.write();
            for topic in &snapshot.topics {
                let partitions = topic
                    .partitions
                    .iter()
                    .map(|p| PartitionLog {
                        base_offset: p.base_offset,
                        messages: p
                            .messages
                            .iter()
                            .map(|m| Bytes::copy_from_slice(m.as_bytes()))
                            .collect(),
                        subscribers: Vec::new(),
                    })
                    .collect();
                topics.insert(topic.name.clone(), partitions);
            }
        }
        bus
    }

    /// Captures the retained contents of the bus.
    ///
    /// Message values are rendered lossily as UTF-8.
    pub fn snapshot(&self) -> BusSnapshot {
        let topics = self.topics.read();
        BusSnapshot {
            topics: topics
                .iter()
                .map(|(name, partitions)| TopicSnapshot {
                    name: name.clone(),
                    partitions: partitions
                        .iter()
                        .map(|log| PartitionSnapshot {
                            base_offset: log.base_offset,
                            messages: log
                                .messages
                                .iter()
                                .map(|m| String::from_utf8_lossy(m).into_owned())
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Creates a topic with `partitions` empty partitions.
    ///
    /// An existing topic is grown to at least that many partitions.
    pub fn create_topic(&self, topic: &str, partitions: u32) {
        let mut topics = self.topics.write();
        let logs = topics.entry(topic.to_string()).or_default();
        while logs.len() < partitions as usize {
            logs.push(PartitionLog::default());
        }
    }

    /// Returns topic names in order.
    pub fn topics(&self) -> Vec<String> {
        self.topics.read().keys().cloned().collect()
    }

    /// Returns the number of partitions of a topic, if it exists.
    pub fn partitions(&self, topic: &str) -> Option<u32> {
        self.topics.read().get(topic).map(|p| p.len() as u32)
    }

    /// Appends a message and delivers it to live sessions on the partition.
    ///
    /// Returns the offset assigned to the message.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition does not exist.
    pub fn produce(
        &self,
        topic: &str,
        partition: u32,
        payload: impl Into<Bytes>,
    ) -> BusResult<Offset> {
        let payload = payload.into();
        let mut topics = self.topics.write();
        let log = Self::log_mut(&mut topics, topic, partition)?;

        let offset = log.newest();
        log.messages.push_back(payload.clone());
        log.subscribers
            .retain(|feeder| feeder.deliver(Message::new(offset, payload.clone())));
        Ok(offset)
    }

    /// Discards retained messages older than `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition does not exist.
    pub fn truncate_before(&self, topic: &str, partition: u32, offset: Offset) -> BusResult<()> {
        let mut topics = self.topics.write();
        let log = Self::log_mut(&mut topics, topic, partition)?;

        while log.base_offset < offset && !log.messages.is_empty() {
            log.messages.pop_front();
            log.base_offset += 1;
        }
        Ok(())
    }

    /// Delivers a stream error to every live session on the partition.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition does not exist.
    pub fn inject_stream_error(&self, topic: &str, partition: u32, message: &str) -> BusResult<()> {
        let mut topics = self.topics.write();
        let log = Self::log_mut(&mut topics, topic, partition)?;
        log.subscribers
            .retain(|feeder| feeder.fail(BusError::Stream(message.to_string())));
        Ok(())
    }

    /// Ends every live session on the partition from the bus side.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition does not exist.
    pub fn end_sessions(&self, topic: &str, partition: u32) -> BusResult<()> {
        let mut topics = self.topics.write();
        let log = Self::log_mut(&mut topics, topic, partition)?;
        for feeder in log.subscribers.drain(..) {
            feeder.end();
        }
        Ok(())
    }

    /// Returns the number of open sessions on the partition.
    pub fn live_sessions(&self, topic: &str, partition: u32) -> usize {
        let mut topics = self.topics.write();
        match Self::log_mut(&mut topics, topic, partition) {
            Ok(log) => {
                log.prune();
                log.subscribers.len()
            }
            Err(_) => 0,
        }
    }

    /// Marks the current connection as broken. The next
    /// [`ensure_connected`](ConnectionProvider::ensure_connected) reconnects if
    /// the cluster is reachable.
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Sets whether reconnect attempts succeed.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
        if !reachable {
            self.drop_connection();
        }
    }

    /// Returns how many times the bus reconnected.
    pub fn reconnect_count(&self) -> u64 {
        self.reconnects.load(Ordering::SeqCst)
    }

    /// Makes lookups of `boundary` fail until cleared.
    pub fn fail_offset_lookup(&self, boundary: OffsetBoundary, message: impl Into<String>) {
        self.faults.lock().offset_lookup.insert(boundary, message.into());
    }

    /// Makes subscriptions fail until cleared.
    pub fn fail_subscribe(&self, message: impl Into<String>) {
        self.faults.lock().subscribe = Some(message.into());
    }

    /// Makes the next session created report an error when it is closed.
    pub fn fail_close(&self, message: impl Into<String>) {
        self.faults.lock().close = Some(message.into());
    }

    /// Clears every scripted failure.
    pub fn clear_faults(&self) {
        *self.faults.lock() = Faults::default();
    }

    fn log_mut<'a>(
        topics: &'a mut BTreeMap<String, Vec<PartitionLog>>,
        topic: &str,
        partition: u32,
    ) -> BusResult<&'a mut PartitionLog> {
        topics
            .get_mut(topic)
            .and_then(|p| p.get_mut(partition as usize))
            .ok_or_else(|| BusError::UnknownTopicOrPartition {
                topic: topic.to_string(),
                partition,
            })
    }

    fn check_connected(&self) -> BusResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BusError::Connection("not connected".into()))
        }
    }
}

impl ConnectionProvider for InMemoryBus {
    fn ensure_connected(&self) -> BusResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(BusError::Connection("cluster unreachable".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        let count = self.reconnects.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(reconnects = count, "reconnected to in-memory bus");
        Ok(())
    }

    fn resolve_offset(
        &self,
        topic: &str,
        partition: u32,
        boundary: OffsetBoundary,
    ) -> BusResult<Offset> {
        self.check_connected()?;
        if let Some(message) = self.faults.lock().offset_lookup.get(&boundary) {
            return Err(BusError::OffsetLookup {
                topic: topic.to_string(),
                partition,
                boundary,
                message: message.clone(),
            });
        }

        let topics = self.topics.read();
        let log = topics
            .get(topic)
            .and_then(|p| p.get(partition as usize))
            .ok_or_else(|| BusError::UnknownTopicOrPartition {
                topic: topic.to_string(),
                partition,
            })?;

        Ok(match boundary {
            OffsetBoundary::Oldest => log.base_offset,
            OffsetBoundary::Newest => log.newest(),
        })
    }
}

impl SessionFactory for InMemoryBus {
    fn subscribe(
        &self,
        topic: &str,
        partition: u32,
        start: StartOffset,
    ) -> BusResult<Arc<dyn ConsumerSession>> {
        self.check_connected()?;
        let close_failure = {
            let mut faults = self.faults.lock();
            if let Some(message) = &faults.subscribe {
                return Err(BusError::Subscribe(message.clone()));
            }
            faults.close.take()
        };

        let mut topics = self.topics.write();
        let log = Self::log_mut(&mut topics, topic, partition)
            .map_err(|e| BusError::Subscribe(e.to_string()))?;

        let first = match start {
            StartOffset::Oldest => log.base_offset,
            StartOffset::Newest => log.newest(),
            StartOffset::At(offset) => offset,
        };
        if first < log.base_offset || first > log.newest() {
            return Err(BusError::Subscribe(format!(
                "offset {first} out of range [{}, {}]",
                log.base_offset,
                log.newest()
            )));
        }

        let (session, feeder) = ChannelSession::new();
        if let Some(message) = close_failure {
            session.fail_next_close(BusError::Close(message));
        }

        let skip = (first - log.base_offset) as usize;
        for (i, payload) in log.messages.iter().enumerate().skip(skip) {
            feeder.deliver(Message::new(log.base_offset + i as Offset, payload.clone()));
        }

        log.prune();
        log.subscribers.push(feeder);
        debug!(topic, partition, %start, session = %session.id(), "subscribed");

        Ok(session as Arc<dyn ConsumerSession>)
    }
}
