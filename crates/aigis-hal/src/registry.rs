use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use tokio::sync::mpsc;

/// Identifies one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fan-out of frames to every connected subscriber.
///
/// Delivery is best effort: a subscriber whose queue is full or closed is removed on the
/// failed send and never retried.
pub struct ConnectionRegistry<M> {
    next_id: AtomicU64,
    subscribers: DashMap<ConnectionId, mpsc::Sender<M>>,
}

impl<M: Clone> ConnectionRegistry<M> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            subscribers: DashMap::new(),
        }
    }

    pub fn subscribe(&self, tx: mpsc::Sender<M>) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.insert(id, tx);
        log::info!("Subscriber {} connected ({} total)", id, self.len());
        id
    }

    /// Creates a queue of `capacity` frames and registers its sending half.
    pub fn subscribe_channel(&self, capacity: usize) -> (ConnectionId, mpsc::Receiver<M>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (self.subscribe(tx), rx)
    }

    /// Removes a subscriber. Removing an unknown id does nothing.
    pub fn unsubscribe(&self, id: ConnectionId) {
        if self.subscribers.remove(&id).is_some() {
            log::info!("Subscriber {} disconnected ({} left)", id, self.len());
        }
    }

    /// Sends `msg` to every subscriber and returns how many accepted it.
    pub fn broadcast(&self, msg: &M) -> usize {
        let mut delivered = 0;
        self.subscribers.retain(|id, tx| match tx.try_send(msg.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(err) => {
                log::info!("Dropping subscriber {}: {}", id, err);
                false
            }
        });
        delivered
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<M: Clone> Default for ConnectionRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}
