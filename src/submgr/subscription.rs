//! Per-subscriber record and delivery queue endpoints.

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// A message queued for delivery to one subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    /// `"edgex"` for validated event envelopes, `""` for anything else.
    pub event_type: String,
    /// Text of the event, JSON in practice.
    pub payload: String,
}

/// Mutable state of one subscription. Access under the record lock.
#[derive(Debug)]
pub(crate) struct SubState {
    /// Subscription id; blanked on deletion as the tombstone marker.
    pub id: String,
    /// Included topic prefixes, slash-terminated, sorted by length.
    pub includes: Vec<String>,
    /// Excluded topic prefixes, same shape as `includes`.
    pub excludes: Vec<String>,
    /// True while an SSE stream is attached.
    pub active: bool,
    /// True while a management request is in flight.
    pub processing: bool,
    /// When to auto-delete; `None` while active or processing.
    pub expires_at: Option<Instant>,
    /// Producer end of the delivery queue; dropped on deletion so that
    /// the consumer observes closure.
    pub sender: Option<mpsc::Sender<ChannelMessage>>,
    /// Consumer end, parked here between streams. Taken by the SSE
    /// endpoint, returned when the stream ends.
    pub receiver: Option<mpsc::Receiver<ChannelMessage>>,
    /// True once the queue has been closed on deletion.
    pub queue_closed: bool,
}

/// One subscriber: include/exclude prefix sets plus a bounded FIFO of
/// [`ChannelMessage`]. The registry owns the record's lifetime; observers
/// hold `Arc` handles and learn of deletion through the tombstone flags
/// and queue closure.
#[derive(Debug)]
pub struct Subscription {
    pub(crate) state: RwLock<SubState>,
}

impl Subscription {
    pub(crate) fn new(id: String, queue_capacity: usize, expires_at: Instant) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity);
        Self {
            state: RwLock::new(SubState {
                id,
                includes: Vec::new(),
                excludes: Vec::new(),
                active: false,
                processing: false,
                expires_at: Some(expires_at),
                sender: Some(sender),
                receiver: Some(receiver),
                queue_closed: false,
            }),
        }
    }

    /// The subscription id, or `""` once tombstoned.
    pub fn id(&self) -> String {
        self.state.read().id.clone()
    }
}
