//! Subscription registry: creation, deletion, prefix matching with
//! coalescence, and idle sweeping.
//!
//! Given a topic string, the manager returns the producer ends of the
//! queues of all subscriptions whose include/exclude criteria match.
//! The event pipeline checks every incoming topic against this and fans
//! the event out to the returned queues.

use crate::submgr::subscription::{ChannelMessage, Subscription};
use crate::submgr::token::generate_token;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

/// Errors surfaced by the subscription manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubError {
    #[error("subscription limit reached")]
    SubscriptionLimit,
    #[error("include limit reached")]
    IncludeLimit,
    #[error("exclude limit reached")]
    ExcludeLimit,
    #[error("subscription not found")]
    NotFound,
    #[error("token generation failed: {0}")]
    Rng(String),
}

/// Limits and timing knobs, taken from the `[sse]` config section.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum number of simultaneous subscriptions.
    pub subscription_limit: u32,
    /// Maximum entries in each of the include and exclude lists,
    /// counted independently.
    pub include_exclude_limit: usize,
    /// Delivery queue capacity per subscription.
    pub queue_capacity: usize,
    /// How long a subscription may sit with nobody listening and no
    /// request in flight before it is auto-deleted.
    pub idle_expiration: Duration,
    /// How often the sweeper checks for expired subscriptions.
    pub check_interval: Duration,
}

#[derive(Default)]
struct Registry {
    by_id: HashMap<String, Arc<Subscription>>,
    // Parallel to by_id; cloned wholesale for iteration during matching.
    list: Vec<Arc<Subscription>>,
}

/// The in-memory subscription registry.
///
/// The registry exclusively owns each record's lifetime. Endpoints hold
/// `Arc<Subscription>` handles; after deletion a stale handle observes
/// the tombstone (blank id, closed queue) instead of live state.
pub struct SubscriptionManager {
    registry: RwLock<Registry>,
    // Cardinality mirror, readable without the registry lock on the
    // ingestion hot path.
    num_subscriptions: AtomicU32,
    limits: Limits,
    shutdown_tx: watch::Sender<bool>,
}

/// Add a trailing slash unless the string is empty or already has one.
/// Forces prefix matches onto segment boundaries so that `foo` cannot
/// match `foobar`.
fn end_with_slash(s: &str) -> String {
    if s.is_empty() || s.ends_with('/') {
        s.to_string()
    } else {
        format!("{s}/")
    }
}

impl SubscriptionManager {
    /// Set up the registry. The sweeper is started separately with
    /// [`SubscriptionManager::start_sweeper`].
    pub fn new(limits: Limits) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            registry: RwLock::new(Registry::default()),
            num_subscriptions: AtomicU32::new(0),
            limits,
            shutdown_tx,
        })
    }

    /// Current number of subscriptions, lock-free.
    pub fn count(&self) -> u32 {
        self.num_subscriptions.load(Ordering::Acquire)
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Create a new subscription subscribed to nothing and return its id.
    pub fn new_subscription(&self) -> Result<String, SubError> {
        if self.count() >= self.limits.subscription_limit {
            return Err(SubError::SubscriptionLimit);
        }
        let id = generate_token()?;
        let sub = Arc::new(Subscription::new(
            id.clone(),
            self.limits.queue_capacity,
            Instant::now() + self.limits.idle_expiration,
        ));
        let mut reg = self.registry.write();
        reg.by_id.insert(id.clone(), Arc::clone(&sub));
        reg.list.push(sub);
        self.num_subscriptions
            .store(reg.by_id.len() as u32, Ordering::Release);
        Ok(id)
    }

    /// Delete a subscription and close its queue. Idempotent; unknown
    /// ids are ignored.
    pub fn delete(&self, subid: &str) {
        let mut reg = self.registry.write();
        let Some(sub) = reg.by_id.remove(subid) else {
            return;
        };
        reg.list.retain(|s| !Arc::ptr_eq(s, &sub));
        self.num_subscriptions
            .store(reg.by_id.len() as u32, Ordering::Release);
        drop(reg);
        let mut st = sub.state.write();
        st.active = false;
        st.processing = false;
        st.id.clear();
        // Dropping the stored sender is what closes the queue: once any
        // in-flight producer clones are gone, the consumer's recv()
        // returns None.
        st.sender = None;
        st.receiver = None;
        st.queue_closed = true;
    }

    /// Look up a subscription handle by id.
    pub fn lookup(&self, subid: &str) -> Option<Arc<Subscription>> {
        self.registry.read().by_id.get(subid).cloned()
    }

    /// Handles of all current subscriptions.
    pub fn snapshot(&self) -> Vec<Arc<Subscription>> {
        self.registry.read().list.clone()
    }

    /// True once the record has been deleted (id blanked).
    pub fn is_tombstoned(&self, sub: &Subscription) -> bool {
        sub.state.read().id.is_empty()
    }

    /// True once the record's queue has been closed on deletion.
    pub fn is_queue_closed(&self, sub: &Subscription) -> bool {
        sub.state.read().queue_closed
    }

    /// A subscription's include and exclude lists.
    pub fn info(&self, sub: &Subscription) -> (Vec<String>, Vec<String>) {
        let st = sub.state.read();
        (st.includes.clone(), st.excludes.clone())
    }

    /// Add a topic prefix to the include list.
    ///
    /// Entries are coalesced: the prefix replaces all include entries it
    /// covers (entries that begin with it). If the exact prefix sits in
    /// the exclude list, that exclude entry is removed instead and
    /// nothing is added. An include entry of `""` covers everything.
    pub fn include(&self, sub: &Subscription, topic_prefix: &str) -> Result<(), SubError> {
        let prefix = end_with_slash(topic_prefix);
        let mut st = sub.state.write();
        // Exact match in the opposite list cancels out. Removal keeps
        // the length ordering, no re-sort needed.
        if st.excludes.iter().any(|e| *e == prefix) {
            st.excludes.retain(|e| *e != prefix);
            return Ok(());
        }
        if st.includes.iter().any(|i| *i == prefix) {
            return Ok(());
        }
        st.includes.retain(|i| !i.starts_with(&prefix));
        if st.includes.len() >= self.limits.include_exclude_limit {
            return Err(SubError::IncludeLimit);
        }
        st.includes.push(prefix);
        // Stable sort: equal lengths keep insertion order.
        st.includes.sort_by_key(String::len);
        Ok(())
    }

    /// Add a topic prefix to the exclude list. Mirror image of
    /// [`SubscriptionManager::include`].
    pub fn exclude(&self, sub: &Subscription, topic_prefix: &str) -> Result<(), SubError> {
        let prefix = end_with_slash(topic_prefix);
        let mut st = sub.state.write();
        if st.includes.iter().any(|i| *i == prefix) {
            st.includes.retain(|i| *i != prefix);
            return Ok(());
        }
        if st.excludes.iter().any(|e| *e == prefix) {
            return Ok(());
        }
        st.excludes.retain(|e| !e.starts_with(&prefix));
        if st.excludes.len() >= self.limits.include_exclude_limit {
            return Err(SubError::ExcludeLimit);
        }
        st.excludes.push(prefix);
        st.excludes.sort_by_key(String::len);
        Ok(())
    }

    /// Record whether an SSE stream is attached. Expiration is armed
    /// only while the subscription is neither active nor processing.
    pub fn set_active(&self, sub: &Subscription, is_active: bool) {
        let mut st = sub.state.write();
        st.active = is_active;
        st.expires_at = if st.active || st.processing {
            None
        } else {
            Some(Instant::now() + self.limits.idle_expiration)
        };
    }

    /// Record whether a management request is in flight, which keeps
    /// the sweeper away for the duration.
    pub fn set_processing(&self, sub: &Subscription, is_processing: bool) {
        let mut st = sub.state.write();
        st.processing = is_processing;
        st.expires_at = if st.active || st.processing {
            None
        } else {
            Some(Instant::now() + self.limits.idle_expiration)
        };
    }

    /// Producer ends of the queues of every active subscription whose
    /// include/exclude criteria match the topic.
    ///
    /// The returned senders stay valid after deletion races: a send on a
    /// closed queue fails without reaching anyone.
    pub fn subscribed_channels(&self, topic: &str) -> Vec<mpsc::Sender<ChannelMessage>> {
        let current = self.count();
        // Common case: nobody is subscribed to anything.
        if current == 0 {
            return Vec::new();
        }
        let topic = end_with_slash(topic);
        let mut rv = Vec::with_capacity(current as usize);
        for sub in self.snapshot() {
            let st = sub.state.read();
            if !st.active {
                continue;
            }
            let mut matched = false;
            for inc in &st.includes {
                if inc.len() > topic.len() {
                    // Sorted by length; nothing past here can be a prefix.
                    break;
                }
                if topic.starts_with(inc.as_str()) {
                    matched = true;
                    for exc in &st.excludes {
                        if exc.len() > topic.len() {
                            break;
                        }
                        if topic.starts_with(exc.as_str()) {
                            matched = false;
                            break;
                        }
                    }
                    break;
                }
            }
            if matched {
                if let Some(tx) = &st.sender {
                    rv.push(tx.clone());
                }
            }
        }
        rv
    }

    /// Attach the single consumer slot: takes the queue receiver and
    /// marks the subscription active. The returned stream restores both
    /// on drop. Fails if the subscription is tombstoned, its queue is
    /// closed, or another stream already holds the slot.
    pub fn attach_stream(self: &Arc<Self>, sub: &Arc<Subscription>) -> Result<EventStream, SubError> {
        let receiver = {
            let mut st = sub.state.write();
            if st.id.is_empty() || st.queue_closed {
                return Err(SubError::NotFound);
            }
            let Some(rx) = st.receiver.take() else {
                return Err(SubError::NotFound);
            };
            st.active = true;
            st.expires_at = None;
            rx
        };
        Ok(EventStream {
            manager: Arc::clone(self),
            sub: Arc::clone(sub),
            receiver: Some(receiver),
        })
    }

    /// Mark a management request in flight for the guard's lifetime.
    pub fn begin_processing(self: &Arc<Self>, sub: &Arc<Subscription>) -> ProcessingGuard {
        self.set_processing(sub, true);
        ProcessingGuard {
            manager: Arc::clone(self),
            sub: Arc::clone(sub),
        }
    }

    /// Start the background idle sweeper. It wakes every
    /// `check_interval` and deletes subscriptions past their expiration
    /// deadline, until [`SubscriptionManager::close`] signals shutdown.
    pub fn start_sweeper(self: &Arc<Self>) {
        let mgr = Arc::clone(self);
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(mgr.limits.check_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => mgr.sweep(),
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("idle sweeper stopped");
        });
    }

    /// One sweeper pass. Collects expired ids under the read lock, then
    /// deletes them after dropping it; delete takes the write lock.
    fn sweep(&self) {
        let now = Instant::now();
        let expired: Vec<String> = {
            let reg = self.registry.read();
            reg.by_id
                .iter()
                .filter(|(_, sub)| {
                    let st = sub.state.read();
                    !st.active
                        && !st.processing
                        && st.expires_at.is_some_and(|deadline| now > deadline)
                })
                .map(|(id, _)| id.clone())
                .collect()
        };
        for id in expired {
            tracing::debug!(subscription = %id, "deleting idle subscription");
            self.delete(&id);
        }
    }

    /// Stop the sweeper and delete every subscription, closing all
    /// queues.
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(true);
        let ids: Vec<String> = self.registry.read().by_id.keys().cloned().collect();
        for id in ids {
            self.delete(&id);
        }
    }
}

/// The consumer side of one subscription's delivery queue, attached to
/// an SSE response for as long as the client stays connected.
///
/// Dropping the stream releases the consumer slot and lowers the active
/// flag, re-arming idle expiration.
pub struct EventStream {
    manager: Arc<SubscriptionManager>,
    sub: Arc<Subscription>,
    receiver: Option<mpsc::Receiver<ChannelMessage>>,
}

impl EventStream {
    /// Next queued message, or `None` once the queue is closed by
    /// deletion.
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        match self.receiver.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(rx) = self.receiver.take() {
            let mut st = self.sub.state.write();
            if !st.queue_closed {
                st.receiver = Some(rx);
            }
        }
        self.manager.set_active(&self.sub, false);
    }
}

/// Scoped `processing` flag; keeps the sweeper away while a management
/// handler works on the subscription.
pub struct ProcessingGuard {
    manager: Arc<SubscriptionManager>,
    sub: Arc<Subscription>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.manager.set_processing(&self.sub, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_limits() -> Limits {
        Limits {
            subscription_limit: 10,
            include_exclude_limit: 100,
            queue_capacity: 16,
            idle_expiration: Duration::from_secs(60),
            check_interval: Duration::from_secs(5),
        }
    }

    fn manager_with_prefix_limit(limit: usize) -> Arc<SubscriptionManager> {
        SubscriptionManager::new(Limits {
            include_exclude_limit: limit,
            ..test_limits()
        })
    }

    #[test]
    fn end_with_slash_normalizes() {
        assert_eq!(end_with_slash("a/b"), "a/b/");
        assert_eq!(end_with_slash("a/b/"), "a/b/");
        assert_eq!(end_with_slash(""), "");
    }

    #[test]
    fn count_tracks_creates_and_deletes() {
        let mgr = SubscriptionManager::new(test_limits());
        let a = mgr.new_subscription().unwrap();
        let b = mgr.new_subscription().unwrap();
        assert_eq!(mgr.count(), 2);
        mgr.delete(&a);
        assert_eq!(mgr.count(), 1);
        // Idempotent.
        mgr.delete(&a);
        assert_eq!(mgr.count(), 1);
        mgr.delete(&b);
        assert_eq!(mgr.count(), 0);
    }

    #[test]
    fn subscription_limit_is_enforced() {
        let mgr = SubscriptionManager::new(Limits {
            subscription_limit: 2,
            ..test_limits()
        });
        mgr.new_subscription().unwrap();
        mgr.new_subscription().unwrap();
        assert_eq!(mgr.new_subscription(), Err(SubError::SubscriptionLimit));
    }

    #[test]
    fn include_coalesces_covered_entries() {
        let mgr = manager_with_prefix_limit(3);
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        mgr.include(&sub, "edgex/events/device/Profile1/Device1/Command1")
            .unwrap();
        mgr.include(&sub, "edgex/events/device/Profile1/Device1/Command2")
            .unwrap();
        mgr.include(&sub, "edgex/events/device/Profile1/Device1/Command3")
            .unwrap();
        mgr.include(&sub, "edgex/events/device").unwrap();
        let (includes, excludes) = mgr.info(&sub);
        assert_eq!(includes, vec!["edgex/events/device/".to_string()]);
        assert!(excludes.is_empty());
    }

    #[test]
    fn include_limit_leaves_list_unchanged() {
        let mgr = manager_with_prefix_limit(3);
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        mgr.include(&sub, "a").unwrap();
        mgr.include(&sub, "b").unwrap();
        mgr.include(&sub, "c").unwrap();
        assert_eq!(mgr.include(&sub, "d"), Err(SubError::IncludeLimit));
        let (includes, _) = mgr.info(&sub);
        assert_eq!(includes, vec!["a/", "b/", "c/"]);
    }

    #[test]
    fn include_is_idempotent() {
        let mgr = manager_with_prefix_limit(3);
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        mgr.include(&sub, "a/b").unwrap();
        mgr.include(&sub, "a/b/").unwrap();
        let (includes, _) = mgr.info(&sub);
        assert_eq!(includes, vec!["a/b/"]);
    }

    #[test]
    fn exact_prefix_cancels_across_lists() {
        let mgr = manager_with_prefix_limit(10);
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        mgr.exclude(&sub, "a/b").unwrap();
        // Same prefix on the include side removes the exclude entry and
        // adds nothing.
        mgr.include(&sub, "a/b").unwrap();
        let (includes, excludes) = mgr.info(&sub);
        assert!(includes.is_empty());
        assert!(excludes.is_empty());
    }

    #[test]
    fn covering_does_not_cross_lists() {
        let mgr = manager_with_prefix_limit(10);
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        mgr.exclude(&sub, "a/b/c").unwrap();
        // "a/" covers "a/b/c/" but only exact matches cancel across
        // lists; the exclude entry stays.
        mgr.include(&sub, "a").unwrap();
        let (includes, excludes) = mgr.info(&sub);
        assert_eq!(includes, vec!["a/"]);
        assert_eq!(excludes, vec!["a/b/c/"]);
    }

    #[test]
    fn lists_stay_sorted_prefix_free_and_disjoint() {
        let mgr = manager_with_prefix_limit(100);
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        let ops: &[(bool, &str)] = &[
            (true, "alpha/beta/gamma"),
            (true, "alpha/beta"),
            (false, "alpha/beta/delta"),
            (true, "omega"),
            (false, "omega"),
            (false, "sigma/t"),
            (true, "sigma/t/u/v"),
            (false, "sigma"),
            (true, "alpha"),
        ];
        for (is_include, prefix) in ops {
            if *is_include {
                mgr.include(&sub, prefix).unwrap();
            } else {
                mgr.exclude(&sub, prefix).unwrap();
            }
        }
        let (includes, excludes) = mgr.info(&sub);
        for list in [&includes, &excludes] {
            for pair in list.windows(2) {
                assert!(pair[0].len() <= pair[1].len(), "unsorted: {list:?}");
            }
            for (i, a) in list.iter().enumerate() {
                for (j, b) in list.iter().enumerate() {
                    if i != j {
                        assert!(!b.starts_with(a.as_str()), "{a} covers {b} in {list:?}");
                    }
                }
            }
        }
        for inc in &includes {
            assert!(!excludes.contains(inc), "{inc} present in both lists");
        }
    }

    #[tokio::test]
    async fn matching_honors_include_and_exclude() {
        let mgr = SubscriptionManager::new(test_limits());
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        mgr.include(&sub, "edgex/events/device").unwrap();
        mgr.exclude(&sub, "edgex/events/device/Secret").unwrap();
        mgr.set_active(&sub, true);

        assert_eq!(mgr.subscribed_channels("edgex/events/device/D1/R1").len(), 1);
        assert_eq!(mgr.subscribed_channels("edgex/events/device").len(), 1);
        assert!(mgr.subscribed_channels("edgex/events/devices").is_empty());
        assert!(mgr
            .subscribed_channels("edgex/events/device/Secret/R1")
            .is_empty());
        assert!(mgr.subscribed_channels("control/Shutdown").is_empty());
    }

    #[tokio::test]
    async fn empty_include_matches_everything() {
        let mgr = SubscriptionManager::new(test_limits());
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        mgr.include(&sub, "").unwrap();
        mgr.set_active(&sub, true);
        assert_eq!(mgr.subscribed_channels("anything/at/all").len(), 1);
        assert_eq!(mgr.subscribed_channels("x").len(), 1);
    }

    #[tokio::test]
    async fn inactive_subscriptions_do_not_match() {
        let mgr = SubscriptionManager::new(test_limits());
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        mgr.include(&sub, "a").unwrap();
        assert!(mgr.subscribed_channels("a/b").is_empty());
        mgr.set_active(&sub, true);
        assert_eq!(mgr.subscribed_channels("a/b").len(), 1);
        mgr.set_active(&sub, false);
        assert!(mgr.subscribed_channels("a/b").is_empty());
    }

    #[tokio::test]
    async fn delete_closes_queue_for_attached_consumer() {
        let mgr = SubscriptionManager::new(test_limits());
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        mgr.include(&sub, "a").unwrap();
        let mut stream = mgr.attach_stream(&sub).unwrap();

        let senders = mgr.subscribed_channels("a/b");
        assert_eq!(senders.len(), 1);
        senders[0]
            .send(ChannelMessage {
                event_type: String::new(),
                payload: "one".to_string(),
            })
            .await
            .unwrap();
        drop(senders);
        mgr.delete(&id);

        // Buffered message drains first, then the closed signal.
        assert_eq!(stream.recv().await.unwrap().payload, "one");
        assert!(stream.recv().await.is_none());
        assert!(mgr.is_tombstoned(&sub));
        assert!(mgr.is_queue_closed(&sub));
        assert!(mgr.lookup(&id).is_none());
    }

    #[tokio::test]
    async fn consumer_slot_is_exclusive_and_returned() {
        let mgr = SubscriptionManager::new(test_limits());
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        let stream = mgr.attach_stream(&sub).unwrap();
        assert!(mgr.attach_stream(&sub).is_err());
        drop(stream);
        // Slot restored, active lowered.
        assert!(!sub.state.read().active);
        let again = mgr.attach_stream(&sub);
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn expiration_armed_only_when_fully_idle() {
        let mgr = SubscriptionManager::new(test_limits());
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        assert!(sub.state.read().expires_at.is_some());
        mgr.set_processing(&sub, true);
        assert!(sub.state.read().expires_at.is_none());
        mgr.set_active(&sub, true);
        mgr.set_processing(&sub, false);
        // Still streaming, so no deadline yet.
        assert!(sub.state.read().expires_at.is_none());
        mgr.set_active(&sub, false);
        assert!(sub.state.read().expires_at.is_some());
    }

    #[tokio::test]
    async fn sweeper_deletes_only_expired_idle_subscriptions() {
        let mgr = SubscriptionManager::new(Limits {
            idle_expiration: Duration::from_millis(100),
            check_interval: Duration::from_millis(20),
            ..test_limits()
        });
        let idle = mgr.new_subscription().unwrap();
        let streaming = mgr.new_subscription().unwrap();
        let busy = mgr.new_subscription().unwrap();
        mgr.set_active(&mgr.lookup(&streaming).unwrap(), true);
        mgr.set_processing(&mgr.lookup(&busy).unwrap(), true);
        mgr.start_sweeper();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(mgr.lookup(&idle).is_none());
        assert!(mgr.lookup(&streaming).is_some());
        assert!(mgr.lookup(&busy).is_some());
        assert_eq!(mgr.count(), 2);
        mgr.close();
    }

    #[tokio::test]
    async fn close_deletes_everything() {
        let mgr = SubscriptionManager::new(test_limits());
        let a = mgr.new_subscription().unwrap();
        let b = mgr.new_subscription().unwrap();
        let sub_a = mgr.lookup(&a).unwrap();
        mgr.close();
        assert_eq!(mgr.count(), 0);
        assert!(mgr.lookup(&a).is_none());
        assert!(mgr.lookup(&b).is_none());
        assert!(mgr.is_tombstoned(&sub_a));
    }
}
