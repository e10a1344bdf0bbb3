//! Synchronous fan-out of document snapshots.
//!
//! Every committed mutation produces exactly one broadcast. Each callback is
//! invoked in isolation: an `Err` or a panic from one subscriber is logged
//! and never reaches the other subscribers or the caller of the mutation.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::element::WhiteboardData;

/// Callback invoked with a fresh snapshot after every committed change.
pub type UpdateCallback = Box<dyn Fn(&WhiteboardData) -> Result<()> + Send + Sync>;

struct Subscriber {
    id: u64,
    active: AtomicBool,
    callback: UpdateCallback,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Arc<Subscriber>>>,
}

impl Registry {
    fn remove(&self, id: u64) -> bool {
        let mut subscribers = self.subscribers.lock();
        let Some(pos) = subscribers.iter().position(|s| s.id == id) else {
            return false;
        };
        let subscriber = subscribers.remove(pos);
        subscriber.active.store(false, Ordering::SeqCst);
        true
    }
}

// ---------------------------------------------------------------------------
// UpdateNotifier
// ---------------------------------------------------------------------------

/// Registry of update callbacks. Cloning yields another handle to the same
/// registry.
#[derive(Clone, Default)]
pub struct UpdateNotifier {
    registry: Arc<Registry>,
}

impl UpdateNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` and returns the handle that detaches it.
    ///
    /// Dropping the returned [`Subscription`] does not unsubscribe; call
    /// [`Subscription::unsubscribe`] or use [`subscribe_scoped`](Self::subscribe_scoped).
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&WhiteboardData) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::SeqCst);
        let subscriber = Arc::new(Subscriber {
            id,
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        });
        self.registry.subscribers.lock().push(subscriber);
        debug!("Registered update subscriber {id}");
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Like [`subscribe`](Self::subscribe), but the callback is detached when
    /// the returned guard is dropped.
    pub fn subscribe_scoped<F>(&self, callback: F) -> SubscriptionGuard
    where
        F: Fn(&WhiteboardData) -> Result<()> + Send + Sync + 'static,
    {
        SubscriptionGuard {
            subscription: Some(self.subscribe(callback)),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.subscribers.lock().len()
    }

    /// Delivers `snapshot` to every subscriber registered when the broadcast
    /// starts. Returns how many callbacks completed successfully.
    ///
    /// The registry lock is released before any callback runs, so callbacks
    /// may unsubscribe themselves or each other. A subscriber detached
    /// mid-broadcast is skipped if its turn has not come yet; every other
    /// subscriber still receives the snapshot exactly once.
    pub fn notify(&self, snapshot: &WhiteboardData) -> usize {
        let targets: Vec<Arc<Subscriber>> = self.registry.subscribers.lock().clone();
        let mut delivered = 0;

        for subscriber in targets {
            if !subscriber.active.load(Ordering::SeqCst) {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (subscriber.callback)(snapshot)));
            match outcome {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!("Update subscriber {} failed: {e:#}", subscriber.id);
                }
                Err(payload) => {
                    error!(
                        "Update subscriber {} panicked: {}",
                        subscriber.id,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        delivered
    }
}

impl std::fmt::Debug for UpdateNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

// ---------------------------------------------------------------------------
// Subscription handles
// ---------------------------------------------------------------------------

/// Handle returned by [`UpdateNotifier::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Detaches the callback. Returns `false` if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => {
                let removed = registry.remove(self.id);
                if removed {
                    debug!("Removed update subscriber {}", self.id);
                }
                removed
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|r| r.subscribers.lock().iter().any(|s| s.id == self.id))
    }
}

/// Unsubscribes on drop.
#[derive(Debug)]
pub struct SubscriptionGuard {
    subscription: Option<Subscription>,
}

impl SubscriptionGuard {
    pub fn id(&self) -> Option<u64> {
        self.subscription.as_ref().map(Subscription::id)
    }

    /// Keeps the callback registered after the guard is dropped.
    pub fn detach(mut self) -> Subscription {
        // Only `None` after drop, which cannot have happened yet.
        self.subscription.take().unwrap_or(Subscription {
            id: u64::MAX,
            registry: Weak::new(),
        })
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, StickyColor};
    use std::sync::atomic::AtomicUsize;

    fn doc() -> WhiteboardData {
        WhiteboardData::new(vec![
            Element::sticky(0.0, 0.0, "n", StickyColor::Green).with_id("n1"),
        ])
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&WhiteboardData) -> Result<()> + Send + Sync) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move |_: &WhiteboardData| -> Result<()> {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn every_subscriber_receives_each_broadcast() {
        let notifier = UpdateNotifier::new();
        let (a, cb_a) = counter();
        let (b, cb_b) = counter();
        let _sa = notifier.subscribe(cb_a);
        let _sb = notifier.subscribe(cb_b);

        assert_eq!(notifier.notify(&doc()), 2);
        assert_eq!(notifier.notify(&doc()), 2);
        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn callbacks_see_the_snapshot() {
        let notifier = UpdateNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = notifier.subscribe(move |data| {
            s.lock().push(data.len());
            Ok(())
        });
        notifier.notify(&doc());
        notifier.notify(&WhiteboardData::default());
        assert_eq!(*seen.lock(), vec![1, 0]);
    }

    #[test]
    fn failing_callback_does_not_block_others() {
        let notifier = UpdateNotifier::new();
        let _bad = notifier.subscribe(|_| anyhow::bail!("transport closed"));
        let (good, cb) = counter();
        let _good = notifier.subscribe(cb);

        assert_eq!(notifier.notify(&doc()), 1);
        assert_eq!(good.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_callback_is_isolated() {
        let notifier = UpdateNotifier::new();
        let (before, cb_before) = counter();
        let _a = notifier.subscribe(cb_before);
        let _boom = notifier.subscribe(|_| panic!("viewer crashed"));
        let (after, cb_after) = counter();
        let _b = notifier.subscribe(cb_after);

        assert_eq!(notifier.notify(&doc()), 2);
        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let notifier = UpdateNotifier::new();
        let (count, cb) = counter();
        let sub = notifier.subscribe(cb);
        notifier.notify(&doc());
        assert!(sub.is_active());
        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        assert!(!sub.is_active());
        notifier.notify(&doc());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribing_another_mid_broadcast_skips_only_that_one() {
        let notifier = UpdateNotifier::new();
        let victim_handle: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let handle = Arc::clone(&victim_handle);
        let (first, _) = counter();
        let f = Arc::clone(&first);
        let _killer = notifier.subscribe(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = handle.lock().take() {
                sub.unsubscribe();
            }
            Ok(())
        });
        let (victim, cb_victim) = counter();
        *victim_handle.lock() = Some(notifier.subscribe(cb_victim));
        let (last, cb_last) = counter();
        let _last = notifier.subscribe(cb_last);

        notifier.notify(&doc());
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(victim.load(Ordering::SeqCst), 0);
        assert_eq!(last.load(Ordering::SeqCst), 1);

        notifier.notify(&doc());
        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(victim.load(Ordering::SeqCst), 0);
        assert_eq!(last.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn self_unsubscribe_mid_broadcast_delivers_to_rest_once() {
        let notifier = UpdateNotifier::new();
        let own: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let (once, _) = counter();

        let handle = Arc::clone(&own);
        let o = Arc::clone(&once);
        *own.lock() = Some(notifier.subscribe(move |_| {
            o.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = handle.lock().take() {
                sub.unsubscribe();
            }
            Ok(())
        }));
        let (other, cb_other) = counter();
        let _other = notifier.subscribe(cb_other);

        notifier.notify(&doc());
        notifier.notify(&doc());
        assert_eq!(once.load(Ordering::SeqCst), 1);
        assert_eq!(other.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn scoped_subscription_detaches_on_drop() {
        let notifier = UpdateNotifier::new();
        let (count, cb) = counter();
        {
            let guard = notifier.subscribe_scoped(cb);
            assert!(guard.id().is_some());
            notifier.notify(&doc());
        }
        notifier.notify(&doc());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn detached_guard_keeps_callback() {
        let notifier = UpdateNotifier::new();
        let (count, cb) = counter();
        let sub = notifier.subscribe_scoped(cb).detach();
        notifier.notify(&doc());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(sub.unsubscribe());
    }

    #[test]
    fn handle_outliving_notifier_is_inert() {
        let notifier = UpdateNotifier::new();
        let sub = notifier.subscribe(|_| Ok(()));
        drop(notifier);
        assert!(!sub.unsubscribe());
        assert!(!sub.is_active());
    }
}
