//! Operation listeners and the concurrency-safe listener set.
//!
//! Listeners may be added or removed while an operation runs and while
//! callbacks are in flight. Once `remove` returns, no new callback to the
//! removed listener starts. Called from outside any listener callback,
//! `remove` also waits for an in-flight callback to that listener to finish.
//! Called from inside a callback it does not wait: the caller may itself be
//! awaited by the callback it would wait for, on this or another set.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::mpsc;

use super::results::OperationResults;

/// Observer of an operation's lifecycle.
///
/// For one invocation the order is: `on_started` exactly once, zero or more
/// `on_results`, then `on_completed` exactly once. Callbacks arrive on the
/// operation's worker thread; marshal to any UI context yourself.
pub trait OperationListener<T>: Send + Sync {
    /// Work is about to begin.
    fn on_started(&self) {}

    /// A batch of (possibly partial) results is available.
    fn on_results(&self, results: &OperationResults<T>);

    /// The invocation has terminated.
    fn on_completed(&self) {}
}

/// Handle returned by `add`, used to remove a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Nesting depth of listener callbacks running on this thread.
    static DELIVERY_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct DeliveryScope;

impl DeliveryScope {
    fn enter() -> Self {
        DELIVERY_DEPTH.with(|d| d.set(d.get() + 1));
        Self
    }
}

impl Drop for DeliveryScope {
    fn drop(&mut self) {
        DELIVERY_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

fn inside_callback() -> bool {
    DELIVERY_DEPTH.with(|d| d.get() > 0)
}

struct Entry<T> {
    id: ListenerId,
    listener: Arc<dyn OperationListener<T>>,
    removed: AtomicBool,
    /// Held for the duration of each callback to this listener.
    gate: Mutex<()>,
}

/// Concurrency-safe set of listeners.
pub struct ListenerSet<T> {
    entries: RwLock<Vec<Arc<Entry<T>>>>,
}

impl<T> Default for ListenerSet<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<T> ListenerSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn add(&self, listener: Arc<dyn OperationListener<T>>) -> ListenerId {
        let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        let entry = Arc::new(Entry {
            id,
            listener,
            removed: AtomicBool::new(false),
            gate: Mutex::new(()),
        });
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        id
    }

    /// Unregister a listener. Returns false if it was not registered.
    ///
    /// Outside a callback this waits for an in-flight callback to the
    /// listener. Inside one (removing itself, or another listener) it only
    /// prevents further callbacks.
    pub fn remove(&self, id: ListenerId) -> bool {
        let entry = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let Some(pos) = entries.iter().position(|e| e.id == id) else {
                return false;
            };
            entries.remove(pos)
        };

        entry.removed.store(true, Ordering::SeqCst);
        if !inside_callback() {
            // Wait out a callback that passed the removed check before we set it
            drop(entry.gate.lock().unwrap_or_else(PoisonError::into_inner));
        }
        true
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke `f` on every listener registered at the time of the call,
    /// skipping listeners removed meanwhile.
    pub fn notify(&self, f: impl Fn(&dyn OperationListener<T>)) {
        let snapshot: Vec<Arc<Entry<T>>> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for entry in snapshot {
            let _gate = entry.gate.lock().unwrap_or_else(PoisonError::into_inner);
            if entry.removed.load(Ordering::SeqCst) {
                continue;
            }
            let _scope = DeliveryScope::enter();
            f(entry.listener.as_ref());
        }
    }
}

/// Lifecycle events as plain values, for channel-based observers.
#[derive(Debug, Clone)]
pub enum OperationEvent<T> {
    /// `on_started` was called.
    Started,
    /// `on_results` was called.
    Results(OperationResults<T>),
    /// `on_completed` was called.
    Completed,
}

/// Listener that forwards every callback into an unbounded channel.
pub struct ChannelListener<T> {
    tx: mpsc::UnboundedSender<OperationEvent<T>>,
}

impl<T> ChannelListener<T> {
    /// Create a listener and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OperationEvent<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl<T: Clone + Send + Sync> OperationListener<T> for ChannelListener<T> {
    fn on_started(&self) {
        let _ = self.tx.send(OperationEvent::Started);
    }

    fn on_results(&self, results: &OperationResults<T>) {
        let _ = self.tx.send(OperationEvent::Results(results.clone()));
    }

    fn on_completed(&self) {
        let _ = self.tx.send(OperationEvent::Completed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct Counter {
        results: AtomicUsize,
    }

    impl OperationListener<u32> for Counter {
        fn on_results(&self, _results: &OperationResults<u32>) {
            self.results.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_add_notify_remove() {
        let set = ListenerSet::new();
        let counter = Arc::new(Counter::default());
        let id = set.add(counter.clone());
        assert_eq!(set.len(), 1);

        set.notify(|l| l.on_results(&OperationResults::ok(1)));
        assert_eq!(counter.results.load(Ordering::SeqCst), 1);

        assert!(set.remove(id));
        assert!(!set.remove(id));
        assert!(set.is_empty());

        set.notify(|l| l.on_results(&OperationResults::ok(2)));
        assert_eq!(counter.results.load(Ordering::SeqCst), 1);
    }

    /// Removes itself from the set on its first callback.
    struct SelfRemoving {
        set: Arc<ListenerSet<u32>>,
        id: Mutex<Option<ListenerId>>,
        calls: AtomicUsize,
    }

    impl OperationListener<u32> for SelfRemoving {
        fn on_results(&self, _results: &OperationResults<u32>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = self.id.lock().unwrap().take() {
                assert!(self.set.remove(id));
            }
        }
    }

    #[test]
    fn test_listener_can_remove_itself_without_deadlock() {
        let set = Arc::new(ListenerSet::new());
        let listener = Arc::new(SelfRemoving {
            set: Arc::clone(&set),
            id: Mutex::new(None),
            calls: AtomicUsize::new(0),
        });
        let id = set.add(listener.clone());
        *listener.id.lock().unwrap() = Some(id);

        set.notify(|l| l.on_results(&OperationResults::ok(1)));
        set.notify(|l| l.on_results(&OperationResults::ok(2)));

        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_remove_during_delivery_skips_later_listener() {
        struct RemoveOther {
            set: Arc<ListenerSet<u32>>,
            other: Mutex<Option<ListenerId>>,
        }

        impl OperationListener<u32> for RemoveOther {
            fn on_results(&self, _results: &OperationResults<u32>) {
                if let Some(id) = self.other.lock().unwrap().take() {
                    self.set.remove(id);
                }
            }
        }

        let set = Arc::new(ListenerSet::new());
        let remover = Arc::new(RemoveOther {
            set: Arc::clone(&set),
            other: Mutex::new(None),
        });
        set.add(remover.clone());
        let counter = Arc::new(Counter::default());
        let counter_id = set.add(counter.clone());
        *remover.other.lock().unwrap() = Some(counter_id);

        set.notify(|l| l.on_results(&OperationResults::ok(1)));

        // Removed before its turn in the snapshot, so never called
        assert_eq!(counter.results.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_add_remove_while_notifying() {
        let set = Arc::new(ListenerSet::<u32>::new());
        let counter = Arc::new(Counter::default());

        let notifier = {
            let set = Arc::clone(&set);
            std::thread::spawn(move || {
                for i in 0..500 {
                    set.notify(|l| l.on_results(&OperationResults::ok(i)));
                }
            })
        };

        for _ in 0..200 {
            let id = set.add(counter.clone());
            assert!(set.remove(id));
        }
        notifier.join().unwrap();
        assert!(set.is_empty());
    }

    /// On the results batch carrying `trigger`, meets its peer at the barrier
    /// and then removes `other`.
    struct MutualRemover {
        set: Arc<ListenerSet<u32>>,
        trigger: u32,
        other: Mutex<Option<ListenerId>>,
        barrier: Arc<std::sync::Barrier>,
        entered: Mutex<Option<std::sync::mpsc::Sender<()>>>,
    }

    impl OperationListener<u32> for MutualRemover {
        fn on_results(&self, results: &OperationResults<u32>) {
            if results.payload() != Some(&self.trigger) {
                return;
            }
            if let Some(tx) = self.entered.lock().unwrap().take() {
                tx.send(()).unwrap();
            }
            self.barrier.wait();
            if let Some(id) = self.other.lock().unwrap().take() {
                self.set.remove(id);
            }
        }
    }

    #[test]
    fn test_mutual_removal_from_concurrent_callbacks_does_not_deadlock() {
        let set = Arc::new(ListenerSet::<u32>::new());
        let barrier = Arc::new(std::sync::Barrier::new(2));
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let make = |trigger, entered| {
            Arc::new(MutualRemover {
                set: Arc::clone(&set),
                trigger,
                other: Mutex::new(None),
                barrier: Arc::clone(&barrier),
                entered: Mutex::new(entered),
            })
        };
        let a = make(1, None);
        let b = make(2, Some(entered_tx));
        let a_id = set.add(a.clone());
        let b_id = set.add(b.clone());
        *a.other.lock().unwrap() = Some(b_id);
        *b.other.lock().unwrap() = Some(a_id);

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let spawn_notify = |payload: u32| {
            let set = Arc::clone(&set);
            let done = done_tx.clone();
            std::thread::spawn(move || {
                set.notify(|l| l.on_results(&OperationResults::ok(payload)));
                done.send(payload).unwrap();
            })
        };

        // B's callback is in flight on one thread before A's starts on another
        let second = spawn_notify(2);
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let first = spawn_notify(1);

        for _ in 0..2 {
            done_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("mutual removal should not deadlock");
        }
        first.join().unwrap();
        second.join().unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_channel_listener_forwards_events() {
        let (listener, mut rx) = ChannelListener::<u32>::new();
        listener.on_started();
        listener.on_results(&OperationResults::ok(7));
        listener.on_completed();

        assert!(matches!(rx.recv().await, Some(OperationEvent::Started)));
        match rx.recv().await {
            Some(OperationEvent::Results(r)) => assert_eq!(r.payload(), Some(&7)),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(OperationEvent::Completed)));
    }
}
