//! Single-shot asynchronous operations.
//!
//! An [`Operation`] wraps a unit of [`OperationWork`], runs it on a tokio
//! task and reports progress to its listeners. Each `Operation` runs at most
//! once; build a new one (it can share the same work) to run again.

use std::any::type_name;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use super::listener::{ChannelListener, ListenerId, ListenerSet, OperationEvent, OperationListener};
use super::results::OperationResults;
use crate::error::OperationError;

/// The body of an operation.
///
/// `execute` publishes zero or more result batches through `sink`. Returning
/// an error delivers one final failed batch to listeners.
#[async_trait]
pub trait OperationWork: Send + Sync + 'static {
    /// Parameters for one invocation.
    type Inputs: Send + Sync + 'static;
    /// Payload of each published batch.
    type Output: Send + Sync + 'static;

    /// Human-readable name used in logs.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Do the work.
    ///
    /// Long-running work should check `sink.is_cancelled()` (or await
    /// `sink.cancelled()`) at convenient points. The future is also dropped
    /// at its next await point once the operation is cancelled.
    async fn execute(
        &self,
        inputs: Self::Inputs,
        sink: &ResultSink<Self::Output>,
    ) -> Result<(), OperationError>;
}

/// Publishing handle passed to [`OperationWork::execute`].
pub struct ResultSink<T> {
    listeners: Arc<ListenerSet<T>>,
    token: CancellationToken,
}

impl<T> ResultSink<T> {
    /// Deliver a successful batch. Flagged cancelled if `cancel()` has been
    /// requested.
    pub fn publish(&self, payload: T) {
        self.publish_results(OperationResults::ok(payload));
    }

    /// Deliver a failed batch without ending the operation.
    pub fn publish_error(&self, error: OperationError) {
        self.publish_results(OperationResults::failed(error));
    }

    /// Deliver an arbitrary batch.
    pub fn publish_results(&self, results: OperationResults<T>) {
        let results = if self.token.is_cancelled() {
            results.with_cancelled(true)
        } else {
            results
        };
        self.listeners.notify(|l| l.on_results(&results));
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

/// A cancellable, observable, single-shot unit of work.
pub struct Operation<W: OperationWork> {
    id: Uuid,
    work: Arc<W>,
    listeners: Arc<ListenerSet<W::Output>>,
    token: CancellationToken,
    started: AtomicBool,
}

impl<W: OperationWork> Operation<W> {
    /// Wrap `work` in a new operation.
    pub fn new(work: W) -> Self {
        Self::from_shared(Arc::new(work))
    }

    /// Wrap shared `work`, so several operations can run the same body.
    pub fn from_shared(work: Arc<W>) -> Self {
        Self::from_shared_with_token(work, CancellationToken::new())
    }

    /// Like [`Operation::from_shared`], cancelled through `token`.
    ///
    /// Pass a child token to cancel a family of operations at once.
    pub fn from_shared_with_token(work: Arc<W>, token: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            work,
            listeners: Arc::new(ListenerSet::new()),
            token,
            started: AtomicBool::new(false),
        }
    }

    /// Unique id of this operation, for logs.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the wrapped work.
    pub fn name(&self) -> &'static str {
        self.work.name()
    }

    /// Register a listener. Safe while the operation runs.
    pub fn add_listener(&self, listener: Arc<dyn OperationListener<W::Output>>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregister a listener. Once this returns, the listener receives no
    /// further callbacks from this operation.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Clone of the cancellation token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Remove `listener` and cancel the operation.
    pub fn terminate(&self, listener: ListenerId) {
        self.remove_listener(listener);
        self.cancel();
    }

    /// Start the work on the current tokio runtime.
    ///
    /// Listeners see `on_started`, then any results, then `on_completed`,
    /// all from the spawned task.
    ///
    /// # Errors
    ///
    /// [`OperationError::AlreadyStarted`] on a second call, or
    /// [`OperationError::Internal`] when no runtime is available.
    pub fn do_work_async(&self, inputs: W::Inputs) -> Result<JoinHandle<()>, OperationError> {
        let handle = Handle::try_current()
            .map_err(|e| OperationError::Internal(format!("no async runtime: {e}")))?;
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(OperationError::AlreadyStarted);
        }

        let id = self.id;
        let work = Arc::clone(&self.work);
        let listeners = Arc::clone(&self.listeners);
        let token = self.token.clone();

        Ok(handle.spawn(async move {
            debug!(operation = %id, name = work.name(), "operation started");
            listeners.notify(|l| l.on_started());

            let sink = ResultSink {
                listeners: Arc::clone(&listeners),
                token: token.clone(),
            };
            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => None,
                result = work.execute(inputs, &sink) => Some(result),
            };

            match outcome {
                None => {
                    debug!(operation = %id, "operation cancelled");
                    listeners.notify(|l| l.on_results(&OperationResults::cancelled()));
                }
                Some(Err(e)) => {
                    debug!(operation = %id, error = %e, "operation failed");
                    let results = OperationResults::failed(e).with_cancelled(token.is_cancelled());
                    listeners.notify(|l| l.on_results(&results));
                }
                Some(Ok(())) => {}
            }

            listeners.notify(|l| l.on_completed());
            debug!(operation = %id, "operation completed");
        }))
    }
}

impl<W> Operation<W>
where
    W: OperationWork,
    W::Output: Clone,
{
    /// Register a channel listener and return its receiver.
    pub fn subscribe(&self) -> (ListenerId, mpsc::UnboundedReceiver<OperationEvent<W::Output>>) {
        let (listener, rx) = ChannelListener::new();
        (self.add_listener(Arc::new(listener)), rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{EMPTY_INPUTS, EmptyInputs};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct CountTo(u32);

    #[async_trait]
    impl OperationWork for CountTo {
        type Inputs = EmptyInputs;
        type Output = u32;

        async fn execute(
            &self,
            _inputs: EmptyInputs,
            sink: &ResultSink<u32>,
        ) -> Result<(), OperationError> {
            for i in 1..=self.0 {
                sink.publish(i);
            }
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl OperationWork for Failing {
        type Inputs = String;
        type Output = ();

        async fn execute(&self, inputs: String, _sink: &ResultSink<()>) -> Result<(), OperationError> {
            Err(OperationError::Invalid(inputs))
        }
    }

    struct Forever;

    #[async_trait]
    impl OperationWork for Forever {
        type Inputs = EmptyInputs;
        type Output = u32;

        async fn execute(
            &self,
            _inputs: EmptyInputs,
            sink: &ResultSink<u32>,
        ) -> Result<(), OperationError> {
            sink.publish(0);
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    async fn collect<T>(mut rx: mpsc::UnboundedReceiver<OperationEvent<T>>) -> Vec<OperationEvent<T>> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            let done = matches!(event, OperationEvent::Completed);
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    #[tokio::test]
    async fn test_lifecycle_order() {
        let op = Operation::new(CountTo(3));
        let (_, rx) = op.subscribe();
        op.do_work_async(EMPTY_INPUTS).unwrap().await.unwrap();

        let events = collect(rx).await;
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], OperationEvent::Started));
        let payloads: Vec<u32> = events[1..4]
            .iter()
            .filter_map(|e| match e {
                OperationEvent::Results(r) => r.payload().copied(),
                _ => None,
            })
            .collect();
        assert_eq!(payloads, vec![1, 2, 3]);
        assert!(matches!(events[4], OperationEvent::Completed));
    }

    #[tokio::test]
    async fn test_error_delivered_as_results() {
        let op = Operation::new(Failing);
        let (_, rx) = op.subscribe();
        op.do_work_async("bad input".to_string()).unwrap().await.unwrap();

        let events = collect(rx).await;
        assert_eq!(events.len(), 3);
        match &events[1] {
            OperationEvent::Results(r) => {
                assert!(matches!(r.error(), Some(OperationError::Invalid(m)) if m == "bad input"));
                assert!(!r.is_cancelled());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let op = Operation::new(CountTo(1));
        let first = op.do_work_async(EMPTY_INPUTS).unwrap();
        assert!(matches!(
            op.do_work_async(EMPTY_INPUTS),
            Err(OperationError::AlreadyStarted)
        ));
        first.await.unwrap();
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let op = Operation::new(CountTo(1));
        assert!(matches!(
            op.do_work_async(EMPTY_INPUTS),
            Err(OperationError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_delivers_cancelled_then_completed() {
        let op = Operation::new(Forever);
        let (_, mut rx) = op.subscribe();
        let handle = op.do_work_async(EMPTY_INPUTS).unwrap();

        assert!(matches!(rx.recv().await, Some(OperationEvent::Started)));
        assert!(matches!(rx.recv().await, Some(OperationEvent::Results(_))));
        op.cancel();
        op.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("cancelled operation should finish")
            .unwrap();

        let rest = collect(rx).await;
        assert_eq!(rest.len(), 2);
        match &rest[0] {
            OperationEvent::Results(r) => assert!(r.is_cancelled() && !r.has_error()),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(rest[1], OperationEvent::Completed));
    }

    #[tokio::test]
    async fn test_cancel_before_start_skips_work() {
        struct Flag(Arc<AtomicBool>);

        #[async_trait]
        impl OperationWork for Flag {
            type Inputs = EmptyInputs;
            type Output = ();

            async fn execute(&self, _: EmptyInputs, _: &ResultSink<()>) -> Result<(), OperationError> {
                self.0.store(true, Ordering::SeqCst);
                Ok(())
            }
        }

        let ran = Arc::new(AtomicBool::new(false));
        let op = Operation::new(Flag(Arc::clone(&ran)));
        op.cancel();
        op.do_work_async(EMPTY_INPUTS).unwrap().await.unwrap();
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_terminate_removes_listener_and_cancels() {
        #[derive(Default)]
        struct Recorder {
            calls: AtomicUsize,
        }

        impl OperationListener<u32> for Recorder {
            fn on_started(&self) {
                self.calls.fetch_add(1, Ordering::SeqCst);
            }
            fn on_results(&self, _results: &OperationResults<u32>) {
                self.calls.fetch_add(1, Ordering::SeqCst);
            }
            fn on_completed(&self) {
                self.calls.fetch_add(1, Ordering::SeqCst);
            }
        }

        let op = Operation::new(Forever);
        let recorder = Arc::new(Recorder::default());
        let id = op.add_listener(recorder.clone());
        let (_, mut rx) = op.subscribe();
        let handle = op.do_work_async(EMPTY_INPUTS).unwrap();

        assert!(matches!(rx.recv().await, Some(OperationEvent::Started)));
        assert!(matches!(rx.recv().await, Some(OperationEvent::Results(_))));
        op.terminate(id);
        let seen = recorder.calls.load(Ordering::SeqCst);
        handle.await.unwrap();

        assert!(op.is_cancelled());
        assert_eq!(recorder.calls.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn test_results_after_cancel_are_flagged() {
        let token = CancellationToken::new();
        let sink = ResultSink {
            listeners: Arc::new(ListenerSet::new()),
            token: token.clone(),
        };
        let (listener, mut events) = ChannelListener::new();
        sink.listeners.add(Arc::new(listener));

        sink.publish(1);
        token.cancel();
        sink.publish(2);

        for (payload, cancelled) in [(1, false), (2, true)] {
            match events.recv().await {
                Some(OperationEvent::Results(r)) => {
                    assert_eq!(r.payload(), Some(&payload));
                    assert_eq!(r.is_cancelled(), cancelled);
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }
}
