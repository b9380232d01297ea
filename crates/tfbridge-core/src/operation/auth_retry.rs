//! One-shot credential refresh and retry around an operation.
//!
//! The coordinator runs the work once. If that attempt reports an
//! authorization failure, the failure is withheld from the caller, fresh
//! credentials are requested and the work runs exactly once more with the
//! same inputs. The caller sees a single lifecycle: one `on_started`, the
//! results of whichever attempt counts, one `on_completed`.
//!
//! First-attempt results are held back until that attempt completes, so
//! partial results published before an authorization failure are discarded
//! along with the failure. Retry results are forwarded as they arrive.
//!
//! Surfaced unchanged:
//!
//! - non-authorization errors and cancelled results from the first attempt;
//! - the original failure when the refresh is declined or itself fails;
//! - everything from the second attempt, including another auth failure.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::listener::OperationListener;
use super::results::OperationResults;
use super::runner::{Operation, OperationWork};
use crate::error::OperationError;
use crate::ports::{CredentialRefresher, RefreshOutcome};

const FIRST_ATTEMPT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    FirstAttempt,
    /// First attempt hit an auth failure; its remaining callbacks are dropped.
    Recovering,
    Retrying,
    Done,
}

struct State<I, O> {
    phase: Phase,
    attempts: u32,
    inputs: Option<I>,
    /// First-attempt results not yet forwarded.
    held: Vec<OperationResults<O>>,
}

struct Shared<W: OperationWork> {
    work: Arc<W>,
    refresher: Arc<dyn CredentialRefresher>,
    listener: Arc<dyn OperationListener<W::Output>>,
    token: CancellationToken,
    state: Mutex<State<W::Inputs, W::Output>>,
}

impl<W: OperationWork> Shared<W> {
    fn state(&self) -> MutexGuard<'_, State<W::Inputs, W::Output>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `on_completed` to the caller at most once.
    fn complete(&self) {
        {
            let mut state = self.state();
            if state.phase == Phase::Done {
                return;
            }
            state.phase = Phase::Done;
            state.inputs = None;
            state.held.clear();
        }
        self.listener.on_completed();
    }

    fn finish_with(&self, results: &OperationResults<W::Output>) {
        self.listener.on_results(results);
        self.complete();
    }
}

/// Runs an operation with a single automatic retry after re-authentication.
pub struct AuthRetryCoordinator<W: OperationWork>
where
    W::Inputs: Clone,
    W::Output: Clone,
{
    shared: Arc<Shared<W>>,
}

impl<W: OperationWork> AuthRetryCoordinator<W>
where
    W::Inputs: Clone,
    W::Output: Clone,
{
    /// Create a coordinator reporting to `listener`.
    pub fn new(
        work: Arc<W>,
        refresher: Arc<dyn CredentialRefresher>,
        listener: Arc<dyn OperationListener<W::Output>>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                work,
                refresher,
                listener,
                token: CancellationToken::new(),
                state: Mutex::new(State {
                    phase: Phase::Idle,
                    attempts: 0,
                    inputs: None,
                    held: Vec::new(),
                }),
            }),
        }
    }

    /// Start the first attempt on the current runtime.
    ///
    /// # Errors
    ///
    /// [`OperationError::AlreadyStarted`] on a second call, or whatever
    /// [`Operation::do_work_async`] reports for the first attempt.
    pub fn start(&self, inputs: W::Inputs) -> Result<(), OperationError> {
        {
            let mut state = self.shared.state();
            if state.phase != Phase::Idle {
                return Err(OperationError::AlreadyStarted);
            }
            state.phase = Phase::FirstAttempt;
            state.inputs = Some(inputs.clone());
        }

        if let Err(e) = launch(&self.shared, FIRST_ATTEMPT, inputs) {
            let mut state = self.shared.state();
            state.phase = Phase::Idle;
            state.inputs = None;
            state.held.clear();
            return Err(e);
        }
        Ok(())
    }

    /// Cancel the current attempt and any pending retry. Idempotent.
    pub fn cancel(&self) {
        self.shared.token.cancel();
    }

    /// Whether `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    /// Number of attempts launched so far (0, 1 or 2).
    pub fn attempts(&self) -> u32 {
        self.shared.state().attempts
    }
}

fn launch<W: OperationWork>(
    shared: &Arc<Shared<W>>,
    attempt: u32,
    inputs: W::Inputs,
) -> Result<(), OperationError>
where
    W::Inputs: Clone,
    W::Output: Clone,
{
    let op = Operation::from_shared_with_token(Arc::clone(&shared.work), shared.token.child_token());
    op.add_listener(Arc::new(AttemptListener {
        shared: Arc::clone(shared),
        attempt,
    }));
    let previous = std::mem::replace(&mut shared.state().attempts, attempt);
    if let Err(e) = op.do_work_async(inputs) {
        shared.state().attempts = previous;
        return Err(e);
    }
    debug!(operation = %op.id(), name = op.name(), attempt, "attempt launched");
    Ok(())
}

/// Filters one attempt's callbacks before they reach the caller.
struct AttemptListener<W: OperationWork>
where
    W::Inputs: Clone,
    W::Output: Clone,
{
    shared: Arc<Shared<W>>,
    attempt: u32,
}

impl<W: OperationWork> AttemptListener<W>
where
    W::Inputs: Clone,
    W::Output: Clone,
{
    /// A first-attempt callback arriving after recovery began.
    fn superseded(&self, phase: Phase) -> bool {
        self.attempt == FIRST_ATTEMPT && phase != Phase::FirstAttempt
    }
}

impl<W: OperationWork> OperationListener<W::Output> for AttemptListener<W>
where
    W::Inputs: Clone,
    W::Output: Clone,
{
    fn on_started(&self) {
        if self.attempt == FIRST_ATTEMPT {
            self.shared.listener.on_started();
        }
    }

    fn on_results(&self, results: &OperationResults<W::Output>) {
        if self.attempt != FIRST_ATTEMPT {
            self.shared.listener.on_results(results);
            return;
        }

        let error = {
            let mut state = self.shared.state();
            if self.superseded(state.phase) {
                return;
            }
            match results.shared_error() {
                Some(error) if results.is_authorization_failure() && !self.shared.token.is_cancelled() => {
                    state.phase = Phase::Recovering;
                    let dropped = std::mem::take(&mut state.held).len();
                    if dropped > 0 {
                        debug!(dropped, "discarding results of the failed attempt");
                    }
                    error
                }
                _ => {
                    state.held.push(results.clone());
                    return;
                }
            }
        };

        info!(error = %error, "authorization failed, requesting fresh credentials");
        tokio::spawn(recover(Arc::clone(&self.shared), error));
    }

    fn on_completed(&self) {
        let held = {
            let mut state = self.shared.state();
            if self.superseded(state.phase) {
                return;
            }
            std::mem::take(&mut state.held)
        };
        for results in &held {
            self.shared.listener.on_results(results);
        }
        self.shared.complete();
    }
}

async fn recover<W: OperationWork>(shared: Arc<Shared<W>>, error: Arc<OperationError>)
where
    W::Inputs: Clone,
    W::Output: Clone,
{
    let outcome = tokio::select! {
        biased;
        () = shared.token.cancelled() => None,
        outcome = shared.refresher.refresh(&error) => Some(outcome),
    };

    let outcome = match outcome {
        Some(outcome) if !shared.token.is_cancelled() => outcome,
        _ => {
            debug!("retry cancelled during credential refresh");
            shared.finish_with(&OperationResults::cancelled());
            return;
        }
    };

    match outcome {
        Ok(RefreshOutcome::Refreshed(auth)) => {
            let inputs = {
                let mut state = shared.state();
                state.phase = Phase::Retrying;
                state.inputs.clone()
            };
            let Some(inputs) = inputs else {
                shared.finish_with(&OperationResults::from_shared_error(error));
                return;
            };
            info!(user = %auth.user_name, server = %auth.server_uri, "credentials refreshed, retrying");
            if let Err(e) = launch(&shared, FIRST_ATTEMPT + 1, inputs) {
                warn!(error = %e, "failed to launch retry");
                shared.finish_with(&OperationResults::failed(e));
            }
        }
        Ok(RefreshOutcome::Declined) => {
            info!("credential refresh declined");
            shared.finish_with(&OperationResults::from_shared_error(error));
        }
        Err(e) => {
            warn!(error = %e, "credential refresh failed");
            shared.finish_with(&OperationResults::from_shared_error(error));
        }
    }
}
