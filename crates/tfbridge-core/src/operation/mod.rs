//! Cancellable, observable background operations.

mod auth_retry;
mod listener;
mod results;
mod runner;

pub use auth_retry::AuthRetryCoordinator;
pub use listener::{ChannelListener, ListenerId, ListenerSet, OperationEvent, OperationListener};
pub use results::{EMPTY_INPUTS, EmptyInputs, OperationResults};
pub use runner::{Operation, OperationWork, ResultSink};
