//! Operation inputs and results.

use std::sync::Arc;

use crate::error::OperationError;

/// Inputs for operations that take no parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyInputs;

/// The reserved "no inputs" value shared by parameterless operations.
pub const EMPTY_INPUTS: EmptyInputs = EmptyInputs;

/// One batch of results delivered to listeners.
///
/// A result either carries a payload, an error, or neither (a bare
/// cancellation). Results produced after `cancel()` are flagged cancelled;
/// results delivered earlier are never retracted.
#[derive(Debug, Clone)]
pub struct OperationResults<T> {
    payload: Option<T>,
    error: Option<Arc<OperationError>>,
    cancelled: bool,
}

impl<T> OperationResults<T> {
    /// A successful batch.
    pub const fn ok(payload: T) -> Self {
        Self {
            payload: Some(payload),
            error: None,
            cancelled: false,
        }
    }

    /// A failed batch.
    pub fn failed(error: OperationError) -> Self {
        Self::from_shared_error(Arc::new(error))
    }

    /// A failed batch sharing an existing error.
    pub fn from_shared_error(error: Arc<OperationError>) -> Self {
        Self {
            payload: None,
            error: Some(error),
            cancelled: false,
        }
    }

    /// A bare cancellation notice.
    pub const fn cancelled() -> Self {
        Self {
            payload: None,
            error: None,
            cancelled: true,
        }
    }

    /// Set the cancelled flag.
    #[must_use]
    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Whether the batch reports an error.
    pub const fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The error, if any.
    pub fn error(&self) -> Option<&OperationError> {
        self.error.as_deref()
    }

    /// The error as a shared handle, if any.
    pub fn shared_error(&self) -> Option<Arc<OperationError>> {
        self.error.clone()
    }

    /// Whether the batch was produced after cancellation.
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Whether this batch is an authorization failure eligible for retry.
    pub fn is_authorization_failure(&self) -> bool {
        !self.cancelled && self.error().is_some_and(OperationError::is_authorization_failure)
    }

    /// The payload, if any.
    pub const fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Consume the batch, returning its payload.
    pub fn into_payload(self) -> Option<T> {
        self.payload
    }
}
