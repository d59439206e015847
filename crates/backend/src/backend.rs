use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ChatRequest;

/// The error type for a chat backend.
pub trait BackendError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a chat backend, the remote collaborator that
/// answers as the persona.
///
/// Once the backend is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the backend should be prepared for being dropped anytime.
pub trait ChatBackend: Send + Sync {
    /// The error type that may be returned by the backend.
    type Error: BackendError;

    /// Sends the conversation and resolves to the persona's reply text.
    ///
    /// The returned future must not borrow `self`, so callers can move it
    /// into a spawned task.
    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static;
}
