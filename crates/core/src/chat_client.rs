//! Turning the message store into backend requests.

use std::error::Error;
use std::fmt::{self, Display};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tell_no_lie_backend::{
    BackendError, ChatBackend, ChatMessage, ChatRequest, ErrorKind,
};
use tokio::time::timeout;
use tracing::Instrument;

use crate::message::{Message, Sender};

/// Default time a reply may take before the request counts as failed.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// The reply text, or why it never arrived.
pub type SubmitResult = Result<String, Box<dyn BackendError>>;
/// A request in flight.
pub type SubmitFuture = Pin<Box<dyn Future<Output = SubmitResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ChatRequest) -> SubmitFuture + Send + Sync>;

/// A wrapper around a chat backend that erases its type and bounds every
/// request with a timeout.
#[derive(Clone)]
pub struct ChatClient {
    handler_fn: HandlerFn,
}

impl ChatClient {
    /// Wraps `backend`, failing requests that take longer than
    /// `reply_timeout`.
    pub fn new<B: ChatBackend + 'static>(
        backend: B,
        reply_timeout: Duration,
    ) -> Self {
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let message_count = req.messages.len();
            let fut = backend.send_request(&req);
            Box::pin(
                async move {
                    trace!("sending {message_count} messages");
                    let result: Result<_, Box<dyn BackendError>> =
                        match timeout(reply_timeout, fut).await {
                            Ok(Ok(reply)) => Ok(reply),
                            Ok(Err(err)) => Err(Box::new(err)),
                            Err(_) => {
                                Err(Box::new(TimeoutError(reply_timeout)))
                            }
                        };
                    match &result {
                        Ok(reply) => trace!("got a reply: {reply:?}"),
                        Err(err) => warn!("request failed: {err}"),
                    }
                    result
                }
                .instrument(trace_span!("chat request")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a prepared request. The returned future doesn't borrow the
    /// client, so it can be moved into a task.
    ///
    /// # Cancel safety
    ///
    /// Dropping the future abandons the request.
    #[inline]
    pub fn send_request(&self, req: ChatRequest) -> SubmitFuture {
        (self.handler_fn)(req)
    }

    /// Submits `new_text` with the history in `prior`, and returns the
    /// reply text.
    ///
    /// `prior` may be the whole conversation in creation order; messages
    /// excluded from the context are skipped.
    pub async fn submit<'a>(
        &self,
        new_text: &str,
        prior: impl IntoIterator<Item = &'a Message>,
    ) -> SubmitResult {
        let req = build_request(new_text, prior);
        self.send_request(req).await
    }
}

/// Builds the request for `new_text`.
///
/// The payload is every message of `prior` that is included in the context,
/// in the given order, followed by `new_text` as a user message. Messages
/// typed by the player map to the user role, everything else to the
/// assistant role.
pub fn build_request<'a>(
    new_text: &str,
    prior: impl IntoIterator<Item = &'a Message>,
) -> ChatRequest {
    debug_assert!(!new_text.is_empty(), "submitted text must not be empty");
    let mut messages: Vec<ChatMessage> = prior
        .into_iter()
        .filter(|m| m.include_in_context())
        .map(|m| match m.sender() {
            Sender::User => ChatMessage::user(m.text()),
            Sender::Assistant | Sender::Probe => {
                ChatMessage::assistant(m.text())
            }
        })
        .collect();
    messages.push(ChatMessage::user(new_text));
    ChatRequest { messages }
}

/// The backend did not answer in time.
#[derive(Debug)]
pub struct TimeoutError(Duration);

impl Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: no reply within {} ms",
            ErrorKind::TimedOut,
            self.0.as_millis()
        )
    }
}

impl Error for TimeoutError {}

impl BackendError for TimeoutError {
    #[inline]
    fn kind(&self) -> ErrorKind {
        ErrorKind::TimedOut
    }
}
