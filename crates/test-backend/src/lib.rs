//! A local scripted backend for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::pending;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tell_no_lie_backend::{BackendError, ChatBackend, ChatRequest, ErrorKind};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {}

impl BackendError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<PresetReply>,
    requests: Vec<ChatRequest>,
    delay: Option<Duration>,
}

/// A local scripted backend for testing purpose.
///
/// Replies are handed out in the order they were added, one per request,
/// regardless of what the request contains. When the script runs dry, the
/// backend behaves as if it were unreachable. Every request is recorded so
/// tests can inspect the payloads the game produced.
///
/// Clones share the same script, so a test can keep one clone for setup
/// and inspection while the game owns another.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestBackend {
    script: Arc<Mutex<Script>>,
}

impl TestBackend {
    /// Queues a successful reply.
    #[inline]
    pub fn add_reply<S: Into<String>>(&self, text: S) {
        self.add_preset(PresetReply::reply(text));
    }

    /// Queues an arbitrary preset.
    #[inline]
    pub fn add_preset(&self, preset: PresetReply) {
        self.lock().replies.push_back(preset);
    }

    /// Makes every answer arrive after `duration`.
    #[inline]
    pub fn set_delay(&self, duration: Duration) {
        self.lock().delay = Some(duration);
    }

    /// Returns the requests received so far, oldest first.
    #[inline]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.lock().requests.clone()
    }

    /// Returns how many queued replies have not been consumed.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.lock().replies.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for TestBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let script = self.lock();
        f.debug_struct("TestBackend")
            .field("replies", &script.replies)
            .field("requests", &script.requests.len())
            .field("delay", &script.delay)
            .finish()
    }
}

impl ChatBackend for TestBackend {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let (preset, delay) = {
            let mut script = self.lock();
            script.requests.push(req.clone());
            (script.replies.pop_front(), script.delay)
        };

        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            match preset {
                Some(PresetReply::Reply(text)) => Ok(text),
                Some(PresetReply::Unreachable) => Err(Error {
                    message: "scripted failure",
                    kind: ErrorKind::Unreachable,
                }),
                Some(PresetReply::Malformed) => Err(Error {
                    message: "scripted garbage",
                    kind: ErrorKind::Malformed,
                }),
                Some(PresetReply::Hang) => pending().await,
                None => Err(Error {
                    message: "no more scripted replies",
                    kind: ErrorKind::Unreachable,
                }),
            }
        }
    }
}
