use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::select;
use tokio::time::sleep;
use tracing::Instrument;

use crate::mailbox::{Mailbox, MailboxParts};
use crate::runner::run_actor;
use crate::{ActorDeadError, Message};

/// Handle to an actor.
///
/// The actor keeps running as long as at least one `Actor` handle exists
/// and it has not been killed. [`WeakActor`] handles don't count.
pub struct Actor<S> {
    mailbox: Arc<Mailbox<S>>,
}

impl<S: Send + 'static> Actor<S> {
    /// Spawns a new actor with the specified state and a label used in
    /// tracing spans.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(state: S, label: &'static str) -> Self {
        let MailboxParts {
            mailbox,
            letter_rx,
            kill_rx,
        } = Mailbox::new();
        let mailbox = Arc::new(mailbox);
        tokio::spawn(
            run_actor(Arc::downgrade(&mailbox), state, letter_rx, kill_rx)
                .instrument(debug_span!("actor", label)),
        );
        Self { mailbox }
    }

    #[inline]
    pub(crate) fn from_mailbox(mailbox: Arc<Mailbox<S>>) -> Self {
        Self { mailbox }
    }

    /// Sends a message to the actor.
    #[inline]
    pub fn send<M: Message<S>>(&self, msg: M) -> Result<(), ActorDeadError> {
        self.mailbox.post(Box::new(msg))
    }

    /// Sends a message to the actor once `delay` has elapsed.
    ///
    /// The timer holds no strong reference to the actor. If the actor is
    /// killed or dropped before the timer fires, the message is discarded
    /// silently.
    pub fn send_after<M: Message<S>>(&self, delay: Duration, msg: M) {
        let weak = self.downgrade();
        let mut kill_rx = self.mailbox.watch_kill();
        tokio::spawn(
            async move {
                select! {
                    biased;

                    _ = kill_rx.wait_for(|killed| *killed) => {
                        trace!("timer cancelled, dropping {msg:?}");
                        return;
                    }
                    _ = sleep(delay) => {}
                }
                if weak.send(msg).is_err() {
                    trace!("timer fired after the actor stopped");
                }
            }
            .instrument(trace_span!("timer", delay_ms = delay.as_millis())),
        );
    }

    /// Attempts to kill the actor.
    ///
    /// Messages already queued are discarded, pending timers are cancelled,
    /// and the actor's state is dropped shortly after.
    #[inline]
    pub fn try_kill(&self) {
        self.mailbox.kill();
    }

    /// Returns whether the actor still accepts messages.
    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.mailbox.is_killed() && !self.mailbox.is_closed()
    }

    /// Creates a handle that doesn't keep the actor alive.
    #[inline]
    pub fn downgrade(&self) -> WeakActor<S> {
        WeakActor {
            mailbox: Arc::downgrade(&self.mailbox),
        }
    }
}

impl<S> Clone for Actor<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            mailbox: Arc::clone(&self.mailbox),
        }
    }
}

/// A handle that can reach an actor without keeping it alive.
///
/// Background work that reports back to an actor (timers, network calls)
/// should hold one of these, so that tearing the actor down isn't delayed
/// until that work finishes.
pub struct WeakActor<S> {
    mailbox: Weak<Mailbox<S>>,
}

impl<S: Send + 'static> WeakActor<S> {
    /// Upgrades to a strong handle if the actor is still reachable.
    #[inline]
    pub fn upgrade(&self) -> Option<Actor<S>> {
        self.mailbox.upgrade().map(Actor::from_mailbox)
    }

    /// Sends a message if the actor is still reachable.
    #[inline]
    pub fn send<M: Message<S>>(&self, msg: M) -> Result<(), ActorDeadError> {
        match self.upgrade() {
            Some(actor) => actor.send(msg),
            None => Err(ActorDeadError),
        }
    }
}

impl<S> Clone for WeakActor<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            mailbox: Weak::clone(&self.mailbox),
        }
    }
}
