use std::fmt::Debug;

use tokio::sync::{mpsc, watch};

use crate::{Actor, ActorDeadError};

/// A message that an actor can handle.
///
/// Handlers run one at a time on the actor's task with exclusive access to
/// its state. They must not block; long-running work is spawned and reports
/// back with another message.
pub trait Message<S>: Send + Debug + 'static {
    /// Handles the message with mutable access to the actor's state.
    fn handle(self, state: &mut S, handle: &Actor<S>);
}

/// Object-safe form of [`Message`] used inside the mailbox.
pub(crate) trait Envelope<S>: Send + Debug {
    fn open(self: Box<Self>, state: &mut S, handle: &Actor<S>);
}

impl<S, M: Message<S>> Envelope<S> for M {
    #[inline]
    fn open(self: Box<Self>, state: &mut S, handle: &Actor<S>) {
        (*self).handle(state, handle)
    }
}

pub(crate) type Letter<S> = Box<dyn Envelope<S>>;

pub(crate) struct MailboxParts<S> {
    pub mailbox: Mailbox<S>,
    pub letter_rx: mpsc::UnboundedReceiver<Letter<S>>,
    pub kill_rx: watch::Receiver<bool>,
}

pub(crate) struct Mailbox<S> {
    letter_tx: mpsc::UnboundedSender<Letter<S>>,
    kill_tx: watch::Sender<bool>,
}

impl<S: Send + 'static> Mailbox<S> {
    #[inline]
    pub fn new() -> MailboxParts<S> {
        let (letter_tx, letter_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = watch::channel(false);
        MailboxParts {
            mailbox: Mailbox { letter_tx, kill_tx },
            letter_rx,
            kill_rx,
        }
    }

    #[inline]
    pub fn post(&self, letter: Letter<S>) -> Result<(), ActorDeadError> {
        if self.is_killed() {
            return Err(ActorDeadError);
        }
        self.letter_tx.send(letter).map_err(|_| ActorDeadError)
    }

    #[inline]
    pub fn kill(&self) {
        self.kill_tx.send_replace(true);
    }

    #[inline]
    pub fn is_killed(&self) -> bool {
        *self.kill_tx.borrow()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.letter_tx.is_closed()
    }

    /// Returns a receiver that observes the kill switch.
    #[inline]
    pub fn watch_kill(&self) -> watch::Receiver<bool> {
        self.kill_tx.subscribe()
    }
}
