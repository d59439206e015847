//! A lightweight actor for single-threaded, paced state machines.
//!
//! An actor owns its state and handles one message at a time, so the state
//! never needs a lock. Pauses are expressed as delayed messages
//! ([`Actor::send_after`]) instead of sleeping inside a handler, which keeps
//! every step of a scripted sequence an ordinary message and lets tests run
//! the sequence under tokio's paused clock.
//!
//! Killing an actor cancels everything it scheduled: queued messages are
//! discarded and pending timers exit without firing.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
mod handle;
mod mailbox;
mod runner;

pub use error::ActorDeadError;
pub use handle::{Actor, WeakActor};
pub use mailbox::Message;
