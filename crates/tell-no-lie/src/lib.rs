//! A terminal front end for the game, where the player tries to make
//! Veritas, who never lies, say that 2 + 2 = 5.
//!
//! The crate includes a CLI tool for playing in the terminal. It can also
//! be used as a library to host the game with the same commands and
//! rendering elsewhere.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod command;
pub mod render;
mod session;
mod settings;

pub use command::{COMMAND_HELP, Command, TRIAL_HINT};
pub use session::{Outcome, Session, SessionBuilder};
pub use settings::{DEFAULT_BASE_URL, Settings, SettingsError};

/// Re-exports of [`tell_no_lie_core`] crate.
pub mod core {
    pub use tell_no_lie_core::*;
}
