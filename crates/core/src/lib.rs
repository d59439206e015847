//! Core logic of the game: the message store, the chat client, the intro
//! script, the trial, and the [`Game`] controller tying them together.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod chat_client;
mod game;
pub mod message;
pub mod script;
pub mod store;
pub mod trial;

pub use game::{
    CommandError, ContextPolicy, DEFAULT_HINT_LINES, Game, GameBuilder,
    GameEvent, GameSnapshot, Pacing, Stage,
};
