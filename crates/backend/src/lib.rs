//! An abstraction layer for the chat backend that voices the persona.
//!
//! The game never talks to a language model directly. Instead it posts the
//! visible conversation to a backend, which owns the persona prompt and
//! answers with a single reply. This crate fixes the shape of that exchange
//! so the game can run against the real HTTP service or a scripted stand-in
//! without changing the core.
//!
//! Types in this crate don't define any behavior, they are the constraints
//! that backend implementors should adhere to.

#![deny(missing_docs)]

mod backend;
mod error;
mod request;

pub use backend::*;
pub use error::*;
pub use request::*;
