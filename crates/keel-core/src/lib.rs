//! Domain layer for keel.
//!
//! Holds the project and session models, the repository contract the storage
//! layer implements, the event model of the AI query collaborator and the
//! slash-command grammar used by the interactive front-end.

pub mod command;
pub mod config;
pub mod error;
pub mod project;
pub mod query;
pub mod session;
pub mod time;

pub use error::{KeelError, Result};
