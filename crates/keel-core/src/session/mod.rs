//! Session domain module.
//!
//! A session is one saved conversation transcript. Sessions are owned by a
//! project and never change once appended to it.

mod message;
mod model;

pub use message::{ChatMessage, MessageRole};
pub use model::SessionRecord;
