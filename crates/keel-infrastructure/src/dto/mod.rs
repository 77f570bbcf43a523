//! Persistence DTOs for the project document.
//!
//! Field names here are the on-disk wire contract and must stay compatible
//! with documents written by earlier tools.

mod project;

pub use project::{MessageDto, ProjectDocument, ProjectDto, SessionDto};
