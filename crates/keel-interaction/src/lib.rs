//! Adapters for the AI query collaborator.
//!
//! [`ClaudeCodeService`] drives the `claude` CLI in print mode and turns its
//! `stream-json` output into [`keel_core::query::QueryEvent`]s.

pub mod claude_code;
pub mod stream;

pub use claude_code::ClaudeCodeService;
