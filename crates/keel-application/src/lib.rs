pub mod conversation;
pub mod registry;

pub use conversation::ConversationRecorder;
pub use registry::{ProjectRegistry, temporary_project_name};
