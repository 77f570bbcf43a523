pub mod model;
pub mod repository;

pub use model::Project;
pub use repository::{LoadOutcome, ProjectRepository};
