pub mod config_loader;
pub mod dto;
pub mod json_project_repository;
pub mod paths;
pub mod storage;

pub use crate::config_loader::ConfigLoader;
pub use crate::json_project_repository::JsonProjectRepository;
pub use crate::paths::KeelPaths;
