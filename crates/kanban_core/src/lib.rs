//! Core data access for the Kanban board.
//! This crate is the single source of truth for board invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::response::Response;
pub use model::tag::{TagCreateDto, TagDeleteRequest, TagDto, TagId, TagUpdateDto};
pub use model::user::{UserCreateDto, UserDto, UserId, UserUpdateDto};
pub use model::validation::ValidationError;
pub use model::work_item::{
    DeleteAction, State, WorkItemCreateDto, WorkItemDetailsDto, WorkItemDto, WorkItemId,
    WorkItemUpdateDto,
};
pub use repo::tag_repo::{SqliteTagRepository, TagRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::work_item_repo::{SqliteWorkItemRepository, WorkItemRepository};
pub use repo::{RepoError, RepoResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
