//! Tag records.

use serde::{Deserialize, Serialize};

/// Store-assigned tag identifier.
pub type TagId = i64;

/// Lightweight tag projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDto {
    pub id: TagId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCreateDto {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUpdateDto {
    pub id: TagId,
    pub name: String,
}

/// Delete request for one tag.
///
/// `force` defaults to `false`: a tag still linked to work items is kept and
/// the delete reports `Conflict`. With `force`, the links are dropped first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagDeleteRequest {
    pub id: TagId,
    #[serde(default)]
    pub force: bool,
}

impl TagDeleteRequest {
    /// Plain delete that refuses linked tags.
    pub fn new(id: TagId) -> Self {
        Self { id, force: false }
    }

    /// Delete that detaches the tag from every work item.
    pub fn forced(id: TagId) -> Self {
        Self { id, force: true }
    }
}
