//! Work item model and lifecycle.
//!
//! # Responsibility
//! - Define the work item lifecycle states and their persisted labels.
//! - Decide what a delete request does in each state.
//!
//! # Invariants
//! - `New → Active → {Resolved, Closed, Removed}`.
//! - Resolved, Closed and Removed are terminal for deletion: no further
//!   delete may mutate the item.
//! - `state_updated` changes exactly when `state` changes.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Store-assigned work item identifier.
pub type WorkItemId = i64;

/// Work item lifecycle state.
///
/// Serialized and persisted as the PascalCase variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    New,
    Active,
    Resolved,
    Closed,
    Removed,
}

/// What `delete` does to an item in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAction {
    /// Physically remove the row and its tag links.
    HardDelete,
    /// Keep the row and move it to `State::Removed`.
    SoftDelete,
    /// Leave the item untouched and report a conflict.
    Reject,
}

impl State {
    pub const ALL: [State; 5] = [
        State::New,
        State::Active,
        State::Resolved,
        State::Closed,
        State::Removed,
    ];

    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Active => "Active",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
            Self::Removed => "Removed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_db_str() == value)
    }

    /// Delete policy for an item currently in this state.
    pub fn delete_action(self) -> DeleteAction {
        match self {
            Self::New => DeleteAction::HardDelete,
            Self::Active => DeleteAction::SoftDelete,
            Self::Resolved | Self::Closed | Self::Removed => DeleteAction::Reject,
        }
    }
}

/// List projection of a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemDto {
    pub id: WorkItemId,
    pub title: String,
    pub assigned_to_name: Option<String>,
    /// Tag names, sorted ascending.
    pub tags: Vec<String>,
    pub state: State,
}

/// Detail projection of a work item. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemDetailsDto {
    pub id: WorkItemId,
    pub title: String,
    pub description: Option<String>,
    pub created: i64,
    pub assigned_to_name: Option<String>,
    pub tags: Vec<String>,
    pub state: State,
    pub state_updated: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkItemCreateDto {
    pub title: String,
    pub assigned_to_id: Option<UserId>,
    pub description: Option<String>,
    /// Tag names; names with no matching tag are dropped.
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemUpdateDto {
    pub id: WorkItemId,
    pub title: String,
    /// `None` keeps the current assignee.
    pub assigned_to_id: Option<UserId>,
    /// `None` keeps the current description.
    pub description: Option<String>,
    /// Full replacement of the tag set, resolved by name.
    #[serde(default)]
    pub tags: Vec<String>,
    pub state: State,
}
