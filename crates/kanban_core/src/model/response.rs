//! Outcome of a repository operation.

use serde::{Deserialize, Serialize};

/// Enumerated result returned by every mutating repository operation.
///
/// Expected failures (duplicates, missing ids, forbidden transitions, bad
/// input) are reported here instead of through `RepoError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Response {
    Created,
    Updated,
    Deleted,
    Conflict,
    NotFound,
    BadRequest,
}

impl Response {
    /// Stable lowercase label used in `status=` log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created | Self::Updated | Self::Deleted => "ok",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
        }
    }

    /// Returns whether the operation changed persisted state.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Deleted)
    }
}
