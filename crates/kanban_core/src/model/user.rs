//! User records.

use serde::{Deserialize, Serialize};

/// Store-assigned user identifier.
pub type UserId = i64;

/// User projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreateDto {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdateDto {
    pub id: UserId,
    pub name: String,
    pub email: String,
}
