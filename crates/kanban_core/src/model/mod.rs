//! Board domain model: entities, DTOs and operation outcomes.
//!
//! # Responsibility
//! - Define the records exchanged between repositories and their callers.
//! - Own pure rules that need no storage (lifecycle table, field validation).
//!
//! # Invariants
//! - Ids are store-assigned integers and never reused.
//! - Expected failures are `Response` values, not errors.

pub mod response;
pub mod tag;
pub mod user;
pub mod validation;
pub mod work_item;
