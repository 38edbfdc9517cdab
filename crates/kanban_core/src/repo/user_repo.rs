//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - No two users share the same `(name, email)` pair at creation time.
//! - Deleting a user unassigns their work items; the items stay.

use super::schema_guard::{ensure_connection_ready, USERS, WORK_ITEMS};
use super::{log_outcome, log_rejected, RepoResult};
use crate::model::response::Response;
use crate::model::user::{UserCreateDto, UserDto, UserId, UserUpdateDto};
use crate::model::validation::validate_user;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

/// Repository interface for user operations.
pub trait UserRepository {
    /// Inserts one user. The id is `Some` only when the outcome is `Created`.
    fn create(&mut self, user: &UserCreateDto) -> RepoResult<(Response, Option<UserId>)>;
    /// Lists all users ordered by id.
    fn read(&self) -> RepoResult<Vec<UserDto>>;
    fn find(&self, id: UserId) -> RepoResult<Option<UserDto>>;
    /// Overwrites name and email.
    fn update(&mut self, user: &UserUpdateDto) -> RepoResult<Response>;
    fn delete(&mut self, id: UserId) -> RepoResult<Response>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[USERS, WORK_ITEMS])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create(&mut self, user: &UserCreateDto) -> RepoResult<(Response, Option<UserId>)> {
        if let Err(err) = validate_user(&user.name, &user.email) {
            log_rejected("user_create", None, &err);
            return Ok((Response::BadRequest, None));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let duplicate: bool = tx.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM users
                WHERE name = ?1 AND email = ?2
            );",
            params![user.name.as_str(), user.email.as_str()],
            |row| row.get(0),
        )?;
        if duplicate {
            log_outcome("user_create", None, Response::Conflict);
            return Ok((Response::Conflict, None));
        }

        tx.execute(
            "INSERT INTO users (name, email) VALUES (?1, ?2);",
            params![user.name.as_str(), user.email.as_str()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        log_outcome("user_create", Some(id), Response::Created);
        Ok((Response::Created, Some(id)))
    }

    fn read(&self) -> RepoResult<Vec<UserDto>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM users ORDER BY id ASC;")?;
        let users = stmt
            .query_map([], parse_user_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn find(&self, id: UserId) -> RepoResult<Option<UserDto>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email FROM users WHERE id = ?1;",
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn update(&mut self, user: &UserUpdateDto) -> RepoResult<Response> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !user_exists(&tx, user.id)? {
            log_outcome("user_update", Some(user.id), Response::NotFound);
            return Ok(Response::NotFound);
        }
        if let Err(err) = validate_user(&user.name, &user.email) {
            log_rejected("user_update", Some(user.id), &err);
            return Ok(Response::BadRequest);
        }

        tx.execute(
            "UPDATE users SET name = ?2, email = ?3 WHERE id = ?1;",
            params![user.id, user.name.as_str(), user.email.as_str()],
        )?;
        tx.commit()?;

        log_outcome("user_update", Some(user.id), Response::Updated);
        Ok(Response::Updated)
    }

    fn delete(&mut self, id: UserId) -> RepoResult<Response> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !user_exists(&tx, id)? {
            log_outcome("user_delete", Some(id), Response::NotFound);
            return Ok(Response::NotFound);
        }

        let unassigned = tx.execute(
            "UPDATE work_items SET assigned_to_id = NULL WHERE assigned_to_id = ?1;",
            [id],
        )?;
        tx.execute("DELETE FROM users WHERE id = ?1;", [id])?;
        tx.commit()?;

        info!(
            "event=user_delete module=repo status=ok id={} unassigned_items={}",
            id, unassigned
        );
        Ok(Response::Deleted)
    }
}

fn user_exists(conn: &Connection, id: UserId) -> RepoResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<UserDto> {
    Ok(UserDto {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
    })
}
