//! Tag repository contract and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `tags`.
//! - Guard deletion of tags still linked through `work_item_tags`.
//!
//! # Invariants
//! - Tag names are unique; `create` checks first, the store enforces last.
//! - A linked tag is only deleted with `force`, and its links go with it.
//! - `read` is ordered by id, so listing is insertion stable.

use super::schema_guard::{ensure_connection_ready, TAGS, WORK_ITEM_TAGS};
use super::{log_outcome, log_rejected, RepoResult};
use crate::model::response::Response;
use crate::model::tag::{TagCreateDto, TagDeleteRequest, TagDto, TagId, TagUpdateDto};
use crate::model::validation::validate_tag_name;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

/// Repository interface for tag operations.
pub trait TagRepository {
    /// Inserts one tag. The id is `Some` only when the outcome is `Created`.
    fn create(&mut self, tag: &TagCreateDto) -> RepoResult<(Response, Option<TagId>)>;
    /// Lists all tags ordered by id.
    fn read(&self) -> RepoResult<Vec<TagDto>>;
    /// Loads one tag by id.
    fn find(&self, id: TagId) -> RepoResult<Option<TagDto>>;
    /// Renames one tag.
    fn update(&mut self, tag: &TagUpdateDto) -> RepoResult<Response>;
    /// Deletes one tag, refusing linked tags unless `force` is set.
    fn delete(&mut self, request: TagDeleteRequest) -> RepoResult<Response>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[TAGS, WORK_ITEM_TAGS])?;
        Ok(Self { conn })
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn create(&mut self, tag: &TagCreateDto) -> RepoResult<(Response, Option<TagId>)> {
        if let Err(err) = validate_tag_name(&tag.name) {
            log_rejected("tag_create", None, &err);
            return Ok((Response::BadRequest, None));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if tag_id_by_name(&tx, &tag.name)?.is_some() {
            log_outcome("tag_create", None, Response::Conflict);
            return Ok((Response::Conflict, None));
        }

        tx.execute("INSERT INTO tags (name) VALUES (?1);", [tag.name.as_str()])?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        log_outcome("tag_create", Some(id), Response::Created);
        Ok((Response::Created, Some(id)))
    }

    fn read(&self) -> RepoResult<Vec<TagDto>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(TagDto {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(tags)
    }

    fn find(&self, id: TagId) -> RepoResult<Option<TagDto>> {
        let tag = self
            .conn
            .query_row("SELECT id, name FROM tags WHERE id = ?1;", [id], |row| {
                Ok(TagDto {
                    id: row.get("id")?,
                    name: row.get("name")?,
                })
            })
            .optional()?;
        Ok(tag)
    }

    fn update(&mut self, tag: &TagUpdateDto) -> RepoResult<Response> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !tag_exists(&tx, tag.id)? {
            log_outcome("tag_update", Some(tag.id), Response::NotFound);
            return Ok(Response::NotFound);
        }
        if let Err(err) = validate_tag_name(&tag.name) {
            log_rejected("tag_update", Some(tag.id), &err);
            return Ok(Response::BadRequest);
        }

        // No duplicate pre-check on rename; a clash fails on the UNIQUE index.
        tx.execute(
            "UPDATE tags SET name = ?2 WHERE id = ?1;",
            params![tag.id, tag.name.as_str()],
        )?;
        tx.commit()?;

        log_outcome("tag_update", Some(tag.id), Response::Updated);
        Ok(Response::Updated)
    }

    fn delete(&mut self, request: TagDeleteRequest) -> RepoResult<Response> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !tag_exists(&tx, request.id)? {
            log_outcome("tag_delete", Some(request.id), Response::NotFound);
            return Ok(Response::NotFound);
        }

        let linked_items: i64 = tx.query_row(
            "SELECT COUNT(*) FROM work_item_tags WHERE tag_id = ?1;",
            [request.id],
            |row| row.get(0),
        )?;
        if linked_items > 0 && !request.force {
            log_outcome("tag_delete", Some(request.id), Response::Conflict);
            return Ok(Response::Conflict);
        }

        tx.execute(
            "DELETE FROM work_item_tags WHERE tag_id = ?1;",
            [request.id],
        )?;
        tx.execute("DELETE FROM tags WHERE id = ?1;", [request.id])?;
        tx.commit()?;

        info!(
            "event=tag_delete module=repo status=ok id={} force={} detached_items={}",
            request.id,
            request.force,
            linked_items
        );
        Ok(Response::Deleted)
    }
}

fn tag_id_by_name(conn: &Connection, name: &str) -> RepoResult<Option<TagId>> {
    let id = conn
        .query_row("SELECT id FROM tags WHERE name = ?1;", [name], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(id)
}

fn tag_exists(conn: &Connection, id: TagId) -> RepoResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tags WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists)
}
