//! Work item repository contract and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over `work_items` and their `work_item_tags` links.
//! - Apply the lifecycle delete policy from [`State::delete_action`].
//! - Resolve assignees by id and tags by exact name.
//!
//! # Invariants
//! - Titles are unique; create/update check first, the store enforces last.
//! - Tag names without a matching tag are dropped, never auto-created.
//! - `state_updated_at` is refreshed exactly when `state` changes.
//! - List projections are ordered by `title ASC`; tag names within a
//!   projection are ordered by name.

use super::schema_guard::{ensure_connection_ready, TAGS, USERS, WORK_ITEMS, WORK_ITEM_TAGS};
use super::{log_outcome, log_rejected, RepoError, RepoResult, NOW_EPOCH_MS_SQL};
use crate::model::response::Response;
use crate::model::tag::TagId;
use crate::model::user::UserId;
use crate::model::validation::validate_title;
use crate::model::work_item::{
    DeleteAction, State, WorkItemCreateDto, WorkItemDetailsDto, WorkItemDto, WorkItemId,
    WorkItemUpdateDto,
};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Params, Row, TransactionBehavior};
use std::collections::BTreeSet;

const WORK_ITEM_SELECT_SQL: &str = "SELECT
    w.id,
    w.title,
    w.description,
    w.state,
    w.created_at,
    w.state_updated_at,
    u.name AS assigned_to_name
FROM work_items w
LEFT JOIN users u ON u.id = w.assigned_to_id";

/// Repository interface for work item operations.
pub trait WorkItemRepository {
    /// Inserts one item in state `New`.
    ///
    /// Returns `NotFound` when `assigned_to_id` names no user. The id is
    /// `Some` only when the outcome is `Created`.
    fn create(&mut self, item: &WorkItemCreateDto)
        -> RepoResult<(Response, Option<WorkItemId>)>;
    /// Lists every item.
    fn read(&self) -> RepoResult<Vec<WorkItemDto>>;
    /// Lists items in one lifecycle state.
    fn read_by_state(&self, state: State) -> RepoResult<Vec<WorkItemDto>>;
    /// Lists items linked to the tag with exactly this name.
    fn read_by_tag(&self, tag_name: &str) -> RepoResult<Vec<WorkItemDto>>;
    /// Lists items assigned to one user.
    fn read_by_user(&self, user_id: UserId) -> RepoResult<Vec<WorkItemDto>>;
    /// Lists soft-deleted items.
    fn read_removed(&self) -> RepoResult<Vec<WorkItemDto>>;
    /// Loads the detail projection of one item.
    fn find(&self, id: WorkItemId) -> RepoResult<Option<WorkItemDetailsDto>>;
    /// Applies a full update; an unknown assignee rejects the whole update.
    fn update(&mut self, item: &WorkItemUpdateDto) -> RepoResult<Response>;
    /// Deletes or soft-deletes one item according to its state.
    fn delete(&mut self, id: WorkItemId) -> RepoResult<Response>;
}

/// SQLite-backed work item repository.
pub struct SqliteWorkItemRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteWorkItemRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[USERS, TAGS, WORK_ITEMS, WORK_ITEM_TAGS])?;
        Ok(Self { conn })
    }
}

impl WorkItemRepository for SqliteWorkItemRepository<'_> {
    fn create(
        &mut self,
        item: &WorkItemCreateDto,
    ) -> RepoResult<(Response, Option<WorkItemId>)> {
        if let Err(err) = validate_title(&item.title) {
            log_rejected("work_item_create", None, &err);
            return Ok((Response::BadRequest, None));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if title_taken(&tx, &item.title, None)? {
            log_outcome("work_item_create", None, Response::Conflict);
            return Ok((Response::Conflict, None));
        }
        if let Some(user_id) = item.assigned_to_id {
            if !user_exists(&tx, user_id)? {
                log_outcome("work_item_create", None, Response::NotFound);
                return Ok((Response::NotFound, None));
            }
        }

        tx.execute(
            &format!(
                "INSERT INTO work_items (
                    title,
                    description,
                    state,
                    created_at,
                    state_updated_at,
                    assigned_to_id
                ) VALUES (?1, ?2, ?3, {NOW_EPOCH_MS_SQL}, {NOW_EPOCH_MS_SQL}, ?4);"
            ),
            params![
                item.title.as_str(),
                item.description.as_deref(),
                State::New.as_db_str(),
                item.assigned_to_id,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let tag_ids = resolve_tag_ids(&tx, &item.tags)?;
        replace_tags(&tx, id, &tag_ids)?;
        tx.commit()?;

        info!(
            "event=work_item_create module=repo status=ok id={} tags_requested={} tags_linked={}",
            id,
            item.tags.len(),
            tag_ids.len()
        );
        Ok((Response::Created, Some(id)))
    }

    fn read(&self) -> RepoResult<Vec<WorkItemDto>> {
        query_items(self.conn, "", [])
    }

    fn read_by_state(&self, state: State) -> RepoResult<Vec<WorkItemDto>> {
        query_items(self.conn, "WHERE w.state = ?1", [state.as_db_str()])
    }

    fn read_by_tag(&self, tag_name: &str) -> RepoResult<Vec<WorkItemDto>> {
        query_items(
            self.conn,
            "WHERE EXISTS (
                SELECT 1
                FROM work_item_tags wt
                INNER JOIN tags t ON t.id = wt.tag_id
                WHERE wt.work_item_id = w.id
                  AND t.name = ?1
            )",
            [tag_name],
        )
    }

    fn read_by_user(&self, user_id: UserId) -> RepoResult<Vec<WorkItemDto>> {
        query_items(self.conn, "WHERE w.assigned_to_id = ?1", [user_id])
    }

    fn read_removed(&self) -> RepoResult<Vec<WorkItemDto>> {
        self.read_by_state(State::Removed)
    }

    fn find(&self, id: WorkItemId) -> RepoResult<Option<WorkItemDetailsDto>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{WORK_ITEM_SELECT_SQL} WHERE w.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        Ok(Some(WorkItemDetailsDto {
            id,
            title: row.get("title")?,
            description: row.get("description")?,
            created: row.get("created_at")?,
            assigned_to_name: row.get("assigned_to_name")?,
            tags: load_tag_names(self.conn, id)?,
            state: parse_state_column(row)?,
            state_updated: row.get("state_updated_at")?,
        }))
    }

    fn update(&mut self, item: &WorkItemUpdateDto) -> RepoResult<Response> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(current_state) = load_state_text(&tx, item.id)? else {
            log_outcome("work_item_update", Some(item.id), Response::NotFound);
            return Ok(Response::NotFound);
        };
        if let Err(err) = validate_title(&item.title) {
            log_rejected("work_item_update", Some(item.id), &err);
            return Ok(Response::BadRequest);
        }
        if title_taken(&tx, &item.title, Some(item.id))? {
            log_outcome("work_item_update", Some(item.id), Response::Conflict);
            return Ok(Response::Conflict);
        }
        if let Some(user_id) = item.assigned_to_id {
            if !user_exists(&tx, user_id)? {
                log_outcome("work_item_update", Some(item.id), Response::BadRequest);
                return Ok(Response::BadRequest);
            }
        }

        tx.execute(
            "UPDATE work_items
             SET
                title = ?2,
                description = COALESCE(?3, description),
                assigned_to_id = COALESCE(?4, assigned_to_id)
             WHERE id = ?1;",
            params![
                item.id,
                item.title.as_str(),
                item.description.as_deref(),
                item.assigned_to_id,
            ],
        )?;

        let tag_ids = resolve_tag_ids(&tx, &item.tags)?;
        replace_tags(&tx, item.id, &tag_ids)?;

        let state_changed = current_state != item.state.as_db_str();
        if state_changed {
            set_state(&tx, item.id, item.state)?;
        }
        tx.commit()?;

        info!(
            "event=work_item_update module=repo status=ok id={} state_changed={} tags_linked={}",
            item.id,
            state_changed,
            tag_ids.len()
        );
        Ok(Response::Updated)
    }

    fn delete(&mut self, id: WorkItemId) -> RepoResult<Response> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(state_text) = load_state_text(&tx, id)? else {
            log_outcome("work_item_delete", Some(id), Response::NotFound);
            return Ok(Response::NotFound);
        };

        let response = match State::parse(&state_text).map(State::delete_action) {
            Some(DeleteAction::Reject) => Response::Conflict,
            Some(DeleteAction::SoftDelete) => {
                set_state(&tx, id, State::Removed)?;
                tx.commit()?;
                Response::Updated
            }
            Some(DeleteAction::HardDelete) => {
                tx.execute("DELETE FROM work_item_tags WHERE work_item_id = ?1;", [id])?;
                tx.execute("DELETE FROM work_items WHERE id = ?1;", [id])?;
                tx.commit()?;
                Response::Deleted
            }
            None => {
                warn!(
                    "event=work_item_delete module=repo status=bad_request id={} error_code=unknown_state",
                    id
                );
                return Ok(Response::BadRequest);
            }
        };

        log_outcome("work_item_delete", Some(id), response);
        Ok(response)
    }
}

fn query_items<P: Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> RepoResult<Vec<WorkItemDto>> {
    let mut stmt = conn.prepare(&format!(
        "{WORK_ITEM_SELECT_SQL} {filter} ORDER BY w.title ASC, w.id ASC;"
    ))?;
    let mut rows = stmt.query(params)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        let id: WorkItemId = row.get("id")?;
        items.push(WorkItemDto {
            id,
            title: row.get("title")?,
            assigned_to_name: row.get("assigned_to_name")?,
            tags: load_tag_names(conn, id)?,
            state: parse_state_column(row)?,
        });
    }
    Ok(items)
}

fn parse_state_column(row: &Row<'_>) -> RepoResult<State> {
    let value: String = row.get("state")?;
    State::parse(&value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid state value `{value}` in work_items.state"))
    })
}

fn load_tag_names(conn: &Connection, work_item_id: WorkItemId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM work_item_tags wt
         INNER JOIN tags t ON t.id = wt.tag_id
         WHERE wt.work_item_id = ?1
         ORDER BY t.name ASC;",
    )?;
    let names = stmt
        .query_map([work_item_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

fn load_state_text(conn: &Connection, id: WorkItemId) -> RepoResult<Option<String>> {
    let state = conn
        .query_row("SELECT state FROM work_items WHERE id = ?1;", [id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(state)
}

fn set_state(conn: &Connection, id: WorkItemId, state: State) -> RepoResult<()> {
    conn.execute(
        &format!(
            "UPDATE work_items
             SET
                state = ?2,
                state_updated_at = {NOW_EPOCH_MS_SQL}
             WHERE id = ?1;"
        ),
        params![id, state.as_db_str()],
    )?;
    Ok(())
}

fn title_taken(conn: &Connection, title: &str, except: Option<WorkItemId>) -> RepoResult<bool> {
    let taken = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM work_items
            WHERE title = ?1
              AND (?2 IS NULL OR id <> ?2)
        );",
        params![title, except],
        |row| row.get(0),
    )?;
    Ok(taken)
}

fn user_exists(conn: &Connection, user_id: UserId) -> RepoResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn resolve_tag_ids(conn: &Connection, names: &[String]) -> RepoResult<Vec<TagId>> {
    let mut stmt = conn.prepare("SELECT id FROM tags WHERE name = ?1;")?;
    let mut ids: BTreeSet<TagId> = BTreeSet::new();
    for name in names {
        if let Some(id) = stmt
            .query_row([name.as_str()], |row| row.get(0))
            .optional()?
        {
            ids.insert(id);
        }
    }
    Ok(ids.into_iter().collect())
}

fn replace_tags(conn: &Connection, work_item_id: WorkItemId, tag_ids: &[TagId]) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM work_item_tags WHERE work_item_id = ?1;",
        [work_item_id],
    )?;
    let mut stmt =
        conn.prepare("INSERT INTO work_item_tags (work_item_id, tag_id) VALUES (?1, ?2);")?;
    for tag_id in tag_ids {
        stmt.execute(params![work_item_id, tag_id])?;
    }
    Ok(())
}
