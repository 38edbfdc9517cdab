//! Connection readiness checks run by repository constructors.

use super::{RepoError, RepoResult};
use crate::db::migrations::{current_user_version, latest_version};
use rusqlite::Connection;

/// Table name plus the columns a repository reads or writes.
pub(crate) type TableShape = (&'static str, &'static [&'static str]);

pub(crate) const USERS: TableShape = ("users", &["id", "name", "email"]);
pub(crate) const TAGS: TableShape = ("tags", &["id", "name"]);
pub(crate) const WORK_ITEMS: TableShape = (
    "work_items",
    &[
        "id",
        "title",
        "description",
        "state",
        "created_at",
        "state_updated_at",
        "assigned_to_id",
    ],
);
pub(crate) const WORK_ITEM_TAGS: TableShape = ("work_item_tags", &["work_item_id", "tag_id"]);

/// Rejects connections that did not go through `open_db`.
pub(crate) fn ensure_connection_ready(conn: &Connection, shapes: &[TableShape]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in shapes {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
