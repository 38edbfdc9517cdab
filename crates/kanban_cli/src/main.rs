//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `kanban_core` linkage and that a board database opens cleanly.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `kanban_cli [DB_PATH] [LOG_DIR]`. The database is in-memory when
//! `DB_PATH` is omitted; file logging starts only when `LOG_DIR` is given.

use kanban_core::db::migrations::current_user_version;
use kanban_core::db::{open_db, open_db_in_memory};
use kanban_core::{
    default_log_level, init_logging, RepoResult, SqliteTagRepository, SqliteUserRepository,
    SqliteWorkItemRepository, TagRepository, UserRepository, WorkItemRepository,
};
use rusqlite::Connection;
use std::process::ExitCode;

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    db_path: Option<String>,
    log_dir: Option<String>,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Self {
        Self {
            db_path: args.next(),
            log_dir: args.next(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct BoardCounts {
    users: usize,
    tags: usize,
    work_items: usize,
}

fn main() -> ExitCode {
    println!("kanban_core ping={}", kanban_core::ping());
    println!("kanban_core version={}", kanban_core::core_version());

    let args = CliArgs::parse(std::env::args().skip(1));
    if let Some(log_dir) = args.log_dir.as_deref() {
        if let Err(err) = start_logging(log_dir) {
            eprintln!("kanban_core logging=error error={err}");
            return ExitCode::FAILURE;
        }
        println!("kanban_core logging={log_dir}");
    }

    let opened = match args.db_path.as_deref() {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    };
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("kanban_core db_open=error error={err}");
            return ExitCode::FAILURE;
        }
    };

    match current_user_version(&conn) {
        Ok(version) => println!("kanban_core schema_version={version}"),
        Err(err) => {
            eprintln!("kanban_core schema_version=error error={err}");
            return ExitCode::FAILURE;
        }
    }

    match board_counts(&mut conn) {
        Ok(counts) => {
            println!(
                "kanban_core users={} tags={} work_items={}",
                counts.users, counts.tags, counts.work_items
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("kanban_core read=error error={err}");
            ExitCode::FAILURE
        }
    }
}

fn start_logging(log_dir: &str) -> Result<(), String> {
    init_logging(default_log_level().as_str(), log_dir)
}

fn board_counts(conn: &mut Connection) -> RepoResult<BoardCounts> {
    let users = SqliteUserRepository::try_new(conn)?.read()?.len();
    let tags = SqliteTagRepository::try_new(conn)?.read()?.len();
    let work_items = SqliteWorkItemRepository::try_new(conn)?.read()?.len();
    Ok(BoardCounts {
        users,
        tags,
        work_items,
    })
}
