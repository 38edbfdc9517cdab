use kanban_core::db::open_db_in_memory;
use kanban_core::{
    Response, SqliteWorkItemRepository, State, WorkItemCreateDto, WorkItemId,
    WorkItemRepository, WorkItemUpdateDto,
};
use rusqlite::{params, Connection};

/// Users Alice (1) and Bob (2); tags backend (1), frontend (2), urgent (3).
fn seeded_board() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (name, email) VALUES
            ('Alice', 'alice@example.com'),
            ('Bob', 'bob@example.com');
         INSERT INTO tags (name) VALUES ('backend'), ('frontend'), ('urgent');",
    )
    .unwrap();
    conn
}

fn new_item(title: &str) -> WorkItemCreateDto {
    WorkItemCreateDto {
        title: title.to_string(),
        ..WorkItemCreateDto::default()
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn create_ok(repo: &mut SqliteWorkItemRepository<'_>, item: &WorkItemCreateDto) -> WorkItemId {
    let (response, id) = repo.create(item).unwrap();
    assert_eq!(response, Response::Created);
    id.unwrap()
}

fn update_of(id: WorkItemId, title: &str, state: State) -> WorkItemUpdateDto {
    WorkItemUpdateDto {
        id,
        title: title.to_string(),
        assigned_to_id: None,
        description: None,
        tags: Vec::new(),
        state,
    }
}

#[test]
fn create_sets_new_state_and_resolves_references() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    let id = create_ok(
        &mut repo,
        &WorkItemCreateDto {
            title: "Login page".to_string(),
            assigned_to_id: Some(1),
            description: Some("OAuth only".to_string()),
            tags: names(&["frontend", "backend", "ghost"]),
        },
    );

    let details = repo.find(id).unwrap().unwrap();
    assert_eq!(details.title, "Login page");
    assert_eq!(details.description.as_deref(), Some("OAuth only"));
    assert_eq!(details.assigned_to_name.as_deref(), Some("Alice"));
    assert_eq!(details.tags, names(&["backend", "frontend"]));
    assert_eq!(details.state, State::New);
    assert_eq!(details.created, details.state_updated);
    assert!(details.created > 0);
}

#[test]
fn create_does_not_auto_create_unknown_tags() {
    let mut conn = seeded_board();
    {
        let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();
        let id = create_ok(
            &mut repo,
            &WorkItemCreateDto {
                tags: names(&["ghost"]),
                ..new_item("Haunted")
            },
        );
        assert!(repo.find(id).unwrap().unwrap().tags.is_empty());
    }
    let tags: i64 = conn
        .query_row("SELECT COUNT(*) FROM tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tags, 3);
}

#[test]
fn create_duplicate_title_returns_conflict() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    create_ok(&mut repo, &new_item("Deploy"));
    assert_eq!(
        repo.create(&new_item("Deploy")).unwrap(),
        (Response::Conflict, None)
    );
    assert_eq!(repo.read().unwrap().len(), 1);
}

#[test]
fn create_with_unknown_assignee_returns_not_found_and_creates_nothing() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    let outcome = repo
        .create(&WorkItemCreateDto {
            assigned_to_id: Some(99),
            ..new_item("Orphan")
        })
        .unwrap();
    assert_eq!(outcome, (Response::NotFound, None));
    assert!(repo.read().unwrap().is_empty());
}

#[test]
fn create_with_blank_title_returns_bad_request() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    assert_eq!(
        repo.create(&new_item(" ")).unwrap(),
        (Response::BadRequest, None)
    );
}

#[test]
fn read_orders_by_title() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    for title in ["bravo", "charlie", "alpha"] {
        create_ok(&mut repo, &new_item(title));
    }

    let titles: Vec<_> = repo
        .read()
        .unwrap()
        .into_iter()
        .map(|item| item.title)
        .collect();
    assert_eq!(titles, names(&["alpha", "bravo", "charlie"]));
}

#[test]
fn read_filters_by_state_tag_and_user() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    let api = create_ok(
        &mut repo,
        &WorkItemCreateDto {
            assigned_to_id: Some(2),
            tags: names(&["backend"]),
            ..new_item("API")
        },
    );
    let ui = create_ok(
        &mut repo,
        &WorkItemCreateDto {
            assigned_to_id: Some(1),
            tags: names(&["frontend", "urgent"]),
            ..new_item("UI")
        },
    );
    assert_eq!(
        repo.update(&WorkItemUpdateDto {
            tags: names(&["frontend", "urgent"]),
            ..update_of(ui, "UI", State::Active)
        })
        .unwrap(),
        Response::Updated
    );

    let active = repo.read_by_state(State::Active).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, ui);
    assert_eq!(active[0].assigned_to_name.as_deref(), Some("Alice"));
    assert_eq!(active[0].tags, names(&["frontend", "urgent"]));

    let backend = repo.read_by_tag("backend").unwrap();
    assert_eq!(backend.len(), 1);
    assert_eq!(backend[0].id, api);
    assert!(repo.read_by_tag("Backend").unwrap().is_empty());

    let bobs = repo.read_by_user(2).unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].title, "API");

    assert!(repo.read_removed().unwrap().is_empty());
}

#[test]
fn find_missing_item_returns_none() {
    let mut conn = seeded_board();
    let repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    assert_eq!(repo.find(42).unwrap(), None);
}

#[test]
fn update_missing_item_returns_not_found() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    assert_eq!(
        repo.update(&update_of(42, "Ghost", State::New)).unwrap(),
        Response::NotFound
    );
}

#[test]
fn update_missing_item_with_blank_title_returns_not_found() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    assert_eq!(
        repo.update(&update_of(99, "", State::New)).unwrap(),
        Response::NotFound
    );
}

#[test]
fn update_existing_item_with_blank_title_returns_bad_request() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    let id = create_ok(&mut repo, &new_item("Titled"));
    assert_eq!(
        repo.update(&update_of(id, "  ", State::Active)).unwrap(),
        Response::BadRequest
    );

    let details = repo.find(id).unwrap().unwrap();
    assert_eq!(details.title, "Titled");
    assert_eq!(details.state, State::New);
}

#[test]
fn update_to_other_items_title_returns_conflict() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    create_ok(&mut repo, &new_item("First"));
    let second = create_ok(&mut repo, &new_item("Second"));

    assert_eq!(
        repo.update(&update_of(second, "First", State::New)).unwrap(),
        Response::Conflict
    );
    assert_eq!(repo.find(second).unwrap().unwrap().title, "Second");
}

#[test]
fn update_keeping_own_title_is_not_a_conflict() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    let id = create_ok(&mut repo, &new_item("Same"));
    assert_eq!(
        repo.update(&update_of(id, "Same", State::New)).unwrap(),
        Response::Updated
    );
}

#[test]
fn update_with_unknown_assignee_is_rejected_without_writes() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    let id = create_ok(
        &mut repo,
        &WorkItemCreateDto {
            assigned_to_id: Some(1),
            tags: names(&["backend"]),
            ..new_item("Keep me")
        },
    );

    let outcome = repo
        .update(&WorkItemUpdateDto {
            assigned_to_id: Some(99),
            description: Some("changed".to_string()),
            tags: names(&["urgent"]),
            ..update_of(id, "Renamed", State::Active)
        })
        .unwrap();
    assert_eq!(outcome, Response::BadRequest);

    let details = repo.find(id).unwrap().unwrap();
    assert_eq!(details.title, "Keep me");
    assert_eq!(details.description, None);
    assert_eq!(details.assigned_to_name.as_deref(), Some("Alice"));
    assert_eq!(details.tags, names(&["backend"]));
    assert_eq!(details.state, State::New);
}

#[test]
fn update_overwrites_title_and_replaces_tags() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    let id = create_ok(
        &mut repo,
        &WorkItemCreateDto {
            assigned_to_id: Some(1),
            description: Some("original".to_string()),
            tags: names(&["backend", "urgent"]),
            ..new_item("Draft")
        },
    );

    let outcome = repo
        .update(&WorkItemUpdateDto {
            assigned_to_id: Some(2),
            tags: names(&["frontend", "ghost"]),
            ..update_of(id, "Final", State::New)
        })
        .unwrap();
    assert_eq!(outcome, Response::Updated);

    let details = repo.find(id).unwrap().unwrap();
    assert_eq!(details.title, "Final");
    assert_eq!(details.description.as_deref(), Some("original"));
    assert_eq!(details.assigned_to_name.as_deref(), Some("Bob"));
    assert_eq!(details.tags, names(&["frontend"]));
}

#[test]
fn update_with_empty_tags_clears_links() {
    let mut conn = seeded_board();
    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();

    let id = create_ok(
        &mut repo,
        &WorkItemCreateDto {
            tags: names(&["backend"]),
            ..new_item("Tagged")
        },
    );
    repo.update(&update_of(id, "Tagged", State::New)).unwrap();

    assert!(repo.find(id).unwrap().unwrap().tags.is_empty());
    assert!(repo.read_by_tag("backend").unwrap().is_empty());
}

#[test]
fn update_refreshes_state_timestamp_only_on_state_change() {
    let mut conn = seeded_board();
    let id = {
        let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();
        create_ok(&mut repo, &new_item("Timed"))
    };
    conn.execute(
        "UPDATE work_items SET state_updated_at = 1000 WHERE id = ?1;",
        params![id],
    )
    .unwrap();

    let mut repo = SqliteWorkItemRepository::try_new(&mut conn).unwrap();
    repo.update(&update_of(id, "Timed", State::New)).unwrap();
    assert_eq!(repo.find(id).unwrap().unwrap().state_updated, 1000);

    repo.update(&update_of(id, "Timed", State::Active)).unwrap();
    let details = repo.find(id).unwrap().unwrap();
    assert_eq!(details.state, State::Active);
    assert!(details.state_updated > 1000);
}
