#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! End-to-end accessor behavior against an in-memory SQLite database.

use record_access::{ColumnKind, Record};
use record_access_sqlite::{
    Connect, Order, PaginationRequest, PoolConfig, RecordAccessor, ReturnFields, Schema,
    SqlitePool, Statement, StoreError,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Record, Deserialize)]
#[record(table = "users")]
struct User {
    id: i64,
    email: String,
    display_name: Option<String>,
    is_admin: bool,
    settings: Option<serde_json::Value>,
    created_at: i64,
    updated_at: i64,
}

const CREATE_USERS: &str = "CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    display_name TEXT,
    is_admin INTEGER NOT NULL DEFAULT 0,
    settings TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)";

async fn pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:", PoolConfig { max_connections: 1 })
        .await
        .unwrap();
    sqlx::query(CREATE_USERS).execute(pool.inner()).await.unwrap();
    pool
}

async fn users() -> RecordAccessor<SqlitePool, User> {
    RecordAccessor::for_record(pool().await).unwrap()
}

fn user(email: &str) -> Statement {
    Statement::new().set("email", email)
}

#[tokio::test]
async fn create_sets_equal_timestamps_and_assigns_id() {
    let users = users().await;

    let ada = users
        .create(&user("ada@example.com").set("displayName", "Ada"))
        .await
        .unwrap();

    assert!(ada.id > 0);
    assert_eq!(ada.email, "ada@example.com");
    assert_eq!(ada.display_name.as_deref(), Some("Ada"));
    assert!(!ada.is_admin);
    assert!(ada.created_at > 0);
    assert_eq!(ada.created_at, ada.updated_at);
}

#[tokio::test]
async fn create_backfills_caller_created_at() {
    let users = users().await;

    let old = users
        .create(&user("old@example.com").set("createdAt", 1_000i64))
        .await
        .unwrap();

    assert_eq!(old.created_at, 1_000);
    assert!(old.updated_at > old.created_at);
}

#[tokio::test]
async fn duplicate_email_is_a_constraint_violation() {
    let users = users().await;
    users.create(&user("dup@example.com")).await.unwrap();

    let err = users.create(&user("dup@example.com")).await.unwrap_err();
    assert!(err.is_constraint_violation(), "got {err:?}");
    match err {
        StoreError::ConstraintViolation { message, code, .. } => {
            assert!(message.contains("users.email"), "got {message}");
            assert!(code.is_some());
        }
        other => panic!("expected a constraint violation, got {other:?}"),
    }
}

#[tokio::test]
async fn update_applies_fields_and_advances_updated_at() {
    let users = users().await;
    let before = users
        .create(&user("ada@example.com").set("createdAt", 1_000i64))
        .await
        .unwrap();

    let after = users
        .update(
            &Statement::new().set("displayName", "Countess").set("isAdmin", true),
            &Statement::new().set("id", before.id),
        )
        .await
        .unwrap();

    assert_eq!(after.id, before.id);
    assert_eq!(after.display_name.as_deref(), Some("Countess"));
    assert!(after.is_admin);
    assert_eq!(after.created_at, 1_000);
    assert!(after.updated_at >= before.updated_at);
}

#[tokio::test]
async fn update_on_missing_row_is_not_found() {
    let users = users().await;
    users.create(&user("ada@example.com")).await.unwrap();

    let err = users
        .update(
            &Statement::new().set("displayName", "Ghost"),
            &Statement::new().set("email", "nobody@example.com"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn upsert_updates_in_place_on_matching_id() {
    let users = users().await;
    let original = users
        .create(&user("ada@example.com").set("createdAt", 1_000i64))
        .await
        .unwrap();

    let upserted = users
        .upsert(
            &Statement::new()
                .set("id", original.id)
                .set("email", "ada@lovelace.org")
                .set("displayName", "Ada"),
        )
        .await
        .unwrap();

    assert_eq!(upserted.id, original.id);
    assert_eq!(upserted.email, "ada@lovelace.org");
    assert_eq!(upserted.display_name.as_deref(), Some("Ada"));
    assert_eq!(upserted.created_at, 1_000);
    assert!(upserted.updated_at >= original.updated_at);
    assert_eq!(users.list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn upsert_inserts_on_new_id() {
    let users = users().await;

    let inserted = users
        .upsert(&Statement::new().set("id", 42i64).set("email", "new@example.com"))
        .await
        .unwrap();

    assert_eq!(inserted.id, 42);
    assert_eq!(inserted.created_at, inserted.updated_at);
    assert!(
        users
            .get(&Statement::new().set("id", 42i64))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn upsert_without_id_inserts_a_new_row() {
    let users = users().await;
    let existing = users.create(&user("ada@example.com")).await.unwrap();

    let inserted = users.upsert(&user("bob@example.com")).await.unwrap();

    assert_ne!(inserted.id, existing.id);
    assert_eq!(inserted.email, "bob@example.com");
    assert_eq!(inserted.created_at, inserted.updated_at);
    assert_eq!(users.list(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn del_counts_removed_rows() {
    let users = users().await;
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        users
            .create(&user(email).set("displayName", "twin"))
            .await
            .unwrap();
    }

    let none = users
        .del(&Statement::new().set("displayName", "nobody"))
        .await
        .unwrap();
    assert_eq!(none, 0);

    let removed = users
        .del(&Statement::new().set("displayName", "twin"))
        .await
        .unwrap();
    assert_eq!(removed, 3);

    let gone = users
        .get(&Statement::new().set("displayName", "twin"))
        .await
        .unwrap();
    assert!(gone.is_none());
}

#[tokio::test]
async fn paginate_reports_totals_and_slices_pages() {
    let users = users().await;
    for i in 1..=5i64 {
        users
            .create(&user(&format!("u{i}@example.com")).set("createdAt", i * 1_000))
            .await
            .unwrap();
    }

    let first = users
        .paginate(&PaginationRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(first.total_count, 5);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.current_page, 1);
    assert_eq!(first.data.len(), 2);
    // newest first by default
    assert_eq!(first.data[0].created_at, 5_000);
    assert_eq!(first.data[1].created_at, 4_000);

    let last = users
        .paginate(&PaginationRequest::new(3, 2))
        .await
        .unwrap();
    assert_eq!(last.data.len(), 1);
    assert_eq!(last.data[0].created_at, 1_000);

    let beyond = users
        .paginate(&PaginationRequest::new(4, 2))
        .await
        .unwrap();
    assert!(beyond.data.is_empty());
    assert_eq!(beyond.total_count, 5);
}

#[tokio::test]
async fn paginate_is_stable_when_created_at_ties() {
    let users = users().await;
    for i in 0..7i64 {
        users
            .create(&user(&format!("t{i}@example.com")).set("createdAt", 1_000i64))
            .await
            .unwrap();
    }

    let mut seen = Vec::new();
    for page in 1..=4 {
        let result = users
            .paginate(&PaginationRequest::new(page, 2))
            .await
            .unwrap();
        assert_eq!(result.total_count, 7);
        seen.extend(result.data.into_iter().map(|u| u.id));
    }

    let mut ids: Vec<i64> = users.list(None).await.unwrap().iter().map(|u| u.id).collect();
    ids.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(seen, ids);
}

#[tokio::test]
async fn paginate_filters_and_orders() {
    let users = users().await;
    for (i, name) in ["x", "y", "x", "x"].iter().enumerate() {
        users
            .create(&user(&format!("p{i}@example.com")).set("displayName", *name))
            .await
            .unwrap();
    }

    let page = users
        .paginate(
            &PaginationRequest::new(1, 10)
                .filter(Statement::new().set("displayName", "x"))
                .order_by("email", Order::Asc),
        )
        .await
        .unwrap();

    assert_eq!(page.total_count, 3);
    assert_eq!(page.total_pages, 1);
    let emails: Vec<_> = page.data.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(emails, vec!["p0@example.com", "p2@example.com", "p3@example.com"]);
}

#[tokio::test]
async fn list_and_find() {
    let users = users().await;
    users.create(&user("a@example.com").set("isAdmin", true)).await.unwrap();
    users.create(&user("b@example.com")).await.unwrap();
    users.create(&user("c@example.com").set("isAdmin", true)).await.unwrap();

    assert_eq!(users.list(None).await.unwrap().len(), 3);

    let admins = users
        .find(&Statement::new().set("isAdmin", true))
        .await
        .unwrap();
    let emails: Vec<_> = admins.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(emails.len(), 2);
    assert!(emails.contains(&"a@example.com"));
    assert!(emails.contains(&"c@example.com"));
}

#[tokio::test]
async fn return_fields_restrict_every_row() {
    let pool = pool().await;
    let users: RecordAccessor<_> = RecordAccessor::with_return_fields(
        pool,
        User::schema(),
        ReturnFields::from_fields(["id", "email"]),
    )
    .unwrap();

    let created = users.create(&user("ada@example.com")).await.unwrap();
    let keys: Vec<_> = created.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["id", "email"]);

    for row in users.list(None).await.unwrap() {
        assert_eq!(row.len(), 2);
    }
}

#[tokio::test]
async fn nested_json_round_trips() {
    let users = users().await;
    let settings = json!({
        "theme": "dark",
        "notifications": {"email": true, "digest": ["mon", "thu"]},
        "limits": [1, 2.5, null]
    });

    let created = users
        .create(&user("ada@example.com").set("settings", settings.clone()))
        .await
        .unwrap();
    let fetched = users
        .get(&Statement::new().set("id", created.id))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(fetched.settings, Some(settings));
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn json_column_scalars_keep_their_type() {
    let pool = pool().await;
    sqlx::query(
        "CREATE TABLE notes (\
         id INTEGER PRIMARY KEY, note TEXT, created_at INTEGER, updated_at INTEGER)",
    )
    .execute(pool.inner())
    .await
    .unwrap();
    let notes: RecordAccessor<_> =
        RecordAccessor::new(pool, Schema::new("notes").column("note", ColumnKind::Json)).unwrap();

    let cases = [
        json!("42"),
        json!("{\"a\":1}"),
        json!(true),
        json!(42),
        json!(1.5),
        json!({"a": [1, "two"]}),
    ];
    for note in cases {
        let created = notes
            .create(&Statement::new().set("note", note.clone()))
            .await
            .unwrap();
        assert_eq!(created["note"], note);

        let fetched = notes
            .get(&Statement::new().set("id", created["id"].clone()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched["note"], note);
    }
}

#[tokio::test]
async fn works_with_a_hand_written_schema() {
    let pool = pool().await;
    let schema = Schema::new("users")
        .column("email", ColumnKind::Text)
        .column("isAdmin", ColumnKind::Boolean);
    let users: RecordAccessor<_> = RecordAccessor::new(pool, schema).unwrap();

    let row = users
        .create(&user("ada@example.com").set("isAdmin", true))
        .await
        .unwrap();
    assert_eq!(row["is_admin"], json!(true));
    assert_eq!(row["email"], json!("ada@example.com"));

    let err = users
        .create(&user("bob@example.com").set("displayName", "Bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidField(_)));
}
