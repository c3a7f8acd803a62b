// these tests use #[serial] to run sequentially because setup_db() recreates
// the database each time.
#![allow(clippy::indexing_slicing)]

//! End-to-end tests for the `SQLite` store.
//!
//! Most tests use an in-memory `SQLite` database; the concurrency tests share
//! a temporary database file across several pooled connections.
//! Run with: `cargo test --features sqlx_sqlite --test e2e_sqlite`

#![cfg(all(feature = "sqlx_sqlite", feature = "memory"))]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use doc_teams::events::EventRegistry;
use doc_teams::memory::MemoryDocumentCatalog;
use doc_teams::sqlite::{migrations, SqliteStore};
use doc_teams::teams::{CreateTeam, TeamRepository};
use doc_teams::{
    CommentGateway, CommentStatus, ErrorKind, IdentityResolver, MemberStatus, MembershipStore,
    NewComment, Store, StoreIdentityResolver, StoreTransaction, TeamError, TeamRegistry, TeamRole,
    TeamStatus, ValidationError,
};
use serial_test::serial;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;

async fn setup_db() -> SqliteStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory SQLite database");

    migrations::run(&pool)
        .await
        .expect("Failed to run migrations");

    SqliteStore::new(pool)
}

/// A file-backed database shared by several pooled connections. The
/// directory must outlive the store.
async fn setup_file_db(max_connections: u32) -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("teams.db"))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .expect("Failed to open SQLite database file");

    migrations::run(&pool)
        .await
        .expect("Failed to run migrations");

    (dir, SqliteStore::new(pool))
}

#[tokio::test]
#[serial]
async fn test_migrations_are_idempotent() {
    let store = setup_db().await;

    migrations::run(store.pool()).await.expect("second run");

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _doc_teams_migrations")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(applied, 4);
}

#[tokio::test]
#[serial]
async fn test_team_and_membership_lifecycle() {
    let store = setup_db().await;
    let events = Arc::new(EventRegistry::new());
    let teams = TeamRegistry::new(store.clone(), events.clone());
    let members = MembershipStore::new(store, events);

    let team = teams
        .create_team("Eng", Some("backend team"), 1)
        .await
        .expect("Failed to create team");
    assert_eq!(team.member_count, 1);
    assert_eq!(team.status, TeamStatus::Active);
    assert_eq!(team.description.as_deref(), Some("backend team"));

    let owner_rows = members.list_members(team.id, 1, true).await.unwrap();
    assert_eq!(owner_rows.len(), 1);
    assert_eq!(owner_rows[0].role, TeamRole::Owner);

    let m = members.add_member(team.id, 2, "member", 1).await.unwrap();
    assert_eq!(m.role, TeamRole::Member);
    assert_eq!(teams.get_team_by_id(team.id).await.unwrap().member_count, 2);

    let err = members.add_member(team.id, 2, "ADMIN", 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    members.remove_member(team.id, m.id, 1).await.unwrap();
    assert_eq!(teams.get_team_by_id(team.id).await.unwrap().member_count, 1);

    let again = members.add_member(team.id, 2, "VIEWER", 1).await.unwrap();
    assert_eq!(again.id, m.id);
    assert_eq!(again.status, MemberStatus::Active);
    assert_eq!(again.role, TeamRole::Viewer);

    let promoted = members
        .update_member_role(team.id, m.id, "ADMIN", 1)
        .await
        .unwrap();
    assert_eq!(promoted.role, TeamRole::Admin);

    members.leave_team(team.id, 2).await.unwrap();
    let all = members.list_members(team.id, 1, false).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].status, MemberStatus::Removed);
    assert_eq!(teams.get_team_by_id(team.id).await.unwrap().member_count, 1);
}

#[tokio::test]
#[serial]
async fn test_duplicate_team_name_maps_to_validation() {
    let store = setup_db().await;
    let teams = TeamRegistry::new(store.clone(), Arc::new(EventRegistry::new()));

    teams.create_team("Eng", None, 1).await.unwrap();
    let err = teams.create_team("Eng", None, 1).await.unwrap_err();
    assert_eq!(err, TeamError::Validation(ValidationError::DuplicateTeamName));

    // the unique index itself also reports the duplicate as a validation error
    let mut tx = store.begin().await.unwrap();
    let err = tx
        .create_team(CreateTeam {
            name: "Eng".to_owned(),
            description: None,
            owner_id: 1,
        })
        .await
        .unwrap_err();
    assert_eq!(err, TeamError::Validation(ValidationError::DuplicateTeamName));
}

#[tokio::test]
#[serial]
async fn test_uncommitted_transaction_rolls_back() {
    let store = setup_db().await;

    {
        let mut tx = store.begin().await.unwrap();
        tx.create_team(CreateTeam {
            name: "Ghost".to_owned(),
            description: None,
            owner_id: 9,
        })
        .await
        .unwrap();
    }

    let mut tx = store.begin().await.unwrap();
    assert!(tx.find_teams_by_owner(9, None).await.unwrap().is_empty());
    tx.commit().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_member_count_floor() {
    let store = setup_db().await;
    let teams = TeamRegistry::new(store.clone(), Arc::new(EventRegistry::new()));
    let team = teams.create_team("Eng", None, 1).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let team = tx.increment_member_count(team.id, -5).await.unwrap();
    assert_eq!(team.member_count, 1);
    tx.commit().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_list_owned_teams_filters_deleted() {
    let store = setup_db().await;
    let teams = TeamRegistry::new(store, Arc::new(EventRegistry::new()));

    let a = teams.create_team("Alpha", None, 1).await.unwrap();
    let b = teams.create_team("Beta", None, 1).await.unwrap();
    teams.delete_team(a.id, 1).await.unwrap();

    let all = teams.list_owned_teams(1, false).await.unwrap();
    assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![b.id, a.id]);

    let active = teams.list_owned_teams(1, true).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, b.id);
}

#[tokio::test]
#[serial]
async fn test_comments_roundtrip() {
    let store = setup_db().await;
    let events = Arc::new(EventRegistry::new());
    let documents = MemoryDocumentCatalog::new();
    documents.add_document(5);

    let teams = TeamRegistry::new(store.clone(), events.clone());
    let members = MembershipStore::new(store.clone(), events.clone());
    let comments = CommentGateway::new(store, documents, events);

    let team = teams.create_team("Docs", None, 1).await.unwrap();
    members.add_member(team.id, 2, "MEMBER", 1).await.unwrap();

    let root = comments
        .create_comment(
            NewComment {
                document_id: 5,
                team_id: Some(team.id),
                content: "please review".to_owned(),
                parent_comment_id: None,
            },
            2,
        )
        .await
        .unwrap();
    let reply = comments
        .create_comment(
            NewComment {
                document_id: 5,
                team_id: Some(team.id),
                content: "on it".to_owned(),
                parent_comment_id: Some(root.id),
            },
            1,
        )
        .await
        .unwrap();

    let replies = comments.list_replies(root.id).await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].id, reply.id);

    let err = comments
        .list_comments(5, Some(team.id), 3)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    // owner moderates
    comments.delete_comment(root.id, 1).await.unwrap();
    let root = comments.get_comment(root.id).await.unwrap();
    assert_eq!(root.status, CommentStatus::Deleted);

    let visible = comments.list_comments(5, Some(team.id), 2).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, reply.id);
}

#[tokio::test]
#[serial]
async fn test_identity_resolution() {
    let store = setup_db().await;
    let resolver = StoreIdentityResolver::new(store, Arc::new(EventRegistry::new()));

    let first = resolver
        .resolve_user("oidc|42", Some("zoe"), Some("zoe@example.com"))
        .await
        .unwrap();
    let second = resolver.resolve_user("oidc|42", None, None).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.email.as_deref(), Some("zoe@example.com"));

    let renamed = resolver
        .resolve_user("oidc|42", Some("zoe b"), None)
        .await
        .unwrap();
    assert_eq!(renamed.id, first.id);
    assert_eq!(renamed.username, "zoe b");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_adds_on_shared_file() {
    const N: i64 = 20;
    let (_dir, store) = setup_file_db(8).await;
    let events = Arc::new(EventRegistry::new());
    let teams = TeamRegistry::new(store.clone(), events.clone());
    let members = Arc::new(MembershipStore::new(store, events));
    let team_id = teams.create_team("Eng", None, 1).await.unwrap().id;

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let members = Arc::clone(&members);
            tokio::spawn(async move { members.add_member(team_id, 100 + i, "MEMBER", 1).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let team = teams.get_team_by_id(team_id).await.unwrap();
    assert_eq!(team.member_count, 1 + N);
    let active = members.list_members(team_id, 1, true).await.unwrap();
    assert_eq!(active.len() as i64, 1 + N);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_add_and_remove_on_shared_file() {
    let (_dir, store) = setup_file_db(8).await;
    let events = Arc::new(EventRegistry::new());
    let teams = TeamRegistry::new(store.clone(), events.clone());
    let members = Arc::new(MembershipStore::new(store, events));
    let team_id = teams.create_team("Eng", None, 1).await.unwrap().id;

    let mut existing = Vec::new();
    for user_id in 10..20 {
        existing.push(members.add_member(team_id, user_id, "MEMBER", 1).await.unwrap());
    }

    let mut handles = Vec::new();
    for m in existing {
        let members = Arc::clone(&members);
        handles.push(tokio::spawn(async move {
            members.remove_member(team_id, m.id, 1).await
        }));
    }
    for user_id in 20..30 {
        let members = Arc::clone(&members);
        handles.push(tokio::spawn(async move {
            members
                .add_member(team_id, user_id, "VIEWER", 1)
                .await
                .map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let team = teams.get_team_by_id(team_id).await.unwrap();
    assert_eq!(team.member_count, 11);
    let active = members.list_members(team_id, 1, true).await.unwrap();
    assert_eq!(active.len(), 11);
}
