//! End-to-end tests for team and membership lifecycles on the in-memory store.
//!
//! Run with: `cargo test --test e2e_teams`

#![cfg(feature = "memory")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use doc_teams::events::{EventRegistry, Listener, TeamEvent};
use doc_teams::memory::MemoryStore;
use doc_teams::{
    Authorizer, ErrorKind, MemberStatus, MembershipStore, TeamRegistry, TeamRole, TeamStatus,
};

struct Services {
    teams: TeamRegistry<MemoryStore>,
    members: Arc<MembershipStore<MemoryStore>>,
    authz: Authorizer<MemoryStore>,
}

fn services_with(events: EventRegistry) -> Services {
    let store = MemoryStore::new();
    let events = Arc::new(events);
    Services {
        teams: TeamRegistry::new(store.clone(), events.clone()),
        members: Arc::new(MembershipStore::new(store.clone(), events)),
        authz: Authorizer::new(store),
    }
}

fn services() -> Services {
    services_with(EventRegistry::new())
}

const U1: i64 = 1;
const U2: i64 = 2;
const U3: i64 = 3;

#[tokio::test]
async fn test_create_team_scenario() {
    let s = services();

    let team = s
        .teams
        .create_team("Eng", Some("backend team"), U1)
        .await
        .unwrap();

    assert_eq!(team.member_count, 1);
    assert_eq!(team.status, TeamStatus::Active);

    let members = s.members.list_members(team.id, U1, false).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, U1);
    assert_eq!(members[0].role, TeamRole::Owner);
    assert_eq!(members[0].status, MemberStatus::Active);
    assert!(s.authz.is_owner(team.id, U1).await.unwrap());
}

#[tokio::test]
async fn test_membership_scenarios() {
    let s = services();
    let team = s.teams.create_team("Eng", Some("backend team"), U1).await.unwrap();

    // owner adds U2
    let u2 = s.members.add_member(team.id, U2, "MEMBER", U1).await.unwrap();
    assert_eq!(s.teams.get_team_by_id(team.id).await.unwrap().member_count, 2);

    // U2 has no manage permission
    let err = s
        .members
        .add_member(team.id, U3, "MEMBER", U2)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    // the owner row cannot be removed
    let owner_row = s.members.list_members(team.id, U1, true).await.unwrap()[0].clone();
    let err = s
        .members
        .remove_member(team.id, owner_row.id, U1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // nobody can be promoted to owner
    let err = s
        .members
        .update_member_role(team.id, u2.id, "OWNER", U1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // the owner cannot leave, a member can
    let err = s.members.leave_team(team.id, U1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    s.members.leave_team(team.id, U2).await.unwrap();
    assert_eq!(s.teams.get_team_by_id(team.id).await.unwrap().member_count, 1);
}

#[tokio::test]
async fn test_owner_is_immutable_for_every_actor() {
    let s = services();
    let team = s.teams.create_team("Eng", None, U1).await.unwrap();
    s.members.add_member(team.id, U2, "ADMIN", U1).await.unwrap();
    let owner_row = s
        .members
        .list_members(team.id, U1, true)
        .await
        .unwrap()
        .into_iter()
        .find(|m| m.role == TeamRole::Owner)
        .unwrap();

    for actor in [U1, U2] {
        let err = s
            .members
            .remove_member(team.id, owner_row.id, actor)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    // role changes are owner-only, so the admin is denied before the owner check
    let err = s
        .members
        .update_member_role(team.id, owner_row.id, "MEMBER", U2)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    let err = s
        .members
        .update_member_role(team.id, owner_row.id, "MEMBER", U1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_admin_cannot_change_roles() {
    let s = services();
    let team = s.teams.create_team("Eng", None, U1).await.unwrap();
    s.members.add_member(team.id, U2, "ADMIN", U1).await.unwrap();
    let u3 = s.members.add_member(team.id, U3, "VIEWER", U1).await.unwrap();

    let err = s
        .members
        .update_member_role(team.id, u3.id, "MEMBER", U2)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let updated = s
        .members
        .update_member_role(team.id, u3.id, "MEMBER", U1)
        .await
        .unwrap();
    assert_eq!(updated.role, TeamRole::Member);
}

#[tokio::test]
async fn test_duplicate_add_leaves_count_unchanged() {
    let s = services();
    let team = s.teams.create_team("Eng", None, U1).await.unwrap();
    s.members.add_member(team.id, U2, "MEMBER", U1).await.unwrap();

    let before = s.teams.get_team_by_id(team.id).await.unwrap().member_count;
    let err = s
        .members
        .add_member(team.id, U2, "VIEWER", U1)
        .await
        .unwrap_err();
    let after = s.teams.get_team_by_id(team.id).await.unwrap().member_count;

    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_row_identity_survives_cycles() {
    let s = services();
    let team = s.teams.create_team("Eng", None, U1).await.unwrap();
    let first = s.members.add_member(team.id, U2, "MEMBER", U1).await.unwrap();

    for _ in 0..3 {
        s.members.remove_member(team.id, first.id, U1).await.unwrap();
        assert!(!s.authz.is_member(team.id, U2).await.unwrap());

        let again = s.members.add_member(team.id, U2, "MEMBER", U1).await.unwrap();
        assert_eq!(again.id, first.id);
        assert!(s.authz.is_member(team.id, U2).await.unwrap());
    }

    let rows = s.members.list_members(team.id, U1, false).await.unwrap();
    assert_eq!(rows.iter().filter(|m| m.user_id == U2).count(), 1);
    assert_eq!(s.teams.get_team_by_id(team.id).await.unwrap().member_count, 2);
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let s = services();
    let team = s.teams.create_team("Eng", None, U1).await.unwrap();
    s.members.add_member(team.id, U2, "MEMBER", U1).await.unwrap();

    let t1 = s.teams.get_team_by_id(team.id).await.unwrap();
    let t2 = s.teams.get_team_by_id(team.id).await.unwrap();
    assert_eq!(t1, t2);

    let m1 = s.members.list_members(team.id, U2, false).await.unwrap();
    let m2 = s.members.list_members(team.id, U2, false).await.unwrap();
    assert_eq!(m1, m2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_lose_no_updates() {
    const N: i64 = 32;
    let s = services();
    let team_id = s.teams.create_team("Eng", None, U1).await.unwrap().id;

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let members = Arc::clone(&s.members);
            tokio::spawn(async move { members.add_member(team_id, 100 + i, "MEMBER", U1).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let team = s.teams.get_team_by_id(team_id).await.unwrap();
    assert_eq!(team.member_count, 1 + N);

    let active = s.members.list_members(team_id, U1, true).await.unwrap();
    assert_eq!(active.len() as i64, 1 + N);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_and_remove_keep_count_consistent() {
    let s = services();
    let team_id = s.teams.create_team("Eng", None, U1).await.unwrap().id;

    let mut existing = Vec::new();
    for user_id in 10..20 {
        existing.push(s.members.add_member(team_id, user_id, "MEMBER", U1).await.unwrap());
    }

    let mut handles = Vec::new();
    for m in existing {
        let members = Arc::clone(&s.members);
        handles.push(tokio::spawn(async move {
            members.remove_member(team_id, m.id, U1).await
        }));
    }
    for user_id in 20..30 {
        let members = Arc::clone(&s.members);
        handles.push(tokio::spawn(async move {
            members
                .add_member(team_id, user_id, "VIEWER", U1)
                .await
                .map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let team = s.teams.get_team_by_id(team_id).await.unwrap();
    assert_eq!(team.member_count, 11);
}

#[tokio::test]
async fn test_deleted_team_keeps_memberships() {
    let s = services();
    let team = s.teams.create_team("Eng", None, U1).await.unwrap();
    s.members.add_member(team.id, U2, "MEMBER", U1).await.unwrap();

    s.teams.delete_team(team.id, U1).await.unwrap();

    let team = s.teams.get_team_by_id(team.id).await.unwrap();
    assert_eq!(team.status, TeamStatus::Deleted);
    assert!(s.authz.is_member(team.id, U2).await.unwrap());

    let err = s
        .members
        .add_member(team.id, U3, "MEMBER", U1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_unknown_team_error_per_operation() {
    let s = services();
    let missing = 4242;

    let err = s.members.remove_member(missing, 1, U1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let err = s
        .members
        .update_member_role(missing, 1, "ADMIN", U1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = s.members.leave_team(missing, U2).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

struct Recorder(Arc<Mutex<Vec<&'static str>>>);

#[async_trait]
impl Listener for Recorder {
    async fn handle(&self, event: &TeamEvent) {
        self.0.lock().unwrap().push(event.name());
    }
}

#[tokio::test]
async fn test_events_follow_committed_mutations() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut events = EventRegistry::new();
    events.listen(Recorder(Arc::clone(&seen)));
    let s = services_with(events);

    let team = s.teams.create_team("Eng", None, U1).await.unwrap();
    let m = s.members.add_member(team.id, U2, "MEMBER", U1).await.unwrap();
    s.members
        .update_member_role(team.id, m.id, "ADMIN", U1)
        .await
        .unwrap();
    s.members.remove_member(team.id, m.id, U1).await.unwrap();

    // failed mutations emit nothing
    assert!(s.members.leave_team(team.id, U1).await.is_err());
    assert!(s.teams.create_team("Eng", None, U1).await.is_err());

    s.teams.delete_team(team.id, U1).await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            "team.created",
            "team.member.added",
            "team.member.role_changed",
            "team.member.removed",
            "team.deleted",
        ]
    );
}
