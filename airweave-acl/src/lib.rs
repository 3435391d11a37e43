//! Mirrors a source's native access-control lists into
//! `AccessControlMembership` rows, by full or incremental sync.

use airweave_core::types::{OrganizationId, SourceConnectionId};
use airweave_data::{InMemoryRepository, Repository};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberType {
    User,
    Group,
    ServiceAccount,
}

/// Unique on `(organization_id, member_id, member_type, group_id,
/// source_connection_id)` — `organization_id` is load-bearing here, not
/// incidental: two organizations can otherwise share a
/// `source_connection_id`/`member_id`/`group_id` tuple.
fn composite_key(
    organization_id: &OrganizationId,
    source_connection_id: &SourceConnectionId,
    member_id: &str,
    member_type: &MemberType,
    group_id: &str,
) -> String {
    format!("{organization_id}:{source_connection_id}:{member_id}:{member_type:?}:{group_id}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessControlMembership {
    pub organization_id: OrganizationId,
    pub source_connection_id: SourceConnectionId,
    pub source_name: String,
    pub member_id: String,
    pub member_type: MemberType,
    pub group_id: String,
    pub group_name: String,
}

/// One tuple as reported directly by a source's full-listing API.
#[derive(Debug, Clone)]
pub struct MembershipTuple {
    pub member_id: String,
    pub member_type: MemberType,
    pub group_id: String,
    pub group_name: String,
}

#[derive(Debug, Clone)]
pub enum AclChange {
    Add(MembershipTuple),
    Remove {
        member_id: String,
        member_type: MemberType,
        group_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Full,
    Incremental,
}

/// Decides full vs incremental per the source's capability and cursor state.
pub fn select_mode(supports_incremental_acl: bool, cursor_cookie: Option<&str>, force_full_refresh: bool) -> SyncMode {
    if supports_incremental_acl && cursor_cookie.is_some() && !force_full_refresh {
        SyncMode::Incremental
    } else {
        SyncMode::Full
    }
}

#[derive(Debug, Clone, Default)]
pub struct AclSyncOutcome {
    pub upserted: usize,
    pub removed: usize,
    /// Set only on a full sync that actually ran its orphan pass.
    pub orphans_deleted: usize,
}

/// Stores mirrored ACL rows, keyed by the composite
/// `(organization_id, source_connection_id, member_id, member_type,
/// group_id)` index.
#[derive(Clone)]
pub struct AclStore {
    repo: InMemoryRepository<AccessControlMembership, String>,
}

impl AclStore {
    pub fn new() -> Self {
        Self {
            repo: InMemoryRepository::new(|m: &AccessControlMembership| {
                composite_key(&m.organization_id, &m.source_connection_id, &m.member_id, &m.member_type, &m.group_id)
            }),
        }
    }

    fn rows_for(&self, source_connection_id: &SourceConnectionId) -> Vec<AccessControlMembership> {
        self.repo
            .find_where(|m| &m.source_connection_id == source_connection_id)
    }

    /// Runs a full sync from a freshly collected tuple set. `collected` is
    /// `Err` when the source-side collection step itself failed — in that
    /// case nothing is deleted, preserving valid permissions rather than
    /// wiping them on a transient collection failure.
    pub async fn full_sync(
        &self,
        organization_id: OrganizationId,
        source_connection_id: SourceConnectionId,
        source_name: &str,
        collected: Result<Vec<MembershipTuple>, ()>,
    ) -> AclSyncOutcome {
        let Ok(tuples) = collected else {
            tracing::warn!(%source_connection_id, "acl collection failed, skipping orphan cleanup");
            return AclSyncOutcome::default();
        };

        // Dedupe by composite key, later tuple wins.
        let mut deduped = std::collections::HashMap::new();
        for t in tuples {
            let key = (t.member_id.clone(), format!("{:?}", t.member_type), t.group_id.clone());
            deduped.insert(key, t);
        }

        let mut seen_keys = HashSet::new();
        let mut upserted = 0usize;
        for (_, t) in deduped {
            let key = composite_key(&organization_id, &source_connection_id, &t.member_id, &t.member_type, &t.group_id);
            seen_keys.insert(key);
            let row = AccessControlMembership {
                organization_id,
                source_connection_id,
                source_name: source_name.to_string(),
                member_id: t.member_id,
                member_type: t.member_type,
                group_id: t.group_id,
                group_name: t.group_name,
            };
            let _ = self.repo.save(row).await;
            upserted += 1;
        }

        let existing = self.rows_for(&source_connection_id);
        let mut orphans_deleted = 0usize;
        for row in existing {
            let key = composite_key(&row.organization_id, &source_connection_id, &row.member_id, &row.member_type, &row.group_id);
            if !seen_keys.contains(&key) {
                let _ = self.repo.delete(&key).await;
                orphans_deleted += 1;
            }
        }

        AclSyncOutcome {
            upserted,
            orphans_deleted,
            removed: 0,
        }
    }

    /// Applies a `(changes, cookie)` incremental batch. No orphan pass runs
    /// here — incremental sync only ever removes what the source explicitly
    /// reports as removed.
    pub async fn incremental_sync(
        &self,
        organization_id: OrganizationId,
        source_connection_id: SourceConnectionId,
        source_name: &str,
        changes: Vec<AclChange>,
    ) -> AclSyncOutcome {
        let mut outcome = AclSyncOutcome::default();
        for change in changes {
            match change {
                AclChange::Add(t) => {
                    let row = AccessControlMembership {
                        organization_id,
                        source_connection_id,
                        source_name: source_name.to_string(),
                        member_id: t.member_id,
                        member_type: t.member_type,
                        group_id: t.group_id,
                        group_name: t.group_name,
                    };
                    let _ = self.repo.save(row).await;
                    outcome.upserted += 1;
                }
                AclChange::Remove { member_id, member_type, group_id } => {
                    let key = composite_key(&organization_id, &source_connection_id, &member_id, &member_type, &group_id);
                    if self.repo.delete(&key).await.unwrap_or(false) {
                        outcome.removed += 1;
                    }
                }
            }
        }
        outcome
    }
}

impl Default for AclStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(member: &str, group: &str) -> MembershipTuple {
        MembershipTuple {
            member_id: member.into(),
            member_type: MemberType::User,
            group_id: group.into(),
            group_name: format!("{group}-name"),
        }
    }

    #[tokio::test]
    async fn full_sync_deletes_orphans() {
        let store = AclStore::new();
        let org = OrganizationId::new();
        let sc = SourceConnectionId::new();
        store
            .full_sync(org, sc, "asana", Ok(vec![tuple("alice", "g1"), tuple("bob", "g1")]))
            .await;

        let outcome = store.full_sync(org, sc, "asana", Ok(vec![tuple("alice", "g1")])).await;
        assert_eq!(outcome.orphans_deleted, 1);
        assert_eq!(store.rows_for(&sc).len(), 1);
    }

    #[tokio::test]
    async fn failed_collection_never_deletes() {
        let store = AclStore::new();
        let org = OrganizationId::new();
        let sc = SourceConnectionId::new();
        store.full_sync(org, sc, "asana", Ok(vec![tuple("alice", "g1")])).await;

        let outcome = store.full_sync(org, sc, "asana", Err(())).await;
        assert_eq!(outcome.orphans_deleted, 0);
        assert_eq!(store.rows_for(&sc).len(), 1);
    }

    #[tokio::test]
    async fn incremental_add_and_remove() {
        let store = AclStore::new();
        let org = OrganizationId::new();
        let sc = SourceConnectionId::new();
        store
            .incremental_sync(org, sc, "asana", vec![AclChange::Add(tuple("alice", "g1"))])
            .await;
        assert_eq!(store.rows_for(&sc).len(), 1);

        store
            .incremental_sync(
                org,
                sc,
                "asana",
                vec![AclChange::Remove {
                    member_id: "alice".into(),
                    member_type: MemberType::User,
                    group_id: "g1".into(),
                }],
            )
            .await;
        assert!(store.rows_for(&sc).is_empty());
    }

    #[tokio::test]
    async fn same_source_connection_id_across_orgs_does_not_collide() {
        // Two different organizations happening to reuse the same
        // source_connection_id/member_id/group_id tuple must not clobber
        // each other's rows.
        let store = AclStore::new();
        let org_a = OrganizationId::new();
        let org_b = OrganizationId::new();
        let sc = SourceConnectionId::new();

        store.full_sync(org_a, sc, "asana", Ok(vec![tuple("alice", "g1")])).await;
        store.full_sync(org_b, sc, "asana", Ok(vec![tuple("alice", "g1")])).await;

        assert_eq!(store.rows_for(&sc).len(), 2);
    }

    #[test]
    fn mode_selection_prefers_incremental_when_eligible() {
        assert_eq!(select_mode(true, Some("cookie"), false), SyncMode::Incremental);
        assert_eq!(select_mode(true, None, false), SyncMode::Full);
        assert_eq!(select_mode(false, Some("cookie"), false), SyncMode::Full);
        assert_eq!(select_mode(true, Some("cookie"), true), SyncMode::Full);
    }
}
