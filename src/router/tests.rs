//! Router Module Tests
//!
//! Validates fan-out reads, policy-driven inserts, the first-match update/delete
//! strategy, and reference resolution against two in-memory shards.

#[cfg(test)]
mod tests {
    use crate::document::filter::{Filter, Patch};
    use crate::document::types::into_document;
    use crate::error::ClusterError;
    use crate::partition::types::{CollectionKind, ShardId};
    use crate::router::types::WritePolicy;
    use crate::storage::store::ShardStore;
    use crate::test_support::{article, memory_router, memory_router_with, read, user};
    use serde_json::json;

    // ============================================================
    // FIND
    // ============================================================

    #[tokio::test]
    async fn test_find_concatenates_shard_a_then_b() {
        let router = memory_router();
        router
            .route_insert(CollectionKind::User, vec![user(2, "Hong Kong"), user(1, "Beijing")])
            .await
            .unwrap();

        let found = router.route_find(CollectionKind::User, &Filter::all()).await.unwrap();

        let ids: Vec<_> = found.iter().map(|d| d["id"].clone()).collect();
        assert_eq!(ids, vec![json!("u1"), json!("u2")]);
    }

    #[tokio::test]
    async fn test_find_after_insert_round_trips_without_duplicates() {
        let router = memory_router();
        let users: Vec<_> = (0..20)
            .map(|i| user(i, if i % 3 == 0 { "Hong Kong" } else { "Beijing" }))
            .collect();

        let report = router.route_insert(CollectionKind::User, users).await.unwrap();
        assert_eq!(report.total(), 20);

        let found = router
            .route_find(CollectionKind::User, &Filter::parse(r#"{"grade": "grade1"}"#).unwrap())
            .await
            .unwrap();
        assert_eq!(found.len(), 20);
        let mut ids: Vec<_> = found.iter().map(|d| d["id"].as_str().unwrap().to_string()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn test_find_surfaces_record_present_on_both_shards() {
        let router = memory_router();
        let registry = router.registry();
        registry.shard(ShardId::A).insert_many("User", vec![user(1, "Beijing")]).await.unwrap();
        registry.shard(ShardId::B).insert_many("User", vec![user(1, "Beijing")]).await.unwrap();

        let found = router.route_find(CollectionKind::User, &Filter::eq("id", "u1")).await.unwrap();

        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_find_fails_when_a_shard_is_down() {
        let router = memory_router();
        router.registry().shard(ShardId::B).set_online(false);

        let err = router.route_find(CollectionKind::User, &Filter::all()).await.unwrap_err();

        assert!(matches!(err, ClusterError::ShardUnavailable { shard: ShardId::B, .. }));
    }

    // ============================================================
    // INSERT
    // ============================================================

    #[tokio::test]
    async fn test_insert_groups_by_destination_shard() {
        let router = memory_router();

        let report = router
            .route_insert(
                CollectionKind::User,
                vec![user(1, "Beijing"), user(2, "Hong Kong"), user(3, "Beijing")],
            )
            .await
            .unwrap();

        assert_eq!(report.get(ShardId::A), 2);
        assert_eq!(report.get(ShardId::B), 1);
        assert_eq!(router.registry().shard(ShardId::A).document_count("User"), 2);
        assert_eq!(router.registry().shard(ShardId::B).document_count("User"), 1);
    }

    #[tokio::test]
    async fn test_unroutable_record_aborts_whole_batch() {
        let router = memory_router();
        let bad = into_document(json!({"id": "u9", "uid": "9", "region": "Atlantis"}));

        let err = router
            .route_insert(CollectionKind::User, vec![user(1, "Beijing"), bad])
            .await
            .unwrap_err();

        assert!(matches!(err, ClusterError::UnroutableRecord { ref record_id, .. } if record_id == "u9"));
        assert_eq!(router.registry().shard(ShardId::A).document_count("User"), 0);
    }

    #[tokio::test]
    async fn test_read_is_colocated_with_its_user() {
        let router = memory_router();
        router
            .route_insert(CollectionKind::User, vec![user(1, "Beijing"), user(2, "Hong Kong")])
            .await
            .unwrap();

        let report = router
            .route_insert(
                CollectionKind::Read,
                vec![
                    read(1, 1, 7, 1_700_000_000, (false, false, false)),
                    read(2, 2, 7, 1_700_000_000, (false, false, false)),
                    read(3, 2, 8, 1_700_000_000, (false, false, false)),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.get(ShardId::A), 1);
        assert_eq!(report.get(ShardId::B), 2);
        assert!(router.audit_reads().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_for_missing_user_is_dangling() {
        let router = memory_router();

        let err = router
            .route_insert(CollectionKind::Read, vec![read(1, 404, 7, 1_700_000_000, (false, false, false))])
            .await
            .unwrap_err();

        match err {
            ClusterError::DanglingReference { record_id, target, key, .. } => {
                assert_eq!(record_id, "r1");
                assert_eq!(target, "User");
                assert_eq!(key, "404");
            }
            other => panic!("expected DanglingReference, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reference_resolution_accepts_numeric_keys() {
        let router = memory_router();
        let numeric_user = into_document(json!({"id": "u5", "uid": 5, "region": "Hong Kong"}));
        router.route_insert(CollectionKind::User, vec![numeric_user]).await.unwrap();

        let shard = router
            .resolve_shard(CollectionKind::Read, &read(1, 5, 1, 1_700_000_000, (false, false, false)))
            .await
            .unwrap();

        assert_eq!(shard, ShardId::B);
    }

    #[tokio::test]
    async fn test_split_user_ownership_is_reported() {
        let router = memory_router();
        router.registry().shard(ShardId::A).insert_many("User", vec![user(1, "Beijing")]).await.unwrap();
        router.registry().shard(ShardId::B).insert_many("User", vec![user(1, "Beijing")]).await.unwrap();

        let err = router
            .route_insert(CollectionKind::Read, vec![read(1, 1, 1, 1_700_000_000, (false, false, false))])
            .await
            .unwrap_err();

        assert!(matches!(err, ClusterError::SplitOwnership { .. }));
    }

    #[tokio::test]
    async fn test_be_read_follows_ledgered_article_placement() {
        // 0.9 exceeds the 0.8 affinity, so this science article is overridden to shard B.
        let router = memory_router_with(vec![0.9], WritePolicy::FirstMatch);
        router.route_insert(CollectionKind::Article, vec![article(3, "science")]).await.unwrap();
        assert_eq!(router.registry().shard(ShardId::B).document_count("Article"), 1);

        let be_read = into_document(json!({"aid": "3", "readNum": 1}));
        let report = router.route_insert(CollectionKind::BeRead, vec![be_read]).await.unwrap();

        assert_eq!(report.get(ShardId::B), 1);
    }

    #[tokio::test]
    async fn test_rejected_article_batch_leaves_no_placement_behind() {
        let router = memory_router();
        let err = router
            .route_insert(
                CollectionKind::Article,
                vec![article(4, "science"), article(5, "history")],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::UnroutableRecord { .. }));
        assert_eq!(router.policy().ledger().lookup("4"), None);

        let be_read = into_document(json!({"aid": "4", "readNum": 1}));
        let err = router
            .route_insert(CollectionKind::BeRead, vec![be_read])
            .await
            .unwrap_err();

        assert!(matches!(err, ClusterError::DanglingReference { .. }));
        assert_eq!(router.registry().shard(ShardId::A).document_count("Be-Read"), 0);
    }

    #[tokio::test]
    async fn test_be_read_for_deleted_article_is_dangling() {
        let router = memory_router();
        router.route_insert(CollectionKind::Article, vec![article(9, "science")]).await.unwrap();
        assert_eq!(router.policy().ledger().lookup("9"), Some(ShardId::A));
        let deleted = router
            .route_delete(CollectionKind::Article, &Filter::eq("aid", "9"))
            .await
            .unwrap();
        assert_eq!(deleted.total(), 1);

        let be_read = into_document(json!({"aid": "9", "readNum": 1}));
        let err = router
            .route_insert(CollectionKind::BeRead, vec![be_read])
            .await
            .unwrap_err();

        assert!(matches!(err, ClusterError::DanglingReference { .. }));
        assert_eq!(router.policy().ledger().lookup("9"), None);
    }

    #[tokio::test]
    async fn test_clearing_articles_empties_the_ledger() {
        let router = memory_router();
        router
            .route_insert(CollectionKind::Article, vec![article(1, "science"), article(2, "technology")])
            .await
            .unwrap();

        router.route_clear(CollectionKind::Article).await.unwrap();

        assert_eq!(router.policy().ledger().lookup("1"), None);
        assert_eq!(router.policy().ledger().lookup("2"), None);
    }

    #[tokio::test]
    async fn test_partial_insert_is_reported() {
        let router = memory_router();
        router.registry().shard(ShardId::B).set_online(false);

        let err = router
            .route_insert(CollectionKind::User, vec![user(1, "Beijing"), user(2, "Hong Kong")])
            .await
            .unwrap_err();

        match err {
            ClusterError::PartialInsert { committed, failed, .. } => {
                assert_eq!(committed, vec![(ShardId::A, 1)]);
                assert_eq!(failed, ShardId::B);
            }
            other => panic!("expected PartialInsert, got {other:?}"),
        }
        assert_eq!(router.registry().shard(ShardId::A).document_count("User"), 1);
    }

    #[tokio::test]
    async fn test_first_shard_failure_is_not_partial() {
        let router = memory_router();
        router.registry().shard(ShardId::A).set_online(false);

        let err = router
            .route_insert(CollectionKind::Article, vec![article(1, "science")])
            .await
            .unwrap_err();

        assert!(matches!(err, ClusterError::ShardUnavailable { shard: ShardId::A, .. }));
    }

    // ============================================================
    // UPDATE / DELETE
    // ============================================================

    #[tokio::test]
    async fn test_update_falls_back_to_shard_b_once() {
        let router = memory_router();
        router.route_insert(CollectionKind::User, vec![user(1, "Hong Kong")]).await.unwrap();

        let report = router
            .route_update(
                CollectionKind::User,
                &Filter::parse(r#"{"id": "u1"}"#).unwrap(),
                &Patch::parse(r#"{"grade": "grade2"}"#).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(report.counts, vec![(ShardId::A, 0), (ShardId::B, 1)]);
        let updated = router.route_find(CollectionKind::User, &Filter::eq("id", "u1")).await.unwrap();
        assert_eq!(updated[0]["grade"], json!("grade2"));
        assert_eq!(updated[0]["region"], json!("Hong Kong"));
    }

    #[tokio::test]
    async fn test_update_stops_at_shard_a_on_success() {
        let router = memory_router();
        router.route_insert(CollectionKind::User, vec![user(1, "Beijing")]).await.unwrap();

        let report = router
            .route_update(
                CollectionKind::User,
                &Filter::eq("id", "u1"),
                &Patch::parse(r#"{"grade": "grade3"}"#).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(report.contacted(), vec![ShardId::A]);
        assert_eq!(report.total(), 1);
    }

    #[tokio::test]
    async fn test_update_cannot_change_placement_fields() {
        let router = memory_router();
        router.route_insert(CollectionKind::User, vec![user(1, "Beijing")]).await.unwrap();

        let err = router
            .route_update(
                CollectionKind::User,
                &Filter::eq("uid", "1"),
                &Patch::parse(r#"{"region": "Hong Kong"}"#).unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::MalformedFilter(_)));
        assert!(err.to_string().contains("region"));

        let err = router
            .route_update(
                CollectionKind::Read,
                &Filter::eq("id", "r1"),
                &Patch::parse(r#"{"aid": "7"}"#).unwrap(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("aid"));

        let stored = router.route_find(CollectionKind::User, &Filter::eq("uid", "1")).await.unwrap();
        assert_eq!(stored[0]["region"], json!("Beijing"));
    }

    #[tokio::test]
    async fn test_first_match_update_misses_second_shard_copy() {
        let router = memory_router();
        router.registry().shard(ShardId::A).insert_many("User", vec![user(1, "Beijing")]).await.unwrap();
        router.registry().shard(ShardId::B).insert_many("User", vec![user(1, "Beijing")]).await.unwrap();
        let patch = Patch::parse(r#"{"grade": "grade4"}"#).unwrap();

        let report = router.route_update(CollectionKind::User, &Filter::eq("id", "u1"), &patch).await.unwrap();

        assert_eq!(report.total(), 1);
        let stale = router
            .registry()
            .shard(ShardId::B)
            .find("User", &Filter::eq("grade", "grade1"))
            .await
            .unwrap();
        assert_eq!(stale.len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_update_hits_both_shards() {
        let router = memory_router_with(vec![0.0], WritePolicy::Broadcast);
        router.registry().shard(ShardId::A).insert_many("User", vec![user(1, "Beijing")]).await.unwrap();
        router.registry().shard(ShardId::B).insert_many("User", vec![user(1, "Beijing")]).await.unwrap();
        let patch = Patch::parse(r#"{"grade": "grade4"}"#).unwrap();

        let report = router.route_update(CollectionKind::User, &Filter::eq("id", "u1"), &patch).await.unwrap();

        assert_eq!(report.counts, vec![(ShardId::A, 1), (ShardId::B, 1)]);
    }

    #[tokio::test]
    async fn test_delete_uses_first_match() {
        let router = memory_router();
        router
            .route_insert(CollectionKind::User, vec![user(1, "Beijing"), user(2, "Hong Kong")])
            .await
            .unwrap();

        let report = router.route_delete(CollectionKind::User, &Filter::eq("id", "u2")).await.unwrap();
        assert_eq!(report.counts, vec![(ShardId::A, 0), (ShardId::B, 1)]);

        let report = router.route_delete(CollectionKind::User, &Filter::eq("id", "u2")).await.unwrap();
        assert_eq!(report.total(), 0);
    }

    // ============================================================
    // STATUS / CLEAR / AUDIT
    // ============================================================

    #[tokio::test]
    async fn test_status_lists_collections_per_shard() {
        let router = memory_router();
        router.route_insert(CollectionKind::User, vec![user(1, "Beijing")]).await.unwrap();
        router.route_insert(CollectionKind::Article, vec![article(1, "technology")]).await.unwrap();

        let status = router.route_status().await.unwrap();

        assert!(status[&ShardId::A].contains("User"));
        assert!(!status[&ShardId::A].contains("Article"));
        assert!(status[&ShardId::B].contains("Article"));
    }

    #[tokio::test]
    async fn test_clear_empties_both_shards() {
        let router = memory_router();
        router
            .route_insert(CollectionKind::User, vec![user(1, "Beijing"), user(2, "Hong Kong")])
            .await
            .unwrap();

        let cleared = router.route_clear(CollectionKind::User).await.unwrap();

        assert_eq!(cleared.total(), 2);
        assert!(router.route_find(CollectionKind::User, &Filter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audit_reports_misplaced_reads() {
        let router = memory_router();
        router.route_insert(CollectionKind::User, vec![user(1, "Beijing")]).await.unwrap();
        router
            .registry()
            .shard(ShardId::B)
            .insert_many(
                "Read",
                vec![
                    read(1, 1, 1, 1_700_000_000, (false, false, false)),
                    read(2, 99, 1, 1_700_000_000, (false, false, false)),
                ],
            )
            .await
            .unwrap();

        let violations = router.audit_reads().await.unwrap();

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].read_id, "r1");
        assert_eq!(violations[0].user_shard, Some(ShardId::A));
        assert_eq!(violations[1].user_shard, None);
    }
}
