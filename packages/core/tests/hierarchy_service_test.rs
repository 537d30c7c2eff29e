//! Hierarchy Service Integration Tests
//!
//! Drives `HierarchyService` over `MemoryLinkStore` end to end:
//!
//! - Space trees with bound status propagated down mirrored subtrees
//! - Loop verdicts for task links (containment) and folder links (bound-aware)
//! - Guarded writes through `link_checked`, including concurrent requests
//! - Ancestor queries through the upward row expansion

#[cfg(test)]
mod hierarchy_service_tests {
    use anyhow::Result;
    use serde_json::json;
    use spacegraph_core::db::{LinkEvent, MemoryLinkStore};
    use spacegraph_core::{
        BoundFilter, CycleReason, HierarchyConfig, HierarchyError, HierarchyService, LinkRequest,
        NewLink, NodeId, RelationKind, SpaceId,
    };
    use std::collections::HashMap;
    use std::sync::Arc;

    const SPACE: SpaceId = 1;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    async fn folder_links(store: &MemoryLinkStore, links: &[NewLink]) -> Result<()> {
        for link in links {
            store
                .insert_unchecked(RelationKind::Folder, link.clone())
                .await?;
        }
        Ok(())
    }

    /// Space 1: roots 1 and 4, 1 -> 2, 4 -> 5 -> 6
    async fn folder_service() -> Result<HierarchyService<MemoryLinkStore>> {
        init_tracing();
        let store = Arc::new(MemoryLinkStore::new());
        folder_links(
            &store,
            &[
                NewLink::top_level(SPACE, 1),
                NewLink::top_level(SPACE, 4),
                NewLink::child_of(1, 2),
                NewLink::child_of(4, 5),
                NewLink::child_of(5, 6),
            ],
        )
        .await?;
        Ok(HierarchyService::new(store))
    }

    /// Task 1 with children 2 and 3; task 1 has no parent link
    async fn task_service() -> Result<HierarchyService<MemoryLinkStore>> {
        init_tracing();
        let store = Arc::new(MemoryLinkStore::new());
        for link in [NewLink::child_of(1, 2), NewLink::child_of(1, 3)] {
            store.insert_unchecked(RelationKind::Task, link).await?;
        }
        Ok(HierarchyService::new(store))
    }

    #[tokio::test]
    async fn test_task_link_under_sibling_is_safe() -> Result<()> {
        let service = task_service().await?;

        assert!(!service.would_create_cycle(&LinkRequest::task(2, 3)).await?);

        let link = service.link_checked(LinkRequest::task(2, 3)).await?;
        assert_eq!(link.parent_id, Some(2));
        assert_eq!(link.child_id, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_task_link_under_own_descendant_is_rejected() -> Result<()> {
        let service = task_service().await?;

        let verdict = service.check_link(&LinkRequest::task(3, 1)).await?;
        assert_eq!(verdict.reason, Some(CycleReason::DescendantOfChild));

        let err = service
            .link_checked(LinkRequest::task(3, 1))
            .await
            .unwrap_err();
        assert!(err.is_cycle());

        // Nothing was written
        assert_eq!(service.source().links(RelationKind::Task).await.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_self_link_is_rejected_without_rows() -> Result<()> {
        let service = task_service().await?;
        let verdict = service.check_link(&LinkRequest::task(42, 42)).await?;
        assert_eq!(verdict.reason, Some(CycleReason::SelfLink));
        Ok(())
    }

    #[tokio::test]
    async fn test_child_without_links_is_safe() -> Result<()> {
        let service = task_service().await?;
        let verdict = service.check_link(&LinkRequest::task(1, 99)).await?;
        assert!(!verdict.is_cycle());
        Ok(())
    }

    #[tokio::test]
    async fn test_fresh_tasks_link_into_a_chain() -> Result<()> {
        init_tracing();
        let service = HierarchyService::new(Arc::new(MemoryLinkStore::new()));

        let link = service.link_checked(LinkRequest::task(10, 11)).await?;
        assert_eq!((link.parent_id, link.child_id), (Some(10), 11));
        service.link_checked(LinkRequest::task(11, 12)).await?;

        // 10 now roots 11 -> 12, so closing the chain is refused
        let err = service
            .link_checked(LinkRequest::task(12, 10))
            .await
            .unwrap_err();
        assert!(err.is_cycle());
        Ok(())
    }

    #[tokio::test]
    async fn test_space_tree_propagates_bound_status() -> Result<()> {
        let service = folder_service().await?;
        service
            .link_checked(LinkRequest::folder(SPACE, 2, 5).bound())
            .await?;

        let forest = service.space_tree(RelationKind::Folder, SPACE).await?;
        assert_eq!(forest.len(), 2);

        // 1 -> 2 -> 5 (bound) -> 6 (bound by propagation)
        let mirror_six = service
            .find_in_space(RelationKind::Folder, SPACE, 6, BoundFilter::BoundOnly)
            .await?
            .expect("bound copy of 6");
        assert!(mirror_six.is_bound);
        assert_eq!(mirror_six.parent_id, Some(5));

        // 4 -> 5 -> 6 stays primary
        let owned_six = service
            .find_in_space(RelationKind::Folder, SPACE, 6, BoundFilter::UnboundOnly)
            .await?
            .expect("owned copy of 6");
        assert!(!owned_six.is_bound);

        let total: usize = forest.iter().map(|root| root.subtree_size()).sum();
        assert_eq!(total, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_link_under_mirrored_descendant_is_a_cycle() -> Result<()> {
        let service = folder_service().await?;
        service
            .link_checked(LinkRequest::folder(SPACE, 2, 5).bound())
            .await?;

        // 6 sits below 2 through the mirror of 5
        let verdict = service
            .check_link(&LinkRequest::folder(SPACE, 6, 2))
            .await?;
        assert_eq!(verdict.reason, Some(CycleReason::DescendantOfChild));

        let err = service
            .link_checked(LinkRequest::folder(SPACE, 6, 2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HierarchyError::CycleDetected {
                parent_id: 6,
                child_id: 2,
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_owned_link_beside_existing_mirror_is_rejected() -> Result<()> {
        let service = folder_service().await?;
        service
            .link_checked(LinkRequest::folder(SPACE, 2, 5).bound())
            .await?;

        let verdict = service
            .check_link(&LinkRequest::folder(SPACE, 2, 5))
            .await?;
        assert_eq!(verdict.reason, Some(CycleReason::ExistingBoundLink));
        Ok(())
    }

    #[tokio::test]
    async fn test_unrelated_folders_link_safely() -> Result<()> {
        let service = folder_service().await?;
        service
            .link_checked(LinkRequest::folder(SPACE, 2, 5).bound())
            .await?;

        assert!(
            !service
                .would_create_cycle(&LinkRequest::folder(SPACE, 1, 6))
                .await?
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_folder_mirrors_into_another_space() -> Result<()> {
        init_tracing();
        let store = Arc::new(MemoryLinkStore::new());
        folder_links(
            &store,
            &[
                NewLink::top_level(1, 1),
                NewLink::top_level(2, 20),
                NewLink::child_of(20, 21),
            ],
        )
        .await?;
        let service = HierarchyService::new(store);

        let mirror = service
            .link_checked(LinkRequest::folder(1, 1, 20).bound())
            .await?;
        assert!(mirror.is_bound);

        // Space 1 now shows 20 and its subtree as bound under 1
        let forest = service.space_tree(RelationKind::Folder, 1).await?;
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].ids(), vec![1, 20, 21]);
        assert!(forest[0].children[0].children[0].is_bound);

        // Linking 1 below the mirrored 21 from space 2 closes a loop
        let verdict = service.check_link(&LinkRequest::folder(2, 21, 1)).await?;
        assert!(verdict.is_cycle());
        Ok(())
    }

    #[tokio::test]
    async fn test_unscoped_folder_check_uses_both_subtrees() -> Result<()> {
        let service = folder_service().await?;
        service
            .link_checked(LinkRequest::folder(SPACE, 2, 5).bound())
            .await?;

        let unscoped = |parent_id: NodeId, child_id: NodeId| LinkRequest {
            kind: RelationKind::Folder,
            parent_id,
            child_id,
            is_bound: false,
            space_id: None,
        };

        // The containment check passes; only the mirror of 5 under 2 rejects it
        let verdict = service.check_link(&unscoped(2, 5)).await?;
        assert_eq!(verdict.reason, Some(CycleReason::ExistingBoundLink));

        assert!(!service.check_link(&unscoped(1, 6)).await?.is_cycle());
        Ok(())
    }

    #[tokio::test]
    async fn test_subtree_of_missing_root_is_not_found() -> Result<()> {
        let service = folder_service().await?;

        let subtree = service.subtree(RelationKind::Folder, 4).await?;
        assert_eq!(subtree.ids(), vec![4, 5, 6]);

        let missing = service.subtree(RelationKind::Folder, 77).await;
        assert!(matches!(missing, Err(HierarchyError::NotFound { id: 77 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_opposite_links_admit_exactly_one() -> Result<()> {
        init_tracing();
        let service = Arc::new(HierarchyService::new(Arc::new(MemoryLinkStore::new())));

        let forward = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.link_checked(LinkRequest::task(10, 11)).await })
        };
        let backward = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.link_checked(LinkRequest::task(11, 10)).await })
        };

        let results = [forward.await?, backward.await?];
        let created = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_cycle()))
            .count();

        assert_eq!(created, 1);
        assert_eq!(rejected, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_committed_link_is_broadcast() -> Result<()> {
        let service = task_service().await?;
        let mut events = service.source().subscribe();

        let link = service.link_checked(LinkRequest::task(2, 3)).await?;

        match events.recv().await? {
            LinkEvent::LinkCreated { kind, link: sent } => {
                assert_eq!(kind, RelationKind::Task);
                assert_eq!(sent, link);
            }
            other => panic!("unexpected event {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_ownership_reaches_through_mirrors() -> Result<()> {
        let service = folder_service().await?;
        service
            .link_checked(LinkRequest::folder(SPACE, 2, 5).bound())
            .await?;

        let owners: HashMap<NodeId, &str> = [(1, "ada"), (4, "bob")].into_iter().collect();

        // 6 <- 5 <- {4, 2 (bound)} and 2 <- 1
        assert!(
            service
                .has_qualifying_ancestor(RelationKind::Folder, 6, |step| {
                    owners.get(&step.node_id) == Some(&"bob")
                })
                .await?
        );
        assert!(
            service
                .has_qualifying_ancestor(RelationKind::Folder, 6, |step| {
                    owners.get(&step.node_id) == Some(&"ada")
                })
                .await?
        );

        let primary_only = HierarchyService::with_config(
            Arc::clone(service.source()),
            HierarchyConfig::from_json(&json!({ "includeBoundAncestors": false }).to_string())?,
        );
        assert!(
            !primary_only
                .has_qualifying_ancestor(RelationKind::Folder, 6, |step| {
                    owners.get(&step.node_id) == Some(&"ada")
                })
                .await?
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_ancestor_walk_terminates_on_seeded_loop() -> Result<()> {
        init_tracing();
        let store = Arc::new(MemoryLinkStore::new());
        // Seeded without checks: 1 -> 2 -> 3 -> 1
        folder_links(
            &store,
            &[
                NewLink::top_level(SPACE, 1),
                NewLink::child_of(1, 2),
                NewLink::child_of(2, 3),
                NewLink::child_of(3, 1),
            ],
        )
        .await?;
        let service = HierarchyService::new(store);

        let mut visits = 0;
        let found = service
            .has_qualifying_ancestor(RelationKind::Folder, 3, |_| {
                visits += 1;
                false
            })
            .await?;
        assert!(!found);
        assert_eq!(visits, 3);
        Ok(())
    }
}
