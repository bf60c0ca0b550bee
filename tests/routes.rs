// ABOUTME: Integration tests for the route configuration store.
// ABOUTME: Snapshot/restore round-trips, atomic writes, router discovery.

use std::collections::BTreeMap;
use std::fs;

use proptest::prelude::*;
use relevo::routes::{Router, RouteDocument, RouteStore, ServiceWeight, Weighted, WeightedService};
use relevo::types::ServiceName;

fn doc_with_router(router: &str, rule: &str, service: &str) -> RouteDocument {
    let mut routers = BTreeMap::new();
    routers.insert(
        router.to_string(),
        Router {
            rule: rule.to_string(),
            service: service.to_string(),
            entry_points: vec!["https".to_string()],
        },
    );
    RouteDocument {
        routers,
        services: BTreeMap::new(),
    }
}

#[test]
fn snapshot_restore_round_trip_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes.yml");
    let store = RouteStore::new(&path);
    store
        .write(&doc_with_router("web", "Host(`a.example.com`)", "app-v1"))
        .unwrap();
    let before = fs::read(&path).unwrap();

    let snapshot = store.snapshot().unwrap();
    let new = ServiceName::new("app-v2").unwrap();
    let old = ServiceName::new("app-v1").unwrap();
    let shifted = store
        .read()
        .unwrap()
        .with_canary_split("web", &old, &new, 90, 10);
    store.write(&shifted).unwrap();

    store.restore(&snapshot).unwrap();
    assert_eq!(fs::read(&path).unwrap(), before);
    snapshot.discard();
}

#[test]
fn canary_write_is_observable_before_validation_would_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes.yml");
    let store = RouteStore::new(&path);
    store
        .write(&doc_with_router("web", "Host(`a.example.com`)", "app-v1"))
        .unwrap();

    let old = ServiceName::new("app-v1").unwrap();
    let new = ServiceName::new("app-v2").unwrap();
    let canary = store.read().unwrap().with_canary_split("web", &old, &new, 90, 10);
    store.write(&canary).unwrap();

    // A fresh read of the document sees the durable canary state.
    let reread = store.read().unwrap();
    assert_eq!(reread.routers["web"].service, "web-canary");
    let weights = &reread.services["web-canary"].weighted.services;
    assert_eq!(
        (weights[0].weight, weights[1].weight),
        (90, 10)
    );
}

#[test]
fn discovery_follows_the_live_router_name() {
    let doc = doc_with_router("edge-router", "Host(`b.example.com`)", "svc-old");
    let old = ServiceName::new("svc-old").unwrap();
    assert_eq!(doc.discover_router(&old), Some("edge-router"));
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,10}[a-z0-9]"
}

fn document_strategy() -> impl Strategy<Value = RouteDocument> {
    let router = (name_strategy(), name_strategy(), prop::collection::vec(name_strategy(), 0..3))
        .prop_map(|(rule_host, service, entry_points)| Router {
            rule: format!("Host(`{rule_host}.example.com`)"),
            service,
            entry_points,
        });
    let weighted = prop::collection::vec((name_strategy(), 0u32..1000), 1..4).prop_map(|pairs| {
        WeightedService {
            weighted: Weighted {
                services: pairs
                    .into_iter()
                    .map(|(name, weight)| ServiceWeight { name, weight })
                    .collect(),
            },
        }
    });
    (
        prop::collection::btree_map(name_strategy(), router, 1..4),
        prop::collection::btree_map(name_strategy(), weighted, 0..3),
    )
        .prop_map(|(routers, services)| RouteDocument { routers, services })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_document_survives_snapshot_and_restore(doc in document_strategy()) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.yml");
        let store = RouteStore::new(&path);
        store.write(&doc).unwrap();
        let before = fs::read(&path).unwrap();

        let snapshot = store.snapshot().unwrap();
        fs::write(&path, "routers: {}\n").unwrap();
        store.restore(&snapshot).unwrap();

        prop_assert_eq!(fs::read(&path).unwrap(), before);
        prop_assert_eq!(store.read().unwrap(), doc);
    }

    #[test]
    fn write_read_round_trips_any_document(doc in document_strategy()) {
        let dir = tempfile::tempdir().unwrap();
        let store = RouteStore::new(dir.path().join("routes.yml"));
        store.write(&doc).unwrap();
        prop_assert_eq!(store.read().unwrap(), doc);
    }
}
