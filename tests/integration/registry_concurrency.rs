use nodedb::schema::{ensure_meta_collections, NODE_META, NODE_TYPES};
use nodedb::{CollectionRegistry, Engine, LegacyComparator, StoreError};
use std::sync::{Arc, Barrier};
use std::thread;

fn engine() -> Engine {
    let engine = Engine::in_memory("concurrency.db", Arc::new(LegacyComparator));
    ensure_meta_collections(&engine).unwrap();
    engine
}

#[test]
fn concurrent_resolution_of_same_type_yields_one_entry() {
    let engine = engine();
    let barrier = Barrier::new(8);

    let names: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    CollectionRegistry::new(&engine)
                        .resolve_collection_for_type("Post")
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(names.iter().all(|n| n == "gatsby:nodeType:Post"));
    assert_eq!(engine.count(NODE_TYPES).unwrap(), 1);
    assert_eq!(engine.collection_names().len(), 3);
}

#[test]
fn concurrent_conflicting_ids_have_one_winner() {
    let engine = engine();
    let barrier = Barrier::new(6);

    let results: Vec<Result<(), StoreError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let engine = &engine;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    CollectionRegistry::new(engine)
                        .record_collection_for_id("shared", &format!("gatsby:nodeType:T{}", i))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, StoreError::DuplicateId { .. })));
    assert_eq!(engine.count(NODE_META).unwrap(), 1);
}

#[test]
fn distinct_types_resolve_in_parallel() {
    let engine = engine();

    thread::scope(|scope| {
        for i in 0..10 {
            let engine = &engine;
            scope.spawn(move || {
                let registry = CollectionRegistry::new(engine);
                let type_name = format!("Type{}", i);
                let name = registry.resolve_collection_for_type(&type_name).unwrap();
                registry
                    .record_collection_for_id(&format!("id-{}", i), &name)
                    .unwrap();
            });
        }
    });

    assert_eq!(engine.count(NODE_TYPES).unwrap(), 10);
    assert_eq!(engine.count(NODE_META).unwrap(), 10);
    let registry = CollectionRegistry::new(&engine);
    assert_eq!(
        registry.lookup_collection_for_id("id-7").unwrap(),
        Some("gatsby:nodeType:Type7".to_string())
    );
}
