use nodedb::schema::{NODE_META, NODE_TYPES};
use nodedb::{StartOptions, StoreError, StoreSession};
use tempfile::TempDir;

const TYPES: [&str; 4] = ["Post", "Author", "Tag", "MarkdownRemark"];

#[tokio::test]
async fn mappings_survive_save_and_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache").join("db.json");

    let mut expected = Vec::new();
    {
        let mut session = StoreSession::new();
        session
            .start(StartOptions::with_save_file(&path))
            .await
            .unwrap();
        let registry = session.registry().unwrap();
        for (i, type_name) in TYPES.iter().cycle().take(20).enumerate() {
            let id = format!("node-{}", i);
            let collection = registry.register_node(&id, type_name).unwrap();
            expected.push((id, type_name.to_string(), collection));
        }
        session.save().await.unwrap();
    }

    let mut session = StoreSession::new();
    session
        .start(StartOptions::with_save_file(&path))
        .await
        .unwrap();
    let registry = session.registry().unwrap();

    for (id, type_name, collection) in &expected {
        assert_eq!(
            registry.lookup_collection_for_id(id).unwrap().as_ref(),
            Some(collection)
        );
        assert_eq!(
            registry.lookup_collection_for_type(type_name).unwrap().as_ref(),
            Some(collection)
        );
    }

    let engine = session.handle().unwrap();
    assert_eq!(engine.count(NODE_META).unwrap(), 20);
    assert_eq!(engine.count(NODE_TYPES).unwrap(), TYPES.len());
    for type_name in TYPES {
        assert!(engine.has_collection(&format!("gatsby:nodeType:{}", type_name)));
    }
}

#[tokio::test]
async fn constraints_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db.json");

    let mut session = StoreSession::new();
    session
        .start(StartOptions::with_save_file(&path))
        .await
        .unwrap();
    session
        .registry()
        .unwrap()
        .register_node("1", "Post")
        .unwrap();
    session.save().await.unwrap();

    let mut session = StoreSession::new();
    session
        .start(StartOptions::with_save_file(&path))
        .await
        .unwrap();
    let registry = session.registry().unwrap();

    let err = registry
        .record_collection_for_id("1", "gatsby:nodeType:Page")
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId { .. }));
    assert_eq!(
        registry.resolve_collection_for_type("Post").unwrap(),
        "gatsby:nodeType:Post"
    );
    assert_eq!(session.handle().unwrap().count(NODE_TYPES).unwrap(), 1);
}

#[tokio::test]
async fn unsaved_changes_are_not_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db.json");

    let mut session = StoreSession::new();
    session
        .start(StartOptions::with_save_file(&path))
        .await
        .unwrap();
    session.save().await.unwrap();
    session
        .registry()
        .unwrap()
        .register_node("late", "Post")
        .unwrap();

    let mut reopened = StoreSession::new();
    reopened
        .start(StartOptions::with_save_file(&path))
        .await
        .unwrap();
    let registry = reopened.registry().unwrap();
    assert_eq!(registry.lookup_collection_for_id("late").unwrap(), None);
    assert_eq!(registry.lookup_collection_for_type("Post").unwrap(), None);
}

#[tokio::test]
async fn fresh_store_has_empty_meta_collections() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("x").join("db.json");
    assert!(!path.parent().unwrap().exists());

    let mut session = StoreSession::new();
    session
        .start(StartOptions::with_save_file(&path))
        .await
        .unwrap();

    assert!(path.parent().unwrap().is_dir());
    let engine = session.handle().unwrap();
    assert_eq!(engine.count(NODE_META).unwrap(), 0);
    assert_eq!(engine.count(NODE_TYPES).unwrap(), 0);
    assert_eq!(
        session
            .registry()
            .unwrap()
            .lookup_collection_for_id("missing")
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn in_memory_save_is_rejected() {
    let mut session = StoreSession::new();
    session.start(StartOptions::in_memory()).await.unwrap();
    session
        .registry()
        .unwrap()
        .register_node("1", "Post")
        .unwrap();

    let err = session.save().await.unwrap_err();
    assert!(matches!(err, StoreError::NoActiveDatabase(_)));
}
