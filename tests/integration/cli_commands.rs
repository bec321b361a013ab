use nodedb::cli::{CliContext, Commands};
use nodedb::StartOptions;
use tempfile::TempDir;

#[tokio::test]
async fn register_persists_across_cli_invocations() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store").join("db.json");

    let ctx = CliContext::open(StartOptions::with_save_file(&path))
        .await
        .unwrap();
    let out = ctx
        .execute(&Commands::Register {
            type_name: "Post".to_string(),
            id: Some("p1".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(out, "gatsby:nodeType:Post");
    assert!(path.exists());
    drop(ctx);

    let ctx = CliContext::open(StartOptions::with_save_file(&path))
        .await
        .unwrap();
    let out = ctx
        .execute(&Commands::LookupId {
            id: "p1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(out, "gatsby:nodeType:Post");

    let out = ctx.execute(&Commands::Collections).await.unwrap();
    assert!(out.contains("gatsby:nodeMeta"));
    assert!(out.contains("gatsby:nodeType:Post"));

    let out = ctx
        .execute(&Commands::Types {
            format: "text".to_string(),
        })
        .await
        .unwrap();
    assert!(out.contains("Post"));
}

#[tokio::test]
async fn forget_then_lookup_reports_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db.json");

    let ctx = CliContext::open(StartOptions::with_save_file(&path))
        .await
        .unwrap();
    ctx.execute(&Commands::Register {
        type_name: "Post".to_string(),
        id: Some("p1".to_string()),
    })
    .await
    .unwrap();
    let out = ctx
        .execute(&Commands::Forget {
            id: "p1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(out, "forgot p1");
    drop(ctx);

    let ctx = CliContext::open(StartOptions::with_save_file(&path))
        .await
        .unwrap();
    let out = ctx
        .execute(&Commands::LookupId {
            id: "p1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(out, "not found: p1");
    let out = ctx
        .execute(&Commands::LookupType {
            type_name: "Post".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(out, "gatsby:nodeType:Post");
}
