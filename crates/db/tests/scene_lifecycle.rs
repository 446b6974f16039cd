//! Integration tests for scene registration and scheme evolution.
//!
//! Exercises `SceneService` and `PgSchemeStore` against a real database:
//! - Scene creation writes version 1 in the same transaction
//! - Validating a candidate for an unknown scene is `NotFound`
//! - New versions are numbered `current + 1` and flagged when breaking
//! - Candidate previews never write
//! - A stale pointer loses the append with `Conflict`
//! - Deleting a scene cascades to its versions

use assert_matches::assert_matches;
use chamberlain_core::error::CoreError;
use chamberlain_core::scene::{AvailableCondition, ConflictStrategy};
use chamberlain_core::scheme_version::{
    plan_initial_version, plan_next_version, SchemeStatus, SchemeStore,
    INITIAL_CHANGE_DESCRIPTION,
};
use chamberlain_db::error::DbError;
use chamberlain_db::models::scene::{CreateScene, UpdateScene, UpdateScheme};
use chamberlain_db::services::SceneService;
use chamberlain_db::store::PgSchemeStore;
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn base_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "f1": { "type": "string" } }
    })
}

fn new_scene(id: &str) -> CreateScene {
    CreateScene {
        id: id.to_string(),
        name: format!("Scene {id}"),
        description: None,
        available_conditions: vec![AvailableCondition {
            key: "environment".to_string(),
            name: "Environment".to_string(),
            description: None,
            value_type: Some("string".to_string()),
        }],
        condition_conflict_strategy: None,
        schema: base_schema(),
    }
}

fn scheme(schema: Value) -> UpdateScheme {
    UpdateScheme {
        schema,
        change_description: None,
    }
}

async fn version_count(pool: &PgPool, scene_id: &str) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scheme_versions WHERE scene_id = $1")
        .bind(scene_id)
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}

// ---------------------------------------------------------------------------
// Scene creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_create_scene_writes_initial_version(pool: PgPool) {
    let detail = SceneService::create(&pool, &new_scene("payment")).await.unwrap();

    assert_eq!(detail.scene.current_scheme_version, 1);
    assert_eq!(detail.scene.conflict_strategy().unwrap(), ConflictStrategy::Priority);
    assert_eq!(detail.scene.available_conditions.len(), 1);
    assert_eq!(detail.current_scheme.version, 1);
    assert_eq!(detail.current_scheme.status, SchemeStatus::Active);
    assert!(!detail.current_scheme.is_breaking_change);
    assert_eq!(
        detail.current_scheme.change_description.as_deref(),
        Some(INITIAL_CHANGE_DESCRIPTION)
    );
    assert_eq!(detail.current_scheme.schema_json, base_schema());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_duplicate_scene_conflicts(pool: PgPool) {
    SceneService::create(&pool, &new_scene("payment")).await.unwrap();
    let result = SceneService::create(&pool, &new_scene("payment")).await;
    assert_matches!(result, Err(DbError::Core(CoreError::Conflict(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_with_invalid_schema_writes_nothing(pool: PgPool) {
    let mut input = new_scene("payment");
    input.schema = json!({ "properties": [] });

    let result = SceneService::create(&pool, &input).await;
    assert_matches!(result, Err(DbError::Core(CoreError::InvalidSchema(_))));
    assert_matches!(
        SceneService::get(&pool, "payment").await,
        Err(DbError::Core(CoreError::NotFound { entity: "Scene", .. }))
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_rejects_bad_scene_id(pool: PgPool) {
    let result = SceneService::create(&pool, &new_scene("Bad-Id")).await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(_))));
}

// ---------------------------------------------------------------------------
// Scheme versions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_update_scheme_allocates_next_version(pool: PgPool) {
    SceneService::create(&pool, &new_scene("payment")).await.unwrap();

    let additive = json!({
        "type": "object",
        "properties": { "f1": { "type": "string" }, "f2": { "type": "integer" } }
    });
    let v2 = SceneService::update_scheme(
        &pool,
        "payment",
        UpdateScheme {
            schema: additive,
            change_description: Some("add f2".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(v2.version, 2);
    assert!(!v2.is_breaking_change);

    let v3 = SceneService::update_scheme(&pool, "payment", scheme(json!({ "type": "object" })))
        .await
        .unwrap();
    assert_eq!(v3.version, 3);
    assert!(v3.is_breaking_change);

    let detail = SceneService::get(&pool, "payment").await.unwrap();
    assert_eq!(detail.scene.current_scheme_version, 3);
    assert_eq!(detail.current_scheme.id, v3.id);

    let versions = SceneService::scheme_versions(&pool, "payment").await.unwrap();
    let numbers: Vec<i32> = versions.iter().map(|v| v.version).collect();
    assert_eq!(numbers, vec![3, 2, 1]);
    assert!(versions.iter().all(|v| v.status == SchemeStatus::Active));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_scheme_unknown_scene_not_found(pool: PgPool) {
    let result = SceneService::update_scheme(&pool, "ghost", scheme(base_schema())).await;
    assert_matches!(result, Err(DbError::Core(CoreError::NotFound { .. })));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_scheme_invalid_schema_keeps_pointer(pool: PgPool) {
    SceneService::create(&pool, &new_scene("payment")).await.unwrap();

    let result = SceneService::update_scheme(&pool, "payment", scheme(json!([1, 2]))).await;
    assert_matches!(result, Err(DbError::Core(CoreError::InvalidSchema(_))));
    assert_eq!(version_count(&pool, "payment").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_validate_scheme_reports_without_writing(pool: PgPool) {
    SceneService::create(&pool, &new_scene("payment")).await.unwrap();

    let report = SceneService::validate_scheme(
        &pool,
        "payment",
        &json!({ "type": "object", "properties": {}, "required": ["f9"] }),
    )
    .await
    .unwrap();
    assert!(report.valid);
    assert!(report.is_breaking_change);
    assert_eq!(
        report.warnings,
        vec!["field 'f1' was removed", "field 'f9' is now required"]
    );

    let invalid = SceneService::validate_scheme(&pool, "payment", &json!("nope"))
        .await
        .unwrap();
    assert!(!invalid.valid);
    assert_eq!(invalid.warnings, vec!["schema invalid"]);

    assert_eq!(version_count(&pool, "payment").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_validate_scheme_unknown_scene_not_found(pool: PgPool) {
    let result = SceneService::validate_scheme(&pool, "ghost", &json!("nope")).await;
    assert_matches!(
        result,
        Err(DbError::Core(CoreError::NotFound { entity: "Scene", .. }))
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_append_with_stale_pointer_conflicts(pool: PgPool) {
    SceneService::create(&pool, &new_scene("payment")).await.unwrap();
    let store = PgSchemeStore::new(pool.clone());
    let v1 = store.find_version("payment", 1).await.unwrap().unwrap();

    let first = plan_next_version(&v1, base_schema(), None);
    store.append("payment", 1, first).await.unwrap();

    let stale = plan_next_version(&v1, base_schema(), None);
    let result = store.append("payment", 1, stale).await;
    assert_matches!(result, Err(CoreError::Conflict(_)));

    assert_eq!(store.current_pointer("payment").await.unwrap(), 2);
    assert_eq!(version_count(&pool, "payment").await, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_store_registers_scene_with_version_one(pool: PgPool) {
    let store = PgSchemeStore::new(pool.clone());
    let initial = plan_initial_version(base_schema()).unwrap();

    let (scene, version) = store
        .create_scene(&new_scene("payment"), initial.clone())
        .await
        .unwrap();
    assert_eq!(scene.current_scheme_version, version.version);
    assert_eq!(store.current_pointer("payment").await.unwrap(), 1);

    // A racing registration of the same id loses on the primary key.
    let result = store.create_scene(&new_scene("payment"), initial).await;
    assert_matches!(result, Err(CoreError::Conflict(_)));
    assert_eq!(version_count(&pool, "payment").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_scheme_updates_get_distinct_numbers(pool: PgPool) {
    SceneService::create(&pool, &new_scene("payment")).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            SceneService::update_scheme(&pool, "payment", scheme(base_schema())).await
        }));
    }
    let mut created = Vec::new();
    for handle in handles {
        if let Ok(version) = handle.await.unwrap() {
            created.push(version.version);
        }
    }
    created.sort_unstable();
    created.dedup();

    let versions = SceneService::scheme_versions(&pool, "payment").await.unwrap();
    let mut stored: Vec<i32> = versions.iter().map(|v| v.version).collect();
    stored.sort_unstable();
    assert_eq!(stored, (1..=stored.len() as i32).collect::<Vec<_>>());
    assert_eq!(created.len(), stored.len() - 1);

    let detail = SceneService::get(&pool, "payment").await.unwrap();
    assert_eq!(detail.scene.current_scheme_version, *stored.last().unwrap());
}

// ---------------------------------------------------------------------------
// Metadata and deletion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_update_scene_metadata(pool: PgPool) {
    SceneService::create(&pool, &new_scene("payment")).await.unwrap();

    let updated = SceneService::update(
        &pool,
        "payment",
        &UpdateScene {
            name: Some("Payments".into()),
            condition_conflict_strategy: Some(ConflictStrategy::BestMatch),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Payments");
    assert_eq!(updated.conflict_strategy().unwrap(), ConflictStrategy::BestMatch);
    assert_eq!(updated.current_scheme_version, 1);
    assert_eq!(updated.available_conditions.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_scene_rejects_blank_name(pool: PgPool) {
    SceneService::create(&pool, &new_scene("payment")).await.unwrap();
    let result = SceneService::update(
        &pool,
        "payment",
        &UpdateScene {
            name: Some("  ".into()),
            ..Default::default()
        },
    )
    .await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_scene_cascades(pool: PgPool) {
    SceneService::create(&pool, &new_scene("payment")).await.unwrap();
    SceneService::create(&pool, &new_scene("shipping")).await.unwrap();

    SceneService::delete(&pool, "payment").await.unwrap();
    assert_eq!(version_count(&pool, "payment").await, 0);

    let remaining = SceneService::list(&pool).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "shipping");

    assert_matches!(
        SceneService::delete(&pool, "payment").await,
        Err(DbError::Core(CoreError::NotFound { .. }))
    );
}
