mod common;

use std::sync::Arc;

use docrepo::{memory::InMemoryStore, prelude::*};

use common::{SampleEntity, init_tracing};

fn settings() -> ConnectionSettings {
    ConnectionSettings::new("memory://", "context-tests")
}

#[tokio::test]
async fn uninitialized_context_refuses_collections() {
    init_tracing();
    let context = DbContext::<InMemoryStore>::new();

    assert!(!context.is_initialized().await);
    assert!(matches!(
        context.collection::<SampleEntity>().await,
        Err(DocumentStoreError::NotInitialized)
    ));

    let err = EntityRepository::<SampleEntity, _>::new(&context)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::NotInitialized));
    assert!(err.is_configuration());
}

#[tokio::test]
async fn initialize_without_settings_fails() {
    init_tracing();
    let context = DbContext::<InMemoryStore>::new();

    let err = context.initialize(None::<&ConnectionSettings>).await.unwrap_err();

    assert!(matches!(err, DocumentStoreError::MissingSettings));
    assert!(!context.is_initialized().await);
}

#[tokio::test]
async fn failed_initialize_keeps_the_previous_handle() {
    init_tracing();
    let context = DbContext::<InMemoryStore>::with_settings(&settings()).await.unwrap();
    let repository = EntityRepository::<SampleEntity, _>::new(&context).await.unwrap();
    repository.insert(&mut SampleEntity::named("kept")).await.unwrap();

    assert!(context.initialize(None::<&ConnectionSettings>).await.is_err());

    let again = EntityRepository::<SampleEntity, _>::new(&context).await.unwrap();
    assert_eq!(again.count().await.unwrap(), 1);
}

#[tokio::test]
async fn initialized_context_resolves_collection_by_type_name() {
    init_tracing();
    let context = DbContext::<InMemoryStore>::with_settings(&settings()).await.unwrap();

    let collection = context.collection::<SampleEntity>().await.unwrap();

    assert!(context.is_initialized().await);
    assert_eq!(collection.name(), "SampleEntity");
}

#[tokio::test]
async fn reinitialize_replaces_handle_for_new_repositories_only() {
    init_tracing();
    let context = DbContext::<InMemoryStore>::with_settings(&settings()).await.unwrap();
    let before = EntityRepository::<SampleEntity, _>::new(&context).await.unwrap();
    before.insert(&mut SampleEntity::named("old")).await.unwrap();

    context.initialize(&settings()).await.unwrap();
    let after = EntityRepository::<SampleEntity, _>::new(&context).await.unwrap();

    assert_eq!(after.count().await.unwrap(), 0);
    assert_eq!(before.count().await.unwrap(), 1);

    after.insert(&mut SampleEntity::named("new")).await.unwrap();
    let names = before
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|entity| entity.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["old"]);
}

#[tokio::test]
async fn repositories_from_one_context_share_the_handle() {
    init_tracing();
    let context = DbContext::<InMemoryStore>::with_settings(&settings()).await.unwrap();
    let writer = EntityRepository::<SampleEntity, _>::new(&context).await.unwrap();
    let reader = EntityRepository::<SampleEntity, _>::new(&context).await.unwrap();

    let mut entity = SampleEntity::named("shared");
    writer.insert(&mut entity).await.unwrap();

    assert_eq!(reader.get_single(entity.id).await.unwrap(), Some(entity));
}

#[tokio::test]
async fn backend_handle_acts_as_resolver() {
    init_tracing();
    let backend = Arc::new(InMemoryStore::new());
    let context = DbContext::from_backend(InMemoryStore::new());

    let direct = EntityRepository::<SampleEntity, _>::new(&backend).await.unwrap();
    let through_context = EntityRepository::<SampleEntity, _>::new(&context).await.unwrap();

    assert_eq!(direct.collection_name(), through_context.collection_name());
}

#[tokio::test]
async fn list_and_drop_collections() {
    init_tracing();
    let context = DbContext::<InMemoryStore>::with_settings(&settings()).await.unwrap();
    let repository = EntityRepository::<SampleEntity, _>::new(&context).await.unwrap();
    repository.insert(&mut SampleEntity::named("a")).await.unwrap();

    assert_eq!(context.list_collections().await.unwrap(), vec!["SampleEntity"]);

    context.drop_collection("SampleEntity").await.unwrap();
    context.drop_collection("SampleEntity").await.unwrap();

    assert!(context.list_collections().await.unwrap().is_empty());
    assert_eq!(repository.count().await.unwrap(), 0);
}

#[tokio::test]
async fn shutdown_unbinds_the_context() {
    init_tracing();
    let context = DbContext::<InMemoryStore>::with_settings(&settings()).await.unwrap();

    context.shutdown().await.unwrap();
    context.shutdown().await.unwrap();

    assert!(!context.is_initialized().await);
    assert!(matches!(
        context.list_collections().await,
        Err(DocumentStoreError::NotInitialized)
    ));
}

#[tokio::test]
async fn concurrent_initialize_and_resolve() {
    init_tracing();
    let settings = settings();
    let context = DbContext::<InMemoryStore>::with_settings(&settings).await.unwrap();

    let (initialized, first, second) = tokio::join!(
        context.initialize(&settings),
        EntityRepository::<SampleEntity, _>::new(&context),
        EntityRepository::<SampleEntity, _>::new(&context),
    );

    initialized.unwrap();
    let first = first.unwrap();
    let second = second.unwrap();

    let mut a = SampleEntity::named("a");
    let mut b = SampleEntity::named("b");
    let (a, b) = tokio::join!(first.insert(&mut a), second.insert(&mut b));
    assert!(a.unwrap());
    assert!(b.unwrap());
}

#[tokio::test]
async fn concurrent_inserts_through_one_repository() {
    init_tracing();
    let context = DbContext::<InMemoryStore>::with_settings(&settings()).await.unwrap();
    let repository = EntityRepository::<SampleEntity, _>::new(&context).await.unwrap();

    let mut handles = Vec::new();
    for index in 0..16 {
        let repository = repository.clone();
        handles.push(tokio::spawn(async move {
            let mut entity = SampleEntity::ranked("worker", index);
            repository.insert(&mut entity).await.map(|_| entity.id)
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 16);
    assert_eq!(repository.count().await.unwrap(), 16);
}
