#![cfg(feature = "sqlite")]

use std::sync::Arc;

use sql_model::prelude::*;
use tempfile::tempdir;

fn db_path(name: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(name);
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn lifecycle_errors() -> Result<(), Box<dyn std::error::Error>> {
    let pool = Pool::sqlite();
    assert!(matches!(
        select(&pool, "select 1", &[], None).await,
        Err(SqlModelError::Pool(PoolError::NotInitialized))
    ));
    assert_eq!(pool.shutdown().await, Err(PoolError::NotInitialized));
    assert!(!pool.is_closed());

    let config = PoolConfig::new("", "", db_path("life.db"));
    pool.initialize(config.clone()).await?;
    assert!(pool.is_ready());
    assert!(matches!(
        pool.initialize(config.clone()).await,
        Err(SqlModelError::Pool(PoolError::AlreadyInitialized))
    ));

    pool.shutdown().await?;
    assert!(pool.is_closed());
    assert_eq!(pool.shutdown().await, Err(PoolError::Closed));
    assert!(matches!(
        execute(&pool, "select 1", &[]).await,
        Err(SqlModelError::Pool(PoolError::Closed))
    ));
    assert!(matches!(
        pool.initialize(config).await,
        Err(SqlModelError::Pool(PoolError::Closed))
    ));
    Ok(())
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let pool = Pool::sqlite();
    let res = pool
        .initialize(PoolConfig::new("", "", db_path("cfg.db")).max_size(0))
        .await;
    assert!(matches!(res, Err(SqlModelError::ConfigError(_))));
    assert!(!pool.is_ready());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_tasks_share_a_small_pool() -> Result<(), Box<dyn std::error::Error>> {
    let pool = Pool::sqlite();
    pool.initialize(PoolConfig::new("", "", db_path("shared.db")).max_size(2))
        .await?;
    execute(
        &pool,
        "create table `counter` (`id` integer primary key, `n` integer)",
        &[],
    )
    .await?;

    let schema = Arc::new(
        TableSchema::builder("Counter")
            .table("counter")
            .field("id", Field::integer().primary_key())
            .field("n", Field::integer())
            .bind()?,
    );

    let mut handles = Vec::new();
    for i in 0..40_i64 {
        let pool = pool.clone();
        let schema = Arc::clone(&schema);
        handles.push(tokio::spawn(async move {
            let mut record = Record::new(schema).with("id", i).with("n", i * 2);
            record.save(&pool).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await??, 1);
    }
    assert_eq!(pool.borrowed(), 0);

    let total = schema.count(&pool, "sum(`n`)", None, &[]).await?;
    assert_eq!(total, Some(RowValues::Int((0..40).map(|i| i * 2).sum())));

    pool.shutdown().await?;
    Ok(())
}
