#![cfg(feature = "sqlite")]

use std::sync::Arc;

use sql_model::prelude::*;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

async fn open_pool(prefix: &str, max_size: usize) -> Result<Pool, SqlModelError> {
    let pool = Pool::sqlite();
    pool.initialize(
        PoolConfig::new("", "", unique_db_path(prefix))
            .max_size(max_size)
            .min_size(1),
    )
    .await?;
    execute(
        &pool,
        "create table `users` (`id` integer primary key, `name` varchar(100), \
         `email` varchar(100), `password` varchar(100), `admin` boolean, `score` real)",
        &[],
    )
    .await?;
    Ok(pool)
}

fn users() -> Arc<TableSchema> {
    Arc::new(
        TableSchema::builder("User")
            .table("users")
            .field("id", Field::integer().primary_key())
            .field("name", Field::string())
            .field("email", Field::string())
            .field("password", Field::string())
            .field("admin", Field::boolean().with_default(false))
            .field("score", Field::float().default_with(|| RowValues::Float(1.5)))
            .bind()
            .expect("valid schema"),
    )
}

fn user(schema: &Arc<TableSchema>, id: i64, name: &str) -> Record {
    Record::new(Arc::clone(schema))
        .with("id", id)
        .with("name", name)
        .with("email", format!("{name}@x.com"))
        .with("password", "pw")
}

#[tokio::test]
async fn save_find_delete_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let pool = open_pool("round_trip", 2).await?;
    let schema = users();

    let mut record = user(&schema, 42, "a");
    assert_eq!(record.save(&pool).await?, 1);

    let found = schema.find_by_key(&pool, 42).await?.expect("saved row");
    assert_eq!(found.get_as::<i64>("id")?, 42);
    assert_eq!(found.get_as::<String>("name")?, "a");
    assert_eq!(found.get_as::<String>("email")?, "a@x.com");
    assert_eq!(found.get_as::<String>("password")?, "pw");
    assert_eq!(found, record);

    assert_eq!(record.delete(&pool).await?, 1);
    assert!(schema.find_by_key(&pool, 42).await?.is_none());

    pool.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn omitted_fields_get_materialized_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let pool = open_pool("defaults", 2).await?;
    let schema = users();

    let mut record = Record::new(Arc::clone(&schema)).with("id", 7).with("name", "d");
    record.save(&pool).await?;
    assert_eq!(record.get("admin")?, &RowValues::Bool(false));
    assert_eq!(record.get("score")?, &RowValues::Float(1.5));
    assert_eq!(record.get("email")?, &RowValues::Null);
    assert_eq!(record.get("password")?, &RowValues::Null);

    let found = schema.find_by_key(&pool, 7).await?.expect("saved row");
    assert_eq!(found.get("admin")?, &RowValues::Bool(false));
    assert_eq!(found.get("score")?, &RowValues::Float(1.5));
    assert!(found.get("email")?.is_null());
    assert_eq!(found, record);

    pool.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn update_changes_only_non_key_columns() -> Result<(), Box<dyn std::error::Error>> {
    let pool = open_pool("update", 2).await?;
    let schema = users();

    let mut record = user(&schema, 3, "before");
    record.save(&pool).await?;
    record.set("name", "after");
    record.set("admin", true);
    assert_eq!(record.update(&pool).await?, 1);

    let found = schema.find_by_key(&pool, 3).await?.expect("row");
    assert_eq!(found.get_as::<i64>("id")?, 3);
    assert_eq!(found.get_as::<String>("name")?, "after");
    assert_eq!(found.get_as::<bool>("admin")?, true);

    // A key that matches nothing is not an error, just zero affected rows.
    let missing = user(&schema, 999, "ghost");
    assert_eq!(missing.update(&pool).await?, 0);
    assert_eq!(missing.delete(&pool).await?, 0);

    pool.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn save_without_key_is_rejected_before_dispatch() -> Result<(), Box<dyn std::error::Error>> {
    let pool = open_pool("no_key", 1).await?;
    let mut record = Record::new(users()).with("name", "nokey");
    let err = record.save(&pool).await.unwrap_err();
    assert!(matches!(
        err,
        SqlModelError::Value(ValueError::NoSuchAttribute(ref col)) if col == "id"
    ));
    pool.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn find_all_orders_filters_and_limits() -> Result<(), Box<dyn std::error::Error>> {
    let pool = open_pool("find_all", 2).await?;
    let schema = users();
    for id in 1..=12 {
        let mut record = user(&schema, id, &format!("u{id:02}"));
        record.set("admin", id % 3 == 0);
        record.save(&pool).await?;
    }

    let all = schema.find_all(&pool, &FindOptions::new()).await?;
    assert_eq!(all.len(), 12);

    let first_five = schema
        .find_all(&pool, &FindOptions::new().order_by("`id`").limit(5))
        .await?;
    let ids: Vec<i64> = first_five
        .iter()
        .map(|r| r.get_as::<i64>("id"))
        .collect::<Result<_, _>>()?;
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    let page = schema
        .find_all(&pool, &FindOptions::new().order_by("`id`").limit_range(10, 5))
        .await?;
    let ids: Vec<i64> = page
        .iter()
        .map(|r| r.get_as::<i64>("id"))
        .collect::<Result<_, _>>()?;
    assert_eq!(ids, vec![11, 12]);

    let admins = schema
        .find_all(
            &pool,
            &FindOptions::new()
                .filter("`admin`=?", vec![RowValues::Bool(true)])
                .order_by("`id` desc"),
        )
        .await?;
    let ids: Vec<i64> = admins
        .iter()
        .map(|r| r.get_as::<i64>("id"))
        .collect::<Result<_, _>>()?;
    assert_eq!(ids, vec![12, 9, 6, 3]);

    let bad = schema
        .find_all(
            &pool,
            &FindOptions::new().limit_values(vec![RowValues::Text("bad".into())]),
        )
        .await;
    assert!(matches!(
        bad,
        Err(SqlModelError::Value(ValueError::InvalidLimit(_)))
    ));

    pool.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn find_all_by_and_count() -> Result<(), Box<dyn std::error::Error>> {
    let pool = open_pool("find_by", 2).await?;
    let schema = users();
    for (id, name) in [(1, "xh"), (2, "xiong"), (3, "xh")] {
        user(&schema, id, name).save(&pool).await?;
    }

    let matches = schema
        .find_all_by(&pool, &[("name", "xh".into()), ("password", "pw".into())])
        .await?;
    assert_eq!(matches.len(), 2);

    let unknown = schema.find_all_by(&pool, &[("nickname", "xh".into())]).await;
    assert!(matches!(
        unknown,
        Err(SqlModelError::Value(ValueError::UnknownColumn { .. }))
    ));

    let total = schema.count(&pool, "count(`id`)", None, &[]).await?;
    assert_eq!(total, Some(RowValues::Int(3)));

    let named = schema
        .count(&pool, "count(*)", Some("`name`=?"), &["xh".into()])
        .await?;
    assert_eq!(named, Some(RowValues::Int(2)));

    pool.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn driver_errors_pass_through_and_release_the_connection()
-> Result<(), Box<dyn std::error::Error>> {
    // A single connection: if the failed insert leaked it, the next call would hang.
    let pool = open_pool("dupe", 1).await?;
    let schema = users();

    user(&schema, 1, "first").save(&pool).await?;
    let err = user(&schema, 1, "again").save(&pool).await.unwrap_err();
    assert!(matches!(err, SqlModelError::Driver(_)));
    assert_eq!(pool.borrowed(), 0);

    let found = schema.find_by_key(&pool, 1).await?.expect("row");
    assert_eq!(found.get_as::<String>("name")?, "first");

    pool.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn non_autocommit_statements_commit_individually() -> Result<(), Box<dyn std::error::Error>>
{
    let pool = Pool::sqlite();
    pool.initialize(PoolConfig::new("", "", unique_db_path("txn")).autocommit(false))
        .await?;
    execute(&pool, "create table `t` (`id` integer primary key)", &[]).await?;
    assert_eq!(execute(&pool, "insert into `t` (`id`) values (?)", &[1.into()]).await?, 1);
    assert!(
        execute(&pool, "insert into `t` (`id`) values (?)", &[1.into()])
            .await
            .is_err()
    );

    let rows = select(&pool, "select count(*) as n from `t`", &[], None).await?;
    assert_eq!(rows[0].get("n"), Some(&RowValues::Int(1)));

    pool.shutdown().await?;
    Ok(())
}
