//! Runs against a live PostgreSQL server only when YELP_TEST_PG_HOST is set,
//! e.g. `YELP_TEST_PG_HOST=localhost cargo test --test postgres_load`.
//! The remaining YELP_TEST_PG_* variables default to postgres/postgres/yelp.

use serde_json::json;
use std::fs;
use std::path::PathBuf;
use yelp_loader::db::{connect, Destination};
use yelp_loader::{run_load, ConnectionParams, Dataset, LoadError, LoadOptions};

fn test_params() -> Option<ConnectionParams> {
    let host = std::env::var("YELP_TEST_PG_HOST").ok()?;
    let var = |key: &str, default: &str| Some(std::env::var(key).unwrap_or_else(|_| default.to_string()));
    Some(ConnectionParams {
        host: Some(host),
        port: var("YELP_TEST_PG_PORT", "5432"),
        user: var("YELP_TEST_PG_USER", "postgres"),
        password: var("YELP_TEST_PG_PASSWORD", "postgres"),
        database: var("YELP_TEST_PG_NAME", "yelp"),
        schema: var("YELP_TEST_PG_SCHEMA", "public"),
        driver: Some("postgresql".to_string()),
    })
}

fn write_reviews(lines: &[String]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("yelp_pg_review_{}.json", uuid::Uuid::new_v4()));
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn review_line(i: usize) -> String {
    json!({
        "review_id": format!("pg-rev-{}", i),
        "user_id": "u1",
        "business_id": "b1",
        "stars": 4,
        "useful": 1,
        "funny": 0,
        "cool": 0,
        "text": "Solid brunch",
        "date": "2019-02-14 08:30:00"
    })
    .to_string()
}

#[tokio::test]
async fn test_postgres_replace_is_idempotent() {
    let Some(params) = test_params() else {
        println!("YELP_TEST_PG_HOST not set, skipping");
        return;
    };

    let lines: Vec<String> = (0..2_500).map(review_line).collect();
    let source = write_reviews(&lines);
    let options = LoadOptions {
        batch_size: 1_000,
        ..Default::default()
    };

    for _ in 0..2 {
        let report = run_load(&params, Dataset::Review, &source, options.clone(), |_| {})
            .await
            .unwrap();
        assert_eq!(report.batches, 3);
        assert_eq!(report.rows, 2_500);
    }

    let mut destination = connect(&params).await.unwrap().unwrap();
    assert_eq!(destination.count_rows("raw_yelp_review").await.unwrap(), 2_500);
    destination.close().await.unwrap();
    fs::remove_file(source).ok();
}

#[tokio::test]
async fn test_postgres_bad_integer_is_load_failure() {
    let Some(params) = test_params() else {
        println!("YELP_TEST_PG_HOST not set, skipping");
        return;
    };

    let mut lines: Vec<String> = (0..3).map(review_line).collect();
    lines.push(json!({"review_id": "pg-rev-bad", "stars": "five"}).to_string());
    let source = write_reviews(&lines);

    let err = run_load(&params, Dataset::Review, &source, LoadOptions::default(), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Load { batch: 1, .. }));
    fs::remove_file(source).ok();
}

#[tokio::test]
async fn test_unreachable_host_is_connection_error() {
    if test_params().is_none() {
        println!("YELP_TEST_PG_HOST not set, skipping");
        return;
    }

    let params = ConnectionParams {
        host: Some("127.0.0.1".to_string()),
        port: Some("1".to_string()),
        user: Some("postgres".to_string()),
        password: Some("postgres".to_string()),
        database: Some("yelp".to_string()),
        schema: None,
        driver: Some("postgresql".to_string()),
    };
    let err = connect(&params).await.err().unwrap();
    assert!(matches!(err, LoadError::Connection(_)));
}
