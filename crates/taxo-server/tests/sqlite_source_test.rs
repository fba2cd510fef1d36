//! Integration tests for the SQLite taxonomy backend
//!
//! Each test writes the fixture taxonomy to a temporary ETE-style
//! `taxa.sqlite` and reads it back through the read-only pool.

mod common;

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use axum::http::StatusCode;
use taxo_server::config::{Config, SourceKind};
use taxo_server::taxonomy::sqlite::SqliteSourceConfig;
use taxo_server::taxonomy::{
    SourceError, SqliteTaxonomy, TaxonomyHandle, TaxonomySource, TopologyNode, TopologyOptions,
};

use common::{create_sqlite_database, create_test_app, id, post_json};

async fn open(dir: &TempDir) -> SqliteTaxonomy {
    let path = create_sqlite_database(dir.path()).await;
    SqliteTaxonomy::connect(&SqliteSourceConfig::new(path))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_scientific_names() {
    let dir = TempDir::new().unwrap();
    let source = open(&dir).await;
    let mut handle = source.acquire().await.unwrap();

    let names = handle
        .scientific_names(&[id(9606), id(562), id(999999999)])
        .await
        .unwrap();

    assert_eq!(names.len(), 2);
    assert_eq!(names[&id(9606)], "Homo sapiens");
    assert_eq!(names[&id(562)], "Escherichia coli");
}

#[tokio::test]
async fn test_translate_falls_back_to_merged_table() {
    let dir = TempDir::new().unwrap();
    let source = open(&dir).await;
    let mut handle = source.acquire().await.unwrap();

    let names = handle.translate(&[id(1425170), id(9598)]).await.unwrap();

    assert_eq!(names[&id(1425170)], "Homo sapiens");
    assert_eq!(names[&id(9598)], "Pan troglodytes");
}

#[tokio::test]
async fn test_lineages_are_root_first() {
    let dir = TempDir::new().unwrap();
    let source = open(&dir).await;
    let mut handle = source.acquire().await.unwrap();

    let lineages = handle.lineages(&[id(9606)]).await.unwrap();
    let lineage = &lineages[&id(9606)];

    assert_eq!(lineage.first(), Some(&id(1)));
    assert_eq!(lineage.last(), Some(&id(9606)));
    assert_eq!(lineage.len(), 11);
}

#[tokio::test]
async fn test_topology() {
    let dir = TempDir::new().unwrap();
    let source = open(&dir).await;
    let mut handle = source.acquire().await.unwrap();

    let tree = handle
        .topology(&[id(9606), id(9598)], TopologyOptions::default())
        .await
        .unwrap();

    assert_eq!(
        tree,
        TopologyNode {
            id: id(207598),
            children: vec![TopologyNode::leaf(id(9598)), TopologyNode::leaf(id(9606))],
        }
    );
}

#[tokio::test]
async fn test_topology_of_unknown_taxa() {
    let dir = TempDir::new().unwrap();
    let source = open(&dir).await;
    let mut handle = source.acquire().await.unwrap();

    let result = handle
        .topology(&[id(999999999)], TopologyOptions::default())
        .await;

    assert!(matches!(result, Err(SourceError::UnknownTaxa(_))));
}

#[tokio::test]
async fn test_large_batch_is_chunked() {
    let dir = TempDir::new().unwrap();
    let source = open(&dir).await;
    let mut handle = source.acquire().await.unwrap();

    let mut ids: Vec<_> = (100_000..102_000).map(id).collect();
    ids.push(id(9606));

    let names = handle.scientific_names(&ids).await.unwrap();

    assert_eq!(names.len(), 1);
}

#[tokio::test]
async fn test_missing_tables_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.sqlite");
    let options = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = sqlx::SqlitePool::connect_with(options).await.unwrap();
    pool.close().await;

    let result = SqliteTaxonomy::connect(&SqliteSourceConfig::new(&path)).await;

    assert!(matches!(result, Err(SourceError::Inconsistent(_))));
}

#[tokio::test]
async fn test_handles_are_returned_to_the_pool() {
    let dir = TempDir::new().unwrap();
    let path = create_sqlite_database(dir.path()).await;
    let mut config = SqliteSourceConfig::new(path);
    config.max_connections = 1;
    let source = SqliteTaxonomy::connect(&config).await.unwrap();

    for _ in 0..3 {
        let mut handle = source.acquire().await.unwrap();
        handle.scientific_names(&[id(9606)]).await.unwrap();
    }

    assert!(source.pool().size() <= 1);
}

#[tokio::test]
async fn test_http_api_over_sqlite() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(open(&dir).await);
    let app = create_test_app(source);

    let (status, body) = post_json(&app, "/term", json!({ "term": ["9606", "10090"] })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["terms"],
        json!({ "9606": "Homo sapiens", "10090": "Mus musculus" })
    );

    let (status, body) = post_json(&app, "/tree", json!({ "taxids": ["562", "9606"] })).await;
    assert_eq!(status, StatusCode::OK);
    let root = &body["tree"]["131567"];
    assert_eq!(root["name"], "cellular organisms");
    assert_eq!(root["children"]["562"]["name"], "Escherichia coli");
    assert_eq!(root["children"]["9606"]["name"], "Homo sapiens");
}

#[tokio::test]
async fn test_open_source_from_config() {
    let dir = TempDir::new().unwrap();
    let path = create_sqlite_database(dir.path()).await;

    let mut config = Config::default();
    config.source.kind = SourceKind::Sqlite;
    config.source.database_path = path;

    let source = taxo_server::api::open_source(&config.source).await.unwrap();
    assert_eq!(source.kind(), "sqlite");
}
