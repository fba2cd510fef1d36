//! Shared fixtures for the integration tests
//!
//! A small slice of the NCBI classification (primates, mouse, E. coli) served
//! either from an in-memory index or from an ETE-style SQLite file.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taxo_common::TaxId;
use tower::ServiceExt;

use taxo_server::api::create_router;
use taxo_server::config::CorsConfig;
use taxo_server::taxonomy::{InMemoryTaxonomy, TaxonomyIndex, TaxonomySource};
use taxo_server::FeatureState;

/// (taxid, parent, scientific name)
pub const TAXA: &[(u32, u32, &str)] = &[
    (1, 1, "root"),
    (131567, 1, "cellular organisms"),
    (2759, 131567, "Eukaryota"),
    (33208, 2759, "Metazoa"),
    (7711, 33208, "Chordata"),
    (40674, 7711, "Mammalia"),
    (9443, 40674, "Primates"),
    (9604, 9443, "Hominidae"),
    (207598, 9604, "Homininae"),
    (9605, 207598, "Homo"),
    (9606, 9605, "Homo sapiens"),
    (9596, 207598, "Pan"),
    (9598, 9596, "Pan troglodytes"),
    (9597, 9596, "Pan paniscus"),
    (9989, 40674, "Rodentia"),
    (10088, 9989, "Mus"),
    (10090, 10088, "Mus musculus"),
    (2, 131567, "Bacteria"),
    (561, 2, "Escherichia"),
    (562, 561, "Escherichia coli"),
];

/// (obsolete taxid, current taxid)
pub const MERGED: &[(u32, u32)] = &[(1425170, 9606)];

pub const UNKNOWN_TAXID: &str = "999999999";

pub fn id(value: u32) -> TaxId {
    TaxId::new(value).unwrap()
}

pub fn fixture_index() -> TaxonomyIndex {
    let mut index = TaxonomyIndex::new();
    for &(taxid, parent, name) in TAXA {
        index.insert_taxon(id(taxid), id(parent), name);
    }
    for &(old, new) in MERGED {
        index.insert_merged(id(old), id(new));
    }
    index
}

pub fn memory_source() -> Arc<InMemoryTaxonomy> {
    Arc::new(InMemoryTaxonomy::new(fixture_index()))
}

/// Leaf-first lineage as stored in the `track` column
pub fn track(taxid: u32) -> String {
    let parents: HashMap<u32, u32> = TAXA.iter().map(|&(t, p, _)| (t, p)).collect();

    let mut lineage = vec![taxid];
    let mut current = taxid;
    while let Some(&parent) = parents.get(&current) {
        if parent == current {
            break;
        }
        lineage.push(parent);
        current = parent;
    }

    lineage
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Write the fixture taxonomy to `<dir>/taxa.sqlite` using the ETE schema
pub async fn create_sqlite_database(dir: &Path) -> PathBuf {
    let path = dir.join("taxa.sqlite");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE species (taxid INTEGER PRIMARY KEY, parent INTEGER, spname TEXT, \
         common TEXT, rank TEXT, track TEXT)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("CREATE TABLE merged (taxid_old INTEGER, taxid_new INTEGER)")
        .execute(&pool)
        .await
        .unwrap();

    for &(taxid, parent, name) in TAXA {
        sqlx::query(
            "INSERT INTO species (taxid, parent, spname, common, rank, track) \
             VALUES (?, ?, ?, '', 'no rank', ?)",
        )
        .bind(taxid as i64)
        .bind(parent as i64)
        .bind(name)
        .bind(track(taxid))
        .execute(&pool)
        .await
        .unwrap();
    }
    for &(old, new) in MERGED {
        sqlx::query("INSERT INTO merged (taxid_old, taxid_new) VALUES (?, ?)")
            .bind(old as i64)
            .bind(new as i64)
            .execute(&pool)
            .await
            .unwrap();
    }

    pool.close().await;
    path
}

pub fn permissive_cors() -> CorsConfig {
    CorsConfig {
        allowed_origins: vec!["*".to_string()],
        allow_credentials: false,
    }
}

pub fn create_test_app(source: Arc<dyn TaxonomySource>) -> Router {
    create_router(FeatureState::new(source), &permissive_cors())
}

/// Send a request and return the status and raw body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, body.to_vec())
}

/// POST a raw body with the given content type and parse the JSON answer
pub async fn post_raw(
    app: &Router,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(Method::POST);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    let (status, body) = send(app, builder.body(Body::from(body.to_string())).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap())
}

/// POST a JSON body
pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, Some("application/json"), &body.to_string()).await
}

/// Write the fixture taxonomy as NCBI taxdump files into `dir`
pub fn create_taxdump(dir: &Path) {
    let nodes: String = TAXA
        .iter()
        .map(|(taxid, parent, _)| format!("{}\t|\t{}\t|\tno rank\t|\t\t|\n", taxid, parent))
        .collect();
    let names: String = TAXA
        .iter()
        .map(|(taxid, _, name)| {
            format!(
                "{taxid}\t|\t{name}\t|\t\t|\tscientific name\t|\n\
                 {taxid}\t|\t{name} (synonym)\t|\t\t|\tsynonym\t|\n"
            )
        })
        .collect();
    let merged: String = MERGED
        .iter()
        .map(|(old, new)| format!("{}\t|\t{}\t|\n", old, new))
        .collect();

    std::fs::write(dir.join("nodes.dmp"), nodes).unwrap();
    std::fs::write(dir.join("names.dmp"), names).unwrap();
    std::fs::write(dir.join("merged.dmp"), merged).unwrap();
}
