//! HTTP tests: the router is served on an ephemeral port and driven with
//! reqwest.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

use folio::config::{parse_config, Config};
use folio::models::{Associations, ContentItem};
use folio::server::{build_router, AppState};
use folio::sqlite_store::SqliteStore;
use folio::store::ContentStore;
use folio::{db, import, migrate};

const SOURCE_ID: &str = "0b6f6e1a-3f0c-4d55-9a43-3c2b1d0e9f11";
const UNKNOWN_ID: &str = "9d1c0b2a-0000-4000-8000-000000000000";

struct TestServer {
    base: String,
    _tmp: TempDir,
}

fn test_config(root: &std::path::Path) -> Config {
    parse_config(&format!(
        r#"[db]
path = "{root}/data/folio.sqlite"

[server]
bind = "127.0.0.1:0"
"#,
        root = root.display()
    ))
    .unwrap()
}

async fn start_server() -> TestServer {
    let tmp = TempDir::new().unwrap();
    let posts = tmp.path().join("posts");
    fs::create_dir_all(&posts).unwrap();

    fs::write(
        posts.join("source.md"),
        format!(
            "+++\ntitle = \"Source\"\nid = \"{}\"\npublished = true\ntopics = [\"rust\"]\nhashtags = [\"h\"]\n+++\nSee /blog/tee.\n",
            SOURCE_ID
        ),
    )
    .unwrap();
    fs::write(
        posts.join("tee.md"),
        "+++\ntitle = \"Tee\"\npublished = true\ntopics = [\"rust\"]\n+++\nT\n",
    )
    .unwrap();
    fs::write(
        posts.join("you.md"),
        "+++\ntitle = \"You\"\npublished = true\nhashtags = [\"h\"]\n+++\nU\n",
    )
    .unwrap();

    let config = test_config(tmp.path());
    migrate::run_migrations(&config).await.unwrap();
    import::run_import(&config, Some(posts), false).await.unwrap();

    let pool = db::connect(&config).await.unwrap();
    let state = AppState::new(config, Arc::new(SqliteStore::new(pool)));

    TestServer {
        base: serve(state).await,
        _tmp: tmp,
    }
}

async fn serve(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Store whose every read fails, as a corrupt database would.
struct FailingStore;

#[async_trait]
impl ContentStore for FailingStore {
    async fn find_by_slug(&self, _slug: &str) -> Result<Option<ContentItem>> {
        bail!("database disk image is malformed")
    }
    async fn find_by_id(&self, _id: &str) -> Result<Option<ContentItem>> {
        bail!("database disk image is malformed")
    }
    async fn topic_ids(&self, _item_id: &str) -> Result<BTreeSet<String>> {
        bail!("database disk image is malformed")
    }
    async fn hashtag_ids(&self, _item_id: &str) -> Result<BTreeSet<String>> {
        bail!("database disk image is malformed")
    }
    async fn items_sharing_topics(
        &self,
        _topic_ids: &BTreeSet<String>,
        _exclude_id: &str,
    ) -> Result<Vec<String>> {
        bail!("database disk image is malformed")
    }
    async fn items_sharing_hashtags(
        &self,
        _hashtag_ids: &BTreeSet<String>,
        _exclude_id: &str,
    ) -> Result<Vec<String>> {
        bail!("database disk image is malformed")
    }
    async fn published_items(&self, _ids: &[String]) -> Result<Vec<ContentItem>> {
        bail!("database disk image is malformed")
    }
    async fn upsert_item(
        &self,
        _item: &ContentItem,
        _associations: &Associations,
    ) -> Result<String> {
        bail!("read-only")
    }
}

#[tokio::test]
async fn test_health() {
    let server = start_server().await;
    let resp = reqwest::get(format!("{}/health", server.base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_related_envelope_and_cache_header() {
    let server = start_server().await;
    let resp = reqwest::get(format!("{}/api/posts/{}/related", server.base, SOURCE_ID))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["cache-control"],
        "public, s-maxage=300, stale-while-revalidate=600"
    );

    let body: serde_json::Value = resp.json().await.unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["slug"], "tee");
    assert_eq!(data[0]["score"], 7);
    assert_eq!(data[0]["title"], "Tee");
    assert_eq!(data[1]["slug"], "you");
    assert_eq!(data[1]["score"], 1);
    assert!(data[0]["id"].as_str().unwrap().len() == 36);
    assert!(data[0].get("explain").is_none());
}

#[tokio::test]
async fn test_related_limit() {
    let server = start_server().await;
    let resp = reqwest::get(format!(
        "{}/api/posts/{}/related?limit=1",
        server.base, SOURCE_ID
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["slug"], "tee");
}

#[tokio::test]
async fn test_unknown_post_is_empty() {
    let server = start_server().await;
    let resp = reqwest::get(format!("{}/api/posts/{}/related", server.base, UNKNOWN_ID))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "data": [] }));
}

#[tokio::test]
async fn test_bad_requests() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let cases = [
        format!("{}/api/posts/not-a-uuid/related", server.base),
        format!("{}/api/posts/{}/related?limit=0", server.base, SOURCE_ID),
        format!("{}/api/posts/{}/related?limit=-1", server.base, SOURCE_ID),
        format!("{}/api/posts/{}/related?limit=21", server.base, SOURCE_ID),
        format!("{}/api/posts/{}/related?limit=abc", server.base, SOURCE_ID),
    ];

    for url in cases {
        let resp = client.get(&url).send().await.unwrap();
        assert_eq!(resp.status(), 400, "{}", url);
        assert!(resp.headers().get("cache-control").is_none());
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "bad_request", "{}", url);
        assert!(body["error"]["message"].is_string());
    }
}

#[tokio::test]
async fn test_unknown_route() {
    let server = start_server().await;
    let resp = reqwest::get(format!("{}/api/nope", server.base)).await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_any_uuid_spelling_finds_the_post() {
    let server = start_server().await;
    let upper = SOURCE_ID.to_uppercase();
    let urn = format!("urn:uuid:{}", SOURCE_ID);
    let braced = format!("{{{}}}", SOURCE_ID);
    let simple = SOURCE_ID.replace('-', "");

    for id in [upper, urn, braced, simple] {
        let resp = reqwest::get(format!("{}/api/posts/{}/related", server.base, id))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "{}", id);
        let body: serde_json::Value = resp.json().await.unwrap();
        let slugs: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["slug"].as_str().unwrap())
            .collect();
        assert_eq!(slugs, vec!["tee", "you"], "{}", id);
    }
}

#[tokio::test]
async fn test_repeated_limit_is_a_json_bad_request() {
    let server = start_server().await;
    let resp = reqwest::get(format!(
        "{}/api/posts/{}/related?limit=1&limit=2",
        server.base, SOURCE_ID
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_store_failure_is_a_generic_500() {
    let tmp = TempDir::new().unwrap();
    let state = AppState::new(test_config(tmp.path()), Arc::new(FailingStore));
    let base = serve(state).await;

    let resp = reqwest::get(format!("{}/api/posts/{}/related", base, SOURCE_ID))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    assert!(resp.headers().get("cache-control").is_none());

    let text = resp.text().await.unwrap();
    assert!(!text.contains("malformed"), "{}", text);
    assert!(!text.contains("find_by_id"), "{}", text);
    let body: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "error": { "code": "internal", "message": "internal server error" } })
    );
}
