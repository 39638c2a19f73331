//! Markdown post import.
//!
//! Walks the configured content directory, parses each post's TOML front
//! matter, and upserts the post with its topics and hashtags into the
//! content store.
//!
//! ```text
//! +++
//! title = "Async Rust in practice"
//! slug = "async-rust"          # defaults to the file stem
//! id = "<uuid>"                # defaults to the stored id or a new v4 UUID
//! published = true             # defaults to false
//! topics = ["Rust", "Async"]
//! hashtags = ["#tokio"]
//! +++
//! Body text, may link to /blog/other-post.
//! ```
//!
//! A SHA-256 content hash over the title, body, publication flag, and tag
//! keys is stored with each post; unchanged files are skipped on re-import.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;
use walkdir::WalkDir;

use folio_core::models::{is_valid_slug, Associations, ContentItem};
use folio_core::store::ContentStore;

use crate::config::{Config, ImportConfig};
use crate::db;
use crate::sqlite_store::SqliteStore;

const FRONT_MATTER_FENCE: &str = "+++";

#[derive(Debug, Deserialize)]
struct FrontMatter {
    title: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    published: bool,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    hashtags: Vec<String>,
}

/// A post file parsed and ready to store.
#[derive(Debug, Clone)]
pub struct ParsedPost {
    pub path: PathBuf,
    pub item: ContentItem,
    pub associations: Associations,
    pub content_hash: String,
}

/// Counts reported at the end of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub scanned: usize,
    pub upserted: usize,
    pub unchanged: usize,
}

/// Split `text` into its TOML front matter and body.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start_matches('\u{feff}');
    let rest = text.strip_prefix(FRONT_MATTER_FENCE)?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            let body = &rest[offset + line.len()..];
            return Some((&rest[..offset], body));
        }
        offset += line.len();
    }
    None
}

fn content_hash(item: &ContentItem, associations: &Associations) -> String {
    let mut hasher = Sha256::new();
    hasher.update(item.title.as_bytes());
    hasher.update([0u8]);
    hasher.update(item.body.as_bytes());
    hasher.update([0u8, item.published as u8, 0u8]);
    for topic in &associations.topics {
        hasher.update(topic.as_bytes());
        hasher.update([b',']);
    }
    hasher.update([0u8]);
    for hashtag in &associations.hashtags {
        hasher.update(hashtag.as_bytes());
        hasher.update([b',']);
    }
    hex::encode(hasher.finalize())
}

/// Parse one post file's contents.
pub fn parse_post(path: &Path, text: &str) -> Result<ParsedPost> {
    let (front, body) = split_front_matter(text)
        .with_context(|| format!("{}: missing +++ front matter block", path.display()))?;

    let front: FrontMatter = toml::from_str(front)
        .with_context(|| format!("{}: invalid front matter", path.display()))?;

    if front.title.trim().is_empty() {
        bail!("{}: title must not be empty", path.display());
    }

    let slug = match front.slug {
        Some(slug) => slug.trim().to_lowercase(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
    };
    if !is_valid_slug(&slug) {
        bail!(
            "{}: slug '{}' must contain only a-z, 0-9 and '-'",
            path.display(),
            slug
        );
    }

    let id = match front.id {
        Some(id) => Uuid::parse_str(id.trim())
            .with_context(|| format!("{}: id '{}' is not a UUID", path.display(), id))?
            .to_string(),
        None => Uuid::new_v4().to_string(),
    };

    let item = ContentItem {
        id,
        slug,
        title: front.title.trim().to_string(),
        body: body.trim().to_string(),
        published: front.published,
    };
    let associations = Associations::from_names(&front.topics, &front.hashtags);
    let content_hash = content_hash(&item, &associations);

    Ok(ParsedPost {
        path: path.to_path_buf(),
        item,
        associations,
        content_hash,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob '{}'", pattern))?);
    }
    Ok(builder.build()?)
}

/// Walk the import root and parse every matching post file.
///
/// Files are visited in path order. Two files resolving to the same slug
/// or declaring the same id fail the scan.
pub fn scan_posts(import: &ImportConfig) -> Result<Vec<ParsedPost>> {
    let root = &import.root;
    if !root.is_dir() {
        bail!("import root is not a directory: {}", root.display());
    }

    let include = build_globset(&import.include_globs)?;
    let exclude = build_globset(&import.exclude_globs)?;

    let mut posts = Vec::new();
    let mut seen_slugs = HashSet::new();
    let mut seen_ids = HashSet::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if !include.is_match(rel) || exclude.is_match(rel) {
            debug!(path = %rel.display(), "skipping file");
            continue;
        }

        let text = std::fs::read_to_string(entry.path())
            .with_context(|| format!("reading {}", entry.path().display()))?;
        let post = parse_post(entry.path(), &text)?;

        if !seen_slugs.insert(post.item.slug.clone()) {
            bail!(
                "{}: duplicate slug '{}'",
                entry.path().display(),
                post.item.slug
            );
        }
        if !seen_ids.insert(post.item.id.clone()) {
            bail!(
                "{}: duplicate id '{}'",
                entry.path().display(),
                post.item.id
            );
        }
        posts.push(post);
    }

    Ok(posts)
}

/// Write parsed posts to the store, skipping those whose content hash is
/// unchanged.
pub async fn import_posts(store: &SqliteStore, posts: &[ParsedPost]) -> Result<ImportSummary> {
    let mut summary = ImportSummary {
        scanned: posts.len(),
        ..Default::default()
    };

    for post in posts {
        let previous = store.content_hash(&post.item.slug).await?;
        if previous.as_deref() == Some(post.content_hash.as_str()) {
            summary.unchanged += 1;
            continue;
        }

        let id = store
            .upsert_item(&post.item, &post.associations)
            .await
            .with_context(|| format!("importing {}", post.path.display()))?;
        store.set_content_hash(&id, &post.content_hash).await?;
        summary.upserted += 1;
    }

    Ok(summary)
}

/// CLI entry point for `folio import`.
pub async fn run_import(
    config: &Config,
    root_override: Option<PathBuf>,
    dry_run: bool,
) -> Result<ImportSummary> {
    let import = match (root_override, &config.import) {
        (Some(root), Some(cfg)) => ImportConfig {
            root,
            ..cfg.clone()
        },
        (Some(root), None) => ImportConfig::at(root),
        (None, Some(cfg)) => cfg.clone(),
        (None, None) => bail!("no [import] section in config and no --root given"),
    };

    let posts = scan_posts(&import)?;

    if dry_run {
        println!("import {} (dry-run)", import.root.display());
        println!("  posts found: {}", posts.len());
        println!(
            "  published: {}",
            posts.iter().filter(|p| p.item.published).count()
        );
        return Ok(ImportSummary {
            scanned: posts.len(),
            ..Default::default()
        });
    }

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let summary = import_posts(&store, &posts).await?;
    store.pool().close().await;

    info!(
        root = %import.root.display(),
        scanned = summary.scanned,
        upserted = summary.upserted,
        unchanged = summary.unchanged,
        "import finished"
    );

    println!("import {}", import.root.display());
    println!("  scanned: {} posts", summary.scanned);
    println!("  upserted posts: {}", summary.upserted);
    println!("  unchanged: {}", summary.unchanged);
    println!("ok");

    Ok(summary)
}
