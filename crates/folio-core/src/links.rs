//! Internal link extraction.
//!
//! Finds the slugs of other posts referenced from a post body. Three
//! reference shapes are recognized, all pointing at [`BLOG_PATH_PREFIX`]:
//!
//! | Shape | Example |
//! |-------|---------|
//! | bare path | `see /blog/intro-to-rust` |
//! | HTML attribute | `<a href="/blog/intro-to-rust">` |
//! | Markdown link | `[intro](/blog/intro-to-rust)` |
//!
//! Matching is case-insensitive and slugs are returned lowercased, so
//! `/Blog/Intro-To-Rust` and `/blog/intro-to-rust` collapse to one entry.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Path under which posts are served.
pub const BLOG_PATH_PREFIX: &str = "/blog/";

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:href=["']/blog/|\]\(/blog/|/blog/)([a-z0-9-]+)"#)
        .expect("link pattern is a valid regex")
});

/// Return the set of slugs that `body` links to.
pub fn extract_linked_slugs(body: &str) -> HashSet<String> {
    LINK_PATTERN
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect()
}
