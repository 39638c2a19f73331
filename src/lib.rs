//! # Folio
//!
//! Related-post ranking for a blog.
//!
//! Folio imports Markdown posts (with TOML front matter) into SQLite and,
//! for any published post, ranks the other published posts that share its
//! topics or hashtags. Shared topics, shared hashtags, and in-body links to
//! `/blog/<slug>` each add weighted points to a candidate's score.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  Markdown   │──▶│   Import    │──▶│    SQLite    │
//! │  + TOML fm  │   │ hash+upsert │   │ posts + tags │
//! └─────────────┘   └─────────────┘   └──────┬───────┘
//!                                            │
//!                      ┌─────────────────────┤
//!                      ▼                     ▼
//!                 ┌──────────┐         ┌──────────┐
//!                 │   CLI    │         │   HTTP   │
//!                 │ (folio)  │         │  (JSON)  │
//!                 └──────────┘         └──────────┘
//! ```
//!
//! The ranking itself lives in the runtime-agnostic `folio-core` crate and
//! talks to storage only through [`store::ContentStore`].
//!
//! ## Quick Start
//!
//! ```bash
//! folio init                       # create database
//! folio import --root ./content    # load posts
//! folio related getting-started    # ranked related posts
//! folio serve                      # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite-backed [`store::ContentStore`] |
//! | [`import`] | Markdown post import |
//! | [`related`] | `folio related` command |
//! | [`get`] | `folio get` command |
//! | [`stats`] | `folio stats` command |
//! | [`server`] | HTTP server |

pub mod config;
pub mod db;
pub mod get;
pub mod import;
pub mod migrate;
pub mod related;
pub mod server;
pub mod sqlite_store;
pub mod stats;

pub use folio_core::{models, store};
