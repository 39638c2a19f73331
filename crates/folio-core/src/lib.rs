//! # Folio Core
//!
//! Runtime-agnostic logic for Folio: content models, internal link
//! extraction, relatedness weights and scoring, candidate loading, the
//! related-posts ranker, and the [`store::ContentStore`] abstraction.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Storage is
//! reached only through the store trait, so the same ranking code runs
//! against SQLite in the application and against
//! [`store::memory::InMemoryStore`] in tests.

pub mod candidates;
pub mod links;
pub mod models;
pub mod related;
pub mod score;
pub mod store;
