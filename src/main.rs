//! # Folio CLI (`folio`)
//!
//! ## Usage
//!
//! ```bash
//! folio --config ./config/folio.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `folio init` | Create the SQLite database and run schema migrations |
//! | `folio import` | Import Markdown posts from the configured root |
//! | `folio related <slug>` | Print ranked related posts |
//! | `folio get <slug>` | Print a post with its tags and links |
//! | `folio stats` | Print content counts |
//! | `folio serve` | Start the HTTP server |
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use folio::related::RelatedTarget;
use folio::{config, get, import, migrate, related, server, stats};

/// Folio: related-post ranking for a blog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/folio.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "folio", about = "Related-post ranking for a blog", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/folio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Import Markdown posts into the database.
    ///
    /// Posts whose content hash has not changed since the last import are
    /// skipped.
    Import {
        /// Directory to scan instead of `[import].root`.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Parse and count posts without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show posts related to a post.
    Related {
        /// Slug of the source post.
        #[arg(required_unless_present = "id", conflicts_with = "id")]
        slug: Option<String>,

        /// Look the source post up by UUID instead of slug.
        #[arg(long)]
        id: Option<String>,

        /// Maximum number of results (1 to `[related].max_limit`).
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Print the per-relation score breakdown.
        #[arg(long)]
        explain: bool,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a post by slug.
    Get {
        /// Post slug.
        slug: String,

        /// Print the post as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print post, topic, and hashtag counts.
    Stats,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { root, dry_run } => {
            import::run_import(&cfg, root, dry_run).await?;
        }
        Commands::Related {
            slug,
            id,
            limit,
            explain,
            json,
        } => {
            let target = match (slug, id) {
                (_, Some(id)) => RelatedTarget::Id(id),
                (Some(slug), None) => RelatedTarget::Slug(slug),
                (None, None) => anyhow::bail!("a slug or --id is required"),
            };
            related::run_related(&cfg, target, limit, explain, json).await?;
        }
        Commands::Get { slug, json } => {
            get::run_get(&cfg, &slug, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
