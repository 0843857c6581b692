//! # Newsclip CLI (`ncl`)
//!
//! The `ncl` binary is the primary interface for Newsclip. It provides
//! commands for database initialization, session management, headline
//! browsing, bookmark sync, and reading analytics.
//!
//! ## Usage
//!
//! ```bash
//! ncl --config ./ncl.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ncl init` | Create the state database and run schema migrations |
//! | `ncl status` | Show session, last sync outcome, and snapshot age |
//! | `ncl session sign-in` | Store an externally verified identity and sync once |
//! | `ncl session sign-out` | Forget the session (cache purge is configurable) |
//! | `ncl headlines` | Fetch and print category headlines |
//! | `ncl bookmarks list` | Reconcile and print the bookmark set |
//! | `ncl bookmarks toggle <url>` | Add or remove one bookmark |
//! | `ncl analyze` | Source distribution and trending keywords |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the state database
//! ncl init --config ./ncl.toml
//!
//! # Sign in (identity is verified upstream; the token stays opaque)
//! ncl session sign-in --user-id u-123 --username casey --prefer technology
//!
//! # Browse technology headlines, bookmarked entries marked
//! ncl headlines --category technology
//!
//! # Save an article
//! ncl bookmarks toggle https://news.example/rates --title "Rates held steady"
//!
//! # Show the set even when the service is down (cached snapshot)
//! ncl bookmarks list
//!
//! # Trending keywords over your bookmarks
//! ncl analyze
//! ```

mod analytics;
mod bookmarks;
mod cache;
mod config;
mod db;
mod engine;
mod headlines;
mod migrate;
mod models;
mod remote;
mod session;
mod status;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Newsclip CLI — a local-first bookmark sync and offline reading client
/// for personalized news.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ncl.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ncl",
    about = "Newsclip — a local-first bookmark sync and offline reading client",
    version,
    long_about = "Newsclip keeps a user's news bookmarks consistent between a remote bookmark \
    service and a local SQLite cache, across network failures and sign-in/sign-out transitions. \
    It also offers category-filtered headline browsing and lightweight reading analytics."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./ncl.toml`. Database, remote service, and sync
    /// settings are read from this file.
    #[arg(long, global = true, default_value = "./ncl.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the state database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (bookmark_cache, session, settings). This command is idempotent —
    /// running it multiple times is safe.
    Init,

    /// Show the current session, last sync outcome, and snapshot age.
    Status,

    /// Manage the signed-in session.
    ///
    /// Sign-in stores an identity that was verified elsewhere; Newsclip
    /// never issues or decodes credentials. Signing in triggers one
    /// reconciliation against the bookmark service.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Fetch and print headlines for a category.
    ///
    /// Categories: general, technology, sports, business, health.
    /// Entries already in your bookmarks are marked when signed in.
    Headlines {
        /// Headline category.
        #[arg(long, default_value = "general")]
        category: String,
    },

    /// Manage bookmarks.
    ///
    /// Every mutation round-trips through the bookmark service; when it is
    /// unreachable, reads fall back to the locally cached snapshot.
    Bookmarks {
        #[command(subcommand)]
        action: BookmarksAction,
    },

    /// Reading analytics: top sources and trending title keywords.
    ///
    /// Analyzes your bookmark set by default, or a fresh headline batch
    /// when `--category` is given.
    Analyze {
        /// Analyze fetched headlines for this category instead of bookmarks.
        #[arg(long)]
        category: Option<String>,
    },
}

/// Session management subcommands.
#[derive(Subcommand)]
enum SessionAction {
    /// Sign in with an externally verified identity.
    ///
    /// Stores the profile in the state database and reconciles bookmarks
    /// once. A failed sync still signs you in (degraded mode).
    SignIn {
        /// Externally verified user identifier.
        #[arg(long)]
        user_id: String,

        /// Display name.
        #[arg(long)]
        username: Option<String>,

        /// Email address.
        #[arg(long)]
        email: Option<String>,

        /// Preferred headline category; repeat for several.
        #[arg(long = "prefer")]
        preferences: Vec<String>,

        /// Opaque credential forwarded to the bookmark service.
        #[arg(long)]
        token: Option<String>,
    },

    /// Sign out and forget the stored session.
    ///
    /// The cached bookmark snapshot is kept unless
    /// `sync.purge_cache_on_signout` is enabled in the config.
    SignOut,
}

/// Bookmark subcommands.
#[derive(Subcommand)]
enum BookmarksAction {
    /// Reconcile with the service and print the bookmark set.
    List {
        /// Print the cached snapshot without calling the service.
        #[arg(long)]
        offline: bool,
    },

    /// Add or remove a bookmark, decided by current membership.
    ///
    /// For a new bookmark the article fields describe what is saved
    /// (`--title` is required); removing needs only the url.
    Toggle {
        /// Article url (the bookmark's identity).
        url: String,

        /// Article title (required when adding).
        #[arg(long)]
        title: Option<String>,

        /// Article description.
        #[arg(long)]
        description: Option<String>,

        /// Source name (e.g. the publication).
        #[arg(long)]
        source: Option<String>,

        /// Image url.
        #[arg(long)]
        image_url: Option<String>,

        /// Author name.
        #[arg(long)]
        author: Option<String>,

        /// Publication timestamp, RFC 3339. Defaults to now.
        #[arg(long)]
        published_at: Option<String>,
    },
}

/// Route library logs to stderr; `NCL_LOG` tunes verbosity (default `warn`).
fn init_logging() {
    let filter = std::env::var("NCL_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter.as_str())
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("State database initialized successfully.");
        }
        Commands::Status => {
            status::run_status(&cfg).await?;
        }
        Commands::Session { action } => match action {
            SessionAction::SignIn {
                user_id,
                username,
                email,
                preferences,
                token,
            } => {
                let profile = session::UserProfile {
                    user_id,
                    username,
                    email,
                    preferences,
                    auth_token: token,
                };
                session::run_sign_in(&cfg, profile).await?;
            }
            SessionAction::SignOut => {
                session::run_sign_out(&cfg).await?;
            }
        },
        Commands::Headlines { category } => {
            headlines::run_headlines(&cfg, &category).await?;
        }
        Commands::Bookmarks { action } => match action {
            BookmarksAction::List { offline } => {
                bookmarks::run_list(&cfg, offline).await?;
            }
            BookmarksAction::Toggle {
                url,
                title,
                description,
                source,
                image_url,
                author,
                published_at,
            } => {
                let args = bookmarks::ToggleArgs {
                    url,
                    title,
                    description,
                    source,
                    image_url,
                    author,
                    published_at,
                };
                bookmarks::run_toggle(&cfg, args).await?;
            }
        },
        Commands::Analyze { category } => {
            analytics::run_analyze(&cfg, category).await?;
        }
    }

    Ok(())
}
