//! # Newsclip
//!
//! A local-first bookmark sync and offline reading client for personalized
//! news.
//!
//! Newsclip keeps a user's news bookmarks consistent between a remote
//! bookmark service (the source of truth) and a local SQLite cache (the
//! offline fallback), across network failures, racing toggles, and sign-in
//! and sign-out transitions. Around that core it offers category-filtered
//! headline browsing and lightweight reading analytics via the `ncl` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐        ┌────────────────────┐        ┌─────────────┐
//! │ Remote       │  list  │   Reconciliation    │  read  │   SQLite    │
//! │ Bookmark     │◀──────▶│      Engine         │◀──────▶│   Cache     │
//! │ Service      │ mutate │ (in-memory bookmark │  write │ (snapshots, │
//! └──────────────┘        │  set + sync status) │        │  session)   │
//!                         └─────────┬──────────┘        └─────────────┘
//!                                   │
//!                                   ▼
//!                             ┌──────────┐
//!                             │   CLI    │
//!                             │  (ncl)   │
//!                             └──────────┘
//! ```
//!
//! The engine is pessimistic: every mutation round-trips through the remote
//! service and is followed by a full reload, so the local set always
//! converges with the server's canonical order. When the service is
//! unreachable, reloads fall back to the cached snapshot and flag degraded
//! mode instead of failing.
//!
//! ## Quick Start
//!
//! ```bash
//! ncl init                                  # create the state database
//! ncl session sign-in --user-id u-123       # sign in, first sync
//! ncl headlines --category technology       # browse headlines
//! ncl bookmarks toggle <url> --title "..."  # save an article
//! ncl bookmarks list                        # show the synced set
//! ncl analyze                               # sources + trending keywords
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and wire decoding |
//! | [`engine`] | Bookmark reconciliation engine |
//! | [`cache`] | Snapshot store (SQLite and in-memory) |
//! | [`remote`] | HTTP client for the bookmark service |
//! | [`session`] | Persisted sign-in state |
//! | [`bookmarks`] | Bookmark list and toggle commands |
//! | [`headlines`] | Headline fetching and browsing |
//! | [`analytics`] | Source and keyword analytics |
//! | [`status`] | Status command and sync bookkeeping |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod analytics;
pub mod bookmarks;
pub mod cache;
pub mod config;
pub mod db;
pub mod engine;
pub mod headlines;
pub mod migrate;
pub mod models;
pub mod remote;
pub mod session;
pub mod status;
