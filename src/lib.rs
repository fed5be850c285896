//! # aliaszip
//!
//! Find a resource by a fuzzy, multilingual name and download its remote
//! directory as a single zip archive.
//!
//! Resources are listed in a local manifest that maps each key to a base
//! directory in a Gitea repository plus a list of aliases. A query matches a
//! resource when any of its normalized, pinyin, romaji or kana-converted forms
//! is contained in a form of the key or an alias. Downloading walks the
//! directory depth-first, fetches every file sequentially from a randomly
//! chosen endpoint, and writes `<key>.zip`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────┐
//! │ Manifest │──▶│   Matcher    │   │  Endpoint  │──▶│  Gitea   │
//! │  (JSON)  │   │ (core crate) │   │    pool    │   │ list/raw │
//! └──────────┘   └──────┬───────┘   └─────┬──────┘   └────┬─────┘
//!                       │                 │               │
//!                       ▼                 ▼               ▼
//!                 ┌──────────┐      ┌──────────────────────────┐
//!                 │   CLI    │─────▶│ Pipeline: walk → fetch → │
//!                 │ search / │      │ zip → <key>.zip          │
//!                 │ download │      └──────────────────────────┘
//!                 └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! aliaszip endpoints add --name main --host git.example.org --owner o --repo charts
//! aliaszip search "senbon"
//! aliaszip download 千本桜 --output ./downloads
//! aliaszip interactive
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and saving |
//! | [`manifest`] | Alias manifest loading |
//! | [`manifest_cmd`] | Manifest rebuild from the remote tree and id migration |
//! | [`error`] | Pipeline, source and manifest error types |
//! | [`remote`] | Gitea listing/raw access behind the `RepoSource` seam |
//! | [`walker`] | Depth-first remote directory walk |
//! | [`archive`] | In-memory zip assembly and atomic save |
//! | [`pipeline`] | Download orchestration and state reporting |
//! | [`status`] | Status reporters (human, JSON, off) |
//! | [`search`] | One-shot search output |
//! | [`interactive`] | Debounced interactive search session |
//! | [`debounce`] | Debounce gate |
//! | [`endpoints`] | Endpoint pool management |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! Matching, transliteration and the data model live in `aliaszip-core`,
//! which has no I/O.

pub mod archive;
pub mod config;
pub mod debounce;
pub mod endpoints;
pub mod error;
pub mod interactive;
pub mod logging;
pub mod manifest;
pub mod manifest_cmd;
pub mod pipeline;
pub mod remote;
pub mod search;
pub mod status;
pub mod walker;
