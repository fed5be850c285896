//! # aliaszip core
//!
//! Shared, I/O-free logic for aliaszip: the resource and endpoint data model,
//! text normalization, script transliteration, search-term generation,
//! matching, endpoint selection, and manifest item ids.
//!
//! This crate contains no tokio, HTTP, or filesystem dependencies; the root
//! `aliaszip` crate layers the download pipeline and CLI on top.

pub mod catalog;
pub mod endpoint;
pub mod models;
pub mod normalize;
pub mod search;
pub mod terms;
pub mod translit;
