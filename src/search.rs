//! One-shot alias search for `aliaszip search`.

use anyhow::Result;
use serde::Serialize;

use aliaszip_core::models::AliasTable;
use aliaszip_core::search::Matcher;

/// One search result as printed with `--json`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SearchHit<'a> {
    pub key: &'a str,
    pub path: &'a str,
    pub alias: &'a [String],
}

/// Matching entries in manifest order.
pub fn search_hits<'a>(matcher: &Matcher, table: &'a AliasTable, query: &str) -> Vec<SearchHit<'a>> {
    matcher
        .filter_keys(query, table)
        .into_iter()
        .filter_map(|key| {
            table.get(key).map(|entry| SearchHit {
                key,
                path: &entry.path,
                alias: &entry.alias,
            })
        })
        .collect()
}

pub fn run_search(matcher: &Matcher, table: &AliasTable, query: &str, json: bool) -> Result<()> {
    let hits = search_hits(matcher, table, query);
    tracing::debug!(query = %query, hits = hits.len(), "search complete");

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        if hit.alias.is_empty() {
            println!("{:>3}. {}", i + 1, hit.key);
        } else {
            println!("{:>3}. {}  ({})", i + 1, hit.key, hit.alias.join(", "));
        }
    }
    Ok(())
}
