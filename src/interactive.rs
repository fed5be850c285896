//! Line-oriented interactive search for `aliaszip interactive`.
//!
//! A plain line replaces the query; the match pass runs once input has been
//! quiet for the debounce delay. `:get <n|key>` downloads the n-th result of
//! the last pass (or a key verbatim) and `:quit` exits. Input is not read
//! while a download runs.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use aliaszip_core::models::AliasTable;
use aliaszip_core::search::Matcher;

use crate::debounce::Debouncer;
use crate::pipeline::{download_resource, DownloadContext, DownloadOutcome};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query(String),
    Get(String),
    Quit,
    Help,
}

pub fn parse_line(line: &str) -> Command {
    let trimmed = line.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((":get", rest)) => Command::Get(rest.trim().to_string()),
        _ => match trimmed {
            ":quit" | ":q" => Command::Quit,
            ":help" | ":h" | ":get" => Command::Help,
            _ => Command::Query(line.to_string()),
        },
    }
}

/// Resolve a `:get` argument against the last results.
///
/// A number is a 1-based result index when it is in range and a manifest key
/// otherwise. `=<key>` skips the index lookup, so a key like `1` stays
/// reachable while results are shown.
pub fn resolve_target(arg: &str, results: &[String], table: &AliasTable) -> Option<String> {
    if let Some(key) = arg.strip_prefix('=') {
        return table.contains_key(key).then(|| key.to_string());
    }
    if let Ok(n) = arg.parse::<usize>() {
        if n >= 1 && n <= results.len() {
            return Some(results[n - 1].clone());
        }
    }
    table.contains_key(arg).then(|| arg.to_string())
}

pub fn format_results(keys: &[String]) -> String {
    if keys.is_empty() {
        return "No results.".to_string();
    }
    keys.iter()
        .enumerate()
        .map(|(i, key)| format!("{:>3}. {}", i + 1, key))
        .collect::<Vec<_>>()
        .join("\n")
}

const HELP: &str =
    "type to search; :get <n|key> to download (numbers pick a result, :get =<key> forces a key); :quit to exit";

/// Run the session until `:quit` or end of input.
pub async fn run_interactive<R>(
    input: R,
    matcher: Arc<Matcher>,
    table: Arc<AliasTable>,
    debounce: Duration,
    ctx: &DownloadContext<'_>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let results: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let mut debouncer = Debouncer::new(debounce);
    let mut lines = input.lines();

    println!("{}", HELP);
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Query(query) => {
                let matcher = matcher.clone();
                let table = table.clone();
                let results = results.clone();
                debouncer.schedule(move || {
                    let keys: Vec<String> = matcher
                        .filter_keys(&query, &table)
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                    println!("{}", format_results(&keys));
                    *results.lock() = keys;
                });
            }
            Command::Get(arg) => {
                debouncer.flush().await;
                let target = resolve_target(&arg, &results.lock(), &table);
                let Some(key) = target else {
                    println!("no such result: {}", arg);
                    continue;
                };
                match download_resource(&key, &table, ctx).await {
                    Ok(DownloadOutcome::Saved { path, files }) => {
                        println!("saved {} ({} files)", path.display(), files)
                    }
                    Ok(DownloadOutcome::Empty) => println!("{}: nothing to download", key),
                    Err(e) => println!("download failed: {}", e),
                }
            }
        }
    }
    debouncer.cancel();
    Ok(())
}
