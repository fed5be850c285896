//! # aliaszip CLI
//!
//! ## Usage
//!
//! ```bash
//! aliaszip --config ./config/aliaszip.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `aliaszip search "<query>"` | List manifest keys matching the query |
//! | `aliaszip download <key>` | Download a resource directory as `<key>.zip` |
//! | `aliaszip interactive` | Debounced search session with `:get` downloads |
//! | `aliaszip endpoints list` | Show the endpoint pool |
//! | `aliaszip endpoints add/edit/remove` | Manage the endpoint pool |
//! | `aliaszip manifest update` | Rebuild the manifest from the remote tree |
//! | `aliaszip completions <shell>` | Print shell completions |

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

use aliaszip::config::{self, Config};
use aliaszip::endpoints::{self, EndpointEdit, NewEndpoint};
use aliaszip::pipeline::{download_resource, DownloadContext, DownloadOutcome};
use aliaszip::remote::HttpProvider;
use aliaszip::status::StatusMode;
use aliaszip::manifest_cmd::{self, UpdateOptions};
use aliaszip::remote::SourceProvider;
use aliaszip::{interactive, logging, manifest, search};
use aliaszip_core::endpoint::pick_endpoint;
use aliaszip_core::models::{AliasTable, EndpointKind};
use aliaszip_core::search::Matcher;

/// Find a resource by fuzzy multilingual name and download it as a zip.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file holding the manifest path, network settings and the endpoint pool.
#[derive(Parser)]
#[command(name = "aliaszip", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/aliaszip.toml")]
    config: PathBuf,

    /// Status output for downloads: `human`, `json` or `off`.
    /// Defaults to `human` when stderr is a terminal.
    #[arg(long, global = true, value_parser = parse_status_mode)]
    status: Option<StatusMode>,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search manifest keys and aliases.
    ///
    /// Matches across case, punctuation, Chinese pinyin, Japanese romaji and
    /// hiragana/katakana. Results keep manifest order.
    Search {
        query: String,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Download a resource directory as `<key>.zip`.
    Download {
        /// Manifest key of the resource.
        key: String,

        /// Output directory (defaults to `[output].dir`).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Interactive search. Type to search, `:get <n|key>` to download,
    /// `:quit` to exit.
    ///
    /// A numeric `:get` argument is a result number first and a key second;
    /// `:get =<key>` always looks up the key.
    Interactive {
        /// Output directory (defaults to `[output].dir`).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Manage the endpoint pool.
    Endpoints {
        #[command(subcommand)]
        action: EndpointAction,
    },

    /// Maintain the alias manifest.
    Manifest {
        #[command(subcommand)]
        action: ManifestAction,
    },

    /// Print shell completions to stdout.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum EndpointAction {
    /// List configured endpoints.
    List,
    /// Add an endpoint.
    Add {
        #[arg(long)]
        name: String,
        /// Host, optionally with `http://` or `https://`.
        #[arg(long)]
        host: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        repo: String,
        #[arg(long, default_value = "gitea", value_parser = parse_kind)]
        kind: EndpointKind,
        /// Connect directly instead of through the proxy.
        #[arg(long)]
        no_proxy: bool,
    },
    /// Change fields of an endpoint.
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        repo: Option<String>,
        #[arg(long)]
        proxy: Option<bool>,
    },
    /// Remove an endpoint.
    Remove { id: i64 },
}

#[derive(Subcommand)]
enum ManifestAction {
    /// Rebuild the manifest from the repository's `parent/child` directories.
    ///
    /// Existing items keep their ids and aliases. Without a usable endpoint
    /// only the id migration runs.
    Update {
        /// Only migrate ids to the current format; no network access.
        #[arg(long)]
        migrate_only: bool,
        /// Rewrite the file even when nothing changed.
        #[arg(long)]
        force: bool,
    },
}

fn parse_status_mode(s: &str) -> Result<StatusMode, String> {
    StatusMode::parse(s).ok_or_else(|| format!("invalid status mode '{}': use human, json or off", s))
}

fn parse_kind(s: &str) -> Result<EndpointKind, String> {
    match s {
        "gitea" => Ok(EndpointKind::Gitea),
        _ => Err(format!("unsupported endpoint kind '{}'", s)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "aliaszip", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let mut cfg = config::load_config(&cli.config)?;
    if cfg.migrate_legacy() {
        config::save_config(&cli.config, &cfg)?;
    }

    let status = cli.status.unwrap_or_else(StatusMode::default_for_tty);

    match cli.command {
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
        Commands::Endpoints { action } => {
            run_endpoints(&cli.config, &mut cfg, action)?;
        }
        Commands::Manifest {
            action: ManifestAction::Update {
                migrate_only,
                force,
            },
        } => {
            let opts = UpdateOptions {
                migrate_only,
                force,
            };
            let endpoints = cfg.usable_endpoints();
            let provider = HttpProvider::new(&cfg.network)?;
            let source = match pick_endpoint(&endpoints) {
                Some(ep) if !migrate_only => Some(provider.open(ep)),
                Some(_) => None,
                None => {
                    if !migrate_only {
                        eprintln!("Warning: no endpoint configured; only migrating ids.");
                    }
                    None
                }
            };
            let outcome =
                manifest_cmd::run_manifest_update(&cfg.manifest.path, source.as_deref(), opts)
                    .await?;
            println!("{}", outcome);
        }
        Commands::Search { query, json } => {
            let table = load_table(&cfg)?;
            let matcher = Matcher::new(cfg.search.cache_limit);
            search::run_search(&matcher, &table, &query, json)?;
        }
        Commands::Download { key, output } => {
            let table = load_table(&cfg)?;
            let output_dir = output.unwrap_or_else(|| cfg.output.dir.clone());
            let endpoints = cfg.usable_endpoints();
            let provider = HttpProvider::new(&cfg.network)?;
            let reporter = status.reporter();
            let ctx = DownloadContext {
                endpoints: &endpoints,
                provider: &provider,
                reporter: reporter.as_ref(),
                output_dir: &output_dir,
                sticky_endpoint: cfg.network.sticky_endpoint,
            };
            match download_resource(&key, &table, &ctx).await? {
                DownloadOutcome::Saved { path, files } => {
                    println!("Saved {} ({} files).", path.display(), files);
                }
                DownloadOutcome::Empty => println!("No files found for {}.", key),
            }
        }
        Commands::Interactive { output } => {
            let table = Arc::new(load_table(&cfg)?);
            let matcher = Arc::new(Matcher::new(cfg.search.cache_limit));
            let output_dir = output.unwrap_or_else(|| cfg.output.dir.clone());
            let endpoints = cfg.usable_endpoints();
            let provider = HttpProvider::new(&cfg.network)?;
            let reporter = status.reporter();
            let ctx = DownloadContext {
                endpoints: &endpoints,
                provider: &provider,
                reporter: reporter.as_ref(),
                output_dir: &output_dir,
                sticky_endpoint: cfg.network.sticky_endpoint,
            };
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            interactive::run_interactive(
                stdin,
                matcher,
                table,
                Duration::from_millis(cfg.search.debounce_ms),
                &ctx,
            )
            .await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_table(cfg: &Config) -> Result<AliasTable> {
    let table = manifest::load_manifest(&cfg.manifest.path)?;
    if table.is_empty() {
        tracing::warn!("manifest {} has no entries", cfg.manifest.path.display());
    }
    Ok(table)
}

fn run_endpoints(config_path: &Path, cfg: &mut Config, action: EndpointAction) -> Result<()> {
    match action {
        EndpointAction::List => return endpoints::list_endpoints(cfg),
        EndpointAction::Add {
            name,
            host,
            owner,
            repo,
            kind,
            no_proxy,
        } => {
            let id = endpoints::add_endpoint(
                cfg,
                NewEndpoint {
                    kind,
                    name,
                    host,
                    owner,
                    repo,
                    use_proxy: !no_proxy,
                },
            )?;
            println!("Added endpoint {}.", id);
        }
        EndpointAction::Edit {
            id,
            name,
            host,
            owner,
            repo,
            proxy,
        } => {
            endpoints::edit_endpoint(
                cfg,
                id,
                EndpointEdit {
                    name,
                    host,
                    owner,
                    repo,
                    use_proxy: proxy,
                },
            )?;
            println!("Updated endpoint {}.", id);
        }
        EndpointAction::Remove { id } => {
            let removed = endpoints::remove_endpoint(cfg, id)?;
            println!("Removed endpoint {} ({}).", id, removed.name);
        }
    }
    config::save_config(config_path, cfg)
        .with_context(|| format!("Failed to save endpoints to {}", config_path.display()))
}
