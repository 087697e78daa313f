//! Command-line interface.

use crate::build::build_index_from_dir;
use crate::config::Config;
use crate::error::Result;
use crate::index::{load_index, validate, write_index};
use crate::search::ObjectFilter;
use crate::server::IndexServer;
use crate::state::{IndexState, SearchSettings, spawn_watcher};
use crate::tools::{
    ListObjectsRequest, LookupTermRequest, SearchRequest, SearchScope, handle_list_objects,
    handle_lookup_term, handle_search,
};
use crate::tracing::LogFormat;
use anyhow::Context;
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "searchindex-mcp")]
#[command(about = "Query and regenerate Sphinx documentation search indexes", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Config file (default: $SEARCHINDEX_MCP_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the MCP tools over stdio (default)
    Serve {
        /// Index used when a tool call gives no path
        #[arg(short, long)]
        index: Option<PathBuf>,
    },
    /// Search an index
    Search {
        index: PathBuf,
        query: String,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the documents containing a raw index term
    Lookup { index: PathBuf, term: String },
    /// List catalogued API objects
    Objects {
        index: PathBuf,
        #[arg(long)]
        namespace: Option<String>,
        /// Role such as `class` or `py:method`
        #[arg(short, long)]
        kind: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Check an index's structure; exits non-zero on violations
    Validate { index: PathBuf },
    /// Show index statistics
    Stats { index: PathBuf },
    /// Build a searchindex.js from a documentation source tree
    Build {
        source: PathBuf,
        #[arg(short, long, default_value = "searchindex.js")]
        output: PathBuf,
    },
}

impl Cli {
    /// Runs the selected command.
    pub async fn run(self) -> Result<ExitCode> {
        let config = Config::load(self.config.as_deref())?;
        let command = self.command.unwrap_or(Commands::Serve { index: None });

        match command {
            Commands::Serve { index } => serve(config, index).await,
            Commands::Search {
                index,
                query,
                limit,
                json,
            } => search(&config, &index, query, limit, json).await,
            Commands::Lookup { index, term } => {
                let state = cli_state(&config);
                let request = LookupTermRequest {
                    term,
                    path: Some(path_arg(&index)),
                };
                print_tool_output(handle_lookup_term(&state, request).await)
            }
            Commands::Objects {
                index,
                namespace,
                kind,
                json,
            } => objects(&config, &index, namespace, kind, json).await,
            Commands::Validate { index } => validate_command(&index).await,
            Commands::Stats { index } => {
                let loaded = load_index(&index).await?;
                let stats = loaded.stats();
                println!("{}", serde_json::to_string_pretty(&stats)?);
                Ok(ExitCode::SUCCESS)
            }
            Commands::Build { source, output } => {
                let index = build_index_from_dir(&source).await?;
                write_index(&output, &index).await?;
                let stats = index.stats();
                println!(
                    "Wrote {} ({} documents, {} terms, {} objects)",
                    output.display(),
                    stats.documents,
                    stats.terms,
                    stats.objects
                );
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// CLI commands run once, so snapshots only pay off for the server.
fn cli_state(config: &Config) -> Arc<IndexState> {
    let config = Config {
        snapshot_cache: false,
        ..config.clone()
    };
    Arc::new(IndexState::from_config(&config))
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn print_tool_output(output: std::result::Result<String, String>) -> Result<ExitCode> {
    match output {
        Ok(text) => {
            print!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
        Err(message) => anyhow::bail!(message),
    }
}

/// Prints the validation report; violations turn into a failing exit code.
async fn validate_command(index: &Path) -> Result<ExitCode> {
    let loaded = load_index(index).await?;
    let report = validate(&loaded);
    println!("{}: {}", index.display(), report);
    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn serve(config: Config, index: Option<PathBuf>) -> Result<ExitCode> {
    tracing::info!("Starting searchindex-mcp MCP server");

    let state = Arc::new(IndexState::from_config(&config));
    if let Some(index) = index {
        state.set_default_path(index).await;
    }
    if let Some(path) = state.default_path().await {
        // Warm the cache; a broken default is reported but not fatal
        if let Err(e) = state.get(&path).await {
            tracing::warn!("Default index unavailable: {}", e);
        }
    }

    let watcher = config
        .watch_interval()
        .map(|period| spawn_watcher(state.clone(), period));

    let server = IndexServer::new(state);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;
    service.waiting().await?;

    if let Some(watcher) = watcher {
        watcher.abort();
    }
    Ok(ExitCode::SUCCESS)
}

async fn search(
    config: &Config,
    index: &Path,
    query: String,
    limit: Option<usize>,
    json: bool,
) -> Result<ExitCode> {
    if json {
        let loaded = load_index(index).await?;
        let engine = SearchSettings::from_config(config).engine(&loaded);
        let limit = limit.filter(|&n| n > 0).unwrap_or(config.default_limit);
        let results = engine.search(&query, limit);
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(ExitCode::SUCCESS);
    }

    let state = cli_state(config);
    let request = SearchRequest {
        query,
        path: Some(path_arg(index)),
        limit,
        scope: Some(SearchScope::All),
    };
    print_tool_output(handle_search(&state, request).await)
}

async fn objects(
    config: &Config,
    index: &Path,
    namespace: Option<String>,
    kind: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    if json {
        let loaded = load_index(index).await?;
        let engine = SearchSettings::from_config(config).engine(&loaded);
        let objects = engine.list_objects(ObjectFilter {
            namespace: namespace.as_deref(),
            kind: kind.as_deref(),
        });
        let text = serde_json::to_string_pretty(&objects)
            .context("Failed to serialize objects")?;
        println!("{}", text);
        return Ok(ExitCode::SUCCESS);
    }

    let state = cli_state(config);
    let request = ListObjectsRequest {
        path: Some(path_arg(index)),
        namespace,
        kind,
    };
    print_tool_output(handle_list_objects(&state, request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["searchindex-mcp"]).unwrap();
        check!(cli.command.is_none());
        check!(cli.log_format == LogFormat::Compact);
    }

    #[test]
    fn test_search_arguments() {
        let cli = Cli::try_parse_from([
            "searchindex-mcp",
            "search",
            "docs/searchindex.js",
            "gate client",
            "-n",
            "3",
            "--json",
            "--log-format",
            "json",
        ])
        .unwrap();
        let_assert!(
            Some(Commands::Search {
                index,
                query,
                limit,
                json
            }) = cli.command
        );
        check!(index == PathBuf::from("docs/searchindex.js"));
        check!(query == "gate client");
        check!(limit == Some(3));
        check!(json);
        check!(cli.log_format == LogFormat::Json);
    }

    #[test]
    fn test_build_default_output() {
        let cli = Cli::try_parse_from(["searchindex-mcp", "build", "docs/source"]).unwrap();
        let_assert!(Some(Commands::Build { source, output }) = cli.command);
        check!(source == PathBuf::from("docs/source"));
        check!(output == PathBuf::from("searchindex.js"));
    }

    #[tokio::test]
    async fn test_validate_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.js");
        let broken = dir.path().join("broken.js");
        std::fs::write(
            &good,
            r#"Search.setIndex({"docnames":["a"],"filenames":["a.rst"],"titles":["A"],"terms":{"foo":0},"objects":{},"objtypes":{},"objnames":{},"titleterms":{},"envversion":{}})"#,
        )
        .unwrap();
        std::fs::write(
            &broken,
            r#"Search.setIndex({"docnames":["a"],"filenames":["a.rst"],"titles":["A"],"terms":{"foo":[0,3]},"objects":{},"objtypes":{},"objnames":{},"titleterms":{},"envversion":{}})"#,
        )
        .unwrap();

        check!(validate_command(&good).await.unwrap() == ExitCode::SUCCESS);
        check!(validate_command(&broken).await.unwrap() == ExitCode::FAILURE);
        let_assert!(Err(_) = validate_command(&dir.path().join("missing.js")).await);
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["searchindex-mcp", "stats", "x.js", "--config", "c.toml"]).unwrap();
        check!(cli.config == Some(PathBuf::from("c.toml")));
    }
}
