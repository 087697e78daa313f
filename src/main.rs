use clap::Parser;
use searchindex_mcp::cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // stderr only; stdout carries the MCP protocol
    searchindex_mcp::tracing::init(cli.log_format);

    cli.run().await
}
