use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

mod cli;

use cli::args::Cli;
use index_vault::config::{LoggingConfig, load_config};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.clone())?;
    init_tracing(&config.logging)?;
    cli::run(cli, config)
}

/// 日志写到 stderr，stdout 只留给命令输出。
fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
