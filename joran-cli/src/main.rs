mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use joran_core::config::JoranConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Joran CLI -- log4j 스타일 XML 설정 문서 검사 도구
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // config 하위 명령은 설정 파일 자체를 검사하므로 로드 실패도 보고 대상
    let loaded = commands::load_config(&cli.config).await;
    let general = match &loaded {
        Ok(config) => config.general.clone(),
        Err(_) => JoranConfig::default().general,
    };
    logging::init_tracing(&general, cli.log_level.as_deref())?;
    joran_core::metrics::describe_all();
    tracing::debug!(config = %cli.config.display(), "joran starting");

    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Check(args) => commands::check::execute(args, &loaded?, &writer).await,
        Commands::Rules(args) => commands::rules::execute(args, &loaded?, &writer),
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
