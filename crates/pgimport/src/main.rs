//! pgimport - main entry point

use clap::Parser;
use colored::Colorize;
use pgimport::batch::{StatementBatch, STDIN_PATH};
use pgimport::config::ConfigResolver;
use pgimport::{importer, Cli};
use pgimport_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::path::Path;
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // `.env` may carry LOG_* settings as well as connection settings
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("pgimport")
        .filter_directives("sqlx=warn")
        .build();

    // LOG_* variables take precedence over the flags
    let log_config = match log_config.clone().merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} ignoring LOG_* settings: {}", "Warning:".yellow().bold(), e);
            log_config
        },
    };

    // The import still runs if logging cannot be set up
    let guard = init_logging(&log_config).ok();

    let code = match run(&cli).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "Import failed");
            eprintln!("{} {}", "Error:".red().bold(), e);
            e.exit_code()
        },
    };

    drop(guard);
    process::exit(code);
}

async fn run(cli: &Cli) -> pgimport::Result<()> {
    let config = ConfigResolver::new()
        .with_parameters(cli.connection.clone())
        .resolve()?;
    info!(endpoint = %config, "Configuration resolved");

    let infile = cli.infile.as_deref().unwrap_or(Path::new(STDIN_PATH));
    let batch = StatementBatch::from_input(infile)?;
    info!(source = %batch.source(), statements = batch.len(), "Loaded SQL statements");

    if cli.dry_run {
        println!(
            "{} {} statements from '{}' would be imported into {}",
            "dry run:".cyan().bold(),
            batch.len(),
            batch.source(),
            config
        );
        return Ok(());
    }

    let report = importer::import(&batch, &config).await?;

    println!(
        "{} Imported {} statements from '{}' into {}",
        "✓".green(),
        report.statements_applied,
        report.source,
        config
    );

    Ok(())
}
