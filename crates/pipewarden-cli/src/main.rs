//! Pipewarden CLI
//!
//! Operates the pipeline, security and monitoring schemas: migrations,
//! connectivity checks, reports over the derived views and secret generation.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CheckCommand, MigrateCommand, ReportCommand, SecretsCommand};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "PIPEWARDEN_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "PIPEWARDEN_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply, roll back or inspect schema migrations
    Migrate(MigrateCommand),
    /// Verify connectivity and report what the database contains
    Check(CheckCommand),
    /// Print the execution summary or security posture views
    Report(ReportCommand),
    /// Generate random secrets for the deployment environment file
    Secrets(SecretsCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins when set; otherwise our crates log at the requested level
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .map_err(|e| anyhow::anyhow!("Invalid RUST_LOG environment variable: {}", e))?
    } else {
        tracing_subscriber::EnvFilter::new(format!(
            "pipewarden={level},\
             pipewarden_cli={level},\
             pipewarden_core={level},\
             pipewarden_database={level},\
             pipewarden_migrations={level},\
             pipewarden_pipelines={level},\
             pipewarden_security={level},\
             pipewarden_monitoring={level},\
             sea_orm_migration={level},\
             sqlx=warn,\
             sea_orm=warn",
            level = cli.log_level
        ))
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Migrate(cmd) => cmd.execute(),
        Commands::Check(cmd) => cmd.execute(),
        Commands::Report(cmd) => cmd.execute(),
        Commands::Secrets(cmd) => cmd.execute(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "pipewarden",
            "--log-format",
            "full",
            "report",
            "executions",
            "--pipeline",
            "orders_daily",
            "--limit",
            "5",
        ])
        .expect("valid arguments");
        assert_eq!(cli.log_format, "full");
        assert!(matches!(cli.command, Commands::Report(_)));

        let cli = Cli::try_parse_from(["pipewarden", "migrate", "down", "2"]).expect("valid");
        assert!(matches!(cli.command, Commands::Migrate(_)));

        assert!(Cli::try_parse_from(["pipewarden", "migrate", "sideways"]).is_err());
    }
}
