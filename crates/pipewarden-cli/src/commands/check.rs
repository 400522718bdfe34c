use anyhow::Context;
use clap::Args;
use colored::Colorize;
use pipewarden_core::MANAGED_SCHEMAS;
use pipewarden_database::{connect_without_migrations, queries, DbConnection};
use tracing::{debug, warn};

use super::DatabaseArgs;

#[derive(Args)]
pub struct CheckCommand {
    #[command(flatten)]
    database: DatabaseArgs,
}

/// Prints the report and returns the schemas that are missing
async fn run_check(db: &DbConnection) -> anyhow::Result<Vec<&'static str>> {
    let version = queries::server_version(db).await?;
    let identity = queries::current_identity(db).await?;
    let schemas = queries::existing_schemas(db).await?;
    debug!("Found schemas: {:?}", schemas);

    println!();
    println!("{} {}", "Server:".bright_white().bold(), version);
    println!(
        "{} {} as {}",
        "Database:".bright_white().bold(),
        identity.database.bright_cyan(),
        identity.user_name.bright_cyan()
    );
    println!();

    let counts = queries::row_counts(db).await?;
    let mut missing = Vec::new();

    for schema in MANAGED_SCHEMAS {
        if !schemas.iter().any(|s| s == schema) {
            println!("{} schema {}", "✗".bright_red(), schema.bright_red());
            missing.push(schema);
            continue;
        }
        println!("{} schema {}", "✓".bright_green(), schema.bright_white().bold());

        let tables = queries::schema_tables(db, schema).await?;
        for count in counts.iter().filter(|c| c.schema == schema) {
            match count.rows {
                Some(rows) => println!("    {:<24} {:>8} rows", count.table, rows),
                None => println!("    {:<24} {}", count.table, "missing".bright_red()),
            }
        }
        for extra in tables
            .iter()
            .filter(|t| !counts.iter().any(|c| c.schema == schema && &c.table == *t))
        {
            println!("    {:<24} {}", extra, "unmanaged".dimmed());
        }
    }

    println!();
    if missing.contains(&"pipeline") {
        return Ok(missing);
    }
    let active = queries::active_pipeline_names(db).await?;
    if active.is_empty() {
        println!("{}", "No active pipelines".bright_yellow());
    } else {
        println!("{}", "Active pipelines:".bright_white().bold());
        for name in active {
            println!("  - {}", name);
        }
    }
    println!();

    Ok(missing)
}

impl CheckCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = self.database.config()?;
        let rt = tokio::runtime::Runtime::new()?;

        let db = rt
            .block_on(connect_without_migrations(&config))
            .context("Failed to connect to the database")?;
        let missing = rt.block_on(run_check(&db))?;

        if !missing.is_empty() {
            warn!("Missing schemas: {}", missing.join(", "));
            anyhow::bail!(
                "{} of {} schemas are missing; run `pipewarden migrate up`",
                missing.len(),
                MANAGED_SCHEMAS.len()
            );
        }

        println!("{}", "Database check passed".bright_green().bold());
        Ok(())
    }
}
