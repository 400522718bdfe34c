use anyhow::Context;
use clap::{Args, Subcommand};
use colored::Colorize;
use pipewarden_database::{connect_without_migrations, DbConnection};
use pipewarden_migrations::{Migrator, MigratorTrait};
use tracing::info;

use super::DatabaseArgs;

#[derive(Args)]
pub struct MigrateCommand {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(subcommand)]
    command: MigrateCommands,
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Apply every pending migration
    Up,
    /// Roll back the most recent migrations
    Down {
        /// Number of migrations to roll back
        #[arg(default_value_t = 1)]
        steps: u32,
    },
    /// List applied and pending migrations
    Status,
    /// Roll back everything, then apply every migration again
    Fresh {
        /// Confirm that all pipeline, security and monitoring data will be lost
        #[arg(long)]
        yes: bool,
    },
}

async fn print_status(db: &DbConnection) -> anyhow::Result<()> {
    let applied = Migrator::get_applied_migrations(db).await?;
    let pending = Migrator::get_pending_migrations(db).await?;

    println!();
    println!("{}", "Migrations".bright_white().bold());
    for migration in &applied {
        println!("  {} {}", "applied".bright_green(), migration.name());
    }
    for migration in &pending {
        println!("  {} {}", "pending".bright_yellow(), migration.name());
    }
    println!();
    println!(
        "{} applied, {} pending",
        applied.len().to_string().bright_green(),
        pending.len().to_string().bright_yellow()
    );

    Ok(())
}

impl MigrateCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        if let MigrateCommands::Fresh { yes: false } = self.command {
            anyhow::bail!("migrate fresh drops every managed schema; re-run with --yes to confirm");
        }

        let config = self.database.config()?;
        let rt = tokio::runtime::Runtime::new()?;
        let db = rt
            .block_on(connect_without_migrations(&config))
            .context("Failed to connect to the database")?;

        rt.block_on(async {
            match self.command {
                MigrateCommands::Up => {
                    let pending = Migrator::get_pending_migrations(&*db).await?;
                    Migrator::up(&*db, None).await?;
                    info!("Applied {} migrations", pending.len());
                    println!(
                        "{} {} migrations applied",
                        "✓".bright_green(),
                        pending.len()
                    );
                }
                MigrateCommands::Down { steps } => {
                    Migrator::down(&*db, Some(steps)).await?;
                    info!("Rolled back up to {} migrations", steps);
                    println!("{} rolled back {} step(s)", "✓".bright_green(), steps);
                }
                MigrateCommands::Status => print_status(&db).await?,
                MigrateCommands::Fresh { .. } => {
                    // Tables live outside `public`, so roll back through each down step
                    Migrator::reset(&*db).await?;
                    Migrator::up(&*db, None).await?;
                    info!("Recreated all schemas");
                    println!("{} schemas recreated", "✓".bright_green());
                }
            }
            Ok::<(), anyhow::Error>(())
        })?;

        Ok(())
    }
}
