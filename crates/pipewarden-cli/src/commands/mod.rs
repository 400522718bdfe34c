pub mod check;
pub mod migrate;
pub mod report;
pub mod secrets;

pub use check::CheckCommand;
pub use migrate::MigrateCommand;
pub use report::ReportCommand;
pub use secrets::SecretsCommand;

use anyhow::Context;
use clap::Args;
use pipewarden_core::{DatabaseConfig, PostgresSettings};
use tracing::debug;

/// Connection flags shared by every command that touches the database
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Database connection URL; defaults to one built from POSTGRES_* variables
    #[arg(long, env = "PIPEWARDEN_DATABASE_URL")]
    pub database_url: Option<String>,
}

impl DatabaseArgs {
    pub fn config(&self) -> anyhow::Result<DatabaseConfig> {
        let url = match &self.database_url {
            Some(url) => url.clone(),
            None => {
                let settings = PostgresSettings::from_env()
                    .context("Failed to read POSTGRES_* settings")?;
                debug!("Using database at {}", settings.display_url());
                settings.url()
            }
        };
        Ok(DatabaseConfig::from_env(url))
    }
}
