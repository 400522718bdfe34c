use anyhow::Context;
use clap::{Args, Subcommand};
use colored::Colorize;
use pipewarden_database::{connect_without_migrations, DbConnection};
use pipewarden_entities::types::ExecutionStatus;
use pipewarden_entities::views::{ExecutionSummary, SecurityPosture};
use pipewarden_pipelines::{ExecutionService, PipelineService};
use pipewarden_security::SimulationService;
use std::sync::Arc;

use super::DatabaseArgs;

#[derive(Args)]
pub struct ReportCommand {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(subcommand)]
    command: ReportCommands,
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Recent executions with duration and failure rate
    Executions {
        /// Only executions of this pipeline
        #[arg(long)]
        pipeline: Option<String>,

        /// Maximum number of rows
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// Aggregated attack simulation results per attack type
    Security,
}

fn optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_executions(rows: &[ExecutionSummary]) {
    if rows.is_empty() {
        println!("{}", "No executions recorded".bright_yellow());
        return;
    }

    println!(
        "{:<24} {:<10} {:<20} {:>10} {:>10} {:>8} {:>7}",
        "PIPELINE".bold(),
        "STATUS".bold(),
        "STARTED".bold(),
        "SECONDS".bold(),
        "RECORDS".bold(),
        "FAILED".bold(),
        "FAIL %".bold()
    );
    for row in rows {
        let status = match row.status() {
            Some(ExecutionStatus::Completed) => row.status.bright_green(),
            Some(ExecutionStatus::Failed) | Some(ExecutionStatus::Cancelled) => {
                row.status.bright_red()
            }
            _ => row.status.bright_yellow(),
        };
        println!(
            "{:<24} {:<10} {:<20} {:>10} {:>10} {:>8} {:>7.2}",
            row.pipeline_name,
            status,
            row.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            optional(row.duration_seconds.map(|s| format!("{:.1}", s))),
            row.records_processed,
            row.records_failed,
            row.failure_rate_percent
        );
    }
}

fn print_posture(rows: &[SecurityPosture]) {
    if rows.is_empty() {
        println!("{}", "No attack simulations recorded".bright_yellow());
        return;
    }

    println!(
        "{:<20} {:>6} {:>8} {:>10} {:>10} {:>11} {:<20}",
        "ATTACK TYPE".bold(),
        "RUNS".bold(),
        "SCORE".bold(),
        "DETECTED".bold(),
        "MTTD MS".bold(),
        "SUCCESSFUL".bold(),
        "LAST RUN".bold()
    );
    for row in rows {
        let successful = if row.total_successful_attacks > 0 {
            row.total_successful_attacks.to_string().bright_red()
        } else {
            row.total_successful_attacks.to_string().bright_green()
        };
        println!(
            "{:<20} {:>6} {:>8} {:>10} {:>10} {:>11} {:<20}",
            row.attack_type,
            row.total_simulations,
            optional(row.avg_security_score.map(|s| format!("{:.1}", s))),
            optional(row.avg_detection_rate.map(|r| format!("{:.1}%", r * 100.0))),
            optional(row.avg_mttd_ms.map(|m| format!("{:.0}", m))),
            successful,
            row.last_simulation.format("%Y-%m-%d %H:%M:%S").to_string()
        );
    }
}

async fn execution_report(
    db: Arc<DbConnection>,
    pipeline: Option<String>,
    limit: u64,
) -> anyhow::Result<Vec<ExecutionSummary>> {
    let pipeline_id = match pipeline {
        Some(name) => Some(
            PipelineService::new(db.clone())
                .get_pipeline_by_name(&name)
                .await?
                .id,
        ),
        None => None,
    };
    Ok(ExecutionService::new(db)
        .list_summaries(pipeline_id, limit)
        .await?)
}

impl ReportCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = self.database.config()?;
        let rt = tokio::runtime::Runtime::new()?;
        let db = rt
            .block_on(connect_without_migrations(&config))
            .context("Failed to connect to the database")?;

        println!();
        match self.command {
            ReportCommands::Executions { pipeline, limit } => {
                let rows = rt
                    .block_on(execution_report(db, pipeline, limit))
                    .context("Failed to load the execution summary")?;
                print_executions(&rows);
            }
            ReportCommands::Security => {
                let rows = rt
                    .block_on(SimulationService::new(db).security_posture())
                    .context("Failed to load the security posture")?;
                print_posture(&rows);
            }
        }
        println!();

        Ok(())
    }
}
