use sea_orm_migration::prelude::*;

use super::idens::{qualified, DbSchema, Metrics};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(qualified(DbSchema::Monitoring, Metrics::Table))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Metrics::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Metrics::MetricName).string_len(255).not_null())
                    .col(ColumnDef::new(Metrics::MetricType).string_len(20).not_null())
                    .col(ColumnDef::new(Metrics::Value).double().not_null())
                    .col(
                        ColumnDef::new(Metrics::Labels)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Metrics::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::cust(
                        "metric_type IN ('counter', 'gauge', 'histogram', 'summary')",
                    ))
                    .to_owned(),
            )
            .await?;

        // Time-range reads are always per metric name
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_metrics_name_timestamp")
                    .table(qualified(DbSchema::Monitoring, Metrics::Table))
                    .col(Metrics::MetricName)
                    .col((Metrics::Timestamp, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_metrics_labels \
                 ON monitoring.metrics USING gin (labels)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(qualified(DbSchema::Monitoring, Metrics::Table))
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}
