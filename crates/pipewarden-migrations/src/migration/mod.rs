pub use sea_orm_migration::prelude::*;

mod idens;
mod m20250301_000001_create_schemas_and_extensions;
mod m20250301_000002_create_pipeline_tables;
mod m20250301_000003_create_security_tables;
mod m20250301_000004_create_monitoring_tables;
mod m20250301_000005_create_summary_views;
mod m20250301_000006_add_updated_at_triggers;
mod m20250301_000007_seed_example_rows;
mod m20250301_000008_grant_development_privileges;

pub use m20250301_000007_seed_example_rows::{EXAMPLE_PIPELINE, EXAMPLE_SCENARIO};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_schemas_and_extensions::Migration),
            Box::new(m20250301_000002_create_pipeline_tables::Migration),
            Box::new(m20250301_000003_create_security_tables::Migration),
            Box::new(m20250301_000004_create_monitoring_tables::Migration),
            Box::new(m20250301_000005_create_summary_views::Migration),
            Box::new(m20250301_000006_add_updated_at_triggers::Migration),
            Box::new(m20250301_000007_seed_example_rows::Migration),
            Box::new(m20250301_000008_grant_development_privileges::Migration),
        ]
    }
}
