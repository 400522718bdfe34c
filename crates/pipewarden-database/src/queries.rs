//! Introspection queries for connectivity and schema health checks

use pipewarden_core::{ServiceError, ServiceResult, MANAGED_SCHEMAS};
use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, FromQueryResult, Statement};

/// Every table the migrations create, as (schema, table)
pub const KNOWN_TABLES: [(&str, &str); 7] = [
    ("pipeline", "pipelines"),
    ("pipeline", "executions"),
    ("pipeline", "validation_results"),
    ("pipeline", "audit_logs"),
    ("security", "attack_scenarios"),
    ("security", "simulation_results"),
    ("monitoring", "metrics"),
];

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ConnectionIdentity {
    pub database: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowCount {
    pub schema: String,
    pub table: String,
    /// None when the table does not exist
    pub rows: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct NameRow {
    name: String,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

fn db_error(e: DbErr) -> ServiceError {
    ServiceError::Database(e.to_string())
}

async fn names<C>(db: &C, stmt: Statement) -> ServiceResult<Vec<String>>
where
    C: ConnectionTrait,
{
    let rows = NameRow::find_by_statement(stmt)
        .all(db)
        .await
        .map_err(db_error)?;
    Ok(rows.into_iter().map(|r| r.name).collect())
}

/// `SELECT version()`
pub async fn server_version<C>(db: &C) -> ServiceResult<String>
where
    C: ConnectionTrait,
{
    let row = NameRow::find_by_statement(Statement::from_string(
        DatabaseBackend::Postgres,
        "SELECT version() AS name",
    ))
    .one(db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ServiceError::Database("version() returned no row".to_string()))?;

    Ok(row.name)
}

pub async fn current_identity<C>(db: &C) -> ServiceResult<ConnectionIdentity>
where
    C: ConnectionTrait,
{
    ConnectionIdentity::find_by_statement(Statement::from_string(
        DatabaseBackend::Postgres,
        "SELECT current_database()::TEXT AS database, current_user::TEXT AS user_name",
    ))
    .one(db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ServiceError::Database("current_database() returned no row".to_string()))
}

/// The managed schemas that currently exist, sorted by name
pub async fn existing_schemas<C>(db: &C) -> ServiceResult<Vec<String>>
where
    C: ConnectionTrait,
{
    let wanted: Vec<String> = MANAGED_SCHEMAS.iter().map(|s| s.to_string()).collect();
    names(
        db,
        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT schema_name::TEXT AS name FROM information_schema.schemata \
             WHERE schema_name = ANY($1) ORDER BY schema_name",
            [wanted.into()],
        ),
    )
    .await
}

/// Base tables of `schema`, sorted by name
pub async fn schema_tables<C>(db: &C, schema: &str) -> ServiceResult<Vec<String>>
where
    C: ConnectionTrait,
{
    names(
        db,
        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT table_name::TEXT AS name FROM information_schema.tables \
             WHERE table_schema = $1 AND table_type = 'BASE TABLE' ORDER BY table_name",
            [schema.into()],
        ),
    )
    .await
}

/// Row counts for every known table; missing tables are reported with `rows: None`
pub async fn row_counts<C>(db: &C) -> ServiceResult<Vec<TableRowCount>>
where
    C: ConnectionTrait,
{
    let mut counts = Vec::with_capacity(KNOWN_TABLES.len());

    for schema in MANAGED_SCHEMAS {
        let present = schema_tables(db, schema).await?;

        for (_, table) in KNOWN_TABLES.iter().filter(|(s, _)| *s == schema) {
            let rows = if present.iter().any(|t| t == table) {
                // Identifiers come from KNOWN_TABLES, never from input
                let row = CountRow::find_by_statement(Statement::from_string(
                    DatabaseBackend::Postgres,
                    format!("SELECT COUNT(*) AS count FROM {}.{}", schema, table),
                ))
                .one(db)
                .await
                .map_err(db_error)?;
                Some(row.map(|r| r.count).unwrap_or(0))
            } else {
                None
            };

            counts.push(TableRowCount {
                schema: schema.to_string(),
                table: table.to_string(),
                rows,
            });
        }
    }

    Ok(counts)
}

pub async fn active_pipeline_names<C>(db: &C) -> ServiceResult<Vec<String>>
where
    C: ConnectionTrait,
{
    names(
        db,
        Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT name FROM pipeline.pipelines WHERE is_active ORDER BY name",
        ),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;

    fn name_row(name: &str) -> BTreeMap<&'static str, sea_orm::Value> {
        BTreeMap::from([("name", sea_orm::Value::from(name.to_string()))])
    }

    #[tokio::test]
    async fn test_server_version_reads_single_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![name_row("PostgreSQL 17.2 on x86_64")]])
            .into_connection();

        let version = server_version(&db).await.unwrap();
        assert!(version.starts_with("PostgreSQL 17"));
    }

    #[tokio::test]
    async fn test_active_pipeline_names() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![name_row("alpha"), name_row("beta")]])
            .into_connection();

        let names = active_pipeline_names(&db).await.unwrap();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_row_counts_skips_missing_tables() {
        // pipeline: only `pipelines` exists; security and monitoring are empty
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![name_row("pipelines")]])
            .append_query_results([vec![BTreeMap::from([(
                "count",
                sea_orm::Value::from(3i64),
            )])]])
            .append_query_results([Vec::<BTreeMap<&str, sea_orm::Value>>::new()])
            .append_query_results([Vec::<BTreeMap<&str, sea_orm::Value>>::new()])
            .into_connection();

        let counts = row_counts(&db).await.unwrap();
        assert_eq!(counts.len(), KNOWN_TABLES.len());
        assert_eq!(counts[0].table, "pipelines");
        assert_eq!(counts[0].rows, Some(3));
        assert!(counts[1..].iter().all(|c| c.rows.is_none()));
    }
}
