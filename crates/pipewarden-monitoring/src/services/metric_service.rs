use chrono::Utc;
use pipewarden_database::DbConnection;
use pipewarden_entities::metrics;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::types::{MetricAggregate, MetricQuery, MonitoringError, RecordMetricRequest};

const DEFAULT_QUERY_LIMIT: u64 = 1000;

/// Stores and reads metric samples
pub struct MetricService {
    db: Arc<DbConnection>,
}

fn active_model(request: RecordMetricRequest) -> metrics::ActiveModel {
    let mut model = metrics::ActiveModel {
        metric_name: Set(request.name.trim().to_string()),
        metric_type: Set(request.metric_type),
        value: Set(request.value),
        timestamp: Set(request.timestamp.unwrap_or_else(Utc::now)),
        ..Default::default()
    };
    if let Some(labels) = request.labels {
        model.labels = Set(labels);
    }
    model
}

impl MetricService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    pub async fn record(
        &self,
        request: RecordMetricRequest,
    ) -> Result<metrics::Model, MonitoringError> {
        request.validate()?;
        Ok(active_model(request).insert(self.db.as_ref()).await?)
    }

    /// Stores every sample or none of them
    pub async fn record_batch(
        &self,
        requests: Vec<RecordMetricRequest>,
    ) -> Result<Vec<metrics::Model>, MonitoringError> {
        for (index, request) in requests.iter().enumerate() {
            request.validate().map_err(|e| match e {
                MonitoringError::Validation(message) => {
                    MonitoringError::Validation(format!("sample {}: {}", index, message))
                }
                other => other,
            })?;
        }
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin().await?;
        let mut saved = Vec::with_capacity(requests.len());
        for request in requests {
            saved.push(active_model(request).insert(&txn).await?);
        }
        txn.commit().await?;

        debug!("Recorded batch of {} metric samples", saved.len());
        Ok(saved)
    }

    /// Samples of one metric, newest first
    pub async fn query(&self, query: MetricQuery) -> Result<Vec<metrics::Model>, MonitoringError> {
        let mut select =
            metrics::Entity::find().filter(metrics::Column::MetricName.eq(query.name.trim()));

        if let Some(from) = query.from {
            select = select.filter(metrics::Column::Timestamp.gte(from));
        }
        if let Some(to) = query.to {
            select = select.filter(metrics::Column::Timestamp.lte(to));
        }
        if let Some(labels) = query.labels {
            if !labels.is_object() {
                return Err(MonitoringError::Validation(
                    "label filter must be a JSON object".to_string(),
                ));
            }
            select = select.filter(Expr::col(metrics::Column::Labels).contains(Expr::val(labels)));
        }

        Ok(select
            .order_by_desc(metrics::Column::Timestamp)
            .order_by_desc(metrics::Column::Id)
            .limit(query.limit.unwrap_or(DEFAULT_QUERY_LIMIT))
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn latest(&self, name: &str) -> Result<Option<metrics::Model>, MonitoringError> {
        Ok(metrics::Entity::find()
            .filter(metrics::Column::MetricName.eq(name.trim()))
            .order_by_desc(metrics::Column::Timestamp)
            .order_by_desc(metrics::Column::Id)
            .one(self.db.as_ref())
            .await?)
    }

    /// count/min/max/avg/sum over `[from, to]`; `None` for an empty window
    pub async fn aggregate(
        &self,
        name: &str,
        from: chrono::DateTime<Utc>,
        to: chrono::DateTime<Utc>,
    ) -> Result<Option<MetricAggregate>, MonitoringError> {
        if to < from {
            return Err(MonitoringError::Validation(
                "aggregation window ends before it starts".to_string(),
            ));
        }

        let aggregate = MetricAggregate::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"
            SELECT COUNT(*) AS count,
                   MIN(value) AS min,
                   MAX(value) AS max,
                   AVG(value) AS avg,
                   SUM(value) AS sum
            FROM monitoring.metrics
            WHERE metric_name = $1 AND timestamp >= $2 AND timestamp <= $3
            HAVING COUNT(*) > 0
            "#,
            [name.trim().into(), from.into(), to.into()],
        ))
        .one(self.db.as_ref())
        .await?;

        Ok(aggregate)
    }

    /// Deletes samples older than `cutoff`; returns how many were removed
    pub async fn prune_older_than(
        &self,
        cutoff: chrono::DateTime<Utc>,
    ) -> Result<u64, MonitoringError> {
        let result = self
            .db
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                "DELETE FROM monitoring.metrics WHERE timestamp < $1",
                [cutoff.into()],
            ))
            .await?;

        info!(
            "Pruned {} metric samples older than {}",
            result.rows_affected(),
            cutoff
        );
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewarden_entities::types::MetricType;
    use sea_orm::MockDatabase;

    #[tokio::test]
    async fn test_batch_with_one_invalid_sample_touches_nothing() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = MetricService::new(db.clone());

        let result = service
            .record_batch(vec![
                RecordMetricRequest::new("rows_in", MetricType::Counter, 5.0),
                RecordMetricRequest::new("rows_in", MetricType::Counter, -5.0),
            ])
            .await;
        match result {
            Err(MonitoringError::Validation(message)) => assert!(message.starts_with("sample 1")),
            other => panic!("expected validation error, got {:?}", other),
        }

        drop(service);
        let db = Arc::try_unwrap(db).expect("single owner");
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_rejects_inverted_window() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = MetricService::new(db);

        let now = Utc::now();
        let result = service
            .aggregate("rows_in", now, now - chrono::Duration::minutes(1))
            .await;
        assert!(matches!(result, Err(MonitoringError::Validation(_))));
    }
}
