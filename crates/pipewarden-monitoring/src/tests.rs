use crate::services::*;
use chrono::{Duration, Utc};
use pipewarden_database::test_utils::TestDatabase;
use pipewarden_entities::types::MetricType;
use serde_json::json;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_query_by_labels() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let service = MetricService::new(test_db.connection_arc());
        let now = Utc::now();

        let plain = service
            .record(RecordMetricRequest::new("rows_in", MetricType::Counter, 1.0))
            .await?;
        assert_eq!(plain.labels, json!({}));

        service
            .record(
                RecordMetricRequest::new("rows_in", MetricType::Counter, 10.0)
                    .with_labels(json!({"pipeline": "orders", "stage": "load"}))
                    .at(now - Duration::minutes(5)),
            )
            .await?;
        service
            .record(
                RecordMetricRequest::new("rows_in", MetricType::Counter, 20.0)
                    .with_labels(json!({"pipeline": "orders", "stage": "extract"}))
                    .at(now - Duration::minutes(1)),
            )
            .await?;
        service
            .record(
                RecordMetricRequest::new("rows_in", MetricType::Counter, 30.0)
                    .with_labels(json!({"pipeline": "customers"}))
                    .at(now - Duration::minutes(2)),
            )
            .await?;

        let orders = service
            .query(MetricQuery {
                labels: Some(json!({"pipeline": "orders"})),
                ..MetricQuery::named("rows_in")
            })
            .await?;
        let values: Vec<f64> = orders.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![20.0, 10.0]);

        let windowed = service
            .query(MetricQuery {
                from: Some(now - Duration::minutes(3)),
                to: Some(now),
                limit: Some(1),
                ..MetricQuery::named("rows_in")
            })
            .await?;
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].value, 20.0);

        let bad_filter = service
            .query(MetricQuery {
                labels: Some(json!("orders")),
                ..MetricQuery::named("rows_in")
            })
            .await;
        assert!(matches!(bad_filter, Err(MonitoringError::Validation(_))));

        let latest = service.latest("rows_in").await?.expect("latest sample");
        assert_eq!(latest.id, plain.id);
        assert!(service.latest("missing").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let service = MetricService::new(test_db.connection_arc());

        let saved = service
            .record_batch(vec![
                RecordMetricRequest::new("lag_seconds", MetricType::Gauge, 4.0),
                RecordMetricRequest::new("lag_seconds", MetricType::Gauge, -1.5),
                RecordMetricRequest::new("load_ms", MetricType::Histogram, 120.0),
            ])
            .await?;
        assert_eq!(saved.len(), 3);

        let rejected = service
            .record_batch(vec![
                RecordMetricRequest::new("lag_seconds", MetricType::Gauge, 9.0),
                RecordMetricRequest::new("", MetricType::Gauge, 1.0),
            ])
            .await;
        assert!(matches!(rejected, Err(MonitoringError::Validation(_))));

        let lag = service.query(MetricQuery::named("lag_seconds")).await?;
        assert_eq!(lag.len(), 2);

        assert!(service.record_batch(Vec::new()).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_aggregate_and_prune() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let service = MetricService::new(test_db.connection_arc());
        let now = Utc::now();

        for (minutes_ago, value) in [(50, 2.0), (30, 4.0), (10, 9.0)] {
            service
                .record(
                    RecordMetricRequest::new("load_ms", MetricType::Histogram, value)
                        .at(now - Duration::minutes(minutes_ago)),
                )
                .await?;
        }
        service
            .record(
                RecordMetricRequest::new("load_ms", MetricType::Histogram, 100.0)
                    .at(now - Duration::days(3)),
            )
            .await?;

        let window = service
            .aggregate("load_ms", now - Duration::hours(1), now)
            .await?
            .expect("samples in window");
        assert_eq!(window.count, 3);
        assert_eq!(window.min, 2.0);
        assert_eq!(window.max, 9.0);
        assert_eq!(window.sum, 15.0);
        assert!((window.avg - 5.0).abs() < 1e-9);

        let empty = service
            .aggregate("load_ms", now + Duration::hours(1), now + Duration::hours(2))
            .await?;
        assert!(empty.is_none());

        let removed = service.prune_older_than(now - Duration::days(1)).await?;
        assert_eq!(removed, 1);
        assert_eq!(service.query(MetricQuery::named("load_ms")).await?.len(), 3);
        assert_eq!(service.prune_older_than(now - Duration::days(1)).await?, 0);

        Ok(())
    }
}
