//! Labelled time-series metrics for the `monitoring` schema

pub mod services;

#[cfg(test)]
mod tests;

pub use services::{MetricAggregate, MetricQuery, MetricService, MonitoringError, RecordMetricRequest};
