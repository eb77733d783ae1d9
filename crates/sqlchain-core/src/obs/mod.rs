//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Logging goes through `tracing`; counters go through the sink boundary.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{ElementCounters, ElementSummary, EventOps, EventPerf, EventReport, EventState};
pub use sink::{
    CacheOutcome, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink,
};
