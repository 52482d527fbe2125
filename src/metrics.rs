//! Metrics and tracing spans.
//!
//! With the `metrics` feature a process-wide [`METRICS`] instance counts store
//! lookups and created/updated related instances and exposes them through a
//! Prometheus registry. With the `tracing` feature [`tracing_helpers`] builds
//! the spans used around builds, reconciliation and queries.

#[cfg(feature = "metrics")]
pub use self::otel::{AutoInitMetrics, METRICS};

#[cfg(feature = "metrics")]
mod otel {
    use once_cell::sync::Lazy;
    use opentelemetry::metrics::{Counter, Histogram, MeterProvider};
    use opentelemetry_prometheus::PrometheusExporter;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::Registry;
    use std::time::Duration;

    pub static METRICS: Lazy<AutoInitMetrics> = Lazy::new(AutoInitMetrics::init);

    pub struct AutoInitMetrics {
        pub registry: Registry,
        pub provider: SdkMeterProvider,
        pub lookups_total: Counter<u64>,
        pub created_total: Counter<u64>,
        pub updated_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
    }

    impl AutoInitMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let exporter: Option<PrometheusExporter> = opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
                .map_err(|e| log::warn!("prometheus exporter unavailable: {e}"))
                .ok();

            let provider = match exporter {
                Some(exporter) => SdkMeterProvider::builder().with_reader(exporter).build(),
                None => SdkMeterProvider::builder().build(),
            };
            let meter = provider.meter("autoinit");

            let lookups_total = meter
                .u64_counter("autoinit_lookups_total")
                .with_description("Identifying-attribute lookups issued against the session")
                .build();

            let created_total = meter
                .u64_counter("autoinit_related_created_total")
                .with_description("Related instances constructed from payloads")
                .build();

            let updated_total = meter
                .u64_counter("autoinit_related_updated_total")
                .with_description("Existing related instances overwritten from payloads")
                .build();

            let query_duration = meter
                .f64_histogram("autoinit_query_duration_seconds")
                .with_description("Duration of store queries")
                .build();

            Self {
                registry,
                provider,
                lookups_total,
                created_total,
                updated_total,
                query_duration,
            }
        }

        pub fn record_lookup(&self) {
            self.lookups_total.add(1, &[]);
        }

        pub fn record_created(&self, count: usize) {
            self.created_total.add(count as u64, &[]);
        }

        pub fn record_updated(&self, count: usize) {
            self.updated_total.add(count as u64, &[]);
        }

        pub fn record_query_duration(&self, elapsed: Duration) {
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    pub fn build_span(entity: &str) -> Span {
        info_span!("autoinit.build", entity = entity)
    }

    pub fn reconcile_span(entity: &str, attr: &str, payloads: usize) -> Span {
        info_span!("autoinit.reconcile", entity = entity, attr = attr, payloads = payloads)
    }

    pub fn lookup_span(entity: &str, attr: &str) -> Span {
        info_span!("autoinit.lookup", entity = entity, attr = attr)
    }

    pub fn execute_query_span(query: &str) -> Span {
        info_span!("autoinit.query", db.statement = query)
    }
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_record_without_panicking() {
        METRICS.record_lookup();
        METRICS.record_created(2);
        METRICS.record_updated(1);
        METRICS.record_query_duration(std::time::Duration::from_millis(3));
    }
}
