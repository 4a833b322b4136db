use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and register metric descriptions
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "catalog_search_requests_total",
        "Search requests by answering source (memory or database)"
    );
    describe_counter!(
        "catalog_search_index_rebuilds_total",
        "Search index rebuilds by outcome"
    );
    describe_histogram!(
        "catalog_search_index_rebuild_duration_seconds",
        "Search index rebuild duration in seconds"
    );
    describe_counter!(
        "catalog_response_cache_total",
        "Response cache lookups by namespace and result"
    );
    describe_counter!(
        "catalog_price_quotes_total",
        "On-road price quotes, labelled by whether a fallback rate was used"
    );
    describe_gauge!("catalog_info", "Service version information");

    gauge!("catalog_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

pub fn record_search(source: &str) {
    counter!("catalog_search_requests_total", "source" => source.to_string()).increment(1);
}

pub fn record_index_rebuild(outcome: &str, duration: Duration) {
    counter!("catalog_search_index_rebuilds_total", "outcome" => outcome.to_string()).increment(1);
    histogram!("catalog_search_index_rebuild_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_cache(namespace: &str, result: &str) {
    counter!(
        "catalog_response_cache_total",
        "namespace" => namespace.to_string(),
        "result" => result.to_string(),
    )
    .increment(1);
}

pub fn record_price_quote(fallback: bool) {
    counter!("catalog_price_quotes_total", "fallback" => fallback.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_metrics() {
        init_metric_descriptions();

        record_search("memory");
        record_search("database");
        record_index_rebuild("success", Duration::from_millis(12));
        record_cache("brands", "hit");
        record_price_quote(false);
        // no recorder installed: calls are no-ops and must not panic
    }

    #[test]
    fn test_rendered_names() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_search("memory");
            record_price_quote(true);
        });

        let rendered = handle.render();
        assert!(rendered.contains("catalog_search_requests_total{source=\"memory\"} 1"));
        assert!(rendered.contains("catalog_price_quotes_total{fallback=\"true\"} 1"));
    }
}
