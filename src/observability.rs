use std::net::SocketAddr;

// ── Suggestion engine ───────────────────────────────────────────

/// Counter: suggestion computations. Labels: outcome (`ok`, `unfiltered`).
pub const SUGGESTIONS_TOTAL: &str = "slotwise_suggestions_total";

/// Histogram: time to compute one suggestion set, in seconds.
pub const SUGGEST_DURATION_SECONDS: &str = "slotwise_suggest_duration_seconds";

/// Counter: booking snapshot queries that failed or timed out.
pub const BOOKING_QUERY_FAILURES_TOTAL: &str = "slotwise_booking_query_failures_total";

/// Counter: booking records skipped for missing or unparseable fields.
pub const MALFORMED_BOOKINGS_TOTAL: &str = "slotwise_malformed_bookings_total";

// ── Sessions ────────────────────────────────────────────────────

/// Counter: suggestion results discarded because the date changed meanwhile.
pub const STALE_RESPONSES_TOTAL: &str = "slotwise_stale_responses_total";

/// Counter: commit attempts. Labels: status (`ok`, `rejected`).
pub const COMMITS_TOTAL: &str = "slotwise_commits_total";

/// Install a fmt tracing subscriber (unless the host already has one) and,
/// if a port is given, the Prometheus metrics exporter.
pub fn init(metrics_port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt::try_init();

    let Some(port) = metrics_port else {
        return Ok(());
    };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
