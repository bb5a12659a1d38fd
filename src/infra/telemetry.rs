use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::METRIC_CACHE_EVICT;
use crate::config::{LogFormat, LoggingSettings};
use crate::loader::{
    METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_FETCH_CANCELLED, METRIC_FETCH_FAILED,
    METRIC_FETCH_MS, METRIC_FETCH_STARTED,
};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Total number of fetches served from the page cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Total number of fetches that missed the page cache."
        );
        describe_counter!(
            METRIC_CACHE_EVICT,
            Unit::Count,
            "Total number of cached pages evicted due to capacity."
        );
        describe_counter!(
            METRIC_FETCH_STARTED,
            Unit::Count,
            "Total number of network fetches started."
        );
        describe_counter!(
            METRIC_FETCH_CANCELLED,
            Unit::Count,
            "Total number of network fetches superseded before completing."
        );
        describe_counter!(
            METRIC_FETCH_FAILED,
            Unit::Count,
            "Total number of network fetches that surfaced an error."
        );
        describe_histogram!(
            METRIC_FETCH_MS,
            Unit::Milliseconds,
            "Network fetch latency in milliseconds, including mapping."
        );
    });
}
