//! Logging and span export.
//!
//! Match dispatch, runner callbacks, and the batch workers all narrate
//! through `tracing`; this module installs the subscriber they write to.
//! When an OTLP endpoint is configured, spans are batch-exported so a whole
//! scrimmage or tournament can be followed across its callback boundaries;
//! without one the service just logs to stdout.

use crate::config::Config;
use crate::error::{AppError, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::runtime;
use opentelemetry_sdk::trace::{Sampler, TracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Handle returned by [`init`]. Dropping it without calling
/// [`Telemetry::shutdown`] can lose the spans of the last batch still
/// sitting in the export queue.
pub struct Telemetry {
    provider: Option<TracerProvider>,
}

impl Telemetry {
    /// Flushes queued spans and stops the exporter. Called after the server
    /// loop exits.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(err) = provider.shutdown() {
                tracing::warn!(%err, "span exporter did not shut down cleanly");
            }
        }
    }
}

pub fn init(config: &Config) -> Result<Telemetry> {
    let provider = config
        .otlp_endpoint
        .as_deref()
        .map(|endpoint| build_provider(config, endpoint))
        .transpose()?;

    let otlp_layer = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer("matches")));

    // match lifecycle logs at info; connection-pool and http chatter stay out
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otlp_layer)
        .init();

    match (&provider, &config.otlp_endpoint) {
        (Some(provider), Some(endpoint)) => {
            global::set_tracer_provider(provider.clone());
            tracing::info!(endpoint = %endpoint, "exporting match spans over OTLP");
        }
        _ => {
            tracing::info!("OTLP export disabled - match activity is logged locally only");
        }
    }

    Ok(Telemetry { provider })
}

fn build_provider(config: &Config, endpoint: &str) -> Result<TracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| AppError::Telemetry(format!("could not build OTLP exporter: {e}")))?;

    let resource = Resource::new([
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            config.service_name.clone(),
        ),
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
            env!("CARGO_PKG_VERSION"),
        ),
    ]);

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource)
        .build())
}
