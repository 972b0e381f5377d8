//! Prometheus recorder behind `PROMETHEUS_ENABLED`. The request trace layer
//! feeds `http_requests_total` / `http_request_duration_seconds`; `render`
//! backs the `/metrics` route.

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    // The recorder is process-global; repeated init in tests keeps the first.
    let _ = RECORDER.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    RECORDER.get().map(|handle| handle.render())
}
