use tracing_wasm::{ConsoleConfig, WASMLayerConfigBuilder};

use crate::config::AppConfig;

/// Installs the browser console subscriber. Must run once, before the app renders.
pub fn init(config: &AppConfig) {
    let level = config.tracing_level();
    let layer_config = WASMLayerConfigBuilder::new()
        .set_max_level(level)
        .set_report_logs_in_timings(false)
        .set_console_config(ConsoleConfig::ReportWithConsoleColor)
        .build();
    tracing_wasm::set_as_global_default_with_config(layer_config);
    tracing::info!(%level, api = %config.api_base_url, "dashboard starting");
}
