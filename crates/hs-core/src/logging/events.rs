//! Pipeline stages, event names, and correlation context.

use serde::{Deserialize, Serialize};

/// Stages of the detection-and-recording pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reference environment construction and teardown.
    Baseline,
    /// Object-graph enumeration.
    Walk,
    /// Live-vs-baseline comparison.
    Diff,
    /// Wrapper installation.
    Install,
    /// Invocations flowing through installed wrappers.
    Record,
    /// Ledger rendering.
    Report,
    /// Handing rendered text to a sink.
    Export,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Baseline => "baseline",
            Stage::Walk => "walk",
            Stage::Diff => "diff",
            Stage::Install => "install",
            Stage::Record => "record",
            Stage::Report => "report",
            Stage::Export => "export",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_ERROR: &str = "config.error";

    // Baseline
    pub const BASELINE_LOADED: &str = "baseline.loaded";
    pub const BASELINE_UNAVAILABLE: &str = "baseline.unavailable";
    pub const BASELINE_RELEASED: &str = "baseline.released";

    // Walk
    pub const WALK_FINISHED: &str = "walk.finished";
    pub const WALK_AMBIGUOUS: &str = "walk.ambiguous";

    // Diff
    pub const DIFF_VERDICT: &str = "diff.verdict";
    pub const DIFF_FINISHED: &str = "diff.finished";

    // Install
    pub const INSTALL_APPLIED: &str = "install.applied";
    pub const INSTALL_SKIPPED: &str = "install.skipped";
    pub const INSTALL_REBASED: &str = "install.rebased";
    pub const INSTALL_FINISHED: &str = "install.finished";

    // Record
    pub const LEDGER_RECORDED: &str = "ledger.recorded";
    pub const LEDGER_SUMMARY: &str = "ledger.summary";

    // Report / export
    pub const REPORT_RENDERED: &str = "report.rendered";
    pub const EXPORT_SUCCEEDED: &str = "export.succeeded";
    pub const EXPORT_FAILED: &str = "export.failed";

    // Scenario replay
    pub const SCENARIO_CALL: &str = "scenario.call";
}

/// Correlation IDs attached to every pipeline event.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
    /// Host identifier.
    pub host_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            host_id: host_id.into(),
        }
    }

    /// Fresh context with a generated run ID and the local host ID.
    pub fn generate() -> Self {
        LogContext::new(super::generate_run_id(), super::get_host_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Baseline.to_string(), "baseline");
        assert_eq!(Stage::Install.to_string(), "install");
        assert_eq!(Stage::Export.to_string(), "export");
    }

    #[test]
    fn test_log_context() {
        let ctx = LogContext::new("run-abc", "host-xyz");
        assert_eq!(ctx.run_id, "run-abc");
        assert_eq!(ctx.host_id, "host-xyz");
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_names::INSTALL_SKIPPED, "install.skipped");
        assert_eq!(event_names::EXPORT_FAILED, "export.failed");
    }
}
