//! Detection-and-recording pipeline.
//!
//! `initialize` is the ready trigger: build and walk the baseline, release
//! it, walk the live environment, diff, and install wrappers. Every failure
//! along the way is recovered locally. A baseline that cannot be loaded
//! leaves the monitor inert (nothing installed) rather than erroring.
//!
//! `render_report` and `export_report` are the user-signal trigger.

use std::sync::Arc;

use hs_common::{Bucket, Interceptable, ObjectRef, OwnKey, Value};
use hs_config::Config;
use hs_report::ReportRenderer;

use crate::baseline::BaselineProvider;
use crate::diff::{diff, DiffSummary, InjectionVerdict};
use crate::environment::Environment;
use crate::export::ExportSink;
use crate::intercept::{InstallOutcome, Interceptor};
use crate::ledger::Ledger;
use crate::log_event;
use crate::logging::{event_names, truncate_for_log, LogContext, Stage};
use crate::walker::{walk, WalkOptions, WalkStats};

/// Longest source text included in detection events.
const SOURCE_LOG_MAX: usize = 200;

/// Read-only view of the ledger, bound as a global for manual inspection.
///
/// Each bucket key reads as an array of entry names. Writes are ignored.
pub struct LedgerView {
    ledger: Arc<Ledger>,
}

impl LedgerView {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        LedgerView { ledger }
    }
}

impl Interceptable for LedgerView {
    fn class_name(&self) -> String {
        "HookscopeLedger".to_string()
    }

    fn get_property(&self, name: &str) -> Value {
        match Bucket::ALL.into_iter().find(|b| b.key() == name) {
            Some(bucket) => Value::Array(
                self.ledger
                    .entries(bucket)
                    .iter()
                    .map(|e| Value::str(e.name()))
                    .collect(),
            ),
            None => Value::Undefined,
        }
    }

    fn set_property(&self, name: &str, _value: Value) {
        tracing::debug!(property = name, "Ignoring write to read-only ledger view");
    }

    fn delete_property(&self, _name: &str) -> bool {
        false
    }

    fn own_keys(&self) -> Vec<OwnKey> {
        Bucket::ALL
            .iter()
            .map(|b| OwnKey {
                name: b.key().to_string(),
                enumerable: true,
            })
            .collect()
    }

    fn prototype(&self) -> Option<ObjectRef> {
        None
    }
}

/// A member that could not be wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMember {
    pub name: String,
    pub reason: String,
}

/// Result of one detection pass.
#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    pub verdicts: Vec<InjectionVerdict>,
    pub installed: Vec<(String, InstallOutcome)>,
    pub skipped: Vec<SkippedMember>,
    pub summary: DiffSummary,
    pub live_stats: WalkStats,
    pub baseline_stats: WalkStats,
    /// False when the pass failed open because no baseline could be walked.
    pub baseline_available: bool,
}

impl DetectionReport {
    pub fn injected_count(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_clean(&self) -> bool {
        self.verdicts.is_empty()
    }
}

/// Owns the ledger and interceptor for one live environment.
pub struct Monitor {
    env: Environment,
    config: Config,
    ledger: Arc<Ledger>,
    interceptor: Interceptor,
    renderer: ReportRenderer,
    ctx: LogContext,
}

impl Monitor {
    pub fn new(env: Environment, config: Config) -> Self {
        let ledger = Arc::new(Ledger::new());
        let interceptor = Interceptor::new(env.clone(), ledger.clone(), &config.detection);
        let renderer = ReportRenderer::new(config.report.clone());
        Monitor {
            env,
            config,
            ledger,
            interceptor,
            renderer,
            ctx: LogContext::new("run-unset", "host-unset"),
        }
    }

    pub fn with_log_context(mut self, ctx: LogContext) -> Self {
        self.interceptor = self.interceptor.with_log_context(ctx.clone());
        self.ctx = ctx;
        self
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Run one detection pass against `provider`'s baseline. Safe to call
    /// again; members already wrapped are re-wrapped, never stacked.
    pub fn initialize(&self, provider: &dyn BaselineProvider) -> DetectionReport {
        let span = tracing::info_span!(
            "initialize",
            run_id = %self.ctx.run_id,
            host_id = %self.ctx.host_id
        );
        let _guard = span.enter();

        self.env.define(
            &self.config.detection.ledger_global,
            Value::Object(Arc::new(LedgerView::new(self.ledger.clone()))),
            true,
        );
        let options = WalkOptions::from_config(&self.config.detection);

        let baseline_walk = match provider.load() {
            Ok(baseline) => {
                log_event!(
                    self.ctx,
                    DEBUG,
                    event_names::BASELINE_LOADED,
                    Stage::Baseline,
                    "Baseline ready",
                    provider = provider.name()
                );
                let walked = baseline.walk(&options);
                baseline.release();
                log_event!(
                    self.ctx,
                    DEBUG,
                    event_names::BASELINE_RELEASED,
                    Stage::Baseline,
                    "Baseline released"
                );
                walked
            }
            Err(e) => Err(e),
        };
        let baseline_walk = match baseline_walk {
            Ok(walked) => walked,
            Err(e) => {
                log_event!(
                    self.ctx,
                    WARN,
                    event_names::BASELINE_UNAVAILABLE,
                    Stage::Baseline,
                    "Baseline unavailable; nothing will be instrumented",
                    provider = provider.name(),
                    error = e.to_string().as_str()
                );
                return DetectionReport::default();
            }
        };

        let live_walk = walk(&self.env.root(), &options);
        log_event!(
            self.ctx,
            DEBUG,
            event_names::WALK_FINISHED,
            Stage::Walk,
            "Live environment walked",
            visited = live_walk.stats.visited,
            emitted = live_walk.stats.emitted,
            denylisted = live_walk.stats.denylisted,
            self_reference = live_walk.stats.self_reference,
            ambiguous = live_walk.stats.ambiguous,
            baseline_emitted = baseline_walk.stats.emitted
        );

        let verdicts = diff(&live_walk.descriptors, &baseline_walk.descriptors);
        let summary = DiffSummary::new(&live_walk.descriptors, &baseline_walk.descriptors, &verdicts);
        for verdict in &verdicts {
            log_verdict(&self.ctx, verdict);
        }
        log_event!(
            self.ctx,
            INFO,
            event_names::DIFF_FINISHED,
            Stage::Diff,
            "Detection finished",
            injected = summary.injected,
            live_members = summary.live_members,
            baseline_members = summary.baseline_members
        );

        let mut report = DetectionReport {
            summary,
            live_stats: live_walk.stats,
            baseline_stats: baseline_walk.stats,
            baseline_available: true,
            ..DetectionReport::default()
        };
        for verdict in &verdicts {
            match self.interceptor.install(verdict) {
                Ok(outcome) => report.installed.push((verdict.name.clone(), outcome)),
                Err(e) => {
                    log_event!(
                        self.ctx,
                        WARN,
                        event_names::INSTALL_SKIPPED,
                        Stage::Install,
                        "Member skipped",
                        member = verdict.name.as_str(),
                        code = e.code(),
                        error = e.to_string().as_str()
                    );
                    report.skipped.push(SkippedMember {
                        name: verdict.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        log_event!(
            self.ctx,
            INFO,
            event_names::INSTALL_FINISHED,
            Stage::Install,
            "Interceptors installed",
            installed = report.installed.len(),
            skipped = report.skipped.len()
        );
        self.log_ledger_summary();

        report.verdicts = verdicts;
        report
    }

    fn log_ledger_summary(&self) {
        for bucket in Bucket::ALL {
            let entries = self.ledger.entries(bucket);
            if entries.is_empty() {
                log_event!(
                    self.ctx,
                    DEBUG,
                    event_names::LEDGER_SUMMARY,
                    Stage::Record,
                    "No entries",
                    bucket = bucket.key()
                );
            } else {
                let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
                log_event!(
                    self.ctx,
                    INFO,
                    event_names::LEDGER_SUMMARY,
                    Stage::Record,
                    "Ledger bucket",
                    bucket = bucket.key(),
                    entries = entries.len(),
                    names = names.join(", ").as_str()
                );
            }
        }
    }

    /// Render the current ledger.
    pub fn render_report(&self) -> String {
        let snapshot = self.ledger.snapshot();
        let text = self.renderer.render(&snapshot);
        log_event!(
            self.ctx,
            INFO,
            event_names::REPORT_RENDERED,
            Stage::Report,
            "Report rendered",
            entries = snapshot.entry_count(),
            calls = snapshot.total_calls()
        );
        text
    }

    /// Render and hand the report to `sink`. Failures are logged, never
    /// propagated; returns whether the sink accepted the text.
    pub fn export_report(&self, sink: &mut dyn ExportSink) -> bool {
        let text = self.render_report();
        match sink.write_text(&text) {
            Ok(()) => {
                log_event!(
                    self.ctx,
                    INFO,
                    event_names::EXPORT_SUCCEEDED,
                    Stage::Export,
                    "Report exported",
                    sink = sink.name(),
                    bytes = text.len()
                );
                true
            }
            Err(e) => {
                log_event!(
                    self.ctx,
                    ERROR,
                    event_names::EXPORT_FAILED,
                    Stage::Export,
                    "Report export failed",
                    sink = sink.name(),
                    code = e.code(),
                    error = e.to_string().as_str()
                );
                false
            }
        }
    }
}

fn log_verdict(ctx: &LogContext, verdict: &InjectionVerdict) {
    if verdict.native_looking {
        let source = verdict.source.as_deref().unwrap_or("");
        log_event!(
            ctx,
            INFO,
            event_names::DIFF_VERDICT,
            Stage::Diff,
            "Detected as injected, suspected native",
            member = verdict.name.as_str(),
            kind = verdict.kind.to_string().as_str(),
            reason = verdict.reason.to_string().as_str(),
            source = truncate_for_log(source, SOURCE_LOG_MAX).as_str()
        );
    } else {
        log_event!(
            ctx,
            INFO,
            event_names::DIFF_VERDICT,
            Stage::Diff,
            "Detected as injected",
            member = verdict.name.as_str(),
            kind = verdict.kind.to_string().as_str(),
            reason = verdict.reason.to_string().as_str()
        );
    }
}
