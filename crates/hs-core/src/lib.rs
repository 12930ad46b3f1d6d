//! Hookscope core library.
//!
//! Detects members an external agent added to a live environment and
//! records every call made to them:
//! - Environment model and built-in platform surface
//! - Native-code fingerprinting and object-graph walking
//! - Reference baselines and live-versus-baseline diffing
//! - Idempotent recording interceptors and the call ledger
//! - The `Monitor` pipeline, export sinks, and scenario replay
//! - Structured logging and CLI exit codes
//!
//! The binary entry point is in `main.rs`.

pub mod baseline;
pub mod builtins;
pub mod diff;
pub mod environment;
pub mod exit_codes;
pub mod export;
pub mod fingerprint;
pub mod intercept;
pub mod ledger;
pub mod logging;
pub mod monitor;
pub mod scenario;
pub mod walker;

pub use baseline::{BaselineEnvironment, BaselineProvider, BaselineState, ReferenceBaseline};
pub use diff::{diff, DiffReason, DiffSummary, InjectionVerdict};
pub use environment::Environment;
pub use export::{ExportSink, FileSink, MemorySink, StdoutSink};
pub use fingerprint::{is_native_looking, Fingerprint};
pub use intercept::{InstallOutcome, Interceptor, ObjectProxy};
pub use ledger::{Ledger, LedgerEntry, MethodLog};
pub use monitor::{DetectionReport, LedgerView, Monitor, SkippedMember};
pub use scenario::{CallOutcome, Scenario};
pub use walker::{walk, DescriptorMap, MemberDescriptor, WalkOptions, WalkResult, WalkStats};
