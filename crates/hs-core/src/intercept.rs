//! Interceptor factory.
//!
//! Replaces each injected member with a recording wrapper. The true original
//! is kept in a side table keyed by `<name><backup_suffix>`; a second install
//! first restores the slot from that backup, so at most one layer of
//! interception exists no matter how many detection passes run. When the
//! page has since rebound the member to a value of another kind, the stale
//! backup is discarded and the new value becomes the original.
//!
//! Callables get a call-forwarding wrapper. Objects get an [`ObjectProxy`]
//! that forwards every property operation and hands out recording wrappers
//! for callable properties on read.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use hs_common::{
    Bucket, CallResult, Error, Function, FunctionRef, Interceptable, MemberKind, ObjectRef,
    OwnKey, Result, Value,
};
use hs_config::detection::DetectionConfig;

use crate::diff::InjectionVerdict;
use crate::environment::Environment;
use crate::ledger::Ledger;
use crate::log_event;
use crate::logging::{event_names, truncate_for_log, LogContext, Stage};

/// Longest argument rendering kept in per-call debug events.
const ARGS_LOG_MAX: usize = 256;

/// What `install` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// First wrap of this member.
    Installed,
    /// A previous wrapper was discarded and the original re-wrapped.
    Reinstalled,
}

impl InstallOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallOutcome::Installed => "installed",
            InstallOutcome::Reinstalled => "reinstalled",
        }
    }
}

impl std::fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installs recording wrappers into one live environment.
pub struct Interceptor {
    env: Environment,
    ledger: Arc<Ledger>,
    detection: DetectionConfig,
    backups: Mutex<HashMap<String, Value>>,
    ctx: LogContext,
}

impl Interceptor {
    pub fn new(env: Environment, ledger: Arc<Ledger>, detection: &DetectionConfig) -> Self {
        Interceptor {
            env,
            ledger,
            detection: detection.clone(),
            backups: Mutex::new(HashMap::new()),
            ctx: LogContext::new("run-unset", "host-unset"),
        }
    }

    pub fn with_log_context(mut self, ctx: LogContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn backup_key(&self, name: &str) -> String {
        self.detection.backup_key(name)
    }

    /// Whether a wrapper has ever been installed for `name`.
    pub fn is_installed(&self, name: &str) -> bool {
        self.backups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&self.backup_key(name))
    }

    /// The backed-up true original of `name`.
    pub fn original(&self, name: &str) -> Option<Value> {
        self.backups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.backup_key(name))
            .cloned()
    }

    /// Wrap the member named by `verdict`. Idempotent.
    ///
    /// Fails with [`Error::InstallationConflict`] when the member was
    /// deleted, or when neither the backup nor the live value is of the
    /// verdict's kind.
    pub fn install(&self, verdict: &InjectionVerdict) -> Result<InstallOutcome> {
        let name = verdict.name.as_str();
        let current = self.env.lookup(name);
        if current.is_nullish() {
            return Err(conflict(name, "member no longer present"));
        }

        let key = self.backup_key(name);
        let mut backups = self.backups.lock().unwrap_or_else(PoisonError::into_inner);
        let (original, outcome) = match backups.get(&key) {
            Some(saved) if matches_kind(saved, verdict.kind) => {
                (saved.clone(), InstallOutcome::Reinstalled)
            }
            Some(saved) if matches_kind(&current, verdict.kind) => {
                log_event!(
                    self.ctx,
                    WARN,
                    event_names::INSTALL_REBASED,
                    Stage::Install,
                    "Member rebound to another kind; replacing stale backup",
                    member = name,
                    stale = saved.type_name(),
                    current = current.type_name()
                );
                backups.remove(&key);
                (current, InstallOutcome::Installed)
            }
            Some(saved) => (saved.clone(), InstallOutcome::Reinstalled),
            None => (current, InstallOutcome::Installed),
        };
        if !matches_kind(&original, verdict.kind) {
            return Err(conflict(
                name,
                &format!("expected {}, found {}", verdict.kind, original.type_name()),
            ));
        }
        if outcome == InstallOutcome::Reinstalled {
            // Drop the previous wrapper before re-wrapping.
            self.env.bind(name, original.clone());
        } else {
            backups.insert(key, original.clone());
        }
        drop(backups);

        let bucket = verdict.bucket();
        self.ledger
            .get_or_create(bucket, name, verdict.source.as_deref());

        let wrapper = match original {
            Value::Function(func) => Value::Function(wrap_callable(
                func,
                self.ledger.clone(),
                bucket,
                name,
                self.ctx.clone(),
            )),
            Value::Object(obj) => Value::Object(Arc::new(ObjectProxy::new(
                obj,
                self.ledger.clone(),
                bucket,
                name,
                self.ctx.clone(),
            ))),
            other => {
                return Err(conflict(name, &format!("cannot wrap {}", other.type_name())));
            }
        };
        self.env.bind(name, wrapper);

        log_event!(
            self.ctx,
            DEBUG,
            event_names::INSTALL_APPLIED,
            Stage::Install,
            "Wrapper installed",
            member = name,
            bucket = bucket.key(),
            outcome = outcome.as_str()
        );
        Ok(outcome)
    }
}

fn conflict(name: &str, reason: &str) -> Error {
    Error::InstallationConflict {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn matches_kind(value: &Value, kind: MemberKind) -> bool {
    match kind {
        MemberKind::Callable => value.is_callable(),
        MemberKind::ObjectLike => value.is_object_like(),
    }
}

fn args_for_log(args: &[Value]) -> String {
    let rendered = Value::Array(args.to_vec())
        .to_json()
        .map(|json| json.to_string())
        .unwrap_or_else(|e| e.to_string());
    truncate_for_log(&rendered, ARGS_LOG_MAX)
}

/// Call-forwarding wrapper. Keeps the original's name and source text so a
/// later walk classifies the wrapped member exactly as it did the original.
fn wrap_callable(
    original: FunctionRef,
    ledger: Arc<Ledger>,
    bucket: Bucket,
    name: &str,
    ctx: LogContext,
) -> FunctionRef {
    let member = name.to_string();
    let fname = original.name().to_string();
    let source = original.source_text().map(str::to_string);
    Function::new(fname, source, move |this, args| {
        let entry = ledger.get_or_create(bucket, &member, None);
        let count = entry.record_call(args).unwrap_or_default();
        if tracing::enabled!(target: event_names::LEDGER_RECORDED, tracing::Level::DEBUG) {
            log_event!(
                ctx,
                DEBUG,
                event_names::LEDGER_RECORDED,
                Stage::Record,
                "Call recorded",
                member = member.as_str(),
                calls = count,
                args = args_for_log(args).as_str()
            );
        }
        original.call(this, args)
    })
}

/// Property-forwarding decorator around an injected object.
pub struct ObjectProxy {
    target: ObjectRef,
    ledger: Arc<Ledger>,
    bucket: Bucket,
    member: String,
    ctx: LogContext,
}

impl ObjectProxy {
    fn new(target: ObjectRef, ledger: Arc<Ledger>, bucket: Bucket, member: &str, ctx: LogContext) -> Self {
        ObjectProxy {
            target,
            ledger,
            bucket,
            member: member.to_string(),
            ctx,
        }
    }

    /// The wrapped original.
    pub fn target(&self) -> &ObjectRef {
        &self.target
    }

    fn wrap_method(&self, prop: &str, method: FunctionRef) -> FunctionRef {
        let target = self.target.clone();
        let ledger = self.ledger.clone();
        let bucket = self.bucket;
        let member = self.member.clone();
        let prop_name = prop.to_string();
        let ctx = self.ctx.clone();
        let fname = method.name().to_string();
        let source = method.source_text().map(str::to_string);

        Function::new(fname, source, move |_this, args| -> CallResult {
            let entry = ledger.get_or_create(bucket, &member, None);
            let count = entry
                .method(&prop_name)
                .map(|log| log.record(args))
                .unwrap_or_default();
            if tracing::enabled!(target: event_names::LEDGER_RECORDED, tracing::Level::DEBUG) {
                log_event!(
                    ctx,
                    DEBUG,
                    event_names::LEDGER_RECORDED,
                    Stage::Record,
                    "Method call recorded",
                    member = member.as_str(),
                    method = prop_name.as_str(),
                    calls = count,
                    args = args_for_log(args).as_str()
                );
            }
            method.call(&Value::Object(target.clone()), args)
        })
    }
}

impl Interceptable for ObjectProxy {
    fn class_name(&self) -> String {
        self.target.class_name()
    }

    fn get_property(&self, name: &str) -> Value {
        match self.target.get_property(name) {
            Value::Function(method) => Value::Function(self.wrap_method(name, method)),
            other => other,
        }
    }

    fn set_property(&self, name: &str, value: Value) {
        self.target.set_property(name, value);
    }

    fn delete_property(&self, name: &str) -> bool {
        self.target.delete_property(name)
    }

    fn own_keys(&self) -> Vec<OwnKey> {
        self.target.own_keys()
    }

    fn prototype(&self) -> Option<ObjectRef> {
        self.target.prototype()
    }

    fn display_string(&self) -> String {
        self.target.display_string()
    }
}
