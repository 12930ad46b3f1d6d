//! Object-graph walker.
//!
//! Enumerates the enumerable members reachable from a root the way a host
//! `for (key in root)` loop does (own keys first, then each prototype in
//! turn, shadowed names skipped) and classifies each eligible member.
//! Nested objects are inspected one level deep and never recursed into.
//!
//! Only functions and objects are eligible. Arrays are plain data in
//! [`Value`] and are skipped like primitives, unlike host `typeof`, which
//! reports them as objects.

use std::collections::HashSet;

use hs_common::{same_object, MemberKind, ObjectRef, OrderedMap, Value};
use hs_config::detection::DetectionConfig;

use crate::fingerprint::{classify, Fingerprint};
use crate::logging::event_names;

/// One eligible member of a walked root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub name: String,
    pub kind: MemberKind,
    pub native_looking: bool,
    /// Source text of a callable, or the host string form of an object.
    /// `None` when a callable's text cannot be obtained.
    pub source: Option<String>,
}

/// Descriptors in enumeration order, unique by name.
pub type DescriptorMap = OrderedMap<MemberDescriptor>;

/// Walk parameters.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Name fragments; a key containing any of them is skipped.
    pub denylist: Vec<String>,
}

impl WalkOptions {
    pub fn from_config(detection: &DetectionConfig) -> Self {
        WalkOptions {
            denylist: detection.effective_denylist(),
        }
    }

    fn is_denied(&self, name: &str) -> bool {
        self.denylist.iter().any(|frag| name.contains(frag.as_str()))
    }
}

/// Per-walk counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Enumerable keys seen.
    pub visited: usize,
    pub denylisted: usize,
    pub nullish: usize,
    pub self_reference: usize,
    /// Neither callable nor object-like.
    pub primitive: usize,
    /// Callables (or object methods) whose source text was unavailable.
    pub ambiguous: usize,
    pub emitted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct WalkResult {
    pub descriptors: DescriptorMap,
    pub stats: WalkStats,
}

/// Walk `root` and classify every eligible member.
pub fn walk(root: &ObjectRef, options: &WalkOptions) -> WalkResult {
    let root_string = root.display_string();
    let mut result = WalkResult::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut chain: Vec<ObjectRef> = Vec::new();
    let mut current = Some(root.clone());

    while let Some(obj) = current {
        if chain.iter().any(|o| same_object(o, &obj)) {
            break;
        }
        for key in obj.own_keys() {
            // Non-enumerable own keys still shadow inherited ones.
            if !seen.insert(key.name.clone()) || !key.enumerable {
                continue;
            }
            result.stats.visited += 1;
            if let Some(desc) = inspect(root, &root_string, &key.name, options, &mut result.stats)
            {
                result.stats.emitted += 1;
                result.descriptors.insert(key.name, desc);
            }
        }
        current = obj.prototype();
        chain.push(obj);
    }

    result
}

fn inspect(
    root: &ObjectRef,
    root_string: &str,
    name: &str,
    options: &WalkOptions,
    stats: &mut WalkStats,
) -> Option<MemberDescriptor> {
    if options.is_denied(name) {
        stats.denylisted += 1;
        return None;
    }
    let value = root.get_property(name);
    if value.is_nullish() {
        stats.nullish += 1;
        return None;
    }
    if value.to_display_string() == root_string {
        stats.self_reference += 1;
        return None;
    }

    match &value {
        Value::Function(func) => {
            let fp = classify(func, name);
            if fp == Fingerprint::Unavailable {
                stats.ambiguous += 1;
                tracing::debug!(
                    target: event_names::WALK_AMBIGUOUS,
                    member = name,
                    "source text unavailable; treating as foreign"
                );
            }
            Some(MemberDescriptor {
                name: name.to_string(),
                kind: MemberKind::Callable,
                native_looking: fp.is_native(),
                source: func.source_text().map(str::to_string),
            })
        }
        Value::Object(obj) => Some(MemberDescriptor {
            name: name.to_string(),
            kind: MemberKind::ObjectLike,
            native_looking: object_all_native(name, obj, stats),
            source: Some(obj.display_string()),
        }),
        _ => {
            stats.primitive += 1;
            None
        }
    }
}

/// An object is native when every own enumerable callable property is.
/// Vacuously true for an object with no callables.
fn object_all_native(member: &str, obj: &ObjectRef, stats: &mut WalkStats) -> bool {
    let mut all_native = true;
    for prop in obj.own_enumerable_keys() {
        if let Value::Function(func) = obj.get_property(&prop) {
            match classify(&func, &prop) {
                Fingerprint::Native => {}
                Fingerprint::Foreign => all_native = false,
                Fingerprint::Unavailable => {
                    stats.ambiguous += 1;
                    tracing::debug!(
                        target: event_names::WALK_AMBIGUOUS,
                        member,
                        method = prop.as_str(),
                        "method source text unavailable; treating as foreign"
                    );
                    all_native = false;
                }
            }
        }
    }
    all_native
}
