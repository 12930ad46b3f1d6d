//! Call-ledger record types shared by the recorder and the renderer.
//!
//! A [`CallRecord`]'s argument list is a shallow snapshot: primitives are
//! copied, but object and function arguments are shared handles, so later
//! mutation of an argument object shows up when the record is rendered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Shape of an environment member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Callable,
    ObjectLike,
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberKind::Callable => write!(f, "callable"),
            MemberKind::ObjectLike => write!(f, "object"),
        }
    }
}

/// Ledger partition: native-looking × callable-or-object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    NativeCallables,
    ForeignCallables,
    NativeObjects,
    ForeignObjects,
}

impl Bucket {
    /// Fixed report order.
    pub const ALL: [Bucket; 4] = [
        Bucket::NativeCallables,
        Bucket::ForeignCallables,
        Bucket::NativeObjects,
        Bucket::ForeignObjects,
    ];

    pub fn for_member(kind: MemberKind, native_looking: bool) -> Bucket {
        match (kind, native_looking) {
            (MemberKind::Callable, true) => Bucket::NativeCallables,
            (MemberKind::Callable, false) => Bucket::ForeignCallables,
            (MemberKind::ObjectLike, true) => Bucket::NativeObjects,
            (MemberKind::ObjectLike, false) => Bucket::ForeignObjects,
        }
    }

    pub fn kind(self) -> MemberKind {
        match self {
            Bucket::NativeCallables | Bucket::ForeignCallables => MemberKind::Callable,
            Bucket::NativeObjects | Bucket::ForeignObjects => MemberKind::ObjectLike,
        }
    }

    pub fn native_suspected(self) -> bool {
        matches!(self, Bucket::NativeCallables | Bucket::NativeObjects)
    }

    pub fn index(self) -> usize {
        match self {
            Bucket::NativeCallables => 0,
            Bucket::ForeignCallables => 1,
            Bucket::NativeObjects => 2,
            Bucket::ForeignObjects => 3,
        }
    }

    /// Stable key, also the property name on the exposed ledger view.
    pub fn key(self) -> &'static str {
        match self {
            Bucket::NativeCallables => "nativeMethods",
            Bucket::ForeignCallables => "otherInjectedMethods",
            Bucket::NativeObjects => "nativeObjects",
            Bucket::ForeignObjects => "otherInjectedObjects",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One recorded invocation. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub args: Vec<Value>,
    pub timestamp: DateTime<Utc>,
}

impl CallRecord {
    pub fn now(args: &[Value]) -> Self {
        CallRecord {
            args: args.to_vec(),
            timestamp: Utc::now(),
        }
    }
}

/// Calls recorded against one method of an object-like member.
#[derive(Debug, Clone)]
pub struct MethodCalls {
    pub name: String,
    pub calls: Vec<CallRecord>,
}

/// Recorded calls of a ledger entry, shaped by member kind.
#[derive(Debug, Clone)]
pub enum EntryCalls {
    Callable(Vec<CallRecord>),
    Object(Vec<MethodCalls>),
}

/// Point-in-time copy of one ledger entry.
#[derive(Debug, Clone)]
pub struct EntrySnapshot {
    pub name: String,
    /// Source text observed at detection time, when obtainable.
    pub source: Option<String>,
    pub calls: EntryCalls,
}

impl EntrySnapshot {
    pub fn call_count(&self) -> usize {
        match &self.calls {
            EntryCalls::Callable(calls) => calls.len(),
            EntryCalls::Object(methods) => methods.iter().map(|m| m.calls.len()).sum(),
        }
    }
}

/// Point-in-time copy of the whole ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    buckets: [Vec<EntrySnapshot>; 4],
}

impl LedgerSnapshot {
    pub fn new(buckets: [Vec<EntrySnapshot>; 4]) -> Self {
        LedgerSnapshot { buckets }
    }

    pub fn bucket(&self, bucket: Bucket) -> &[EntrySnapshot] {
        &self.buckets[bucket.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn total_calls(&self) -> usize {
        self.buckets
            .iter()
            .flatten()
            .map(EntrySnapshot::call_count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_partition_roundtrip() {
        for bucket in Bucket::ALL {
            assert_eq!(
                Bucket::for_member(bucket.kind(), bucket.native_suspected()),
                bucket
            );
        }
        assert_eq!(Bucket::ALL.map(Bucket::index), [0, 1, 2, 3]);
    }

    #[test]
    fn test_snapshot_counts() {
        let mut buckets: [Vec<EntrySnapshot>; 4] = Default::default();
        buckets[Bucket::ForeignObjects.index()].push(EntrySnapshot {
            name: "bar".into(),
            source: None,
            calls: EntryCalls::Object(vec![MethodCalls {
                name: "getData".into(),
                calls: vec![CallRecord::now(&[Value::from(1)]), CallRecord::now(&[])],
            }]),
        });
        let snap = LedgerSnapshot::new(buckets);
        assert!(!snap.is_empty());
        assert_eq!(snap.entry_count(), 1);
        assert_eq!(snap.total_calls(), 2);
        assert!(snap.bucket(Bucket::NativeCallables).is_empty());
    }
}
