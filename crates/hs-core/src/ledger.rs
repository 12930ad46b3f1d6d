//! The call ledger.
//!
//! Four append-only buckets of entries, unique by name within a bucket.
//! Entries are shared (`Arc`) between the ledger and the wrappers that
//! record into them; records are only ever appended.

use std::sync::{Arc, Mutex, PoisonError};

use hs_common::{
    Bucket, CallRecord, EntryCalls, EntrySnapshot, LedgerSnapshot, MemberKind, MethodCalls,
    OrderedMap, Value,
};

/// Calls recorded against one method of an object-like member.
#[derive(Debug)]
pub struct MethodLog {
    name: String,
    calls: Mutex<Vec<CallRecord>>,
}

impl MethodLog {
    fn new(name: &str) -> Self {
        MethodLog {
            name: name.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a record. Returns the new call count.
    pub fn record(&self, args: &[Value]) -> usize {
        append(&self.calls, args)
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn append(calls: &Mutex<Vec<CallRecord>>, args: &[Value]) -> usize {
    let mut calls = calls.lock().unwrap_or_else(PoisonError::into_inner);
    calls.push(CallRecord::now(args));
    calls.len()
}

#[derive(Debug)]
enum EntryLog {
    Callable(Mutex<Vec<CallRecord>>),
    Object(Mutex<OrderedMap<Arc<MethodLog>>>),
}

/// One detected member and everything recorded against it.
#[derive(Debug)]
pub struct LedgerEntry {
    name: String,
    bucket: Bucket,
    source: Option<String>,
    log: EntryLog,
}

impl LedgerEntry {
    fn new(bucket: Bucket, name: &str, source: Option<&str>) -> Self {
        let log = match bucket.kind() {
            MemberKind::Callable => EntryLog::Callable(Mutex::new(Vec::new())),
            MemberKind::ObjectLike => EntryLog::Object(Mutex::new(OrderedMap::new())),
        };
        LedgerEntry {
            name: name.to_string(),
            bucket,
            source: source.map(str::to_string),
            log,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    pub fn kind(&self) -> MemberKind {
        self.bucket.kind()
    }

    /// Source text observed when the member was first detected.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Append a call to a callable entry. `None` for object entries.
    pub fn record_call(&self, args: &[Value]) -> Option<usize> {
        match &self.log {
            EntryLog::Callable(calls) => Some(append(calls, args)),
            EntryLog::Object(_) => None,
        }
    }

    /// Method log of an object entry, created on first use. `None` for
    /// callable entries.
    pub fn method(&self, prop: &str) -> Option<Arc<MethodLog>> {
        match &self.log {
            EntryLog::Callable(_) => None,
            EntryLog::Object(methods) => {
                let mut methods = methods.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(existing) = methods.get(prop) {
                    return Some(existing.clone());
                }
                let log = Arc::new(MethodLog::new(prop));
                methods.insert(prop, log.clone());
                Some(log)
            }
        }
    }

    /// Calls of a callable entry. Empty for object entries.
    pub fn calls(&self) -> Vec<CallRecord> {
        match &self.log {
            EntryLog::Callable(calls) => calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            EntryLog::Object(_) => Vec::new(),
        }
    }

    pub fn call_count(&self) -> usize {
        match &self.log {
            EntryLog::Callable(calls) => {
                calls.lock().unwrap_or_else(PoisonError::into_inner).len()
            }
            EntryLog::Object(methods) => methods
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .values()
                .map(|m| m.len())
                .sum(),
        }
    }

    pub fn snapshot(&self) -> EntrySnapshot {
        let calls = match &self.log {
            EntryLog::Callable(_) => EntryCalls::Callable(self.calls()),
            EntryLog::Object(methods) => {
                let methods: Vec<Arc<MethodLog>> = methods
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .cloned()
                    .collect();
                EntryCalls::Object(
                    methods
                        .iter()
                        .map(|m| MethodCalls {
                            name: m.name.clone(),
                            calls: m.calls(),
                        })
                        .collect(),
                )
            }
        };
        EntrySnapshot {
            name: self.name.clone(),
            source: self.source.clone(),
            calls,
        }
    }
}

/// Process-lifetime store of detected members and their calls.
#[derive(Debug, Default)]
pub struct Ledger {
    buckets: [Mutex<Vec<Arc<LedgerEntry>>>; 4],
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Entry for `(bucket, name)`, created if missing. Safe to call from
    /// overlapping wrappers: lookup and insert happen under one lock.
    pub fn get_or_create(&self, bucket: Bucket, name: &str, source: Option<&str>) -> Arc<LedgerEntry> {
        let mut entries = self.buckets[bucket.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.iter().find(|e| e.name == name) {
            return existing.clone();
        }
        let entry = Arc::new(LedgerEntry::new(bucket, name, source));
        entries.push(entry.clone());
        entry
    }

    pub fn find(&self, bucket: Bucket, name: &str) -> Option<Arc<LedgerEntry>> {
        self.buckets[bucket.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|e| e.name == name)
            .cloned()
    }

    /// Entries of one bucket in creation order.
    pub fn entries(&self, bucket: Bucket) -> Vec<Arc<LedgerEntry>> {
        self.buckets[bucket.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::new(Bucket::ALL.map(|bucket| {
            self.entries(bucket)
                .iter()
                .map(|e| e.snapshot())
                .collect()
        }))
    }

    pub fn entry_count(&self) -> usize {
        Bucket::ALL.iter().map(|b| self.entries(*b).len()).sum()
    }

    pub fn total_calls(&self) -> usize {
        Bucket::ALL
            .iter()
            .flat_map(|b| self.entries(*b))
            .map(|e| e.call_count())
            .sum()
    }
}
