//! Property-based tests for call ledger invariants.

use std::sync::Arc;

use hs_common::{Bucket, Value};
use hs_core::Ledger;
use proptest::prelude::*;

fn bucket_strategy() -> impl Strategy<Value = Bucket> {
    prop::sample::select(Bucket::ALL.to_vec())
}

fn arg_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1_000_000i32..1_000_000).prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::str),
    ]
}

/// (bucket, member name index, args)
fn op_strategy() -> impl Strategy<Value = (Bucket, u8, Vec<Value>)> {
    (
        bucket_strategy(),
        0u8..6,
        prop::collection::vec(arg_strategy(), 0..4),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Entries stay unique per (bucket, name) and every call is kept.
    #[test]
    fn entries_unique_and_calls_kept(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let ledger = Ledger::new();
        let mut expected_names: Vec<(Bucket, String)> = Vec::new();

        for (bucket, idx, args) in &ops {
            let name = format!("member{idx}");
            let entry = ledger.get_or_create(*bucket, &name, None);
            match bucket.kind() {
                hs_common::MemberKind::Callable => {
                    prop_assert!(entry.record_call(args).is_some());
                }
                hs_common::MemberKind::ObjectLike => {
                    let log = entry.method("call");
                    prop_assert!(log.is_some());
                    if let Some(log) = log {
                        log.record(args);
                    }
                }
            }
            if !expected_names.iter().any(|(b, n)| b == bucket && *n == name) {
                expected_names.push((*bucket, name));
            }
        }

        prop_assert_eq!(ledger.entry_count(), expected_names.len());
        prop_assert_eq!(ledger.total_calls(), ops.len());
        prop_assert_eq!(ledger.snapshot().total_calls(), ops.len());

        for bucket in Bucket::ALL {
            let names: Vec<String> = ledger.entries(bucket).iter().map(|e| e.name().to_string()).collect();
            let want: Vec<String> = expected_names
                .iter()
                .filter(|(b, _)| *b == bucket)
                .map(|(_, n)| n.clone())
                .collect();
            prop_assert_eq!(names, want);
        }
    }

    /// Recorded argument lists match invocation order exactly.
    #[test]
    fn callable_records_follow_invocation_order(calls in prop::collection::vec(prop::collection::vec(arg_strategy(), 0..4), 0..40)) {
        let ledger = Ledger::new();
        let entry = ledger.get_or_create(Bucket::ForeignCallables, "f", None);
        for args in &calls {
            entry.record_call(args);
        }
        let recorded: Vec<Vec<Value>> = entry.calls().into_iter().map(|c| c.args).collect();
        prop_assert_eq!(recorded, calls);
    }

    /// Concurrent recorders lose nothing and create no duplicates.
    #[test]
    fn concurrent_recording_loses_nothing(threads in 1usize..6, per_thread in 1usize..40) {
        let ledger = Arc::new(Ledger::new());
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        let entry = ledger.get_or_create(Bucket::NativeObjects, "shared", None);
                        if let Some(log) = entry.method(if i % 2 == 0 { "even" } else { "odd" }) {
                            log.record(&[Value::from(t as i32)]);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            prop_assert!(handle.join().is_ok());
        }
        prop_assert_eq!(ledger.entry_count(), 1);
        prop_assert_eq!(ledger.total_calls(), threads * per_thread);
    }
}
