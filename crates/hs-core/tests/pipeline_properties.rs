//! End-to-end properties of the detect-install-record pipeline.

use std::sync::Arc;

use hs_common::{Bucket, EntryCalls, Function, Interceptable, PlainObject, Thrown, Value};
use hs_config::Config;
use hs_core::{
    DiffReason, Environment, InstallOutcome, MemorySink, Monitor, ReferenceBaseline,
};

fn native_foo() -> Value {
    Value::Function(Function::native("foo", |_, args| {
        Ok(Value::Number(args.len() as f64 * 10.0))
    }))
}

fn foreign_bar() -> Value {
    Value::Object(
        PlainObject::new("Bridge")
            .with_property("token", Value::str("abc"))
            .with_property(
                "getData",
                Value::Function(Function::scripted(
                    "getData",
                    "getData(a, b) { return bridge.call(a, b); }",
                    |_, args| match (args.first(), args.get(1)) {
                        (Some(Value::Number(a)), Some(Value::Number(b))) => {
                            Ok(Value::Number(a * b))
                        }
                        _ => Err(Thrown::type_error("getData needs two numbers")),
                    },
                )),
            )
            .into_ref(),
    )
}

fn monitored(setup: impl FnOnce(&Environment)) -> (Environment, Monitor) {
    let env = Environment::with_builtins();
    setup(&env);
    let monitor = Monitor::new(env.clone(), Config::default());
    (env, monitor)
}

// ============================================================================
// Detection scenarios
// ============================================================================

#[test]
fn native_looking_callable_lands_in_native_bucket() {
    let (env, monitor) = monitored(|env| env.bind("foo", native_foo()));
    let report = monitor.initialize(&ReferenceBaseline::platform());

    assert_eq!(report.verdicts.len(), 1);
    let v = &report.verdicts[0];
    assert_eq!(v.name, "foo");
    assert!(v.injected);
    assert!(v.native_looking);
    assert_eq!(v.reason, DiffReason::Absent);
    assert_eq!(v.bucket(), Bucket::NativeCallables);
    assert!(monitor.ledger().find(Bucket::NativeCallables, "foo").is_some());
    env.teardown();
}

#[test]
fn foreign_object_records_method_calls() {
    let (env, monitor) = monitored(|env| env.bind("bar", foreign_bar()));
    let report = monitor.initialize(&ReferenceBaseline::platform());
    assert_eq!(report.verdicts[0].bucket(), Bucket::ForeignObjects);

    let result = env.call_method("bar", "getData", &[Value::from(1), Value::from(2)]);
    assert_eq!(result, Ok(Value::from(2)));

    let entry = monitor.ledger().find(Bucket::ForeignObjects, "bar").unwrap();
    match entry.snapshot().calls {
        EntryCalls::Object(methods) => {
            assert_eq!(methods.len(), 1);
            assert_eq!(methods[0].name, "getData");
            assert_eq!(methods[0].calls.len(), 1);
            assert_eq!(methods[0].calls[0].args, vec![Value::from(1), Value::from(2)]);
        }
        EntryCalls::Callable(_) => panic!("object member recorded as callable"),
    }
    env.teardown();
}

#[test]
fn members_matching_baseline_are_untouched() {
    let host_bridge = Value::Function(Function::native("hostBridge", |_, _| Ok(Value::Null)));
    let live_value = host_bridge.clone();
    let (env, monitor) = monitored(move |env| env.bind("hostBridge", live_value));
    let provider = ReferenceBaseline::platform().with_registration(Arc::new(|env: &Environment| {
        env.bind(
            "hostBridge",
            Value::Function(Function::native("hostBridge", |_, _| Ok(Value::Null))),
        );
    }));

    let report = monitor.initialize(&provider);
    assert!(report.is_clean());
    assert_eq!(env.lookup("hostBridge"), host_bridge);
    assert!(!monitor.interceptor().is_installed("hostBridge"));
    assert_eq!(monitor.ledger().entry_count(), 0);
    env.teardown();
}

#[test]
fn builtins_never_flagged() {
    let (env, monitor) = monitored(|_| {});
    let report = monitor.initialize(&ReferenceBaseline::platform());
    assert!(report.is_clean());
    assert!(report.summary.live_members > 10);
    assert_eq!(report.summary.live_members, report.summary.baseline_members);
    env.teardown();
}

#[test]
fn overridden_builtin_is_flagged_as_changed() {
    let (env, monitor) = monitored(|env| {
        env.bind(
            "alert",
            Value::Function(Function::scripted("alert", "function alert(m) { log(m); }", |_, _| {
                Ok(Value::Undefined)
            })),
        );
    });
    let report = monitor.initialize(&ReferenceBaseline::platform());
    assert_eq!(report.verdicts.len(), 1);
    assert_eq!(report.verdicts[0].reason, DiffReason::NativeChanged);
    assert_eq!(report.verdicts[0].bucket(), Bucket::ForeignCallables);
    env.teardown();
}

// ============================================================================
// Interception properties
// ============================================================================

#[test]
fn repeated_installation_keeps_one_layer() {
    let (env, monitor) = monitored(|env| env.bind("foo", native_foo()));
    let provider = ReferenceBaseline::platform();
    let first = monitor.initialize(&provider);
    let second = monitor.initialize(&provider);
    let third = monitor.initialize(&provider);

    assert_eq!(first.installed[0].1, InstallOutcome::Installed);
    assert_eq!(second.installed[0].1, InstallOutcome::Reinstalled);
    assert_eq!(first.verdicts, third.verdicts);

    assert_eq!(env.call("foo", &[Value::Null, Value::Null]), Ok(Value::from(20)));
    assert_eq!(monitor.ledger().total_calls(), 1);
    assert_eq!(monitor.ledger().entry_count(), 1);
    env.teardown();
}

#[test]
fn wrapper_returns_and_raises_like_original() {
    let (env, monitor) = monitored(|env| env.bind("bar", foreign_bar()));
    monitor.initialize(&ReferenceBaseline::platform());

    let original = monitor.interceptor().original("bar").unwrap();
    let original = original.as_object().unwrap();
    let cases: Vec<Vec<Value>> = vec![
        vec![Value::from(3), Value::from(4)],
        vec![Value::str("x")],
        vec![],
    ];
    for args in cases {
        let expected = hs_common::invoke(original, "getData", &args);
        assert_eq!(env.call_method("bar", "getData", &args), expected);
    }
    env.teardown();
}

#[test]
fn ledger_captures_every_call_in_order() {
    let (env, monitor) = monitored(|env| env.bind("foo", native_foo()));
    monitor.initialize(&ReferenceBaseline::platform());

    let n = 25;
    for i in 0..n {
        env.call("foo", &[Value::from(i), Value::str(format!("call-{i}"))])
            .unwrap();
    }
    let calls = monitor
        .ledger()
        .find(Bucket::NativeCallables, "foo")
        .unwrap()
        .calls();
    assert_eq!(calls.len(), n as usize);
    for (i, call) in calls.iter().enumerate() {
        assert_eq!(
            call.args,
            vec![Value::from(i as i32), Value::str(format!("call-{i}"))]
        );
    }
    assert!(calls.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    env.teardown();
}

#[test]
fn object_proxy_is_transparent_for_data() {
    let (env, monitor) = monitored(|env| env.bind("bar", foreign_bar()));
    monitor.initialize(&ReferenceBaseline::platform());

    let original = monitor.interceptor().original("bar").unwrap();
    let original = original.as_object().unwrap().clone();
    let proxy = env.lookup("bar");
    let proxy = proxy.as_object().unwrap();

    assert_eq!(proxy.get_property("token"), original.get_property("token"));
    proxy.set_property("token", Value::str("rotated"));
    assert_eq!(original.get_property("token"), Value::str("rotated"));
    original.set_property("extra", Value::from(9));
    assert_eq!(proxy.get_property("extra"), Value::from(9));
    assert_eq!(proxy.get_property("missing"), Value::Undefined);
    assert_eq!(monitor.ledger().total_calls(), 0);
    env.teardown();
}

#[test]
fn late_callers_holding_the_wrapper_are_recorded() {
    let (env, monitor) = monitored(|env| env.bind("foo", native_foo()));
    monitor.initialize(&ReferenceBaseline::platform());
    let held = env.lookup("foo");

    // A later pass re-wraps; the earlier wrapper still records into the
    // same entry rather than a duplicate.
    monitor.initialize(&ReferenceBaseline::platform());
    held.as_function().unwrap().call(&Value::Undefined, &[]).unwrap();
    env.call("foo", &[]).unwrap();
    assert_eq!(monitor.ledger().entry_count(), 1);
    assert_eq!(monitor.ledger().total_calls(), 2);
    env.teardown();
}

// ============================================================================
// Reporting
// ============================================================================

#[test]
fn empty_buckets_render_none_markers() {
    let (env, monitor) = monitored(|env| env.bind("foo", native_foo()));
    monitor.initialize(&ReferenceBaseline::platform());
    let text = monitor.render_report();

    assert!(text.starts_with("Suspected native injected functions and their call records:\nMember: foo"));
    assert!(text.contains("Other injected functions: none"));
    assert!(text.contains("Suspected native injected objects: none"));
    assert!(text.ends_with("Other injected objects: none"));
    env.teardown();
}

#[test]
fn exported_report_lists_calls() {
    let (env, monitor) = monitored(|env| {
        env.bind("foo", native_foo());
        env.bind("bar", foreign_bar());
    });
    monitor.initialize(&ReferenceBaseline::platform());
    env.call("foo", &[Value::str("hello")]).unwrap();
    env.call_method("bar", "getData", &[Value::from(6), Value::from(7)])
        .unwrap();

    let mut sink = MemorySink::new();
    assert!(monitor.export_report(&mut sink));
    let text = sink.last().unwrap();
    assert!(text.contains("args: [\"hello\"]"));
    assert!(text.contains("Member: bar\nMethod: getData\nCall records:\n- called at: "));
    assert!(text.contains("args: [6,7]"));
    env.teardown();
}
