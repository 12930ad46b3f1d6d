//! The built-in platform surface.
//!
//! Both the live environment and the reference baseline start from this
//! set, so anything it registers diffs as "not injected".

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use base64::Engine;
use hs_common::{Function, FunctionRef, PlainObject, Thrown, Value};

use crate::environment::Environment;

/// Global aliases that point back at the global object itself.
pub const SELF_ALIASES: [&str; 4] = ["window", "self", "top", "frames"];

fn number_arg(args: &[Value], i: usize) -> f64 {
    match args.get(i) {
        Some(Value::Number(n)) => *n,
        Some(Value::Str(s)) => s.trim().parse().unwrap_or(f64::NAN),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Null) => 0.0,
        _ => f64::NAN,
    }
}

fn string_arg(args: &[Value], i: usize) -> String {
    args.get(i).map(Value::to_display_string).unwrap_or_else(|| "undefined".to_string())
}

fn noop(name: &str) -> FunctionRef {
    Function::native(name, |_, _| Ok(Value::Undefined))
}

fn method(name: &str, body: impl Fn(&Value, &[Value]) -> hs_common::CallResult + Send + Sync + 'static) -> Value {
    Value::Function(Function::native(name, body))
}

/// Register the platform surface on `env`.
pub fn install_builtins(env: &Environment) {
    let root = env.root();
    for alias in SELF_ALIASES {
        env.define(alias, Value::Object(root.clone()), true);
    }
    env.define("globalThis", Value::Object(root), false);

    env.set_prototype(window_prototype());

    // Primitive members; the walker skips these.
    env.define("name", Value::str(""), true);
    env.define("innerWidth", Value::from(1280), true);
    env.define("innerHeight", Value::from(720), true);
    env.define("opener", Value::Null, true);
    env.define("closed", Value::Bool(false), true);

    env.define("alert", Value::Function(noop("alert")), true);
    env.define("fetch", Value::Function(Function::native("fetch", |_, args| {
        Err(Thrown::type_error(format_args!(
            "Failed to fetch {}",
            string_arg(args, 0)
        )))
    })), true);

    let timer_ids = Arc::new(AtomicU64::new(1));
    env.define(
        "setTimeout",
        method("setTimeout", move |_, _| {
            Ok(Value::Number(timer_ids.fetch_add(1, Ordering::Relaxed) as f64))
        }),
        true,
    );
    env.define("clearTimeout", Value::Function(noop("clearTimeout")), true);
    env.define(
        "parseInt",
        method("parseInt", |_, args| {
            let text = string_arg(args, 0);
            let trimmed = text.trim();
            let digits: String = trimmed
                .char_indices()
                .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
                .map(|(_, c)| c)
                .collect();
            Ok(Value::Number(digits.parse::<i64>().map(|n| n as f64).unwrap_or(f64::NAN)))
        }),
        true,
    );
    env.define(
        "btoa",
        method("btoa", |_, args| {
            Ok(Value::Str(
                base64::engine::general_purpose::STANDARD.encode(string_arg(args, 0)),
            ))
        }),
        true,
    );
    env.define(
        "atob",
        method("atob", |_, args| {
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(string_arg(args, 0).trim())
                .map_err(|e| Thrown::message(format!("InvalidCharacterError: {e}")))?;
            Ok(Value::Str(String::from_utf8_lossy(&decoded).into_owned()))
        }),
        true,
    );
    env.define(
        "isNaN",
        method("isNaN", |_, args| Ok(Value::Bool(number_arg(args, 0).is_nan()))),
        true,
    );
    env.define(
        "encodeURIComponent",
        method("encodeURIComponent", |_, args| {
            let mut out = String::new();
            for b in string_arg(args, 0).bytes() {
                if b.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&b) {
                    out.push(b as char);
                } else {
                    out.push_str(&format!("%{:02X}", b));
                }
            }
            Ok(Value::Str(out))
        }),
        true,
    );

    env.define("console", Value::Object(console()), true);
    env.define("JSON", Value::Object(json()), true);
    env.define("Math", Value::Object(math()), true);
    env.define("localStorage", Value::Object(local_storage()), true);
    env.define("navigator", Value::Object(navigator()), true);
    env.define("document", Value::Object(document()), true);
    env.define(
        "location",
        Value::Object(
            PlainObject::new("Location")
                .with_property("href", Value::str("about:blank"))
                .with_property("reload", Value::Function(noop("reload")))
                .into_ref(),
        ),
        true,
    );
}

fn window_prototype() -> hs_common::ObjectRef {
    PlainObject::new("WindowProperties")
        .with_property("addEventListener", Value::Function(noop("addEventListener")))
        .with_property("removeEventListener", Value::Function(noop("removeEventListener")))
        .with_property(
            "dispatchEvent",
            method("dispatchEvent", |_, _| Ok(Value::Bool(true))),
        )
        .with_property("postMessage", Value::Function(noop("postMessage")))
        .into_ref()
}

fn console() -> hs_common::ObjectRef {
    let sink = |level: &'static str| {
        method(level, move |_, args| {
            let line = args
                .iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join(" ");
            tracing::debug!(target: "page.console", level, line = line.as_str());
            Ok(Value::Undefined)
        })
    };
    PlainObject::new("console")
        .with_property("log", sink("log"))
        .with_property("warn", sink("warn"))
        .with_property("error", sink("error"))
        .into_ref()
}

fn json() -> hs_common::ObjectRef {
    PlainObject::new("JSON")
        .with_property(
            "parse",
            method("parse", |_, args| {
                serde_json::from_str::<serde_json::Value>(&string_arg(args, 0))
                    .map(|json| Value::from_json(&json))
                    .map_err(|e| Thrown::message(format!("SyntaxError: {e}")))
            }),
        )
        .with_property(
            "stringify",
            method("stringify", |_, args| {
                let value = args.first().cloned().unwrap_or_default();
                value
                    .to_json()
                    .map(|json| Value::Str(json.to_string()))
                    .map_err(Thrown::type_error)
            }),
        )
        .into_ref()
}

fn math() -> hs_common::ObjectRef {
    PlainObject::new("Math")
        .with_property("abs", method("abs", |_, args| Ok(Value::Number(number_arg(args, 0).abs()))))
        .with_property("floor", method("floor", |_, args| Ok(Value::Number(number_arg(args, 0).floor()))))
        .with_property(
            "max",
            method("max", |_, args| {
                Ok(Value::Number(
                    (0..args.len()).map(|i| number_arg(args, i)).fold(f64::NEG_INFINITY, f64::max),
                ))
            }),
        )
        .with_property(
            "min",
            method("min", |_, args| {
                Ok(Value::Number(
                    (0..args.len()).map(|i| number_arg(args, i)).fold(f64::INFINITY, f64::min),
                ))
            }),
        )
        // Constants are data, not callables; they never affect classification.
        .with_property("PI", Value::Number(std::f64::consts::PI))
        .into_ref()
}

fn local_storage() -> hs_common::ObjectRef {
    let store: Arc<Mutex<HashMap<String, String>>> = Arc::default();
    let read = store.clone();
    PlainObject::new("Storage")
        .with_property(
            "getItem",
            method("getItem", move |_, args| {
                let store = read.lock().unwrap_or_else(PoisonError::into_inner);
                Ok(store
                    .get(&string_arg(args, 0))
                    .map(|v| Value::Str(v.clone()))
                    .unwrap_or(Value::Null))
            }),
        )
        .with_property(
            "setItem",
            method("setItem", move |_, args| {
                let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
                store.insert(string_arg(args, 0), string_arg(args, 1));
                Ok(Value::Undefined)
            }),
        )
        .into_ref()
}

fn navigator() -> hs_common::ObjectRef {
    PlainObject::new("Navigator")
        .with_property("userAgent", Value::str("Mozilla/5.0 (hookscope)"))
        .with_property("language", Value::str("en-US"))
        .with_property("sendBeacon", method("sendBeacon", |_, _| Ok(Value::Bool(true))))
        .into_ref()
}

fn document() -> hs_common::ObjectRef {
    PlainObject::new("HTMLDocument")
        .with_property("title", Value::str(""))
        .with_property(
            "createElement",
            method("createElement", |_, args| {
                let tag = string_arg(args, 0).to_uppercase();
                Ok(Value::Object(
                    PlainObject::new("HTMLElement")
                        .with_property("tagName", Value::Str(tag))
                        .into_ref(),
                ))
            }),
        )
        .with_property(
            "querySelector",
            Value::Function(Function::anonymous_native(|_, _| Ok(Value::Null))),
        )
        .into_ref()
}
