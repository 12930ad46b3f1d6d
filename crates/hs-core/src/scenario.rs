//! Scenario files: scripted injections and calls.
//!
//! A scenario describes what an external agent adds to a live environment
//! and which calls the page then makes. `apply` injects the members,
//! `replay` performs the calls through the live bindings, so installed
//! wrappers see them exactly as page code would.
//!
//! ```json
//! {
//!   "members": [
//!     { "kind": "callable", "name": "foo", "native": true, "behavior": { "return": 1 } },
//!     { "kind": "object", "name": "bar",
//!       "methods": [ { "name": "getData", "source": "getData(a, b) { ... }" } ],
//!       "fields": { "version": 2 } }
//!   ],
//!   "calls": [ { "member": "bar", "method": "getData", "args": [1, 2] } ]
//! }
//! ```

use std::path::Path;

use hs_common::{CallResult, Function, FunctionRef, PlainObject, Result, Thrown, Value};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::environment::Environment;
use crate::logging::{event_names, truncate_for_log};

/// What a scripted callable does when invoked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    /// Return the argument list as an array.
    #[default]
    EchoArgs,
    /// Return a fixed value.
    Return(Json),
    /// Raise a failure carrying this message.
    Throw(String),
}

impl Behavior {
    fn call(&self, args: &[Value]) -> CallResult {
        match self {
            Behavior::EchoArgs => Ok(Value::Array(args.to_vec())),
            Behavior::Return(json) => Ok(Value::from_json(json)),
            Behavior::Throw(msg) => Err(Thrown::message(msg.clone())),
        }
    }
}

/// A method of a scripted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub native: bool,
    #[serde(default)]
    pub behavior: Behavior,
}

/// One injected global member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberSpec {
    Callable {
        name: String,
        /// Source text. Ignored when `native` is set; when both are absent
        /// the callable has no obtainable source.
        #[serde(default)]
        source: Option<String>,
        /// Report the canonical native form.
        #[serde(default)]
        native: bool,
        #[serde(default)]
        behavior: Behavior,
    },
    Object {
        name: String,
        #[serde(default = "default_class")]
        class: String,
        #[serde(default)]
        methods: Vec<MethodSpec>,
        #[serde(default)]
        fields: serde_json::Map<String, Json>,
    },
    Value {
        name: String,
        value: Json,
    },
}

fn default_class() -> String {
    "Object".to_string()
}

impl MemberSpec {
    pub fn name(&self) -> &str {
        match self {
            MemberSpec::Callable { name, .. }
            | MemberSpec::Object { name, .. }
            | MemberSpec::Value { name, .. } => name,
        }
    }

    fn build(&self) -> Value {
        match self {
            MemberSpec::Callable {
                name,
                source,
                native,
                behavior,
            } => Value::Function(scripted_function(name, source.as_deref(), *native, behavior)),
            MemberSpec::Object {
                class,
                methods,
                fields,
                ..
            } => {
                let obj = PlainObject::new(class.as_str());
                for (key, value) in fields {
                    obj.define(key, Value::from_json(value), true);
                }
                for m in methods {
                    let func = scripted_function(&m.name, m.source.as_deref(), m.native, &m.behavior);
                    obj.define(&m.name, Value::Function(func), true);
                }
                Value::Object(obj.into_ref())
            }
            MemberSpec::Value { value, .. } => Value::from_json(value),
        }
    }
}

fn scripted_function(name: &str, source: Option<&str>, native: bool, behavior: &Behavior) -> FunctionRef {
    let behavior = behavior.clone();
    let body = move |_: &Value, args: &[Value]| behavior.call(args);
    match (native, source) {
        (true, _) => Function::native(name, body),
        (false, Some(src)) => Function::scripted(name, src, body),
        (false, None) => Function::opaque(name, body),
    }
}

/// A call the page makes after injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSpec {
    pub member: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub args: Vec<Json>,
}

/// Result of one replayed call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub member: String,
    pub method: Option<String>,
    pub result: CallResult,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub description: Option<String>,
    pub members: Vec<MemberSpec>,
    pub calls: Vec<CallSpec>,
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Bind every member into `env`, in file order.
    pub fn apply(&self, env: &Environment) {
        for member in &self.members {
            env.bind(member.name(), member.build());
        }
    }

    /// Perform every call through `env`'s current bindings.
    pub fn replay(&self, env: &Environment) -> Vec<CallOutcome> {
        self.calls
            .iter()
            .map(|call| {
                let args: Vec<Value> = call.args.iter().map(Value::from_json).collect();
                let result = match &call.method {
                    Some(method) => env.call_method(&call.member, method, &args),
                    None => env.call(&call.member, &args),
                };
                let shown = match &result {
                    Ok(v) => v.to_display_string(),
                    Err(thrown) => thrown.to_string(),
                };
                tracing::debug!(
                    target: event_names::SCENARIO_CALL,
                    member = call.member.as_str(),
                    method = call.method.as_deref().unwrap_or(""),
                    ok = result.is_ok(),
                    result = truncate_for_log(&shown, 120).as_str(),
                    "Scenario call replayed"
                );
                CallOutcome {
                    member: call.member.clone(),
                    method: call.method.clone(),
                    result,
                }
            })
            .collect()
    }
}
