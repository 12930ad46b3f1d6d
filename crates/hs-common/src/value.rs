//! Runtime values of an inspected environment.
//!
//! Primitives and arrays are owned data. Objects and functions are shared
//! handles, so equality on them is identity, matching the host.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::function::FunctionRef;
use crate::object::{ObjectRef, PlainObject};

/// Deepest array or object nesting `to_json` will descend into.
pub const MAX_RENDER_DEPTH: usize = 256;

/// A value stored in, passed to, or returned from an environment member.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Array literal. Plain data here, never walked as an object.
    Array(Vec<Value>),
    Object(ObjectRef),
    Function(FunctionRef),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    pub fn is_object_like(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_function(&self) -> Option<&FunctionRef> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) | Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Host string conversion (`String(value)`).
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|v| {
                    if v.is_nullish() {
                        String::new()
                    } else {
                        v.to_display_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(o) => o.display_string(),
            Value::Function(f) => f.display_string(),
        }
    }

    /// Convert to JSON with host `JSON.stringify` semantics.
    ///
    /// Functions and `undefined` become `null` inside arrays and are dropped
    /// from objects. A cyclic object graph, or one nested deeper than
    /// [`MAX_RENDER_DEPTH`], is not representable.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut path = Vec::new();
        Ok(self
            .to_json_inner(&mut path, 0)?
            .unwrap_or(serde_json::Value::Null))
    }

    fn to_json_inner(
        &self,
        path: &mut Vec<*const ()>,
        depth: usize,
    ) -> Result<Option<serde_json::Value>> {
        use serde_json::Value as Json;

        if depth > MAX_RENDER_DEPTH && matches!(self, Value::Array(_) | Value::Object(_)) {
            return Err(Error::RenderUnrepresentable(format!(
                "nesting deeper than {MAX_RENDER_DEPTH} levels"
            )));
        }
        let json = match self {
            Value::Undefined | Value::Function(_) => return Ok(None),
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::Str(s) => Json::String(s.clone()),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.to_json_inner(path, depth + 1)?.unwrap_or(Json::Null));
                }
                Json::Array(out)
            }
            Value::Object(obj) => {
                let ptr = Arc::as_ptr(obj).cast::<()>();
                if path.contains(&ptr) {
                    return Err(Error::RenderUnrepresentable(format!(
                        "circular structure through {}",
                        obj.display_string()
                    )));
                }
                path.push(ptr);
                let mut map = serde_json::Map::new();
                for key in obj.own_enumerable_keys() {
                    if let Some(v) = obj.get_property(&key).to_json_inner(path, depth + 1)? {
                        map.insert(key, v);
                    }
                }
                path.pop();
                Json::Object(map)
            }
        };
        Ok(Some(json))
    }

    /// Build a value from JSON. Objects become fresh plain objects.
    pub fn from_json(json: &serde_json::Value) -> Value {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::Str(s.clone()),
            Json::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            Json::Object(map) => {
                let obj = PlainObject::new("Object");
                for (k, v) in map {
                    obj.define(k.as_str(), Value::from_json(v), true);
                }
                Value::Object(obj.into_ref())
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::Number((n as i64).into());
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => crate::object::same_object(a, b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Object(o) => write!(f, "Object({})", o.display_string()),
            Value::Function(func) => write!(f, "Function({})", func.name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
