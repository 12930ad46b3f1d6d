//! Callable members.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::value::Value;

/// Source text a platform reports for an anonymous built-in.
pub const ANONYMOUS_NATIVE_SOURCE: &str = "function () { [native code] }";

/// Source text a platform reports for a named built-in.
pub fn native_source(name: &str) -> String {
    format!("function {name}() {{ [native code] }}")
}

/// A failure raised by a callable. Propagates through wrappers unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("uncaught {0}")]
pub struct Thrown(pub Value);

impl Thrown {
    pub fn message(msg: impl Into<String>) -> Self {
        Thrown(Value::Str(msg.into()))
    }

    pub fn type_error(msg: impl fmt::Display) -> Self {
        Thrown(Value::Str(format!("TypeError: {msg}")))
    }
}

pub type CallResult = Result<Value, Thrown>;

/// Function body: receives the `this` binding and the argument list.
pub type Body = dyn Fn(&Value, &[Value]) -> CallResult + Send + Sync;

pub type FunctionRef = Arc<Function>;

/// A callable value with a name and an optional textual form.
pub struct Function {
    name: String,
    source: Option<String>,
    body: Arc<Body>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, source: Option<String>, body: F) -> FunctionRef
    where
        F: Fn(&Value, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        Arc::new(Function {
            name: name.into(),
            source,
            body: Arc::new(body),
        })
    }

    /// A built-in whose source is the canonical named native form.
    pub fn native<F>(name: &str, body: F) -> FunctionRef
    where
        F: Fn(&Value, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self::new(name, Some(native_source(name)), body)
    }

    /// A built-in reporting the anonymous native form.
    pub fn anonymous_native<F>(body: F) -> FunctionRef
    where
        F: Fn(&Value, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self::new("", Some(ANONYMOUS_NATIVE_SOURCE.to_string()), body)
    }

    /// Script-defined callable with arbitrary source text.
    pub fn scripted<F>(name: impl Into<String>, source: impl Into<String>, body: F) -> FunctionRef
    where
        F: Fn(&Value, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self::new(name, Some(source.into()), body)
    }

    /// Callable whose textual form cannot be obtained.
    pub fn opaque<F>(name: impl Into<String>, body: F) -> FunctionRef
    where
        F: Fn(&Value, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self::new(name, None, body)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_text(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn display_string(&self) -> String {
        match &self.source {
            Some(src) => src.clone(),
            None => format!("function {}() {{ }}", self.name),
        }
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> CallResult {
        (self.body)(this, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_source_forms() {
        assert_eq!(native_source("alert"), "function alert() { [native code] }");
        let anon = Function::anonymous_native(|_, _| Ok(Value::Null));
        assert_eq!(anon.source_text(), Some(ANONYMOUS_NATIVE_SOURCE));
        assert_eq!(anon.name(), "");
    }

    #[test]
    fn test_call_passes_this_and_args() {
        let f = Function::scripted("pick", "function pick(i) { return this[i]; }", |this, args| {
            match (this, args.first()) {
                (Value::Array(items), Some(Value::Number(i))) => {
                    Ok(items.get(*i as usize).cloned().unwrap_or_default())
                }
                _ => Err(Thrown::type_error("bad receiver")),
            }
        });
        let this = Value::Array(vec!["a".into(), "b".into()]);
        assert_eq!(f.call(&this, &[Value::from(1)]), Ok(Value::from("b")));
        assert!(f.call(&Value::Undefined, &[]).is_err());
    }

    #[test]
    fn test_opaque_display_falls_back() {
        let f = Function::opaque("hidden", |_, _| Ok(Value::Undefined));
        assert_eq!(f.source_text(), None);
        assert_eq!(f.display_string(), "function hidden() { }");
    }
}
