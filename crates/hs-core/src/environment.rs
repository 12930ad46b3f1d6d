//! The inspected environment: a global object and its bindings.

use std::sync::Arc;

use hs_common::{invoke, CallResult, Interceptable, ObjectRef, PlainObject, Thrown, Value};

/// Class tag of a global object.
pub const GLOBAL_CLASS: &str = "Window";

/// A global scope. Cloning shares the same global object.
#[derive(Clone)]
pub struct Environment {
    global: Arc<PlainObject>,
}

impl Environment {
    /// A bare global with no bindings at all.
    pub fn new() -> Self {
        Environment {
            global: Arc::new(PlainObject::new(GLOBAL_CLASS)),
        }
    }

    /// A global carrying the built-in platform surface.
    pub fn with_builtins() -> Self {
        let env = Environment::new();
        crate::builtins::install_builtins(&env);
        env
    }

    /// The global object as a walkable root.
    pub fn root(&self) -> ObjectRef {
        self.global.clone()
    }

    pub fn lookup(&self, name: &str) -> Value {
        self.global.get_property(name)
    }

    /// Assign a global binding (`window[name] = value`).
    pub fn bind(&self, name: &str, value: Value) {
        self.global.set_property(name, value);
    }

    /// Define a binding with explicit enumerability.
    pub fn define(&self, name: &str, value: Value, enumerable: bool) {
        self.global.define(name, value, enumerable);
    }

    pub fn unbind(&self, name: &str) -> bool {
        self.global.delete_property(name)
    }

    pub fn set_prototype(&self, proto: ObjectRef) {
        self.global.set_prototype(Some(proto));
    }

    /// Call a global function with `this` bound to the global.
    pub fn call(&self, name: &str, args: &[Value]) -> CallResult {
        invoke(&self.root(), name, args)
    }

    /// Call a method on a global object binding.
    pub fn call_method(&self, member: &str, method: &str, args: &[Value]) -> CallResult {
        match self.lookup(member) {
            Value::Object(obj) => invoke(&obj, method, args),
            other => Err(Thrown::type_error(format_args!(
                "cannot read {method} of {member} ({})",
                other.type_name()
            ))),
        }
    }

    /// Drop every own binding so self-referential aliases stop keeping
    /// the global alive.
    pub fn teardown(&self) {
        for key in self.global.own_keys() {
            self.global.delete_property(&key.name);
        }
        self.global.set_prototype(None);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
