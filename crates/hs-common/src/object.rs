//! Object-like members and the interception capability.
//!
//! Every object in an environment is reached through [`Interceptable`].
//! Plain objects implement it directly; recording proxies implement it by
//! forwarding to the object they wrap, so callers never know which one they
//! hold.

use std::sync::{Arc, PoisonError, RwLock};

use crate::function::{CallResult, Thrown};
use crate::ordered::OrderedMap;
use crate::value::Value;

/// Shared handle to an object.
pub type ObjectRef = Arc<dyn Interceptable>;

/// An own property key and whether enumeration sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnKey {
    pub name: String,
    pub enumerable: bool,
}

/// Property access surface of an object.
///
/// Member names are not known statically; every operation takes the name
/// at runtime.
pub trait Interceptable: Send + Sync {
    /// Class tag used in the host string form `[object <Class>]`.
    fn class_name(&self) -> String;

    /// Read a property, consulting the prototype chain.
    fn get_property(&self, name: &str) -> Value;

    /// Write an own property.
    fn set_property(&self, name: &str, value: Value);

    /// Delete an own property. Returns whether it existed.
    fn delete_property(&self, name: &str) -> bool;

    /// Own keys in definition order.
    fn own_keys(&self) -> Vec<OwnKey>;

    fn prototype(&self) -> Option<ObjectRef>;

    fn display_string(&self) -> String {
        format!("[object {}]", self.class_name())
    }

    fn has_own_property(&self, name: &str) -> bool {
        self.own_keys().iter().any(|k| k.name == name)
    }

    fn own_enumerable_keys(&self) -> Vec<String> {
        self.own_keys()
            .into_iter()
            .filter(|k| k.enumerable)
            .map(|k| k.name)
            .collect()
    }
}

/// Method call: read `name` from `target` and call it with `this = target`.
pub fn invoke(target: &ObjectRef, name: &str, args: &[Value]) -> CallResult {
    match target.get_property(name) {
        Value::Function(f) => f.call(&Value::Object(target.clone()), args),
        other => Err(Thrown::type_error(format_args!(
            "{name} is not a function (got {})",
            other.type_name()
        ))),
    }
}

/// Object identity.
pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// A property slot.
#[derive(Debug, Clone)]
pub struct Property {
    pub value: Value,
    pub enumerable: bool,
}

/// An ordinary object: an ordered property table plus an optional prototype.
pub struct PlainObject {
    class: String,
    props: RwLock<OrderedMap<Property>>,
    proto: RwLock<Option<ObjectRef>>,
}

impl PlainObject {
    pub fn new(class: impl Into<String>) -> Self {
        PlainObject {
            class: class.into(),
            props: RwLock::new(OrderedMap::new()),
            proto: RwLock::new(None),
        }
    }

    pub fn with_prototype(self, proto: ObjectRef) -> Self {
        self.set_prototype(Some(proto));
        self
    }

    /// Builder form of an enumerable definition.
    pub fn with_property(self, name: &str, value: Value) -> Self {
        self.define(name, value, true);
        self
    }

    /// Builder form of a non-enumerable definition.
    pub fn with_hidden(self, name: &str, value: Value) -> Self {
        self.define(name, value, false);
        self
    }

    /// Define or redefine an own property. Redefinition keeps key order.
    pub fn define(&self, name: &str, value: Value, enumerable: bool) {
        let mut props = self.props.write().unwrap_or_else(PoisonError::into_inner);
        props.insert(name, Property { value, enumerable });
    }

    pub fn set_prototype(&self, proto: Option<ObjectRef>) {
        *self.proto.write().unwrap_or_else(PoisonError::into_inner) = proto;
    }

    pub fn into_ref(self) -> ObjectRef {
        Arc::new(self)
    }
}

impl Interceptable for PlainObject {
    fn class_name(&self) -> String {
        self.class.clone()
    }

    fn get_property(&self, name: &str) -> Value {
        let own = {
            let props = self.props.read().unwrap_or_else(PoisonError::into_inner);
            props.get(name).map(|p| p.value.clone())
        };
        match own {
            Some(v) => v,
            None => match self.prototype() {
                Some(proto) => proto.get_property(name),
                None => Value::Undefined,
            },
        }
    }

    fn set_property(&self, name: &str, value: Value) {
        let mut props = self.props.write().unwrap_or_else(PoisonError::into_inner);
        match props.get_mut(name) {
            Some(slot) => slot.value = value,
            None => {
                props.insert(
                    name,
                    Property {
                        value,
                        enumerable: true,
                    },
                );
            }
        }
    }

    fn delete_property(&self, name: &str) -> bool {
        let mut props = self.props.write().unwrap_or_else(PoisonError::into_inner);
        props.remove(name).is_some()
    }

    fn own_keys(&self) -> Vec<OwnKey> {
        let props = self.props.read().unwrap_or_else(PoisonError::into_inner);
        props
            .iter()
            .map(|(name, p)| OwnKey {
                name: name.to_string(),
                enumerable: p.enumerable,
            })
            .collect()
    }

    fn prototype(&self) -> Option<ObjectRef> {
        self.proto
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
