//! Hookscope common types and errors.
//!
//! This crate provides the pieces shared across the hookscope crates:
//! - The environment object model (values, functions, objects)
//! - The `Interceptable` capability that recording proxies implement
//! - Call-ledger record and snapshot types
//! - The unified error taxonomy

pub mod error;
pub mod function;
pub mod object;
pub mod ordered;
pub mod record;
pub mod value;

pub use error::{Error, ErrorCategory, Result};
pub use function::{
    native_source, CallResult, Function, FunctionRef, Thrown, ANONYMOUS_NATIVE_SOURCE,
};
pub use object::{invoke, same_object, Interceptable, ObjectRef, OwnKey, PlainObject, Property};
pub use ordered::OrderedMap;
pub use record::{
    Bucket, CallRecord, EntryCalls, EntrySnapshot, LedgerSnapshot, MemberKind, MethodCalls,
};
pub use value::{Value, MAX_RENDER_DEPTH};
