//! Native-code fingerprinting.
//!
//! A callable "looks native" when its source text is exactly one of the two
//! canonical forms a platform reports for a built-in. This is a best-effort
//! signal only: any script can fabricate either string, and a platform that
//! changes its canonical form makes every built-in look foreign.

use hs_common::{native_source, Function, ANONYMOUS_NATIVE_SOURCE};

/// Outcome of fingerprinting one callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fingerprint {
    /// Source matches the named or anonymous native form.
    Native,
    /// Source is available and does not match.
    Foreign,
    /// Source text could not be obtained. Treated as foreign.
    Unavailable,
}

impl Fingerprint {
    pub fn is_native(self) -> bool {
        matches!(self, Fingerprint::Native)
    }
}

/// Fingerprint `func` as it is bound under `name`.
///
/// The named form is checked against the binding name, not the function's
/// own name, so a built-in re-bound under another key reads as foreign.
pub fn classify(func: &Function, name: &str) -> Fingerprint {
    match func.source_text() {
        None => Fingerprint::Unavailable,
        Some(src) if src == ANONYMOUS_NATIVE_SOURCE || src == native_source(name) => {
            Fingerprint::Native
        }
        Some(_) => Fingerprint::Foreign,
    }
}

/// Whether `func`, bound under `name`, looks like a built-in.
pub fn is_native_looking(func: &Function, name: &str) -> bool {
    classify(func, name).is_native()
}
