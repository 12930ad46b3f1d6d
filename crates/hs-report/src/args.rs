//! Call-line value rendering.

use chrono::{DateTime, SecondsFormat, Utc};
use hs_common::{Result, Value};

/// Render an argument list as a JSON array.
///
/// Fails with `RenderUnrepresentable` when an argument contains a cycle or
/// nests deeper than [`hs_common::MAX_RENDER_DEPTH`].
pub fn render_args(args: &[Value]) -> Result<String> {
    let json = Value::Array(args.to_vec()).to_json()?;
    Ok(serde_json::to_string(&json)?)
}

/// Call timestamps as RFC 3339 UTC with milliseconds.
pub fn render_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
