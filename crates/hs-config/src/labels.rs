//! Report wording.

use serde::{Deserialize, Serialize};

/// Text fragments used by the report renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLabels {
    /// Section titles in report order: native callables, foreign callables,
    /// native objects, foreign objects.
    pub native_callables: String,
    pub foreign_callables: String,
    pub native_objects: String,
    pub foreign_objects: String,

    /// Appended to a title when its bucket is empty.
    pub none_marker: String,
    /// Appended to a title when its bucket has entries.
    pub records_suffix: String,

    pub member: String,
    pub method: String,
    pub call_records: String,
    pub no_calls: String,
    pub called_at: String,
    pub args: String,

    /// Stands in for an argument list that cannot be rendered.
    pub unrepresentable: String,
}

impl Default for ReportLabels {
    fn default() -> Self {
        ReportLabels {
            native_callables: "Suspected native injected functions".to_string(),
            foreign_callables: "Other injected functions".to_string(),
            native_objects: "Suspected native injected objects".to_string(),
            foreign_objects: "Other injected objects".to_string(),
            none_marker: ": none".to_string(),
            records_suffix: " and their call records:".to_string(),
            member: "Member".to_string(),
            method: "Method".to_string(),
            call_records: "Call records:".to_string(),
            no_calls: "- no call records".to_string(),
            called_at: "called at".to_string(),
            args: "args".to_string(),
            unrepresentable: "[unserializable arguments]".to_string(),
        }
    }
}

impl ReportLabels {
    /// All labels with their field names, for validation.
    pub fn fields(&self) -> [(&'static str, &str); 13] {
        [
            ("native_callables", &self.native_callables),
            ("foreign_callables", &self.foreign_callables),
            ("native_objects", &self.native_objects),
            ("foreign_objects", &self.foreign_objects),
            ("none_marker", &self.none_marker),
            ("records_suffix", &self.records_suffix),
            ("member", &self.member),
            ("method", &self.method),
            ("call_records", &self.call_records),
            ("no_calls", &self.no_calls),
            ("called_at", &self.called_at),
            ("args", &self.args),
            ("unrepresentable", &self.unrepresentable),
        ]
    }
}
