//! Ledger-to-text rendering.

use hs_common::{Bucket, CallRecord, EntryCalls, EntrySnapshot, LedgerSnapshot};
use hs_config::ReportLabels;
use tracing::{debug, warn};

use crate::args::{render_args, render_timestamp};

/// Renders ledger snapshots with configurable wording.
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    labels: ReportLabels,
}

impl ReportRenderer {
    pub fn new(labels: ReportLabels) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &ReportLabels {
        &self.labels
    }

    /// Section title of a bucket.
    pub fn title(&self, bucket: Bucket) -> &str {
        match bucket {
            Bucket::NativeCallables => &self.labels.native_callables,
            Bucket::ForeignCallables => &self.labels.foreign_callables,
            Bucket::NativeObjects => &self.labels.native_objects,
            Bucket::ForeignObjects => &self.labels.foreign_objects,
        }
    }

    /// Render all four buckets. Trailing whitespace is trimmed.
    pub fn render(&self, snapshot: &LedgerSnapshot) -> String {
        let mut lines = Vec::new();
        for bucket in Bucket::ALL {
            self.render_bucket(&mut lines, bucket, snapshot.bucket(bucket));
        }
        let text = lines.join("\n");
        debug!(
            entries = snapshot.entry_count(),
            calls = snapshot.total_calls(),
            bytes = text.len(),
            "Ledger rendered"
        );
        text.trim_end().to_string()
    }

    fn render_bucket(&self, lines: &mut Vec<String>, bucket: Bucket, entries: &[EntrySnapshot]) {
        let title = self.title(bucket);
        if entries.is_empty() {
            lines.push(format!("{}{}", title, self.labels.none_marker));
            return;
        }
        lines.push(format!("{}{}", title, self.labels.records_suffix));
        for entry in entries {
            lines.push(format!("{}: {}", self.labels.member, entry.name));
            match &entry.calls {
                EntryCalls::Callable(calls) => self.render_calls(lines, &entry.name, calls),
                EntryCalls::Object(methods) if methods.is_empty() => {
                    self.render_calls(lines, &entry.name, &[]);
                }
                EntryCalls::Object(methods) => {
                    for method in methods {
                        lines.push(format!("{}: {}", self.labels.method, method.name));
                        self.render_calls(lines, &entry.name, &method.calls);
                    }
                }
            }
            lines.push(String::new());
        }
    }

    fn render_calls(&self, lines: &mut Vec<String>, member: &str, calls: &[CallRecord]) {
        lines.push(self.labels.call_records.clone());
        if calls.is_empty() {
            lines.push(self.labels.no_calls.clone());
            return;
        }
        for call in calls {
            lines.push(self.call_line(member, call));
        }
    }

    /// `- called at: <timestamp>, args: <json>`
    fn call_line(&self, member: &str, call: &CallRecord) -> String {
        let args = render_args(&call.args).unwrap_or_else(|e| {
            warn!(member, error = %e, "Argument list not representable");
            self.labels.unrepresentable.clone()
        });
        format!(
            "- {}: {}, {}: {}",
            self.labels.called_at,
            render_timestamp(&call.timestamp),
            self.labels.args,
            args
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hs_common::{Interceptable, MethodCalls, PlainObject, Value};

    fn call(args: Vec<Value>) -> CallRecord {
        CallRecord {
            args,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
        }
    }

    fn callable(name: &str, calls: Vec<CallRecord>) -> EntrySnapshot {
        EntrySnapshot {
            name: name.to_string(),
            source: None,
            calls: EntryCalls::Callable(calls),
        }
    }

    #[test]
    fn test_empty_ledger_renders_none_markers() {
        let text = ReportRenderer::default().render(&LedgerSnapshot::default());
        assert_eq!(
            text,
            "Suspected native injected functions: none\n\
             Other injected functions: none\n\
             Suspected native injected objects: none\n\
             Other injected objects: none"
        );
    }

    #[test]
    fn test_callable_entries() {
        let snapshot = LedgerSnapshot::new([
            vec![callable("foo", vec![call(vec![Value::from(1), Value::str("a")])])],
            vec![callable("quiet", vec![])],
            vec![],
            vec![],
        ]);
        let text = ReportRenderer::default().render(&snapshot);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Suspected native injected functions and their call records:",
                "Member: foo",
                "Call records:",
                "- called at: 2024-05-06T07:08:09.000Z, args: [1,\"a\"]",
                "",
                "Other injected functions and their call records:",
                "Member: quiet",
                "Call records:",
                "- no call records",
                "",
                "Suspected native injected objects: none",
                "Other injected objects: none",
            ]
        );
    }

    #[test]
    fn test_object_entries_group_by_method() {
        let bar = EntrySnapshot {
            name: "bar".to_string(),
            source: Some("[object Bridge]".to_string()),
            calls: EntryCalls::Object(vec![MethodCalls {
                name: "getData".to_string(),
                calls: vec![call(vec![Value::from(1), Value::from(2)])],
            }]),
        };
        let idle = EntrySnapshot {
            name: "idle".to_string(),
            source: None,
            calls: EntryCalls::Object(vec![]),
        };
        let snapshot = LedgerSnapshot::new([vec![], vec![], vec![], vec![bar, idle]]);
        let text = ReportRenderer::default().render(&snapshot);
        assert!(text.ends_with(
            "Other injected objects and their call records:\n\
             Member: bar\n\
             Method: getData\n\
             Call records:\n\
             - called at: 2024-05-06T07:08:09.000Z, args: [1,2]\n\
             \n\
             Member: idle\n\
             Call records:\n\
             - no call records"
        ));
    }

    #[test]
    fn test_unrepresentable_args_use_placeholder() {
        let obj = PlainObject::new("Object").into_ref();
        obj.set_property("self", Value::Object(obj.clone()));
        let snapshot = LedgerSnapshot::new([
            vec![],
            vec![callable(
                "send",
                vec![call(vec![Value::Object(obj.clone())]), call(vec![Value::from(3)])],
            )],
            vec![],
            vec![],
        ]);
        let text = ReportRenderer::default().render(&snapshot);
        assert!(text.contains("args: [unserializable arguments]"));
        assert!(text.contains("args: [3]"));
        obj.delete_property("self");
    }

    #[test]
    fn test_deeply_nested_args_use_placeholder() {
        let mut deep = Value::Null;
        for _ in 0..hs_common::MAX_RENDER_DEPTH * 2 {
            deep = Value::Object(PlainObject::new("Object").with_property("next", deep).into_ref());
        }
        let snapshot = LedgerSnapshot::new([
            vec![],
            vec![callable("send", vec![call(vec![deep]), call(vec![Value::from(4)])])],
            vec![],
            vec![],
        ]);
        let text = ReportRenderer::default().render(&snapshot);
        assert!(text.contains("args: [unserializable arguments]"));
        assert!(text.contains("args: [4]"));
    }

    #[test]
    fn test_custom_labels() {
        let labels = ReportLabels {
            foreign_callables: "Foreign".to_string(),
            none_marker: " -".to_string(),
            ..ReportLabels::default()
        };
        let text = ReportRenderer::new(labels).render(&LedgerSnapshot::default());
        assert!(text.contains("\nForeign -\n"));
    }

    #[test]
    fn test_trailing_whitespace_trimmed() {
        let snapshot = LedgerSnapshot::new([vec![], vec![], vec![], vec![callable("x", vec![])]]);
        let text = ReportRenderer::default().render(&snapshot);
        assert!(!text.ends_with('\n'));
        assert!(text.ends_with("- no call records"));
    }
}
