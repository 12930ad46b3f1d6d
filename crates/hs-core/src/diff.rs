//! Live-versus-baseline comparison.

use hs_common::{Bucket, MemberKind};

use crate::walker::{DescriptorMap, MemberDescriptor};

/// Why a member was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffReason {
    /// No member of that name in the baseline.
    Absent,
    /// Baseline has it as a different kind.
    KindChanged,
    /// Same kind, different native-looking verdict.
    NativeChanged,
}

impl std::fmt::Display for DiffReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffReason::Absent => write!(f, "absent"),
            DiffReason::KindChanged => write!(f, "kind_changed"),
            DiffReason::NativeChanged => write!(f, "native_changed"),
        }
    }
}

/// A member present only in (or shaped differently in) the live environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionVerdict {
    pub name: String,
    pub kind: MemberKind,
    pub native_looking: bool,
    pub injected: bool,
    pub reason: DiffReason,
    pub source: Option<String>,
}

impl InjectionVerdict {
    /// Ledger bucket this member records into.
    pub fn bucket(&self) -> Bucket {
        Bucket::for_member(self.kind, self.native_looking)
    }
}

/// Compare two walks. Members matching the baseline exactly are dropped;
/// the rest come back in live enumeration order.
pub fn diff(live: &DescriptorMap, baseline: &DescriptorMap) -> Vec<InjectionVerdict> {
    live.values()
        .filter_map(|desc| {
            reason(desc, baseline.get(&desc.name)).map(|reason| InjectionVerdict {
                name: desc.name.clone(),
                kind: desc.kind,
                native_looking: desc.native_looking,
                injected: true,
                reason,
                source: desc.source.clone(),
            })
        })
        .collect()
}

fn reason(live: &MemberDescriptor, base: Option<&MemberDescriptor>) -> Option<DiffReason> {
    match base {
        None => Some(DiffReason::Absent),
        Some(b) if b.kind != live.kind => Some(DiffReason::KindChanged),
        Some(b) if b.native_looking != live.native_looking => Some(DiffReason::NativeChanged),
        Some(_) => None,
    }
}

/// Counts over one diff pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub live_members: usize,
    pub baseline_members: usize,
    pub injected: usize,
    pub by_bucket: [usize; 4],
}

impl DiffSummary {
    pub fn new(live: &DescriptorMap, baseline: &DescriptorMap, verdicts: &[InjectionVerdict]) -> Self {
        let mut by_bucket = [0; 4];
        for v in verdicts {
            by_bucket[v.bucket().index()] += 1;
        }
        DiffSummary {
            live_members: live.len(),
            baseline_members: baseline.len(),
            injected: verdicts.len(),
            by_bucket,
        }
    }

    pub fn count(&self, bucket: Bucket) -> usize {
        self.by_bucket[bucket.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str, kind: MemberKind, native_looking: bool) -> (String, MemberDescriptor) {
        (
            name.to_string(),
            MemberDescriptor {
                name: name.to_string(),
                kind,
                native_looking,
                source: None,
            },
        )
    }

    #[test]
    fn test_identical_members_are_dropped() {
        let live: DescriptorMap = [desc("alert", MemberKind::Callable, true)].into_iter().collect();
        let base = live.clone();
        assert!(diff(&live, &base).is_empty());
    }

    #[test]
    fn test_reasons() {
        let live: DescriptorMap = [
            desc("foo", MemberKind::Callable, true),
            desc("alert", MemberKind::Callable, false),
            desc("console", MemberKind::Callable, true),
        ]
        .into_iter()
        .collect();
        let base: DescriptorMap = [
            desc("alert", MemberKind::Callable, true),
            desc("console", MemberKind::ObjectLike, true),
        ]
        .into_iter()
        .collect();

        let verdicts = diff(&live, &base);
        let reasons: Vec<_> = verdicts.iter().map(|v| (v.name.as_str(), v.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                ("foo", DiffReason::Absent),
                ("alert", DiffReason::NativeChanged),
                ("console", DiffReason::KindChanged),
            ]
        );
        assert!(verdicts.iter().all(|v| v.injected));
    }

    #[test]
    fn test_baseline_only_members_are_ignored() {
        let live = DescriptorMap::new();
        let base: DescriptorMap = [desc("alert", MemberKind::Callable, true)].into_iter().collect();
        assert!(diff(&live, &base).is_empty());
    }

    #[test]
    fn test_summary_counts_buckets() {
        let live: DescriptorMap = [
            desc("foo", MemberKind::Callable, true),
            desc("bar", MemberKind::ObjectLike, false),
            desc("baz", MemberKind::Callable, false),
        ]
        .into_iter()
        .collect();
        let base = DescriptorMap::new();
        let verdicts = diff(&live, &base);
        let summary = DiffSummary::new(&live, &base, &verdicts);
        assert_eq!(summary.injected, 3);
        assert_eq!(summary.count(Bucket::NativeCallables), 1);
        assert_eq!(summary.count(Bucket::ForeignObjects), 1);
        assert_eq!(summary.count(Bucket::NativeObjects), 0);
    }
}
