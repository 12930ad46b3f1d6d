//! Detection settings: what the walker ignores and how backups are named.

use serde::{Deserialize, Serialize};

/// Default global name under which the ledger view is exposed.
pub const DEFAULT_LEDGER_GLOBAL: &str = "__hookscope_ledger";

/// Default suffix for backup references to true originals.
pub const DEFAULT_BACKUP_SUFFIX: &str = "__original";

/// Settings consumed by the walker and the interceptor factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Name fragments; any key containing one is never walked.
    pub denylist: Vec<String>,

    /// Suffix appended to a member name to form its backup key.
    pub backup_suffix: String,

    /// Global binding for the read-only ledger view.
    pub ledger_global: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            denylist: vec![
                "webpack".to_string(),
                "__core-js_shared__".to_string(),
                "__REACT_DEVTOOLS".to_string(),
                "__VUE_DEVTOOLS".to_string(),
                "__zone_symbol__".to_string(),
                "parcelRequire".to_string(),
                "regeneratorRuntime".to_string(),
            ],
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            ledger_global: DEFAULT_LEDGER_GLOBAL.to_string(),
        }
    }
}

impl DetectionConfig {
    /// Denylist as the walker applies it: configured fragments plus the
    /// ledger global and the backup suffix, so the walker never sees its own
    /// instrumentation state.
    pub fn effective_denylist(&self) -> Vec<String> {
        let mut fragments = self.denylist.clone();
        for own in [&self.ledger_global, &self.backup_suffix] {
            if !fragments.iter().any(|f| f == own) {
                fragments.push(own.clone());
            }
        }
        fragments
    }

    /// Backup key for a member.
    pub fn backup_key(&self, name: &str) -> String {
        format!("{}{}", name, self.backup_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_denylist_includes_own_names() {
        let config = DetectionConfig::default();
        let fragments = config.effective_denylist();
        assert!(fragments.contains(&DEFAULT_LEDGER_GLOBAL.to_string()));
        assert!(fragments.contains(&DEFAULT_BACKUP_SUFFIX.to_string()));
        assert!(fragments.contains(&"webpack".to_string()));
    }

    #[test]
    fn test_effective_denylist_no_duplicates() {
        let config = DetectionConfig {
            denylist: vec![DEFAULT_BACKUP_SUFFIX.to_string()],
            ..DetectionConfig::default()
        };
        let fragments = config.effective_denylist();
        assert_eq!(
            fragments.iter().filter(|f| *f == DEFAULT_BACKUP_SUFFIX).count(),
            1
        );
    }

    #[test]
    fn test_backup_key() {
        let config = DetectionConfig::default();
        assert_eq!(config.backup_key("bridge"), "bridge__original");
    }
}
