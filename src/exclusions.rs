//! Path-prefix exclusions shared by analysis invocations and report filtering.

use crate::probe;
use std::path::Path;

/// Always excluded: vendored third-party sources.
pub const DEFAULT_EXCLUSION: &str = "vendor";

/// Excluded when the project uses CocoaPods.
pub const PODS_EXCLUSION: &str = "Pods";

/// Ordered set of directory prefixes excluded from analysis and stripped
/// from reports.
///
/// One value drives both the command-line exclusion flags and the report
/// filter, so what analysis skips and what reports drop cannot diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    entries: Vec<String>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusionSet {
    /// The fixed default: `vendor` only.
    pub fn new() -> Self {
        Self {
            entries: vec![DEFAULT_EXCLUSION.to_string()],
        }
    }

    /// Defaults for `workdir`: `vendor`, plus `Pods` when a CocoaPods
    /// manifest is present there.
    pub fn resolve(workdir: &Path) -> Self {
        let mut exclusions = Self::new();
        if probe::pods_manifest_present(workdir) {
            exclusions.push(PODS_EXCLUSION);
        }
        exclusions
    }

    /// Build a set from arbitrary entries, bypassing resolution.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push<S: Into<String>>(&mut self, entry: S) {
        self.entries.push(entry.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as repeated command-line flags: `-e "vendor" -e "Pods"`.
    pub fn option_list(&self, flag: &str) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        self.entries
            .iter()
            .map(|entry| format!("{} \"{}\"", flag, entry))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Absolute directory prefixes (`{workdir}/{entry}/`) for matching the
    /// full paths that appear in reports.
    pub fn absolute_prefixes(&self, workdir: &Path) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| format!("{}/{}/", workdir.display(), entry))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn defaults_to_vendor() {
        assert_eq!(ExclusionSet::new().entries(), ["vendor"]);
    }

    #[test]
    fn resolve_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let exclusions = ExclusionSet::resolve(dir.path());
        assert_eq!(exclusions.entries(), ["vendor"]);
    }

    #[test]
    fn resolve_with_podfile() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Podfile"), "").unwrap();
        let exclusions = ExclusionSet::resolve(dir.path());
        assert_eq!(exclusions.entries(), ["vendor", "Pods"]);
    }

    #[test]
    fn resolve_with_lowercase_podfile() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("podfile"), "").unwrap();
        let exclusions = ExclusionSet::resolve(dir.path());
        assert_eq!(exclusions.entries(), ["vendor", "Pods"]);
    }

    #[test]
    fn option_list_wraps_and_repeats() {
        let exclusions = ExclusionSet::from_entries(["vendor", "Pods"]);
        assert_eq!(exclusions.option_list("-e"), "-e \"vendor\" -e \"Pods\"");
    }

    #[test]
    fn option_list_empty_set() {
        let exclusions = ExclusionSet::from_entries(Vec::<String>::new());
        assert_eq!(exclusions.option_list("-e"), "");
    }

    #[test]
    fn absolute_prefixes_end_with_separator() {
        let exclusions = ExclusionSet::from_entries(["vendor"]);
        let prefixes = exclusions.absolute_prefixes(Path::new("/repo"));
        assert_eq!(prefixes, ["/repo/vendor/"]);
    }
}
