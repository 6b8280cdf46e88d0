//! Option merging and precondition validation for pipeline steps.
//!
//! Validation runs before any subprocess is spawned, so a misconfigured
//! invocation never launches a partial step.

use crate::PipelineError;

/// Fold present `(key, value)` pairs into a ` -key value` option fragment.
///
/// Pairs with no value are skipped. Callers must not depend on a specific
/// flag order in the result.
pub fn merge_flags(pairs: &[(&str, Option<&str>)]) -> String {
    pairs
        .iter()
        .filter_map(|(key, value)| value.map(|v| format!(" -{} {}", key, v)))
        .collect()
}

/// Fail unless every named option has a value, naming the first one missing.
pub fn require_all(
    step: &'static str,
    options: &[(&'static str, Option<&str>)],
) -> Result<(), PipelineError> {
    for (option, value) in options {
        if value.is_none() {
            return Err(PipelineError::MissingOption { step, option });
        }
    }
    Ok(())
}

/// Fail unless at least one of the named options has a value.
///
/// Only the named options are consulted; anything else the configuration
/// carries is irrelevant to this check.
pub fn require_any(
    step: &'static str,
    options: &[(&'static str, Option<&str>)],
) -> Result<(), PipelineError> {
    if options.iter().any(|(_, value)| value.is_some()) {
        Ok(())
    } else {
        Err(PipelineError::MissingAnyOption {
            step,
            options: options.iter().map(|(option, _)| *option).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn merge_single_pair() {
        assert_eq!(merge_flags(&[("scheme", Some("MyApp"))]), " -scheme MyApp");
    }

    #[test]
    fn merge_skips_absent_values() {
        let merged = merge_flags(&[
            ("scheme", Some("MyApp")),
            ("workspace", None),
            ("configuration", Some("Release")),
        ]);
        assert_eq!(merged, " -scheme MyApp -configuration Release");
    }

    #[test]
    fn merge_empty_input() {
        assert_eq!(merge_flags(&[]), "");
    }

    #[test]
    fn require_all_names_first_missing() {
        let err = require_all("lint", &[("scheme", None), ("workspace", None)]).unwrap_err();
        match err {
            crate::PipelineError::MissingOption { step, option } => {
                assert_eq!(step, "lint");
                assert_eq!(option, "scheme");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn require_all_passes_when_present() {
        assert!(require_all("lint", &[("scheme", Some("MyApp"))]).is_ok());
    }

    #[test]
    fn require_any_fails_when_all_absent() {
        let err = require_any("lint", &[("workspace", None), ("project", None)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "lint: at least one of the options workspace, project is required"
        );
    }

    #[test]
    fn require_any_passes_with_one_present() {
        assert!(require_any("lint", &[("workspace", None), ("project", Some("App.xcodeproj"))]).is_ok());
    }

    // The check must look at the named options only, never at whether the
    // configuration carries unrelated values.
    #[test]
    fn require_any_ignores_unrelated_options() {
        let err = require_any("test-suite", &[("workspace", None), ("project", None)]);
        assert!(err.is_err());
    }
}
