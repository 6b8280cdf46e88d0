//! Environment detection: CocoaPods manifest and installed Xcode version.

use regex::Regex;
use std::path::Path;
use std::process::Command;

use crate::invoker::PRIMARY_BUILD_TOOL;

/// True when a CocoaPods manifest sits in `dir` (either case variant).
pub fn pods_manifest_present(dir: &Path) -> bool {
    dir.join("Podfile").exists() || dir.join("podfile").exists()
}

/// Installed Xcode major.minor version.
///
/// Returns 0.0 when the build tool is missing, fails to run, or prints
/// something unrecognized. Advisory only; never fails.
pub fn xcode_version() -> f64 {
    if which::which(PRIMARY_BUILD_TOOL).is_err() {
        return 0.0;
    }
    match Command::new(PRIMARY_BUILD_TOOL).arg("-version").output() {
        Ok(output) => parse_version(&String::from_utf8_lossy(&output.stdout)),
        Err(_) => 0.0,
    }
}

fn parse_version(text: &str) -> f64 {
    let re = Regex::new(r"(?m)^Xcode ([0-9]+\.[0-9]+)").unwrap();
    re.captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .unwrap_or(0.0)
}
