//! Shell command composition and execution for external tools.

use crate::config::ToolOptions;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::Command;

/// The primary build tool runs directly; every other binary goes through
/// the dependency runner.
pub const PRIMARY_BUILD_TOOL: &str = "xcodebuild";

const RUNNER_PREFIX: &str = "bundle exec";

/// Resolve the effective option string for a binary.
///
/// Replacement options discard the caller-built string entirely; extra
/// options are appended to it.
pub fn resolve_options(
    binary: &str,
    options: &str,
    tools: &HashMap<String, ToolOptions>,
) -> String {
    match tools.get(binary) {
        Some(tool) => {
            if let Some(replacement) = &tool.override_options {
                replacement.clone()
            } else if let Some(extra) = &tool.extra_options {
                format!("{} {}", options, extra)
            } else {
                options.to_string()
            }
        }
        None => options.to_string(),
    }
}

/// Compose the full shell command line for a tool invocation.
pub fn compose(
    binary: &str,
    options: &str,
    tail: &str,
    tools: &HashMap<String, ToolOptions>,
) -> String {
    let resolved = resolve_options(binary, options, tools);
    let mut parts: Vec<&str> = Vec::new();
    if binary != PRIMARY_BUILD_TOOL {
        parts.push(RUNNER_PREFIX);
    }
    parts.push(binary);
    let resolved = resolved.trim();
    if !resolved.is_empty() {
        parts.push(resolved);
    }
    let tail = tail.trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts.join(" ")
}

/// Executes composed tool invocations in a working directory.
pub struct Invoker {
    workdir: PathBuf,
    dry_run: bool,
}

impl Invoker {
    pub fn new<P: Into<PathBuf>>(workdir: P) -> Self {
        Self {
            workdir: workdir.into(),
            dry_run: false,
        }
    }

    /// Print composed commands instead of executing them.
    pub fn dry_run(mut self, enable: bool) -> Self {
        self.dry_run = enable;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Compose, echo, and execute a tool invocation; returns the combined
    /// stdout/stderr.
    ///
    /// The exit status is not inspected: a failing tool is observable only
    /// through its echoed output, and the pipeline keeps going.
    pub fn invoke(
        &self,
        binary: &str,
        options: &str,
        tail: &str,
        tools: &HashMap<String, ToolOptions>,
    ) -> io::Result<String> {
        let command = compose(binary, options, tail, tools);
        println!("{}", command);
        if self.dry_run {
            return Ok(String::new());
        }

        log::debug!("running in {}: {}", self.workdir.display(), command);
        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .current_dir(&self.workdir)
            .output()?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        if !combined.is_empty() {
            print!("{}", combined);
            if !combined.ends_with('\n') {
                println!();
            }
        }
        Ok(combined)
    }
}
