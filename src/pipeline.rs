//! The four pipeline steps and the `build` sequence that chains them.
//!
//! Steps are stateless and re-entrant; the only cross-step state is the
//! shared exclusion set and the fixed report filenames, each fully
//! overwritten per run.

use crate::config::StepConfig;
use crate::exclusions::ExclusionSet;
use crate::invoker::{Invoker, PRIMARY_BUILD_TOOL};
use crate::options;
use crate::probe;
use crate::report;
use crate::PipelineError;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Structured lint report consumed by the CI dashboard.
pub const LINT_DESTINATION: &str = "lint.xml";

/// Duplicate-code report, post-processed after the detector runs.
pub const DUPLICATION_DESTINATION: &str = "duplication.xml";

/// Line-count summary.
pub const LINE_COUNT_DESTINATION: &str = "line-count.sc";

/// Raw build log, teed out of the build tool during lint.
pub const BUILD_LOG_DESTINATION: &str = "xcodebuild.log";

/// Build configuration used by lint when none is given.
pub const DEFAULT_CONFIGURATION: &str = "Release";

/// Duplicate-detection token threshold used when none is given.
pub const DEFAULT_MINIMUM_TOKENS: u32 = 100;

/// Tests are unreliable below this Xcode version.
const MINIMUM_XCODE_VERSION: f64 = 5.0;

/// Sequences the external tools for one project directory.
pub struct Pipeline {
    workdir: PathBuf,
    exclusions: ExclusionSet,
    invoker: Invoker,
}

impl Pipeline {
    /// Resolve exclusions for `workdir` and set up the runner.
    pub fn new<P: Into<PathBuf>>(workdir: P) -> Self {
        let workdir = workdir.into();
        let exclusions = ExclusionSet::resolve(&workdir);
        let invoker = Invoker::new(&workdir);
        Self {
            workdir,
            exclusions,
            invoker,
        }
    }

    /// Replace the resolved exclusion set.
    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Print composed commands instead of executing them.
    pub fn dry_run(mut self, enable: bool) -> Self {
        self.invoker = self.invoker.dry_run(enable);
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn exclusions_mut(&mut self) -> &mut ExclusionSet {
        &mut self.exclusions
    }

    /// Run `pod install` through the dependency runner when the project
    /// carries a CocoaPods manifest. Runs ahead of any pipeline step.
    pub fn install_dependencies(&self, config: &StepConfig) -> Result<(), PipelineError> {
        if probe::pods_manifest_present(&self.workdir) {
            self.invoker.invoke("pod", "install", "", &config.tools)?;
        }
        Ok(())
    }

    /// The full sequence: lint, line counts, tests, duplicate detection.
    /// The first failing step aborts the remainder.
    pub fn build(&self, config: &StepConfig) -> Result<(), PipelineError> {
        self.install_dependencies(config)?;
        self.lint(config)?;
        self.lines_of_code(config)?;
        self.test_suite(config)?;
        self.duplicate_code_detection(config)
    }

    /// Static analysis: a clean build to produce compile commands, then the
    /// lint adapter and the report formatter.
    pub fn lint(&self, config: &StepConfig) -> Result<(), PipelineError> {
        options::require_any(
            "lint",
            &[
                ("workspace", config.workspace.as_deref()),
                ("project", config.project.as_deref()),
            ],
        )?;
        options::require_all("lint", &[("scheme", config.scheme.as_deref())])?;

        self.invoker.invoke(
            PRIMARY_BUILD_TOOL,
            &lint_build_options(config),
            &format!("| tee {}", BUILD_LOG_DESTINATION),
            &config.tools,
        )?;

        // The adapter chokes on compile commands under Pods unless the
        // directory is excluded by absolute path.
        let pods_dir = self.workdir.join("Pods");
        self.invoker.invoke(
            "oclint-xcodebuild",
            &format!("-e \"{}\"", pods_dir.display()),
            "",
            &config.tools,
        )?;

        let report_options = format!(
            "{} -- -report-type=pmd -o={}",
            self.exclusions.option_list("-e"),
            LINT_DESTINATION
        );
        self.invoker
            .invoke("oclint-json-compilation-database", &report_options, "", &config.tools)?;
        Ok(())
    }

    /// Count source lines over the whole tree, with the exclusion list
    /// filtered out of the summary.
    pub fn lines_of_code(&self, config: &StepConfig) -> Result<(), PipelineError> {
        self.invoker.invoke(
            "sloccount",
            "--duplicates --wide --details .",
            &format!(
                "| grep -v {} > {}",
                self.exclusions.option_list("-e"),
                LINE_COUNT_DESTINATION
            ),
            &config.tools,
        )?;
        Ok(())
    }

    /// Run the test suite, converting raw output to a JUnit-style report.
    pub fn test_suite(&self, config: &StepConfig) -> Result<(), PipelineError> {
        options::require_any(
            "test-suite",
            &[
                ("workspace", config.workspace.as_deref()),
                ("project", config.project.as_deref()),
            ],
        )?;
        options::require_all("test-suite", &[("scheme", config.scheme.as_deref())])?;

        if !config.has_override(PRIMARY_BUILD_TOOL) && !self.invoker.is_dry_run() {
            let version = probe::xcode_version();
            if version < MINIMUM_XCODE_VERSION {
                eprintln!(
                    "{}: Xcode version {} is less than {}, and tests will likely not run",
                    "warning".yellow().bold(),
                    version,
                    MINIMUM_XCODE_VERSION
                );
            }
        }

        self.invoker.invoke(
            PRIMARY_BUILD_TOOL,
            &test_build_options(config),
            "2>&1 | bundle exec ocunit2junit",
            &config.tools,
        )?;
        Ok(())
    }

    /// Detect duplicated code, then strip excluded entries from the report
    /// and normalize its encoding.
    pub fn duplicate_code_detection(&self, config: &StepConfig) -> Result<(), PipelineError> {
        // The sed pass rewrites `/./` path artifacts the CI dashboard's
        // duplication parser cannot handle.
        self.invoker.invoke(
            "pmd-cpd-objc",
            &cpd_options(config),
            &format!(
                "| LC_CTYPE=C LANG=C sed 's/\\/\\.\\//\\//' > {}",
                DUPLICATION_DESTINATION
            ),
            &config.tools,
        )?;

        if self.invoker.is_dry_run() {
            return Ok(());
        }
        let report_path = self.workdir.join(DUPLICATION_DESTINATION);
        report::filter_excluded(&report_path, &self.exclusions, &self.workdir)?;
        report::normalize_encoding(&report_path)?;
        Ok(())
    }
}

fn lint_build_options(config: &StepConfig) -> String {
    let configuration = config
        .configuration
        .as_deref()
        .unwrap_or(DEFAULT_CONFIGURATION);
    let mut options = options::merge_flags(&[
        ("scheme", config.scheme.as_deref()),
        ("workspace", config.workspace.as_deref()),
        ("project", config.project.as_deref()),
        ("configuration", Some(configuration)),
    ]);
    options.push_str(" ONLY_ACTIVE_ARCH=NO clean build");
    options
}

fn test_build_options(config: &StepConfig) -> String {
    let mut options = options::merge_flags(&[
        ("scheme", config.scheme.as_deref()),
        ("workspace", config.workspace.as_deref()),
        ("project", config.project.as_deref()),
    ]);
    options
        .push_str(" -destination name=\"iPhone 6\" -destination-timeout=10 ONLY_ACTIVE_ARCH=NO test");
    options
}

fn cpd_options(config: &StepConfig) -> String {
    format!(
        "--minimum-tokens {}",
        config.minimum_tokens.unwrap_or(DEFAULT_MINIMUM_TOKENS)
    )
}
