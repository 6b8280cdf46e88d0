//! xcode-ci - CI pipeline orchestration for Xcode projects
//!
//! Sequences the external analysis, build, test, and duplicate-detection
//! tools for an Objective-C project and post-processes their XML reports
//! for CI dashboard consumption. The tools themselves (xcodebuild, the
//! OCLint toolchain, sloccount, ocunit2junit, pmd-cpd-objc) are invoked
//! as opaque subprocesses; this crate only composes their command lines,
//! keeps path exclusions consistent between analysis and reports, and
//! cleans up what the tools leave behind.
//!
//! # Example
//!
//! ```no_run
//! use xcode_ci::{Pipeline, StepConfig};
//!
//! let config = StepConfig::default()
//!     .workspace("MyApp.xcworkspace")
//!     .scheme("MyApp");
//!
//! let pipeline = Pipeline::new(".");
//! pipeline.build(&config).unwrap();
//! ```

pub mod config;
pub mod exclusions;
pub mod invoker;
pub mod options;
pub mod pipeline;
pub mod probe;
pub mod report;

pub use config::{ConfigError, StepConfig, ToolOptions};
pub use exclusions::ExclusionSet;
pub use invoker::Invoker;
pub use pipeline::Pipeline;

use thiserror::Error;

/// Errors surfaced by the orchestrator itself.
///
/// A nonzero exit from an invoked tool is deliberately not represented
/// here: tool output is echoed and the pipeline moves on.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{step}: option {option} is required")]
    MissingOption {
        step: &'static str,
        option: &'static str,
    },

    #[error("{step}: at least one of the options {} is required", .options.join(", "))]
    MissingAnyOption {
        step: &'static str,
        options: Vec<&'static str>,
    },

    #[error("failed to process duplication report: {0}")]
    ReportParse(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
