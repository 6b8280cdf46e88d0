//! xcode-ci CLI - CI pipeline orchestration for Xcode projects

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use xcode_ci::{Pipeline, StepConfig};

#[derive(Parser)]
#[command(
    name = "xcode-ci",
    version,
    about = "CI pipeline orchestrator for Xcode projects",
    long_about = "Sequences xcodebuild, the OCLint toolchain, sloccount, ocunit2junit, \
                  and pmd-cpd-objc for an Objective-C project, and post-processes their \
                  reports for the CI dashboard."
)]
struct Cli {
    /// Project directory to operate in
    #[arg(short = 'C', long, default_value = ".")]
    directory: PathBuf,

    /// Configuration file (.xcodecirc.yaml/.json is discovered when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the composed commands without running anything
    #[arg(long)]
    dry_run: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run lint, line counting, the test suite, and duplicate detection
    Build(StepArgs),

    /// Static analysis through the OCLint toolchain
    Lint(StepArgs),

    /// Count source lines with duplicate statistics
    LinesOfCode(StepArgs),

    /// Run the test suite through the JUnit formatter
    TestSuite(StepArgs),

    /// Detect duplicated code and post-process the report
    DuplicateCode(StepArgs),
}

#[derive(Args)]
struct StepArgs {
    /// Workspace to build
    #[arg(short, long)]
    workspace: Option<String>,

    /// Project to build
    #[arg(short, long)]
    project: Option<String>,

    /// Scheme to build
    #[arg(short, long)]
    scheme: Option<String>,

    /// Build configuration (Release when omitted)
    #[arg(long)]
    configuration: Option<String>,

    /// Minimum duplicated-token run for the duplicate detector
    #[arg(long)]
    minimum_tokens: Option<u32>,

    /// Extra options appended to a tool's composed command (BINARY=OPTIONS)
    #[arg(long, value_name = "BINARY=OPTIONS")]
    tool_options: Vec<String>,

    /// Replacement options for a tool, discarding the composed ones (BINARY=OPTIONS)
    #[arg(long, value_name = "BINARY=OPTIONS")]
    tool_override: Vec<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let base = match &cli.config {
        Some(path) => StepConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => StepConfig::discover(&cli.directory)?.unwrap_or_default(),
    };

    let pipeline = Pipeline::new(&cli.directory).dry_run(cli.dry_run);

    match cli.command {
        Commands::Build(args) => {
            let config = apply_args(base, args)?;
            pipeline.build(&config)?;
        }
        Commands::Lint(args) => {
            let config = apply_args(base, args)?;
            pipeline.install_dependencies(&config)?;
            pipeline.lint(&config)?;
        }
        Commands::LinesOfCode(args) => {
            let config = apply_args(base, args)?;
            pipeline.install_dependencies(&config)?;
            pipeline.lines_of_code(&config)?;
        }
        Commands::TestSuite(args) => {
            let config = apply_args(base, args)?;
            pipeline.install_dependencies(&config)?;
            pipeline.test_suite(&config)?;
        }
        Commands::DuplicateCode(args) => {
            let config = apply_args(base, args)?;
            pipeline.install_dependencies(&config)?;
            pipeline.duplicate_code_detection(&config)?;
        }
    }

    Ok(())
}

/// Layer CLI flags over the file-based configuration; flags win.
fn apply_args(mut config: StepConfig, args: StepArgs) -> anyhow::Result<StepConfig> {
    if let Some(workspace) = args.workspace {
        config = config.workspace(workspace);
    }
    if let Some(project) = args.project {
        config = config.project(project);
    }
    if let Some(scheme) = args.scheme {
        config = config.scheme(scheme);
    }
    if let Some(configuration) = args.configuration {
        config = config.configuration(configuration);
    }
    if let Some(tokens) = args.minimum_tokens {
        config = config.minimum_tokens(tokens);
    }
    for arg in args.tool_options {
        let (binary, options) = split_tool_arg(&arg)?;
        config = config.tool_extra(binary, options);
    }
    for arg in args.tool_override {
        let (binary, options) = split_tool_arg(&arg)?;
        config = config.tool_override(binary, options);
    }
    Ok(config)
}

fn split_tool_arg(arg: &str) -> anyhow::Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((binary, options)) if !binary.is_empty() => Ok((binary, options)),
        _ => bail!("expected BINARY=OPTIONS, got '{}'", arg),
    }
}
