use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;

use codenanny_lib::config::Config;
use codenanny_lib::dispatcher::{DispatchError, Dispatcher, ErrorKind, FixedRoot, GitRootResolver, RootResolver};
use codenanny_lib::exit_codes;
use codenanny_lib::installer::{self, DependencyStatus, InstallMode};
use codenanny_lib::linters::{LinterExecutor, LinterRegistry};
use codenanny_lib::output::{OutputFormat, OutputWriter};
use codenanny_lib::scope::{self, Scopes};

#[derive(Parser)]
#[command(author, version, about = "Run Go linters over the packages and directories touched by a change", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print findings, no summary
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path (default: discovered upward from the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Repository root to run linters in (default: `git rev-parse --show-toplevel`)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Output format: text, json, github
    #[arg(long, global = true, default_value = "text")]
    output_format: String,

    /// Run every linter on every scope instead of stopping at the first failure
    #[arg(long, global = true)]
    no_fail_fast: bool,

    /// Timeout per linter in milliseconds (0 disables)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Linters run per package (comma-separated, overrides config)
    #[arg(long, global = true)]
    package_linters: Option<String>,

    /// Linters run per directory (comma-separated, overrides config)
    #[arg(long, global = true)]
    dir_linters: Option<String>,

    /// Install missing linters before linting
    #[arg(long, global = true)]
    install: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint the given files
    Lint(LintArgs),
    /// Lint every file under a directory
    Lintdir {
        /// Directory to walk
        #[arg(short, long, default_value = "./")]
        path: PathBuf,
    },
    /// Install missing linter binaries
    Install {
        /// Only show what would be installed
        #[arg(long)]
        dry_run: bool,
    },
    /// List known linters
    ListLinters,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct LintArgs {
    /// File with one path per line
    #[arg(long)]
    list: Option<PathBuf>,

    /// Files to lint
    #[arg(long, num_args = 1..)]
    files: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            let label = match e.downcast_ref::<DispatchError>().map(DispatchError::kind) {
                Some(ErrorKind::Configuration) => "Configuration error",
                Some(ErrorKind::Environment) => "Environment error",
                None => "Error",
            };
            let _ = OutputWriter::new(cli.quiet).write_error(&format!("{}: {e:#}", label.red().bold()));
            process::exit(exit_codes::TOOL_ERROR);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let config = load_config(cli, &cwd)?;
    let registry = config.registry().context("Invalid linter definitions")?;

    match &cli.command {
        Commands::ListLinters => {
            list_linters(&registry, &config, cli.verbose);
            Ok(exit_codes::SUCCESS)
        }
        Commands::Install { dry_run } => {
            let mode = if *dry_run { InstallMode::DryRun } else { InstallMode::Install };
            install(&registry, &config, mode)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::Lint(args) => {
            let files = match &args.list {
                Some(list) => scope::read_file_list(list)?,
                None => args.files.clone(),
            };
            lint(cli, config, registry, &cwd, files)
        }
        Commands::Lintdir { path } => {
            let files = scope::list_dir(path)?;
            lint(cli, config, registry, &cwd, files)
        }
    }
}

fn load_config(cli: &Cli, cwd: &Path) -> Result<Config> {
    let (mut config, path) = Config::load(cli.config.as_deref(), cwd)?;
    if let Some(path) = path {
        log::debug!("[codenanny-config] Using {}", path.display());
    }

    if let Some(list) = &cli.package_linters {
        config.package_linters = split_list(list);
    }
    if let Some(list) = &cli.dir_linters {
        config.dir_linters = split_list(list);
    }
    if cli.no_fail_fast {
        config.fail_fast = false;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout = timeout;
    }
    Ok(config)
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn lint(cli: &Cli, config: Config, registry: LinterRegistry, cwd: &Path, files: Vec<String>) -> Result<i32> {
    let format: OutputFormat = cli.output_format.parse().map_err(anyhow::Error::msg)?;
    let applicability = config.applicability();

    if cli.install {
        installer::check_external_dependencies(&registry, &applicability.all_ids(), InstallMode::Install)?;
    }

    let dispatcher = Dispatcher::new(registry, applicability, config.options.clone())?.fail_fast(config.fail_fast);

    let resolver: Box<dyn RootResolver> = match &cli.root {
        Some(root) => Box::new(FixedRoot(root.clone())),
        None => Box::new(GitRootResolver::default()),
    };

    // Paths are relative to the working root, which is only needed when
    // there is something to check.
    let scopes = if files.is_empty() {
        Scopes::default()
    } else {
        let root = resolver.resolve()?;
        let root = root.canonicalize().unwrap_or(root);
        let cwd = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());
        let files: Vec<String> = files.iter().map(|f| relative_to_root(f, &cwd, &root)).collect();
        scope::resolve_scopes(&files)
    };

    let runner = LinterExecutor::new(config.timeout);
    let report = dispatcher.run(resolver.as_ref(), &scopes, &runner)?;

    let writer = OutputWriter::new(cli.quiet);
    let formatter = format.create_formatter(std::io::stdout().is_terminal());
    writer.write_report(&formatter.format_report(&report))?;
    if let Some(summary) = formatter.format_summary(&report) {
        writer.write_status(&summary)?;
    }

    Ok(if report.is_ok() {
        exit_codes::SUCCESS
    } else {
        exit_codes::VIOLATIONS_FOUND
    })
}

/// Express `file` relative to `root`; paths outside the root are kept as given.
/// `cwd` and `root` must already be canonical, so files that no longer exist
/// still line up with the root.
fn relative_to_root(file: &str, cwd: &Path, root: &Path) -> String {
    let absolute = cwd.join(file);
    let absolute = absolute.canonicalize().unwrap_or(absolute);

    match absolute.strip_prefix(root) {
        Ok(relative) => relative.to_string_lossy().to_string(),
        Err(_) => file.to_string(),
    }
}

fn list_linters(registry: &LinterRegistry, config: &Config, verbose: bool) {
    for id in registry.ids() {
        let Some(spec) = registry.get(id) else { continue };
        let mut markers = Vec::new();
        if config.package_linters.iter().any(|l| l == id) {
            markers.push("package");
        }
        if config.dir_linters.iter().any(|l| l == id) {
            markers.push("dir");
        }
        let marker = if markers.is_empty() {
            String::new()
        } else {
            format!(" [{}]", markers.join(", ")).green().to_string()
        };
        println!("{}{marker}: {}", id.bold(), spec.template);
        if verbose {
            println!("    target: {:?}, pattern: {}", spec.target, spec.pattern.as_str());
        }
    }
}

fn install(registry: &LinterRegistry, config: &Config, mode: InstallMode) -> Result<()> {
    let applicability = config.applicability();
    for status in installer::check_external_dependencies(registry, &applicability.all_ids(), mode)? {
        match status {
            DependencyStatus::Present { program, path } => {
                println!("{program}: found at {}", path.display())
            }
            DependencyStatus::WouldInstall { program, source } => {
                println!("{program}: would run `go install {source}`")
            }
            DependencyStatus::Installed { program, path } => {
                println!("{program}: installed to {}", path.display())
            }
        }
    }
    Ok(())
}
