//! The dispatch engine: resolve the working root, run every applicable linter
//! against every scope, and fold the results into a [`Report`].
//!
//! A run moves through `NotStarted → ResolvingRoot → Scanning → {Failed | Clean}`.
//! The working root is resolved once and passed to every spawned process; the
//! process-wide current directory is never touched.

use crate::aggregate::{Aggregator, Outcome, Report, RunResult};
use crate::finding::Finding;
use crate::linters::executor::{ExecutorError, ProcessOutput, ProcessRunner};
use crate::linters::registry::{Applicability, LinterRegistry, LinterSpec, RegistryError};
use crate::linters::template::{self, LintOptions, TemplateError};
use crate::scope::{Scope, Scopes};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("linter '{linter}': {source}")]
    Template {
        linter: String,
        #[source]
        source: TemplateError,
    },
    #[error("could not resolve repository root: {0}")]
    RootResolution(String),
    #[error("working root '{path}' is not usable: {message}")]
    WorkDir { path: String, message: String },
    #[error("linter '{linter}' on {scope}: {source}")]
    Executor {
        linter: String,
        scope: Scope,
        #[source]
        source: ExecutorError,
    },
}

/// Broad class of a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad registry, applicability or template; detected before anything runs.
    Configuration,
    /// The machine cannot run the linters: no root, no binary, spawn failure.
    Environment,
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Registry(_) => ErrorKind::Configuration,
            DispatchError::Template {
                source: TemplateError::Target { .. },
                ..
            } => ErrorKind::Environment,
            DispatchError::Template { .. } => ErrorKind::Configuration,
            DispatchError::RootResolution(_) | DispatchError::WorkDir { .. } | DispatchError::Executor { .. } => {
                ErrorKind::Environment
            }
        }
    }
}

/// Finds the repository root a run works in.
pub trait RootResolver {
    fn resolve(&self) -> Result<PathBuf, DispatchError>;
}

/// Asks git for the top-level directory of the working tree.
#[derive(Debug, Clone, Default)]
pub struct GitRootResolver {
    /// Directory git is asked from; the current directory when `None`.
    pub start: Option<PathBuf>,
}

impl RootResolver for GitRootResolver {
    fn resolve(&self) -> Result<PathBuf, DispatchError> {
        let mut cmd = Command::new("git");
        cmd.args(["rev-parse", "--show-toplevel"]);
        if let Some(start) = &self.start {
            cmd.current_dir(start);
        }

        let output = cmd
            .output()
            .map_err(|e| DispatchError::RootResolution(format!("failed to run git: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DispatchError::RootResolution(stderr.trim().to_string()));
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if root.is_empty() {
            return Err(DispatchError::RootResolution("git printed no top-level directory".to_string()));
        }
        log::debug!("[codenanny] Repository root: {root}");
        Ok(PathBuf::from(root))
    }
}

/// Uses a fixed directory as the root.
#[derive(Debug, Clone)]
pub struct FixedRoot(pub PathBuf);

impl RootResolver for FixedRoot {
    fn resolve(&self) -> Result<PathBuf, DispatchError> {
        Ok(self.0.clone())
    }
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    ResolvingRoot,
    Scanning,
    Failed,
    Clean,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::NotStarted => "not-started",
            RunState::ResolvingRoot => "resolving-root",
            RunState::Scanning => "scanning",
            RunState::Failed => "failed",
            RunState::Clean => "clean",
        };
        f.write_str(name)
    }
}

fn transition(state: &mut RunState, next: RunState) {
    log::debug!("[codenanny] Run state {state} -> {next}");
    *state = next;
}

/// Canonical, existing directory every linter of the run executes in.
fn working_root(root: &Path) -> Result<PathBuf, DispatchError> {
    let canonical = root.canonicalize().map_err(|e| DispatchError::WorkDir {
        path: root.display().to_string(),
        message: e.to_string(),
    })?;
    if !canonical.is_dir() {
        return Err(DispatchError::WorkDir {
            path: canonical.display().to_string(),
            message: "not a directory".to_string(),
        });
    }
    Ok(canonical)
}

/// Runs applicable linters against package and directory scopes.
#[derive(Debug)]
pub struct Dispatcher {
    registry: LinterRegistry,
    applicability: Applicability,
    options: LintOptions,
    fail_fast: bool,
}

impl Dispatcher {
    /// Validate the configuration up front: every applicable linter must exist
    /// and its template must resolve against `options`.
    pub fn new(
        registry: LinterRegistry,
        applicability: Applicability,
        options: LintOptions,
    ) -> Result<Self, DispatchError> {
        applicability.validate(&registry)?;
        for id in applicability.all_ids() {
            let spec = registry.lookup(id)?;
            spec.template
                .render(id, &options)
                .map_err(|source| DispatchError::Template {
                    linter: id.to_string(),
                    source,
                })?;
        }

        Ok(Self {
            registry,
            applicability,
            options,
            fail_fast: true,
        })
    }

    /// Stop at the first failing linter (default) or run every pair.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    fn pairs<'a>(&'a self, scopes: &'a Scopes) -> impl Iterator<Item = (Scope, &'a str)> + 'a {
        let packages = scopes.packages.iter().flat_map(move |pkg| {
            self.applicability
                .package
                .iter()
                .map(move |linter| (Scope::Package(pkg.clone()), linter.as_str()))
        });
        let directories = scopes.directories.iter().flat_map(move |dir| {
            self.applicability
                .directory
                .iter()
                .map(move |linter| (Scope::Directory(dir.clone()), linter.as_str()))
        });
        packages.chain(directories)
    }

    pub fn run(
        &self,
        resolver: &dyn RootResolver,
        scopes: &Scopes,
        runner: &dyn ProcessRunner,
    ) -> Result<Report, DispatchError> {
        let mut state = RunState::NotStarted;

        if self.pairs(scopes).next().is_none() {
            log::debug!("[codenanny] Nothing to check");
            transition(&mut state, RunState::Clean);
            return Ok(Report::clean());
        }

        transition(&mut state, RunState::ResolvingRoot);
        let root = working_root(&resolver.resolve()?)?;

        transition(&mut state, RunState::Scanning);
        let mut aggregator = Aggregator::new(self.fail_fast);
        for (scope, linter) in self.pairs(scopes) {
            log::debug!("[codenanny] Checking {scope} with {linter}");
            let result = self.check(&scope, linter, &root, runner)?;
            if aggregator.record(result).is_break() {
                break;
            }
        }

        let report = aggregator.finish();
        let terminal = match report.outcome {
            Outcome::Clean => RunState::Clean,
            Outcome::Failed => RunState::Failed,
        };
        transition(&mut state, terminal);
        Ok(report)
    }

    fn check(
        &self,
        scope: &Scope,
        linter: &str,
        root: &Path,
        runner: &dyn ProcessRunner,
    ) -> Result<RunResult, DispatchError> {
        let spec = self.registry.lookup(linter)?;
        let template_error = |source: TemplateError| DispatchError::Template {
            linter: linter.to_string(),
            source,
        };

        let target = spec.target.args(scope, root).map_err(template_error)?;
        let command = template::build(linter, &spec.template, &target, &self.options).map_err(template_error)?;
        let output = runner.run(&command, root).map_err(|source| DispatchError::Executor {
            linter: linter.to_string(),
            scope: scope.clone(),
            source,
        })?;

        Ok(evaluate(scope, spec, output))
    }
}

/// Match a linter's output against its pattern.
///
/// A non-zero exit without any matching line still yields one finding, located
/// at the scope, so that a failure is never silent.
fn evaluate(scope: &Scope, spec: &LinterSpec, output: ProcessOutput) -> RunResult {
    let mut findings = spec.pattern.findings(&spec.id, &output.output, spec.message.as_deref());

    if findings.is_empty() {
        if !output.success() {
            let message = output
                .output
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| match output.exit_code {
                    Some(code) => format!("exited with status {code}"),
                    None => "terminated by signal".to_string(),
                });
            findings.push(Finding {
                linter: spec.id.clone(),
                path: scope.as_str().to_string(),
                line: None,
                column: None,
                message,
            });
        } else if !output.output.trim().is_empty() {
            log::debug!(
                "[codenanny] {} exited 0 and its output matched no findings; treating as clean",
                spec.id
            );
        }
    }

    RunResult {
        scope: scope.clone(),
        linter: spec.id.clone(),
        exit_code: output.exit_code,
        output: output.output,
        findings,
    }
}
