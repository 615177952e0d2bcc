//! Bootstrapping of missing linter binaries.
//!
//! Runs before the dispatcher. Each needed program is looked up on `PATH`;
//! missing ones are fetched with `go install <module>@<version>`.

use crate::linters::registry::{LinterRegistry, RegistryError};
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("'{program}' (linter '{linter}') is not installed and has no install source")]
    NoSource { linter: String, program: String },
    #[error("'{program}' (linter '{linter}') is not installed; run `codenanny install`")]
    Missing { linter: String, program: String },
    #[error("the go toolchain is required to install '{source_path}' but was not found in PATH")]
    GoNotFound { source_path: String },
    #[error("`go install {source_path}` failed: {message}")]
    InstallFailed { source_path: String, message: String },
    #[error("after installing {source_path}, '{program}' still can't be found in PATH")]
    StillMissing { source_path: String, program: String },
}

/// What to do about missing binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Only report; a missing binary is an error.
    Check,
    /// Report what would be installed without running anything.
    DryRun,
    /// Install missing binaries.
    Install,
}

/// State of one linter program after the check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyStatus {
    Present { program: String, path: PathBuf },
    WouldInstall { program: String, source: String },
    Installed { program: String, path: PathBuf },
}

/// Make sure the programs of `ids` are available.
pub fn check_external_dependencies(
    registry: &LinterRegistry,
    ids: &[&str],
    mode: InstallMode,
) -> Result<Vec<DependencyStatus>, InstallError> {
    let mut statuses = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for id in ids {
        let spec = registry.lookup(id)?;
        let program = spec.program();
        if seen.contains(&program) {
            continue;
        }
        seen.push(program);

        if let Ok(path) = which::which(program) {
            log::debug!("[codenanny] Found {program} at {}", path.display());
            statuses.push(DependencyStatus::Present {
                program: program.to_string(),
                path,
            });
            continue;
        }

        let Some(source) = spec.install.as_deref() else {
            return Err(InstallError::NoSource {
                linter: id.to_string(),
                program: program.to_string(),
            });
        };

        match mode {
            InstallMode::Check => {
                return Err(InstallError::Missing {
                    linter: id.to_string(),
                    program: program.to_string(),
                });
            }
            InstallMode::DryRun => statuses.push(DependencyStatus::WouldInstall {
                program: program.to_string(),
                source: source.to_string(),
            }),
            InstallMode::Install => {
                let path = install(program, source)?;
                statuses.push(DependencyStatus::Installed {
                    program: program.to_string(),
                    path,
                });
            }
        }
    }

    Ok(statuses)
}

fn install(program: &str, source: &str) -> Result<PathBuf, InstallError> {
    let go = which::which("go").map_err(|_| InstallError::GoNotFound {
        source_path: source.to_string(),
    })?;

    log::info!("Installing {program} from {source}");
    let output = Command::new(go)
        .args(["install", source])
        .output()
        .map_err(|e| InstallError::InstallFailed {
            source_path: source.to_string(),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(InstallError::InstallFailed {
            source_path: source.to_string(),
            message: stderr.trim().to_string(),
        });
    }

    which::which(program).map_err(|_| InstallError::StillMissing {
        source_path: source.to_string(),
        program: program.to_string(),
    })
}
