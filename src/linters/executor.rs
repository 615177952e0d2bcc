//! Process execution for linter commands.
//!
//! Every linter runs with the run's working root as its current directory.
//! Processes run one at a time; stdout and stderr are drained on reader threads
//! so a linter that fills one pipe cannot stall. On unix each linter leads its
//! own process group, and a timeout kills the whole group.

use super::template::LinterCommand;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Captured result of one linter process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Stdout followed by stderr.
    pub output: String,
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("linter executable '{program}' not found in PATH; run `codenanny install` first")]
    NotInstalled { program: String },
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },
    #[error("I/O error while running '{program}': {message}")]
    Io { program: String, message: String },
}

/// Runs a built linter command inside a working root.
pub trait ProcessRunner {
    fn run(&self, command: &LinterCommand, working_root: &Path) -> Result<ProcessOutput, ExecutorError>;
}

/// Runs linters as real child processes.
pub struct LinterExecutor {
    /// Resolved executable paths by program name.
    located: Mutex<HashMap<String, PathBuf>>,
    /// Timeout in milliseconds, 0 waits forever.
    timeout_ms: u64,
}

impl LinterExecutor {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            located: Mutex::new(HashMap::new()),
            timeout_ms,
        }
    }

    /// Find the program on `PATH` (cached).
    pub fn locate(&self, command: &LinterCommand) -> Result<PathBuf, ExecutorError> {
        let mut located = self.located.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = located.get(&command.program) {
            return Ok(path.clone());
        }

        let path = command.locate().map_err(|e| {
            log::debug!("[codenanny] Lookup of '{}' failed: {e}", command.program);
            ExecutorError::NotInstalled {
                program: command.program.clone(),
            }
        })?;
        located.insert(command.program.clone(), path.clone());
        Ok(path)
    }
}

impl Default for LinterExecutor {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ProcessRunner for LinterExecutor {
    fn run(&self, command: &LinterCommand, working_root: &Path) -> Result<ProcessOutput, ExecutorError> {
        let program = &command.program;
        let executable = self.locate(command)?;

        log::debug!("[codenanny] CMD: {command} (in {})", working_root.display());

        let mut cmd = Command::new(&executable);
        cmd.args(&command.args)
            .current_dir(working_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        own_process_group(&mut cmd);

        let mut child = cmd
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut stdout_handle = child
            .stdout
            .take()
            .map(|stdout| thread::spawn(move || read_pipe_to_string(stdout)));
        let mut stderr_handle = child
            .stderr
            .take()
            .map(|stderr| thread::spawn(move || read_pipe_to_string(stderr)));

        let io_error = |message: String| ExecutorError::Io {
            program: program.clone(),
            message,
        };

        let status = if self.timeout_ms == 0 {
            child.wait().map_err(|e| io_error(format!("failed to wait: {e}")))?
        } else {
            let timeout = Duration::from_millis(self.timeout_ms);
            let start = Instant::now();
            loop {
                if let Some(status) = child.try_wait().map_err(|e| io_error(format!("failed to poll: {e}")))? {
                    break status;
                }
                if start.elapsed() >= timeout {
                    kill_tree(&mut child);
                    let _ = child.wait();
                    // Grandchildren outside the group may still hold the pipes;
                    // the reader threads are left to finish on their own.
                    drop(stdout_handle.take());
                    drop(stderr_handle.take());
                    return Err(ExecutorError::Timeout {
                        program: program.clone(),
                        timeout_ms: self.timeout_ms,
                    });
                }
                thread::sleep(Duration::from_millis(10));
            }
        };

        let stdout = join_reader(stdout_handle.take()).map_err(io_error)?;
        let stderr = join_reader(stderr_handle.take()).map_err(io_error)?;

        let mut output = stdout;
        if !stderr.is_empty() {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&stderr);
        }

        Ok(ProcessOutput {
            output,
            exit_code: status.code(),
        })
    }
}

#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

/// Kill the linter and everything in its process group.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: killpg only sends a signal to the group created at spawn.
        unsafe {
            libc::killpg(pgid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

fn read_pipe_to_string<R: Read>(mut pipe: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).to_string())
}

fn join_reader(handle: Option<thread::JoinHandle<std::io::Result<String>>>) -> Result<String, String> {
    match handle {
        Some(handle) => match handle.join() {
            Ok(res) => res.map_err(|e| format!("failed to read output: {e}")),
            Err(_) => Err("output reader thread panicked".to_string()),
        },
        None => Ok(String::new()),
    }
}
