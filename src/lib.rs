//! codenanny runs external linters over the packages and directories touched
//! by a set of files and reports what they find.
//!
//! The pieces, bottom-up:
//! - [`linters`]: the registry of known linters, command templates, output
//!   patterns and the process runner
//! - [`scope`]: turning file lists into package and directory scopes
//! - [`dispatcher`]: running every applicable linter against every scope
//! - [`aggregate`]: folding per-linter results into a [`Report`]
//! - [`output`]: rendering a report as text, JSON or GitHub annotations

pub mod aggregate;
pub mod config;
pub mod dispatcher;
pub mod exit_codes;
pub mod finding;
pub mod installer;
pub mod linters;
pub mod output;
pub mod scope;

pub use aggregate::{Outcome, Report, aggregate};
pub use config::Config;
pub use dispatcher::{DispatchError, Dispatcher, ErrorKind, FixedRoot, GitRootResolver, RootResolver};
pub use finding::Finding;
pub use linters::{Applicability, LinterExecutor, LinterRegistry, LintOptions};
pub use scope::{Scope, Scopes, resolve_scopes};
