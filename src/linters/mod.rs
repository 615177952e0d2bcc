//! External linter definitions, command building and execution.
//!
//! # Overview
//!
//! Every linter is an opaque external program. codenanny knows three things
//! about each one:
//! - how to invoke it (a [`template::CommandTemplate`] with option placeholders)
//! - how to pass the scope it checks ([`template::TargetStyle`])
//! - how to read its output ([`pattern::OutputPattern`])
//!
//! # Custom Linters
//!
//! Define custom linters in `.codenanny.toml`:
//!
//! ```toml
//! [linters.mylint]
//! command = "mylint -strict {tests=-t}"
//! pattern = "PATH:LINE:MESSAGE"
//! target = "go-files"
//! ```

pub mod executor;
pub mod pattern;
pub mod registry;
pub mod template;

pub use executor::{ExecutorError, LinterExecutor, ProcessOutput, ProcessRunner};
pub use pattern::{OutputPattern, PatternError};
pub use registry::{Applicability, LinterDefinition, LinterRegistry, LinterSpec, RegistryError};
pub use template::{CommandTemplate, LintOptions, LinterCommand, TargetStyle, TemplateError};
