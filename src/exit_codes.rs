//! Process exit codes.
//!
//! CI systems rely on these to tell findings apart from a broken setup.

/// Every linter passed on every scope
pub const SUCCESS: i32 = 0;

/// At least one linter reported findings or exited non-zero
pub const VIOLATIONS_FOUND: i32 = 1;

/// Configuration or environment error: unknown linter, bad template,
/// missing binary, no repository root
pub const TOOL_ERROR: i32 = 2;
