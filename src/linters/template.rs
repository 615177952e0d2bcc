//! Invocation templates and the command builder.
//!
//! A template is a whitespace separated command line. Tokens may contain
//! `{name}` or `{name=default}` placeholders that are filled from
//! [`LintOptions`] when the command is built:
//!
//! ```text
//! gocyclo -over {mincyclo=10}
//! gotype -e {tests=-a}
//! ```
//!
//! Numeric options render as their value. The boolean `tests` option renders
//! the declared text when on and drops the whole token when off. An unset
//! option falls back to the declared default.

use crate::scope::Scope;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Placeholder names the builder knows how to fill.
pub const KNOWN_PLACEHOLDERS: &[&str] = &[
    "threshold",
    "min_occurrences",
    "mincyclo",
    "min_confidence",
    "maxlinelength",
    "tests",
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("empty invocation template")]
    Empty,
    #[error("unclosed placeholder in template token '{0}'")]
    Unclosed(String),
    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),
    #[error("program name '{0}' cannot be a placeholder")]
    PlaceholderProgram(String),
    #[error("flag placeholder '{{{0}}}' needs a declared flag text, e.g. '{{{0}=-a}}'")]
    FlagWithoutText(String),
    #[error("placeholder '{{{name}}}' of linter '{linter}' has no value and no default")]
    Missing { linter: String, name: String },
    #[error("failed to list Go files in '{dir}': {source}")]
    Target {
        dir: String,
        #[source]
        source: std::io::Error,
    },
}

/// Tunables substituted into invocation templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LintOptions {
    /// Duplicate code similarity threshold (dupl).
    pub threshold: Option<u32>,
    /// Minimum occurrences before a string should become a constant (goconst).
    pub min_occurrences: Option<u32>,
    /// Cyclomatic complexity threshold (gocyclo).
    pub mincyclo: Option<u32>,
    /// Minimum lint confidence (golint).
    pub min_confidence: Option<f64>,
    /// Maximum line length (lll).
    pub maxlinelength: Option<u32>,
    /// Include test files (gotype, structcheck).
    pub tests: Option<bool>,
}

enum OptionValue {
    Text(String),
    Flag(bool),
}

impl LintOptions {
    fn value(&self, name: &str) -> Option<OptionValue> {
        match name {
            "threshold" => self.threshold.map(|v| OptionValue::Text(v.to_string())),
            "min_occurrences" => self.min_occurrences.map(|v| OptionValue::Text(v.to_string())),
            "mincyclo" => self.mincyclo.map(|v| OptionValue::Text(v.to_string())),
            "min_confidence" => self.min_confidence.map(|v| OptionValue::Text(v.to_string())),
            "maxlinelength" => self.maxlinelength.map(|v| OptionValue::Text(v.to_string())),
            "tests" => self.tests.map(OptionValue::Flag),
            _ => None,
        }
    }
}

fn is_flag(name: &str) -> bool {
    name == "tests"
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder { name: String, default: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    raw: String,
    segments: Vec<Segment>,
}

impl Token {
    fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = raw;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| TemplateError::Unclosed(raw.to_string()))?;
            let inner = &after[..close];
            let (name, default) = match inner.split_once('=') {
                Some((name, default)) => (name.trim(), Some(default.to_string())),
                None => (inner.trim(), None),
            };
            if !KNOWN_PLACEHOLDERS.contains(&name) {
                return Err(TemplateError::UnknownPlaceholder(name.to_string()));
            }
            if is_flag(name) && default.as_deref().is_none_or(str::is_empty) {
                return Err(TemplateError::FlagWithoutText(name.to_string()));
            }
            segments.push(Segment::Placeholder {
                name: name.to_string(),
                default,
            });
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Render the token; `None` means the token is dropped.
    fn render(&self, linter: &str, options: &LintOptions) -> Result<Option<String>, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { name, default } => match options.value(name) {
                    Some(OptionValue::Text(value)) => out.push_str(&value),
                    Some(OptionValue::Flag(true)) => out.push_str(default.as_deref().unwrap_or_default()),
                    Some(OptionValue::Flag(false)) => return Ok(None),
                    None => match default {
                        Some(default) => out.push_str(default),
                        None => {
                            return Err(TemplateError::Missing {
                                linter: linter.to_string(),
                                name: name.clone(),
                            });
                        }
                    },
                },
            }
        }
        Ok(if out.is_empty() { None } else { Some(out) })
    }
}

/// Parsed invocation template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<Token>,
}

impl CommandTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut tokens = template.split_whitespace();
        let program = tokens.next().ok_or(TemplateError::Empty)?;
        let program_token = Token::parse(program)?;
        if !program_token.is_literal() {
            return Err(TemplateError::PlaceholderProgram(program.to_string()));
        }

        let args = tokens.map(Token::parse).collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            program: program.to_string(),
            args,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Substitute every placeholder and return the argument list (program excluded).
    pub fn render(&self, linter: &str, options: &LintOptions) -> Result<Vec<String>, TemplateError> {
        let mut args = Vec::with_capacity(self.args.len());
        for token in &self.args {
            if let Some(rendered) = token.render(linter, options)? {
                args.push(rendered);
            }
        }
        Ok(args)
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for token in &self.args {
            write!(f, " {}", token.raw)?;
        }
        Ok(())
    }
}

/// How a scope is appended to a linter's command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetStyle {
    /// Append the scope itself (`./pkg/a` for packages, the directory for dirs).
    #[default]
    Path,
    /// Append the `*.go` files directly inside the scope directory.
    GoFiles,
}

impl TargetStyle {
    /// Positional arguments naming `scope`, relative to `root`.
    pub fn args(self, scope: &Scope, root: &Path) -> Result<Vec<String>, TemplateError> {
        match self {
            TargetStyle::Path => Ok(vec![scope.as_arg()]),
            TargetStyle::GoFiles => {
                let dir = scope.as_str();
                let files = go_files_in(&root.join(dir)).map_err(|source| TemplateError::Target {
                    dir: dir.to_string(),
                    source,
                })?;
                if files.is_empty() {
                    return Ok(vec![scope.as_arg()]);
                }
                Ok(files
                    .into_iter()
                    .map(|name| if dir == "." { name } else { format!("{dir}/{name}") })
                    .collect())
            }
        }
    }
}

fn go_files_in(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut files = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("[codenanny] {} does not exist, passing the directory itself", dir.display());
            return Ok(files);
        }
        Err(e) => return Err(e),
    };
    for entry in entries {
        let path: PathBuf = entry?.path();
        if path.is_file()
            && path.extension().is_some_and(|ext| ext == "go")
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            files.push(name.to_string());
        }
    }
    files.sort();
    Ok(files)
}

/// A fully resolved linter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinterCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl LinterCommand {
    /// Locate the program on `PATH`.
    pub fn locate(&self) -> Result<PathBuf, which::Error> {
        which::which(&self.program)
    }

    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for LinterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Build the command line for running `template` of linter `id` against `target`.
pub fn build(
    id: &str,
    template: &CommandTemplate,
    target: &[String],
    options: &LintOptions,
) -> Result<LinterCommand, TemplateError> {
    let mut args = template.render(id, options)?;
    args.extend(target.iter().cloned());
    Ok(LinterCommand {
        program: template.program().to_string(),
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn render(template: &str, options: &LintOptions) -> Result<Vec<String>, TemplateError> {
        CommandTemplate::parse(template)?.render("test", options)
    }

    #[test]
    fn test_parse_plain_template() {
        let template = CommandTemplate::parse("errcheck -abspath").unwrap();
        assert_eq!(template.program(), "errcheck");
        assert_eq!(template.render("errcheck", &LintOptions::default()).unwrap(), vec!["-abspath"]);
        assert_eq!(template.to_string(), "errcheck -abspath");
    }

    #[test]
    fn test_numeric_placeholder_from_options() {
        let options = LintOptions {
            mincyclo: Some(15),
            ..Default::default()
        };
        assert_eq!(render("gocyclo -over {mincyclo=10}", &options).unwrap(), vec!["-over", "15"]);
    }

    #[test]
    fn test_numeric_placeholder_default() {
        assert_eq!(
            render("gocyclo -over {mincyclo=10}", &LintOptions::default()).unwrap(),
            vec!["-over", "10"]
        );
    }

    #[test]
    fn test_missing_required_placeholder() {
        let err = render("gocyclo -over {mincyclo}", &LintOptions::default()).unwrap_err();
        assert!(matches!(err, TemplateError::Missing { ref name, .. } if name == "mincyclo"));
    }

    #[test]
    fn test_flag_placeholder() {
        let on = LintOptions {
            tests: Some(true),
            ..Default::default()
        };
        let off = LintOptions {
            tests: Some(false),
            ..Default::default()
        };

        assert_eq!(render("gotype -e {tests=-a}", &on).unwrap(), vec!["-e", "-a"]);
        assert_eq!(render("gotype -e {tests=-a}", &off).unwrap(), vec!["-e"]);
        // Unset falls back to the declared text
        assert_eq!(render("gotype -e {tests=-a}", &LintOptions::default()).unwrap(), vec!["-e", "-a"]);
    }

    #[test]
    fn test_embedded_placeholder() {
        let options = LintOptions {
            maxlinelength: Some(100),
            ..Default::default()
        };
        assert_eq!(render("lll --max={maxlinelength}", &options).unwrap(), vec!["--max=100"]);
    }

    #[test]
    fn test_template_errors() {
        assert!(matches!(CommandTemplate::parse("   "), Err(TemplateError::Empty)));
        assert!(matches!(CommandTemplate::parse("dupl {threshold"), Err(TemplateError::Unclosed(_))));
        assert!(matches!(
            CommandTemplate::parse("dupl {nope}"),
            Err(TemplateError::UnknownPlaceholder(ref n)) if n == "nope"
        ));
        assert!(matches!(
            CommandTemplate::parse("{threshold} -x"),
            Err(TemplateError::PlaceholderProgram(_))
        ));
        assert!(matches!(CommandTemplate::parse("gotype {tests}"), Err(TemplateError::FlagWithoutText(_))));
    }

    #[test]
    fn test_build_appends_target() {
        let template = CommandTemplate::parse("errcheck -abspath").unwrap();
        let command = build("errcheck", &template, &["./pkg/a".to_string()], &LintOptions::default()).unwrap();

        assert_eq!(command.argv(), vec!["errcheck", "-abspath", "./pkg/a"]);
        assert_eq!(command.to_string(), "errcheck -abspath ./pkg/a");
    }

    #[test]
    fn test_go_files_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("cmd")).unwrap();
        std::fs::write(dir.path().join("cmd/b.go"), "package main\n").unwrap();
        std::fs::write(dir.path().join("cmd/a.go"), "package main\n").unwrap();
        std::fs::write(dir.path().join("cmd/README.md"), "# cmd\n").unwrap();
        std::fs::write(dir.path().join("main.go"), "package main\n").unwrap();

        let args = TargetStyle::GoFiles
            .args(&Scope::Directory("cmd".to_string()), dir.path())
            .unwrap();
        assert_eq!(args, vec!["cmd/a.go", "cmd/b.go"]);

        let args = TargetStyle::GoFiles
            .args(&Scope::Directory(".".to_string()), dir.path())
            .unwrap();
        assert_eq!(args, vec!["main.go"]);
    }

    #[test]
    fn test_go_files_target_without_go_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();

        let args = TargetStyle::GoFiles
            .args(&Scope::Directory("docs".to_string()), dir.path())
            .unwrap();
        assert_eq!(args, vec!["./docs"]);
    }

    #[test]
    fn test_go_files_target_for_deleted_directory() {
        // Staged deletions name directories that no longer exist
        let dir = tempfile::tempdir().unwrap();

        let args = TargetStyle::GoFiles
            .args(&Scope::Directory("pkg/gone".to_string()), dir.path())
            .unwrap();
        assert_eq!(args, vec!["./pkg/gone"]);
    }

    #[test]
    fn test_path_target() {
        let root = Path::new("/repo");
        assert_eq!(
            TargetStyle::Path.args(&Scope::Package("pkg/a".to_string()), root).unwrap(),
            vec!["./pkg/a"]
        );
        assert_eq!(
            TargetStyle::Path.args(&Scope::Directory(".".to_string()), root).unwrap(),
            vec!["."]
        );
    }

    fn options_strategy() -> impl Strategy<Value = LintOptions> {
        (
            proptest::option::of(0u32..500),
            proptest::option::of(1u32..20),
            proptest::option::of(1u32..100),
            proptest::option::of(0.0f64..1.0),
            proptest::option::of(40u32..300),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(
                |(threshold, min_occurrences, mincyclo, min_confidence, maxlinelength, tests)| LintOptions {
                    threshold,
                    min_occurrences,
                    mincyclo,
                    min_confidence,
                    maxlinelength,
                    tests,
                },
            )
    }

    proptest! {
        #[test]
        fn prop_builtin_templates_leave_no_placeholders(options in options_strategy()) {
            let registry = crate::linters::LinterRegistry::default();
            for id in registry.ids() {
                let spec = registry.lookup(id).unwrap();
                let command = build(id, &spec.template, &["./pkg".to_string()], &options).unwrap();
                for arg in command.argv() {
                    prop_assert!(!arg.contains('{') && !arg.contains('}'), "{id}: unresolved '{arg}'");
                }
            }
        }
    }
}
