//! Built-in linter registry.
//!
//! Each entry maps a linter id to its invocation template, the way its scope is
//! passed on the command line, and the pattern used to pick findings out of its
//! output. User-defined linters from the configuration override built-ins with
//! the same id. The registry is immutable once constructed.

use super::pattern::{OutputPattern, PatternError};
use super::template::{CommandTemplate, TargetStyle, TemplateError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown linter '{0}'")]
    NotFound(String),
    #[error("linter '{0}' is listed for both packages and directories")]
    Overlap(String),
    #[error("invalid command template for linter '{id}': {source}")]
    Template {
        id: String,
        #[source]
        source: TemplateError,
    },
    #[error("invalid output pattern for linter '{id}': {source}")]
    Pattern {
        id: String,
        #[source]
        source: PatternError,
    },
}

/// Declarative description of a linter, as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LinterDefinition {
    /// Invocation template (program first, then arguments)
    pub command: String,

    /// Output pattern with named groups, or a `PATH:...` shorthand
    pub pattern: String,

    /// How the scope is appended (default: path)
    #[serde(default)]
    pub target: TargetStyle,

    /// Message used when the pattern captures none
    #[serde(default)]
    pub message: Option<String>,

    /// Module path handed to `go install` when the binary is missing
    #[serde(default)]
    pub install: Option<String>,
}

/// A validated linter entry.
#[derive(Debug, Clone)]
pub struct LinterSpec {
    pub id: String,
    pub template: CommandTemplate,
    pub target: TargetStyle,
    pub pattern: OutputPattern,
    pub message: Option<String>,
    pub install: Option<String>,
}

impl LinterSpec {
    pub fn compile(id: &str, definition: &LinterDefinition) -> Result<Self, RegistryError> {
        let template = CommandTemplate::parse(&definition.command).map_err(|source| RegistryError::Template {
            id: id.to_string(),
            source,
        })?;
        let pattern = OutputPattern::parse(&definition.pattern).map_err(|source| RegistryError::Pattern {
            id: id.to_string(),
            source,
        })?;

        Ok(Self {
            id: id.to_string(),
            template,
            target: definition.target,
            pattern,
            message: definition.message.clone(),
            install: definition.install.clone(),
        })
    }

    /// Program the linter runs.
    pub fn program(&self) -> &str {
        self.template.program()
    }
}

/// Registry of linter definitions.
#[derive(Debug, Clone, Default)]
pub struct LinterRegistry {
    /// User-defined linters (override built-ins)
    user_linters: IndexMap<String, LinterSpec>,
}

impl LinterRegistry {
    /// Create a registry with user-defined linters on top of the built-ins.
    pub fn new(user_linters: &IndexMap<String, LinterDefinition>) -> Result<Self, RegistryError> {
        let user_linters = user_linters
            .iter()
            .map(|(id, definition)| Ok((id.clone(), LinterSpec::compile(id, definition)?)))
            .collect::<Result<IndexMap<_, _>, RegistryError>>()?;
        Ok(Self { user_linters })
    }

    /// Get a linter by id, user linters first.
    pub fn get(&self, id: &str) -> Option<&LinterSpec> {
        self.user_linters.get(id).or_else(|| BUILTIN_LINTERS.get(id))
    }

    /// Like [`get`](Self::get), failing with [`RegistryError::NotFound`].
    pub fn lookup(&self, id: &str) -> Result<&LinterSpec, RegistryError> {
        self.get(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.user_linters.contains_key(id) || BUILTIN_LINTERS.contains_key(id)
    }

    /// All linter ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.user_linters.keys().map(String::as_str).collect();
        for key in BUILTIN_LINTERS.keys() {
            if !self.user_linters.contains_key(*key) {
                ids.push(key);
            }
        }
        ids.sort_unstable();
        ids
    }
}

/// Which linters run against which scope kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicability {
    pub package: Vec<String>,
    pub directory: Vec<String>,
}

impl Default for Applicability {
    fn default() -> Self {
        Self {
            package: vec!["errcheck".to_string()],
            directory: vec!["goimports".to_string()],
        }
    }
}

impl Applicability {
    /// Every referenced id must exist in `registry`, and the two lists must
    /// not share an id.
    pub fn validate(&self, registry: &LinterRegistry) -> Result<(), RegistryError> {
        for id in self.package.iter().chain(&self.directory) {
            registry.lookup(id)?;
        }
        if let Some(id) = self.package.iter().find(|id| self.directory.contains(id)) {
            return Err(RegistryError::Overlap(id.clone()));
        }
        Ok(())
    }

    /// Distinct ids across both lists, in declaration order.
    pub fn all_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for id in self.package.iter().chain(&self.directory) {
            if !ids.contains(&id.as_str()) {
                ids.push(id);
            }
        }
        ids
    }
}

const COLUMN_PREFIXED: &str = r"^(?:[^:]+: )?(?P<path>[^:]+):(?P<line>\d+):(?P<col>\d+):\s*(?P<message>.+)$";

struct Builtin {
    id: &'static str,
    command: &'static str,
    target: TargetStyle,
    pattern: &'static str,
    message: Option<&'static str>,
    install: Option<&'static str>,
}

const BUILTINS: &[Builtin] = &[
    Builtin {
        id: "aligncheck",
        command: "aligncheck",
        target: TargetStyle::Path,
        pattern: COLUMN_PREFIXED,
        message: None,
        install: Some("gitlab.com/opennota/check/cmd/aligncheck@latest"),
    },
    Builtin {
        id: "deadcode",
        command: "deadcode",
        target: TargetStyle::Path,
        pattern: r"^deadcode: (?P<path>.*?\.go):(?P<line>\d+):(?P<col>\d+):\s*(?P<message>.*)$",
        message: None,
        install: Some("github.com/tsenart/deadcode@latest"),
    },
    Builtin {
        id: "dupl",
        command: "dupl -plumbing -threshold {threshold=50}",
        target: TargetStyle::GoFiles,
        pattern: r"^(?P<path>[^\s][^:]+?\.go):(?P<line>\d+)-\d+:\s*(?P<message>.*)$",
        message: None,
        install: Some("github.com/mibk/dupl@latest"),
    },
    Builtin {
        id: "errcheck",
        command: "errcheck -abspath",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: Some("error return value not checked"),
        install: Some("github.com/kisielk/errcheck@latest"),
    },
    Builtin {
        id: "goconst",
        command: "goconst -min-occurrences {min_occurrences=3}",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: None,
        install: Some("github.com/jgautheron/goconst/cmd/goconst@latest"),
    },
    Builtin {
        id: "gocyclo",
        command: "gocyclo -over {mincyclo=10}",
        target: TargetStyle::Path,
        pattern: r"^(?P<cyclo>\d+)\s+\S+\s(?P<function>\S+)\s+(?P<path>[^:]+):(?P<line>\d+):(\d+)$",
        message: Some("cyclomatic complexity is too high"),
        install: Some("github.com/fzipp/gocyclo/cmd/gocyclo@latest"),
    },
    Builtin {
        id: "gofmt",
        command: "gofmt -l -s",
        target: TargetStyle::GoFiles,
        pattern: r"^(?P<path>[^\n]+)$",
        message: Some("file is not gofmt-ed with -s"),
        install: None,
    },
    Builtin {
        id: "goimports",
        command: "goimports -w",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:MESSAGE",
        message: None,
        install: Some("golang.org/x/tools/cmd/goimports@latest"),
    },
    Builtin {
        id: "golint",
        command: "golint -min_confidence {min_confidence=0.8}",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: None,
        install: Some("golang.org/x/lint/golint@latest"),
    },
    Builtin {
        id: "gotype",
        command: "gotype -e {tests=-a}",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: None,
        install: Some("golang.org/x/tools/cmd/gotype@latest"),
    },
    Builtin {
        id: "ineffassign",
        command: "ineffassign -n",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: None,
        install: Some("github.com/gordonklaus/ineffassign@latest"),
    },
    Builtin {
        id: "interfacer",
        command: "interfacer",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: None,
        install: Some("mvdan.cc/interfacer@latest"),
    },
    Builtin {
        id: "lll",
        command: "lll -g -l {maxlinelength=80}",
        target: TargetStyle::GoFiles,
        pattern: "PATH:LINE:MESSAGE",
        message: None,
        install: Some("github.com/walle/lll/cmd/lll@latest"),
    },
    Builtin {
        id: "structcheck",
        command: "structcheck {tests=-t}",
        target: TargetStyle::Path,
        pattern: COLUMN_PREFIXED,
        message: None,
        install: Some("gitlab.com/opennota/check/cmd/structcheck@latest"),
    },
    Builtin {
        id: "test",
        command: "go test",
        target: TargetStyle::Path,
        pattern: r"^--- FAIL: .*$\s+(?P<path>[^:]+):(?P<line>\d+): (?P<message>.*)$",
        message: None,
        install: None,
    },
    Builtin {
        id: "testify",
        command: "go test",
        target: TargetStyle::Path,
        pattern: r"Location:\s+(?P<path>[^:]+):(?P<line>\d+)$\s+Error:\s+(?P<message>[^\n]+)",
        message: None,
        install: None,
    },
    Builtin {
        id: "varcheck",
        command: "varcheck",
        target: TargetStyle::Path,
        pattern: r"^(?:[^:]+: )?(?P<path>[^:]+):(?P<line>\d+):(?P<col>\d+):[\s\t]+(?P<message>.*)$",
        message: None,
        install: Some("gitlab.com/opennota/check/cmd/varcheck@latest"),
    },
    Builtin {
        id: "vet",
        command: "go vet",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: None,
        install: None,
    },
    Builtin {
        id: "vetshadow",
        command: "shadow",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: None,
        install: Some("golang.org/x/tools/go/analysis/passes/shadow/cmd/shadow@latest"),
    },
    Builtin {
        id: "unconvert",
        command: "unconvert",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: None,
        install: Some("github.com/mdempsky/unconvert@latest"),
    },
    Builtin {
        id: "gosimple",
        command: "gosimple",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: None,
        install: Some("honnef.co/go/tools/cmd/gosimple@2020.1.6"),
    },
    Builtin {
        id: "staticcheck",
        command: "staticcheck",
        target: TargetStyle::Path,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: None,
        install: Some("honnef.co/go/tools/cmd/staticcheck@latest"),
    },
    Builtin {
        id: "misspell",
        command: "misspell",
        target: TargetStyle::GoFiles,
        pattern: "PATH:LINE:COL:MESSAGE",
        message: None,
        install: Some("github.com/client9/misspell/cmd/misspell@latest"),
    },
];

/// Built-in linter definitions, compiled once.
static BUILTIN_LINTERS: LazyLock<IndexMap<&'static str, LinterSpec>> = LazyLock::new(|| {
    BUILTINS
        .iter()
        .map(|b| {
            let definition = LinterDefinition {
                command: b.command.to_string(),
                pattern: b.pattern.to_string(),
                target: b.target,
                message: b.message.map(str::to_string),
                install: b.install.map(str::to_string),
            };
            let spec = LinterSpec::compile(b.id, &definition).expect("built-in linter table is valid");
            (b.id, spec)
        })
        .collect()
});
