//! Turning file lists into package and directory scopes.

use ignore::WalkBuilder;
use indexmap::IndexSet;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("failed to read file list {path}: {source}")]
    ReadList {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: String,
        #[source]
        source: ignore::Error,
    },
}

/// The unit a linter runs against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A Go package, identified by its directory relative to the repository root.
    Package(String),
    /// A directory relative to the repository root.
    Directory(String),
}

impl Scope {
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Package(p) | Scope::Directory(p) => p,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Scope::Package(_) => "package",
            Scope::Directory(_) => "directory",
        }
    }

    /// Command line form: relative paths get a `./` prefix so Go tools do not
    /// mistake them for import paths.
    pub fn as_arg(&self) -> String {
        let path = self.as_str();
        if path.starts_with('.') || path.starts_with('/') {
            path.to_string()
        } else {
            format!("./{path}")
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.as_str())
    }
}

/// Packages and directories derived from a file list, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scopes {
    pub packages: IndexSet<String>,
    pub directories: IndexSet<String>,
}

impl Scopes {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.directories.is_empty()
    }
}

fn normalize(file: &str) -> Option<String> {
    let file = file.trim().replace('\\', "/");
    let mut file = file.as_str();
    while let Some(rest) = file.strip_prefix("./") {
        file = rest;
    }
    if file.is_empty() { None } else { Some(file.to_string()) }
}

fn parent_dir(file: &str) -> String {
    match file.rsplit_once('/') {
        Some(("", _)) => "/".to_string(),
        Some((dir, _)) => dir.to_string(),
        None => ".".to_string(),
    }
}

/// Resolve files into package scopes (directories holding `.go` files) and
/// directory scopes (directories holding any file).
pub fn resolve_scopes<S: AsRef<str>>(files: &[S]) -> Scopes {
    let mut scopes = Scopes::default();
    for file in files {
        let Some(file) = normalize(file.as_ref()) else {
            continue;
        };
        let dir = parent_dir(&file);
        if file.ends_with(".go") {
            scopes.packages.insert(dir.clone());
        }
        scopes.directories.insert(dir);
    }
    log::debug!(
        "[codenanny] Resolved {} files into {} packages and {} directories",
        files.len(),
        scopes.packages.len(),
        scopes.directories.len()
    );
    scopes
}

/// Read a file list: one path per line, blank lines and `#` comments skipped.
pub fn read_file_list(path: &Path) -> Result<Vec<String>, ScopeError> {
    let content = fs::read_to_string(path).map_err(|source| ScopeError::ReadList {
        path: path.display().to_string(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// List every file under `dir`, honouring `.gitignore`.
pub fn list_dir(dir: &Path) -> Result<Vec<String>, ScopeError> {
    let mut files = Vec::new();
    let walker = WalkBuilder::new(dir).hidden(true).git_ignore(true).require_git(false).build();
    for entry in walker {
        let entry = entry.map_err(|source| ScopeError::Walk {
            path: dir.display().to_string(),
            source,
        })?;
        if entry.file_type().is_some_and(|ft| ft.is_file()) {
            files.push(entry.path().to_string_lossy().to_string());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_package() {
        let scopes = resolve_scopes(&["pkg/a/a.go", "pkg/a/b.go"]);
        assert_eq!(scopes.packages.iter().collect::<Vec<_>>(), vec!["pkg/a"]);
        assert_eq!(scopes.directories.iter().collect::<Vec<_>>(), vec!["pkg/a"]);
    }

    #[test]
    fn test_first_seen_order_and_dedup() {
        let scopes = resolve_scopes(&["./cmd/main.go", "README.md", "pkg/b/x.go", "cmd/util.go", "docs/intro.md"]);

        assert_eq!(scopes.packages.iter().collect::<Vec<_>>(), vec!["cmd", "pkg/b"]);
        assert_eq!(
            scopes.directories.iter().collect::<Vec<_>>(),
            vec!["cmd", ".", "pkg/b", "docs"]
        );
    }

    #[test]
    fn test_top_level_go_file() {
        let scopes = resolve_scopes(&["main.go"]);
        assert_eq!(scopes.packages.iter().collect::<Vec<_>>(), vec!["."]);
    }

    #[test]
    fn test_blank_entries_and_backslashes() {
        let scopes = resolve_scopes(&["", "  ", "pkg\\win\\a.go"]);
        assert_eq!(scopes.packages.iter().collect::<Vec<_>>(), vec!["pkg/win"]);
        assert_eq!(scopes.directories.len(), 1);
    }

    #[test]
    fn test_empty_list() {
        let scopes = resolve_scopes::<&str>(&[]);
        assert!(scopes.is_empty());
    }

    #[test]
    fn test_scope_as_arg() {
        assert_eq!(Scope::Package("pkg/a".to_string()).as_arg(), "./pkg/a");
        assert_eq!(Scope::Directory(".".to_string()).as_arg(), ".");
        assert_eq!(Scope::Directory("./cmd".to_string()).as_arg(), "./cmd");
        assert_eq!(Scope::Directory("/abs/dir".to_string()).as_arg(), "/abs/dir");
        assert_eq!(Scope::Package("pkg/a".to_string()).to_string(), "package pkg/a");
    }

    #[test]
    fn test_read_file_list() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("files.txt");
        fs::write(&list, "# staged files\npkg/a/a.go\n\n  cmd/main.go  \n").unwrap();

        let files = read_file_list(&list).unwrap();
        assert_eq!(files, vec!["pkg/a/a.go", "cmd/main.go"]);
    }

    #[test]
    fn test_read_missing_file_list() {
        let err = read_file_list(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, ScopeError::ReadList { .. }));
    }

    #[test]
    fn test_list_dir_respects_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg/a")).unwrap();
        fs::create_dir_all(dir.path().join("vendor/x")).unwrap();
        fs::write(dir.path().join(".gitignore"), "vendor/\n").unwrap();
        fs::write(dir.path().join("main.go"), "package main\n").unwrap();
        fs::write(dir.path().join("pkg/a/a.go"), "package a\n").unwrap();
        fs::write(dir.path().join("vendor/x/x.go"), "package x\n").unwrap();

        let files = list_dir(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.ends_with("main.go")));
        assert!(files.iter().any(|f| f.ends_with("a.go")));
        assert!(!files.iter().any(|f| f.contains("vendor")));
    }
}
