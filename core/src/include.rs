//! Resolution and loading for the textual `include("...")` form.
//!
//! Names resolve against a search-path list; a name without the `.sqd`
//! suffix tries `<path>/<name>.sqd` and `<path>/<name>/__init__.sqd` in
//! each search directory. Already-loaded files are skipped so circular
//! includes terminate.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// True while brackets are unbalanced and more lines belong to the
/// current statement.
pub fn needs_continuation(input: &str) -> bool {
    let mut braces = 0i32;
    let mut parens = 0i32;
    let mut brackets = 0i32;
    for ch in input.chars() {
        match ch {
            '{' => braces += 1,
            '}' => braces -= 1,
            '(' => parens += 1,
            ')' => parens -= 1,
            '[' => brackets += 1,
            ']' => brackets -= 1,
            _ => {}
        }
    }
    braces > 0 || parens > 0 || brackets > 0
}

/// Recognizes the textual `include("path")` statement form.
pub fn try_parse_include(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let inside = trimmed.strip_prefix("include(")?.strip_suffix(")")?.trim();
    let unquoted = if inside.len() >= 2
        && ((inside.starts_with('"') && inside.ends_with('"')) || (inside.starts_with('\'') && inside.ends_with('\'')))
    {
        &inside[1..inside.len() - 1]
    } else {
        inside
    };
    Some(unquoted.to_string())
}

/// Groups source lines into complete statements by bracket balance,
/// skipping blank lines.
pub fn split_statements(content: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
        if !needs_continuation(&current) {
            statements.push(std::mem::take(&mut current));
        }
    }
    if !current.trim().is_empty() {
        statements.push(current);
    }
    statements
}

#[derive(Debug)]
pub struct Loader {
    loaded: HashSet<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Loader {
    /// Search order: the working directory, `./lib`, `./packages`, then
    /// the package root.
    pub fn new(package_root: PathBuf) -> Self {
        Loader {
            loaded: HashSet::new(),
            search_paths: vec![
                PathBuf::from("."),
                PathBuf::from("./lib"),
                PathBuf::from("./packages"),
                package_root,
            ],
        }
    }

    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }

    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        // Absolute paths and explicit .sqd files are taken as-is.
        if Path::new(name).is_absolute() || name.ends_with(".sqd") {
            let path = PathBuf::from(name);
            if path.is_file() {
                return Ok(path);
            }
            bail!("file '{}' not found", name);
        }

        for search_path in &self.search_paths {
            let with_ext = search_path.join(format!("{}.sqd", name));
            if with_ext.is_file() {
                return Ok(with_ext);
            }
            let as_package = search_path.join(name).join("__init__.sqd");
            if as_package.is_file() {
                return Ok(as_package);
            }
        }

        bail!("file or package '{}' not found in search paths", name);
    }

    /// Resolves a name and marks it loaded. Returns `None` when the file
    /// was already loaded (circular or repeated include).
    pub fn begin_load(&mut self, name: &str) -> Result<Option<PathBuf>> {
        let resolved = self.resolve(name)?;
        let canonical = resolved.canonicalize().unwrap_or_else(|_| resolved.clone());
        if !self.loaded.insert(canonical) {
            return Ok(None);
        }
        Ok(Some(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_explicit_sqd_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mod.sqd");
        std::fs::write(&file, "var a = 1").unwrap();

        let loader = Loader::new(dir.path().to_path_buf());
        let resolved = loader.resolve(file.to_str().unwrap()).unwrap();
        assert_eq!(resolved, file);

        assert!(loader.resolve("/no/such/file.sqd").is_err());
    }

    #[test]
    fn test_resolves_bare_name_through_search_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("helpers.sqd"), "var a = 1").unwrap();
        std::fs::create_dir_all(dir.path().join("toolkit")).unwrap();
        std::fs::write(dir.path().join("toolkit/__init__.sqd"), "var b = 2").unwrap();

        let loader = Loader::new(dir.path().to_path_buf());
        assert!(loader.resolve("helpers").unwrap().ends_with("helpers.sqd"));
        assert!(loader.resolve("toolkit").unwrap().ends_with("toolkit/__init__.sqd"));
        assert!(loader.resolve("missing").is_err());
    }

    #[test]
    fn test_begin_load_skips_repeats() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("once.sqd"), "var a = 1").unwrap();

        let mut loader = Loader::new(dir.path().to_path_buf());
        assert!(loader.begin_load("once").unwrap().is_some());
        assert!(loader.begin_load("once").unwrap().is_none());
    }
}
