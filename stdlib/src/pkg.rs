//! Package management intrinsics (`pkg` class).
//!
//! Packages are directories under the package root (`~/.cache/sqdlang`
//! unless the host overrides it) holding an `__init__.sqd` entry point and
//! a `package.json` metadata file.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqd_core::builtins::Host;
use sqd_core::val::{HashData, IncludeDirective, Val};

use crate::wrong_args;

#[derive(Debug, Serialize, Deserialize)]
pub struct PkgMeta {
    pub name: String,
    pub version: String,
    pub description: String,
    pub main: String,
    pub files: Vec<String>,
}

pub struct Manager {
    root: PathBuf,
}

impl Manager {
    pub fn from_host(host: &Host) -> Self {
        Manager {
            root: host.package_root(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    pub fn create(&self, name: &str, description: &str) -> Result<PathBuf> {
        let package_path = self.root.join(name);
        if package_path.exists() {
            anyhow::bail!("package '{}' already exists", name);
        }
        std::fs::create_dir_all(&package_path).context("failed to create package directory")?;

        let init = format!(
            "# Package: {} #\n# Description: {} #\n# Version: 1.0.0 #\n",
            name, description
        );
        std::fs::write(package_path.join("__init__.sqd"), init).context("failed to create __init__.sqd")?;

        let meta = PkgMeta {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            description: description.to_string(),
            main: "__init__.sqd".to_string(),
            files: vec!["__init__.sqd".to_string()],
        };
        let json = serde_json::to_string_pretty(&meta).context("failed to serialize package metadata")?;
        std::fs::write(package_path.join("package.json"), json).context("failed to create package.json")?;

        let readme = format!("# {}\n\n{}\n\n## Usage\n\ninclude(\"{}\")\n", name, description, name);
        std::fs::write(package_path.join("README.md"), readme).context("failed to create README.md")?;

        Ok(package_path)
    }

    pub fn list(&self) -> Result<Vec<PkgMeta>> {
        let mut packages = Vec::new();
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(_) => return Ok(packages),
        };
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            packages.push(self.load(&name).unwrap_or(PkgMeta {
                name,
                version: String::new(),
                description: String::new(),
                main: "__init__.sqd".to_string(),
                files: Vec::new(),
            }));
        }
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(packages)
    }

    fn load(&self, name: &str) -> Result<PkgMeta> {
        let raw = std::fs::read_to_string(self.root.join(name).join("package.json"))?;
        let meta: PkgMeta = serde_json::from_str(&raw)?;
        Ok(meta)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let package_path = self.root.join(name);
        if !package_path.exists() {
            anyhow::bail!("package '{}' does not exist", name);
        }
        std::fs::remove_dir_all(&package_path).context("failed to remove package")?;
        Ok(())
    }
}

/// `pkg.include(path)` returns the file's contents; `pkg.include(path, ns)`
/// returns a directive the host expands into a namespace binding.
pub fn include(args: &[Val], _host: &mut Host) -> Val {
    if args.is_empty() || args.len() > 2 {
        return wrong_args("1 or 2", args.len());
    }
    let Val::Str(path) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `include` must be STRING, got {}",
            args[0].type_name()
        ));
    };

    if let Some(namespace) = args.get(1) {
        let Val::Str(namespace) = namespace else {
            return Val::error(format!(
                "Argument 1 to `include` must be STRING, got {}",
                namespace.type_name()
            ));
        };
        return Val::Include(Rc::new(IncludeDirective {
            filename: path.to_string(),
            namespace: namespace.to_string(),
        }));
    }

    if !std::path::Path::new(path.as_ref()).exists() {
        return Val::error(format!("File '{}' not found", path));
    }
    match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => Val::string(content),
        Err(e) => Val::error(format!("Could not read file '{}': {}", path, e)),
    }
}

pub fn create(args: &[Val], host: &mut Host) -> Val {
    if args.is_empty() || args.len() > 2 {
        return wrong_args("1 or 2", args.len());
    }
    let Val::Str(name) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `pkg_create` must be STRING, got {}",
            args[0].type_name()
        ));
    };
    let description = match args.get(1) {
        None => "",
        Some(Val::Str(desc)) => desc.as_ref(),
        Some(other) => {
            return Val::error(format!(
                "Argument 1 to `pkg_create` must be STRING, got {}",
                other.type_name()
            ));
        }
    };

    match Manager::from_host(host).create(name, description) {
        Ok(_) => Val::string(format!("Package '{}' created successfully", name)),
        Err(e) => Val::error(format!("Failed to create package: {}", e)),
    }
}

pub fn list(args: &[Val], host: &mut Host) -> Val {
    if !args.is_empty() {
        return wrong_args("0", args.len());
    }
    let packages = match Manager::from_host(host).list() {
        Ok(packages) => packages,
        Err(e) => return Val::error(format!("Failed to list packages: {}", e)),
    };

    let elements: Vec<Val> = packages
        .into_iter()
        .map(|meta| {
            let mut data = HashData::new();
            for (key, value) in [
                ("name", meta.name),
                ("version", meta.version),
                ("description", meta.description),
            ] {
                let key = Val::string(key);
                let digest = key.hash_key().expect("string keys always hash");
                data.insert(digest, (key, Val::string(value)));
            }
            Val::hash(data)
        })
        .collect();
    Val::array(elements)
}

pub fn remove(args: &[Val], host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    let Val::Str(name) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `pkg_remove` must be STRING, got {}",
            args[0].type_name()
        ));
    };
    match Manager::from_host(host).remove(name) {
        Ok(()) => Val::string(format!("Package '{}' removed successfully", name)),
        Err(e) => Val::error(format!("Failed to remove package: {}", e)),
    }
}
