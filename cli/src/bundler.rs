//! Standalone executable builder (`-B`).
//!
//! The source (with `include(...)` lines expanded inline) is compiled by a
//! fresh compiler, serialized into the bytecode container, and appended to
//! a copy of the running interpreter binary with a trailing footer. At
//! startup the binary checks its own tail and runs the embedded program
//! instead of entering the CLI.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail};
use sqd_core::ast::Parser;
use sqd_core::vm::{Compiler, Package};

/// Footer layout: payload length (u64 little-endian) followed by the magic.
pub const TRAILER_MAGIC: &[u8; 8] = b"SQDBEXE\0";

/// Extracts an embedded bytecode payload from an executable image, if any.
pub fn extract_payload(image: &[u8]) -> Option<Vec<u8>> {
    if image.len() < 16 || &image[image.len() - 8..] != TRAILER_MAGIC {
        return None;
    }
    let len_start = image.len() - 16;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&image[len_start..len_start + 8]);
    let payload_len = u64::from_le_bytes(raw) as usize;
    if payload_len > len_start {
        return None;
    }
    Some(image[len_start - payload_len..len_start].to_vec())
}

pub fn build_standalone(input: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
    let output = output.unwrap_or_else(|| {
        let name = input.to_string_lossy();
        PathBuf::from(name.strip_suffix(".sqd").unwrap_or(&name).to_string())
    });

    let source = std::fs::read_to_string(input).with_context(|| format!("could not read input file {}", input.display()))?;
    let base_dir = input.parent().unwrap_or_else(|| Path::new("."));
    let expanded = expand_includes(&source, base_dir)?;

    let mut parser = Parser::from_source(&expanded);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        bail!("parse error: {}", parser.errors().join("; "));
    }

    let registry = Rc::new(sqd_stdlib::registry());
    let mut compiler = Compiler::new(registry);
    compiler.compile(&program).context("compilation error")?;

    let package = Package::from_bytecode(compiler.bytecode());
    let payload = package.encode().context("could not serialize bytecode")?;

    let exe = std::env::current_exe().context("could not locate interpreter binary")?;
    let mut image = std::fs::read(&exe).context("could not read interpreter binary")?;
    // Never stack payloads when bundling from an already-bundled binary.
    if extract_payload(&image).is_some() {
        bail!("refusing to bundle from a bundled interpreter");
    }

    image.extend_from_slice(&payload);
    image.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    image.extend_from_slice(TRAILER_MAGIC);

    std::fs::write(&output, image).with_context(|| format!("could not write {}", output.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&output, std::fs::Permissions::from_mode(0o755))
            .context("could not mark output executable")?;
    }

    Ok(output)
}

/// Inlines `include("...")` lines recursively before compilation so the
/// serialized program is self-contained.
pub fn expand_includes(source: &str, base_dir: &Path) -> Result<String> {
    let mut out = Vec::new();
    for line in source.lines() {
        let Some(spec) = sqd_core::include::try_parse_include(line) else {
            out.push(line.to_string());
            continue;
        };

        let mut candidates = vec![PathBuf::from(&spec), base_dir.join(&spec)];
        if !spec.ends_with(".sqd") {
            candidates.push(base_dir.join("lib").join(format!("{}.sqd", spec)));
            candidates.push(Path::new("lib").join(format!("{}.sqd", spec)));
        }
        let found = candidates
            .into_iter()
            .find(|c| c.is_file())
            .ok_or_else(|| anyhow!("Module or file not found: {}", spec))?;

        let included = std::fs::read_to_string(&found).with_context(|| format!("could not read {}", found.display()))?;
        let nested_base = found.parent().unwrap_or_else(|| Path::new("."));
        out.push(expand_includes(&included, nested_base)?);
    }
    Ok(out.join("\n"))
}
