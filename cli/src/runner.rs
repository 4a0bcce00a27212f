//! File execution: streams complete statements into a shared session.
//!
//! Statements are grouped by bracket balance, compiled and run one at a
//! time against the session's symbol table, constants and globals, so each
//! statement sees everything defined before it. Displayable results print
//! to the session's output writer; fatal errors abort the file.

use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use sqd_core::include::{split_statements, try_parse_include};
use sqd_core::session::Session;
use sqd_core::val::Val;

/// Executes one complete statement, printing its displayable result.
fn run_statement(session: &mut Session, statement: &str) -> Result<()> {
    if let Some(spec) = try_parse_include(statement) {
        if let Err(e) = session.include(&spec) {
            let _ = writeln!(session.host.out, "Include error: {}", e);
            return Err(e);
        }
        return Ok(());
    }

    match session.execute(statement) {
        Ok(Some(value)) if !matches!(value, Val::Null) => {
            let _ = writeln!(session.host.out, "{}", value.inspect());
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(e) => {
            let _ = writeln!(session.host.out, "{}", e);
            Err(e)
        }
    }
}

pub fn execute_file(path: &Path, session: &mut Session) -> Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Could not open file {}", path.display()))?;
    session.set_file_name(path.to_string_lossy().into_owned());

    for statement in split_statements(&content) {
        run_statement(session, &statement)?;
    }
    Ok(())
}
