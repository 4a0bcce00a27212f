//! Process and environment intrinsics (`os` class).

use std::process::Command;

use sqd_core::builtins::Host;
use sqd_core::val::{HashData, Val};

use crate::wrong_args;

/// With no arguments, the whole environment as a hash; with a name, that
/// variable's value.
pub fn env(args: &[Val], _host: &mut Host) -> Val {
    match args.len() {
        0 => {
            let mut data = HashData::new();
            for (name, value) in std::env::vars() {
                let key = Val::string(name);
                let digest = key.hash_key().expect("string keys always hash");
                data.insert(digest, (key, Val::string(value)));
            }
            Val::hash(data)
        }
        1 => {
            let Val::Str(name) = &args[0] else {
                return Val::error(format!(
                    "Argument 0 to `env` must be STRING, got {}",
                    args[0].type_name()
                ));
            };
            match std::env::var(name.as_ref()) {
                Ok(value) if !value.is_empty() => Val::string(value),
                _ => Val::error(format!("Environment variable '{}' not found", name)),
            }
        }
        n => wrong_args("0 or 1", n),
    }
}

/// Runs a whitespace-split command and returns its stdout.
pub fn exec(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    let Val::Str(command) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `exec` must be STRING, got {}",
            args[0].type_name()
        ));
    };

    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return Val::error("Failed to execute command: empty command");
    };
    match Command::new(program).args(parts).output() {
        Ok(output) if output.status.success() => Val::string(String::from_utf8_lossy(&output.stdout).into_owned()),
        Ok(output) => Val::error(format!("Failed to execute command: exit status {}", output.status)),
        Err(e) => Val::error(format!("Failed to execute command: {}", e)),
    }
}

pub fn exit(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    let Val::Int(status) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `exit` must be INTEGER, got {}",
            args[0].type_name()
        ));
    };
    std::process::exit(*status as i32);
}
