//! Filesystem intrinsics (`file` class).

use sqd_core::builtins::Host;
use sqd_core::val::Val;

use crate::wrong_args;

pub fn read(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    let Val::Str(path) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `read` must be STRING, got {}",
            args[0].type_name()
        ));
    };
    match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => Val::string(content),
        Err(e) => Val::error(format!("Failed to read file: {}", e)),
    }
}

/// Writes string data to a path, creating the file as needed; an optional
/// third argument sets Unix permission bits.
pub fn write(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 2 && args.len() != 3 {
        return wrong_args("2 or 3", args.len());
    }
    let (Val::Str(path), Val::Str(data)) = (&args[0], &args[1]) else {
        return Val::error(format!(
            "Arguments 0 and 1 to `write` must be STRING and STRING, got {} and {}",
            args[0].type_name(),
            args[1].type_name()
        ));
    };

    let mode = match args.get(2) {
        None => None,
        Some(Val::Int(mode)) => Some(*mode as u32),
        Some(other) => {
            return Val::error(format!(
                "Argument 2 to `write` must be INTEGER, got {}",
                other.type_name()
            ));
        }
    };

    if let Err(e) = std::fs::write(path.as_ref(), data.as_bytes()) {
        return Val::error(format!("Error writing file: {}", e));
    }

    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(path.as_ref(), std::fs::Permissions::from_mode(mode)) {
            return Val::error(format!("Error writing file: {}", e));
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    Val::Null
}
