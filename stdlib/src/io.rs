//! Console intrinsics (`io` class).

use std::io::{BufRead, Write as _};

use sqd_core::builtins::Host;
use sqd_core::val::Val;

use crate::wrong_args;

/// Reads one line from stdin, trimmed; numeric input converts to Integer
/// or Float. An optional argument is printed first as a prompt.
pub fn read(args: &[Val], host: &mut Host) -> Val {
    if args.len() > 1 {
        return wrong_args("0 or 1", args.len());
    }
    if let Some(prompt) = args.first() {
        let Val::Str(prompt) = prompt else {
            return Val::error(format!(
                "Argument 0 to `read` must be STRING, got {}",
                prompt.type_name()
            ));
        };
        let _ = write!(host.out, "{}", prompt);
        let _ = host.out.flush();
    }

    let mut input = String::new();
    if let Err(e) = std::io::stdin().lock().read_line(&mut input) {
        return Val::error(format!("Failed to read input: {}", e));
    }
    let input = input.trim();

    if let Ok(v) = input.parse::<i64>() {
        return Val::Int(v);
    }
    if let Ok(v) = input.parse::<f64>() {
        return Val::Float(v);
    }
    Val::string(input)
}

/// Formats the arguments space-separated and returns the string without
/// printing it.
pub fn write(args: &[Val], _host: &mut Host) -> Val {
    let parts: Vec<String> = args.iter().map(|a| a.inspect()).collect();
    Val::string(parts.join(" "))
}

/// Prints the arguments space-separated, no trailing newline.
pub fn echo(args: &[Val], host: &mut Host) -> Val {
    let parts: Vec<String> = args.iter().map(|a| a.inspect()).collect();
    let _ = write!(host.out, "{}", parts.join(" "));
    let _ = host.out.flush();
    Val::Null
}
