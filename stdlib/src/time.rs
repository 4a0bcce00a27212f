//! Clock intrinsics (`time` class).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sqd_core::builtins::Host;
use sqd_core::val::Val;

use crate::wrong_args;

/// Blocks the VM thread. Integers are milliseconds, floats are seconds.
pub fn sleep(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    let duration = match &args[0] {
        Val::Int(ms) => Duration::from_millis((*ms).max(0) as u64),
        Val::Float(secs) => Duration::from_millis((secs * 1000.0).max(0.0) as u64),
        other => {
            return Val::error(format!(
                "Argument 0 to `sleep` must be INTEGER or FLOAT, got {}",
                other.type_name()
            ));
        }
    };
    std::thread::sleep(duration);
    Val::Null
}

/// Milliseconds since the Unix epoch.
pub fn now(args: &[Val], _host: &mut Host) -> Val {
    if !args.is_empty() {
        return wrong_args("0", args.len());
    }
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    Val::Int(millis)
}
