//! Runtime configuration intrinsics (`sys` class).

use sqd_core::builtins::Host;
use sqd_core::val::Val;

use crate::wrong_args;

/// Sets the operand-stack capacity used for subsequent runs.
pub fn set_overflow_size(args: &[Val], host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    let Val::Int(size) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `set_overflow_size` must be INTEGER, got {}",
            args[0].type_name()
        ));
    };
    if *size < 1024 {
        return Val::error("Overflow size must be at least 1024");
    }
    host.stack_capacity = *size as usize;
    Val::Int(host.stack_capacity as i64)
}

pub fn get_overflow_size(args: &[Val], host: &mut Host) -> Val {
    if !args.is_empty() {
        return wrong_args("0", args.len());
    }
    Val::Int(host.stack_capacity as i64)
}

/// Reclamation is the host allocator's job; kept as a no-op so scripts
/// calling it stay portable.
pub fn gc(args: &[Val], _host: &mut Host) -> Val {
    if !args.is_empty() {
        return wrong_args("0", args.len());
    }
    Val::Null
}
