//! String intrinsics (`string` class).

use sqd_core::builtins::Host;
use sqd_core::val::Val;

use crate::wrong_args;

fn expect_str<'a>(args: &'a [Val], name: &str) -> Result<&'a str, Val> {
    match &args[0] {
        Val::Str(s) => Ok(s.as_ref()),
        other => Err(Val::error(format!(
            "Argument 0 to `{}` must be STRING, got {}",
            name,
            other.type_name()
        ))),
    }
}

pub fn upper(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match expect_str(args, "upper") {
        Ok(s) => Val::string(s.to_uppercase()),
        Err(e) => e,
    }
}

pub fn lower(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match expect_str(args, "lower") {
        Ok(s) => Val::string(s.to_lowercase()),
        Err(e) => e,
    }
}

pub fn trim(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match expect_str(args, "trim") {
        Ok(s) => Val::string(s.trim()),
        Err(e) => e,
    }
}

/// Splits on a separator; an empty or missing separator splits into
/// individual characters.
pub fn sepr(args: &[Val], _host: &mut Host) -> Val {
    if args.is_empty() || args.len() > 2 {
        return wrong_args("1 or 2", args.len());
    }
    let s = match expect_str(args, "sepr") {
        Ok(s) => s,
        Err(e) => return e,
    };
    let sep = match args.get(1) {
        None => "",
        Some(Val::Str(sep)) => sep.as_ref(),
        Some(other) => {
            return Val::error(format!(
                "Argument 1 to `sepr` must be STRING, got {}",
                other.type_name()
            ));
        }
    };

    let parts: Vec<Val> = if sep.is_empty() {
        s.chars().map(|c| Val::string(c.to_string())).collect()
    } else {
        s.split(sep).map(Val::string).collect()
    };
    Val::array(parts)
}
