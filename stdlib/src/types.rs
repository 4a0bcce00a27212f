//! Type inspection and conversions (`type` class).

use sqd_core::builtins::Host;
use sqd_core::val::Val;

use crate::wrong_args;

/// User-facing type name of a value.
pub fn tp(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    let name = match &args[0] {
        Val::Array(_) => "Array",
        Val::Str(_) => "String",
        Val::Hash(_) => "Object",
        Val::Int(_) => "Integer",
        Val::Float(_) => "Float",
        Val::Bool(_) => "Boolean",
        Val::Builtin(_) => "Builtin",
        Val::Function(_) | Val::Closure(_) => "Function",
        Val::Error(_) => "Error",
        _ => "Null",
    };
    Val::string(name)
}

pub fn i2fl(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match &args[0] {
        Val::Float(_) => args[0].clone(),
        Val::Int(v) => Val::Float(*v as f64),
        other => Val::error(format!(
            "Argument 0 to `i2fl` must be INTEGER, got {}",
            other.type_name()
        )),
    }
}

pub fn fl2i(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match &args[0] {
        Val::Int(_) => args[0].clone(),
        Val::Float(v) => Val::Int(*v as i64),
        other => Val::error(format!(
            "Argument 0 to `fl2i` must be FLOAT, got {}",
            other.type_name()
        )),
    }
}

pub fn s2i(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match &args[0] {
        Val::Int(_) => args[0].clone(),
        Val::Str(s) => match s.trim().parse::<i64>() {
            Ok(v) => Val::Int(v),
            Err(e) => Val::error(format!("Failed to convert string to integer: {}", e)),
        },
        other => Val::error(format!(
            "Argument 0 to `s2i` must be STRING, got {}",
            other.type_name()
        )),
    }
}

pub fn s2fl(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match &args[0] {
        Val::Float(_) => args[0].clone(),
        Val::Str(s) => match s.trim().parse::<f64>() {
            Ok(v) => Val::Float(v),
            Err(e) => Val::error(format!("Failed to convert string to float: {}", e)),
        },
        other => Val::error(format!(
            "Argument 0 to `s2fl` must be STRING, got {}",
            other.type_name()
        )),
    }
}

/// Digits to string; strings pass through.
pub fn d2s(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match &args[0] {
        Val::Int(v) => Val::string(v.to_string()),
        Val::Float(v) => Val::string(v.to_string()),
        Val::Str(_) => args[0].clone(),
        other => Val::error(format!(
            "Argument to `d2s` must be FLOAT or INTEGER, got {}",
            other.type_name()
        )),
    }
}
