//! Numeric intrinsics (`math` class).

use rand::Rng;
use sqd_core::builtins::Host;
use sqd_core::val::Val;

use crate::wrong_args;

fn numeric(arg: &Val, name: &str, position: usize) -> Result<f64, Val> {
    match arg {
        Val::Int(v) => Ok(*v as f64),
        Val::Float(v) => Ok(*v),
        other => Err(Val::error(format!(
            "Argument {} to `{}` must be INTEGER or FLOAT, got {}",
            position,
            name,
            other.type_name()
        ))),
    }
}

/// Uniform integer in `[min, max]`.
pub fn rand(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 2 {
        return wrong_args("2", args.len());
    }
    let (Val::Int(min), Val::Int(max)) = (&args[0], &args[1]) else {
        return Val::error(format!(
            "Arguments to `rand` must be INTEGER and INTEGER, got {} and {}",
            args[0].type_name(),
            args[1].type_name()
        ));
    };
    if min > max {
        return Val::error(format!("rand range is empty: {} > {}", min, max));
    }
    Val::Int(rand::thread_rng().gen_range(*min..=*max))
}

pub fn abs(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match &args[0] {
        Val::Int(v) => Val::Int(v.wrapping_abs()),
        Val::Float(v) => Val::Float(v.abs()),
        other => Val::error(format!(
            "Argument 0 to `abs` must be INTEGER or FLOAT, got {}",
            other.type_name()
        )),
    }
}

pub fn sqrt(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    let value = match numeric(&args[0], "sqrt", 0) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if value < 0.0 {
        return Val::error("Square root of negative number is not defined.");
    }
    Val::Float(value.sqrt())
}

pub fn pow(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 2 {
        return wrong_args("2", args.len());
    }
    let base = match numeric(&args[0], "pow", 0) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let exponent = match numeric(&args[1], "pow", 1) {
        Ok(v) => v,
        Err(e) => return e,
    };
    Val::Float(base.powf(exponent))
}

pub fn sin(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match numeric(&args[0], "sin", 0) {
        Ok(v) => Val::Float(v.sin()),
        Err(e) => e,
    }
}

pub fn cos(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match numeric(&args[0], "cos", 0) {
        Ok(v) => Val::Float(v.cos()),
        Err(e) => e,
    }
}

pub fn pi(args: &[Val], _host: &mut Host) -> Val {
    if !args.is_empty() {
        return wrong_args("0", args.len());
    }
    Val::Float(std::f64::consts::PI)
}

pub fn e(args: &[Val], _host: &mut Host) -> Val {
    if !args.is_empty() {
        return wrong_args("0", args.len());
    }
    Val::Float(std::f64::consts::E)
}
