//! Array intrinsics. `cat` and `append` are top-level; the rest live in
//! the `array` namespace.

use sqd_core::builtins::Host;
use sqd_core::val::Val;

use crate::wrong_args;

/// Returns a new array with the element appended; the original is left
/// untouched.
pub fn append(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 2 {
        return wrong_args("2", args.len());
    }
    let Val::Array(elements) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `append` must be ARRAY, got {}",
            args[0].type_name()
        ));
    };
    let mut copy = elements.borrow().clone();
    copy.push(args[1].clone());
    Val::array(copy)
}

/// Removes the last element in place and returns the array. Popping an
/// empty array yields null.
pub fn pop(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    let Val::Array(elements) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `pop` must be ARRAY, got {}",
            args[0].type_name()
        ));
    };
    if elements.borrow().is_empty() {
        return Val::Null;
    }
    elements.borrow_mut().pop();
    args[0].clone()
}

/// Removes the element at an index in place and returns the array.
pub fn remove(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 2 {
        return wrong_args("2", args.len());
    }
    let Val::Array(elements) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `remove` must be ARRAY, got {}",
            args[0].type_name()
        ));
    };
    let Val::Int(index) = &args[1] else {
        return Val::error(format!(
            "Argument 1 to `remove` must be INTEGER, got {}",
            args[1].type_name()
        ));
    };
    let len = elements.borrow().len();
    if *index < 0 || *index as usize >= len {
        return Val::error(format!(
            "Index {} is out of range (array length is {})",
            index, len
        ));
    }
    elements.borrow_mut().remove(*index as usize);
    args[0].clone()
}

/// Element count of an array, byte length of a string.
pub fn cat(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    match &args[0] {
        Val::Array(elements) => Val::Int(elements.borrow().len() as i64),
        Val::Str(s) => Val::Int(s.len() as i64),
        other => Val::error(format!(
            "Argument 0 to `cat` is not supported, got {}",
            other.type_name()
        )),
    }
}

pub fn join(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 2 {
        return wrong_args("2", args.len());
    }
    let Val::Array(elements) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `join` must be ARRAY, got {}",
            args[0].type_name()
        ));
    };
    let Val::Str(sep) = &args[1] else {
        return Val::error(format!(
            "Argument 1 to `join` must be STRING, got {}",
            args[1].type_name()
        ));
    };
    let parts: Vec<String> = elements.borrow().iter().map(|e| e.inspect()).collect();
    Val::string(parts.join(sep.as_ref()))
}
