//! Binary container for compiled programs.
//!
//! Little-endian layout: `version:i32`, `instructions_len:i32`, instruction
//! bytes, `constants_len:i32`, then each constant as a `kind:i8` tag and a
//! kind-specific payload. Compiled functions serialize their own bytecode,
//! so nested functions and closures round-trip transitively. This is the
//! ABI between the compiling host and a standalone runner; readers reject a
//! version mismatch.

use std::rc::Rc;

use anyhow::{Context, Result, bail, ensure};

use crate::val::{CompiledFunction, HashData, Val};
use crate::vm::code::Instructions;
use crate::vm::compiler::Bytecode;

pub const VERSION: i32 = 1;

const CONST_NULL: i8 = 0;
const CONST_INT: i8 = 1;
const CONST_FLOAT: i8 = 2;
const CONST_STRING: i8 = 3;
const CONST_BOOL: i8 = 4;
const CONST_ARRAY: i8 = 5;
const CONST_HASH: i8 = 6;
const CONST_COMPILED_FN: i8 = 7;

/// A serializable compiled program.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub version: i32,
    pub instructions: Instructions,
    pub constants: Vec<Val>,
}

impl Package {
    pub fn from_bytecode(bytecode: Bytecode) -> Self {
        Package {
            version: VERSION,
            instructions: bytecode.instructions,
            constants: bytecode.constants,
        }
    }

    pub fn into_bytecode(self) -> Bytecode {
        Bytecode {
            instructions: self.instructions,
            constants: self.constants,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        write_i32(&mut out, self.version);
        write_i32(&mut out, self.instructions.len() as i32);
        out.extend_from_slice(&self.instructions);
        write_i32(&mut out, self.constants.len() as i32);
        for (i, constant) in self.constants.iter().enumerate() {
            encode_constant(&mut out, constant).with_context(|| format!("failed to serialize constant {}", i))?;
        }
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Package> {
        let mut cursor = 0usize;

        let version = read_i32(bytes, &mut cursor).context("failed to read version")?;
        ensure!(
            version == VERSION,
            "unsupported bytecode version: {} (expected {})",
            version,
            VERSION
        );

        let ins_len = read_i32(bytes, &mut cursor).context("failed to read instructions length")? as usize;
        ensure!(cursor + ins_len <= bytes.len(), "instructions overrun payload");
        let instructions = bytes[cursor..cursor + ins_len].to_vec();
        cursor += ins_len;

        let const_len = read_i32(bytes, &mut cursor).context("failed to read constants length")? as usize;
        let mut constants = Vec::with_capacity(const_len);
        for i in 0..const_len {
            let constant =
                decode_constant(bytes, &mut cursor).with_context(|| format!("failed to deserialize constant {}", i))?;
            constants.push(constant);
        }
        ensure!(cursor == bytes.len(), "extra data at end of package");

        Ok(Package {
            version,
            instructions,
            constants,
        })
    }
}

fn encode_constant(out: &mut Vec<u8>, value: &Val) -> Result<()> {
    match value {
        Val::Null => out.push(CONST_NULL as u8),
        Val::Int(v) => {
            out.push(CONST_INT as u8);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Val::Float(v) => {
            out.push(CONST_FLOAT as u8);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Val::Str(s) => {
            out.push(CONST_STRING as u8);
            write_i32(out, s.len() as i32);
            out.extend_from_slice(s.as_bytes());
        }
        Val::Bool(v) => {
            out.push(CONST_BOOL as u8);
            out.push(*v as u8);
        }
        Val::Array(elements) => {
            out.push(CONST_ARRAY as u8);
            let elements = elements.borrow();
            write_i32(out, elements.len() as i32);
            for element in elements.iter() {
                encode_constant(out, element)?;
            }
        }
        Val::Hash(data) => {
            out.push(CONST_HASH as u8);
            let data = data.borrow();
            write_i32(out, data.len() as i32);
            for (key, value) in data.values() {
                encode_constant(out, key)?;
                encode_constant(out, value)?;
            }
        }
        Val::Function(func) => {
            out.push(CONST_COMPILED_FN as u8);
            write_i32(out, func.instructions.len() as i32);
            out.extend_from_slice(&func.instructions);
            write_i32(out, func.num_locals as i32);
            write_i32(out, func.num_parameters as i32);
        }
        other => bail!("cannot serialize object type: {}", other.type_name()),
    }
    Ok(())
}

fn decode_constant(bytes: &[u8], cursor: &mut usize) -> Result<Val> {
    let tag = read_i8(bytes, cursor)?;
    match tag {
        CONST_NULL => Ok(Val::Null),
        CONST_INT => {
            let raw = read_exact::<8>(bytes, cursor)?;
            Ok(Val::Int(i64::from_le_bytes(raw)))
        }
        CONST_FLOAT => {
            let raw = read_exact::<8>(bytes, cursor)?;
            Ok(Val::Float(f64::from_le_bytes(raw)))
        }
        CONST_STRING => {
            let len = read_i32(bytes, cursor)? as usize;
            ensure!(*cursor + len <= bytes.len(), "string overruns payload");
            let text = std::str::from_utf8(&bytes[*cursor..*cursor + len]).context("string constant is not UTF-8")?;
            let value = Val::string(text);
            *cursor += len;
            Ok(value)
        }
        CONST_BOOL => {
            let raw = read_i8(bytes, cursor)?;
            Ok(Val::Bool(raw != 0))
        }
        CONST_ARRAY => {
            let count = read_i32(bytes, cursor)? as usize;
            let mut elements = Vec::with_capacity(count);
            for _ in 0..count {
                elements.push(decode_constant(bytes, cursor)?);
            }
            Ok(Val::array(elements))
        }
        CONST_HASH => {
            let count = read_i32(bytes, cursor)? as usize;
            let mut data = HashData::new();
            for _ in 0..count {
                let key = decode_constant(bytes, cursor)?;
                let value = decode_constant(bytes, cursor)?;
                let Some(digest) = key.hash_key() else {
                    bail!("unhashable key type: {}", key.type_name());
                };
                data.insert(digest, (key, value));
            }
            Ok(Val::hash(data))
        }
        CONST_COMPILED_FN => {
            let ins_len = read_i32(bytes, cursor)? as usize;
            ensure!(*cursor + ins_len <= bytes.len(), "function body overruns payload");
            let instructions = bytes[*cursor..*cursor + ins_len].to_vec();
            *cursor += ins_len;
            let num_locals = read_i32(bytes, cursor)? as usize;
            let num_parameters = read_i32(bytes, cursor)? as usize;
            Ok(Val::Function(Rc::new(CompiledFunction {
                instructions,
                num_locals,
                num_parameters,
            })))
        }
        other => bail!("unknown constant type marker: {}", other),
    }
}

fn write_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn read_i32(bytes: &[u8], cursor: &mut usize) -> Result<i32> {
    let raw = read_exact::<4>(bytes, cursor)?;
    Ok(i32::from_le_bytes(raw))
}

fn read_i8(bytes: &[u8], cursor: &mut usize) -> Result<i8> {
    let raw = read_exact::<1>(bytes, cursor)?;
    Ok(raw[0] as i8)
}

fn read_exact<const N: usize>(bytes: &[u8], cursor: &mut usize) -> Result<[u8; N]> {
    ensure!(*cursor + N <= bytes.len(), "unexpected end of package");
    let mut raw = [0u8; N];
    raw.copy_from_slice(&bytes[*cursor..*cursor + N]);
    *cursor += N;
    Ok(raw)
}
