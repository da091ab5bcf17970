//! Instruction tables
//!
//! Maps operators, conversions and element types to WebAssembly text
//! instruction names. Every function here is a pure lookup; callers decide
//! what a missing entry means.

use crate::parser::ast::{DataType, OpSymbol};

/// Base instruction name of a binary operator, before the type prefix and
/// signedness suffix
pub fn operator_name(op: OpSymbol) -> Option<&'static str> {
    let name = match op {
        OpSymbol::Add => "add",
        OpSymbol::Sub => "sub",
        OpSymbol::Mul => "mul",
        OpSymbol::Div => "div",
        OpSymbol::Rem => "rem",
        OpSymbol::Eq => "eq",
        OpSymbol::Ne => "ne",
        OpSymbol::Lt => "lt",
        OpSymbol::Le => "le",
        OpSymbol::Gt => "gt",
        OpSymbol::Ge => "ge",
        OpSymbol::And => "and",
        OpSymbol::Or => "or",
        OpSymbol::Shl => "shl",
        OpSymbol::Shr => "shr",
        OpSymbol::Pow | OpSymbol::Caret | OpSymbol::Neg | OpSymbol::Not => return None,
    };
    Some(name)
}

/// Operators that only exist for integer operands
pub fn is_integer_only(op: OpSymbol) -> bool {
    matches!(
        op,
        OpSymbol::Rem | OpSymbol::And | OpSymbol::Or | OpSymbol::Shl | OpSymbol::Shr
    )
}

/// Operators with distinct signed and unsigned integer instructions
pub fn has_signed_variant(op: OpSymbol) -> bool {
    matches!(
        op,
        OpSymbol::Lt
            | OpSymbol::Le
            | OpSymbol::Gt
            | OpSymbol::Ge
            | OpSymbol::Div
            | OpSymbol::Rem
            | OpSymbol::Shr
    )
}

/// Full instruction for `op` on operands of `data_type`, e.g. `i32.lt_s`
pub fn binary_instruction(op: OpSymbol, data_type: DataType) -> Option<String> {
    let name = operator_name(op)?;
    if !data_type.is_value() || (is_integer_only(op) && !data_type.is_integer()) {
        return None;
    }

    let suffix = if data_type.is_integer() && has_signed_variant(op) {
        "_s"
    } else {
        ""
    };
    Some(format!("{}.{}{}", data_type, name, suffix))
}

/// Result of converting between two value types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Same type, nothing is emitted
    Identity,
    Instruction(&'static str),
}

/// Conversion instruction from `from` to `to`
pub fn conversion(from: DataType, to: DataType) -> Option<Conversion> {
    use DataType::*;

    let instruction = match (to, from) {
        (I32, I32) | (I64, I64) | (F32, F32) | (F64, F64) => return Some(Conversion::Identity),
        (I32, I64) => "i32.wrap_i64",
        (I32, F32) => "i32.trunc_f32_s",
        (I32, F64) => "i32.trunc_f64_s",
        (I64, I32) => "i64.extend_i32_s",
        (I64, F32) => "i64.trunc_f32_s",
        (I64, F64) => "i64.trunc_f64_s",
        (F32, I32) => "f32.convert_i32_s",
        (F32, I64) => "f32.convert_i64_s",
        (F32, F64) => "f32.demote_f64",
        (F64, I32) => "f64.convert_i32_s",
        (F64, I64) => "f64.convert_i64_s",
        (F64, F32) => "f64.promote_f32",
        _ => return None,
    };
    Some(Conversion::Instruction(instruction))
}

/// Size in bytes of one array element
pub fn element_size(data_type: DataType) -> Option<u32> {
    match data_type {
        DataType::I32 | DataType::F32 => Some(4),
        DataType::I64 | DataType::F64 => Some(8),
        _ => None,
    }
}
