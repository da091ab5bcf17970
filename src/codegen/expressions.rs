//! Expression lowering
//!
//! Expressions are emitted post-order as a flat, space-separated instruction
//! list: operands first, then the instruction that consumes them. Call
//! arguments after the first go on their own lines.
//!
//! Operator instructions are typed by their operands, which must agree with
//! each other. Arithmetic results must also match the type the surrounding
//! context expects, and comparisons and logical operators only appear where an
//! `i32` is expected.

use super::instructions::{binary_instruction, conversion, element_size, Conversion};
use super::{pad, Generator};
use crate::error::{CompileError, CompileResult};
use crate::parser::ast::*;

impl Generator<'_> {
    /// Instruction text computing the value of `id`
    pub(crate) fn expression(&self, id: NodeId, depth: usize) -> CompileResult<String> {
        let node = self.ast.node(id);

        match node.kind {
            NodeKind::Number => match &node.value {
                NodeValue::Number(n) => Ok(format!("({}.const {})", node.data_type, n)),
                _ => Err(self.malformed(id)),
            },
            NodeKind::LocalGet => Ok(format!("(local.get ${})", node.name())),
            NodeKind::GlobalGet => Ok(format!("(global.get ${})", node.name())),
            NodeKind::ArrayGet => Ok(format!(
                "{} ({}.load)",
                self.array_address(id, depth)?,
                node.data_type
            )),
            NodeKind::FunctionCall => self.function_call(id, depth),
            NodeKind::Cast => self.cast(id, depth),
            NodeKind::Operator => self.operator(id, depth),
            kind => Err(CompileError::structure(
                format!("Unexpected {} in expression", kind),
                node.location,
            )),
        }
    }

    /// Byte address of an array element: `index << log2(size) + base`
    pub(crate) fn array_address(&self, id: NodeId, depth: usize) -> CompileResult<String> {
        let node = self.ast.node(id);
        let index_node = self.child(id, 0)?;
        let index = self.child(index_node, 0)?;
        self.check_value_type(index, DataType::I32)?;

        let size = element_size(node.data_type).ok_or_else(|| self.malformed(id))?;
        let base = self.array_offset(node.name(), node.location)?;

        Ok(format!(
            "{} (i32.const {}) (i32.shl) (i32.const {}) (i32.add)",
            self.expression(index, depth)?,
            size.trailing_zeros(),
            base
        ))
    }

    /// Arguments, one per line after the first, then `(call $name)`
    pub(crate) fn function_call(&self, id: NodeId, depth: usize) -> CompileResult<String> {
        let node = self.ast.node(id);
        let params = self.parameter_types(id)?;
        let args = self.ast.children(id);

        if args.len() != params.len() {
            return Err(CompileError::syntax(
                format!(
                    "Function '{}' expects {} argument(s), found {}",
                    node.name(),
                    params.len(),
                    args.len()
                ),
                node.location,
            ));
        }

        let mut text = String::new();
        for (i, (&arg, &param)) in args.iter().zip(&params).enumerate() {
            self.check_value_type(arg, param)?;
            if i > 0 {
                text.push('\n');
                text.push_str(&pad(depth));
            }
            text.push_str(&self.expression(arg, depth)?);
        }

        let call = format!("(call ${})", node.name());
        if text.is_empty() {
            return Ok(call);
        }
        Ok(format!("{}\n{}{}", text, pad(depth), call))
    }

    fn parameter_types(&self, call: NodeId) -> CompileResult<Vec<DataType>> {
        let node = self.ast.node(call);
        let callee = self
            .ast
            .lookup(call, node.name())
            .filter(|&f| matches!(self.ast.kind(f), NodeKind::Function | NodeKind::ImportFunc))
            .ok_or_else(|| {
                CompileError::binding(
                    format!("Cannot find a function: {}", node.name()),
                    node.location,
                )
            })?;

        let params = self.child(callee, 0)?;
        Ok(self
            .ast
            .children(params)
            .iter()
            .map(|&p| self.ast.node(p).data_type)
            .collect())
    }

    fn cast(&self, id: NodeId, depth: usize) -> CompileResult<String> {
        let node = self.ast.node(id);
        let operand = self.child(id, 0)?;
        let from = self.ast.node(operand).data_type;
        let value = self.expression(operand, depth)?;

        match conversion(from, node.data_type) {
            Some(Conversion::Identity) => Ok(value),
            Some(Conversion::Instruction(name)) => Ok(format!("{} ({})", value, name)),
            None => Err(CompileError::type_error(
                format!("Cannot convert {} to {}", from, node.data_type),
                node.location,
            )),
        }
    }

    fn operator(&self, id: NodeId, depth: usize) -> CompileResult<String> {
        let node = self.ast.node(id);
        let NodeValue::Operator(op) = node.value else {
            return Err(self.malformed(id));
        };
        if op.is_prefix() {
            return self.unary(id, op, depth);
        }

        let (left, right) = match self.ast.children(id) {
            &[left, right] => (left, right),
            _ => return Err(self.malformed(id)),
        };
        let operand_type = self.ast.node(left).data_type;
        let right_type = self.ast.node(right).data_type;
        let context = node.data_type;

        if operand_type != right_type {
            return Err(CompileError::type_error(
                format!(
                    "Operands have different data types: {} and {} in '{}'",
                    operand_type,
                    right_type,
                    op.text()
                ),
                node.location,
            ));
        }

        if op.is_predicate() {
            self.require_i32_context(id, op)?;
            if matches!(op, OpSymbol::And | OpSymbol::Or) && operand_type != DataType::I32 {
                return Err(CompileError::type_error(
                    format!(
                        "Operator '{}' requires i32 operands, but got {}",
                        op.text(),
                        operand_type
                    ),
                    node.location,
                ));
            }
        } else if operand_type != context {
            return Err(CompileError::type_error(
                format!(
                    "Operator '{}' on {} operands cannot produce {}",
                    op.text(),
                    operand_type,
                    context
                ),
                node.location,
            ));
        }

        let instruction = binary_instruction(op, operand_type).ok_or_else(|| {
            CompileError::type_error(
                format!(
                    "Operator '{}' is not defined for {}",
                    op.text(),
                    operand_type
                ),
                node.location,
            )
        })?;

        Ok(format!(
            "{} {} ({})",
            self.expression(left, depth)?,
            self.expression(right, depth)?,
            instruction
        ))
    }

    /// `-x` and `!x`
    fn unary(&self, id: NodeId, op: OpSymbol, depth: usize) -> CompileResult<String> {
        let node = self.ast.node(id);
        let operand = self.child(id, 0)?;
        let operand_type = self.ast.node(operand).data_type;
        let value = self.expression(operand, depth)?;

        let instruction = match op {
            OpSymbol::Not => {
                self.require_i32_context(id, op)?;
                if !operand_type.is_integer() {
                    return Err(CompileError::type_error(
                        format!("Operator '!' is not defined for {}", operand_type),
                        node.location,
                    ));
                }
                format!("({}.eqz)", operand_type)
            }
            _ => {
                if operand_type != node.data_type {
                    return Err(CompileError::type_error(
                        format!(
                            "Operator '-' on {} operand cannot produce {}",
                            operand_type, node.data_type
                        ),
                        node.location,
                    ));
                }
                if operand_type.is_float() {
                    format!("({}.neg)", operand_type)
                } else {
                    format!("({}.const -1) ({}.mul)", operand_type, operand_type)
                }
            }
        };

        Ok(format!("{} {}", value, instruction))
    }

    fn require_i32_context(&self, id: NodeId, op: OpSymbol) -> CompileResult<()> {
        let node = self.ast.node(id);
        if node.data_type == DataType::I32 {
            return Ok(());
        }
        Err(CompileError::type_error(
            format!(
                "Operator '{}' yields i32, but {} is expected",
                op.text(),
                node.data_type
            ),
            node.location,
        ))
    }
}
