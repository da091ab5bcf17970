//! Operator precedence resolution
//!
//! The parser leaves every `expression` node with a flat child list: operands
//! interleaved with operator and cast markers in source order. [`resolve`]
//! walks the whole tree bottom-up and replaces each `expression` node in its
//! parent with a nested tree built by a shunting-yard reduction:
//!
//! ```text
//! expression [1, +, 2, *, 3]   =>   operator +
//!                                     number 1
//!                                     operator *
//!                                       number 2
//!                                       number 3
//! ```
//!
//! A binary operator pops the operator stack while the incoming operator does
//! not bind strictly tighter than the top, so equal precedence folds left to
//! right. Prefix operators and casts are pushed without popping and take a
//! single operand when reduced.
//!
//! An expression of a single operand folds to that operand. Operators that
//! end up as the operand of a cast are re-typed from their own operands.

use crate::error::{CompileError, CompileResult};
use crate::parser::ast::*;

/// Folds every expression in the tree
pub fn resolve(ast: &mut Ast) -> CompileResult<()> {
    resolve_children(ast, Ast::ROOT)
}

fn resolve_children(ast: &mut Ast, id: NodeId) -> CompileResult<()> {
    let children = ast.children(id).to_vec();
    let mut folded = Vec::with_capacity(children.len());
    let mut changed = false;

    for child in children {
        resolve_children(ast, child)?;

        if ast.kind(child) == NodeKind::Expression {
            folded.push(fold_expression(ast, child)?);
            changed = true;
        } else {
            folded.push(child);
        }
    }

    if changed {
        ast.set_children(id, folded);
    }
    Ok(())
}

/// Operator or cast that has not received its operands yet
fn is_marker(ast: &Ast, id: NodeId) -> bool {
    matches!(ast.kind(id), NodeKind::Operator | NodeKind::Cast) && ast.children(id).is_empty()
}

fn is_prefix_marker(ast: &Ast, id: NodeId) -> bool {
    match &ast.node(id).value {
        _ if ast.kind(id) == NodeKind::Cast => true,
        NodeValue::Operator(op) => op.is_prefix(),
        _ => false,
    }
}

fn marker_precedence(ast: &Ast, id: NodeId) -> u8 {
    match &ast.node(id).value {
        NodeValue::Operator(op) => op.precedence(),
        _ => CAST_PRECEDENCE,
    }
}

/// Builds the tree for one flat expression and returns its root
fn fold_expression(ast: &mut Ast, expr: NodeId) -> CompileResult<NodeId> {
    let items = ast.children(expr).to_vec();
    let mut operands: Vec<NodeId> = Vec::new();
    let mut operators: Vec<NodeId> = Vec::new();

    for item in items {
        if is_marker(ast, item) {
            if !is_prefix_marker(ast, item) {
                let precedence = marker_precedence(ast, item);
                while let Some(&top) = operators.last() {
                    if precedence > marker_precedence(ast, top) {
                        break;
                    }
                    operators.pop();
                    reduce(ast, &mut operands, top)?;
                }
            }
            operators.push(item);
        } else if ast.kind(item).is_operand()
            || matches!(ast.kind(item), NodeKind::Operator | NodeKind::Cast)
        {
            operands.push(item);
        } else {
            let node = ast.node(item);
            return Err(CompileError::syntax(
                format!("Unrecognised symbol in expression: {}", node.kind),
                node.location,
            ));
        }
    }

    while let Some(op) = operators.pop() {
        reduce(ast, &mut operands, op)?;
    }

    match operands.as_slice() {
        [root] => Ok(*root),
        [] => Err(CompileError::syntax(
            "Empty expression",
            ast.node(expr).location,
        )),
        [_, extra, ..] => Err(CompileError::syntax(
            "Missing operator in expression",
            ast.node(*extra).location,
        )),
    }
}

/// Gives `op` its operands from the top of the operand stack
fn reduce(ast: &mut Ast, operands: &mut Vec<NodeId>, op: NodeId) -> CompileResult<()> {
    let arity = if is_prefix_marker(ast, op) { 1 } else { 2 };

    if operands.len() < arity {
        let node = ast.node(op);
        return Err(CompileError::syntax(
            format!("Missing operand for '{}'", symbol_text(node)),
            node.location,
        ));
    }

    let args = operands.split_off(operands.len() - arity);
    let first = args[0];
    ast.set_children(op, args);
    if ast.kind(op) == NodeKind::Cast {
        type_cast_operand(ast, first);
    }
    operands.push(op);
    Ok(())
}

/// Re-types the operators under a cast from their own operands
///
/// Outside a cast an operator carries the type its context expects. The
/// operand of a cast is converted afterwards, so its operators produce the
/// type of what they operate on: the left operand for arithmetic, `i32` for
/// comparisons and logical operators. Nested casts keep their target type.
fn type_cast_operand(ast: &mut Ast, id: NodeId) {
    let NodeValue::Operator(op) = ast.node(id).value else {
        return;
    };
    let children = ast.children(id).to_vec();
    for &child in &children {
        type_cast_operand(ast, child);
    }

    let data_type = if op.is_predicate() || op == OpSymbol::Not {
        DataType::I32
    } else {
        match children.first() {
            Some(&left) => ast.node(left).data_type,
            None => return,
        }
    };
    ast.node_mut(id).data_type = data_type;
}

fn symbol_text(node: &Node) -> String {
    match &node.value {
        NodeValue::Operator(op) => op.text().to_string(),
        _ => format!("({})", node.data_type),
    }
}
