//! WebAssembly text generation
//!
//! Lowers a parsed, precedence-resolved [`Ast`] into a WAT module:
//! - [`mod@self`]: the [`Generator`], module sections and function headers
//! - [`statements`]: statements, structured control flow and branch depths
//! - [`expressions`]: post-order expression lowering and array addressing
//! - [`instructions`]: operator, conversion and element-size tables
//!
//! # Output layout
//!
//! ```text
//! (module
//!     imports
//!     exports
//!     (memory N)        when any array is declared
//!     globals
//!     functions
//! )
//! ```
//!
//! Each line is indented four spaces per nesting level. Items keep their
//! declaration order within a section, so the same AST always produces the
//! same text.

pub mod expressions;
pub mod instructions;
pub mod statements;

use crate::error::{CompileError, CompileResult};
use crate::parser::ast::*;
use instructions::element_size;
use rustc_hash::FxHashMap;

/// Bytes in one page of linear memory
const PAGE_SIZE: u64 = 65536;

/// Generates the WAT text for a whole module
pub fn generate(ast: &Ast) -> CompileResult<String> {
    Generator::new(ast).generate()
}

/// Structured scope opened by the generator, innermost last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Label {
    /// `block` wrapping a loop; branching here leaves the loop
    Exit,
    /// `loop`; branching here starts the next iteration
    Repeat,
    If,
}

/// Code generator state for one compilation
pub struct Generator<'a> {
    pub(crate) ast: &'a Ast,
    /// Static base address of each array
    array_offsets: FxHashMap<String, u32>,
    next_offset: u32,
    pub(crate) labels: Vec<Label>,
    lines: Vec<String>,
}

impl<'a> Generator<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        Self {
            ast,
            array_offsets: FxHashMap::default(),
            next_offset: 0,
            labels: Vec::new(),
            lines: Vec::new(),
        }
    }

    pub fn generate(mut self) -> CompileResult<String> {
        let ast = self.ast;
        let items = ast.children(Ast::ROOT);
        let of_kind =
            move |kind: NodeKind| items.iter().copied().filter(move |&id| ast.kind(id) == kind);

        for id in of_kind(NodeKind::ImportFunc) {
            self.import(id);
        }
        for id in of_kind(NodeKind::ExportFunc) {
            self.export(id)?;
        }

        let mut has_arrays = false;
        for id in of_kind(NodeKind::ArrayAlloc) {
            self.allocate_array(id)?;
            has_arrays = true;
        }
        if has_arrays {
            let pages = u64::from(self.next_offset).div_ceil(PAGE_SIZE).max(1);
            self.emit(1, format!("(memory {})", pages));
        }

        for &id in items {
            if matches!(ast.kind(id), NodeKind::GlobalVar | NodeKind::GlobalConst) {
                self.global(id)?;
            }
        }
        for id in of_kind(NodeKind::Function) {
            self.function(id)?;
        }

        if self.lines.is_empty() {
            return Ok("(module)".to_string());
        }
        Ok(format!("(module\n{}\n)", self.lines.join("\n")))
    }

    /// Appends one output line at `depth`
    pub(crate) fn emit(&mut self, depth: usize, text: impl AsRef<str>) {
        self.lines.push(format!("{}{}", pad(depth), text.as_ref()));
    }

    /// `(import "console" "log" (func $logInt (param i32)))`
    fn import(&mut self, id: NodeId) {
        let ast = self.ast;
        let node = ast.node(id);
        let module = node.data.first().map(String::as_str).unwrap_or_default();
        let field = node.data.get(1).map(String::as_str).unwrap_or_default();

        let mut signature = vec![format!("func ${}", node.name())];
        for &params in &node.children {
            for &param in ast.children(params) {
                signature.push(format!("(param {})", ast.node(param).data_type));
            }
        }
        if node.data_type.is_value() {
            signature.push(format!("(result {})", node.data_type));
        }

        self.emit(
            1,
            format!(
                "(import \"{}\" \"{}\" ({}))",
                module,
                field,
                signature.join(" ")
            ),
        );
    }

    /// `(export "sub" (func $callSub))`
    fn export(&mut self, id: NodeId) -> CompileResult<()> {
        let ast = self.ast;
        let node = ast.node(id);
        let target = node.name();

        let defined = ast
            .children(Ast::ROOT)
            .iter()
            .any(|&f| ast.kind(f) == NodeKind::Function && ast.node(f).name() == target);
        if !defined {
            return Err(CompileError::binding(
                format!("Cannot export '{}': no function with that name", target),
                node.location,
            ));
        }

        let public = node.data.first().map(String::as_str).unwrap_or(target);
        self.emit(1, format!("(export \"{}\" (func ${}))", public, target));
        Ok(())
    }

    /// Assigns the next free static range to an array
    fn allocate_array(&mut self, id: NodeId) -> CompileResult<()> {
        let ast = self.ast;
        let node = ast.node(id);
        let size = element_size(node.data_type).ok_or_else(|| {
            CompileError::type_error(
                format!("Array '{}' cannot hold {}", node.name(), node.data_type),
                node.location,
            )
        })?;
        let length = node
            .data
            .first()
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| {
                CompileError::structure(
                    format!("Array '{}' has no length", node.name()),
                    node.location,
                )
            })?;

        let end = length
            .checked_mul(size)
            .and_then(|bytes| bytes.checked_add(self.next_offset))
            .ok_or_else(|| {
                CompileError::structure(
                    format!("Array '{}' does not fit in linear memory", node.name()),
                    node.location,
                )
            })?;

        self.array_offsets
            .insert(node.name().to_string(), self.next_offset);
        self.next_offset = end;
        Ok(())
    }

    pub(crate) fn array_offset(&self, name: &str, location: SourceLocation) -> CompileResult<u32> {
        self.array_offsets.get(name).copied().ok_or_else(|| {
            CompileError::binding(format!("Cannot find array: {}", name), location)
        })
    }

    /// `(global $foo (mut f64) (f64.const 3.14))`
    fn global(&mut self, id: NodeId) -> CompileResult<()> {
        let ast = self.ast;
        let node = ast.node(id);
        let value = node
            .children
            .first()
            .copied()
            .filter(|&v| ast.kind(v) == NodeKind::Number)
            .ok_or_else(|| {
                CompileError::syntax(
                    format!(
                        "Initializer of global '{}' must be a numeric literal",
                        node.name()
                    ),
                    node.location,
                )
            })?;
        self.check_value_type(value, node.data_type)?;
        let init = self.expression(value, 1)?;

        let line = if node.kind == NodeKind::GlobalConst {
            format!("(global ${} {} {})", node.name(), node.data_type, init)
        } else {
            format!("(global ${} (mut {}) {})", node.name(), node.data_type, init)
        };
        self.emit(1, line);
        Ok(())
    }

    /// Function header, local declarations and body
    fn function(&mut self, id: NodeId) -> CompileResult<()> {
        let ast = self.ast;
        let node = ast.node(id);
        let (params, body) = match node.children[..] {
            [params, body] => (params, body),
            _ => return Err(self.malformed(id)),
        };

        let mut header = format!("(func ${}", node.name());
        for &param in ast.children(params) {
            let param = ast.node(param);
            header.push_str(&format!(" (param ${} {})", param.name(), param.data_type));
        }
        if node.data_type.is_value() {
            header.push_str(&format!(" (result {})", node.data_type));
        }
        self.emit(1, header);

        for &child in ast.children(body) {
            let local = ast.node(child);
            if !matches!(local.kind, NodeKind::LocalVar | NodeKind::LocalConst) {
                break;
            }
            self.emit(2, format!("(local ${} {})", local.name(), local.data_type));
        }

        self.labels.clear();
        for &child in ast.children(body) {
            self.statement(child, 2)?;
        }

        self.emit(1, ")");
        Ok(())
    }

    /// Fails unless the value produced by `id` has `expected` type
    pub(crate) fn check_value_type(&self, id: NodeId, expected: DataType) -> CompileResult<()> {
        let node = self.ast.node(id);
        if node.data_type == expected {
            Ok(())
        } else {
            Err(CompileError::type_error(
                format!(
                    "Wrong data type. Expected {}, but got {}",
                    expected, node.data_type
                ),
                node.location,
            ))
        }
    }

    /// The `n`th child of `id`, which the tree shape guarantees
    pub(crate) fn child(&self, id: NodeId, n: usize) -> CompileResult<NodeId> {
        self.ast
            .children(id)
            .get(n)
            .copied()
            .ok_or_else(|| self.malformed(id))
    }

    pub(crate) fn malformed(&self, id: NodeId) -> CompileError {
        let node = self.ast.node(id);
        CompileError::structure(format!("Malformed '{}' node", node.kind), node.location)
    }
}

/// Indentation for `depth` nesting levels
pub(crate) fn pad(depth: usize) -> String {
    "    ".repeat(depth)
}

#[cfg(test)]
mod tests {
    use crate::compile_source;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_module() {
        assert_eq!(compile_source("").unwrap(), "(module)");
    }

    #[test]
    fn test_section_order() {
        let source = "double arr[10];\n\
                      int g = 1;\n\
                      int f() { return g; }\n\
                      #export-func f = f\n\
                      #import-func env now = long now()";

        assert_eq!(
            compile_source(source).unwrap(),
            "(module\n\
             \x20   (import \"env\" \"now\" (func $now (result i64)))\n\
             \x20   (export \"f\" (func $f))\n\
             \x20   (memory 1)\n\
             \x20   (global $g (mut i32) (i32.const 1))\n\
             \x20   (func $f (result i32)\n\
             \x20       (global.get $g)\n\
             \x20   )\n\
             )"
        );
    }

    #[test]
    fn test_memory_pages_cover_all_arrays() {
        let wat = compile_source("long big[10000];\nint more[1];").unwrap();

        assert!(wat.contains("(memory 2)"));
    }

    #[test]
    fn test_export_needs_function() {
        let err = compile_source("int x = 1;\n#export-func x = x").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Binding);
        assert_eq!(err.location.line, 2);
    }
}
