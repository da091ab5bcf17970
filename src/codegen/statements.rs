//! Statement lowering and structured control flow
//!
//! Loops become a `block` (the exit scope) wrapping a `loop` (the repeat
//! scope). The generator tracks every scope it opens on a label stack, so a
//! `break` or `continue` branch depth is the number of scopes between the
//! instruction and its target:
//!
//! ```text
//! (block (loop                 ; exit, repeat
//!     (br_if 1 (i32.eqz cond)) ; leave when false
//!     cond
//!     (if (then                ; if
//!         (br 2)               ; break: if, repeat, exit
//!     ))
//!     (br 0)                   ; next iteration
//! ))
//! ```

use super::{Generator, Label};
use crate::error::{CompileError, CompileResult};
use crate::parser::ast::*;

impl Generator<'_> {
    /// Emits the instructions of one statement
    pub(crate) fn statement(&mut self, id: NodeId, depth: usize) -> CompileResult<()> {
        let ast = self.ast;
        let node = ast.node(id);

        match node.kind {
            // Declared in the function header; an initializer is a plain set
            NodeKind::LocalVar | NodeKind::LocalConst => match node.children.first() {
                Some(&value) => self.assignment("local", id, value, depth),
                None => Ok(()),
            },
            NodeKind::LocalSet => {
                let value = self.child(id, 0)?;
                self.assignment("local", id, value, depth)
            }
            NodeKind::GlobalSet => {
                let value = self.child(id, 0)?;
                self.assignment("global", id, value, depth)
            }
            NodeKind::ArraySet => self.array_set(id, depth),
            NodeKind::FunctionCall => {
                let call = self.function_call(id, depth)?;
                self.emit(depth, call);
                if node.data_type != DataType::Void {
                    self.emit(depth, "(drop)");
                }
                Ok(())
            }
            NodeKind::Return => self.return_statement(id, depth),
            NodeKind::If => self.if_statement(id, depth),
            NodeKind::While => self.while_loop(id, depth),
            NodeKind::Do => self.do_loop(id, depth),
            NodeKind::For => self.for_loop(id, depth),
            NodeKind::Break | NodeKind::Continue => self.branch(id, depth),
            kind => Err(CompileError::structure(
                format!("Unexpected {} in function body", kind),
                node.location,
            )),
        }
    }

    fn statements(&mut self, block: NodeId, depth: usize) -> CompileResult<()> {
        let ast = self.ast;
        for &child in ast.children(block) {
            self.statement(child, depth)?;
        }
        Ok(())
    }

    /// `(local.set $x value)` / `(global.set $x value)`
    fn assignment(
        &mut self,
        scope: &str,
        id: NodeId,
        value: NodeId,
        depth: usize,
    ) -> CompileResult<()> {
        let ast = self.ast;
        let node = ast.node(id);
        self.check_value_type(value, node.data_type)?;
        let text = self.expression(value, depth)?;
        self.emit(depth, format!("({}.set ${} {})", scope, node.name(), text));
        Ok(())
    }

    /// Address, value, then a typed store
    fn array_set(&mut self, id: NodeId, depth: usize) -> CompileResult<()> {
        let data_type = self.ast.node(id).data_type;
        let value_node = self.child(id, 1)?;
        let value = self.child(value_node, 0)?;
        self.check_value_type(value, data_type)?;

        let text = format!(
            "{} {} ({}.store)",
            self.array_address(id, depth)?,
            self.expression(value, depth)?,
            data_type
        );
        self.emit(depth, text);
        Ok(())
    }

    /// The value, then `(return)` unless this is the tail of the function body
    fn return_statement(&mut self, id: NodeId, depth: usize) -> CompileResult<()> {
        let ast = self.ast;
        let node = ast.node(id);

        if let Some(&value) = node.children.first() {
            self.check_value_type(value, node.data_type)?;
            let text = self.expression(value, depth)?;
            self.emit(depth, text);
        }

        let in_body = node
            .parent
            .is_some_and(|p| ast.kind(p) == NodeKind::FuncBody);
        if !in_body {
            self.emit(depth, "(return)");
        }
        Ok(())
    }

    /// Instruction text of a loop or `if` condition, `None` when omitted
    fn condition(&self, id: NodeId, depth: usize) -> CompileResult<Option<String>> {
        match self.ast.children(id).first() {
            Some(&value) => {
                self.check_value_type(value, DataType::I32)?;
                Ok(Some(self.expression(value, depth)?))
            }
            None => Ok(None),
        }
    }

    /// `if`/`then`/`else`
    ///
    /// When the then-branch ends in a `return`, the else-branch is emitted
    /// after the closed `if` instead of inside an `else` clause.
    fn if_statement(&mut self, id: NodeId, depth: usize) -> CompileResult<()> {
        let ast = self.ast;
        let cond = self.child(id, 0)?;
        let then = self.child(id, 1)?;
        let otherwise = ast.children(id).get(2).copied();

        let predicate = self
            .condition(cond, depth)?
            .ok_or_else(|| self.malformed(cond))?;
        self.emit(depth, predicate);
        self.emit(depth, "(if (then");

        self.labels.push(Label::If);
        self.statements(then, depth + 1)?;

        let then_returns = ast
            .last_child(then)
            .is_some_and(|last| ast.kind(last) == NodeKind::Return);

        match otherwise {
            Some(otherwise) if !then_returns => {
                self.emit(depth, ")(else");
                self.statements(otherwise, depth + 1)?;
                self.labels.pop();
                self.emit(depth, "))");
            }
            Some(otherwise) => {
                self.labels.pop();
                self.emit(depth, "))");
                self.statements(otherwise, depth)?;
            }
            None => {
                self.labels.pop();
                self.emit(depth, "))");
            }
        }
        Ok(())
    }

    fn open_loop(&mut self, depth: usize) {
        self.emit(depth, "(block (loop");
        self.labels.push(Label::Exit);
        self.labels.push(Label::Repeat);
    }

    fn close_loop(&mut self, depth: usize) {
        self.labels.truncate(self.labels.len().saturating_sub(2));
        self.emit(depth, "))");
    }

    /// Leaves the loop at the top when the condition is false
    fn exit_unless(&mut self, cond: NodeId, depth: usize) -> CompileResult<()> {
        if let Some(predicate) = self.condition(cond, depth)? {
            self.emit(depth, format!("(br_if 1 (i32.eqz {}))", predicate));
        }
        Ok(())
    }

    fn while_loop(&mut self, id: NodeId, depth: usize) -> CompileResult<()> {
        let cond = self.child(id, 0)?;
        let body = self.child(id, 1)?;

        self.open_loop(depth);
        self.exit_unless(cond, depth + 1)?;
        self.statements(body, depth + 1)?;
        self.emit(depth + 1, "(br 0)");
        self.close_loop(depth);
        Ok(())
    }

    fn do_loop(&mut self, id: NodeId, depth: usize) -> CompileResult<()> {
        let body = self.child(id, 0)?;
        let cond = self.child(id, 1)?;

        self.open_loop(depth);
        self.statements(body, depth + 1)?;
        let predicate = self
            .condition(cond, depth + 1)?
            .ok_or_else(|| self.malformed(cond))?;
        self.emit(depth + 1, format!("(br_if 0 {})", predicate));
        self.close_loop(depth);
        Ok(())
    }

    /// The initializer runs once before the loop, the increment after the body
    fn for_loop(&mut self, id: NodeId, depth: usize) -> CompileResult<()> {
        let init = self.child(id, 0)?;
        let cond = self.child(id, 1)?;
        let increment = self.child(id, 2)?;
        let body = self.child(id, 3)?;

        self.statements(init, depth)?;
        self.open_loop(depth);
        self.exit_unless(cond, depth + 1)?;
        self.statements(body, depth + 1)?;
        self.statements(increment, depth + 1)?;
        self.emit(depth + 1, "(br 0)");
        self.close_loop(depth);
        Ok(())
    }

    /// `break n` leaves, and `continue n` repeats, the n-th enclosing loop
    fn branch(&mut self, id: NodeId, depth: usize) -> CompileResult<()> {
        let ast = self.ast;
        let node = ast.node(id);
        let index = match node.value {
            NodeValue::Index(n) => n as usize,
            _ => 0,
        };

        let mut loops = 0;
        let mut target = None;
        for (distance, label) in self.labels.iter().rev().enumerate() {
            if *label != Label::Repeat {
                continue;
            }
            if loops == index {
                target = Some(match node.kind {
                    NodeKind::Continue => distance,
                    _ => distance + 1,
                });
                break;
            }
            loops += 1;
        }

        let Some(target) = target else {
            return Err(CompileError::structure(
                format!("'{}' has no enclosing loop at index {}", node.kind, index),
                node.location,
            ));
        };
        self.emit(depth, format!("(br {})", target));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::compile_source;

    fn wat(source: &str) -> String {
        compile_source(source).unwrap()
    }

    #[test]
    fn test_while_loop_depths() {
        let source = "void f(int x) { while (1) { if (x) { break; } continue; } }";

        assert_eq!(
            wat(source),
            "(module\n\
             \x20   (func $f (param $x i32)\n\
             \x20       (block (loop\n\
             \x20           (br_if 1 (i32.eqz (i32.const 1)))\n\
             \x20           (local.get $x)\n\
             \x20           (if (then\n\
             \x20               (br 2)\n\
             \x20           ))\n\
             \x20           (br 0)\n\
             \x20           (br 0)\n\
             \x20       ))\n\
             \x20   )\n\
             )"
        );
    }

    #[test]
    fn test_break_one_level_greater_than_continue() {
        let text = wat("void f() { while (1) { break; } while (1) { continue; } }");

        let breaks: Vec<_> = text
            .lines()
            .map(str::trim)
            .filter(|l| l.starts_with("(br "))
            .collect();
        assert_eq!(breaks, vec!["(br 1)", "(br 0)", "(br 0)", "(br 0)"]);
    }

    #[test]
    fn test_outer_loop_index() {
        let source = "void f() { while (1) { do { break 1; continue 1; } while (1); } }";
        let text = wat(source);
        let lines: Vec<_> = text.lines().map(str::trim).collect();

        assert!(lines.contains(&"(br 3)"));
        assert!(lines.contains(&"(br 2)"));
    }

    #[test]
    fn test_do_loop() {
        let source = "int f(int i) { do { i += 1; } while (i < 10); return i; }";

        assert_eq!(
            wat(source),
            "(module\n\
             \x20   (func $f (param $i i32) (result i32)\n\
             \x20       (block (loop\n\
             \x20           (local.set $i (local.get $i) (i32.const 1) (i32.add))\n\
             \x20           (br_if 0 (local.get $i) (i32.const 10) (i32.lt_s))\n\
             \x20       ))\n\
             \x20       (local.get $i)\n\
             \x20   )\n\
             )"
        );
    }

    #[test]
    fn test_else_after_returning_then_is_flattened() {
        let source = "int f(int n) { if (n) { return 1; } else { n = 2; } return n; }";

        assert_eq!(
            wat(source),
            "(module\n\
             \x20   (func $f (param $n i32) (result i32)\n\
             \x20       (local.get $n)\n\
             \x20       (if (then\n\
             \x20           (i32.const 1)\n\
             \x20           (return)\n\
             \x20       ))\n\
             \x20       (local.set $n (i32.const 2))\n\
             \x20       (local.get $n)\n\
             \x20   )\n\
             )"
        );
    }

    #[test]
    fn test_call_statement_drops_result() {
        let source = "int one() { return 1; }\nvoid f() { one(); }";

        assert!(wat(source).ends_with("    (func $f\n        (call $one)\n        (drop)\n    )\n)"));
    }

    #[test]
    fn test_initialized_locals() {
        let source = "int f() { int a = 4, b; const int c = 2; b = a * c; return b; }";

        assert_eq!(
            wat(source),
            "(module\n\
             \x20   (func $f (result i32)\n\
             \x20       (local $a i32)\n\
             \x20       (local $b i32)\n\
             \x20       (local $c i32)\n\
             \x20       (local.set $a (i32.const 4))\n\
             \x20       (local.set $c (i32.const 2))\n\
             \x20       (local.set $b (local.get $a) (local.get $c) (i32.mul))\n\
             \x20       (local.get $b)\n\
             \x20   )\n\
             )"
        );
    }
}
