//! Statement parsing implementation
//!
//! This module handles parsing of all statement types inside a function body:
//!
//! - Local declarations: `int a, b = 2;`, `const long n = 8L;`
//! - Control flow: `if`/`else`, `while`, `do`/`while`, `for`
//! - Jump statements: `return`, `break`, `continue` (with an optional loop index)
//! - Assignments: `x = e;`, `x += e;`, `a = 1, b = 2;`, `arr[i] = e;`
//! - Call statements: `foo(1, 2);`
//!
//! # Grammar
//!
//! ```text
//! statement ::= local_decl | return_stmt | break_stmt | continue_stmt
//!             | for_stmt | do_stmt | while_stmt | if_stmt
//!             | array_set | call_stmt | assignments ";"
//! body      ::= "{" statement* "}" | statement
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::error::{CompileError, CompileResult};
use crate::parser::ast::*;
use crate::parser::parse::Parser;

const ASSIGNMENT_OPERATORS: &[&str] = &["=", "+=", "-=", "*=", "/=", "%="];

impl Parser {
    /// Parse statements up to (not including) the closing brace of `block`
    pub(crate) fn parse_block_statements(&mut self, block: NodeId) -> CompileResult<()> {
        while !self.is_punct(0, "}") {
            if self.is_at_end() {
                return Err(self.unexpected_end());
            }

            let is_return = self.is_keyword(0, "return");
            self.parse_statement(block)?;

            if is_return && !self.is_punct(0, "}") && !self.is_at_end() {
                return Err(CompileError::syntax(
                    format!("Unreachable code after 'return': {}", self.found()),
                    self.current_location(),
                ));
            }
        }

        Ok(())
    }

    /// Parse a braced block or a single statement into `block`
    pub(crate) fn parse_body(&mut self, block: NodeId, ctx: &str) -> CompileResult<()> {
        if self.is_punct(0, "{") {
            self.skip(1);
            self.parse_block_statements(block)?;
            self.expect_punct("}", &format!("to close the body of '{}'", ctx))
        } else {
            self.parse_statement(block)
        }
    }

    /// Parse a statement and attach it to `block`
    pub(crate) fn parse_statement(&mut self, block: NodeId) -> CompileResult<()> {
        if self.is_data_type(0) || self.is_keyword(0, "const") {
            return self.parse_local_declaration(block);
        }

        if self.is_keyword(0, "return") {
            return self.parse_return_statement(block);
        }

        if self.is_keyword(0, "break") {
            return self.parse_jump_statement(block, NodeKind::Break);
        }

        if self.is_keyword(0, "continue") {
            return self.parse_jump_statement(block, NodeKind::Continue);
        }

        if self.is_keyword(0, "for") {
            return self.parse_for_statement(block);
        }

        if self.is_keyword(0, "do") {
            return self.parse_do_while_statement(block);
        }

        if self.is_keyword(0, "while") {
            return self.parse_while_statement(block);
        }

        if self.is_keyword(0, "if") {
            return self.parse_if_statement(block);
        }

        if self.is_word(0) && self.is_punct(1, "(") {
            self.parse_function_call(block)?;
            return self.expect_semicolon("after function call");
        }

        if self.is_word(0) && self.is_punct(1, "[") {
            return self.parse_array_set(block);
        }

        if self.is_word(0)
            && ASSIGNMENT_OPERATORS
                .iter()
                .any(|op| self.is_operator(1, op))
        {
            self.parse_assignments(block)?;
            return self.expect_semicolon("after assignment");
        }

        let block_kind = self.ast.kind(block);
        Err(CompileError::syntax(
            format!("Unrecognised symbol in {}: {}", block_kind, self.found()),
            self.current_location(),
        ))
    }

    /// Parse `const? type name (= expr)? (, name (= expr)?)* ;`
    fn parse_local_declaration(&mut self, block: NodeId) -> CompileResult<()> {
        let loc = self.current_location();

        if self.ast.kind(block) != NodeKind::FuncBody {
            return Err(CompileError::structure(
                "Local variables must be declared directly in a function body",
                loc,
            ));
        }
        let after_statement = self.ast.children(block).iter().any(|&child| {
            !matches!(
                self.ast.kind(child),
                NodeKind::LocalVar | NodeKind::LocalConst
            )
        });
        if after_statement {
            return Err(CompileError::structure(
                "Local variables must be declared at the beginning of a function body",
                loc,
            ));
        }

        let constant = self.is_keyword(0, "const");
        if constant {
            self.skip(1);
        }
        let data_type = self.expect_data_type("in local declaration")?;
        let kind = if constant {
            NodeKind::LocalConst
        } else {
            NodeKind::LocalVar
        };

        loop {
            let name = self.expect_word("in local declaration")?;
            self.require_value_type(data_type, &name.text, name.location())?;
            self.declare_local(&name)?;

            let local = self.ast.add(
                block,
                kind,
                NodeValue::Name(name.text.clone()),
                data_type,
                name.location(),
            );

            if self.is_operator(0, "=") {
                self.skip(1);
                self.parse_expression(local, data_type)?;
            } else if constant {
                return Err(CompileError::syntax(
                    format!("Constant '{}' must be initialized", name.text),
                    self.current_location(),
                ));
            }

            if self.is_punct(0, ",") {
                self.skip(1);
                continue;
            }
            return self.expect_semicolon("after local declaration");
        }
    }

    /// Parse `return expr? ;`
    fn parse_return_statement(&mut self, block: NodeId) -> CompileResult<()> {
        let token = self.advance()?;
        let func = self
            .ast
            .enclosing(block, NodeKind::Function)
            .ok_or_else(|| CompileError::structure("'return' outside of a function", token.location()))?;
        let func_name = self.ast.node(func).name().to_string();
        let return_type = self.ast.node(func).data_type;

        let node = self.ast.add(
            block,
            NodeKind::Return,
            NodeValue::Empty,
            return_type,
            token.location(),
        );

        if self.is_punct(0, ";") {
            if return_type != DataType::Void {
                return Err(CompileError::type_error(
                    format!(
                        "Function '{}' must return a value of type {}",
                        func_name, return_type
                    ),
                    token.location(),
                ));
            }
        } else {
            if return_type == DataType::Void {
                return Err(CompileError::type_error(
                    format!("Cannot return a value from void function '{}'", func_name),
                    self.current_location(),
                ));
            }
            self.parse_expression(node, return_type)?;
        }

        self.expect_semicolon("after return")
    }

    /// Parse `break index? ;` and `continue index? ;`
    fn parse_jump_statement(&mut self, block: NodeId, kind: NodeKind) -> CompileResult<()> {
        let token = self.advance()?;
        let loops = self.ast.enclosing_loops(block);

        if loops == 0 {
            return Err(CompileError::structure(
                format!("'{}' outside of a loop", token.text),
                token.location(),
            ));
        }

        let mut index = 0;
        if self.is_number(0) {
            let number = self.advance()?;
            index = number.text.parse::<u32>().map_err(|_| {
                CompileError::syntax(
                    format!("Wrong loop index in '{}': {}", token.text, number.text),
                    number.location(),
                )
            })?;
            if index as usize >= loops {
                return Err(CompileError::structure(
                    format!(
                        "'{} {}' exceeds the {} enclosing loop(s)",
                        token.text, index, loops
                    ),
                    number.location(),
                ));
            }
        }

        self.ast.add(
            block,
            kind,
            NodeValue::Index(index),
            DataType::Na,
            token.location(),
        );

        self.expect_semicolon(&format!("or a loop index after '{}'", token.text))
    }

    /// Parse `for (init; condition; increment) body`
    ///
    /// ```text
    /// for
    ///   +-- statement   (init assignments)
    ///   +-- condition
    ///   +-- statement   (increment assignments)
    ///   \-- loopBody
    /// ```
    fn parse_for_statement(&mut self, block: NodeId) -> CompileResult<()> {
        let loc = self.advance()?.location();
        self.expect_punct("(", "after 'for'")?;

        let node = self
            .ast
            .add(block, NodeKind::For, NodeValue::Empty, DataType::Na, loc);

        let init = self.ast.add(
            node,
            NodeKind::Statement,
            NodeValue::Empty,
            DataType::Na,
            self.current_location(),
        );
        if !self.is_punct(0, ";") {
            self.parse_assignments(init)?;
        }
        self.expect_semicolon("after 'for' initializer")?;

        let condition = self.ast.add(
            node,
            NodeKind::Condition,
            NodeValue::Empty,
            DataType::I32,
            self.current_location(),
        );
        if !self.is_punct(0, ";") {
            self.parse_expression(condition, DataType::I32)?;
        }
        self.expect_semicolon("after 'for' condition")?;

        let increment = self.ast.add(
            node,
            NodeKind::Statement,
            NodeValue::Empty,
            DataType::Na,
            self.current_location(),
        );
        if !self.is_punct(0, ")") {
            self.parse_assignments(increment)?;
        }
        self.expect_punct(")", "after 'for' clauses")?;

        let body = self.ast.add(
            node,
            NodeKind::LoopBody,
            NodeValue::Empty,
            DataType::Na,
            self.current_location(),
        );
        self.parse_body(body, "for")
    }

    /// Parse `do body while (condition);`
    fn parse_do_while_statement(&mut self, block: NodeId) -> CompileResult<()> {
        let loc = self.advance()?.location();
        let node = self
            .ast
            .add(block, NodeKind::Do, NodeValue::Empty, DataType::Na, loc);

        let body = self.ast.add(
            node,
            NodeKind::LoopBody,
            NodeValue::Empty,
            DataType::Na,
            self.current_location(),
        );
        self.parse_body(body, "do")?;

        self.expect_keyword("while", "after 'do' body")?;
        self.expect_punct("(", "after 'while'")?;
        self.parse_condition(node)?;
        self.expect_punct(")", "after 'do-while' condition")?;
        self.expect_semicolon("after 'do-while'")
    }

    /// Parse `while (condition) body`
    fn parse_while_statement(&mut self, block: NodeId) -> CompileResult<()> {
        let loc = self.advance()?.location();
        self.expect_punct("(", "after 'while'")?;

        let node = self
            .ast
            .add(block, NodeKind::While, NodeValue::Empty, DataType::Na, loc);
        self.parse_condition(node)?;
        self.expect_punct(")", "after 'while' condition")?;

        let body = self.ast.add(
            node,
            NodeKind::LoopBody,
            NodeValue::Empty,
            DataType::Na,
            self.current_location(),
        );
        self.parse_body(body, "while")
    }

    /// Parse `if (condition) body (else body)?`
    fn parse_if_statement(&mut self, block: NodeId) -> CompileResult<()> {
        let loc = self.advance()?.location();
        self.expect_punct("(", "after 'if'")?;

        let node = self
            .ast
            .add(block, NodeKind::If, NodeValue::Empty, DataType::Na, loc);
        self.parse_condition(node)?;
        self.expect_punct(")", "after 'if' condition")?;

        let then = self.ast.add(
            node,
            NodeKind::Then,
            NodeValue::Empty,
            DataType::Na,
            self.current_location(),
        );
        self.parse_body(then, "if")?;

        if self.is_keyword(0, "else") {
            let else_loc = self.advance()?.location();
            let otherwise = self.ast.add(
                node,
                NodeKind::Else,
                NodeValue::Empty,
                DataType::Na,
                else_loc,
            );
            self.parse_body(otherwise, "else")?;
        }

        Ok(())
    }

    fn parse_condition(&mut self, parent: NodeId) -> CompileResult<()> {
        let condition = self.ast.add(
            parent,
            NodeKind::Condition,
            NodeValue::Empty,
            DataType::I32,
            self.current_location(),
        );
        self.parse_expression(condition, DataType::I32)?;
        Ok(())
    }

    /// Parse `name[index] = value;`
    fn parse_array_set(&mut self, block: NodeId) -> CompileResult<()> {
        let name = self.advance()?;
        let (array, data_type) = self.resolve_array(block, &name)?;

        let set = self.ast.add(
            block,
            NodeKind::ArraySet,
            NodeValue::Name(array),
            data_type,
            name.location(),
        );
        self.parse_array_index(set, &name.text)?;

        if !self.is_operator(0, "=") {
            return Err(CompileError::syntax(
                format!(
                    "Expected '=' after '{}[...]', found {}",
                    name.text,
                    self.found()
                ),
                self.current_location(),
            ));
        }
        self.skip(1);

        let value = self.ast.add(
            set,
            NodeKind::ArrayValue,
            NodeValue::Name(name.text.clone()),
            data_type,
            self.current_location(),
        );
        self.parse_expression(value, data_type)?;
        self.expect_semicolon("after array assignment")
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{CompileResult, ErrorKind};
    use crate::parser::ast::*;
    use crate::parser::lexer::tokenize;
    use crate::parser::parse::parse;

    fn parse_source(source: &str) -> CompileResult<Ast> {
        parse(&tokenize(source)?)
    }

    fn body_kinds(ast: &Ast) -> Vec<NodeKind> {
        let func = ast.children(Ast::ROOT)[0];
        let body = ast.children(func)[1];
        ast.children(body).iter().map(|&c| ast.kind(c)).collect()
    }

    #[test]
    fn test_local_declarations_and_assignments() {
        let ast = parse_source("void f() { int a, b = 2; a = 1, b += a; }").unwrap();

        assert_eq!(
            body_kinds(&ast),
            vec![
                NodeKind::LocalVar,
                NodeKind::LocalVar,
                NodeKind::LocalSet,
                NodeKind::LocalSet
            ]
        );
    }

    #[test]
    fn test_for_loop_shape() {
        let ast = parse_source("void f() { int i; for (i = 0; i < 10; i += 1) { } }").unwrap();
        let func = ast.children(Ast::ROOT)[0];
        let body = ast.children(func)[1];
        let for_loop = ast.children(body)[1];
        let kinds: Vec<_> = ast.children(for_loop).iter().map(|&c| ast.kind(c)).collect();

        assert_eq!(
            kinds,
            vec![
                NodeKind::Statement,
                NodeKind::Condition,
                NodeKind::Statement,
                NodeKind::LoopBody
            ]
        );
    }

    #[test]
    fn test_single_statement_bodies() {
        let source = "int f(int n) { if (n == 0) return 1; else n = 2; while (n > 0) n -= 1; return n; }";
        let ast = parse_source(source).unwrap();

        assert_eq!(
            body_kinds(&ast),
            vec![NodeKind::If, NodeKind::While, NodeKind::Return]
        );
    }

    #[test]
    fn test_locals_must_come_first() {
        let err = parse_source("void f() { int a; a = 1; int b; }").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Structure);
        assert_eq!(err.location.column, 26);
    }

    #[test]
    fn test_locals_must_be_in_function_body() {
        let err = parse_source("void f() { while (1) { int a; } }").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Structure);
    }

    #[test]
    fn test_unreachable_after_return() {
        let err = parse_source("int f() { return 1; f(); }").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.starts_with("Unreachable code"));
    }

    #[test]
    fn test_break_outside_loop() {
        let err = parse_source("void f() { break; }").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Structure);
    }

    #[test]
    fn test_break_index_exceeds_loops() {
        let err = parse_source("void f() { while (1) { break 1; } }").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Structure);
    }

    #[test]
    fn test_do_while_requires_while() {
        let err = parse_source("void f() { do { } until (1); }").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.starts_with("Expected 'while'"));
    }

    #[test]
    fn test_return_type_checks() {
        let err = parse_source("void f() { return 1; }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);

        let err = parse_source("int f() { return; }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_assignment_to_constant() {
        let err = parse_source("const int x = 1;\nvoid f() { x = 2; }").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Immutability);
        assert_eq!((err.location.line, err.location.column), (2, 12));
        assert!(err.message.contains("'x'"));
    }
}
