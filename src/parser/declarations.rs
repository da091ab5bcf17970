//! Declaration parsing implementation
//!
//! This module handles the module-level items of a Cinonim program:
//!
//! - Global variables and constants: `double foo = 3.14;`, `const int n = 8;`
//! - Static arrays: `int buf[100];`
//! - Function definitions: `type name(params) { ... }`
//! - Pragmas: `#import-func` and `#export-func`
//!
//! # Grammar
//!
//! ```text
//! globalVar   ::= type word "=" number ";"
//! globalConst ::= "const" type word "=" number ";"
//! arrayDecl   ::= type word "[" int "]" ";"
//! function    ::= type word "(" params ")" "{" body "}"
//! importFunc  ::= "#import-func" word word "=" type word "(" params ")"
//! exportFunc  ::= "#export-func" word "=" word
//! params      ::= ( "const"? type word ( "," "const"? type word )* )?
//! ```
//!
//! The alternatives are tried in the order above; at most four tokens of
//! lookahead pick one before anything is consumed.

use crate::error::{CompileError, CompileResult};
use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::Parser;

impl Parser {
    /// Parse one top-level item and attach it to the module
    pub(crate) fn parse_module_item(&mut self) -> CompileResult<()> {
        if self.is_data_type(0) && self.is_word(1) && self.is_operator(2, "=") {
            return self.parse_global(false);
        }

        if self.is_keyword(0, "const")
            && self.is_data_type(1)
            && self.is_word(2)
            && self.is_operator(3, "=")
        {
            self.skip(1);
            return self.parse_global(true);
        }

        if self.is_data_type(0) && self.is_word(1) && self.is_punct(2, "[") {
            return self.parse_array_declaration();
        }

        if self.is_data_type(0) && self.is_word(1) && self.is_punct(2, "(") {
            return self.parse_function_definition();
        }

        if self.is_pragma(0, "import-func") {
            return self.parse_import_pragma();
        }

        if self.is_pragma(0, "export-func") {
            return self.parse_export_pragma();
        }

        let token = self.advance()?;
        let message = if token.kind == TokenKind::Pragma {
            format!("Unknown pragma '#{}'", token.text)
        } else {
            format!("Unrecognised symbol in module: {}", token)
        };
        Err(CompileError::syntax(message, token.location()))
    }

    /// Parse `type name = literal;` (the `const` keyword is already consumed)
    fn parse_global(&mut self, constant: bool) -> CompileResult<()> {
        let loc = self.current_location();
        let data_type = self.expect_data_type("in global declaration")?;
        let name = self.advance()?;
        self.require_value_type(data_type, &name.text, name.location())?;
        self.declare_global(&name)?;
        self.skip(1); // '='

        let kind = if constant {
            NodeKind::GlobalConst
        } else {
            NodeKind::GlobalVar
        };
        let global = self.ast.add(
            Ast::ROOT,
            kind,
            NodeValue::Name(name.text.clone()),
            data_type,
            loc,
        );

        let negative = self.is_operator(0, "-") && self.is_number(1);
        if negative {
            self.skip(1);
        }
        if !self.is_number(0) {
            return Err(CompileError::syntax(
                format!(
                    "Initializer of global '{}' must be a numeric literal, found {}",
                    name.text,
                    self.found()
                ),
                self.current_location(),
            ));
        }
        self.parse_number(global, negative)?;

        self.expect_semicolon(&format!("after global '{}'", name.text))
    }

    /// Parse `type name[length];`
    fn parse_array_declaration(&mut self) -> CompileResult<()> {
        let loc = self.current_location();
        let data_type = self.expect_data_type("in array declaration")?;
        let name = self.advance()?;
        self.require_value_type(data_type, &name.text, name.location())?;
        self.declare_global(&name)?;
        self.skip(1); // '['

        let length = self
            .peek()
            .filter(|t| t.kind == TokenKind::Number)
            .and_then(|t| t.text.parse::<u32>().ok())
            .filter(|&n| n > 0);
        let Some(length) = length else {
            return Err(CompileError::syntax(
                format!(
                    "Length of array '{}' must be a positive integer literal, found {}",
                    name.text,
                    self.found()
                ),
                self.current_location(),
            ));
        };
        self.skip(1);
        self.expect_punct("]", &format!("after the length of array '{}'", name.text))?;
        self.expect_semicolon(&format!("after array '{}'", name.text))?;

        let array = self.ast.add(
            Ast::ROOT,
            NodeKind::ArrayAlloc,
            NodeValue::Name(name.text),
            data_type,
            loc,
        );
        self.ast.node_mut(array).data = vec![length.to_string()];
        Ok(())
    }

    /// Parse function definition: type name(params) { body }
    fn parse_function_definition(&mut self) -> CompileResult<()> {
        let loc = self.current_location();
        let return_type = self.expect_data_type("before function name")?;
        let name = self.advance()?;
        self.declare_global(&name)?;

        let func = self.ast.add(
            Ast::ROOT,
            NodeKind::Function,
            NodeValue::Name(name.text.clone()),
            return_type,
            loc,
        );
        let params = self.ast.add(
            func,
            NodeKind::FuncParams,
            NodeValue::Empty,
            DataType::Na,
            loc,
        );
        let body = self.ast.add(
            func,
            NodeKind::FuncBody,
            NodeValue::Empty,
            DataType::Na,
            self.current_location(),
        );

        self.local_names.clear();
        self.parse_function_params(params)?;

        let ctx = format!("to open the body of function '{}'", name.text);
        self.expect_punct("{", &ctx)?;
        self.ast.node_mut(body).location = self.current_location();
        self.parse_block_statements(body)?;
        self.expect_punct("}", &format!("to close function '{}'", name.text))
    }

    /// Parse `(params)`; each becomes a `parameter`, or `localConst` when const
    fn parse_function_params(&mut self, params: NodeId) -> CompileResult<()> {
        self.expect_punct("(", "before parameter list")?;

        if self.is_punct(0, ")") {
            self.skip(1);
            return Ok(());
        }

        loop {
            let loc = self.current_location();
            let constant = self.is_keyword(0, "const");
            if constant {
                self.skip(1);
            }

            let data_type = self.expect_data_type("in parameter list")?;
            let name = self.expect_word("as parameter name")?;
            self.require_value_type(data_type, &name.text, name.location())?;
            self.declare_local(&name)?;

            let kind = if constant {
                NodeKind::LocalConst
            } else {
                NodeKind::Parameter
            };
            self.ast
                .add(params, kind, NodeValue::Name(name.text), data_type, loc);

            if self.is_punct(0, ",") {
                self.skip(1);
                continue;
            }
            return self.expect_punct(")", "after parameter list");
        }
    }

    /// `#import-func module name = type func(params)`
    fn parse_import_pragma(&mut self) -> CompileResult<()> {
        let pragma = self.advance()?;
        let module = self.expect_word("as import module in '#import-func'")?;
        let field = self.expect_word("as import name in '#import-func'")?;
        if !self.is_operator(0, "=") {
            return Err(CompileError::syntax(
                format!("Expected '=' in '#import-func', found {}", self.found()),
                self.current_location(),
            ));
        }
        self.skip(1);

        let return_type = self.expect_data_type("in '#import-func'")?;
        let name = self.expect_word("as function name in '#import-func'")?;
        self.declare_global(&name)?;

        let import = self.ast.add(
            Ast::ROOT,
            NodeKind::ImportFunc,
            NodeValue::Name(name.text),
            return_type,
            pragma.location(),
        );
        self.ast.node_mut(import).data = vec![module.text, field.text];

        let params = self.ast.add(
            import,
            NodeKind::FuncParams,
            NodeValue::Empty,
            DataType::Na,
            self.current_location(),
        );
        self.local_names.clear();
        self.parse_function_params(params)
    }

    /// `#export-func public = internal`
    fn parse_export_pragma(&mut self) -> CompileResult<()> {
        let pragma = self.advance()?;
        let public = self.expect_word("as export name in '#export-func'")?;
        if !self.is_operator(0, "=") {
            return Err(CompileError::syntax(
                format!("Expected '=' in '#export-func', found {}", self.found()),
                self.current_location(),
            ));
        }
        self.skip(1);
        let internal = self.expect_word("as exported function in '#export-func'")?;

        let export = self.ast.add(
            Ast::ROOT,
            NodeKind::ExportFunc,
            NodeValue::Name(internal.text),
            DataType::Na,
            pragma.location(),
        );
        self.ast.node_mut(export).data = vec![public.text];
        Ok(())
    }
}
