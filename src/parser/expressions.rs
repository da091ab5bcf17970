//! Expression parsing implementation
//!
//! Expressions are read left to right into a flat `expression` node:
//! operands and operator/cast markers are appended as children in source
//! order, without imposing any structure. The precedence pass folds them
//! into trees after the whole module is parsed.
//!
//! # Supported Expressions
//!
//! - Number literals with optional `L`, `F`, `D` suffix, and negative literals
//! - Variable reads, array reads `a[i]`, function calls `f(x, y)`
//! - Binary operators: arithmetic, shifts, comparison, logical
//! - Prefix operators: `-`, `!`
//! - Casts: `(type) operand`
//! - Parenthesized sub-expressions
//!
//! # Typing
//!
//! Every `expression` node carries the dataType its context expects (the
//! assignment target, parameter, return type, or `i32` for conditions and
//! indexes). Literals take their type from that context, and suffixed or
//! dotted literals must agree with it.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::error::{CompileError, CompileResult};
use crate::parser::ast::*;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::Parser;

/// Literals longer than this lose precision as `f32`
const MAX_F32_LITERAL_LEN: usize = 8;

impl Parser {
    /// Parse an expression under `parent`, typed by `context`
    pub(crate) fn parse_expression(
        &mut self,
        parent: NodeId,
        context: DataType,
    ) -> CompileResult<NodeId> {
        let expr = self.ast.add(
            parent,
            NodeKind::Expression,
            NodeValue::Empty,
            context,
            self.current_location(),
        );
        self.parse_expression_chain(expr)?;
        Ok(expr)
    }

    /// `operand (operator operand)*`, stops before the terminating token
    fn parse_expression_chain(&mut self, expr: NodeId) -> CompileResult<()> {
        loop {
            self.parse_operand(expr)?;

            let Some(token) = self.peek() else {
                return Ok(());
            };
            if token.kind != TokenKind::Operator {
                return Ok(());
            }

            let location = token.location();
            let Some(op) = OpSymbol::from_binary(&token.text) else {
                return Err(CompileError::syntax(
                    format!("Unrecognised operator in expression: '{}'", token.text),
                    location,
                ));
            };

            let context = self.ast.node(expr).data_type;
            self.ast.add(
                expr,
                NodeKind::Operator,
                NodeValue::Operator(op),
                context,
                location,
            );
            self.skip(1);
        }
    }

    /// Parse one operand, including any prefix operators and casts before it
    fn parse_operand(&mut self, expr: NodeId) -> CompileResult<()> {
        let context = self.ast.node(expr).data_type;
        let loc = self.current_location();

        // Cast: (type)
        if self.is_punct(0, "(") && self.is_data_type(1) && self.is_punct(2, ")") {
            let target = self
                .peek_ahead(1)
                .and_then(|t| DataType::from_keyword(&t.text))
                .filter(|t| t.is_value())
                .ok_or_else(|| {
                    CompileError::type_error("Cannot cast to void", self.current_location())
                })?;
            self.ast
                .add(expr, NodeKind::Cast, NodeValue::Empty, target, loc);
            self.skip(3);
            return self.parse_operand(expr);
        }

        if self.is_punct(0, "(") {
            self.skip(1);
            self.parse_expression(expr, context)?;
            return self.expect_punct(")", "to close parenthesized expression");
        }

        // Negative literal
        if self.is_operator(0, "-") && self.is_number(1) {
            self.skip(1);
            self.parse_number(expr, true)?;
            return Ok(());
        }

        let prefix = self
            .peek()
            .filter(|t| t.kind == TokenKind::Operator)
            .and_then(|t| OpSymbol::from_prefix(&t.text));
        if let Some(op) = prefix {
            self.ast.add(
                expr,
                NodeKind::Operator,
                NodeValue::Operator(op),
                context,
                loc,
            );
            self.skip(1);
            return self.parse_operand(expr);
        }

        if self.is_number(0) {
            self.parse_number(expr, false)?;
            return Ok(());
        }

        if self.is_word(0) && self.is_punct(1, "(") {
            let call = self.parse_function_call(expr)?;
            let node = self.ast.node(call);
            if node.data_type == DataType::Void {
                return Err(CompileError::type_error(
                    format!("Function '{}' does not return a value", node.name()),
                    loc,
                ));
            }
            return Ok(());
        }

        if self.is_word(0) && self.is_punct(1, "[") {
            let name = self.advance()?;
            let (array, data_type) = self.resolve_array(expr, &name)?;
            let get = self.ast.add(
                expr,
                NodeKind::ArrayGet,
                NodeValue::Name(array),
                data_type,
                loc,
            );
            return self.parse_array_index(get, &name.text);
        }

        if self.is_word(0) {
            return self.parse_variable_get(expr);
        }

        Err(CompileError::syntax(
            format!("Expected an operand, found {}", self.found()),
            loc,
        ))
    }

    fn parse_variable_get(&mut self, expr: NodeId) -> CompileResult<()> {
        let token = self.advance()?;
        let decl = self.ast.lookup(expr, &token.text).ok_or_else(|| {
            CompileError::binding(
                format!("Cannot find a variable: {}", token.text),
                token.location(),
            )
        })?;

        let node = self.ast.node(decl);
        let kind = match node.kind {
            NodeKind::GlobalVar | NodeKind::GlobalConst => NodeKind::GlobalGet,
            NodeKind::LocalVar | NodeKind::LocalConst | NodeKind::Parameter => NodeKind::LocalGet,
            NodeKind::ArrayAlloc => {
                return Err(CompileError::structure(
                    format!("Array '{}' must be indexed", token.text),
                    token.location(),
                ))
            }
            _ => {
                return Err(CompileError::binding(
                    format!("'{}' is a function, not a variable", token.text),
                    token.location(),
                ))
            }
        };

        let data_type = node.data_type;
        let location = token.location();
        self.ast
            .add(expr, kind, NodeValue::Name(token.text), data_type, location);
        Ok(())
    }

    /// Parse a number literal; its type comes from the suffix or from `parent`
    pub(crate) fn parse_number(&mut self, parent: NodeId, negative: bool) -> CompileResult<NodeId> {
        let token = self.advance()?;
        let context = self.ast.node(parent).data_type;
        let unsigned = token.text.as_str();
        let loc = token.location();
        // The sign counts towards the precision limit
        let text = if negative {
            format!("-{}", unsigned)
        } else {
            unsigned.to_string()
        };

        let (digits, suffix) = match unsigned.chars().last() {
            Some(c @ ('L' | 'F' | 'D')) => (&unsigned[..unsigned.len() - 1], Some(c)),
            _ => (unsigned, None),
        };
        let has_point = digits.contains('.');

        let data_type = match suffix {
            Some('L') if has_point => {
                return Err(CompileError::syntax(
                    format!("Wrong number suffix L in: {}", text),
                    loc,
                ))
            }
            Some('L') => DataType::I64,
            Some('F') if text.len() > MAX_F32_LITERAL_LEN => {
                return Err(CompileError::type_error(
                    format!("Losing precision in: {}", text),
                    loc,
                ))
            }
            Some('F') => DataType::F32,
            Some(_) => DataType::F64,
            None if has_point => {
                if text.len() > MAX_F32_LITERAL_LEN || context == DataType::F64 {
                    DataType::F64
                } else {
                    DataType::F32
                }
            }
            None => context,
        };

        if data_type != context || !data_type.is_value() {
            let got = if data_type.is_value() {
                data_type.to_string()
            } else {
                "a number".to_string()
            };
            return Err(CompileError::type_error(
                format!(
                    "Wrong data type. Expected {}, but got {}: {}",
                    context, got, text
                ),
                loc,
            ));
        }

        let value = if has_point {
            let magnitude = digits
                .parse::<f64>()
                .map_err(|_| CompileError::syntax(format!("Malformed number: {}", text), loc))?;
            Number::Float(if negative { -magnitude } else { magnitude })
        } else {
            Number::Int(parse_integer(digits, negative, data_type, &token)?)
        };

        Ok(self.ast.add(
            parent,
            NodeKind::Number,
            NodeValue::Number(value),
            data_type,
            loc,
        ))
    }

    /// Parse `name(args)`; each argument is typed by the callee's parameter
    pub(crate) fn parse_function_call(&mut self, parent: NodeId) -> CompileResult<NodeId> {
        let name = self.advance()?;
        let loc = name.location();

        let decl = self.ast.lookup(parent, &name.text).ok_or_else(|| {
            CompileError::binding(format!("Cannot find a function: {}", name.text), loc)
        })?;
        let callee = self.ast.node(decl);
        if !matches!(callee.kind, NodeKind::Function | NodeKind::ImportFunc) {
            return Err(CompileError::binding(
                format!("'{}' is not a function", name.text),
                loc,
            ));
        }

        let return_type = callee.data_type;
        let param_types: Vec<DataType> = callee
            .children
            .first()
            .map(|&params| {
                self.ast
                    .children(params)
                    .iter()
                    .map(|&p| self.ast.node(p).data_type)
                    .collect()
            })
            .unwrap_or_default();

        let call = self.ast.add(
            parent,
            NodeKind::FunctionCall,
            NodeValue::Name(name.text.clone()),
            return_type,
            loc,
        );
        self.expect_punct("(", &format!("after '{}'", name.text))?;

        let mut count = 0;
        if !self.is_punct(0, ")") {
            loop {
                let Some(&param) = param_types.get(count) else {
                    return Err(CompileError::syntax(
                        format!(
                            "Function '{}' expects {} argument(s), found more",
                            name.text,
                            param_types.len()
                        ),
                        self.current_location(),
                    ));
                };
                self.parse_expression(call, param)?;
                count += 1;

                if self.is_punct(0, ",") {
                    self.skip(1);
                    continue;
                }
                break;
            }
        }

        if count < param_types.len() {
            return Err(CompileError::syntax(
                format!(
                    "Function '{}' expects {} argument(s), found {}",
                    name.text,
                    param_types.len(),
                    count
                ),
                self.current_location(),
            ));
        }
        self.expect_punct(")", &format!("after the arguments of '{}'", name.text))?;

        Ok(call)
    }

    /// Parse `name op expr (, name op expr)*`
    pub(crate) fn parse_assignments(&mut self, parent: NodeId) -> CompileResult<()> {
        loop {
            self.parse_assignment(parent)?;
            if !self.is_punct(0, ",") {
                return Ok(());
            }
            self.skip(1);
        }
    }

    /// Parse one assignment; `x op= e` becomes `x = x op (e)`
    fn parse_assignment(&mut self, parent: NodeId) -> CompileResult<()> {
        let name = self.expect_word("in assignment")?;
        let loc = name.location();

        let decl = self.ast.lookup(parent, &name.text).ok_or_else(|| {
            CompileError::binding(format!("Cannot find a variable: {}", name.text), loc)
        })?;
        let target = self.ast.node(decl);
        let (set_kind, get_kind) = match target.kind {
            NodeKind::GlobalVar => (NodeKind::GlobalSet, NodeKind::GlobalGet),
            NodeKind::LocalVar | NodeKind::Parameter => (NodeKind::LocalSet, NodeKind::LocalGet),
            NodeKind::GlobalConst | NodeKind::LocalConst => {
                return Err(CompileError::immutability(
                    format!("Cannot assign a value to constant '{}'", name.text),
                    loc,
                ))
            }
            NodeKind::ArrayAlloc => {
                return Err(CompileError::structure(
                    format!("Array '{}' must be indexed", name.text),
                    loc,
                ))
            }
            _ => {
                return Err(CompileError::binding(
                    format!("'{}' is not a variable", name.text),
                    loc,
                ))
            }
        };
        let data_type = target.data_type;

        let op = self
            .peek()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| (t.text.clone(), t.location()));
        let Some((op, op_loc)) = op else {
            return Err(CompileError::syntax(
                format!(
                    "Expected an assignment operator after '{}', found {}",
                    name.text,
                    self.found()
                ),
                self.current_location(),
            ));
        };

        let compound = match op.as_str() {
            "=" => None,
            "+=" | "-=" | "*=" | "/=" | "%=" => OpSymbol::from_binary(&op[..1]),
            _ => {
                return Err(CompileError::syntax(
                    format!("Unrecognised symbol in assignment: '{}'", op),
                    op_loc,
                ))
            }
        };
        self.skip(1);

        let set = self.ast.add(
            parent,
            set_kind,
            NodeValue::Name(name.text.clone()),
            data_type,
            loc,
        );

        match compound {
            None => {
                self.parse_expression(set, data_type)?;
            }
            Some(symbol) => {
                let expr = self.ast.add(
                    set,
                    NodeKind::Expression,
                    NodeValue::Empty,
                    data_type,
                    op_loc,
                );
                self.ast
                    .add(expr, get_kind, NodeValue::Name(name.text), data_type, loc);
                self.ast.add(
                    expr,
                    NodeKind::Operator,
                    NodeValue::Operator(symbol),
                    data_type,
                    op_loc,
                );
                self.parse_expression(expr, data_type)?;
            }
        }

        Ok(())
    }

    /// Resolves `token` to an array declaration, returning its name and element type
    pub(crate) fn resolve_array(
        &self,
        from: NodeId,
        token: &Token,
    ) -> CompileResult<(String, DataType)> {
        let decl = self.ast.lookup(from, &token.text).ok_or_else(|| {
            CompileError::binding(
                format!("Cannot find array: {}", token.text),
                token.location(),
            )
        })?;

        let node = self.ast.node(decl);
        if node.kind != NodeKind::ArrayAlloc {
            return Err(CompileError::structure(
                format!("'{}' is not an array", token.text),
                token.location(),
            ));
        }

        Ok((node.name().to_string(), node.data_type))
    }

    /// Parse `[index]` into an `arrayIndex` child of `owner`
    pub(crate) fn parse_array_index(&mut self, owner: NodeId, name: &str) -> CompileResult<()> {
        self.expect_punct("[", &format!("after '{}'", name))?;
        let index = self.ast.add(
            owner,
            NodeKind::ArrayIndex,
            NodeValue::Name(name.to_string()),
            DataType::I32,
            self.current_location(),
        );
        self.parse_expression(index, DataType::I32)?;
        self.expect_punct("]", &format!("after the index of '{}'", name))
    }
}

/// Parses integer literal digits, checking the range of `data_type`
fn parse_integer(
    digits: &str,
    negative: bool,
    data_type: DataType,
    token: &Token,
) -> CompileResult<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CompileError::syntax(
            format!("Malformed number: {}", token.text),
            token.location(),
        ));
    }

    let signed = if negative {
        format!("-{}", digits)
    } else {
        digits.to_string()
    };
    let value = signed.parse::<i64>().ok().filter(|&n| {
        data_type != DataType::I32 || i32::try_from(n).is_ok()
    });

    value.ok_or_else(|| {
        CompileError::type_error(
            format!("Number out of range for {}: {}", data_type, signed),
            token.location(),
        )
    })
}

#[cfg(test)]
mod tests {
    use crate::error::{CompileResult, ErrorKind};
    use crate::parser::ast::*;
    use crate::parser::lexer::tokenize;
    use crate::parser::parse::{parse, Parser};

    fn parse_source(source: &str) -> CompileResult<Ast> {
        parse(&tokenize(source)?)
    }

    /// Dump of the first statement of the first function
    fn first_statement(source: &str) -> String {
        statement(source, 0)
    }

    /// Dump of the `index`-th statement of the first function
    fn statement(source: &str, index: usize) -> String {
        let ast = parse_source(source).unwrap();
        let func = ast
            .children(Ast::ROOT)
            .iter()
            .copied()
            .find(|&id| ast.kind(id) == NodeKind::Function)
            .unwrap();
        let body = ast.children(func)[1];
        let stmt = ast.children(body)[index];

        let mut single = Ast::new();
        copy_subtree(&ast, stmt, &mut single, Ast::ROOT);
        single.to_string()
    }

    fn copy_subtree(from: &Ast, id: NodeId, to: &mut Ast, parent: NodeId) {
        let node = from.node(id);
        let copy = to.add(parent, node.kind, node.value.clone(), node.data_type, node.location);
        for &child in from.children(id) {
            copy_subtree(from, child, to, copy);
        }
    }

    #[test]
    fn test_literal_takes_context_type() {
        assert_eq!(
            first_statement("long bar = 0;\nvoid f() { bar = 5L; }"),
            "module\n    globalSet bar: i64\n        number 5: i64"
        );
        assert_eq!(
            first_statement("double bar = 0;\nvoid f() { bar = 2; }"),
            "module\n    globalSet bar: f64\n        number 2: f64"
        );
    }

    #[test]
    fn test_suffix_must_match_context() {
        let err = parse_source("int x = 0;\nvoid f() { x = 5L; }").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Type);
        assert_eq!(err.message, "Wrong data type. Expected i32, but got i64: 5L");
    }

    #[test]
    fn test_long_float_literal_needs_double() {
        let err = parse_source("float x = 3.14159265;").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Type);
        assert_eq!(
            err.message,
            "Wrong data type. Expected f32, but got f64: 3.14159265"
        );

        let err = parse_source("float x = 3.141592F;").unwrap_err();
        assert_eq!(err.message, "Losing precision in: 3.141592F");
    }

    #[test]
    fn test_integer_out_of_range() {
        let err = parse_source("int x = 3000000000;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);

        assert!(parse_source("long x = 3000000000;").is_ok());
        assert!(parse_source("int x = -2147483648;").is_ok());
    }

    #[test]
    fn test_compound_assignment_expands() {
        assert_eq!(
            first_statement("void f(int j) { j -= 1; }"),
            "module\n\
             \x20   localSet j: i32\n\
             \x20       operator -: i32\n\
             \x20           localGet j: i32\n\
             \x20           number 1: i32"
        );
    }

    #[test]
    fn test_cast_wraps_operand() {
        assert_eq!(
            first_statement("double foo = 0;\nvoid f(int a) { foo = (double) a + 1; }"),
            "module\n\
             \x20   globalSet foo: f64\n\
             \x20       operator +: f64\n\
             \x20           cast: f64\n\
             \x20               localGet a: i32\n\
             \x20           number 1: f64"
        );
    }

    #[test]
    fn test_negative_literal_and_prefix_operators() {
        assert_eq!(
            first_statement("int g(int a) { return -1 * -a; }"),
            "module\n\
             \x20   return: i32\n\
             \x20       operator *: i32\n\
             \x20           number -1: i32\n\
             \x20           operator -: i32\n\
             \x20               localGet a: i32"
        );
    }

    #[test]
    fn test_assignment_without_local_targets_global() {
        assert_eq!(
            first_statement("double bar = 0;\nvoid foo() { bar = 3.14; }"),
            "module\n    globalSet bar: f64\n        number 3.14: f64"
        );
    }

    #[test]
    fn test_body_local_shadows_global() {
        let source = "double bar = 0;\nint foo() { int bar; bar = 3; return bar; }";

        assert_eq!(
            statement(source, 1),
            "module\n    localSet bar: i32\n        number 3: i32"
        );
        assert_eq!(
            statement(source, 2),
            "module\n    return: i32\n        localGet bar: i32"
        );
    }

    #[test]
    fn test_parameter_shadows_global() {
        let source = "long n = 0;\nint foo(int n) { n = 1; return n; }";

        assert_eq!(
            statement(source, 0),
            "module\n    localSet n: i32\n        number 1: i32"
        );
        assert_eq!(
            statement(source, 1),
            "module\n    return: i32\n        localGet n: i32"
        );
    }

    #[test]
    fn test_call_argument_count() {
        let source = "int sub(int a, int b) { return a - b; }\nint f() { return sub(1); }";
        let err = parse_source(source).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.message, "Function 'sub' expects 2 argument(s), found 1");
    }

    #[test]
    fn test_call_arguments_take_parameter_types() {
        let source = "void foo(double a, long b) {}\nvoid f() { foo(1, 2); }";
        let ast = parse_source(source).unwrap();
        let f = ast.children(Ast::ROOT)[1];
        let call = ast.children(ast.children(f)[1])[0];
        let types: Vec<_> = ast
            .children(call)
            .iter()
            .map(|&a| ast.node(a).data_type)
            .collect();

        assert_eq!(types, vec![DataType::F64, DataType::I64]);
    }

    #[test]
    fn test_unknown_names() {
        let err = parse_source("void f() { x = 1; }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Binding);

        let err = parse_source("void f() { g(); }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Binding);
        assert_eq!(err.message, "Cannot find a function: g");

        let err = parse_source("int x = 1;\nvoid f() { x(); }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Binding);
    }

    #[test]
    fn test_indexing_a_scalar() {
        let err = parse_source("int x = 1;\nint f() { return x[0]; }").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Structure);
        assert_eq!((err.location.line, err.location.column), (2, 18));
    }

    #[test]
    fn test_parser_from_source() {
        let ast = Parser::from_source("int x = 1;")
            .unwrap()
            .parse_module()
            .unwrap();

        assert_eq!(ast.children(Ast::ROOT).len(), 1);
    }
}
