//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure:
//! token lookahead helpers, `expect_*` helpers that produce positioned
//! errors, and the [`parse`] entry point.
//!
//! # Parser Architecture
//!
//! The Parser is a single-pass recursive descent parser organised as:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: module-level items (globals, arrays, functions, pragmas)
//! - `statements`: statements and blocks inside function bodies
//! - `expressions`: flat expression chains, literals, calls and assignments
//! - `scope`: identifier lookup through the enclosing nodes
//!
//! Expressions are collected as flat operand/operator lists while parsing;
//! [`super::precedence::resolve`] folds them into trees once the whole module
//! has been read.
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::error::{CompileError, CompileResult};
use crate::parser::ast::*;
use crate::parser::lexer::{self, Token, TokenKind};
use crate::parser::precedence;
use rustc_hash::FxHashSet;

/// Parses a token stream into a precedence-resolved module AST
pub fn parse(tokens: &[Token]) -> CompileResult<Ast> {
    let mut ast = Parser::new(tokens).parse_module()?;
    precedence::resolve(&mut ast)?;
    Ok(ast)
}

/// Recursive descent parser for Cinonim
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) ast: Ast,
    /// Names declared at module level
    pub(crate) module_names: FxHashSet<String>,
    /// Parameters and locals of the function being parsed
    pub(crate) local_names: FxHashSet<String>,
}

impl Parser {
    /// Creates a parser over `tokens`; space, eol and comment tokens are skipped
    pub fn new(tokens: &[Token]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .filter(|t| !t.kind.is_trivia())
                .cloned()
                .collect(),
            position: 0,
            ast: Ast::new(),
            module_names: FxHashSet::default(),
            local_names: FxHashSet::default(),
        }
    }

    pub fn from_source(source: &str) -> CompileResult<Self> {
        let tokens = lexer::tokenize(source)?;
        Ok(Self::new(&tokens))
    }

    /// Parse the entire module (top-level declarations)
    pub fn parse_module(mut self) -> CompileResult<Ast> {
        while !self.is_at_end() {
            self.parse_module_item()?;
        }

        Ok(self.ast)
    }

    // ===== Helper methods =====

    pub(crate) fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    /// Consumes the current token
    pub(crate) fn advance(&mut self) -> CompileResult<Token> {
        match self.tokens.get(self.position) {
            Some(token) => {
                self.position += 1;
                Ok(token.clone())
            }
            None => Err(self.unexpected_end()),
        }
    }

    pub(crate) fn skip(&mut self, n: usize) {
        self.position = (self.position + n).min(self.tokens.len());
    }

    /// Location of the current token, or of the last one at end of input
    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(Token::location)
            .unwrap_or_else(|| SourceLocation::new(1, 1))
    }

    /// Human-readable description of the current token
    pub(crate) fn found(&self) -> String {
        match self.peek() {
            Some(token) => token.to_string(),
            None => "end of input".to_string(),
        }
    }

    pub(crate) fn unexpected_end(&self) -> CompileError {
        CompileError::syntax("Unexpected end of input", self.current_location())
    }

    pub(crate) fn is_punct(&self, n: usize, text: &str) -> bool {
        self.peek_ahead(n)
            .is_some_and(|t| t.is(TokenKind::Punctuation, text))
    }

    pub(crate) fn is_operator(&self, n: usize, text: &str) -> bool {
        self.peek_ahead(n).is_some_and(|t| t.is(TokenKind::Operator, text))
    }

    pub(crate) fn is_keyword(&self, n: usize, text: &str) -> bool {
        self.peek_ahead(n).is_some_and(|t| t.is(TokenKind::Keyword, text))
    }

    pub(crate) fn is_word(&self, n: usize) -> bool {
        self.peek_ahead(n).is_some_and(|t| t.kind == TokenKind::Word)
    }

    pub(crate) fn is_number(&self, n: usize) -> bool {
        self.peek_ahead(n).is_some_and(|t| t.kind == TokenKind::Number)
    }

    pub(crate) fn is_data_type(&self, n: usize) -> bool {
        self.peek_ahead(n).is_some_and(|t| {
            t.kind == TokenKind::Keyword && DataType::from_keyword(&t.text).is_some()
        })
    }

    pub(crate) fn is_pragma(&self, n: usize, name: &str) -> bool {
        self.peek_ahead(n).is_some_and(|t| t.is(TokenKind::Pragma, name))
    }

    pub(crate) fn expect_punct(&mut self, text: &str, ctx: &str) -> CompileResult<()> {
        if self.is_punct(0, text) {
            self.position += 1;
            Ok(())
        } else {
            Err(CompileError::syntax(
                format!("Expected '{}' {}, found {}", text, ctx, self.found()),
                self.current_location(),
            ))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str, ctx: &str) -> CompileResult<()> {
        if self.is_keyword(0, keyword) {
            self.position += 1;
            Ok(())
        } else {
            Err(CompileError::syntax(
                format!("Expected '{}' {}, found {}", keyword, ctx, self.found()),
                self.current_location(),
            ))
        }
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> CompileResult<()> {
        self.expect_punct(";", ctx)
    }

    pub(crate) fn expect_word(&mut self, ctx: &str) -> CompileResult<Token> {
        if self.is_word(0) {
            self.advance()
        } else {
            Err(CompileError::syntax(
                format!("Expected identifier {}, found {}", ctx, self.found()),
                self.current_location(),
            ))
        }
    }

    pub(crate) fn expect_data_type(&mut self, ctx: &str) -> CompileResult<DataType> {
        let data_type = self
            .peek()
            .filter(|t| t.kind == TokenKind::Keyword)
            .and_then(|t| DataType::from_keyword(&t.text));

        match data_type {
            Some(data_type) => {
                self.position += 1;
                Ok(data_type)
            }
            None => Err(CompileError::syntax(
                format!("Expected a type {}, found {}", ctx, self.found()),
                self.current_location(),
            )),
        }
    }

    /// Rejects `void` for anything that holds a value
    pub(crate) fn require_value_type(
        &self,
        data_type: DataType,
        name: &str,
        location: SourceLocation,
    ) -> CompileResult<()> {
        if data_type.is_value() {
            Ok(())
        } else {
            Err(CompileError::type_error(
                format!("'{}' cannot have type {}", name, data_type),
                location,
            ))
        }
    }

    /// Records a module-level name, rejecting duplicates
    pub(crate) fn declare_global(&mut self, token: &Token) -> CompileResult<()> {
        if self.module_names.insert(token.text.clone()) {
            Ok(())
        } else {
            Err(CompileError::binding(
                format!("'{}' is already declared in this module", token.text),
                token.location(),
            ))
        }
    }

    /// Records a parameter or local name, rejecting duplicates
    pub(crate) fn declare_local(&mut self, token: &Token) -> CompileResult<()> {
        if self.local_names.insert(token.text.clone()) {
            Ok(())
        } else {
            Err(CompileError::binding(
                format!("'{}' is already declared in this function", token.text),
                token.location(),
            ))
        }
    }
}
