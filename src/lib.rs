//! # Introduction
//!
//! Cinonim compiles a small, explicitly typed C-like language into
//! WebAssembly text (WAT). Compilation is a pure function of the token
//! stream: no I/O, no global state, and the first error aborts the run.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser → flat AST → Precedence → AST → Generator → WAT
//! ```
//!
//! 1. [`parser::lexer`] splits the source into tokens.
//! 2. [`parser`] builds an arena AST, resolving every name against its scope
//!    chain and typing every literal from its context. Expressions stay flat
//!    lists of operands and operators.
//! 3. [`parser::precedence`] folds each flat expression into an operator tree.
//! 4. [`codegen`] lowers the tree into WAT, checking that every value has the
//!    type its consumer expects.
//!
//! ## Example
//!
//! ```
//! let wat = cinonim::compile_source("int add(int a, int b) { return a + b; }").unwrap();
//!
//! assert_eq!(
//!     wat,
//!     "(module\n    (func $add (param $a i32) (param $b i32) (result i32)\n        \
//!      (local.get $a) (local.get $b) (i32.add)\n    )\n)"
//! );
//! ```

pub mod codegen;
pub mod error;
pub mod parser;

use error::CompileResult;
use parser::lexer::{tokenize, Token};

/// Compiles a token stream into WAT text
///
/// Trivia tokens (spaces, line ends and comments) are ignored.
pub fn compile(tokens: &[Token]) -> CompileResult<String> {
    let ast = parser::parse(tokens)?;
    codegen::generate(&ast)
}

/// Tokenizes `source` with the bundled lexer, then [`compile`]s it
pub fn compile_source(source: &str) -> CompileResult<String> {
    compile(&tokenize(source)?)
}
