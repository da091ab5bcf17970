//! Cinonim front end
//!
//! This module transforms Cinonim source into a resolved Abstract Syntax Tree:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parsing with scope and literal type resolution (tokens → AST)
//! - [`precedence`]: Folding flat expressions into operator trees
//! - [`ast`]: Arena AST definitions
//!
//! # Language
//!
//! - Types: `int` (i32), `long` (i64), `float` (f32), `double` (f64), `void`
//! - Module items: globals, constants, static arrays, functions,
//!   `#import-func` and `#export-func` pragmas
//! - Statements: local declarations, assignments, calls, `if`/`else`,
//!   `while`, `do`/`while`, `for`, `break`/`continue` with a loop index, `return`
//! - Expressions: arithmetic, shifts, comparison, logical, unary `-` and `!`,
//!   explicit casts `(type) x`
//! - No implicit conversions: every mixed-type operation needs a cast
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser over a filtered token stream, with a
//! separate shunting-yard pass for operator precedence.
//! No external parser generator dependencies.

pub mod ast;
pub mod declarations;
pub mod expressions;
pub mod lexer;
pub mod parse;
pub mod precedence;
pub mod scope;
pub mod statements;

pub use parse::{parse, Parser};
