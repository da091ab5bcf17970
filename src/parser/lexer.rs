//! Lexer (tokenizer) for Cinonim source code
//!
//! Converts raw source text into a flat [`Token`] stream. [`Lexer::split`]
//! keeps every token, including whitespace, line ends and comments, so that
//! [`stringify`] can rebuild the exact source. [`tokenize`] drops those
//! trivia tokens and is what the parser consumes.

use super::ast::SourceLocation;
use crate::error::{CompileError, CompileResult};
use std::fmt;

/// Closed set of token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Character,
    Comment,
    Eol,
    Number,
    Operator,
    Pragma,
    Punctuation,
    Space,
    String,
    Word,
    Keyword,
}

impl TokenKind {
    /// Kinds that carry no meaning for the parser
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Space | TokenKind::Eol | TokenKind::Comment)
    }
}

pub const KEYWORDS: &[&str] = &[
    "break", "const", "continue", "do", "double", "else", "float", "for", "if", "int", "long",
    "return", "void", "while",
];

const PUNCTUATION: &[char] = &['(', ')', '{', '}', '[', ']', ',', ';'];

// Longest first so that `<=` wins over `<`
const OPERATORS: &[&str] = &[
    "++", "--", "==", "<=", ">=", "!=", "+=", "-=", "*=", "/=", "%=", "&&", "||", "<<", ">>", "**",
    "!", "%", "&", "*", "+", "-", ".", "/", ":", "<", "=", ">", "?", "^",
];

/// A token with its 1-based source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub line: usize,
    pub column: usize,
    pub kind: TokenKind,
    /// Token text; quotes and the pragma `#` are not included
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            line: location.line,
            column: location.column,
            kind,
            text: text.into(),
        }
    }

    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Number => write!(f, "number {}", self.text),
            TokenKind::Word => write!(f, "identifier '{}'", self.text),
            TokenKind::Keyword => write!(f, "keyword '{}'", self.text),
            TokenKind::Pragma => write!(f, "pragma '#{}'", self.text),
            TokenKind::String => write!(f, "string literal \"{}\"", self.text),
            TokenKind::Character => write!(f, "character literal '{}'", self.text),
            TokenKind::Eol => write!(f, "end of line"),
            TokenKind::Space => write!(f, "whitespace"),
            TokenKind::Comment => write!(f, "comment"),
            TokenKind::Operator | TokenKind::Punctuation => write!(f, "'{}'", self.text),
        }
    }
}

/// Lexer for Cinonim source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Splits the entire input into tokens, trivia included
    pub fn split(&mut self) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            let token = match ch {
                '"' => self.quoted('"', TokenKind::String)?,
                '\'' => self.quoted('\'', TokenKind::Character)?,
                '#' => self.pragma(),
                '/' if self.peek_ahead(1) == Some('/') => self.line_comment(),
                '/' if self.peek_ahead(1) == Some('*') => self.block_comment()?,
                ' ' | '\t' => self.run(TokenKind::Space, |c| c == ' ' || c == '\t'),
                '\r' | '\n' => self.run(TokenKind::Eol, |c| c == '\r' || c == '\n'),
                '0'..='9' => self.run(TokenKind::Number, |c| {
                    c.is_ascii_digit() || matches!(c, '.' | 'L' | 'D' | 'F')
                }),
                'a'..='z' | 'A'..='Z' | '_' => self.word(),
                _ => self.symbol()?,
            };
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Consumes a run of characters accepted by `accept`
    fn run(&mut self, kind: TokenKind, accept: impl Fn(char) -> bool) -> Token {
        let loc = self.current_location();
        let mut text = String::new();

        while let Some(ch) = self.peek() {
            if !accept(ch) {
                break;
            }
            text.push(ch);
            self.advance();
        }

        Token::new(kind, text, loc)
    }

    /// Parse identifier or keyword
    fn word(&mut self) -> Token {
        let mut token = self.run(TokenKind::Word, |c| c.is_ascii_alphanumeric() || c == '_');
        if KEYWORDS.contains(&token.text.as_str()) {
            token.kind = TokenKind::Keyword;
        }
        token
    }

    /// Parse a string or character literal; the text keeps escapes verbatim
    fn quoted(&mut self, quote: char, kind: TokenKind) -> CompileResult<Token> {
        let loc = self.current_location();
        self.advance(); // opening quote
        let mut text = String::new();

        loop {
            match self.advance() {
                Some(ch) if ch == quote => return Ok(Token::new(kind, text, loc)),
                Some('\\') => {
                    text.push('\\');
                    if let Some(escaped) = self.advance() {
                        text.push(escaped);
                    }
                }
                Some('\n') | None => {
                    let what = if kind == TokenKind::String {
                        "string"
                    } else {
                        "character"
                    };
                    return Err(CompileError::lexical(
                        format!("Unterminated {} literal", what),
                        loc,
                    ));
                }
                Some(ch) => text.push(ch),
            }
        }
    }

    /// Pragma: `#name`, the name runs up to the next whitespace
    fn pragma(&mut self) -> Token {
        let loc = self.current_location();
        self.advance(); // '#'
        let mut token = self.run(TokenKind::Pragma, |c| !c.is_whitespace());
        token.line = loc.line;
        token.column = loc.column;
        token
    }

    /// Single-line comment (// ...), the line end is left for an eol token
    fn line_comment(&mut self) -> Token {
        self.run(TokenKind::Comment, |c| c != '\n' && c != '\r')
    }

    /// Multi-line comment (/* ... */)
    fn block_comment(&mut self) -> CompileResult<Token> {
        let loc = self.current_location();
        let mut text = String::new();

        while let Some(ch) = self.advance() {
            text.push(ch);
            if text.len() > 3 && text.ends_with("*/") {
                return Ok(Token::new(TokenKind::Comment, text, loc));
            }
        }

        Err(CompileError::lexical("Unterminated block comment", loc))
    }

    /// Operators and punctuation
    fn symbol(&mut self) -> CompileResult<Token> {
        let loc = self.current_location();
        let ch = self.peek().unwrap_or_default();

        if PUNCTUATION.contains(&ch) {
            self.advance();
            return Ok(Token::new(TokenKind::Punctuation, ch.to_string(), loc));
        }

        for op in OPERATORS {
            if self.lookahead_is(op) {
                for _ in 0..op.len() {
                    self.advance();
                }
                return Ok(Token::new(TokenKind::Operator, *op, loc));
            }
        }

        Err(CompileError::lexical(
            format!("Unexpected character: '{}'", ch),
            loc,
        ))
    }

    fn lookahead_is(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_ahead(i) == Some(c))
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else if ch != '\r' {
            self.column += 1;
        }

        Some(ch)
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Tokenizes source code, dropping spaces, line ends and comments
pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    let tokens = Lexer::new(source).split()?;
    Ok(tokens.into_iter().filter(|t| !t.kind.is_trivia()).collect())
}

/// Rebuilds source text from an unfiltered token list
pub fn stringify(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| match t.kind {
            TokenKind::String => format!("\"{}\"", t.text),
            TokenKind::Character => format!("'{}'", t.text),
            TokenKind::Pragma => format!("#{}", t.text),
            _ => t.text.clone(),
        })
        .collect()
}
