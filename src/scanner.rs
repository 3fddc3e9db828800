//! Byte-level lexer turning Lox source into [`Token`]s.
//!
//! [`Scanner`] is a fused iterator of `Result<Token>`.  A bad character or an
//! unterminated string is yielded as an `Err` item and scanning resumes right
//! after it, so a single pass reports every lexical error.  The stream always
//! ends with exactly one `EOF` token.
//!
//! ```rust
//! use loxwalk::scanner::Scanner;
//!
//! let (tokens, errors) = Scanner::new("print 123; // example").scan_all();
//! assert_eq!(tokens.len(), 4);
//! assert!(errors.is_empty());
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Cursor over one source text.
pub struct Scanner<'a> {
    text: &'a str,
    src: &'a [u8],
    /// First byte of the lexeme being scanned.
    start: usize,
    curr: usize,
    line: usize,
    /// Kind of the lexeme just scanned, if it forms a token.
    pending: Option<TokenType>,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        info!("Scanner created over {} bytes", text.len());

        Self {
            text,
            src: text.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    /// Drains the scanner, splitting tokens (ending with `EOF`) from errors.
    pub fn scan_all(self) -> (Vec<Token>, Vec<LoxError>) {
        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: Vec<LoxError> = Vec::new();

        for item in self {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        info!(
            "Scanned {} token(s) with {} error(s)",
            tokens.len(),
            errors.len()
        );

        (tokens, errors)
    }

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Consumes the current byte.  Only called while input remains.
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let byte: u8 = self.src[self.curr];
        self.curr += 1;
        byte
    }

    /// Current byte, `0` once the input is exhausted.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.src.get(self.curr).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        self.src.get(self.curr + 1).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        let matched: bool = !self.is_at_end() && self.peek() == expected;

        if matched {
            self.curr += 1;
        }

        matched
    }

    /// `matched` when the next byte is `next` (consuming it), else `single`.
    #[inline(always)]
    fn either(&mut self, next: u8, matched: TokenType, single: TokenType) -> TokenType {
        if self.match_byte(next) {
            matched
        } else {
            single
        }
    }

    #[inline(always)]
    fn slice(&self, from: usize, to: usize) -> &'a str {
        &self.text[from..to]
    }

    /// Consumes one lexeme.  Leaves its kind in `pending`, or `None` for
    /// whitespace and comments.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            b'(' => self.pending = Some(TokenType::LEFT_PAREN),
            b')' => self.pending = Some(TokenType::RIGHT_PAREN),
            b'{' => self.pending = Some(TokenType::LEFT_BRACE),
            b'}' => self.pending = Some(TokenType::RIGHT_BRACE),
            b',' => self.pending = Some(TokenType::COMMA),
            b'.' => self.pending = Some(TokenType::DOT),
            b'-' => self.pending = Some(TokenType::MINUS),
            b'+' => self.pending = Some(TokenType::PLUS),
            b';' => self.pending = Some(TokenType::SEMICOLON),
            b'*' => self.pending = Some(TokenType::STAR),

            b'!' => self.pending = Some(self.either(b'=', TokenType::BANG_EQUAL, TokenType::BANG)),
            b'=' => self.pending = Some(self.either(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL)),
            b'<' => self.pending = Some(self.either(b'=', TokenType::LESS_EQUAL, TokenType::LESS)),
            b'>' => {
                self.pending = Some(self.either(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER))
            }

            b' ' | b'\r' | b'\t' => {}

            b'\n' => self.line += 1,

            b'/' => {
                if self.match_byte(b'/') {
                    // Stop before the newline; it still counts as a line.
                    self.curr = memchr(b'\n', &self.src[self.curr..])
                        .map_or(self.len(), |pos| self.curr + pos);

                    return Ok(());
                }

                self.pending = Some(TokenType::SLASH);
            }

            b'"' => return self.parse_string(),

            b'0'..=b'9' => self.parse_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            _ => {
                // Swallow the continuation bytes of a multi‑byte character
                // so it is reported once and slicing stays on char boundaries.
                while !self.is_at_end() && (self.peek() & 0xC0) == 0x80 {
                    self.advance();
                }

                debug!(
                    "Unexpected character {:?} on line {}",
                    self.slice(self.start, self.curr),
                    self.line
                );

                return Err(LoxError::lex(self.line, "Unexpected character."));
            }
        }

        Ok(())
    }

    /// String literal; may span lines.  The token keeps the quotes in its
    /// lexeme and the bare contents in its payload.
    fn parse_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        let s: &str = self.slice(self.start + 1, self.curr - 1);

        self.pending = Some(TokenType::STRING(s.to_owned()));

        Ok(())
    }

    fn skip_digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
    }

    /// `123` or `3.14`; a `.` only belongs to the number when a digit follows.
    fn parse_number(&mut self) {
        self.skip_digits();

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            self.skip_digits();
        }

        let value: f64 = self
            .slice(self.start, self.curr)
            .parse::<f64>()
            .unwrap_or(0.0); // ASCII digits always parse

        self.pending = Some(TokenType::NUMBER(value));
    }

    fn parse_identifier(&mut self) {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.advance();
        }

        let word: &[u8] = &self.src[self.start..self.curr];

        self.pending = Some(
            KEYWORDS
                .get(word)
                .cloned()
                .unwrap_or(TokenType::IDENTIFIER),
        );
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        // `curr` steps one past the end once EOF has been handed out.
        while self.curr < self.len() {
            self.start = self.curr;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(kind) = self.pending.take() {
                let lexeme: &str = self.slice(self.start, self.curr);

                return Some(Ok(Token::new(kind, lexeme, self.line)));
            }
        }

        if self.curr == self.len() {
            self.curr += 1;

            return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
