use std::iter::FusedIterator;

use log::{debug, info};
use phf::phf_map;

use crate::error::LoxError;
use crate::token::{Literal, Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and" => TokenType::AND,
    b"class" => TokenType::CLASS,
    b"else" => TokenType::ELSE,
    b"false" => TokenType::FALSE,
    b"fun" => TokenType::FUN,
    b"for" => TokenType::FOR,
    b"if" => TokenType::IF,
    b"nil" => TokenType::NIL,
    b"or" => TokenType::OR,
    b"print" => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super" => TokenType::SUPER,
    b"this" => TokenType::THIS,
    b"true" => TokenType::TRUE,
    b"var" => TokenType::VAR,
    b"while" => TokenType::WHILE,
};

/// Lexer over Lox source text.
///
/// Yields `Result<Token, LoxError>` items; a lexical error does not stop the
/// stream, so callers can partition tokens from errors and decide whether to
/// continue. The stream always ends with a synthetic `EOF` token.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    start: usize,
    current: usize,
    line: usize,
    pending: Option<(TokenType, Literal)>,
    eof_emitted: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        info!("Initializing Scanner with {} bytes of source", source.len());

        Self {
            source,
            bytes: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
            pending: None,
            eof_emitted: false,
        }
    }

    fn scan_token(&mut self) -> Result<(), LoxError> {
        let byte: u8 = self.advance();

        match byte {
            b'(' => self.add_token(TokenType::LEFT_PAREN),

            b')' => self.add_token(TokenType::RIGHT_PAREN),

            b'{' => self.add_token(TokenType::LEFT_BRACE),

            b'}' => self.add_token(TokenType::RIGHT_BRACE),

            b',' => self.add_token(TokenType::COMMA),

            b'.' => self.add_token(TokenType::DOT),

            b'-' => self.add_token(TokenType::MINUS),

            b'+' => self.add_token(TokenType::PLUS),

            b';' => self.add_token(TokenType::SEMICOLON),

            b'*' => self.add_token(TokenType::STAR),

            b'!' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };
                self.add_token(token_type);
            }

            b'=' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };
                self.add_token(token_type);
            }

            b'<' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };
                self.add_token(token_type);
            }

            b'>' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };
                self.add_token(token_type);
            }

            b' ' | b'\r' | b'\t' => {
                debug!("Skipping whitespace");
            }

            b'\n' => {
                self.line += 1;
            }

            b'/' => {
                if self.match_byte(b'/') {
                    debug!("Found comment, skipping until newline");
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::SLASH);
                }
            }

            b'"' => {
                self.parse_string()?;
            }

            b'0'..=b'9' => {
                self.parse_number();
            }

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            _ => {
                debug!(
                    "Unexpected character '{}' at line {}",
                    byte as char, self.line
                );

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character \"{}\"", byte as char),
                ));
            }
        }

        Ok(())
    }

    fn parse_string(&mut self) -> Result<(), LoxError> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            debug!("Unterminated string at line {}", self.line);

            return Err(LoxError::lex(
                self.line,
                "Expected string closing quote \" but found none",
            ));
        }

        // Consume the closing quote.
        self.advance();

        let content: &str = &self.source[self.start + 1..self.current - 1];

        info!("Parsed string literal: {}", content);

        self.add_literal(TokenType::STRING, Literal::Str(content.to_string()));

        Ok(())
    }

    fn parse_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A trailing '.' is not part of the number; it comes back as its own
        // DOT token on the next iteration.
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: &str = &self.source[self.start..self.current];
        let number: f64 = text.parse().unwrap_or(0.0);

        info!("Parsed number: {}", number);

        self.add_literal(TokenType::NUMBER, Literal::Number(number));
    }

    fn parse_identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }

        let text: &str = &self.source[self.start..self.current];

        match KEYWORDS.get(text.as_bytes()) {
            Some(token_type) => {
                info!("Parsed keyword: {}", text);

                self.add_token(*token_type);
            }

            None => {
                info!("Parsed identifier: {}", text);

                self.add_literal(TokenType::IDENTIFIER, Literal::Str(text.to_string()));
            }
        }
    }

    #[inline]
    fn add_token(&mut self, token_type: TokenType) {
        self.pending = Some((token_type, Literal::None));
    }

    #[inline]
    fn add_literal(&mut self, token_type: TokenType, literal: Literal) {
        self.pending = Some((token_type, literal));
    }

    #[inline]
    fn advance(&mut self) -> u8 {
        let byte: u8 = self.bytes[self.current];

        self.current += 1;

        byte
    }

    #[inline]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.bytes[self.current] != expected {
            false
        } else {
            self.current += 1;

            true
        }
    }

    #[inline]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.bytes[self.current]
        }
    }

    #[inline]
    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.bytes.len() {
            0
        } else {
            self.bytes[self.current + 1]
        }
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token, LoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.is_at_end() {
            self.pending = None;
            self.start = self.current;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some((token_type, literal)) = self.pending.take() {
                let lexeme: &str = &self.source[self.start..self.current];

                debug!(
                    "Emitting token: type={:?}, lexeme={}, line={}",
                    token_type, lexeme, self.line
                );

                return Some(Ok(Token::new(
                    token_type,
                    lexeme.to_string(),
                    literal,
                    self.line,
                )));
            }

            // Whitespace or comment: keep scanning.
        }

        if !self.eof_emitted {
            self.eof_emitted = true;

            info!("Reached EOF at line {}", self.line);

            return Some(Ok(Token::new(
                TokenType::EOF,
                String::new(),
                Literal::None,
                self.line,
            )));
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
