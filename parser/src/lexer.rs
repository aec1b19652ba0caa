//! Tokenizer for ASDL source.
//!
//! Comments (`--` to end of line) and whitespace are skipped. Every token
//! carries the 1-based line and column it starts at.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::SyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Name(String),
    String(String),
    Equals,
    Pipe,
    Comma,
    Question,
    Star,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name `{name}`"),
            Self::String(value) => write!(f, "string {value:?}"),
            Self::Equals => f.write_str("`=`"),
            Self::Pipe => f.write_str("`|`"),
            Self::Comma => f.write_str("`,`"),
            Self::Question => f.write_str("`?`"),
            Self::Star => f.write_str("`*`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
            Self::LBrace => f.write_str("`{`"),
            Self::RBrace => f.write_str("`}`"),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer<'src> {
    chars: Peekable<Chars<'src>>,
    filename: &'src str,
    line: usize,
    column: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, filename: &'src str) -> Self {
        Self {
            chars: source.chars().peekable(),
            filename,
            line: 1,
            column: 1,
        }
    }

    /// Tokenizes the whole input; the last token is always [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia();
            let (line, column) = (self.line, self.column);
            let Some(ch) = self.bump() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line,
                    column,
                });
                return Ok(tokens);
            };

            let kind = match ch {
                '=' => TokenKind::Equals,
                '|' => TokenKind::Pipe,
                ',' => TokenKind::Comma,
                '?' => TokenKind::Question,
                '*' => TokenKind::Star,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '"' | '\'' => TokenKind::String(self.string(ch, line, column)?),
                c if is_name_start(c) => {
                    let mut name = String::from(c);
                    while let Some(&next) = self.chars.peek() {
                        if !is_name_continue(next) {
                            break;
                        }
                        name.push(next);
                        self.bump();
                    }
                    TokenKind::Name(name)
                }
                other => {
                    return Err(SyntaxError::new(
                        self.filename,
                        line,
                        column,
                        format!("unexpected character {other:?}"),
                    ));
                }
            };
            tokens.push(Token { kind, line, column });
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Skips whitespace and `--` comments.
    fn skip_trivia(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.bump();
                continue;
            }
            if ch == '-' && self.chars.clone().nth(1) == Some('-') {
                while let Some(&next) = self.chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    self.bump();
                }
                continue;
            }
            break;
        }
    }

    fn string(&mut self, quote: char, line: usize, column: usize) -> Result<String, SyntaxError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => break,
                },
                Some('\n') | None => break,
                Some(ch) => value.push(ch),
            }
        }
        Err(SyntaxError::new(
            self.filename,
            line,
            column,
            "unterminated string literal",
        ))
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
