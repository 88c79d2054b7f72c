//! Streaming tokenizer for `.isa` instruction description files.

use std::path::PathBuf;

use crate::isa::diagnostic::{
    DiagnosticLevel,
    DiagnosticPhase,
    IsaDiagnostic,
    SourcePosition,
    SourceSpan,
};
use crate::isa::error::IsaError;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Colon,
    Identifier,
    Number,
    String,
    LBrace,
    RBrace,
    Equals,
    Comma,
    Semicolon,
    EOF,
}

impl TokenKind {
    fn punctuation(ch: char) -> Option<Self> {
        Some(match ch {
            ':' => TokenKind::Colon,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '=' => TokenKind::Equals,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            _ => return None,
        })
    }
}

pub struct Lexer<'src> {
    src: &'src str,
    path: PathBuf,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str, path: PathBuf) -> Self {
        Self {
            src,
            path,
            offset: 0,
            line: 1,
            column: 0,
        }
    }

    /// Produces the next token, or `EOF` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Token, IsaError> {
        self.skip_trivia();
        let start = self.offset;
        let (line, column) = self.position();
        let Some(ch) = self.first() else {
            return Ok(self.token_since(TokenKind::EOF, start, line, column));
        };

        if let Some(kind) = TokenKind::punctuation(ch) {
            self.bump();
            return Ok(self.token_since(kind, start, line, column));
        }
        match ch {
            '"' => self.string(line, column),
            // Lexed so the parser can reject it with a literal diagnostic.
            '-' if self.second().is_some_and(|next| next.is_ascii_digit()) => {
                self.bump();
                self.number(start, line, column)
            }
            ch if ch.is_ascii_digit() => self.number(start, line, column),
            ch if is_ident_start(ch) => {
                self.eat_while(is_ident_part);
                Ok(self.token_since(TokenKind::Identifier, start, line, column))
            }
            _ => {
                let err = self.error_at(
                    "lexer.unexpected-char",
                    format!("unexpected character '{ch}'"),
                    line,
                    column,
                );
                self.bump();
                Err(err)
            }
        }
    }

    /// Scans digits in the radix selected by an optional `0x`/`0b`/`0o` prefix. Underscores
    /// separate digit groups.
    fn number(&mut self, start: usize, line: usize, column: usize) -> Result<Token, IsaError> {
        let radix = match (self.first(), self.second()) {
            (Some('0'), Some('x' | 'X')) => 16,
            (Some('0'), Some('b' | 'B')) => 2,
            (Some('0'), Some('o' | 'O')) => 8,
            _ => 10,
        };
        if radix != 10 {
            self.bump();
            self.bump();
        }

        let mut digits = 0usize;
        self.eat_while(|ch| {
            let digit = ch.is_digit(radix);
            digits += usize::from(digit);
            digit || ch == '_'
        });

        if digits == 0 {
            return Err(self.error_at(
                "lexer.number.missing-digits",
                "numeric literal requires digits after prefix",
                line,
                column,
            ));
        }
        if self.first().is_some_and(is_ident_start) {
            let (line, column) = self.position();
            return Err(self.error_at(
                "lexer.number.trailing",
                "numeric literal runs into an identifier",
                line,
                column,
            ));
        }
        Ok(self.token_since(TokenKind::Number, start, line, column))
    }

    /// Quoted text on a single line. The lexeme holds the unescaped contents.
    fn string(&mut self, line: usize, column: usize) -> Result<Token, IsaError> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.first() {
                Some('"') => {
                    self.bump();
                    return Ok(Token {
                        kind: TokenKind::String,
                        lexeme: text,
                        line,
                        column,
                    });
                }
                Some('\\') => {
                    self.bump();
                    match self.first() {
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some('\n') | None => break,
                        Some(other) => text.push(other),
                    }
                    self.bump();
                }
                Some('\n') | None => break,
                Some(other) => {
                    text.push(other);
                    self.bump();
                }
            }
        }
        Err(self.error_at(
            "lexer.string.unterminated",
            "unterminated string literal",
            line,
            column,
        ))
    }

    fn skip_trivia(&mut self) {
        loop {
            self.eat_while(char::is_whitespace);
            if self.first() != Some('#') {
                break;
            }
            self.eat_while(|ch| ch != '\n');
        }
    }

    fn first(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn second(&self) -> Option<char> {
        self.src[self.offset..].chars().nth(1)
    }

    fn bump(&mut self) {
        let Some(ch) = self.first() else {
            return;
        };
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while self.first().is_some_and(&mut predicate) {
            self.bump();
        }
    }

    fn position(&self) -> (usize, usize) {
        (self.line, self.column + 1)
    }

    fn token_since(&self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token {
        Token {
            kind,
            lexeme: self.src[start..self.offset].to_string(),
            line,
            column,
        }
    }

    fn error_at(
        &self,
        code: &'static str,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> IsaError {
        let span = SourceSpan::point(self.path.clone(), SourcePosition::new(line, column));
        IsaError::Diagnostics {
            phase: DiagnosticPhase::Lexer,
            diagnostics: vec![IsaDiagnostic::new(
                DiagnosticPhase::Lexer,
                DiagnosticLevel::Error,
                code,
                message,
                Some(span),
            )],
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_part(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit() || ch == '.'
}
