use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::isa::ast::IsaDocument;
use crate::isa::diagnostic::{
    DiagnosticLevel, DiagnosticPhase, IsaDiagnostic, SourceSpan,
};
use crate::isa::error::IsaError;

use super::spans::span_from_token;
use super::{Lexer, Token, TokenKind};

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    lookahead: VecDeque<Token>,
    last_token: Option<Token>,
    path: PathBuf,
    diagnostics: Vec<IsaDiagnostic>,
    luts: BTreeSet<String>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, path: PathBuf) -> Self {
        Self {
            lexer: Lexer::new(source, path.clone()),
            lookahead: VecDeque::with_capacity(2),
            last_token: None,
            path,
            diagnostics: Vec::new(),
            luts: BTreeSet::new(),
        }
    }

    /// Parses every directive, collecting all parse errors before failing.
    pub fn parse_document(&mut self) -> Result<IsaDocument, IsaError> {
        let mut items = Vec::new();
        loop {
            match self.check(TokenKind::EOF) {
                Ok(true) => break,
                Ok(false) => {}
                Err(err) => {
                    self.handle_parse_error(err)?;
                    continue;
                }
            }
            match self.parse_directive() {
                Ok(item) => items.push(item),
                Err(err) => self.handle_parse_error(err)?,
            }
        }

        if self.diagnostics.is_empty() {
            debug!(path = %self.path.display(), items = items.len(), "parsed isa document");
            Ok(IsaDocument::new(self.path.clone(), items))
        } else {
            Err(IsaError::Diagnostics {
                phase: DiagnosticPhase::Parser,
                diagnostics: std::mem::take(&mut self.diagnostics),
            })
        }
    }

    pub(super) fn expect_identifier_token(&mut self, context: &str) -> Result<Token, IsaError> {
        let token = self.consume()?;
        if token.kind == TokenKind::Identifier {
            Ok(token)
        } else {
            Err(IsaError::Parser(format!(
                "expected identifier for {context}, found '{}'",
                token.lexeme
            )))
        }
    }

    /// Accepts a bare identifier or a quoted string.
    pub(super) fn expect_name_token(&mut self, context: &str) -> Result<Token, IsaError> {
        let token = self.consume()?;
        match token.kind {
            TokenKind::Identifier | TokenKind::String => Ok(token),
            _ => Err(IsaError::Parser(format!(
                "expected name for {context}, found '{}'",
                token.lexeme
            ))),
        }
    }

    pub(super) fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token, IsaError> {
        let token = self.consume()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(IsaError::Parser(format!("expected {context}")))
        }
    }

    pub(super) fn check(&mut self, kind: TokenKind) -> Result<bool, IsaError> {
        Ok(self.peek()?.kind == kind)
    }

    /// Consumes the next token when it is `kind`.
    pub(super) fn eat(&mut self, kind: TokenKind) -> Result<bool, IsaError> {
        if self.check(kind)? {
            self.consume()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(super) fn peek(&mut self) -> Result<&Token, IsaError> {
        self.fill(1)?;
        self.lookahead
            .front()
            .ok_or_else(|| IsaError::Parser("token stream exhausted".into()))
    }

    /// Kind of the token after the next one.
    pub(super) fn peek_second_kind(&mut self) -> Result<TokenKind, IsaError> {
        self.fill(2)?;
        self.lookahead
            .get(1)
            .map(|token| token.kind.clone())
            .ok_or_else(|| IsaError::Parser("token stream exhausted".into()))
    }

    /// True when the upcoming tokens read `identifier =`.
    pub(super) fn at_attribute(&mut self) -> Result<bool, IsaError> {
        Ok(self.check(TokenKind::Identifier)? && self.peek_second_kind()? == TokenKind::Equals)
    }

    pub(super) fn consume(&mut self) -> Result<Token, IsaError> {
        let token = match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        self.last_token = Some(token.clone());
        Ok(token)
    }

    fn fill(&mut self, depth: usize) -> Result<(), IsaError> {
        while self.lookahead.len() < depth {
            let token = self.lexer.next_token()?;
            self.lookahead.push_back(token);
        }
        Ok(())
    }
}

impl<'src> Parser<'src> {
    pub(super) fn file_path(&self) -> &Path {
        &self.path
    }

    pub(super) fn last_consumed_token(&self) -> Option<&Token> {
        self.last_token.as_ref()
    }

    /// Records a lookup table name, returning false if it was already declared.
    pub(super) fn register_lut(&mut self, name: &str) -> bool {
        self.luts.insert(name.to_string())
    }

    fn handle_parse_error(&mut self, err: IsaError) -> Result<(), IsaError> {
        match err {
            IsaError::Parser(msg) => {
                self.push_parser_diagnostic(msg);
                self.synchronize_directive();
                Ok(())
            }
            IsaError::Diagnostics {
                phase: DiagnosticPhase::Parser | DiagnosticPhase::Lexer,
                diagnostics,
            } => {
                self.diagnostics.extend(diagnostics);
                self.synchronize_directive();
                Ok(())
            }
            other => Err(other),
        }
    }

    fn push_parser_diagnostic(&mut self, message: String) {
        let span = self.current_error_span();
        self.diagnostics.push(IsaDiagnostic::new(
            DiagnosticPhase::Parser,
            DiagnosticLevel::Error,
            "parser.syntax",
            message,
            span,
        ));
    }

    fn current_error_span(&mut self) -> Option<SourceSpan> {
        let token = self.lookahead.front().or(self.last_token.as_ref())?;
        Some(span_from_token(&self.path, token))
    }

    /// Skips ahead to the next `:` directive introducer, dropping lexer errors on the way.
    fn synchronize_directive(&mut self) {
        loop {
            match self.peek() {
                Ok(token) if token.kind == TokenKind::Colon || token.kind == TokenKind::EOF => {
                    break;
                }
                Ok(_) => {
                    if self.consume().is_err() {
                        break;
                    }
                }
                Err(_) => continue,
            }
        }
    }
}

/// Convenience helper used by the loader when parsing files without needing to hold onto the
/// parser instance.
pub fn parse_str(path: PathBuf, src: &str) -> Result<IsaDocument, IsaError> {
    let mut parser = Parser::new(src, path);
    parser.parse_document()
}
