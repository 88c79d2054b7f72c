use std::path::Path;

use crate::isa::diagnostic::{SourcePosition, SourceSpan};

use super::Token;

pub fn span_from_tokens(path: &Path, start: &Token, end: &Token) -> SourceSpan {
    SourceSpan::new(
        path.to_path_buf(),
        SourcePosition::new(start.line, start.column),
        token_end_position(end),
    )
}

pub fn span_from_token(path: &Path, token: &Token) -> SourceSpan {
    span_from_tokens(path, token, token)
}

/// Position just past the token. String tokens hold the unquoted text, so this is approximate
/// for them.
fn token_end_position(token: &Token) -> SourcePosition {
    let mut line = token.line;
    let mut column = token.column;
    for ch in token.lexeme.chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    SourcePosition::new(line, column)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::loader::isa::TokenKind;

    fn token(kind: TokenKind, lexeme: &str, line: usize, column: usize) -> Token {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    #[test]
    fn span_covers_both_tokens() {
        let path = PathBuf::from("gpu.isa");
        let start = token(TokenKind::Identifier, "FADD.f32", 2, 6);
        let end = token(TokenKind::RBrace, "}", 5, 1);
        let span = span_from_tokens(&path, &start, &end);
        assert_eq!(span.start, SourcePosition::new(2, 6));
        assert_eq!(span.end, SourcePosition::new(5, 2));
    }

    #[test]
    fn empty_token_is_a_point() {
        let path = PathBuf::from("gpu.isa");
        let eof = token(TokenKind::EOF, "", 9, 1);
        let span = span_from_token(&path, &eof);
        assert_eq!(span.start, span.end);
    }
}
