//! Token cursor: sliding view with peek, pop, rewind and sequence matching.

use femto_ir::{Token, TokenKind};

/// Cursor over a module's token vector.
///
/// An exhausted cursor yields a null token (`Eof` kind) carrying the file's
/// source id, so downstream error messages keep file context without any
/// out-of-bounds handling at the call sites.
pub struct Cursor {
    tokens: Vec<Token>,
    null: Token,
    pos: usize,
}

impl Cursor {
    pub fn new(tokens: Vec<Token>, src_id: u32) -> Self {
        Cursor {
            tokens,
            null: Token::null(src_id),
            pos: 0,
        }
    }

    /// Number of tokens in the stream.
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether `n` more tokens can be popped.
    #[inline]
    pub fn can_pop(&self, n: usize) -> bool {
        self.pos + n <= self.tokens.len()
    }

    /// Consume and return the current token; the null token when exhausted.
    pub fn pop(&mut self) -> Token {
        match self.tokens.get(self.pos) {
            Some(t) => {
                self.pos += 1;
                t.clone()
            }
            None => self.null.clone(),
        }
    }

    /// Look `k` tokens ahead without consuming; the null token past the end.
    #[inline]
    pub fn peek(&self, k: usize) -> &Token {
        self.tokens.get(self.pos + k).unwrap_or(&self.null)
    }

    /// The current token without consuming it.
    #[inline]
    pub fn seek(&self) -> &Token {
        self.peek(0)
    }

    /// Step back up to `n` tokens.
    pub fn rewind(&mut self, n: usize) {
        if self.pos >= n {
            self.pos -= n;
        }
    }

    /// Match the upcoming tokens against a kind sequence.
    ///
    /// [`TokenKind::Any`] matches any token. Fails when fewer than
    /// `kinds.len()` tokens remain.
    pub fn match_seq(&self, kinds: &[TokenKind]) -> bool {
        if !self.can_pop(kinds.len()) {
            return false;
        }
        kinds
            .iter()
            .enumerate()
            .all(|(i, k)| *k == TokenKind::Any || self.tokens[self.pos + i].kind == *k)
    }

    /// Current position, for the pass-3 deferred-parse index.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Re-seek to a recorded position.
    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(pos <= self.tokens.len());
        self.pos = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use femto_ir::Loc;

    fn toks(kinds: &[TokenKind]) -> Cursor {
        let tokens = kinds
            .iter()
            .map(|&k| Token::new(k, Loc::new(1, 1, 1), k.display_name()))
            .collect();
        Cursor::new(tokens, 1)
    }

    #[test]
    fn test_pop_and_exhaustion() {
        let mut c = toks(&[TokenKind::KwInt, TokenKind::Ident]);
        assert!(c.can_pop(2));
        assert!(!c.can_pop(3));
        assert_eq!(c.pop().kind, TokenKind::KwInt);
        assert_eq!(c.pop().kind, TokenKind::Ident);
        // exhausted: null token with the stream's source id
        let t = c.pop();
        assert_eq!(t.kind, TokenKind::Eof);
        assert_eq!(t.loc.src, 1);
    }

    #[test]
    fn test_rewind() {
        let mut c = toks(&[TokenKind::Add, TokenKind::Sub, TokenKind::Mul]);
        c.pop();
        c.pop();
        c.rewind(1);
        assert_eq!(c.seek().kind, TokenKind::Sub);
        c.rewind(5); // too far: no-op
        assert_eq!(c.seek().kind, TokenKind::Sub);
    }

    #[test]
    fn test_match_seq_with_wildcard() {
        let c = toks(&[TokenKind::Ident, TokenKind::Dot, TokenKind::Ident]);
        assert!(c.match_seq(&[TokenKind::Ident, TokenKind::Dot, TokenKind::Ident]));
        assert!(c.match_seq(&[TokenKind::Ident, TokenKind::Any, TokenKind::Ident]));
        assert!(!c.match_seq(&[TokenKind::Ident, TokenKind::Comma, TokenKind::Ident]));
        // longer than the stream
        assert!(!c.match_seq(&[
            TokenKind::Ident,
            TokenKind::Dot,
            TokenKind::Ident,
            TokenKind::Semi
        ]));
    }

    #[test]
    fn test_peek_past_end() {
        let c = toks(&[TokenKind::Semi]);
        assert_eq!(c.peek(0).kind, TokenKind::Semi);
        assert_eq!(c.peek(3).kind, TokenKind::Eof);
    }
}
