//! Selector tokenizer.
//!
//! Single left-to-right scan producing span tokens (offset + length into
//! the input). Nothing is copied during tokenization; escape sequences are
//! decoded lazily by [`Token::text`], which only allocates when a token
//! actually contains a backslash escape.

use std::borrow::Cow;

use crate::error::{ParseError, ParseResult};

/// Token kind produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier (`div`, `-foo`, `fo\6f`).
    Ident,
    /// Digit run (used inside An+B arguments).
    Number,
    /// Quoted string; the span covers the contents without the quotes.
    Str,
    /// `#name`; the span covers the name without the `#`.
    Hash,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `::`
    DoubleColon,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `*`
    Star,
    /// `>`
    Greater,
    /// `+`
    Plus,
    /// `~`
    Tilde,
    /// `-` (only meaningful inside An+B arguments)
    Minus,
    /// One or more whitespace characters (descendant combinator position).
    Whitespace,
    /// `=`
    Eq,
    /// `~=`
    IncludesMatch,
    /// `|=`
    DashMatch,
    /// `^=`
    PrefixMatch,
    /// `$=`
    SuffixMatch,
    /// `*=`
    SubstringMatch,
}

/// A span token over the selector input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Kind discriminant.
    pub kind: TokenKind,
    /// Byte offset of the token's text in the input.
    pub start: u32,
    /// Byte length of the token's text.
    pub len: u32,
    /// True if the span contains at least one backslash escape.
    pub has_escape: bool,
}

impl Token {
    /// Raw span of this token within `input`.
    pub fn span<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start as usize..(self.start + self.len) as usize]
    }

    /// Token text with escapes decoded.
    ///
    /// Borrows from `input` unless the token contains an escape, in which
    /// case an owned decoded buffer is returned.
    pub fn text<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let raw = self.span(input);
        if !self.has_escape {
            return Cow::Borrowed(raw);
        }
        Cow::Owned(decode_escapes(raw))
    }
}

/// Decode CSS backslash escapes in a raw span.
///
/// The tokenizer has already validated the escape shapes, so decoding
/// cannot fail here.
fn decode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        // Hex escape: up to six digits, optionally followed by one space.
        let mut value: u32 = 0;
        let mut digits = 0;
        while digits < 6 {
            match chars.peek() {
                Some(&(_, h)) if h.is_ascii_hexdigit() => {
                    value = value * 16 + h.to_digit(16).unwrap_or(0);
                    chars.next();
                    digits += 1;
                }
                _ => break,
            }
        }
        if digits > 0 {
            if let Some(&(_, w)) = chars.peek() {
                if w.is_whitespace() {
                    chars.next();
                }
            }
            out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
        } else if let Some((_, lit)) = chars.next() {
            out.push(lit);
        }
    }
    out
}

/// Tokenize a full selector string.
pub fn tokenize(input: &str) -> ParseResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut scanner = Scanner {
        input,
        bytes: input.as_bytes(),
        pos: 0,
    };
    while let Some(token) = scanner.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn token(&self, kind: TokenKind, start: usize, has_escape: bool) -> Token {
        Token {
            kind,
            start: start as u32,
            len: (self.pos - start) as u32,
            has_escape,
        }
    }

    fn simple(&mut self, kind: TokenKind) -> Token {
        let start = self.pos;
        self.pos += 1;
        self.token(kind, start, false)
    }

    fn next_token(&mut self) -> ParseResult<Option<Token>> {
        let Some(b) = self.peek() else {
            return Ok(None);
        };
        let start = self.pos;
        let token = match b {
            b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' => {
                while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')) {
                    self.pos += 1;
                }
                self.token(TokenKind::Whitespace, start, false)
            }
            b'.' => self.simple(TokenKind::Dot),
            b',' => self.simple(TokenKind::Comma),
            b'[' => self.simple(TokenKind::LBracket),
            b']' => self.simple(TokenKind::RBracket),
            b'(' => self.simple(TokenKind::LParen),
            b')' => self.simple(TokenKind::RParen),
            b'>' => self.simple(TokenKind::Greater),
            b'+' => self.simple(TokenKind::Plus),
            b'=' => self.simple(TokenKind::Eq),
            b':' => {
                if self.peek_at(1) == Some(b':') {
                    self.pos += 2;
                    self.token(TokenKind::DoubleColon, start, false)
                } else {
                    self.simple(TokenKind::Colon)
                }
            }
            b'~' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.token(TokenKind::IncludesMatch, start, false)
                } else {
                    self.simple(TokenKind::Tilde)
                }
            }
            b'|' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.token(TokenKind::DashMatch, start, false)
                } else {
                    return Err(ParseError::UnexpectedChar {
                        ch: '|',
                        offset: start,
                    });
                }
            }
            b'^' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.token(TokenKind::PrefixMatch, start, false)
                } else {
                    return Err(ParseError::UnexpectedChar {
                        ch: '^',
                        offset: start,
                    });
                }
            }
            b'$' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.token(TokenKind::SuffixMatch, start, false)
                } else {
                    return Err(ParseError::UnexpectedChar {
                        ch: '$',
                        offset: start,
                    });
                }
            }
            b'*' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.token(TokenKind::SubstringMatch, start, false)
                } else {
                    self.simple(TokenKind::Star)
                }
            }
            b'#' => {
                self.pos += 1;
                let name_start = self.pos;
                let has_escape = self.consume_name()?;
                if self.pos == name_start {
                    return Err(ParseError::UnexpectedChar {
                        ch: '#',
                        offset: start,
                    });
                }
                Token {
                    kind: TokenKind::Hash,
                    start: name_start as u32,
                    len: (self.pos - name_start) as u32,
                    has_escape,
                }
            }
            b'"' | b'\'' => return self.string_token(b).map(Some),
            b'0'..=b'9' => {
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.pos += 1;
                }
                self.token(TokenKind::Number, start, false)
            }
            b'-' => {
                if self.starts_ident_after_dash() {
                    let has_escape = self.consume_ident()?;
                    self.token(TokenKind::Ident, start, has_escape)
                } else {
                    self.simple(TokenKind::Minus)
                }
            }
            _ if is_ident_start(b) || b == b'\\' => {
                let has_escape = self.consume_ident()?;
                self.token(TokenKind::Ident, start, has_escape)
            }
            _ => {
                let ch = self.input[start..].chars().next().unwrap_or('\u{fffd}');
                return Err(ParseError::UnexpectedChar { ch, offset: start });
            }
        };
        Ok(Some(token))
    }

    fn starts_ident_after_dash(&self) -> bool {
        match self.peek_at(1) {
            Some(b'-') => true,
            Some(b'\\') => true,
            Some(b) => is_ident_start(b),
            None => false,
        }
    }

    /// Consume ident characters starting at the current position.
    /// Returns whether an escape was seen.
    fn consume_ident(&mut self) -> ParseResult<bool> {
        // Leading dash(es) are part of the ident.
        while self.peek() == Some(b'-') && self.starts_ident_after_dash() {
            self.pos += 1;
        }
        self.consume_name()
    }

    /// Consume name characters (ident continue set). Returns whether an
    /// escape was seen.
    fn consume_name(&mut self) -> ParseResult<bool> {
        let mut has_escape = false;
        loop {
            match self.peek() {
                Some(b'\\') => {
                    has_escape = true;
                    self.consume_escape()?;
                }
                Some(b) if is_name_char(b) => self.pos += 1,
                _ => return Ok(has_escape),
            }
        }
    }

    /// Consume a backslash escape, validating its shape.
    fn consume_escape(&mut self) -> ParseResult<()> {
        let escape_at = self.pos;
        self.pos += 1; // backslash
        match self.peek() {
            None => Err(ParseError::InvalidEscape(escape_at)),
            Some(b'\n') | Some(b'\r') => Err(ParseError::InvalidEscape(escape_at)),
            Some(b) if b.is_ascii_hexdigit() => {
                let mut digits = 0;
                while digits < 6 && matches!(self.peek(), Some(h) if h.is_ascii_hexdigit()) {
                    self.pos += 1;
                    digits += 1;
                }
                // A single whitespace terminates the hex run.
                if matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')) {
                    self.pos += 1;
                }
                Ok(())
            }
            Some(_) => {
                // Escaped literal character; step over it whole.
                let rest = &self.input[self.pos..];
                let ch_len = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                self.pos += ch_len;
                Ok(())
            }
        }
    }

    fn string_token(&mut self, quote: u8) -> ParseResult<Token> {
        self.pos += 1; // opening quote
        let content_start = self.pos;
        let mut has_escape = false;
        loop {
            match self.peek() {
                None | Some(b'\n') => return Err(ParseError::UnterminatedString),
                Some(b) if b == quote => {
                    let token = Token {
                        kind: TokenKind::Str,
                        start: content_start as u32,
                        len: (self.pos - content_start) as u32,
                        has_escape,
                    };
                    self.pos += 1;
                    return Ok(token);
                }
                Some(b'\\') => {
                    has_escape = true;
                    self.consume_escape()?;
                }
                Some(b) if b < 0x80 => self.pos += 1,
                Some(_) => {
                    let rest = &self.input[self.pos..];
                    self.pos += rest.chars().next().map(char::len_utf8).unwrap_or(1);
                }
            }
        }
    }
}

/// First character of an identifier.
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

/// Continuation character of a name.
fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b >= 0x80
}
