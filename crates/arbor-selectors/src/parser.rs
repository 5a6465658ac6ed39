//! Recursive-descent selector parser.
//!
//! Consumes the token stream from [`crate::tokenizer`] and produces a
//! [`SelectorList`]. Malformed input always yields a [`ParseError`]; the
//! parser never degrades a bad selector into one that matches nothing.

use crate::ast::{
    AttrMatch, AttributeSelector, Combinator, ComplexSelector, CompoundSelector, Nth, PseudoClass,
    SelectorList, SimpleSelector,
};
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{Token, TokenKind, tokenize};

/// Parse a selector string into a [`SelectorList`].
pub fn parse_selector_list(input: &str) -> ParseResult<SelectorList> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    let list = parser.parse_list()?;
    if parser.peek().is_some() {
        return Err(ParseError::UnexpectedToken(parser.offset()));
    }
    Ok(list)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Byte offset of the current token, for diagnostics.
    fn offset(&self) -> usize {
        self.peek()
            .map(|t| t.start as usize)
            .unwrap_or(self.input.len())
    }

    /// Skip a whitespace token if present. Returns whether one was seen.
    fn skip_whitespace(&mut self) -> bool {
        if self.peek_kind() == Some(TokenKind::Whitespace) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_list(&mut self) -> ParseResult<SelectorList> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek().is_none() || self.peek_kind() == Some(TokenKind::Comma) {
                return Err(ParseError::EmptySelector);
            }
            selectors.push(self.parse_complex(false)?);
            self.skip_whitespace();
            match self.peek_kind() {
                Some(TokenKind::Comma) => {
                    self.pos += 1;
                }
                _ => break,
            }
        }
        Ok(SelectorList { selectors })
    }

    /// Parse one complex selector. When `in_functional` is set the
    /// selector is terminated by `)` instead of `,` / end of input.
    fn parse_complex(&mut self, in_functional: bool) -> ParseResult<ComplexSelector> {
        let mut lefts: Vec<(CompoundSelector, Combinator)> = Vec::new();
        let mut current = self.parse_compound()?;
        loop {
            let saw_whitespace = self.skip_whitespace();
            match self.peek_kind() {
                None | Some(TokenKind::Comma) => break,
                Some(TokenKind::RParen) if in_functional => break,
                Some(TokenKind::Greater | TokenKind::Plus | TokenKind::Tilde) => {
                    let combinator = match self.bump().map(|t| t.kind) {
                        Some(TokenKind::Greater) => Combinator::Child,
                        Some(TokenKind::Plus) => Combinator::NextSibling,
                        _ => Combinator::SubsequentSibling,
                    };
                    self.skip_whitespace();
                    if self.at_complex_end(in_functional) {
                        return Err(ParseError::DanglingCombinator);
                    }
                    let next = self.parse_compound()?;
                    lefts.push((current, combinator));
                    current = next;
                }
                Some(_) if saw_whitespace => {
                    let next = self.parse_compound()?;
                    lefts.push((current, Combinator::Descendant));
                    current = next;
                }
                Some(_) => return Err(ParseError::UnexpectedToken(self.offset())),
            }
        }
        let rest = lefts
            .into_iter()
            .rev()
            .map(|(compound, combinator)| (combinator, compound))
            .collect();
        Ok(ComplexSelector { key: current, rest })
    }

    fn at_complex_end(&self, in_functional: bool) -> bool {
        match self.peek_kind() {
            None | Some(TokenKind::Comma) => true,
            Some(TokenKind::RParen) => in_functional,
            _ => false,
        }
    }

    fn parse_compound(&mut self) -> ParseResult<CompoundSelector> {
        let mut simples = Vec::new();
        loop {
            let Some(token) = self.peek().copied() else {
                break;
            };
            match token.kind {
                TokenKind::Ident if simples.is_empty() => {
                    self.pos += 1;
                    simples.push(SimpleSelector::Type(token.text(self.input).into()));
                }
                TokenKind::Star if simples.is_empty() => {
                    self.pos += 1;
                    simples.push(SimpleSelector::Universal);
                }
                TokenKind::Hash => {
                    self.pos += 1;
                    simples.push(SimpleSelector::Id(token.text(self.input).into()));
                }
                TokenKind::Dot => {
                    self.pos += 1;
                    let name = self.expect_ident()?;
                    simples.push(SimpleSelector::Class(name.into()));
                }
                TokenKind::LBracket => {
                    self.pos += 1;
                    simples.push(SimpleSelector::Attribute(self.parse_attribute()?));
                }
                TokenKind::Colon => {
                    self.pos += 1;
                    simples.push(self.parse_pseudo()?);
                }
                TokenKind::DoubleColon => {
                    self.pos += 1;
                    let name = self.expect_ident()?;
                    return Err(ParseError::UnsupportedPseudoElement(name));
                }
                _ => break,
            }
        }
        if simples.is_empty() {
            match self.peek() {
                None => return Err(ParseError::UnexpectedEnd),
                Some(_) => return Err(ParseError::UnexpectedToken(self.offset())),
            }
        }
        Ok(CompoundSelector { simples })
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek().copied() {
            Some(token) if token.kind == TokenKind::Ident => {
                self.pos += 1;
                Ok(token.text(self.input).into_owned())
            }
            Some(_) => Err(ParseError::UnexpectedToken(self.offset())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn parse_attribute(&mut self) -> ParseResult<AttributeSelector> {
        self.skip_whitespace();
        let name = match self.peek().copied() {
            Some(token) if token.kind == TokenKind::Ident => {
                self.pos += 1;
                token.text(self.input).into_owned()
            }
            Some(_) => return Err(ParseError::UnexpectedToken(self.offset())),
            None => return Err(ParseError::UnbalancedBracket),
        };
        self.skip_whitespace();
        let op_kind = match self.peek_kind() {
            Some(TokenKind::RBracket) => {
                self.pos += 1;
                return Ok(AttributeSelector {
                    name: name.into(),
                    op: AttrMatch::Exists,
                    case_insensitive: false,
                });
            }
            Some(
                kind @ (TokenKind::Eq
                | TokenKind::IncludesMatch
                | TokenKind::DashMatch
                | TokenKind::PrefixMatch
                | TokenKind::SuffixMatch
                | TokenKind::SubstringMatch),
            ) => {
                self.pos += 1;
                kind
            }
            Some(_) => return Err(ParseError::UnexpectedToken(self.offset())),
            None => return Err(ParseError::UnbalancedBracket),
        };
        self.skip_whitespace();
        let value = match self.peek().copied() {
            Some(token)
                if matches!(
                    token.kind,
                    TokenKind::Ident | TokenKind::Str | TokenKind::Number
                ) =>
            {
                self.pos += 1;
                token.text(self.input).into_owned()
            }
            Some(_) => return Err(ParseError::UnexpectedToken(self.offset())),
            None => return Err(ParseError::UnbalancedBracket),
        };
        self.skip_whitespace();
        let mut case_insensitive = false;
        if let Some(token) = self.peek().copied() {
            if token.kind == TokenKind::Ident {
                match token.text(self.input).as_ref() {
                    "i" | "I" => {
                        case_insensitive = true;
                        self.pos += 1;
                        self.skip_whitespace();
                    }
                    "s" | "S" => {
                        self.pos += 1;
                        self.skip_whitespace();
                    }
                    _ => return Err(ParseError::UnexpectedToken(self.offset())),
                }
            }
        }
        match self.peek_kind() {
            Some(TokenKind::RBracket) => {
                self.pos += 1;
            }
            Some(_) => return Err(ParseError::UnexpectedToken(self.offset())),
            None => return Err(ParseError::UnbalancedBracket),
        }
        let value: Box<str> = value.into();
        let op = match op_kind {
            TokenKind::Eq => AttrMatch::Equals(value),
            TokenKind::IncludesMatch => AttrMatch::Includes(value),
            TokenKind::DashMatch => AttrMatch::DashMatch(value),
            TokenKind::PrefixMatch => AttrMatch::Prefix(value),
            TokenKind::SuffixMatch => AttrMatch::Suffix(value),
            _ => AttrMatch::Substring(value),
        };
        Ok(AttributeSelector {
            name: name.into(),
            op,
            case_insensitive,
        })
    }

    fn parse_pseudo(&mut self) -> ParseResult<SimpleSelector> {
        let name = self.expect_ident()?.to_ascii_lowercase();
        match name.as_str() {
            "root" => Ok(SimpleSelector::PseudoClass(PseudoClass::Root)),
            "empty" => Ok(SimpleSelector::PseudoClass(PseudoClass::Empty)),
            "first-child" => Ok(SimpleSelector::PseudoClass(PseudoClass::FirstChild)),
            "last-child" => Ok(SimpleSelector::PseudoClass(PseudoClass::LastChild)),
            "only-child" => Ok(SimpleSelector::PseudoClass(PseudoClass::OnlyChild)),
            "first-of-type" => Ok(SimpleSelector::PseudoClass(PseudoClass::FirstOfType)),
            "last-of-type" => Ok(SimpleSelector::PseudoClass(PseudoClass::LastOfType)),
            "only-of-type" => Ok(SimpleSelector::PseudoClass(PseudoClass::OnlyOfType)),
            "nth-child" => Ok(SimpleSelector::PseudoClass(PseudoClass::NthChild(
                self.parse_nth_argument()?,
            ))),
            "nth-last-child" => Ok(SimpleSelector::PseudoClass(PseudoClass::NthLastChild(
                self.parse_nth_argument()?,
            ))),
            "nth-of-type" => Ok(SimpleSelector::PseudoClass(PseudoClass::NthOfType(
                self.parse_nth_argument()?,
            ))),
            "nth-last-of-type" => Ok(SimpleSelector::PseudoClass(PseudoClass::NthLastOfType(
                self.parse_nth_argument()?,
            ))),
            "not" => {
                self.expect_lparen()?;
                self.skip_whitespace();
                if self.at_complex_end(true) {
                    return Err(ParseError::EmptySelector);
                }
                let inner = self.parse_complex(true)?;
                self.skip_whitespace();
                match self.peek_kind() {
                    Some(TokenKind::RParen) => {
                        self.pos += 1;
                        Ok(SimpleSelector::Not(Box::new(inner)))
                    }
                    Some(_) => Err(ParseError::UnexpectedToken(self.offset())),
                    None => Err(ParseError::UnbalancedParen),
                }
            }
            _ => Err(ParseError::UnknownPseudoClass(name)),
        }
    }

    fn expect_lparen(&mut self) -> ParseResult<()> {
        match self.peek_kind() {
            Some(TokenKind::LParen) => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(ParseError::UnexpectedToken(self.offset())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    /// Consume `( ... )` and parse the raw argument text as An+B.
    fn parse_nth_argument(&mut self) -> ParseResult<Nth> {
        self.expect_lparen()?;
        let arg_start = self.offset();
        let mut arg_end = arg_start;
        loop {
            match self.peek().copied() {
                Some(token) if token.kind == TokenKind::RParen => {
                    self.pos += 1;
                    break;
                }
                Some(token) => {
                    arg_end = (token.start + token.len) as usize;
                    self.pos += 1;
                }
                None => return Err(ParseError::UnbalancedParen),
            }
        }
        let raw = &self.input[arg_start..arg_end];
        parse_nth(raw).ok_or_else(|| ParseError::InvalidNth(raw.to_string()))
    }
}

/// Parse an An+B expression: `odd`, `even`, `3`, `2n`, `2n+1`, `-n+3`.
fn parse_nth(raw: &str) -> Option<Nth> {
    let text: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if text.is_empty() {
        return None;
    }
    match text.as_str() {
        "odd" => return Some(Nth::odd()),
        "even" => return Some(Nth::even()),
        _ => {}
    }
    if let Some(n_pos) = text.find('n') {
        let a_part = &text[..n_pos];
        let a = match a_part {
            "" | "+" => 1,
            "-" => -1,
            _ => a_part.parse().ok()?,
        };
        let b_part = &text[n_pos + 1..];
        let b = if b_part.is_empty() {
            0
        } else {
            if !b_part.starts_with('+') && !b_part.starts_with('-') {
                return None;
            }
            b_part.parse().ok()?
        };
        Some(Nth { a, b })
    } else {
        text.parse().ok().map(|b| Nth { a: 0, b })
    }
}
