//! Stylesheet parser.
//!
//! Turns stylesheet text into a [`StyleSheet`] using the logos tokenizer
//! from [`crate::css::tokenizer`]. The parser walks three states:
//!
//! ```text
//!  SeekingSelector --'{'--> InRuleBody --'}'--> SeekingSelector
//!  SeekingSelector --@media--> InMediaBlock --'{'--> (nested items) --'}'--> SeekingSelector
//! ```
//!
//! Whitespace and comments never reach the parser. Inside a selector,
//! byte-span adjacency separates `button.primary` (one compound) from
//! `box .primary` (a descendant step); `>` is also a descendant step.

use super::media::MediaQuery;
use super::model::{CompoundSelector, Declaration, Rule, Selector, StyleItem, StyleSheet};
use super::tokenizer::{tokenize_spanned, Spanned, Token};
use crate::logging::targets;
use crate::object::StyleState;

/// Errors from stylesheet parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    #[error("unexpected {found} at byte {position}, expected {expected}")]
    UnexpectedToken {
        position: usize,
        found: String,
        expected: &'static str,
    },
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(&'static str),
    #[error("invalid selector '{0}'")]
    InvalidSelector(String),
}

/// Where the parser is in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    SeekingSelector,
    InRuleBody,
    InMediaBlock,
}

impl StyleSheet {
    /// Parse strictly: the first malformed fragment fails the whole sheet.
    pub fn parse(source: &str) -> Result<StyleSheet, StyleError> {
        let mut parser = Parser::new(source, false)?;
        let items = parser.parse_items(false)?;
        Ok(StyleSheet { items })
    }

    /// Parse leniently: malformed rules are skipped up to their closing `}`
    /// and logged. Never fails.
    pub fn parse_lenient(source: &str) -> StyleSheet {
        match Parser::new(source, true).and_then(|mut p| p.parse_items(false)) {
            Ok(items) => StyleSheet { items },
            Err(err) => {
                tracing::warn!(target: targets::STYLE, %err, "stylesheet dropped");
                StyleSheet::default()
            }
        }
    }
}

/// Parse a comma-separated selector list such as `window>box>button, label.title`.
pub fn parse_selector_list(text: &str) -> Result<Vec<Selector>, StyleError> {
    let mut parser = Parser::new(text, false)?;
    let selectors = parser.parse_selector_list()?;
    match parser.peek() {
        None => Ok(selectors),
        Some(_) => Err(StyleError::InvalidSelector(text.to_owned())),
    }
}

/// Parse a single selector.
pub fn parse_selector(text: &str) -> Result<Selector, StyleError> {
    let mut list = parse_selector_list(text)?;
    if list.len() != 1 {
        return Err(StyleError::InvalidSelector(text.to_owned()));
    }
    Ok(list.remove(0))
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned<'a>>,
    cursor: usize,
    state: ParseState,
    lenient: bool,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, lenient: bool) -> Result<Self, StyleError> {
        let mut tokens = Vec::new();
        for result in tokenize_spanned(source) {
            match result {
                Ok(tok) => tokens.push(tok),
                Err(position) => {
                    let found = source[position..].chars().next().unwrap_or(' ');
                    if !lenient {
                        return Err(StyleError::UnexpectedToken {
                            position,
                            found: format!("'{found}'"),
                            expected: "a stylesheet token",
                        });
                    }
                    tracing::warn!(target: targets::STYLE, position, %found, "unlexable character skipped");
                }
            }
        }
        Ok(Self {
            source,
            tokens,
            cursor: 0,
            state: ParseState::SeekingSelector,
            lenient,
        })
    }

    // ── Token cursor ─────────────────────────────────────────────────

    fn peek(&self) -> Option<&Spanned<'a>> {
        self.tokens.get(self.cursor)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<Spanned<'a>> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    /// The current token starts exactly where the previous one ended.
    fn is_adjacent(&self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = &self.tokens[self.cursor - 1];
        self.peek().is_some_and(|curr| curr.start == prev.end)
    }

    fn unexpected(&self, expected: &'static str) -> StyleError {
        match self.peek() {
            Some(tok) => StyleError::UnexpectedToken {
                position: tok.start,
                found: format!("{:?} '{}'", tok.token, tok.text),
                expected,
            },
            None => StyleError::UnexpectedEof(expected),
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<Spanned<'a>, StyleError> {
        if self.peek_token() == Some(&token) {
            // peek just confirmed a token is there
            return self.advance().ok_or(StyleError::UnexpectedEof(expected));
        }
        Err(self.unexpected(expected))
    }

    // ── Items ────────────────────────────────────────────────────────

    /// Parse items until end of input, or until the `}` closing a media
    /// block when `nested`.
    fn parse_items(&mut self, nested: bool) -> Result<Vec<StyleItem>, StyleError> {
        let mut items = Vec::new();
        loop {
            self.state = ParseState::SeekingSelector;
            match self.peek_token() {
                None if nested => return Err(StyleError::UnexpectedEof("'}'")),
                None => return Ok(items),
                Some(Token::BraceClose) if nested => {
                    self.advance();
                    return Ok(items);
                }
                _ => {}
            }

            let start = self.cursor;
            let result = if self.peek_token() == Some(&Token::AtKeyword) {
                self.parse_media()
            } else {
                self.parse_rule().map(StyleItem::Rule)
            };

            match result {
                Ok(item) => items.push(item),
                Err(err) if self.lenient => {
                    let fragment_start = self.tokens.get(start).map_or(self.source.len(), |t| t.start);
                    self.recover(start);
                    let fragment_end = self
                        .tokens
                        .get(self.cursor.saturating_sub(1))
                        .map_or(self.source.len(), |t| t.end)
                        .max(fragment_start);
                    tracing::warn!(
                        target: targets::STYLE,
                        %err,
                        state = ?self.state,
                        fragment = %self.source[fragment_start..fragment_end].trim(),
                        "skipped malformed style rule"
                    );
                    if self.cursor == start {
                        // nothing consumable left in this block
                        return Ok(items);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Skip from `start` past the `}` that closes the broken fragment.
    fn recover(&mut self, start: usize) {
        self.cursor = start;
        let mut depth = 0i32;
        while let Some(tok) = self.advance() {
            match tok.token {
                Token::BraceOpen => depth += 1,
                Token::BraceClose => {
                    depth -= 1;
                    if depth <= 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn parse_media(&mut self) -> Result<StyleItem, StyleError> {
        let at = self.expect(Token::AtKeyword, "'@media'")?;
        if !at.text.eq_ignore_ascii_case("@media") {
            self.cursor -= 1;
            return Err(self.unexpected("'@media'"));
        }
        self.state = ParseState::InMediaBlock;

        let cond_start = at.end;
        while !matches!(self.peek_token(), Some(Token::BraceOpen) | None) {
            self.advance();
        }
        let open = self.expect(Token::BraceOpen, "'{' after media condition")?;
        let query = MediaQuery::parse(&self.source[cond_start..open.start]);
        tracing::trace!(target: targets::STYLE, %query, "media block");

        let items = self.parse_items(true)?;
        Ok(StyleItem::Media { query, items })
    }

    // ── Rules ────────────────────────────────────────────────────────

    fn parse_rule(&mut self) -> Result<Rule, StyleError> {
        let selectors = self.parse_selector_list()?;
        self.expect(Token::BraceOpen, "'{'")?;
        self.state = ParseState::InRuleBody;
        let declarations = self.parse_declarations()?;
        self.expect(Token::BraceClose, "'}'")?;
        self.state = ParseState::SeekingSelector;
        Ok(Rule {
            selectors,
            declarations,
        })
    }

    fn parse_selector_list(&mut self) -> Result<Vec<Selector>, StyleError> {
        let mut selectors = vec![self.parse_selector()?];
        while self.peek_token() == Some(&Token::Comma) {
            self.advance();
            selectors.push(self.parse_selector()?);
        }
        Ok(selectors)
    }

    fn parse_selector(&mut self) -> Result<Selector, StyleError> {
        let mut segments = vec![self.parse_compound()?];
        loop {
            match self.peek_token() {
                Some(Token::GreaterThan) => {
                    self.advance();
                    segments.push(self.parse_compound()?);
                }
                Some(
                    Token::Ident
                    | Token::Star
                    | Token::Dot
                    | Token::Hash
                    | Token::HexColor
                    | Token::PseudoClass,
                ) => segments.push(self.parse_compound()?),
                _ => break,
            }
        }
        Ok(Selector { segments })
    }

    /// One `type#name.class:state` run with no whitespace inside.
    fn parse_compound(&mut self) -> Result<CompoundSelector, StyleError> {
        let mut compound = CompoundSelector::new();
        match self.peek_token() {
            Some(Token::Ident) => {
                let tok = self.advance().ok_or(StyleError::UnexpectedEof("selector"))?;
                compound.type_name = Some(tok.text.to_owned());
            }
            Some(Token::Star) => {
                self.advance();
            }
            Some(Token::Dot | Token::Hash | Token::HexColor | Token::PseudoClass) => {
                self.parse_simple(&mut compound)?;
            }
            _ => return Err(self.unexpected("selector")),
        }

        while self.is_adjacent()
            && matches!(
                self.peek_token(),
                Some(Token::Dot | Token::Hash | Token::HexColor | Token::PseudoClass)
            )
        {
            self.parse_simple(&mut compound)?;
        }
        Ok(compound)
    }

    fn parse_simple(&mut self, compound: &mut CompoundSelector) -> Result<(), StyleError> {
        let tok = self.advance().ok_or(StyleError::UnexpectedEof("selector"))?;
        match tok.token {
            Token::Dot => {
                let name = self.expect(Token::Ident, "class name after '.'")?;
                compound.classes.push(name.text.to_owned());
            }
            Token::Hash => {
                let name = self.expect(Token::Ident, "name after '#'")?;
                self.set_name(compound, name.text)?;
            }
            Token::HexColor => {
                // `#adds` lexes as `#add` + `s`
                let mut name = tok.text[1..].to_owned();
                if self.is_adjacent() && self.peek_token() == Some(&Token::Ident) {
                    if let Some(rest) = self.advance() {
                        name.push_str(rest.text);
                    }
                }
                self.set_name(compound, &name)?;
            }
            Token::PseudoClass => {
                compound.state = tok.text[1..]
                    .parse::<StyleState>()
                    .map_err(|_| StyleError::InvalidSelector(tok.text.to_owned()))?;
            }
            _ => {
                self.cursor -= 1;
                return Err(self.unexpected("selector"));
            }
        }
        Ok(())
    }

    fn set_name(&self, compound: &mut CompoundSelector, name: &str) -> Result<(), StyleError> {
        if compound.name.is_some() {
            return Err(StyleError::InvalidSelector(format!("{compound}#{name}")));
        }
        compound.name = Some(name.to_owned());
        Ok(())
    }

    // ── Declarations ─────────────────────────────────────────────────

    fn parse_declarations(&mut self) -> Result<Vec<Declaration>, StyleError> {
        let mut declarations = Vec::new();
        loop {
            match self.peek_token() {
                Some(Token::BraceClose) | None => return Ok(declarations),
                Some(Token::Semicolon) => {
                    self.advance();
                }
                _ => declarations.push(self.parse_declaration()?),
            }
        }
    }

    /// `key: value [!important]` terminated by `;` or the closing `}`.
    fn parse_declaration(&mut self) -> Result<Declaration, StyleError> {
        let key = self.expect(Token::Ident, "property name")?;

        // `key:value` lexes the colon and first word as one pseudo-class token.
        let mut value_start = match self.peek_token() {
            Some(Token::Colon) => {
                self.advance();
                None
            }
            Some(Token::PseudoClass) if self.is_adjacent() => {
                let tok = self.advance().ok_or(StyleError::UnexpectedEof("':'"))?;
                Some((tok.start + 1, tok.end))
            }
            _ => return Err(self.unexpected("':'")),
        };

        let mut value_end = value_start.map_or(0, |(_, end)| end);
        let mut single_string = None;
        let mut value_tokens = usize::from(value_start.is_some());
        let mut important = false;
        loop {
            match self.peek_token() {
                None | Some(Token::Semicolon | Token::BraceClose) => break,
                Some(Token::Important) => {
                    self.advance();
                    important = true;
                    break;
                }
                Some(Token::BraceOpen | Token::AtKeyword) => return Err(self.unexpected("value")),
                Some(_) => {
                    let tok = self.advance().ok_or(StyleError::UnexpectedEof("value"))?;
                    if value_start.is_none() {
                        value_start = Some((tok.start, tok.end));
                    }
                    value_end = tok.end;
                    value_tokens += 1;
                    single_string = matches!(tok.token, Token::StringLiteral | Token::StringLiteralSingle)
                        .then(|| tok.text[1..tok.text.len() - 1].to_owned());
                }
            }
        }

        let Some((start, _)) = value_start else {
            return Err(self.unexpected("value"));
        };
        match self.peek_token() {
            None => return Err(StyleError::UnexpectedEof("';' or '}'")),
            Some(Token::Semicolon) => {
                self.advance();
            }
            Some(Token::BraceClose) => {}
            Some(_) => return Err(self.unexpected("';' or '}'")),
        }

        let value = match single_string {
            Some(text) if value_tokens == 1 => text,
            _ => self.source[start..value_end].trim().to_owned(),
        };
        Ok(Declaration {
            key: key.text.to_owned(),
            value,
            important,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
