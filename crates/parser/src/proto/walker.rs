//! Single-pass declaration walker over proto tokens
//!
//! The walker understands enough of the proto2/proto3 grammar to find the
//! declarations the model cares about and to step over everything else
//! (enums, oneofs, map fields, groups, extensions, reserved ranges, options
//! below file level). Each modeled declaration is reported to a [`Visitor`]
//! in source order.

use super::lexer::{Token, TokenKind};
use protoscaffold_common::{GeneratorError, Location, Result};

/// A normal message field as declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    /// Type reference as written (scalar keyword or possibly dotted name)
    pub type_name: String,
    pub number: u32,
    pub repeated: bool,
    pub location: Location,
}

/// An RPC declaration inside a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcDecl {
    pub name: String,
    pub request_type: String,
    pub response_type: String,
    pub request_streams: bool,
    pub response_streams: bool,
    pub location: Location,
}

/// Callbacks invoked by [`walk`], one per modeled declaration
#[cfg_attr(test, mockall::automock)]
pub trait Visitor {
    fn visit_syntax(&mut self, _syntax: &str) {}
    fn visit_package(&mut self, _name: &str) {}
    fn visit_import(&mut self, _path: &str) {}
    /// File-level options only
    fn visit_option(&mut self, _name: &str, _value: &str) {}
    fn enter_message(&mut self, _name: &str) {}
    fn exit_message(&mut self) {}
    fn visit_field(&mut self, _field: &FieldDecl) {}
    fn visit_service(&mut self, _name: &str) {}
    fn visit_rpc(&mut self, _rpc: &RpcDecl) {}
}

const FIELD_LABELS: &[&str] = &["repeated", "optional", "required"];

/// Walk `tokens` once, top to bottom, reporting declarations to `visitor`
///
/// `end` is the location reported when input ends in the middle of a
/// declaration.
pub fn walk<V: Visitor + ?Sized>(tokens: &[Token], end: Location, visitor: &mut V) -> Result<()> {
    let mut walker = Walker {
        tokens,
        pos: 0,
        end,
        visitor,
    };
    walker.file()
}

struct Walker<'t, 'v, V: ?Sized> {
    tokens: &'t [Token],
    pos: usize,
    end: Location,
    visitor: &'v mut V,
}

impl<'t, V: Visitor + ?Sized> Walker<'t, '_, V> {
    fn file(&mut self) -> Result<()> {
        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Symbol(';') => self.pos += 1,
                TokenKind::Ident(kw) => match kw.as_str() {
                    "syntax" | "edition" => self.syntax()?,
                    "package" => self.package()?,
                    "import" => self.import()?,
                    "option" => {
                        let (name, value) = self.option_statement()?;
                        self.visitor.visit_option(&name, &value);
                    }
                    "message" => self.message()?,
                    "enum" | "extend" => self.skip_block_declaration()?,
                    "service" => self.service()?,
                    _ => return Err(self.unexpected(token, "at top level")),
                },
                _ => return Err(self.unexpected(token, "at top level")),
            }
        }
        Ok(())
    }

    fn syntax(&mut self) -> Result<()> {
        let keyword = self.expect_ident()?;
        self.expect_symbol('=')?;
        let value = self.string_literal()?;
        self.expect_symbol(';')?;
        if keyword == "syntax" {
            self.visitor.visit_syntax(&value);
        }
        Ok(())
    }

    fn package(&mut self) -> Result<()> {
        self.pos += 1;
        let name = self.full_ident()?;
        self.expect_symbol(';')?;
        self.visitor.visit_package(&name);
        Ok(())
    }

    fn import(&mut self) -> Result<()> {
        self.pos += 1;
        if self.peek_ident_is("public") || self.peek_ident_is("weak") {
            self.pos += 1;
        }
        let path = self.string_literal()?;
        self.expect_symbol(';')?;
        self.visitor.visit_import(&path);
        Ok(())
    }

    /// `option name = constant;`, returning the name and the constant's text
    fn option_statement(&mut self) -> Result<(String, String)> {
        self.pos += 1;
        let name = self.option_name()?;
        self.expect_symbol('=')?;
        let value = self.constant()?;
        self.expect_symbol(';')?;
        Ok((name, value))
    }

    fn message(&mut self) -> Result<()> {
        self.pos += 1;
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;
        self.visitor.enter_message(&name);
        self.message_body()?;
        self.visitor.exit_message();
        Ok(())
    }

    fn message_body(&mut self) -> Result<()> {
        loop {
            let token = self.peek_or_eof("'}' to close message")?;
            match &token.kind {
                TokenKind::Symbol('}') => {
                    self.pos += 1;
                    return Ok(());
                }
                TokenKind::Symbol(';') => self.pos += 1,
                TokenKind::Symbol('.') => self.field_or_group()?,
                TokenKind::Ident(kw) => match kw.as_str() {
                    "message" => self.message()?,
                    "enum" | "extend" | "oneof" => self.skip_block_declaration()?,
                    "option" => {
                        self.option_statement()?;
                    }
                    "extensions" | "reserved" => self.skip_statement()?,
                    "map" if self.peek_symbol_at(1, '<') => self.skip_statement()?,
                    _ => self.field_or_group()?,
                },
                _ => return Err(self.unexpected(token, "in message body")),
            }
        }
    }

    fn field_or_group(&mut self) -> Result<()> {
        let location = self.location();
        let mut repeated = false;
        if let Some(label) = self.peek_ident() {
            // `optional foo = 1;` uses `optional` as a type name, not a label
            if FIELD_LABELS.contains(&label) && !self.peek_symbol_at(2, '=') {
                repeated = label == "repeated";
                self.pos += 1;
            }
        }

        // proto2 `group Name = N { ... }` is recognized and dropped
        if self.peek_ident_is("group") && self.peek_symbol_at(2, '=') {
            return self.skip_block_declaration();
        }

        let type_name = self.type_reference()?;
        let name = self.expect_ident()?;
        self.expect_symbol('=')?;
        let number = self.field_number()?;
        self.skip_bracketed_options()?;
        self.expect_symbol(';')?;

        self.visitor.visit_field(&FieldDecl {
            name,
            type_name,
            number,
            repeated,
            location,
        });
        Ok(())
    }

    fn service(&mut self) -> Result<()> {
        self.pos += 1;
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;
        self.visitor.visit_service(&name);

        loop {
            let token = self.peek_or_eof("'}' to close service")?;
            match &token.kind {
                TokenKind::Symbol('}') => {
                    self.pos += 1;
                    return Ok(());
                }
                TokenKind::Symbol(';') => self.pos += 1,
                TokenKind::Ident(kw) if kw == "rpc" => self.rpc()?,
                TokenKind::Ident(kw) if kw == "option" => {
                    self.option_statement()?;
                }
                // legacy proto2 stream declarations
                TokenKind::Ident(kw) if kw == "stream" => self.skip_statement()?,
                _ => return Err(self.unexpected(token, "in service body")),
            }
        }
    }

    fn rpc(&mut self) -> Result<()> {
        let location = self.location();
        self.pos += 1;
        let name = self.expect_ident()?;

        let (request_streams, request_type) = self.rpc_argument()?;
        self.expect_keyword("returns")?;
        let (response_streams, response_type) = self.rpc_argument()?;

        if self.peek_symbol_at(0, '{') {
            self.skip_balanced('{', '}')?;
        } else {
            self.expect_symbol(';')?;
        }

        self.visitor.visit_rpc(&RpcDecl {
            name,
            request_type,
            response_type,
            request_streams,
            response_streams,
            location,
        });
        Ok(())
    }

    /// `( [stream] Type )`
    fn rpc_argument(&mut self) -> Result<(bool, String)> {
        self.expect_symbol('(')?;
        // `(stream)` names a message called `stream`
        let streams = self.peek_ident_is("stream") && !self.peek_symbol_at(1, ')');
        if streams {
            self.pos += 1;
        }
        let type_name = self.type_reference()?;
        self.expect_symbol(')')?;
        Ok((streams, type_name))
    }

    /// `[.]ident(.ident)*`, returned as written
    fn type_reference(&mut self) -> Result<String> {
        let mut text = String::new();
        if self.peek_symbol_at(0, '.') {
            self.pos += 1;
            text.push('.');
        }
        text.push_str(&self.full_ident()?);
        Ok(text)
    }

    fn full_ident(&mut self) -> Result<String> {
        let mut text = self.expect_ident()?;
        while self.peek_symbol_at(0, '.') {
            self.pos += 1;
            text.push('.');
            text.push_str(&self.expect_ident()?);
        }
        Ok(text)
    }

    /// Option name tokens up to `=`, joined as written
    fn option_name(&mut self) -> Result<String> {
        let mut text = String::new();
        while !self.peek_symbol_at(0, '=') {
            let token = self.next_or_eof("'='")?;
            match &token.kind {
                TokenKind::Ident(s) => text.push_str(s),
                TokenKind::Symbol(c @ ('(' | ')' | '.')) => text.push(*c),
                _ => return Err(self.unexpected(token, "in option name")),
            }
        }
        Ok(text)
    }

    /// An option value; aggregate `{ ... }` values are skipped and yield ""
    fn constant(&mut self) -> Result<String> {
        let token = self.peek_or_eof("a constant")?;
        match &token.kind {
            TokenKind::Str(_) => self.string_literal(),
            TokenKind::Ident(_) => self.full_ident(),
            TokenKind::Int(n) | TokenKind::Float(n) => {
                let text = n.clone();
                self.pos += 1;
                Ok(text)
            }
            TokenKind::Symbol(sign @ ('-' | '+')) => {
                let sign = *sign;
                self.pos += 1;
                let token = self.next_or_eof("a number after sign")?;
                match &token.kind {
                    TokenKind::Int(n) | TokenKind::Float(n) | TokenKind::Ident(n) => {
                        Ok(format!("{}{}", sign, n))
                    }
                    _ => Err(self.unexpected(token, "after sign")),
                }
            }
            TokenKind::Symbol('{') => {
                self.skip_balanced('{', '}')?;
                Ok(String::new())
            }
            _ => Err(self.unexpected(token, "where a constant was expected")),
        }
    }

    /// One or more adjacent string literals, concatenated
    fn string_literal(&mut self) -> Result<String> {
        let token = self.next_or_eof("a string literal")?;
        let mut text = match &token.kind {
            TokenKind::Str(s) => s.clone(),
            _ => return Err(self.unexpected(token, "where a string literal was expected")),
        };
        while let Some(Token {
            kind: TokenKind::Str(s),
            ..
        }) = self.peek()
        {
            text.push_str(s);
            self.pos += 1;
        }
        Ok(text)
    }

    fn field_number(&mut self) -> Result<u32> {
        let token = self.next_or_eof("a field number")?;
        let parsed = match &token.kind {
            TokenKind::Int(text) => parse_int(text),
            _ => None,
        };
        match parsed {
            Some(n) if n > 0 => Ok(n),
            _ => Err(GeneratorError::Syntax {
                location: token.location,
                message: format!("expected a positive field number, found {}", token.kind),
            }),
        }
    }

    fn skip_bracketed_options(&mut self) -> Result<()> {
        if self.peek_symbol_at(0, '[') {
            self.skip_balanced('[', ']')?;
        }
        Ok(())
    }

    /// Step over a declaration header and its `{ ... }` body
    fn skip_block_declaration(&mut self) -> Result<()> {
        loop {
            let token = self.peek_or_eof("'{'")?;
            match token.kind {
                TokenKind::Symbol('{') => return self.skip_balanced('{', '}'),
                TokenKind::Symbol('[') => self.skip_balanced('[', ']')?,
                TokenKind::Symbol(';' | '}') => {
                    return Err(self.unexpected(token, "where '{' was expected"))
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Consume from an opening delimiter through its matching close
    fn skip_balanced(&mut self, open: char, close: char) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let token = self.next_or_eof(&format!("'{}'", close))?;
            match token.kind {
                TokenKind::Symbol(c) if c == open => depth += 1,
                TokenKind::Symbol(c) if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    /// Consume through the next `;` outside of brackets
    fn skip_statement(&mut self) -> Result<()> {
        loop {
            let token = self.peek_or_eof("';'")?;
            match token.kind {
                TokenKind::Symbol(';') => {
                    self.pos += 1;
                    return Ok(());
                }
                TokenKind::Symbol('[') => self.skip_balanced('[', ']')?,
                TokenKind::Symbol('{') => return self.skip_balanced('{', '}'),
                _ => self.pos += 1,
            }
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_ident(&self) -> Option<&'t str> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Ident(s),
                ..
            }) => Some(s.as_str()),
            _ => None,
        }
    }

    fn peek_ident_is(&self, keyword: &str) -> bool {
        self.peek_ident() == Some(keyword)
    }

    fn peek_symbol_at(&self, offset: usize, symbol: char) -> bool {
        matches!(
            self.tokens.get(self.pos + offset),
            Some(Token { kind: TokenKind::Symbol(c), .. }) if *c == symbol
        )
    }

    fn peek_or_eof(&self, expected: &str) -> Result<&'t Token> {
        self.peek().ok_or_else(|| self.eof_error(expected))
    }

    fn next_or_eof(&mut self, expected: &str) -> Result<&'t Token> {
        let token = self.peek_or_eof(expected)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect_ident(&mut self) -> Result<String> {
        let token = self.next_or_eof("an identifier")?;
        match &token.kind {
            TokenKind::Ident(s) => Ok(s.clone()),
            _ => Err(self.unexpected(token, "where an identifier was expected")),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        let token = self.next_or_eof(&format!("'{}'", keyword))?;
        match &token.kind {
            TokenKind::Ident(s) if s == keyword => Ok(()),
            _ => Err(GeneratorError::Syntax {
                location: token.location,
                message: format!("expected '{}', found {}", keyword, token.kind),
            }),
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<()> {
        let token = self.next_or_eof(&format!("'{}'", symbol))?;
        match token.kind {
            TokenKind::Symbol(c) if c == symbol => Ok(()),
            _ => Err(GeneratorError::Syntax {
                location: token.location,
                message: format!("expected '{}', found {}", symbol, token.kind),
            }),
        }
    }

    fn location(&self) -> Location {
        self.peek().map_or(self.end, |t| t.location)
    }

    fn unexpected(&self, token: &Token, context: &str) -> GeneratorError {
        GeneratorError::Syntax {
            location: token.location,
            message: format!("unexpected {} {}", token.kind, context),
        }
    }

    fn eof_error(&self, expected: &str) -> GeneratorError {
        GeneratorError::Syntax {
            location: self.end,
            message: format!("unexpected end of input, expected {}", expected),
        }
    }
}

/// Decimal, hex (`0x`) or octal (leading `0`) integer literal
fn parse_int(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        u32::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}
