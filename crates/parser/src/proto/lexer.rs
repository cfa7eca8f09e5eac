//! Tokenizer for protobuf IDL text

use nom::{
    branch::alt,
    bytes::complete::{escaped, is_not, tag, take_until},
    character::complete::{alpha1, alphanumeric1, anychar, char, hex_digit1, multispace1, not_line_ending},
    combinator::{map, opt, recognize, value},
    multi::many0_count,
    number::complete::recognize_float,
    sequence::{delimited, pair},
    IResult,
};
use protoscaffold_common::{GeneratorError, Location, Result};
use std::fmt;

/// Lexical class of a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Int(String),
    Float(String),
    /// String literal with quotes removed and escapes resolved
    Str(String),
    Symbol(char),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s) | TokenKind::Int(s) | TokenKind::Float(s) => write!(f, "'{}'", s),
            TokenKind::Str(s) => write!(f, "\"{}\"", s),
            TokenKind::Symbol(c) => write!(f, "'{}'", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

const SYMBOLS: &[char] = &[
    ';', '{', '}', '[', ']', '(', ')', '<', '>', '=', ',', '.', ':', '-', '+',
];

/// Split `source` into tokens, dropping whitespace and comments
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut tracker = PositionTracker::new(source);
    let mut rest = source;

    loop {
        if let Ok((after, _)) = trivia(rest) {
            rest = after;
        }
        if rest.is_empty() {
            break;
        }

        let location = tracker.locate(rest);
        if rest.starts_with("/*") {
            return Err(syntax_error(location, "unterminated block comment"));
        }

        let (after, kind) = lex_token(rest).map_err(|msg| syntax_error(location, msg))?;
        tokens.push(Token { kind, location });
        rest = after;
    }

    Ok(tokens)
}

/// Location just past the last character of `source`
pub fn end_location(source: &str) -> Location {
    let mut tracker = PositionTracker::new(source);
    tracker.locate(&source[source.len()..])
}

fn syntax_error(location: Location, message: impl Into<String>) -> GeneratorError {
    GeneratorError::Syntax {
        location,
        message: message.into(),
    }
}

fn lex_token(input: &str) -> std::result::Result<(&str, TokenKind), String> {
    let mut chars = input.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return Err("unexpected end of input".to_string()),
    };
    let second = chars.next();

    if first.is_ascii_alphabetic() || first == '_' {
        return identifier(input)
            .map(|(rest, ident)| (rest, TokenKind::Ident(ident.to_string())))
            .map_err(|_| format!("invalid identifier starting with '{}'", first));
    }

    if first.is_ascii_digit() || (first == '.' && second.is_some_and(|c| c.is_ascii_digit())) {
        return number(input).map_err(|_| "invalid numeric literal".to_string());
    }

    if first == '"' || first == '\'' {
        return string_literal(input, first)
            .map(|(rest, body)| (rest, TokenKind::Str(unescape(body))))
            .map_err(|_| "unterminated string literal".to_string());
    }

    if SYMBOLS.contains(&first) {
        return Ok((&input[first.len_utf8()..], TokenKind::Symbol(first)));
    }

    Err(format!("unexpected character '{}'", first))
}

fn trivia(input: &str) -> IResult<&str, usize> {
    many0_count(alt((value((), multispace1), line_comment, block_comment)))(input)
}

fn line_comment(input: &str) -> IResult<&str, ()> {
    value((), pair(tag("//"), not_line_ending))(input)
}

fn block_comment(input: &str) -> IResult<&str, ()> {
    value((), delimited(tag("/*"), take_until("*/"), tag("*/")))(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn hex_literal(input: &str) -> IResult<&str, &str> {
    recognize(pair(alt((tag("0x"), tag("0X"))), hex_digit1))(input)
}

fn number(input: &str) -> IResult<&str, TokenKind> {
    if let Ok((rest, hex)) = hex_literal(input) {
        return Ok((rest, TokenKind::Int(hex.to_string())));
    }

    let (rest, text) = recognize_float::<_, nom::error::Error<&str>>(input)?;
    let kind = if text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        TokenKind::Float(text.to_string())
    } else {
        TokenKind::Int(text.to_string())
    };
    Ok((rest, kind))
}

fn string_literal(input: &str, quote: char) -> IResult<&str, &str> {
    let normal = if quote == '"' { "\\\"\n" } else { "\\'\n" };
    map(
        delimited(
            char(quote),
            opt(escaped(is_not(normal), '\\', anychar)),
            char(quote),
        ),
        |body: Option<&str>| body.unwrap_or(""),
    )(input)
}

/// Resolve C-style escapes, including `\xHH` and `\NNN` octal byte escapes
fn unescape(body: &str) -> String {
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut out, c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('a') => out.push(0x07),
            Some('b') => out.push(0x08),
            Some('f') => out.push(0x0c),
            Some('v') => out.push(0x0b),
            Some(x @ ('x' | 'X')) => match take_digits(&mut chars, 16, 2, 0) {
                Some(byte) => out.push(byte as u8),
                None => push_char(&mut out, x),
            },
            Some(d @ '0'..='7') => {
                let first = d.to_digit(8).unwrap_or(0);
                let byte = take_digits(&mut chars, 8, 2, first).unwrap_or(first);
                out.push(byte as u8);
            }
            Some(other) => push_char(&mut out, other),
            None => out.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Fold up to `max` further digits of `radix` into `value`; `None` if none follow
fn take_digits(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    radix: u32,
    max: usize,
    mut value: u32,
) -> Option<u32> {
    let mut taken = 0;
    while taken < max {
        match chars.peek().and_then(|c| c.to_digit(radix)) {
            Some(digit) => {
                value = value * radix + digit;
                chars.next();
                taken += 1;
            }
            None => break,
        }
    }
    (taken > 0).then_some(value)
}

/// Maps remaining-input slices back to 1-based line/column, scanning forward only
struct PositionTracker<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> PositionTracker<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn locate(&mut self, rest: &str) -> Location {
        let target = self.source.len() - rest.len();
        for c in self.source[self.offset..target].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = target;
        Location {
            line: self.line,
            column: self.column,
        }
    }
}
