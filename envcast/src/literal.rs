//! Literal-only parser for container values
//!
//! Accepts numbers, quoted strings, `True`/`False`/`None` and nested list,
//! tuple, dict and set displays. Identifiers, calls and operators other than
//! a numeric sign are rejected, so `list(1, 2)` or `dict(a=1)` are parse
//! errors rather than something to evaluate.

use crate::value::Value;

/// Deepest container nesting accepted before giving up.
const MAX_DEPTH: usize = 64;

/// A literal could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid literal at byte {offset}: {message}")]
pub struct LiteralError {
    /// Byte offset into the input where parsing stopped
    pub offset: usize,
    pub message: String,
}

/// Parse a single literal, allowing surrounding whitespace.
///
/// ```
/// use envcast::{parse_literal, Value};
///
/// let value = parse_literal("{'a': [1, 2.5], 'b': (True,)}").unwrap();
/// assert_eq!(value.get(&Value::from("b")), Some(&Value::Tuple(vec![Value::Bool(true)])));
///
/// assert!(parse_literal("list(1, 2, 3)").is_err());
/// ```
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        src: input,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    parser.skip_ws();
    if parser.pos < parser.src.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn expr(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => self.nested(Self::list),
            Some('(') => self.nested(Self::paren),
            Some('{') => self.nested(Self::brace),
            Some('\'' | '"') => self.strings(),
            Some(sign @ ('+' | '-')) => {
                self.pos += 1;
                self.skip_ws();
                if !self.at_number() {
                    return Err(self.error("sign must be followed by a number"));
                }
                self.number(sign == '-')
            }
            Some(_) if self.at_number() => self.number(false),
            Some(c) if c.is_alphabetic() || c == '_' => self.name(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn name(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::None),
            other => Err(LiteralError {
                offset: start,
                message: format!("name '{other}' is not a literal"),
            }),
        }
    }

    fn at_number(&self) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek_second().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn number(&mut self, negative: bool) -> Result<Value, LiteralError> {
        let start = self.pos;
        let radix = match (self.peek(), self.peek_second()) {
            (Some('0'), Some('x' | 'X')) => 16,
            (Some('0'), Some('o' | 'O')) => 8,
            (Some('0'), Some('b' | 'B')) => 2,
            _ => 10,
        };

        let value = if radix == 10 {
            self.decimal(start, negative)?
        } else {
            self.pos += 2;
            let digits_start = self.pos;
            while self
                .peek()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                self.bump();
            }
            let digits = strip_underscores(&self.src[digits_start..self.pos], true)
                .ok_or_else(|| self.error("invalid digit separator"))?;
            let magnitude = i128::from_str_radix(&digits, radix)
                .map_err(|e| self.error(format!("invalid integer literal: {e}")))?;
            self.signed_int(magnitude, negative)?
        };

        if self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            return Err(self.error("invalid number literal"));
        }
        Ok(value)
    }

    fn decimal(&mut self, start: usize, negative: bool) -> Result<Value, LiteralError> {
        let mut is_float = false;
        self.digits();
        if self.eat('.') {
            is_float = true;
            self.digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos = mark;
                return Err(self.error("invalid exponent"));
            }
            self.digits();
            is_float = true;
        }

        let text = &self.src[start..self.pos];
        let cleaned = strip_underscores(text, false)
            .ok_or_else(|| self.error("invalid digit separator"))?;

        if is_float {
            let x: f64 = cleaned
                .parse()
                .map_err(|e| self.error(format!("invalid float literal: {e}")))?;
            return Ok(Value::Float(if negative { -x } else { x }));
        }

        if cleaned.len() > 1 && cleaned.starts_with('0') && cleaned.bytes().any(|b| b != b'0') {
            return Err(self.error("leading zeros in decimal integer literals are not permitted"));
        }
        let magnitude: i128 = cleaned
            .parse()
            .map_err(|e| self.error(format!("invalid integer literal: {e}")))?;
        self.signed_int(magnitude, negative)
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
    }

    fn signed_int(&self, magnitude: i128, negative: bool) -> Result<Value, LiteralError> {
        let signed = if negative { -magnitude } else { magnitude };
        i64::try_from(signed)
            .map(Value::Int)
            .map_err(|_| self.error("integer literal out of range"))
    }

    /// One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<Value, LiteralError> {
        let mut out = String::new();
        loop {
            self.string(&mut out)?;
            let mark = self.pos;
            self.skip_ws();
            if !matches!(self.peek(), Some('\'' | '"')) {
                self.pos = mark;
                return Ok(Value::Str(out));
            }
        }
    }

    fn string(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(self.error("expected string"));
        };
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(LiteralError {
                        offset: start,
                        message: "unterminated string literal".to_string(),
                    })
                }
                Some(c) if c == quote => return Ok(()),
                Some('\\') => self.escape(out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated string literal"));
        };
        match c {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(self.code_point(code)?);
            }
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            // Unknown escapes keep their backslash
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, len: usize) -> Result<char, LiteralError> {
        let end = self.pos + len;
        let digits = self
            .src
            .get(self.pos..end)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("truncated escape sequence"))?;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|e| self.error(format!("invalid escape sequence: {e}")))?;
        self.pos = end;
        self.code_point(code)
    }

    fn code_point(&self, code: u32) -> Result<char, LiteralError> {
        char::from_u32(code).ok_or_else(|| self.error("escape is not a valid code point"))
    }

    fn list(&mut self) -> Result<Value, LiteralError> {
        self.pos += 1;
        let items = self.items(']', Vec::new())?;
        Ok(Value::List(items))
    }

    /// Tuple display, or a parenthesized expression when there is no comma.
    fn paren(&mut self) -> Result<Value, LiteralError> {
        self.pos += 1;
        self.skip_ws();
        if self.eat(')') {
            return Ok(Value::Tuple(Vec::new()));
        }
        let first = self.expr()?;
        self.skip_ws();
        if self.eat(')') {
            return Ok(first);
        }
        if !self.eat(',') {
            return Err(self.error("expected ',' or ')'"));
        }
        let items = self.items(')', vec![first])?;
        Ok(Value::Tuple(items))
    }

    fn brace(&mut self) -> Result<Value, LiteralError> {
        self.pos += 1;
        self.skip_ws();
        if self.eat('}') {
            return Ok(Value::Dict(Vec::new()));
        }

        let first = self.hashable()?;
        self.skip_ws();
        if !self.eat(':') {
            // Set display: the first element is already consumed
            let mut items = vec![first];
            self.skip_ws();
            if !self.eat('}') {
                if !self.eat(',') {
                    return Err(self.error("expected ',' or '}'"));
                }
                items = self.items('}', items)?;
            }
            if let Some(offset) = items.iter().position(|item| !item.is_hashable()) {
                return Err(self.error(format!("unhashable set element at index {offset}")));
            }
            return Ok(Value::set(items));
        }

        let mut entries = vec![(first, self.expr()?)];
        loop {
            self.skip_ws();
            if self.eat('}') {
                break;
            }
            if !self.eat(',') {
                return Err(self.error("expected ',' or '}'"));
            }
            self.skip_ws();
            if self.eat('}') {
                break;
            }
            let key = self.hashable()?;
            self.skip_ws();
            if !self.eat(':') {
                return Err(self.error("expected ':'"));
            }
            entries.push((key, self.expr()?));
        }
        Ok(Value::dict(entries))
    }

    fn hashable(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let value = self.expr()?;
        if let (false, Some(shape)) = (value.is_hashable(), value.shape()) {
            return Err(LiteralError {
                offset: start,
                message: format!("unhashable type '{shape}'"),
            });
        }
        Ok(value)
    }

    /// Comma-separated items up to `close`; the opening delimiter and any
    /// items in `items` are already consumed. A trailing comma is allowed.
    fn items(&mut self, close: char, mut items: Vec<Value>) -> Result<Vec<Value>, LiteralError> {
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.expr()?);
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            if !self.eat(',') {
                return Err(self.error(format!("expected ',' or '{close}'")));
            }
        }
    }
}

/// Remove `_` separators, which must sit between two digits. With
/// `after_prefix`, a single leading separator is allowed (`0x_ff`).
/// Remove `_` digit separators, or `None` if one is misplaced.
///
/// A separator must sit between two digits. With `after_prefix` the digits
/// are those of a `0x`/`0o`/`0b` literal and a leading separator is allowed.
pub(crate) fn strip_underscores(text: &str, after_prefix: bool) -> Option<String> {
    let is_digit = |b: &u8| {
        if after_prefix {
            b.is_ascii_alphanumeric()
        } else {
            b.is_ascii_digit()
        }
    };
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != b'_' {
            continue;
        }
        let prev_ok = if i == 0 {
            after_prefix
        } else {
            is_digit(&bytes[i - 1])
        };
        let next_ok = bytes.get(i + 1).is_some_and(is_digit);
        if !prev_ok || !next_ok {
            return None;
        }
    }
    Some(text.replace('_', ""))
}
