//! Mapping-script translation
//!
//! Sample-data field mappings ship as JavaScript modules, e.g.
//!
//! ```text
//! /* license */
//! export const fieldMappings = {
//!   timestamp: { type: 'date' },   // event time
//!   'geo.coordinates': { type: 'geo_point', },
//! };
//! ```
//!
//! Only the object-literal subset those files use is accepted: comments,
//! bareword or quoted keys, single or double quoted strings, numbers,
//! booleans, null, nested objects and arrays, trailing commas. Everything
//! before the first `{` is ignored. Nothing is ever evaluated.

use crate::error::{IngestError, Result};
use serde_json::{json, Map, Number, Value};

/// Parse a mapping script and wrap it in a template envelope for `prefix*`
pub fn translate_template(source: &str, prefix: &str) -> Result<Value> {
    let properties = parse_literal(source)?;
    Ok(json!({
        "index_patterns": format!("{}*", prefix),
        "mappings": { "properties": properties },
    }))
}

/// Parse the first object literal in `source`
pub fn parse_literal(source: &str) -> Result<Value> {
    let mut parser = Parser::new(source);
    parser.skip_to_payload()?;
    let value = parser.parse_object()?;

    parser.skip_trivia()?;
    while parser.eat(';') {
        parser.skip_trivia()?;
    }
    if let Some(c) = parser.peek() {
        return Err(parser.error(format!("unexpected '{}' after the mapping object", c)));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn line(&self) -> usize {
        1 + self.chars[..self.pos.min(self.chars.len())]
            .iter()
            .filter(|&&c| c == '\n')
            .count()
    }

    fn error(&self, message: impl Into<String>) -> IngestError {
        IngestError::TemplateFormat(format!("line {}: {}", self.line(), message.into()))
    }

    /// Skip whitespace, `// ...` and `/* ... */`
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                },
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.pos += 2;
                                break;
                            },
                            (Some(_), _) => self.pos += 1,
                            (None, _) => {
                                self.pos = start;
                                return Err(self.error("unterminated block comment"));
                            },
                        }
                    }
                },
                _ => return Ok(()),
            }
        }
    }

    /// Move to the first `{` outside comments
    fn skip_to_payload(&mut self) -> Result<()> {
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('{') => return Ok(()),
                Some(_) => self.pos += 1,
                None => {
                    return Err(IngestError::TemplateFormat(
                        "no opening brace found in mapping source".into(),
                    ))
                },
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some(q @ ('\'' | '"')) => self.parse_string(q).map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_ident_start(c) => {
                let word = self.parse_ident();
                match word.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    other => Err(self.error(format!("unsupported identifier value '{}'", other))),
                }
            },
            Some(c) => Err(self.error(format!("unexpected '{}'", c))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.skip_trivia()?;
        if !self.eat('{') {
            return Err(self.error("expected '{'"));
        }

        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            if self.eat('}') {
                return Ok(Value::Object(map));
            }

            let key = self.parse_key()?;
            self.skip_trivia()?;
            if !self.eat(':') {
                return Err(self.error(format!("expected ':' after key '{}'", key)));
            }
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_trivia()?;
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            return Err(self.error("expected ',' or '}' in object"));
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat(']') {
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);

            self.skip_trivia()?;
            if self.eat(',') {
                continue;
            }
            if self.eat(']') {
                return Ok(Value::Array(items));
            }
            return Err(self.error("expected ',' or ']' in array"));
        }
    }

    fn parse_key(&mut self) -> Result<String> {
        match self.peek() {
            Some(q @ ('\'' | '"')) => self.parse_string(q),
            Some(c) if is_ident_start(c) || c.is_ascii_digit() => Ok(self.parse_ident()),
            Some(c) => Err(self.error(format!("unexpected '{}' where a key was expected", c))),
            None => Err(self.error("unexpected end of input in object")),
        }
    }

    fn parse_ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_part) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn parse_string(&mut self, quote: char) -> Result<String> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            let c = self
                .peek()
                .ok_or_else(|| self.error("unterminated string"))?;
            self.pos += 1;
            match c {
                c if c == quote => return Ok(out),
                '\n' => return Err(self.error("newline in string literal")),
                '\\' => {
                    let escaped = self
                        .peek()
                        .ok_or_else(|| self.error("unterminated escape"))?;
                    self.pos += 1;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        '0' => out.push('\0'),
                        'u' => out.push(self.parse_unicode_escape()?),
                        '\n' => {},
                        other => out.push(other),
                    }
                },
                c => out.push(c),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> Result<char> {
        let digits: String = self.chars.iter().skip(self.pos).take(4).collect();
        let code = u32::from_str_radix(&digits, 16)
            .ok()
            .filter(|_| digits.len() == 4)
            .ok_or_else(|| self.error(format!("invalid unicode escape '\\u{}'", digits)))?;
        self.pos += 4;
        char::from_u32(code).ok_or_else(|| self.error(format!("invalid code point {:x}", code)))
    }

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let text = text.strip_prefix('+').unwrap_or(&text);

        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error(format!("invalid number '{}'", text)))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
