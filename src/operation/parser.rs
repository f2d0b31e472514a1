//! Recursive-descent parser for the executable subset of the query language.
//!
//! Supported: query/mutation operations (named or anonymous, shorthand `{ ... }`),
//! variable definitions with defaults, aliases, arguments and nested selections.
//! Fragments, directives, subscriptions and block strings are rejected.
use crate::operation::ParseError;
use crate::operation::document::{Document, Field, InputValue, Operation, OperationKind};

// nesting bound for selections and values
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Punct(char),
    Spread,
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
}

fn describe(token: Option<&Token>) -> String {
    match token {
        None => "end of document".to_string(),
        Some(Token::Punct(c)) => format!("\"{c}\""),
        Some(Token::Spread) => "\"...\"".to_string(),
        Some(Token::Name(n)) => format!("name \"{n}\""),
        Some(Token::Int(i)) => format!("number {i}"),
        Some(Token::Float(f)) => format!("number {f}"),
        Some(Token::Str(_)) => "string".to_string(),
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            // whitespace, commas and the BOM are insignificant
            ' ' | '\t' | '\n' | '\r' | ',' | '\u{feff}' => i += 1,
            '#' => {
                while i < chars.len() && chars[i] != '\n' && chars[i] != '\r' {
                    i += 1;
                }
            }
            '{' | '}' | '(' | ')' | '[' | ']' | ':' | '$' | '!' | '=' | '@' | '|' | '&' => {
                tokens.push(Token::Punct(c));
                i += 1;
            }
            '.' => {
                if chars.get(i + 1) == Some(&'.') && chars.get(i + 2) == Some(&'.') {
                    tokens.push(Token::Spread);
                    i += 3;
                } else {
                    return Err(ParseError::new("unexpected \".\""));
                }
            }
            '"' => {
                let (s, next) = lex_string(&chars, i)?;
                tokens.push(Token::Str(s));
                i = next;
            }
            '-' | '0'..='9' => {
                let (token, next) = lex_number(&chars, i)?;
                tokens.push(token);
                i = next;
            }
            c if c == '_' || c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i] == '_' || chars[i].is_ascii_alphanumeric()) {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            other => return Err(ParseError::new(format!("unexpected character {other:?}"))),
        }
    }

    Ok(tokens)
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), ParseError> {
    if chars.get(start + 1) == Some(&'"') && chars.get(start + 2) == Some(&'"') {
        return Err(ParseError::new("block strings are not supported"));
    }

    let mut out = String::new();
    let mut i = start + 1;
    loop {
        let c = *chars
            .get(i)
            .ok_or_else(|| ParseError::new("unterminated string"))?;
        match c {
            '"' => return Ok((out, i + 1)),
            '\n' | '\r' => return Err(ParseError::new("unterminated string")),
            '\\' => {
                let esc = *chars
                    .get(i + 1)
                    .ok_or_else(|| ParseError::new("unterminated string"))?;
                match esc {
                    '"' => out.push('"'),
                    '\\' => out.push('\\'),
                    '/' => out.push('/'),
                    'b' => out.push('\u{8}'),
                    'f' => out.push('\u{c}'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'u' => {
                        let hex: String = chars.get(i + 2..i + 6).unwrap_or_default().iter().collect();
                        let code = u32::from_str_radix(&hex, 16)
                            .ok()
                            .filter(|_| hex.len() == 4)
                            .and_then(char::from_u32)
                            .ok_or_else(|| ParseError::new("invalid unicode escape"))?;
                        out.push(code);
                        i += 4;
                    }
                    other => {
                        return Err(ParseError::new(format!("invalid escape \\{other}")));
                    }
                }
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), ParseError> {
    let mut i = start;
    let mut is_float = false;

    if chars[i] == '-' {
        i += 1;
    }
    let digits_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return Err(ParseError::new("invalid number"));
    }
    if chars.get(i) == Some(&'.') {
        is_float = true;
        i += 1;
        let frac_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return Err(ParseError::new("invalid number"));
        }
    }
    if matches!(chars.get(i), Some('e') | Some('E')) {
        is_float = true;
        i += 1;
        if matches!(chars.get(i), Some('+') | Some('-')) {
            i += 1;
        }
        let exp_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return Err(ParseError::new("invalid number"));
        }
    }
    // `123abc` is not a number followed by a name
    if chars
        .get(i)
        .is_some_and(|c| *c == '_' || *c == '.' || c.is_ascii_alphabetic())
    {
        return Err(ParseError::new("invalid number"));
    }

    let text: String = chars[start..i].iter().collect();
    let token = if is_float {
        Token::Float(text.parse().map_err(|_| ParseError::new("invalid number"))?)
    } else {
        Token::Int(text.parse().map_err(|_| ParseError::new("integer out of range"))?)
    };
    Ok((token, i))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punct(c))
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.at_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<(), ParseError> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("\"{c}\"")))
        }
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Name(_)) => match self.next() {
                Some(Token::Name(name)) => Ok(name),
                _ => Err(self.unexpected("a name")),
            },
            _ => Err(self.unexpected("a name")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::new(format!(
            "expected {expected}, found {}",
            describe(self.peek())
        ))
    }

    fn document(&mut self) -> Result<Document, ParseError> {
        let mut operations = Vec::new();
        while self.peek().is_some() {
            operations.push(self.operation()?);
        }
        if operations.is_empty() {
            return Err(ParseError::new("document contains no operations"));
        }
        Ok(Document { operations })
    }

    fn operation(&mut self) -> Result<Operation, ParseError> {
        if self.at_punct('{') {
            return Ok(Operation {
                kind: OperationKind::Query,
                name: None,
                variable_defaults: Vec::new(),
                selection: self.selection_set(0)?,
            });
        }

        let kind = match self.expect_name()?.as_str() {
            "query" => OperationKind::Query,
            "mutation" => OperationKind::Mutation,
            "subscription" => return Err(ParseError::new("subscriptions are not supported")),
            "fragment" => return Err(ParseError::new("fragments are not supported")),
            other => return Err(ParseError::new(format!("unknown definition \"{other}\""))),
        };

        let name = match self.peek() {
            Some(Token::Name(_)) => Some(self.expect_name()?),
            _ => None,
        };

        let variable_defaults = if self.at_punct('(') {
            self.variable_definitions()?
        } else {
            Vec::new()
        };

        self.reject_directives()?;

        Ok(Operation {
            kind,
            name,
            variable_defaults,
            selection: self.selection_set(0)?,
        })
    }

    fn variable_definitions(&mut self) -> Result<Vec<(String, InputValue)>, ParseError> {
        self.expect_punct('(')?;
        let mut defaults = Vec::new();
        loop {
            self.expect_punct('$')?;
            let name = self.expect_name()?;
            self.expect_punct(':')?;
            self.type_ref(0)?;
            if self.eat_punct('=') {
                defaults.push((name, self.value(true, 0)?));
            }
            if self.eat_punct(')') {
                break;
            }
        }
        Ok(defaults)
    }

    // Types are accepted but not checked; arguments are validated when deserialised.
    fn type_ref(&mut self, depth: usize) -> Result<(), ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::new("type nesting too deep"));
        }
        if self.eat_punct('[') {
            self.type_ref(depth + 1)?;
            self.expect_punct(']')?;
        } else {
            self.expect_name()?;
        }
        self.eat_punct('!');
        Ok(())
    }

    fn reject_directives(&self) -> Result<(), ParseError> {
        if self.at_punct('@') {
            return Err(ParseError::new("directives are not supported"));
        }
        Ok(())
    }

    fn selection_set(&mut self, depth: usize) -> Result<Vec<Field>, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::new("selection nesting too deep"));
        }
        self.expect_punct('{')?;
        let mut fields = Vec::new();
        while !self.eat_punct('}') {
            if self.peek() == Some(&Token::Spread) {
                return Err(ParseError::new("fragments are not supported"));
            }
            fields.push(self.field(depth)?);
        }
        if fields.is_empty() {
            return Err(ParseError::new("selection set cannot be empty"));
        }
        Ok(fields)
    }

    fn field(&mut self, depth: usize) -> Result<Field, ParseError> {
        let first = self.expect_name()?;
        let (alias, name) = if self.eat_punct(':') {
            (Some(first), self.expect_name()?)
        } else {
            (None, first)
        };

        let mut arguments = Vec::new();
        if self.eat_punct('(') {
            loop {
                let arg = self.expect_name()?;
                self.expect_punct(':')?;
                arguments.push((arg, self.value(false, depth)?));
                if self.eat_punct(')') {
                    break;
                }
            }
        }

        self.reject_directives()?;

        let selection = if self.at_punct('{') {
            self.selection_set(depth + 1)?
        } else {
            Vec::new()
        };

        Ok(Field {
            alias,
            name,
            arguments,
            selection,
        })
    }

    fn value(&mut self, constant: bool, depth: usize) -> Result<InputValue, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::new("value nesting too deep"));
        }
        match self.next() {
            Some(Token::Punct('$')) if !constant => Ok(InputValue::Variable(self.expect_name()?)),
            Some(Token::Int(i)) => Ok(InputValue::Int(i)),
            Some(Token::Float(f)) => Ok(InputValue::Float(f)),
            Some(Token::Str(s)) => Ok(InputValue::String(s)),
            Some(Token::Name(n)) => Ok(match n.as_str() {
                "true" => InputValue::Bool(true),
                "false" => InputValue::Bool(false),
                "null" => InputValue::Null,
                _ => InputValue::Enum(n),
            }),
            Some(Token::Punct('[')) => {
                let mut items = Vec::new();
                while !self.eat_punct(']') {
                    items.push(self.value(constant, depth + 1)?);
                }
                Ok(InputValue::List(items))
            }
            Some(Token::Punct('{')) => {
                let mut fields = Vec::new();
                while !self.eat_punct('}') {
                    let key = self.expect_name()?;
                    self.expect_punct(':')?;
                    fields.push((key, self.value(constant, depth + 1)?));
                }
                Ok(InputValue::Object(fields))
            }
            other => {
                self.pos -= 1;
                Err(ParseError::new(format!(
                    "expected a value, found {}",
                    describe(other.as_ref())
                )))
            }
        }
    }
}

pub fn parse(src: &str) -> Result<Document, ParseError> {
    let tokens = tokenize(src)?;
    Parser { tokens, pos: 0 }.document()
}
