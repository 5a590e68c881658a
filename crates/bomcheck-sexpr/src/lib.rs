//! A small S-expression parser for the KiCad file formats (`.kicad_mod`,
//! `.kicad_sym`). Atoms keep their lexical class: quoted text stays a
//! string, unquoted text becomes a symbol unless it parses as a number.

use thiserror::Error;

/// An S-expression value.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    /// Unquoted identifier
    Symbol(String),
    /// Quoted text
    String(String),
    /// Integer atom
    Int(i64),
    /// Floating-point atom
    F64(f64),
    /// Parenthesized list
    List(Vec<Sexpr>),
}

impl Sexpr {
    /// Get the atom text if this is a symbol or string.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Sexpr::Symbol(s) | Sexpr::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the symbol name if this is a symbol.
    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Sexpr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Get the string content if this is a quoted string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Sexpr::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the list items if this is a list.
    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match self {
            Sexpr::List(items) => Some(items),
            _ => None,
        }
    }

    /// Coerce a number atom to f64. KiCad encodes whole numbers sometimes
    /// as ints and sometimes as floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Sexpr::F64(f) => Some(*f),
            Sexpr::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// The tag of a list node: its first element, when that is a symbol.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()?.first()?.as_sym()
    }

    /// Find the first direct child list `(name ...)`.
    pub fn find_list(&self, name: &str) -> Option<&[Sexpr]> {
        find_child_list(self.as_list()?, name)
    }

    /// Find all direct child lists `(name ...)`.
    pub fn find_all_lists(&self, name: &str) -> Vec<&[Sexpr]> {
        self.as_list()
            .map(|items| find_all_child_lists(items, name))
            .unwrap_or_default()
    }
}

/// Find a direct child list `(name ...)` within a slice of nodes.
pub fn find_child_list<'a>(items: &'a [Sexpr], name: &str) -> Option<&'a [Sexpr]> {
    items.iter().find_map(|item| {
        let list = item.as_list()?;
        (list.first().and_then(Sexpr::as_sym) == Some(name)).then_some(list)
    })
}

/// Find all direct child lists `(name ...)` within a slice of nodes.
pub fn find_all_child_lists<'a>(items: &'a [Sexpr], name: &str) -> Vec<&'a [Sexpr]> {
    items
        .iter()
        .filter_map(|item| {
            let list = item.as_list()?;
            (list.first().and_then(Sexpr::as_sym) == Some(name)).then_some(list)
        })
        .collect()
}

/// Errors that can occur during parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("expected '{expected}', found '{found}'")]
    UnexpectedChar { found: char, expected: char },
    #[error("unclosed list")]
    UnclosedList,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("empty atom")]
    EmptyAtom,
}

/// Parser over a source string.
pub struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            input,
            chars: input.char_indices().peekable(),
            pos: 0,
        }
    }

    /// Parse a single S-expression from the input.
    pub fn parse(&mut self) -> Result<Sexpr, ParseError> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(ParseError::UnexpectedEof);
        }
        if self.peek() == Some('(') {
            self.parse_list()
        } else {
            self.parse_atom()
        }
    }

    fn parse_list(&mut self) -> Result<Sexpr, ParseError> {
        self.expect('(')?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ParseError::UnclosedList),
                Some(')') => {
                    self.advance();
                    return Ok(Sexpr::List(items));
                }
                Some(_) => items.push(self.parse()?),
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Sexpr, ParseError> {
        if self.peek() == Some('"') {
            return self.parse_string();
        }
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' {
                break;
            }
            self.advance();
        }
        if self.pos == start {
            return Err(ParseError::EmptyAtom);
        }
        let atom = &self.input[start..self.pos];
        if let Ok(n) = atom.parse::<i64>() {
            Ok(Sexpr::Int(n))
        } else if let Ok(f) = atom.parse::<f64>() {
            Ok(Sexpr::F64(f))
        } else {
            Ok(Sexpr::Symbol(atom.to_string()))
        }
    }

    fn parse_string(&mut self) -> Result<Sexpr, ParseError> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::UnterminatedString),
                Some('"') => {
                    self.advance();
                    return Ok(Sexpr::String(out));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('n') => out.push('\n'),
                        Some('r') => out.push('\r'),
                        Some('t') => out.push('\t'),
                        Some(ch) => out.push(ch),
                        None => return Err(ParseError::UnterminatedString),
                    }
                    self.advance();
                }
                Some(ch) => {
                    out.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == ';' {
                // comment runs to end of line
                while let Some(ch) = self.peek() {
                    self.advance();
                    if ch == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn advance(&mut self) {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(found) => Err(ParseError::UnexpectedChar { found, expected }),
            None => Err(ParseError::UnexpectedEof),
        }
    }
}

/// Parse a string into a single S-expression.
pub fn parse(input: &str) -> Result<Sexpr, ParseError> {
    log::trace!("parsing S-expression from {} bytes", input.len());
    Parser::new(input).parse()
}
