//! Tokenizer for the shader language
//!
//! Declarations are tokenized normally. Block bodies are not: once the parser
//! has consumed the opening brace it calls [`Lexer::read_body`], which copies
//! target-language text verbatim up to the matching closing brace and only
//! picks out `$NAME` property references.

use super::CompileError;
use super::ir::{Body, PropertyRef, Segment, SourceLocation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident(String),
    Integer(u32),
    Semicolon,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Dollar,
}

impl TokenKind {
    /// Human-readable description used in error messages
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("'{name}'"),
            Self::Integer(value) => format!("'{value}'"),
            Self::Semicolon => "';'".to_string(),
            Self::LeftBracket => "'['".to_string(),
            Self::RightBracket => "']'".to_string(),
            Self::LeftBrace => "'{'".to_string(),
            Self::RightBrace => "'}'".to_string(),
            Self::Dollar => "'$'".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

pub(crate) struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Lexer {
    pub(crate) fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Location of the next unread character
    pub(crate) fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consumes a `/* ... */` comment whose opening `/*` is next, appending it to `out` if given
    fn block_comment(&mut self, mut out: Option<&mut String>) -> Result<(), CompileError> {
        let start = self.location();
        for _ in 0..2 {
            if let (Some(c), Some(out)) = (self.bump(), out.as_deref_mut()) {
                out.push(c);
            }
        }
        loop {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    if let Some(out) = out.as_deref_mut() {
                        out.push_str("*/");
                    }
                    return Ok(());
                }
                Some(c) => {
                    if let Some(out) = out.as_deref_mut() {
                        out.push(c);
                    }
                }
                None => return Err(CompileError::at(start, "Unterminated block comment")),
            }
        }
    }

    /// Consumes a `// ...` comment up to (not including) the line break
    fn line_comment(&mut self, mut out: Option<&mut String>) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
            if let Some(out) = out.as_deref_mut() {
                out.push(c);
            }
        }
    }

    fn skip_trivia(&mut self) -> Result<(), CompileError> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => self.line_comment(None),
                (Some('/'), Some('*')) => self.block_comment(None)?,
                _ => return Ok(()),
            }
        }
    }

    fn identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            name.push(c);
            self.bump();
        }
        name
    }

    /// Returns the next declaration-level token, or `None` at end of input
    pub(crate) fn next_token(&mut self) -> Result<Option<Token>, CompileError> {
        self.skip_trivia()?;
        let location = self.location();
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = match c {
            ';' => TokenKind::Semicolon,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '$' => TokenKind::Dollar,
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(d) = self.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    self.bump();
                }
                if self.peek().is_some_and(is_ident_continue) {
                    return Err(CompileError::at(location, format!("Malformed integer literal starting with '{digits}'")));
                }
                let value = digits
                    .parse::<u32>()
                    .map_err(|_| CompileError::at(location, format!("Integer literal out of range: {digits}")))?;
                return Ok(Some(Token {
                    kind: TokenKind::Integer(value),
                    location,
                }));
            }
            c if is_ident_start(c) => {
                let name = self.identifier();
                return Ok(Some(Token {
                    kind: TokenKind::Ident(name),
                    location,
                }));
            }
            other => return Err(CompileError::at(location, format!("Unexpected character '{other}'"))),
        };

        self.bump();
        Ok(Some(Token { kind, location }))
    }

    /// Reads a block body after its opening brace, consuming the matching closing brace
    ///
    /// Braces inside comments do not count towards nesting. Leading line breaks
    /// and trailing whitespace are trimmed so generated code stays tidy.
    pub(crate) fn read_body(&mut self, open: SourceLocation) -> Result<Body, CompileError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut depth = 1usize;

        loop {
            match (self.peek(), self.peek_second()) {
                (None, _) => return Err(CompileError::at(open, "Unterminated block, expected '}'")),
                (Some('/'), Some('/')) => self.line_comment(Some(&mut text)),
                (Some('/'), Some('*')) => self.block_comment(Some(&mut text))?,
                (Some('{'), _) => {
                    depth += 1;
                    text.push('{');
                    self.bump();
                }
                (Some('}'), _) => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        break;
                    }
                    text.push('}');
                }
                (Some('$'), next) => {
                    let location = self.location();
                    if !next.is_some_and(is_ident_start) {
                        return Err(CompileError::at(location, "Expected property name after '$'"));
                    }
                    self.bump();
                    let name = self.identifier();
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Property(PropertyRef { name, location }));
                }
                (Some(c), _) => {
                    text.push(c);
                    self.bump();
                }
            }
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        if let Some(Segment::Text(first)) = segments.first_mut() {
            *first = first.trim_start_matches(['\r', '\n']).to_string();
        }
        if let Some(Segment::Text(last)) = segments.last_mut() {
            *last = last.trim_end().to_string();
        }
        segments.retain(|segment| !matches!(segment, Segment::Text(text) if text.is_empty()));

        Ok(Body { segments })
    }
}
