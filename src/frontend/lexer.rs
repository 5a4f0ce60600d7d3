use std::fmt;
use std::io::{self, Bytes, Read};
use std::iter::Peekable;
use std::str::Chars;

use tracing::{debug, trace, warn};

// Each token knows the numeric code the classic Kaleidoscope lexer used for
// it: negative codes for the known kinds, the character code otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    EndOfInput,
    FuncDef,
    Extern,
    Identifier(String),
    Number(f64),
    Char(char),
}

impl Token {
    pub fn code(&self) -> i32 {
        match self {
            Token::EndOfInput => -1,
            Token::FuncDef => -2,
            Token::Extern => -3,
            Token::Identifier(_) => -4,
            Token::Number(_) => -5,
            Token::Char(c) => *c as i32,
        }
    }

    #[inline(always)]
    pub fn is_char(&self, expected: char) -> bool {
        matches!(self, Token::Char(c) if *c == expected)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::EndOfInput => write!(f, "end of input"),
            Token::FuncDef => write!(f, "'def'"),
            Token::Extern => write!(f, "'extern'"),
            Token::Identifier(name) => write!(f, "identifier `{name}`"),
            Token::Number(value) => write!(f, "number {value}"),
            Token::Char(c) => write!(f, "'{}'", c.escape_debug()),
        }
    }
}

/// 1-based line and column of a character in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Default for Location {
    fn default() -> Self {
        Location { line: 1, column: 1 }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Pull-based tokenizer over any character source.
///
/// Holds exactly one character of lookahead between calls to
/// [`Lexer::next_token`]; `None` in the lookahead means the source is
/// exhausted and is never read again.
#[derive(Debug)]
pub struct Lexer<I> {
    chars: I,
    last_char: Option<char>,
    line: usize,
    column: usize,
    token_start: Location,
}

impl<I> Lexer<I>
where
    I: Iterator<Item = char>,
{
    pub fn new(chars: I) -> Self {
        Self {
            chars,
            // Whitespace, so the first call reads a real character before
            // classifying anything. Column 0 makes that character column 1.
            last_char: Some(' '),
            line: 1,
            column: 0,
            token_start: Location::default(),
        }
    }

    /// Location of the first character of the most recently returned token.
    pub fn token_start(&self) -> Location {
        self.token_start
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.scan();
        trace!(%token, at = %self.token_start, "lexed");
        token
    }

    fn scan(&mut self) -> Token {
        loop {
            while self.last_char.is_some_and(is_space) {
                self.bump();
            }

            self.token_start = Location {
                line: self.line,
                column: self.column,
            };

            let Some(c) = self.last_char else {
                return Token::EndOfInput;
            };

            // identifier ::= [a-zA-Z][a-zA-Z0-9]*
            if c.is_ascii_alphabetic() {
                let ident = self.take_while(|c| c.is_ascii_alphanumeric());

                return match ident.as_str() {
                    "def" => Token::FuncDef,
                    "extern" => Token::Extern,
                    _ => Token::Identifier(ident),
                };
            }

            // number ::= [0-9.]+
            if c.is_ascii_digit() || c == '.' {
                let text = self.take_while(|c| c.is_ascii_digit() || c == '.');
                return Token::Number(parse_number(&text));
            }

            // Comment until end of line, then keep scanning.
            if c == '#' {
                while !matches!(self.last_char, None | Some('\n') | Some('\r')) {
                    self.bump();
                }
                continue;
            }

            self.bump();
            return Token::Char(c);
        }
    }

    pub fn into_source(self) -> I {
        self.chars
    }

    fn bump(&mut self) {
        let Some(prev) = self.last_char else {
            return;
        };

        if prev == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        self.last_char = self.chars.next();
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();

        while let Some(c) = self.last_char.filter(|&c| pred(c)) {
            text.push(c);
            self.bump();
        }

        text
    }
}

impl<I> Iterator for Lexer<I>
where
    I: Iterator<Item = char>,
{
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Token::EndOfInput => None,
            token => Some(token),
        }
    }
}

// Same set as C `isspace`, anything else non-ASCII is a symbol.
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

/// Converts a run of digits and dots the way `strtod` would: the longest
/// valid leading prefix wins, so `1.2.3` reads as `1.2` and a lone `.` as 0.
pub fn parse_number(text: &str) -> f64 {
    let prefix_len = match text.find('.') {
        Some(dot) => text[dot + 1..]
            .find('.')
            .map_or(text.len(), |second| dot + 1 + second),
        None => text.len(),
    };

    let (prefix, discarded) = text.split_at(prefix_len);

    if !discarded.is_empty() {
        warn!(
            literal = text,
            discarded, "ignoring trailing text in numeric literal"
        );
    }

    prefix.parse().unwrap_or(0.0)
}

/// Character source decoding UTF-8 from a byte reader. Malformed sequences
/// become U+FFFD. A read error ends the input and is kept for
/// [`ReadChars::take_error`].
#[derive(Debug)]
pub struct ReadChars<R: Read> {
    bytes: Peekable<Bytes<R>>,
    error: Option<io::Error>,
}

impl<R: Read> ReadChars<R> {
    pub fn new(reader: R) -> Self {
        Self {
            bytes: reader.bytes().peekable(),
            error: None,
        }
    }

    /// The read error that ended the input, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn fail(&mut self, err: io::Error) {
        debug!(%err, "read failed");
        self.error = Some(err);
    }
}

impl<R: Read> Iterator for ReadChars<R> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let lead = match self.bytes.next()? {
            Ok(byte) => byte,
            Err(err) => {
                self.fail(err);
                return None;
            }
        };

        let width = match lead {
            0x00..=0x7F => return Some(char::from(lead)),
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Some(char::REPLACEMENT_CHARACTER),
        };

        let mut buf = [lead, 0, 0, 0];

        // Only continuation bytes are consumed, anything else starts the
        // next character.
        for slot in &mut buf[1..width] {
            match self.bytes.peek() {
                Some(Ok(byte)) if byte & 0xC0 == 0x80 => {
                    *slot = *byte;
                    self.bytes.next();
                }
                Some(Err(_)) => {
                    if let Some(Err(err)) = self.bytes.next() {
                        self.fail(err);
                    }
                    return None;
                }
                _ => return Some(char::REPLACEMENT_CHARACTER),
            }
        }

        let decoded = std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next());

        Some(decoded.unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}

impl<R: Read> Lexer<ReadChars<R>> {
    pub fn from_reader(reader: R) -> Self {
        Lexer::new(ReadChars::new(reader))
    }
}

pub trait Lex {
    fn lex(&self) -> Lexer<Chars<'_>>;
}

impl Lex for str {
    fn lex(&self) -> Lexer<Chars<'_>> {
        Lexer::new(self.chars())
    }
}
