//! Placeholder scanning.
//!
//! Splits a template body into literal spans and `{{ ... }}` placeholders.
//! The grammar inside a marker is
//!
//! ```text
//! "{{" ws identifier (ws "|" ws filterName ( "(" arg ("," ws arg)* ")" )? )? ws "}}"
//! ```
//!
//! where `ws` is zero or more spaces or tabs, identifiers match
//! `[A-Za-z_][A-Za-z0-9_]*` and an `arg` is a quoted string, an integer or
//! `true`/`false`. Empty parentheses are accepted; arity is checked when
//! the filter runs. Scanning is purely syntactic: nothing is resolved here.

use log::debug;
use std::fmt;

use crate::value::Value;

/// Opening marker of a placeholder.
pub const OPEN_MARKER: &str = "{{";
/// Closing marker of a placeholder.
pub const CLOSE_MARKER: &str = "}}";

/// A filter call attached to a placeholder, e.g. `default(true)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Value>,
}

/// A parsed `{{ ... }}` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub variable: String,
    pub filter: Option<FilterCall>,
    /// Byte offset of the opening `{{`.
    pub offset: usize,
    /// Byte length of the whole marker, delimiters included.
    pub len: usize,
}

impl Placeholder {
    /// The literal `default(...)` argument of this occurrence, if any.
    pub fn default_value(&self) -> Option<&Value> {
        match &self.filter {
            Some(call) if call.name == crate::filters::DEFAULT_FILTER => call.args.first(),
            _ => None,
        }
    }
}

/// One piece of a scanned template body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied verbatim into the output.
    Literal(&'a str),
    Placeholder(Placeholder),
}

/// Why a placeholder failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// No closing `}}` before the end of input.
    Unterminated,
    /// The marker holds no variable name at all.
    MissingIdentifier,
    InvalidIdentifier(String),
    InvalidFilterName(String),
    /// An argument that is not a quoted string, integer or boolean.
    InvalidArgument(String),
    UnterminatedString,
    UnexpectedCharacter(char),
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanErrorKind::Unterminated => write!(f, "unterminated placeholder, expected '}}}}'"),
            ScanErrorKind::MissingIdentifier => write!(f, "expected a variable name"),
            ScanErrorKind::InvalidIdentifier(word) => {
                write!(f, "invalid variable name '{word}'")
            }
            ScanErrorKind::InvalidFilterName(word) => write!(f, "invalid filter name '{word}'"),
            ScanErrorKind::InvalidArgument(word) => {
                write!(f, "invalid filter argument '{word}'")
            }
            ScanErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            ScanErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character '{c}'"),
        }
    }
}

/// A malformed placeholder: where it starts and what is wrong with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    /// Byte offset of the opening `{{` of the offending placeholder.
    pub offset: usize,
    pub kind: ScanErrorKind,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}: {}", self.offset, self.kind)
    }
}

impl std::error::Error for ScanError {}

/// Returns true if `s` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Lazily yields the segments of a template body.
///
/// After the first error the scanner is exhausted, so collecting it up to
/// the first `Err` gives the well-formed prefix of the body.
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0, done: false }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Segment<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.text.len() {
            return None;
        }

        let text = self.text;
        let rest = &text[self.pos..];
        match rest.find(OPEN_MARKER) {
            Some(0) => match parse_placeholder(self.text, self.pos) {
                Ok(placeholder) => {
                    self.pos += placeholder.len;
                    Some(Ok(Segment::Placeholder(placeholder)))
                }
                Err(err) => {
                    self.done = true;
                    Some(Err(err))
                }
            },
            Some(idx) => {
                self.pos += idx;
                Some(Ok(Segment::Literal(&rest[..idx])))
            }
            None => {
                self.pos = self.text.len();
                Some(Ok(Segment::Literal(rest)))
            }
        }
    }
}

/// Scans a whole template body, failing on the first malformed placeholder.
pub fn scan(text: &str) -> Result<Vec<Segment<'_>>, ScanError> {
    let segments = Scanner::new(text).collect::<Result<Vec<_>, _>>()?;
    debug!("Scanned {} segments from {} bytes", segments.len(), text.len());
    Ok(segments)
}

/// Iterates over the placeholders of a body, skipping literal spans.
pub fn placeholders(text: &str) -> impl Iterator<Item = Result<Placeholder, ScanError>> + '_ {
    Scanner::new(text).filter_map(|segment| match segment {
        Ok(Segment::Placeholder(placeholder)) => Some(Ok(placeholder)),
        Ok(Segment::Literal(_)) => None,
        Err(err) => Some(Err(err)),
    })
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    start: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.src[self.pos..].starts_with(pat)
    }

    fn error(&self, kind: ScanErrorKind) -> ScanError {
        ScanError { offset: self.start, kind }
    }

    /// Error for the current character, or `Unterminated` at end of input.
    fn unexpected(&self) -> ScanError {
        match self.peek() {
            Some(c) => self.error(ScanErrorKind::UnexpectedCharacter(c)),
            None => self.error(ScanErrorKind::Unterminated),
        }
    }

    /// Reads a run of characters up to whitespace or a grammar delimiter.
    fn word(&mut self) -> &'a str {
        let src = self.src;
        let from = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ' ' | '\t' | '|' | '(' | ')' | ',' | '}' | '"' | '\'') {
                break;
            }
            if self.starts_with(OPEN_MARKER) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &src[from..self.pos]
    }

    fn expect_close(&mut self) -> Result<(), ScanError> {
        self.skip_ws();
        if self.starts_with(CLOSE_MARKER) {
            self.pos += CLOSE_MARKER.len();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn argument(&mut self) -> Result<Value, ScanError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                self.string(quote).map(Value::Str)
            }
            Some(_) => {
                let word = self.word();
                if word.is_empty() {
                    return Err(self.unexpected());
                }
                parse_bare_argument(word)
                    .ok_or_else(|| self.error(ScanErrorKind::InvalidArgument(word.to_string())))
            }
            None => Err(self.error(ScanErrorKind::Unterminated)),
        }
    }

    fn string(&mut self, quote: char) -> Result<String, ScanError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(ScanErrorKind::UnterminatedString)),
                Some('\\') => match self.bump() {
                    None => return Err(self.error(ScanErrorKind::UnterminatedString)),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn filter_call(&mut self) -> Result<FilterCall, ScanError> {
        let name = self.word();
        if !is_identifier(name) {
            return Err(if name.is_empty() {
                self.unexpected()
            } else {
                self.error(ScanErrorKind::InvalidFilterName(name.to_string()))
            });
        }

        let mut args = Vec::new();
        if self.peek() == Some('(') {
            self.pos += 1;
            if self.peek() == Some(')') {
                self.pos += 1;
            } else {
                loop {
                    args.push(self.argument()?);
                    match self.bump() {
                        Some(',') => self.skip_ws(),
                        Some(')') => break,
                        Some(c) => {
                            return Err(self.error(ScanErrorKind::UnexpectedCharacter(c)))
                        }
                        None => return Err(self.error(ScanErrorKind::Unterminated)),
                    }
                }
            }
        }

        Ok(FilterCall { name: name.to_string(), args })
    }
}

fn parse_bare_argument(word: &str) -> Option<Value> {
    match word {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => {
            let digits = word.strip_prefix('-').unwrap_or(word);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            word.parse::<i64>().ok().map(Value::Int)
        }
    }
}

fn parse_placeholder(text: &str, start: usize) -> Result<Placeholder, ScanError> {
    let mut cursor = Cursor { src: text, pos: start + OPEN_MARKER.len(), start };

    if !text[cursor.pos..].contains(CLOSE_MARKER) {
        return Err(cursor.error(ScanErrorKind::Unterminated));
    }

    cursor.skip_ws();
    let variable = cursor.word();
    if variable.is_empty() {
        return Err(match cursor.peek() {
            Some('}') | None => cursor.error(ScanErrorKind::MissingIdentifier),
            Some(_) => cursor.unexpected(),
        });
    }
    if !is_identifier(variable) {
        return Err(cursor.error(ScanErrorKind::InvalidIdentifier(variable.to_string())));
    }

    cursor.skip_ws();
    let filter = if cursor.peek() == Some('|') {
        cursor.pos += 1;
        cursor.skip_ws();
        Some(cursor.filter_call()?)
    } else {
        None
    };

    cursor.expect_close()?;

    Ok(Placeholder {
        variable: variable.to_string(),
        filter,
        offset: start,
        len: cursor.pos - start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(text: &str) -> Placeholder {
        match scan(text).unwrap().as_slice() {
            [Segment::Placeholder(p)] => p.clone(),
            other => panic!("expected one placeholder, got {other:?}"),
        }
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("az_count"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("V2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("app-name"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_bare_argument_tokens() {
        assert_eq!(parse_bare_argument("true"), Some(Value::Bool(true)));
        assert_eq!(parse_bare_argument("-7"), Some(Value::Int(-7)));
        assert_eq!(parse_bare_argument("+7"), None);
        assert_eq!(parse_bare_argument("-"), None);
        assert_eq!(parse_bare_argument("1.5"), None);
        assert_eq!(parse_bare_argument("99999999999999999999"), None);
    }

    #[test]
    fn test_no_whitespace_inside_markers() {
        let p = single("{{name|upper}}");
        assert_eq!(p.variable, "name");
        assert_eq!(p.filter.unwrap().name, "upper");
        assert_eq!(p.len, 14);
    }

    #[test]
    fn test_tab_whitespace_is_trimmed() {
        let p = single("{{\tname\t|\tdefault('x')\t}}");
        assert_eq!(p.default_value(), Some(&Value::from("x")));
    }

    #[test]
    fn test_string_escapes() {
        let p = single(r#"{{ msg | default("a \"b\"\n") }}"#);
        assert_eq!(p.default_value(), Some(&Value::from("a \"b\"\n")));
    }
}
