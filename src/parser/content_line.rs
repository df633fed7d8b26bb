//! Split logical lines into properties.
//!
//! A content line is `NAME[;PARAM=VALUE…]:VALUE`. The property and
//! parameter names are case-insensitive and normalised to uppercase;
//! everything else is kept verbatim. In particular a double-quoted
//! parameter value keeps its quotes, and any `:` or `;` between quotes is
//! literal, so `DTSTART;TZID="(UTC+01:00) Amsterdam":20241014T150000`
//! tokenizes into one parameter and the value `20241014T150000`.
//!
//! The split is a single quote-aware pass over the line rather than a
//! chain of `split` calls; this is the hot path when scanning large feeds.

use derive_more::From;
use std::borrow::Cow;
use std::fmt;
use std::iter::Iterator;

use super::{BytesLines, Line, LineError, LineReader};
use crate::{PARAM_DELIMITER, PARAM_NAME_DELIMITER, PARAM_QUOTE, VALUE_DELIMITER};

/// Error arising when tokenizing a content line.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ContentLineError {
    #[error("Line {0}: Missing property name.")]
    MissingName(usize),
    #[error("Line {0}: No unquoted \"{1}\" on the line.")]
    MissingValueDelimiter(usize, char),
    #[error("Line {0}: Malformed parameter, expected NAME=VALUE.")]
    MalformedParam(usize),
    #[error(transparent)]
    LineError(#[from] LineError),
}

/// Property parameters, in source order.
///
/// Parameter values are raw: a quoted value keeps its surrounding quotes.
#[derive(Debug, Clone, Default, Eq, PartialEq, From)]
pub struct ContentLineParams(pub(crate) Vec<(String, String)>);

impl ContentLineParams {
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    #[inline]
    pub fn get_tzid(&self) -> Option<&str> {
        self.get_param("TZID")
    }

    #[inline]
    pub fn get_value_type(&self) -> Option<&str> {
        self.get_param("VALUE")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A tokenized content line.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ContentLine {
    /// Property name, uppercased.
    pub name: String,
    /// Property parameters, names uppercased, values raw.
    pub params: ContentLineParams,
    /// Property value, with at most one leading space stripped.
    pub value: String,
}

impl fmt::Display for ContentLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "name: {}\nparams: {:?}\nvalue: {:?}",
            self.name, self.params, self.value
        )
    }
}

/// Find the first occurrence of any of `needles` outside double quotes.
fn find_unquoted(haystack: &str, needles: &[char]) -> Option<(usize, char)> {
    let mut in_quotes = false;
    for (pos, c) in haystack.char_indices() {
        if c == PARAM_QUOTE {
            in_quotes = !in_quotes;
        } else if !in_quotes && needles.contains(&c) {
            return Some((pos, c));
        }
    }
    None
}

pub struct ContentLineParser<'a, T: Iterator<Item = Cow<'a, [u8]>>>(LineReader<'a, T>);

impl<'a> ContentLineParser<'a, BytesLines<'a>> {
    pub fn from_slice(slice: &'a [u8]) -> Self {
        ContentLineParser(LineReader::from_slice(slice))
    }
}

impl<'a, T: Iterator<Item = Cow<'a, [u8]>>> ContentLineParser<'a, T> {
    pub fn new(line_reader: LineReader<'a, T>) -> Self {
        ContentLineParser(line_reader)
    }

    fn parse(&self, line: Line) -> Result<ContentLine, ContentLineError> {
        let to_parse = line.as_str();

        let Some((name_end, _)) = find_unquoted(to_parse, &[PARAM_DELIMITER, VALUE_DELIMITER])
        else {
            return Err(ContentLineError::MissingValueDelimiter(
                line.number(),
                VALUE_DELIMITER,
            ));
        };
        let (name, mut to_parse) = to_parse.split_at(name_end);
        if name.is_empty() {
            return Err(ContentLineError::MissingName(line.number()));
        }

        // to_parse starts with ; or :
        let mut params = vec![];
        while to_parse.starts_with(PARAM_DELIMITER) {
            to_parse = &to_parse[1..];

            let Some((pair_end, _)) = find_unquoted(to_parse, &[PARAM_DELIMITER, VALUE_DELIMITER])
            else {
                return Err(ContentLineError::MissingValueDelimiter(
                    line.number(),
                    VALUE_DELIMITER,
                ));
            };
            let (pair, remainder) = to_parse.split_at(pair_end);
            let Some((key, value)) = pair.split_once(PARAM_NAME_DELIMITER) else {
                return Err(ContentLineError::MalformedParam(line.number()));
            };
            if key.is_empty() {
                return Err(ContentLineError::MalformedParam(line.number()));
            }
            params.push((key.to_uppercase(), value.to_owned()));
            to_parse = remainder;
        }

        // The parameter scan only stops on an unquoted value delimiter.
        // The value is verbatim apart from one optional leading space;
        // the line reader already removed the trailing CR.
        let value = &to_parse[1..];
        Ok(ContentLine {
            name: name.to_uppercase(),
            params: params.into(),
            value: value.strip_prefix(' ').unwrap_or(value).to_owned(),
        })
    }
}

impl<'a, T: Iterator<Item = Cow<'a, [u8]>>> Iterator for ContentLineParser<'a, T> {
    type Item = Result<ContentLine, ContentLineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.0.next() {
                // Blank lines terminate folding but carry no property.
                Some(Ok(line)) if line.as_str().is_empty() => continue,
                Some(Ok(line)) => return Some(self.parse(line)),
                Some(Err(err)) => return Some(Err(err.into())),
                None => return None,
            }
        }
    }
}
