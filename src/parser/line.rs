//! Assemble logical content lines from a byte stream.
//!
//! RFC 5545 folds long content lines across several physical lines: a
//! physical line starting with a space or a tab continues the previous
//! line, with that single whitespace octet removed. Folding happens at
//! octet level, so a multi-octet UTF-8 sequence may be split across the
//! fold; continuations are therefore joined as bytes and the logical line
//! is validated as UTF-8 only once it is complete.

use std::borrow::Cow;
use std::fmt;

/// Error arising when assembling a logical line.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LineError {
    #[error("Line {0}: content line is not valid UTF-8.")]
    InvalidUtf8(usize),
}

/// A logical (unfolded) content line.
///
/// `number` is the number of the first physical line it was read from,
/// counted from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    pub inner: Cow<'a, str>,
    number: usize,
}

impl Line<'_> {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    #[inline]
    pub fn number(&self) -> usize {
        self.number
    }
}

impl fmt::Display for Line<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

/// Iterator over the physical lines of a byte slice.
///
/// Lines are split on `\n`; a trailing `\r` is removed, so both CRLF and
/// bare LF input work. Blank physical lines are yielded as empty slices.
pub struct BytesLines<'a> {
    slice: &'a [u8],
}

impl<'a> BytesLines<'a> {
    pub fn new(slice: &'a [u8]) -> Self {
        BytesLines { slice }
    }
}

impl<'a> Iterator for BytesLines<'a> {
    type Item = Cow<'a, [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        let slice = self.slice;
        if slice.is_empty() {
            return None;
        }
        let (line, rest) = match slice.iter().position(|&b| b == b'\n') {
            Some(pos) => (&slice[..pos], &slice[pos + 1..]),
            None => (slice, &slice[slice.len()..]),
        };
        self.slice = rest;
        Some(Cow::Borrowed(line.strip_suffix(b"\r").unwrap_or(line)))
    }
}

/// Reader yielding unfolded [`Line`]s from an iterator of physical lines.
pub struct LineReader<'a, T: Iterator<Item = Cow<'a, [u8]>>> {
    source: std::iter::Peekable<T>,
    number: usize,
}

impl<'a> LineReader<'a, BytesLines<'a>> {
    pub fn from_slice(slice: &'a [u8]) -> Self {
        LineReader::new(BytesLines::new(slice))
    }
}

impl<'a, T: Iterator<Item = Cow<'a, [u8]>>> LineReader<'a, T> {
    pub fn new(source: T) -> Self {
        LineReader {
            source: source.peekable(),
            number: 0,
        }
    }
}

impl<'a, T: Iterator<Item = Cow<'a, [u8]>>> Iterator for LineReader<'a, T> {
    type Item = Result<Line<'a>, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = self.source.next()?;
        self.number += 1;
        let number = self.number;

        while self
            .source
            .peek()
            .is_some_and(|next| matches!(next.first().copied(), Some(b' ' | b'\t')))
        {
            // A continuation line; drop the single leading whitespace octet.
            let continuation = self.source.next()?;
            self.number += 1;
            buf.to_mut().extend_from_slice(&continuation[1..]);
        }

        let inner = match buf {
            Cow::Borrowed(bytes) => match std::str::from_utf8(bytes) {
                Ok(string) => Cow::Borrowed(string),
                Err(_) => return Some(Err(LineError::InvalidUtf8(number))),
            },
            Cow::Owned(bytes) => match String::from_utf8(bytes) {
                Ok(string) => Cow::Owned(string),
                Err(_) => return Some(Err(LineError::InvalidUtf8(number))),
            },
        };
        Some(Ok(Line { inner, number }))
    }
}
