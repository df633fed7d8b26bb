//! Parse an iCalendar stream into windowed event occurrences.
//!
//! [`CalendarParser`] consumes content lines, tracks `BEGIN`/`END`
//! nesting, and interprets exactly two block types: `VCALENDAR` for
//! calendar-level properties and `VEVENT` directly below it for events.
//! Everything else (`VTIMEZONE`, `VALARM`, vendor blocks, arbitrarily
//! nested unknown blocks) is consumed and skipped.
//!
//! # Examples
//!
//! ```rust
//! use icalfeed::CalendarParser;
//!
//! let ics = "BEGIN:VCALENDAR\r\n\
//!     BEGIN:VEVENT\r\n\
//!     UID:breakfast@example.org\r\n\
//!     DTSTAMP:20180101T080000Z\r\n\
//!     DTSTART:20180102T090000Z\r\n\
//!     DTEND:20180102T100000Z\r\n\
//!     SUMMARY:Breakfast\r\n\
//!     END:VEVENT\r\n\
//!     END:VCALENDAR\r\n";
//!
//! let mut parser = CalendarParser::from_slice(ics.as_bytes());
//! parser.parse().unwrap();
//! assert_eq!(parser.events.len(), 1);
//! assert_eq!(parser.events[0].summary.as_deref(), Some("Breakfast"));
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::mem;

use chrono::DateTime;

use crate::event::{Event, EventBuilder, FinishedEvent};
use crate::expand::expand_event;
use crate::options::{ParserOptions, StrictMode};
use crate::parser::{BytesLines, ContentLine, ContentLineParser, LineReader, ParserError};
use crate::types::{TimeResolver, Tz, load_timezone};

/// Calendar-level properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarMeta {
    pub prodid: Option<String>,
    pub version: Option<String>,
    pub calscale: Option<String>,
    /// `X-WR-CALNAME`.
    pub name: Option<String>,
    /// Raw `X-WR-TIMEZONE` value, resolvable or not.
    pub timezone: Option<String>,
    /// Remaining `X-*` calendar properties, latest value wins.
    pub custom_attributes: HashMap<String, String>,
}

pub struct CalendarParser<'a, I: Iterator<Item = Cow<'a, [u8]>>> {
    lines: ContentLineParser<'a, I>,
    options: ParserOptions,
    /// Names of the currently open blocks, outermost first.
    stack: Vec<String>,
    buffer: Option<EventBuilder>,
    /// The current buffer event was dropped by `StrictMode::FailEvent`.
    discard: bool,
    calendar_tz: Tz,
    /// `RECURRENCE-ID` carriers, bound against expansions after the feed
    /// is exhausted.
    overrides: Vec<(Event, DateTime<Tz>)>,
    /// Finalized occurrences, in the order described by
    /// [`CalendarParser::parse`].
    pub events: Vec<Event>,
    /// The calendar's `METHOD`.
    pub method: Option<String>,
    pub calendar: CalendarMeta,
    /// Non-fatal errors tolerated by the configured modes, in encounter
    /// order.
    pub warnings: Vec<ParserError>,
}

impl<'a> CalendarParser<'a, BytesLines<'a>> {
    pub fn from_slice(slice: &'a [u8]) -> Self {
        CalendarParser::new(LineReader::from_slice(slice))
    }
}

impl<'a, I: Iterator<Item = Cow<'a, [u8]>>> CalendarParser<'a, I> {
    pub fn new(line_reader: LineReader<'a, I>) -> Self {
        CalendarParser {
            lines: ContentLineParser::new(line_reader),
            options: ParserOptions::default(),
            stack: Vec::new(),
            buffer: None,
            discard: false,
            calendar_tz: Tz::UTC,
            overrides: Vec::new(),
            events: Vec::new(),
            method: None,
            calendar: CalendarMeta::default(),
            warnings: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the pipeline to the end of the input.
    ///
    /// On success `events` holds every occurrence whose start falls
    /// inside the configured window: occurrence overrides first in
    /// source order, then plain events and rule expansions in the order
    /// they were assembled. A feed ending with open blocks is accepted;
    /// an unfinished `VEVENT` at that point is discarded.
    pub fn parse(&mut self) -> Result<(), ParserError> {
        while let Some(next) = self.lines.next() {
            match next {
                Ok(line) if line.name == "BEGIN" => self.begin(&line),
                Ok(line) if line.name == "END" => self.end(&line)?,
                Ok(line) => self.attribute(line)?,
                Err(err) => self.line_error(err.into())?,
            }
        }
        self.buffer = None;
        self.bind_overrides();
        Ok(())
    }

    fn at_calendar_depth(&self) -> bool {
        matches!(self.stack.as_slice(), [top] if top == "VCALENDAR")
    }

    fn at_event_depth(&self) -> bool {
        matches!(self.stack.as_slice(), [cal, event] if cal == "VCALENDAR" && event == "VEVENT")
    }

    fn begin(&mut self, line: &ContentLine) {
        self.stack.push(line.value.to_uppercase());
        if self.at_event_depth() {
            self.buffer = Some(EventBuilder::new(self.options.duplicate));
            self.discard = false;
        }
    }

    fn end(&mut self, line: &ContentLine) -> Result<(), ParserError> {
        let name = line.value.to_uppercase();
        let was_event = self.at_event_depth();
        match self.stack.last() {
            Some(top) if *top == name => self.stack.pop(),
            _ => return Err(ParserError::UnterminatedBlock(name)),
        };
        if was_event {
            self.finalise_event()?;
        }
        Ok(())
    }

    fn attribute(&mut self, line: ContentLine) -> Result<(), ParserError> {
        if self.at_calendar_depth() {
            self.calendar_attribute(line);
            return Ok(());
        }
        if !self.at_event_depth() || self.discard {
            // Outside VCALENDAR/VEVENT, or inside a skipped block.
            return Ok(());
        }
        let resolver = self.resolver();
        let Some(builder) = self.buffer.as_mut() else {
            return Ok(());
        };
        if let Err(err) = builder.apply(&line, &resolver) {
            self.attribute_error(err)?;
        }
        Ok(())
    }

    fn calendar_attribute(&mut self, line: ContentLine) {
        match line.name.as_str() {
            "METHOD" => self.method = Some(line.value),
            "PRODID" => self.calendar.prodid = Some(line.value),
            "VERSION" => self.calendar.version = Some(line.value),
            "CALSCALE" => self.calendar.calscale = Some(line.value),
            "X-WR-CALNAME" => self.calendar.name = Some(line.value),
            "X-WR-TIMEZONE" => {
                if let Some(tz) = load_timezone(&line.value) {
                    self.calendar_tz = Tz::Olson(tz);
                }
                self.calendar.timezone = Some(line.value);
            }
            name if name.starts_with("X-") => {
                self.calendar
                    .custom_attributes
                    .insert(name.to_owned(), line.value);
            }
            name => self
                .warnings
                .push(ParserError::UnknownProperty(name.to_owned())),
        }
    }

    fn resolver(&self) -> TimeResolver {
        TimeResolver {
            local_tz: self.options.all_day_tz,
            calendar_tz: self.calendar_tz,
            tz_mapper: self.options.tz_mapper,
        }
    }

    fn finalise_event(&mut self) -> Result<(), ParserError> {
        let Some(builder) = self.buffer.take() else {
            return Ok(());
        };
        if mem::take(&mut self.discard) {
            return Ok(());
        }

        let FinishedEvent {
            mut event,
            recurrence_instant,
            errors,
            warnings,
        } = builder.finish(self.method.as_deref());
        self.warnings.extend(warnings);

        // Plain events outside the window are skipped before validation.
        if recurrence_instant.is_none() && !event.is_recurring && !self.in_window(&event) {
            return Ok(());
        }

        let mut errors = errors.into_iter();
        if let Some(first) = errors.next() {
            match self.options.strict {
                StrictMode::FailFeed => return Err(first),
                StrictMode::FailEvent => {
                    self.warnings.push(first);
                    self.warnings.extend(errors);
                    return Ok(());
                }
                StrictMode::FailAttribute => {
                    self.warnings.push(first);
                    self.warnings.extend(errors);
                    event.valid = false;
                }
            }
        }

        if let Some(instant) = recurrence_instant {
            self.overrides.push((event, instant));
            return Ok(());
        }

        if event.is_recurring {
            match (self.options.start, self.options.end) {
                (Some(window_start), Some(window_end)) => {
                    match expand_event(&event, window_start, window_end) {
                        Ok(occurrences) => self.events.extend(occurrences),
                        Err(err) => self.expansion_error(err, event)?,
                    }
                }
                _ => self.expansion_error(ParserError::MissingWindow, event)?,
            }
            return Ok(());
        }

        self.events.push(event);
        Ok(())
    }

    fn expansion_error(&mut self, err: ParserError, mut event: Event) -> Result<(), ParserError> {
        match self.options.strict {
            StrictMode::FailFeed => Err(err),
            StrictMode::FailEvent => {
                self.warnings.push(err);
                Ok(())
            }
            StrictMode::FailAttribute => {
                // Keep the master as a single, invalid occurrence.
                self.warnings.push(err);
                event.valid = false;
                if self.in_window(&event) {
                    self.events.push(event);
                }
                Ok(())
            }
        }
    }

    fn attribute_error(&mut self, err: ParserError) -> Result<(), ParserError> {
        match self.options.strict {
            StrictMode::FailFeed => Err(err),
            StrictMode::FailEvent => {
                self.warnings.push(err);
                if self.buffer.is_some() {
                    self.discard = true;
                }
                Ok(())
            }
            StrictMode::FailAttribute => {
                self.warnings.push(err);
                if let Some(builder) = self.buffer.as_mut() {
                    builder.invalidate();
                }
                Ok(())
            }
        }
    }

    fn line_error(&mut self, err: ParserError) -> Result<(), ParserError> {
        if self.at_calendar_depth() || self.at_event_depth() {
            return self.attribute_error(err);
        }
        // Garbage inside skipped blocks or outside any block.
        Ok(())
    }

    fn in_window(&self, event: &Event) -> bool {
        if self.options.skip_bounds {
            return true;
        }
        let (Some(window_start), Some(window_end)) = (self.options.start, self.options.end) else {
            return true;
        };
        let starts_after = event.start.is_some_and(|start| start > window_end);
        let ends_before = event.end.is_some_and(|end| end < window_start);
        !(starts_after || ends_before)
    }

    /// Apply `RECURRENCE-ID` overrides: an override replaces the
    /// expanded occurrence sharing its `UID` and instant; with no base
    /// occurrence in reach it stands alone when its own start is inside
    /// the window. Overrides come first in the final list, in source
    /// order.
    fn bind_overrides(&mut self) {
        if self.overrides.is_empty() {
            return;
        }
        let mut expansions = mem::take(&mut self.events);
        let mut bound = Vec::with_capacity(expansions.len() + self.overrides.len());
        for (event, instant) in mem::take(&mut self.overrides) {
            let base = event.uid.is_some().then(|| {
                expansions.iter().position(|candidate| {
                    candidate.uid == event.uid
                        && candidate.start.is_some_and(|start| start == instant)
                })
            });
            match base.flatten() {
                Some(pos) => {
                    expansions.remove(pos);
                    bound.push(event);
                }
                None => {
                    if self.in_window(&event) {
                        bound.push(event);
                    }
                }
            }
        }
        bound.extend(expansions);
        self.events = bound;
    }
}
