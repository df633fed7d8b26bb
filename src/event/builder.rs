//! Assemble a buffer [`Event`] from the attribute lines of one `VEVENT`.

use chrono::{DateTime, Duration};

use crate::event::{Attendee, Event};
use crate::options::DuplicateMode;
use crate::parser::{ContentLine, ParserError};
use crate::types::{TimeKind, TimeResolver, Tz, parse_duration};

/// The outcome of closing a `VEVENT`.
///
/// Validation failures are handed back instead of being raised so the
/// caller can route them through the configured strict mode and still
/// keep the (possibly invalid) event when that mode allows it.
#[derive(Debug)]
pub struct FinishedEvent {
    pub event: Event,
    /// The resolved `RECURRENCE-ID` instant, when the event is an
    /// occurrence override.
    pub recurrence_instant: Option<DateTime<Tz>>,
    pub errors: Vec<ParserError>,
    pub warnings: Vec<ParserError>,
}

#[derive(Debug)]
pub struct EventBuilder {
    event: Event,
    duplicate: DuplicateMode,
    has_dtend: bool,
    dtstart_value: Option<String>,
    recurrence_instant: Option<DateTime<Tz>>,
    warnings: Vec<ParserError>,
}

/// Duplicate-checked scalar assignment from the line value.
macro_rules! scalar {
    ($self:ident, $line:ident, $field:ident) => {
        if $self.on_duplicate($self.event.$field.is_some(), &$line.name)? {
            $self.event.$field = Some($line.value.clone());
        }
    };
}

impl EventBuilder {
    pub fn new(duplicate: DuplicateMode) -> Self {
        EventBuilder {
            event: Event {
                valid: true,
                ..Event::default()
            },
            duplicate,
            has_dtend: false,
            dtstart_value: None,
            recurrence_instant: None,
            warnings: Vec::new(),
        }
    }

    pub fn invalidate(&mut self) {
        self.event.valid = false;
    }

    /// Decide what to do with a non-repeatable key that is already set.
    /// Returns `false` when the incoming occurrence must be ignored.
    fn on_duplicate(&self, present: bool, key: &str) -> Result<bool, ParserError> {
        if !present {
            return Ok(true);
        }
        match self.duplicate {
            DuplicateMode::KeepInvalid => Err(ParserError::DuplicateAttribute(key.to_owned())),
            DuplicateMode::KeepFirst => Ok(false),
            DuplicateMode::KeepLast => Ok(true),
        }
    }

    pub fn apply(&mut self, line: &ContentLine, resolver: &TimeResolver) -> Result<(), ParserError> {
        self.event.properties.push(line.clone());

        match line.name.as_str() {
            "UID" => scalar!(self, line, uid),
            "SUMMARY" => scalar!(self, line, summary),
            "DESCRIPTION" => scalar!(self, line, description),
            "LOCATION" => scalar!(self, line, location),
            "CLASS" => scalar!(self, line, class),
            "STATUS" => scalar!(self, line, status),
            "TRANSP" => scalar!(self, line, transparency),
            "URL" => scalar!(self, line, url),
            "ORGANIZER" => scalar!(self, line, organizer),
            "METHOD" => scalar!(self, line, method),
            "SEQUENCE" => {
                if self.on_duplicate(self.event.sequence.is_some(), &line.name)? {
                    let sequence = line.value.parse().map_err(|_| {
                        ParserError::InvalidPropertyValue("SEQUENCE", line.value.clone())
                    })?;
                    self.event.sequence = Some(sequence);
                }
            }
            "DTSTART" => {
                if self.on_duplicate(self.event.start.is_some(), &line.name)? {
                    self.event.is_all_day =
                        line.params.get_value_type() == Some("DATE") || line.value.len() == 8;
                    self.event.start = Some(resolver.resolve(
                        &line.value,
                        &line.params,
                        TimeKind::Start,
                        false,
                    )?);
                    self.dtstart_value = Some(line.value.clone());
                }
            }
            "DTEND" => {
                if self.on_duplicate(self.has_dtend, &line.name)? {
                    // An all-day event naming its own start day as DTEND
                    // spans that whole day instead of ending before it.
                    let all_day = self.event.is_all_day
                        && self.dtstart_value.as_deref() == Some(line.value.as_str());
                    self.event.end =
                        Some(resolver.resolve(&line.value, &line.params, TimeKind::End, all_day)?);
                    self.has_dtend = true;
                }
            }
            "DTSTAMP" => {
                if self.on_duplicate(self.event.stamp.is_some(), &line.name)? {
                    self.event.stamp = Some(resolver.resolve(
                        &line.value,
                        &line.params,
                        TimeKind::Start,
                        false,
                    )?);
                }
            }
            "CREATED" => {
                if self.on_duplicate(self.event.created.is_some(), &line.name)? {
                    self.event.created = Some(resolver.resolve(
                        &line.value,
                        &line.params,
                        TimeKind::Start,
                        false,
                    )?);
                }
            }
            "LAST-MODIFIED" => {
                if self.on_duplicate(self.event.last_modified.is_some(), &line.name)? {
                    self.event.last_modified = Some(resolver.resolve(
                        &line.value,
                        &line.params,
                        TimeKind::Start,
                        false,
                    )?);
                }
            }
            "DURATION" => {
                if self.on_duplicate(self.event.duration.is_some(), &line.name)? {
                    let duration = parse_duration(&line.value)?;
                    self.event.duration = Some(duration);
                    if !self.has_dtend
                        && let Some(start) = self.event.start
                    {
                        self.event.end = Some(start + duration);
                    }
                }
            }
            "RRULE" => {
                if self.on_duplicate(self.event.recurrence_rule.is_some(), &line.name)? {
                    self.event.recurrence_rule = Some(line.value.clone());
                    self.event.is_recurring = true;
                }
            }
            "RECURRENCE-ID" => {
                if self.on_duplicate(self.event.recurrence_id.is_some(), &line.name)? {
                    self.recurrence_instant = Some(resolver.resolve(
                        &line.value,
                        &line.params,
                        TimeKind::Start,
                        false,
                    )?);
                    self.event.recurrence_id = Some(line.value.clone());
                }
            }
            "EXDATE" => {
                for value in line.value.split(',').filter(|value| !value.is_empty()) {
                    let instant =
                        resolver.resolve(value, &line.params, TimeKind::Start, false)?;
                    self.event.exclude_dates.push(instant);
                }
            }
            "ATTENDEE" => self.event.attendees.push(Attendee::from_content_line(line)),
            "CATEGORIES" => self.event.categories.extend(
                line.value
                    .split(',')
                    .filter(|value| !value.is_empty())
                    .map(str::to_owned),
            ),
            "COMMENT" => self.event.comments.push(line.value.clone()),
            name if name.starts_with("X-") => {
                self.event
                    .custom_attributes
                    .insert(name.to_owned(), line.value.clone());
            }
            name => self
                .warnings
                .push(ParserError::UnknownProperty(name.to_owned())),
        }
        Ok(())
    }

    pub fn finish(mut self, calendar_method: Option<&str>) -> FinishedEvent {
        let mut errors = Vec::new();
        if self.event.uid.is_none() {
            errors.push(ParserError::MissingProperty("UID"));
        }
        if self.event.stamp.is_none() {
            errors.push(ParserError::MissingProperty("DTSTAMP"));
        }
        if self.has_dtend && self.event.duration.is_some() {
            errors.push(ParserError::PropertyConflict(
                "both DTEND and DURATION are defined",
            ));
        }

        // DURATION seen before DTSTART could not synthesise the end yet.
        if self.event.end.is_none()
            && let (Some(start), Some(duration)) = (self.event.start, self.event.duration)
        {
            self.event.end = Some(start + duration);
        }

        // An all-day event with identical DTSTART/DTEND went through the
        // exclusive-midnight path and now ends before it starts; it spans
        // its whole start day.
        if self.event.is_all_day
            && let (Some(start), Some(end)) = (self.event.start, self.event.end)
            && end < start
        {
            self.event.end = Some(end + Duration::days(1));
        }

        if self.event.method.is_none() {
            self.event.method = calendar_method.map(str::to_owned);
        }

        FinishedEvent {
            event: self.event,
            recurrence_instant: self.recurrence_instant,
            errors,
            warnings: self.warnings,
        }
    }
}
