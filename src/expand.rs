//! Expand a recurring buffer event into concrete occurrences.

use chrono::{DateTime, Utc};
use rrule::RRuleSet;

use crate::event::Event;
use crate::parser::ParserError;
use crate::types::Tz;

const EXPANSION_LIMIT: u16 = u16::MAX;
const DATETIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const DATETIME_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Produce one [`Event`] per rule occurrence whose start falls inside
/// `[window_start, window_end]` (both bounds inclusive), minus the
/// event's exclusion dates.
///
/// The rule is evaluated in the timezone of the event's start, and every
/// occurrence keeps the length of the buffer event
/// (`End - Start`).
pub fn expand_event(
    buf: &Event,
    window_start: DateTime<Tz>,
    window_end: DateTime<Tz>,
) -> Result<Vec<Event>, ParserError> {
    let rule = buf
        .recurrence_rule
        .as_deref()
        .ok_or(ParserError::MissingProperty("RRULE"))?;
    let start = buf.start.ok_or(ParserError::MissingProperty("DTSTART"))?;
    let end = buf.end.ok_or(ParserError::MissingProperty("DTEND"))?;
    let zone = start.timezone();

    // The evaluator takes the rule in its iCalendar form, with DTSTART
    // carrying the zone the rule is evaluated in. Exclusions are matched
    // by instant, so they can uniformly go over as UTC.
    let dtstart = match zone {
        Tz::Local => format!("DTSTART:{}", start.format(DATETIME_FORMAT)),
        Tz::Olson(chrono_tz::Tz::UTC) => {
            format!("DTSTART:{}", start.format(DATETIME_UTC_FORMAT))
        }
        Tz::Olson(tz) => format!(
            "DTSTART;TZID={}:{}",
            tz.name(),
            start.format(DATETIME_FORMAT)
        ),
    };
    let mut source = vec![dtstart, format!("RRULE:{rule}")];
    for exclude in &buf.exclude_dates {
        source.push(format!(
            "EXDATE:{}",
            exclude.with_timezone(&Utc).format(DATETIME_UTC_FORMAT)
        ));
    }

    let set: RRuleSet = source.join("\n").parse()?;
    let set = set
        .after(window_start.with_timezone(&rrule::Tz::UTC))
        .before(window_end.with_timezone(&rrule::Tz::UTC));

    let length = end - start;
    let occurrences = set.all(EXPANSION_LIMIT).dates;

    Ok(occurrences
        .into_iter()
        .map(|occurrence| {
            let start = occurrence.with_timezone(&zone);
            let mut event = buf.clone();
            event.start = Some(start);
            event.end = Some(start + length);
            event
        })
        .collect())
}
