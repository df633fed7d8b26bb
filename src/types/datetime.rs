//! Resolve raw `DATE` / `DATE-TIME` property values into zoned timestamps.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use super::{Tz, TzMapper, load_timezone};
use crate::parser::ContentLineParams;

const DATE_FORMAT: &str = "%Y%m%d";
const DATETIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const DATETIME_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Whether a value is the opening or the closing bound of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKind {
    Start,
    End,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("invalid timestamp {0:?}: {1}")]
    Parse(String, chrono::format::ParseError),
    #[error("timestamp {0:?} does not exist in timezone {1}")]
    Nonexistent(String, String),
}

/// Timestamp resolver for one calendar.
///
/// `local_tz` is the zone `DATE` values materialise in; `calendar_tz` is
/// the calendar-scope display zone for UTC and floating values. A `TZID`
/// parameter overrides both: the named zone is used for parsing and kept
/// as the result zone. An unknown `TZID` falls back to `calendar_tz`
/// rather than failing the property.
#[derive(Debug, Clone)]
pub struct TimeResolver {
    pub local_tz: Tz,
    pub calendar_tz: Tz,
    pub tz_mapper: Option<TzMapper>,
}

impl TimeResolver {
    pub fn resolve(
        &self,
        value: &str,
        params: &ContentLineParams,
        kind: TimeKind,
        all_day: bool,
    ) -> Result<DateTime<Tz>, TimestampError> {
        // DATE values carry no time information; they materialise in the
        // resolver-local zone. The end of an all-day event covers its
        // whole last day, every other end bound is an exclusive midnight.
        if params.get_value_type() == Some("DATE") || value.len() == 8 {
            let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
                .map_err(|err| TimestampError::Parse(value.to_owned(), err))?;
            let time = match (kind, all_day) {
                (TimeKind::End, true) => {
                    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
                }
                _ => NaiveTime::MIN,
            };
            let resolved = in_zone(date.and_time(time), self.local_tz, value)?;
            return Ok(match (kind, all_day) {
                (TimeKind::End, false) => resolved - Duration::milliseconds(1),
                _ => resolved,
            });
        }

        if value.ends_with('Z') {
            let naive = NaiveDateTime::parse_from_str(value, DATETIME_UTC_FORMAT)
                .map_err(|err| TimestampError::Parse(value.to_owned(), err))?;
            return Ok(Utc.from_utc_datetime(&naive).with_timezone(&self.calendar_tz));
        }

        let naive = NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
            .map_err(|err| TimestampError::Parse(value.to_owned(), err))?;

        if let Some(tzid) = params.get_tzid().filter(|tzid| !tzid.is_empty()) {
            let zone = self
                .lookup(tzid)
                .map(Tz::Olson)
                .unwrap_or(self.calendar_tz);
            return in_zone(naive, zone, value);
        }

        // Floating time: parse in the ambient local zone, display in the
        // calendar zone.
        Ok(in_zone(naive, Tz::Local, value)?.with_timezone(&self.calendar_tz))
    }

    fn lookup(&self, tzid: &str) -> Option<chrono_tz::Tz> {
        let tzid = tzid.trim_matches('"');
        if let Some(mapper) = self.tz_mapper
            && let Some(tz) = mapper(tzid)
        {
            return Some(tz);
        }
        load_timezone(tzid)
    }
}

fn in_zone(naive: NaiveDateTime, zone: Tz, raw: &str) -> Result<DateTime<Tz>, TimestampError> {
    zone.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| TimestampError::Nonexistent(raw.to_owned(), zone.name().to_owned()))
}
