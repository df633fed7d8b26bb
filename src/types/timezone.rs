use chrono::{FixedOffset, MappedLocalTime, NaiveDate, NaiveDateTime, Offset, TimeZone};
use derive_more::{Display, From};
use std::str::FromStr;

/// Injectable TZID resolver, consulted before the IANA database.
pub type TzMapper = fn(&str) -> Option<chrono_tz::Tz>;

/// A timezone an event timestamp can live in: the ambient local zone of
/// the process, or a named zone from the IANA database.
#[derive(Debug, Clone, Copy, From, PartialEq, Eq)]
pub enum Tz {
    Local,
    Olson(chrono_tz::Tz),
}

impl Tz {
    pub const UTC: Self = Self::Olson(chrono_tz::UTC);

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Local => "Local",
            Self::Olson(tz) => tz.name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TzOffset {
    Local(FixedOffset),
    Olson(chrono_tz::TzOffset),
}

impl Offset for TzOffset {
    fn fix(&self) -> FixedOffset {
        match self {
            Self::Local(offset) => *offset,
            Self::Olson(offset) => offset.fix(),
        }
    }
}

impl TimeZone for Tz {
    type Offset = TzOffset;

    fn from_offset(offset: &Self::Offset) -> Self {
        match offset {
            TzOffset::Local(_) => Self::Local,
            TzOffset::Olson(offset) => Self::Olson(chrono_tz::Tz::from_offset(offset)),
        }
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> MappedLocalTime<Self::Offset> {
        match self {
            Self::Local => chrono::Local
                .offset_from_local_date(local)
                .map(TzOffset::Local),
            Self::Olson(tz) => tz.offset_from_local_date(local).map(TzOffset::Olson),
        }
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> MappedLocalTime<Self::Offset> {
        match self {
            Self::Local => chrono::Local
                .offset_from_local_datetime(local)
                .map(TzOffset::Local),
            Self::Olson(tz) => tz.offset_from_local_datetime(local).map(TzOffset::Olson),
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> Self::Offset {
        match self {
            Self::Local => TzOffset::Local(chrono::Local.offset_from_utc_date(utc)),
            Self::Olson(tz) => TzOffset::Olson(tz.offset_from_utc_date(utc)),
        }
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> Self::Offset {
        match self {
            Self::Local => TzOffset::Local(chrono::Local.offset_from_utc_datetime(utc)),
            Self::Olson(tz) => TzOffset::Olson(tz.offset_from_utc_datetime(utc)),
        }
    }
}

/// Look a TZID up in the IANA database, tolerating sloppy casing.
///
/// Feeds in the wild carry identifiers like `EUROPE/BERLIN` or
/// `america/new_york`. When the verbatim lookup fails, each
/// underscore-separated token is lowercased and then title-cased again;
/// the connective words `of` and `es` stay lowercase (`Isle_of_Man`).
pub fn load_timezone(tzid: &str) -> Option<chrono_tz::Tz> {
    let tzid = tzid.trim_matches('"');
    if let Ok(tz) = chrono_tz::Tz::from_str(tzid) {
        return Some(tz);
    }

    let canonical = tzid
        .split('_')
        .map(canonicalise_token)
        .collect::<Vec<_>>()
        .join("_");
    chrono_tz::Tz::from_str(&canonical).ok()
}

fn canonicalise_token(token: &str) -> String {
    let lower = token.to_lowercase();
    if lower == "of" || lower == "es" {
        return lower;
    }

    let mut out = String::with_capacity(lower.len());
    let mut boundary = true;
    for c in lower.chars() {
        if boundary && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        boundary = !c.is_alphabetic();
    }
    out
}
