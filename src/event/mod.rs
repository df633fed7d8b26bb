use std::collections::HashMap;

use chrono::{DateTime, Duration};

use crate::parser::ContentLine;
use crate::types::Tz;

pub mod builder;
pub use builder::{EventBuilder, FinishedEvent};

/// A participant listed on an `ATTENDEE` property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attendee {
    pub cn: Option<String>,
    pub directory_dn: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub kind: Option<String>,
    /// The raw property value, usually a `mailto:` URI.
    pub value: String,
    pub email: Option<String>,
    /// `X-*` parameters, names uppercased, values verbatim (quotes kept).
    pub custom_attributes: HashMap<String, String>,
}

impl Attendee {
    pub fn from_content_line(line: &ContentLine) -> Self {
        let mut attendee = Attendee {
            value: line.value.clone(),
            email: line.value.strip_prefix("mailto:").map(str::to_owned),
            ..Default::default()
        };
        for (name, value) in line.params.iter() {
            match name {
                "CN" => attendee.cn = Some(value.to_owned()),
                "DIR" => attendee.directory_dn = Some(value.to_owned()),
                "PARTSTAT" => attendee.status = Some(value.to_owned()),
                "ROLE" => attendee.role = Some(value.to_owned()),
                "CUTYPE" => attendee.kind = Some(value.to_owned()),
                name if name.starts_with("X-") => {
                    attendee
                        .custom_attributes
                        .insert(name.to_owned(), value.to_owned());
                }
                _ => {}
            }
        }
        attendee
    }
}

/// One concrete calendar event occurrence.
///
/// For a recurring event this is a single expanded instance; for a plain
/// event it is the event itself. `properties` keeps every raw content
/// line the event was assembled from, for error reporting and for
/// consumers interested in properties this crate does not interpret.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub class: Option<String>,
    pub status: Option<String>,
    pub transparency: Option<String>,
    pub url: Option<String>,
    pub organizer: Option<String>,
    pub method: Option<String>,
    pub sequence: Option<u32>,
    pub start: Option<DateTime<Tz>>,
    pub end: Option<DateTime<Tz>>,
    pub stamp: Option<DateTime<Tz>>,
    pub created: Option<DateTime<Tz>>,
    pub last_modified: Option<DateTime<Tz>>,
    pub duration: Option<Duration>,
    pub is_all_day: bool,
    pub is_recurring: bool,
    /// Raw `RRULE` value.
    pub recurrence_rule: Option<String>,
    /// Raw `RECURRENCE-ID` value.
    pub recurrence_id: Option<String>,
    pub exclude_dates: Vec<DateTime<Tz>>,
    pub attendees: Vec<Attendee>,
    pub categories: Vec<String>,
    pub comments: Vec<String>,
    /// `X-*` event properties, latest value wins.
    pub custom_attributes: HashMap<String, String>,
    /// False when an attribute or validation error was tolerated on this
    /// event (`StrictMode::FailAttribute`).
    pub valid: bool,
    pub properties: Vec<ContentLine>,
}
