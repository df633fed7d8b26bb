use chrono::DateTime;

use crate::types::Tz;
pub use crate::types::TzMapper;

/// How errors encountered while parsing propagate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrictMode {
    /// The first error aborts the whole feed.
    #[default]
    FailFeed,
    /// The offending event is dropped and parsing continues.
    FailEvent,
    /// The offending attribute is skipped, the event is kept with
    /// `valid = false`, and parsing continues.
    FailAttribute,
}

/// What happens when a non-repeatable property appears twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateMode {
    /// Treat the duplicate as an error, routed through [`StrictMode`].
    #[default]
    KeepInvalid,
    /// Ignore every occurrence after the first.
    KeepFirst,
    /// Let later occurrences overwrite earlier ones.
    KeepLast,
}

#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Lower window bound. Non-recurring events ending before it are
    /// dropped; recurrence expansion starts here.
    pub start: Option<DateTime<Tz>>,
    /// Upper window bound (inclusive for expansion).
    pub end: Option<DateTime<Tz>>,
    pub strict: StrictMode,
    pub duplicate: DuplicateMode,
    /// Zone `DATE` values (all-day events) materialise in.
    pub all_day_tz: Tz,
    /// Bypass window filtering of assembled events.
    pub skip_bounds: bool,
    /// Consulted for `TZID` parameters before the IANA database.
    pub tz_mapper: Option<TzMapper>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            start: None,
            end: None,
            strict: StrictMode::default(),
            duplicate: DuplicateMode::default(),
            all_day_tz: Tz::UTC,
            skip_bounds: false,
            tz_mapper: None,
        }
    }
}
