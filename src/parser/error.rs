use crate::{
    parser::ContentLineError,
    types::{InvalidDuration, TimestampError},
};

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ParserError {
    #[error("content line error: {0}")]
    ContentLine(#[from] ContentLineError),
    #[error("END:{0} does not close the innermost open block")]
    UnterminatedBlock(String),
    #[error("unknown property: {0}")]
    UnknownProperty(String),
    #[error("missing property: {0}")]
    MissingProperty(&'static str),
    #[error("duplicate attribute: {0}")]
    DuplicateAttribute(String),
    #[error("property conflict: {0}")]
    PropertyConflict(&'static str),
    #[error("invalid value for {0}: {1:?}")]
    InvalidPropertyValue(&'static str, String),
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
    #[error(transparent)]
    Duration(#[from] InvalidDuration),
    #[error(transparent)]
    RRule(#[from] rrule::RRuleError),
    #[error("a recurring event requires Start and End window bounds")]
    MissingWindow,
}
