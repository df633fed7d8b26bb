mod timezone;
pub use timezone::{Tz, TzMapper, TzOffset, load_timezone};

mod datetime;
pub use datetime::{TimeKind, TimeResolver, TimestampError};

mod duration;
pub use duration::{InvalidDuration, parse_duration};
