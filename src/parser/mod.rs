mod error;
pub use error::ParserError;

mod line;
pub use line::{BytesLines, Line, LineError, LineReader};

mod content_line;
pub use content_line::{ContentLine, ContentLineError, ContentLineParams, ContentLineParser};
