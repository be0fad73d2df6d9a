pub mod date;
pub mod macros;
pub mod mask;

pub use date::{parse_free_date, DateParseError};
pub use mask::*;
