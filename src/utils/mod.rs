pub mod constants;
pub mod logging;
pub mod parsing;
pub mod progress;

pub use constants::*;
pub use logging::init_logging;
pub use parsing::{parse_comma_decimal, parse_float_prefix};
pub use progress::ProgressReporter;
