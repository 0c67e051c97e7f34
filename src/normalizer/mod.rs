//! Single boundary between loosely-shaped backend payloads and the
//! canonical round/analysis types used everywhere else.

pub mod aliases;
pub mod analysis;
pub mod round;
pub mod types;

pub use analysis::{is_domain_analysis_shape, normalize_analysis, parse_analysis, parse_domain_analysis};
pub use round::{analysis_present, normalize_round, normalize_rounds, parse_answers};
pub use types::*;
