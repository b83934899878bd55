pub mod bits;
pub mod parse_rle;
pub mod parse_util;
pub mod render;
pub mod rule_set;
pub mod universe;

pub use rule_set::RuleSet;
pub use universe::Universe;
pub use universe::UniverseError;
