pub mod logging;
mod repr_dict;

pub use logging::{init_logging, parse_level};
pub use repr_dict::ReprDict;
