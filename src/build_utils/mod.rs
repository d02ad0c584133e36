pub mod boardstore;
pub mod xsa_parser;

pub use boardstore::{Board, BoardStore, Family, DEFAULT_MANUFACTURERS};
pub use xsa_parser::XsaParser;
