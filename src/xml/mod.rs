//! The XML game record format.
//!
//! The document is a `<Go>` element holding one `<GoGame>` with an
//! `<Information>` block (board size and game info) and a `<Nodes>` block
//! (the flattened game tree). See [`writer`] for the node shapes.

pub mod reader;
pub mod writer;

pub use reader::{read, read_str};
pub use writer::{to_string, write};
