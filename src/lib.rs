//! go-record: game records for the game of Go.
//!
//! This crate provides the record model of a Go game (a tree of nodes with
//! moves, setup stones, clock readings and game metadata) and a lossless
//! mapping between that tree and an XML document format aligned with SGF.
//!
//! ## Modules
//!
//! - [`constants`] - Board size limits and format constants
//! - [`color`] - Player colors and the per-color container
//! - [`go`] - Points, moves and coordinate text
//! - [`komi`] - Half-point komi values
//! - [`game_info`] - Player names, ranks, komi, time settings, result
//! - [`node`] - Tree vertices
//! - [`tree`] - The game tree arena and navigation
//! - [`clock`] - Game clock with byo-yomi and listeners
//! - [`xml`] - Document writer and reader
//!
//! ## Example
//!
//! ```
//! use go_record::color::Color;
//! use go_record::go::{Move, Point};
//! use go_record::komi::Komi;
//! use go_record::tree::GameTree;
//! use go_record::xml;
//!
//! let mut tree = GameTree::new(19).unwrap();
//! let root = tree.root();
//! tree.create_game_info(root).unwrap().set_komi(Komi::new(6.5).unwrap());
//! tree.append_move(root, Move::new(Color::Black, Some(Point::new(3, 3)))).unwrap();
//!
//! let text = xml::to_string(&tree, None);
//! assert!(text.contains("<Black number=\"1\" at=\"D4\"/>"));
//! assert_eq!(xml::read_str(&text).unwrap(), tree);
//! ```

pub mod clock;
pub mod color;
pub mod constants;
pub mod error;
pub mod game_info;
pub mod go;
pub mod komi;
pub mod node;
pub mod tree;
pub mod xml;
