//! Error types for tree manipulation, value parsing and document reading.

use thiserror::Error;

use crate::go::Point;
use crate::node::NodeId;

/// Structural misuse of a [`GameTree`](crate::tree::GameTree).
///
/// These are programming errors: the operation is rejected and the tree is
/// left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} already has a father")]
    AlreadyAttached(NodeId),
    #[error("node {0} is the root")]
    IsRoot(NodeId),
    #[error("appending node {child} to node {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("game info can only be attached to the root, not node {0}")]
    GameInfoNotRoot(NodeId),
    #[error("node {0} already has game info")]
    GameInfoExists(NodeId),
    #[error("SGF property {0} is stored in a dedicated node field")]
    ReservedProperty(String),
    #[error("invalid board size {0}")]
    InvalidBoardSize(usize),
    #[error("point {point} is off the {board_size}x{board_size} board")]
    PointOffBoard { point: Point, board_size: usize },
}

/// Invalid text for a value type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid coordinate '{0}'")]
    InvalidCoordinate(String),
    #[error("invalid komi '{0}'")]
    InvalidKomi(String),
    #[error("invalid color '{0}'")]
    InvalidColor(String),
}

/// Failure to read a document.
///
/// Reading is all-or-nothing: no tree is produced when an error is returned.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed document at byte {position}: {reason}")]
    Malformed { position: u64, reason: String },
}

impl ReadError {
    pub(crate) fn malformed(position: u64, reason: impl Into<String>) -> Self {
        ReadError::Malformed {
            position,
            reason: reason.into(),
        }
    }
}
