//! Board points and moves.
//!
//! Coordinates use the GTP text form: a column letter from `A` to `Z`
//! skipping `I`, followed by the 1-based row counted from the bottom
//! (`D4`, `Q16`).

use std::fmt;

use crate::color::Color;
use crate::constants::{COLUMN_LETTERS, MAX_BOARD_SIZE};
use crate::error::ParseError;

/// A point on the board. `x` is the column from the left, `y` the row from
/// the bottom, both zero-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: u8,
    pub y: u8,
}

impl Point {
    /// # Panics
    /// If either coordinate is not below [`MAX_BOARD_SIZE`].
    pub fn new(x: usize, y: usize) -> Self {
        assert!(
            x < MAX_BOARD_SIZE && y < MAX_BOARD_SIZE,
            "point ({x}, {y}) out of range"
        );
        Self {
            x: x as u8,
            y: y as u8,
        }
    }

    pub fn is_on_board(self, board_size: usize) -> bool {
        (self.x as usize) < board_size && (self.y as usize) < board_size
    }

    /// Parse a coordinate string (e.g. `"D4"`) for a board of the given size.
    ///
    /// Column letters are case-insensitive. Fails if the text is malformed or
    /// the point lies outside the board.
    pub fn parse(s: &str, board_size: usize) -> Result<Point, ParseError> {
        let invalid = || ParseError::InvalidCoordinate(s.to_string());
        let bytes = s.trim().as_bytes();
        if bytes.len() < 2 {
            return Err(invalid());
        }

        let col_char = bytes[0].to_ascii_uppercase();
        let x = COLUMN_LETTERS
            .iter()
            .position(|&c| c == col_char)
            .ok_or_else(invalid)?;

        let digits = &bytes[1..];
        if !digits.iter().all(u8::is_ascii_digit) || digits.len() > 2 {
            return Err(invalid());
        }
        let row = digits
            .iter()
            .fold(0usize, |acc, &b| acc * 10 + (b - b'0') as usize);
        if row == 0 || x >= board_size || row > board_size || row > MAX_BOARD_SIZE {
            return Err(invalid());
        }
        Ok(Point::new(x, row - 1))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = COLUMN_LETTERS[self.x as usize] as char;
        write!(f, "{c}{}", self.y as usize + 1)
    }
}

/// A move: the acting color and a point, or `None` for a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub color: Color,
    pub point: Option<Point>,
}

impl Move {
    pub fn new(color: Color, point: Option<Point>) -> Self {
        Self { color, point }
    }

    pub fn pass(color: Color) -> Self {
        Self { color, point: None }
    }

    pub fn is_pass(&self) -> bool {
        self.point.is_none()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.point {
            Some(p) => write!(f, "{} {p}", self.color.to_sgf()),
            None => write!(f, "{} pass", self.color.to_sgf()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corners() {
        assert_eq!(Point::parse("A1", 19), Ok(Point::new(0, 0)));
        assert_eq!(Point::parse("T19", 19), Ok(Point::new(18, 18)));
        assert_eq!(Point::parse("j9", 9), Ok(Point::new(8, 8)));
    }

    #[test]
    fn test_parse_skips_i() {
        assert_eq!(Point::parse("H1", 19), Ok(Point::new(7, 0)));
        assert_eq!(Point::parse("J1", 19), Ok(Point::new(8, 0)));
        assert!(Point::parse("I1", 19).is_err());
    }

    #[test]
    fn test_parse_rejects_off_board() {
        assert!(Point::parse("K1", 9).is_err());
        assert!(Point::parse("A10", 9).is_err());
        assert!(Point::parse("A0", 9).is_err());
        assert!(Point::parse("", 9).is_err());
        assert!(Point::parse("D4x", 19).is_err());
    }

    #[test]
    fn test_str_coord_roundtrip() {
        for x in 0..MAX_BOARD_SIZE {
            for y in 0..MAX_BOARD_SIZE {
                let p = Point::new(x, y);
                let s = p.to_string();
                assert_eq!(Point::parse(&s, MAX_BOARD_SIZE), Ok(p), "failed for {s}");
            }
        }
    }

    #[test]
    fn test_move_display() {
        assert_eq!(Move::new(Color::Black, Some(Point::new(3, 3))).to_string(), "B D4");
        assert_eq!(Move::pass(Color::White).to_string(), "W pass");
        assert!(Move::pass(Color::White).is_pass());
    }
}
