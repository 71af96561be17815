//! Player colors and the two-slot per-color container.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::error::ParseError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// Both colors, Black first.
    pub const ALL: [Color; 2] = [Color::Black, Color::White];

    pub fn other(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Single-letter SGF form (`B` or `W`).
    pub fn to_sgf(self) -> &'static str {
        match self {
            Color::Black => "B",
            Color::White => "W",
        }
    }

    /// Element name used for moves of this color.
    pub fn tag(self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::White => "White",
        }
    }

    fn slot(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Color {
    type Err = ParseError;

    /// Accepts `B`, `W`, `black` and `white` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.eq_ignore_ascii_case("b") || t.eq_ignore_ascii_case("black") {
            Ok(Color::Black)
        } else if t.eq_ignore_ascii_case("w") || t.eq_ignore_ascii_case("white") {
            Ok(Color::White)
        } else {
            Err(ParseError::InvalidColor(s.to_string()))
        }
    }
}

/// A value for each of the two colors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlackWhite<T> {
    slots: [T; 2],
}

impl<T> BlackWhite<T> {
    pub fn new(black: T, white: T) -> Self {
        Self {
            slots: [black, white],
        }
    }

    pub fn get(&self, c: Color) -> &T {
        &self.slots[c.slot()]
    }

    pub fn set(&mut self, c: Color, value: T) {
        self.slots[c.slot()] = value;
    }

    /// Iterate over `(color, value)` pairs, Black first.
    pub fn iter(&self) -> impl Iterator<Item = (Color, &T)> {
        Color::ALL.into_iter().zip(self.slots.iter())
    }
}

impl<T: Clone> BlackWhite<T> {
    pub fn both(value: T) -> Self {
        Self::new(value.clone(), value)
    }
}

impl<T> Index<Color> for BlackWhite<T> {
    type Output = T;

    fn index(&self, c: Color) -> &T {
        self.get(c)
    }
}

impl<T> IndexMut<Color> for BlackWhite<T> {
    fn index_mut(&mut self, c: Color) -> &mut T {
        &mut self.slots[c.slot()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other() {
        assert_eq!(Color::Black.other(), Color::White);
        assert_eq!(Color::White.other(), Color::Black);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!("B".parse::<Color>(), Ok(Color::Black));
        assert_eq!("white".parse::<Color>(), Ok(Color::White));
        assert_eq!("w".parse::<Color>(), Ok(Color::White));
        assert!("x".parse::<Color>().is_err());
    }

    #[test]
    fn test_black_white_index() {
        let mut bw = BlackWhite::both(0);
        bw[Color::White] = 7;
        assert_eq!(bw[Color::Black], 0);
        assert_eq!(*bw.get(Color::White), 7);
        let pairs: Vec<_> = bw.iter().map(|(c, v)| (c, *v)).collect();
        assert_eq!(pairs, vec![(Color::Black, 0), (Color::White, 7)]);
    }
}
