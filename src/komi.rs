//! Komi, the compensation granted to White, in half points.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// A komi value restricted to multiples of 0.5.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Komi {
    half_points: i32,
}

impl Komi {
    /// Create a komi from a floating point value.
    ///
    /// # Errors
    /// `ParseError::InvalidKomi` if the value is not a finite multiple of 0.5.
    pub fn new(value: f64) -> Result<Komi, ParseError> {
        let doubled = value * 2.0;
        let range = i32::MIN as f64..=i32::MAX as f64;
        if !doubled.is_finite() || doubled.fract() != 0.0 || !range.contains(&doubled) {
            return Err(ParseError::InvalidKomi(value.to_string()));
        }
        Ok(Komi {
            half_points: doubled as i32,
        })
    }

    pub fn from_half_points(half_points: i32) -> Komi {
        Komi { half_points }
    }

    pub fn half_points(self) -> i32 {
        self.half_points
    }

    pub fn value(self) -> f64 {
        self.half_points as f64 / 2.0
    }
}

impl fmt::Display for Komi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.half_points / 2;
        if self.half_points % 2 == 0 {
            write!(f, "{whole}")
        } else if self.half_points < 0 && whole == 0 {
            f.write_str("-0.5")
        } else {
            write!(f, "{whole}.5")
        }
    }
}

impl FromStr for Komi {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidKomi(s.to_string()))?;
        Komi::new(value).map_err(|_| ParseError::InvalidKomi(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_half() {
        assert_eq!(Komi::new(5.5).unwrap().to_string(), "5.5");
        assert_eq!(Komi::new(-3.5).unwrap().to_string(), "-3.5");
        assert_eq!(Komi::new(-0.5).unwrap().to_string(), "-0.5");
    }

    #[test]
    fn test_display_integral_omits_fraction() {
        assert_eq!(Komi::new(6.0).unwrap().to_string(), "6");
        assert_eq!(Komi::new(0.0).unwrap().to_string(), "0");
        assert_eq!(Komi::new(-2.0).unwrap().to_string(), "-2");
    }

    #[test]
    fn test_parse() {
        assert_eq!("6.5".parse::<Komi>(), Ok(Komi::from_half_points(13)));
        assert_eq!("6.0".parse::<Komi>(), Ok(Komi::from_half_points(12)));
        assert_eq!(" 7 ".parse::<Komi>(), Ok(Komi::from_half_points(14)));
    }

    #[test]
    fn test_extreme_values_parse_back() {
        for half in [i32::MIN, i32::MIN + 1, -1, 1, i32::MAX - 1, i32::MAX] {
            let komi = Komi::from_half_points(half);
            assert_eq!(komi.to_string().parse::<Komi>(), Ok(komi), "{komi}");
        }
        assert_eq!(Komi::from_half_points(i32::MIN).to_string(), "-1073741824");
        assert!(Komi::new(1_073_741_824.0).is_err());
    }

    #[test]
    fn test_rejects_non_half_values() {
        assert!(Komi::new(5.25).is_err());
        assert!(Komi::new(f64::NAN).is_err());
        assert!("abc".parse::<Komi>().is_err());
        assert!("0.3".parse::<Komi>().is_err());
    }
}
