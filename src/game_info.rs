//! Game metadata attached to the root of a game tree.

use std::fmt;

use crate::color::{BlackWhite, Color};
use crate::komi::Komi;

/// Byo-yomi period: `time` seconds for every `moves` moves.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Byoyomi {
    pub time: u64,
    pub moves: u32,
}

/// Time system: main time followed by optional byo-yomi periods.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeSettings {
    /// Main time in seconds.
    pub main_time: u64,
    pub byoyomi: Option<Byoyomi>,
}

impl TimeSettings {
    /// Sudden death: main time only.
    pub fn sudden_death(main_time: u64) -> Self {
        Self {
            main_time,
            byoyomi: None,
        }
    }

    pub fn with_byoyomi(main_time: u64, time: u64, moves: u32) -> Self {
        Self {
            main_time,
            byoyomi: Some(Byoyomi { time, moves }),
        }
    }
}

fn write_duration(f: &mut fmt::Formatter<'_>, seconds: u64) -> fmt::Result {
    if seconds % 60 == 0 {
        write!(f, "{} min", seconds / 60)
    } else {
        write!(f, "{seconds} s")
    }
}

impl fmt::Display for TimeSettings {
    /// Formats as `10 min + 5 min / 25 moves`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_duration(f, self.main_time)?;
        if let Some(b) = self.byoyomi {
            f.write_str(" + ")?;
            write_duration(f, b.time)?;
            write!(f, " / {} moves", b.moves)?;
        }
        Ok(())
    }
}

/// Metadata for one game.
///
/// Empty strings mean "unknown" for names and ranks; all other fields are
/// absent when `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameInfo {
    pub players: BlackWhite<String>,
    pub ranks: BlackWhite<String>,
    pub komi: Option<Komi>,
    pub handicap: Option<u32>,
    pub rules: Option<String>,
    pub time_settings: Option<TimeSettings>,
    pub date: Option<String>,
    pub event: Option<String>,
    pub round: Option<String>,
    pub place: Option<String>,
    pub source: Option<String>,
    pub result: Option<String>,
    pub comment: Option<String>,
}

impl GameInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_komi(&mut self, komi: Komi) -> &mut Self {
        self.komi = Some(komi);
        self
    }

    pub fn set_player(&mut self, c: Color, name: impl Into<String>) -> &mut Self {
        self.players[c] = name.into();
        self
    }

    pub fn set_rank(&mut self, c: Color, rank: impl Into<String>) -> &mut Self {
        self.ranks[c] = rank.into();
        self
    }

    pub fn set_result(&mut self, result: impl Into<String>) -> &mut Self {
        self.result = Some(result.into());
        self
    }

    pub fn set_time_settings(&mut self, settings: TimeSettings) -> &mut Self {
        self.time_settings = Some(settings);
        self
    }

    pub fn player(&self, c: Color) -> &str {
        &self.players[c]
    }

    pub fn rank(&self, c: Color) -> &str {
        &self.ranks[c]
    }

    /// True if no field carries a value.
    pub fn is_empty(&self) -> bool {
        *self == GameInfo::default()
    }

    /// One-line description, e.g. `Honinbo [9d] vs. Meijin [8d]`.
    pub fn summary(&self) -> String {
        let side = |c: Color| {
            let name = if self.players[c].is_empty() {
                c.tag()
            } else {
                self.players[c].as_str()
            };
            if self.ranks[c].is_empty() {
                name.to_string()
            } else {
                format!("{name} [{}]", self.ranks[c])
            }
        };
        let mut s = format!("{} vs. {}", side(Color::White), side(Color::Black));
        if let Some(result) = &self.result {
            s.push_str(&format!(" ({result})"));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let mut info = GameInfo::new();
        assert!(info.is_empty());
        info.set_komi(Komi::from_half_points(13));
        assert!(!info.is_empty());
    }

    #[test]
    fn test_time_settings_display() {
        assert_eq!(TimeSettings::sudden_death(600).to_string(), "10 min");
        assert_eq!(
            TimeSettings::with_byoyomi(600, 300, 25).to_string(),
            "10 min + 5 min / 25 moves"
        );
        assert_eq!(TimeSettings::sudden_death(90).to_string(), "90 s");
    }

    #[test]
    fn test_summary() {
        let mut info = GameInfo::new();
        info.set_player(Color::Black, "Shusaku")
            .set_player(Color::White, "Gennan")
            .set_rank(Color::Black, "4d")
            .set_result("B+2");
        assert_eq!(info.summary(), "Gennan vs. Shusaku [4d] (B+2)");
    }
}
