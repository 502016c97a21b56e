//! Core data models for pickdraw
//!
//! This module defines the game variants, draw times and the canonical
//! draw record shared by the extractor, the ingestion coordinator and the
//! notification payload.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::ParseError;

/// Lottery game variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Game {
    #[serde(rename = "PICK3")]
    Pick3,
    #[serde(rename = "PICK4")]
    Pick4,
}

impl Game {
    /// All supported games, in run order
    pub const ALL: [Game; 2] = [Game::Pick3, Game::Pick4];

    /// Canonical identifier as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Game::Pick3 => "PICK3",
            Game::Pick4 => "PICK4",
        }
    }

    /// Number of drawn digits for this game
    pub fn digit_count(&self) -> usize {
        match self {
            Game::Pick3 => 3,
            Game::Pick4 => 4,
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Game {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PICK3" => Ok(Game::Pick3),
            "PICK4" => Ok(Game::Pick4),
            _ => Err(ParseError::InvalidGame(s.to_string())),
        }
    }
}

/// Time of day of a drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DrawTime {
    Midday,
    Evening,
}

impl DrawTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawTime::Midday => "MIDDAY",
            DrawTime::Evening => "EVENING",
        }
    }

    /// Match an icon label case-insensitively; anything else is `None`
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "MIDDAY" => Some(DrawTime::Midday),
            "EVENING" => Some(DrawTime::Evening),
            _ => None,
        }
    }
}

impl fmt::Display for DrawTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawTime {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ParseError::InvalidDrawTime(s.to_string()))
    }
}

/// One observed drawing
///
/// `fireball` is an empty string when the page shows no bonus digit; the
/// storage layer maps that to NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawRecord {
    pub game: Game,
    pub draw_time: DrawTime,
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    pub numbers: String,
    #[serde(default)]
    pub fireball: String,
}

impl DrawRecord {
    /// Natural key of this record
    pub fn key(&self) -> DrawKey {
        DrawKey {
            game: self.game,
            date: self.date,
            draw_time: self.draw_time,
        }
    }

    /// Bonus digit as stored (`None` when absent)
    pub fn fireball_opt(&self) -> Option<&str> {
        if self.fireball.is_empty() {
            None
        } else {
            Some(self.fireball.as_str())
        }
    }
}

/// Natural key of a draw: at most one stored row per key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawKey {
    pub game: Game,
    pub date: NaiveDate,
    pub draw_time: DrawTime,
}

impl fmt::Display for DrawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.game,
            self.draw_time,
            self.date.format("%Y-%m-%d")
        )
    }
}

/// A persisted draw row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDraw {
    pub id: i64,
    pub game: Game,
    pub draw_time: DrawTime,
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    pub numbers: String,
    pub fireball: Option<String>,
}

impl StoredDraw {
    pub fn key(&self) -> DrawKey {
        DrawKey {
            game: self.game,
            date: self.date,
            draw_time: self.draw_time,
        }
    }
}

/// Counters produced by one ingestion pass
///
/// `failed` holds records whose insert hit an unexpected store error; they
/// are counted in neither `stored` nor `skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl IngestStats {
    pub fn processed(&self) -> usize {
        self.stored + self.skipped + self.failed
    }
}

/// Per-run summary sent downstream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub pick3: usize,
    pub pick4: usize,
    pub total: usize,
    pub stored: usize,
    pub skipped: usize,
}

/// Outcome of one retrieve run; also the notification payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub ok: bool,
    pub summary: RunSummary,
    pub results: Vec<DrawRecord>,
}

/// `YYYY-MM-DD` serde adapter for `NaiveDate`
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DrawRecord {
        DrawRecord {
            game: Game::Pick3,
            draw_time: DrawTime::Midday,
            date: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
            numbers: "123".to_string(),
            fireball: String::new(),
        }
    }

    #[test]
    fn test_game_from_str_is_case_insensitive() {
        assert_eq!("pick3".parse::<Game>().unwrap(), Game::Pick3);
        assert_eq!("PICK4".parse::<Game>().unwrap(), Game::Pick4);
        assert!(matches!(
            "PICK5".parse::<Game>(),
            Err(ParseError::InvalidGame(_))
        ));
    }

    #[test]
    fn test_draw_time_from_label() {
        assert_eq!(DrawTime::from_label(" Midday "), Some(DrawTime::Midday));
        assert_eq!(DrawTime::from_label("evening"), Some(DrawTime::Evening));
        assert_eq!(DrawTime::from_label("Night"), None);
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["game"], "PICK3");
        assert_eq!(json["drawTime"], "MIDDAY");
        assert_eq!(json["date"], "2025-12-19");
        assert_eq!(json["numbers"], "123");
        assert_eq!(json["fireball"], "");
    }

    #[test]
    fn test_fireball_opt() {
        let mut record = sample();
        assert_eq!(record.fireball_opt(), None);
        record.fireball = "7".to_string();
        assert_eq!(record.fireball_opt(), Some("7"));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(sample().key().to_string(), "PICK3 MIDDAY 2025-12-19");
    }
}
