//! Record types produced by the page builders.
//!
//! All records are immutable value objects built from one document. They
//! carry no reference back to the page they came from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::classification::ClassificationCode;

/// Track surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Turf,
    Dirt,
    Steeplechase,
    /// Surface code missing from the page
    #[default]
    Unknown,
}

impl Surface {
    /// Map the one-character surface code used on the page (芝, ダ, 障)
    pub fn from_code(code: char) -> Self {
        match code {
            '芝' => Surface::Turf,
            'ダ' => Surface::Dirt,
            '障' => Surface::Steeplechase,
            _ => Surface::Unknown,
        }
    }

    /// Inverse of `as_str`; anything else is `Unknown`
    pub fn from_name(name: &str) -> Self {
        match name {
            "turf" => Surface::Turf,
            "dirt" => Surface::Dirt,
            "steeplechase" => Surface::Steeplechase,
            _ => Surface::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Turf => "turf",
            Surface::Dirt => "dirt",
            Surface::Steeplechase => "steeplechase",
            Surface::Unknown => "unknown",
        }
    }
}

/// Pari-mutuel ticket type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    Win,
    Place,
    BracketQuinella,
    Quinella,
    Wide,
    Exacta,
    Trio,
    Trifecta,
}

impl TicketType {
    /// Map a payoff table row header. Unrecognized labels fall back to `Win`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "複勝" => TicketType::Place,
            "枠連" => TicketType::BracketQuinella,
            "馬連" => TicketType::Quinella,
            "ワイド" => TicketType::Wide,
            "馬単" => TicketType::Exacta,
            "三連複" => TicketType::Trio,
            "三連単" => TicketType::Trifecta,
            _ => TicketType::Win,
        }
    }

    /// Numeric code stored in the `payoff.ticket_type` column
    pub fn code(&self) -> i32 {
        match self {
            TicketType::Win => -1,
            TicketType::Place => 1,
            TicketType::BracketQuinella => 2,
            TicketType::Quinella => 3,
            TicketType::Wide => 4,
            TicketType::Exacta => 5,
            TicketType::Trio => 6,
            TicketType::Trifecta => 7,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => TicketType::Place,
            2 => TicketType::BracketQuinella,
            3 => TicketType::Quinella,
            4 => TicketType::Wide,
            5 => TicketType::Exacta,
            6 => TicketType::Trio,
            7 => TicketType::Trifecta,
            _ => TicketType::Win,
        }
    }
}

/// One race, keyed by the page id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub id: i64,
    pub name: String,
    pub racetrack: String,
    pub race_number: i32,
    pub surface: Surface,
    /// Course bend direction and layout, e.g. "右" or "右 外"
    pub direction: String,
    /// Meters
    pub distance: i32,
    pub weather: String,
    pub surface_condition: String,
    pub post_time: String,
    pub surface_score: Option<i32>,
    pub date: Option<NaiveDate>,
    /// Raw meeting text, e.g. "5回中山8日目"
    pub place_detail: String,
    pub class_description: String,
    pub classification_code: ClassificationCode,
    /// Coarse class level (-1 when unknown)
    pub class_level: i32,
}

/// One payout line, keyed by (race, ticket type, combination)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffRecord {
    pub race_id: i64,
    pub ticket_type: TicketType,
    /// Horse numbers as printed, e.g. "3 - 11" or "5 → 2 → 14"
    pub combination: String,
    pub amount: f64,
    pub popularity: i32,
}

/// One runner's result, keyed by (race, horse number)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResultRecord {
    pub race_id: i64,
    /// Not always numeric: 取消, 除外, 中止, 失格 and "3(降)" style values occur
    pub order_of_finish: String,
    pub bracket: i32,
    pub horse_number: i32,
    pub horse_id: String,
    pub horse_name: String,
    pub sex: String,
    pub age: i32,
    pub basis_weight: f64,
    pub jockey_id: String,
    pub jockey_name: String,
    pub finishing_time: Option<String>,
    pub time_seconds: Option<f64>,
    pub margin: String,
    pub speed_figure: Option<i32>,
    /// Running position per corner, e.g. "5-5-3-2"
    pub passing_order: String,
    pub last_phase: Option<f64>,
    pub odds: f64,
    pub popularity: i32,
    /// Body weight and change, e.g. "486(+2)"
    pub horse_weight: String,
    pub remark: Option<String>,
    /// Training center code (東 / 西 / 地 / 外)
    pub stable: String,
    pub trainer_id: String,
    pub owner_id: String,
    pub earnings: f64,
}

/// One horse in a pedigree tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorseRecord {
    pub id: String,
    pub name: String,
    pub sire_id: Option<String>,
    pub dam_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_from_code() {
        assert_eq!(Surface::from_code('芝'), Surface::Turf);
        assert_eq!(Surface::from_code('ダ'), Surface::Dirt);
        assert_eq!(Surface::from_code('障'), Surface::Steeplechase);
        assert_eq!(Surface::from_code('x'), Surface::Unknown);
    }

    #[test]
    fn test_ticket_type_codes() {
        let labels = [
            ("単勝", -1),
            ("複勝", 1),
            ("枠連", 2),
            ("馬連", 3),
            ("ワイド", 4),
            ("馬単", 5),
            ("三連複", 6),
            ("三連単", 7),
            ("WIN5", -1),
        ];
        for (label, code) in labels {
            assert_eq!(TicketType::from_label(label).code(), code, "{}", label);
        }
    }
}
