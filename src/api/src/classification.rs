//! Race classification.
//!
//! Maps (surface, distance, class description) to a compact code such as
//! `TM2` (turf, mile, 3yo-and-up) or `S` (steeplechase). Rules are checked in
//! a fixed order and the first match wins:
//!
//! 1. steeplechase surface
//! 2. open markers: オープン, 1600 (万下), 3勝
//! 3. 3歳以上 / 4歳以上
//! 4. 新馬 / 未勝利
//! 5. everything else (races restricted to 2yo/3yo)
//!
//! Dirt has no extended bucket: any dirt race over 2100m is "long".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::Surface;

const OPEN_MARKERS: [&str; 3] = ["オープン", "1600", "3勝"];
const THREE_YO_AND_UP_MARKERS: [&str; 2] = ["3歳以上", "4歳以上"];
const MAIDEN_MARKERS: [&str; 2] = ["新馬", "未勝利"];

/// Competitive tier, encoded as the trailing digit of the code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassTier {
    Maiden,
    UntilThreeYo,
    ThreeYoAndUp,
    Open,
}

impl ClassTier {
    fn digit(&self) -> char {
        match self {
            ClassTier::Maiden => '0',
            ClassTier::UntilThreeYo => '1',
            ClassTier::ThreeYoAndUp => '2',
            ClassTier::Open => '3',
        }
    }

    fn from_digit(c: char) -> Option<Self> {
        match c {
            '0' => Some(ClassTier::Maiden),
            '1' => Some(ClassTier::UntilThreeYo),
            '2' => Some(ClassTier::ThreeYoAndUp),
            '3' => Some(ClassTier::Open),
            _ => None,
        }
    }

    /// Tier implied by the class description alone
    pub fn from_description(description: &str) -> Self {
        let contains_any = |markers: &[&str]| markers.iter().any(|m| description.contains(m));

        if contains_any(&OPEN_MARKERS) {
            ClassTier::Open
        } else if contains_any(&THREE_YO_AND_UP_MARKERS) {
            ClassTier::ThreeYoAndUp
        } else if contains_any(&MAIDEN_MARKERS) {
            ClassTier::Maiden
        } else {
            ClassTier::UntilThreeYo
        }
    }
}

/// Flat-race course family. Anything that is not turf is bucketed as dirt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Course {
    Turf,
    Dirt,
}

/// Distance bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceBucket {
    /// up to 1300m
    Sprint,
    /// 1301 - 1899m
    Mile,
    /// 1900 - 2100m
    Intermediate,
    /// 2101 - 2700m on turf, anything above 2100m on dirt
    Long,
    /// 2701m and up, turf only
    Extended,
}

impl DistanceBucket {
    pub fn for_distance(course: Course, distance: i32) -> Self {
        match distance {
            d if d <= 1300 => DistanceBucket::Sprint,
            d if d <= 1899 => DistanceBucket::Mile,
            d if d <= 2100 => DistanceBucket::Intermediate,
            d if d <= 2700 || course == Course::Dirt => DistanceBucket::Long,
            _ => DistanceBucket::Extended,
        }
    }

    fn letter(&self) -> char {
        match self {
            DistanceBucket::Sprint => 'S',
            DistanceBucket::Mile => 'M',
            DistanceBucket::Intermediate => 'I',
            DistanceBucket::Long => 'L',
            DistanceBucket::Extended => 'E',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c {
            'S' => Some(DistanceBucket::Sprint),
            'M' => Some(DistanceBucket::Mile),
            'I' => Some(DistanceBucket::Intermediate),
            'L' => Some(DistanceBucket::Long),
            'E' => Some(DistanceBucket::Extended),
            _ => None,
        }
    }
}

/// Compact race classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ClassificationCode {
    Steeplechase,
    Flat {
        course: Course,
        bucket: DistanceBucket,
        tier: ClassTier,
    },
}

impl fmt::Display for ClassificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationCode::Steeplechase => f.write_str("S"),
            ClassificationCode::Flat { course, bucket, tier } => {
                let c = match course {
                    Course::Turf => 'T',
                    Course::Dirt => 'D',
                };
                write!(f, "{}{}{}", c, bucket.letter(), tier.digit())
            }
        }
    }
}

impl FromStr for ClassificationCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "S" {
            return Ok(ClassificationCode::Steeplechase);
        }

        let chars: Vec<char> = s.chars().collect();
        let [c, b, t] = chars[..] else {
            return Err(format!("invalid classification code: {}", s));
        };

        let course = match c {
            'T' => Course::Turf,
            'D' => Course::Dirt,
            _ => return Err(format!("invalid course in classification code: {}", s)),
        };
        let bucket = DistanceBucket::from_letter(b)
            .filter(|b| !(course == Course::Dirt && *b == DistanceBucket::Extended))
            .ok_or_else(|| format!("invalid distance bucket in classification code: {}", s))?;
        let tier = ClassTier::from_digit(t)
            .ok_or_else(|| format!("invalid tier in classification code: {}", s))?;

        Ok(ClassificationCode::Flat { course, bucket, tier })
    }
}

impl From<ClassificationCode> for String {
    fn from(code: ClassificationCode) -> Self {
        code.to_string()
    }
}

impl TryFrom<String> for ClassificationCode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Classify a race. Total and deterministic.
pub fn classify(surface: Surface, distance: i32, class_description: &str) -> ClassificationCode {
    if surface == Surface::Steeplechase {
        return ClassificationCode::Steeplechase;
    }

    let course = if surface == Surface::Turf {
        Course::Turf
    } else {
        Course::Dirt
    };

    ClassificationCode::Flat {
        course,
        bucket: DistanceBucket::for_distance(course, distance),
        tier: ClassTier::from_description(class_description),
    }
}

/// Coarse class level from the first word of the class description.
///
/// 0: new horse / maiden, 1: juvenile 1-win, 2: older 1-2 win,
/// 3: open and 3-win, 4: steeplechase, -1: anything else.
pub fn class_level(class_description: &str) -> i32 {
    let head = class_description.split_whitespace().next().unwrap_or("");

    match head {
        "2歳新馬" | "3歳新馬" | "2歳未勝利" | "3歳未勝利" => 0,
        "2歳1勝クラス" | "3歳1勝クラス" | "2歳500万下" | "3歳500万下" => 1,
        "3歳以上1勝クラス" | "3歳以上500万下" | "4歳以上1勝クラス" | "4歳以上500万下"
        | "3歳以上2勝クラス" | "4歳以上2勝クラス" | "3歳以上1000万下" | "4歳以上1000万下" => 2,
        "2歳オープン" | "3歳オープン" | "3歳以上オープン" | "4歳以上オープン"
        | "3歳以上1600万下" | "4歳以上1600万下" | "4歳以上3勝クラス" => 3,
        "障害3歳以上オープン" | "障害3歳以上未勝利" | "障害4歳以上オープン" | "障害4歳以上未勝利" => 4,
        _ => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(surface: Surface, distance: i32, class: &str) -> String {
        classify(surface, distance, class).to_string()
    }

    #[test]
    fn test_steeplechase_short_circuits() {
        assert_eq!(code(Surface::Steeplechase, 3000, "オープン"), "S");
        assert_eq!(code(Surface::Steeplechase, 1000, "障害3歳以上未勝利"), "S");
    }

    #[test]
    fn test_tier_priority() {
        // open beats the 3yo-and-up marker in the same text
        assert_eq!(code(Surface::Turf, 2500, "3歳以上オープン"), "TL3");
        assert_eq!(code(Surface::Turf, 1600, "4歳以上1600万下"), "TM3");
        assert_eq!(code(Surface::Dirt, 1800, "4歳以上3勝クラス"), "DM3");
        assert_eq!(code(Surface::Dirt, 1200, "3歳以上1勝クラス"), "DS2");
        assert_eq!(code(Surface::Turf, 2000, "3歳未勝利"), "TI0");
        assert_eq!(code(Surface::Turf, 1400, "2歳新馬"), "TM0");
        assert_eq!(code(Surface::Dirt, 1400, "3歳1勝クラス"), "DM1");
        assert_eq!(code(Surface::Turf, 1200, ""), "TS1");
    }

    #[test]
    fn test_distance_boundaries() {
        assert_eq!(code(Surface::Turf, 1300, ""), "TS1");
        assert_eq!(code(Surface::Turf, 1301, ""), "TM1");
        assert_eq!(code(Surface::Turf, 1899, ""), "TM1");
        assert_eq!(code(Surface::Turf, 1900, ""), "TI1");
        assert_eq!(code(Surface::Turf, 2100, ""), "TI1");
        assert_eq!(code(Surface::Turf, 2101, ""), "TL1");
        assert_eq!(code(Surface::Turf, 2700, ""), "TL1");
        assert_eq!(code(Surface::Turf, 2701, ""), "TE1");
    }

    #[test]
    fn test_dirt_has_no_extended_bucket() {
        assert_eq!(code(Surface::Dirt, 2101, "3歳以上オープン"), "DL3");
        assert_eq!(code(Surface::Dirt, 2700, ""), "DL1");
        assert_eq!(code(Surface::Dirt, 2701, ""), "DL1");
        assert_eq!(code(Surface::Dirt, 3400, "4歳以上2勝クラス"), "DL2");
    }

    #[test]
    fn test_unknown_surface_buckets_as_dirt() {
        assert_eq!(code(Surface::Unknown, 3000, ""), "DL1");
    }

    #[test]
    fn test_classify_is_total() {
        let classes = ["", "オープン", "3歳以上1勝クラス", "2歳未勝利", "2歳1勝クラス"];
        for surface in [Surface::Turf, Surface::Dirt, Surface::Steeplechase, Surface::Unknown] {
            for distance in (0..=4000).step_by(50) {
                for class in classes {
                    let c = classify(surface, distance, class);
                    assert_eq!(c, classify(surface, distance, class));
                    assert_eq!(c.to_string().parse::<ClassificationCode>(), Ok(c));
                }
            }
        }
    }

    #[test]
    fn test_parse_rejects_dirt_extended() {
        assert!("DE1".parse::<ClassificationCode>().is_err());
        assert!("TX1".parse::<ClassificationCode>().is_err());
        assert!("".parse::<ClassificationCode>().is_err());
    }

    #[test]
    fn test_class_level() {
        assert_eq!(class_level("3歳未勝利"), 0);
        assert_eq!(class_level("2歳1勝クラス"), 1);
        assert_eq!(class_level("3歳以上2勝クラス"), 2);
        assert_eq!(class_level("4歳以上オープン (国際)(指)"), 3);
        assert_eq!(class_level("障害4歳以上未勝利"), 4);
        assert_eq!(class_level("サラ系一般"), -1);
        assert_eq!(class_level(""), -1);
    }
}
