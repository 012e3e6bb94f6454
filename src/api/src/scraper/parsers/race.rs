//! Race metadata parser for db.netkeiba.com race pages.
//!
//! Reads the `dl.racedata` block (race number, name, course line) and the
//! `p.smalltxt` line (date, meeting, class). Both blocks are required; every
//! field inside them degrades to an empty/zero value when it is missing.

use chrono::NaiveDate;
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;
use tracing::debug;

use crate::classification::{class_level, classify};
use crate::error::{ExtractError, ExtractResult};
use crate::scraper::text::{inner_text, selector};
use crate::types::{RaceRecord, Surface};

const RACEDATA: &str = "dl.racedata";
const SMALLTXT: &str = "p.smalltxt";

/// Annotation printed on the Stayers Stakes course line ("inner course, two laps")
const INNER_LOOP_TWICE: &str = " 内2周";
const WEATHER_LABEL: &str = "天候 : ";
const POST_TIME_LABEL: &str = "発走 : ";

fn course_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([^\d]+)(\d+)m").expect("course pattern"))
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日").expect("date pattern"))
}

fn venue_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(札幌|函館|福島|新潟|東京|中山|中京|京都|阪神|小倉)").expect("venue pattern")
    })
}

fn score_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+").expect("score pattern"))
}

/// Fields carried by the "芝右2500m / 天候 : 晴 / 芝 : 良 / 発走 : 15:25" line
#[derive(Debug, Default, PartialEq)]
struct CourseLine {
    surface: Surface,
    direction: String,
    distance: i32,
    weather: String,
    condition: String,
    post_time: String,
}

impl CourseLine {
    fn parse(text: &str) -> Self {
        let segments: Vec<&str> = text.split('/').collect();
        let segment = |i: usize| segments.get(i).map(|s| s.trim()).unwrap_or("");

        let mut line = CourseLine::default();

        let head = segment(0).replace(INNER_LOOP_TWICE, "");
        if let Some(caps) = course_re().captures(&head) {
            let mut prefix = caps[1].trim().chars();
            line.surface = prefix.next().map(Surface::from_code).unwrap_or_default();
            line.direction = prefix.as_str().trim().to_string();
            line.distance = caps[2].parse().unwrap_or(0);
        }

        line.weather = segment(1).replace(WEATHER_LABEL, "");
        line.condition = match segment(2).rsplit_once(" : ") {
            Some((_, value)) => value.trim().to_string(),
            None => segment(2).to_string(),
        };
        line.post_time = segment(3).replace(POST_TIME_LABEL, "");

        line
    }
}

/// Fields carried by the "2021年12月26日 5回中山8日目 3歳以上オープン" line
#[derive(Debug, Default, PartialEq)]
struct MeetingLine {
    date: Option<NaiveDate>,
    racetrack: String,
    place_detail: String,
    class_description: String,
}

impl MeetingLine {
    fn parse(text: &str) -> Self {
        let words: Vec<&str> = text.split(' ').collect();
        let word = |i: usize| words.get(i).map(|s| s.trim()).unwrap_or("");

        let date = date_re().captures(word(0)).and_then(|caps| {
            NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            )
        });

        let place_detail = word(1).to_string();
        let racetrack = match venue_re().find(&place_detail) {
            Some(m) => m.as_str().to_string(),
            None => {
                debug!("No known venue in {:?}, keeping the literal text", place_detail);
                place_detail.clone()
            }
        };

        MeetingLine {
            date,
            racetrack,
            place_detail,
            class_description: word(2).to_string(),
        }
    }
}

/// "11 R" -> 11
fn parse_race_number(text: &str) -> i32 {
    text.trim_end_matches([' ', 'R']).trim().parse().unwrap_or(0)
}

/// Parser for the race metadata of a result page
pub struct RaceInfoParser;

impl RaceInfoParser {
    /// Parse raw HTML
    pub fn parse(html: &str, race_id: i64) -> ExtractResult<RaceRecord> {
        let document = Html::parse_document(html);
        Self::build(&document, race_id)
    }

    /// Build the race record from a parsed page
    pub fn build(document: &Html, race_id: i64) -> ExtractResult<RaceRecord> {
        let racedata = document
            .select(&selector(RACEDATA))
            .next()
            .ok_or(ExtractError::missing(RACEDATA))?;
        let smalltxt = document
            .select(&selector(SMALLTXT))
            .next()
            .ok_or(ExtractError::missing(SMALLTXT))?;

        let race_number = racedata
            .select(&selector("dt"))
            .next()
            .map(|dt| parse_race_number(&inner_text(&dt)))
            .unwrap_or(0);

        let name = racedata
            .select(&selector("h1"))
            .next()
            .map(|h1| inner_text(&h1))
            .unwrap_or_default();

        let course = racedata
            .select(&selector("span"))
            .next()
            .map(|span| CourseLine::parse(&inner_text(&span)))
            .unwrap_or_default();

        let meeting = MeetingLine::parse(&inner_text(&smalltxt));

        Ok(RaceRecord {
            id: race_id,
            name,
            racetrack: meeting.racetrack,
            race_number,
            surface: course.surface,
            direction: course.direction,
            distance: course.distance,
            weather: course.weather,
            surface_condition: course.condition,
            post_time: course.post_time,
            surface_score: Self::surface_score(document),
            date: meeting.date,
            place_detail: meeting.place_detail,
            classification_code: classify(course.surface, course.distance, &meeting.class_description),
            class_level: class_level(&meeting.class_description),
            class_description: meeting.class_description,
        })
    }

    /// 馬場指数 from the track information table, e.g. "-12 (速い)" -> -12
    fn surface_score(document: &Html) -> Option<i32> {
        let th_selector = selector("th");
        let td_selector = selector("td");

        for row in document.select(&selector("table[summary='馬場情報'] tr")) {
            let Some(th) = row.select(&th_selector).next() else {
                continue;
            };
            if inner_text(&th) != "馬場指数" {
                continue;
            }

            let td = row.select(&td_selector).next()?;
            let text = inner_text(&td);
            return score_re().find(&text).and_then(|m| m.as_str().parse().ok());
        }

        None
    }
}
