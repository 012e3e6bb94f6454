//! Race result table parser.
//!
//! Columns are read by position. The row width is checked before indexing so
//! a page layout change fails loudly instead of shifting fields.

use scraper::{ElementRef, Html};

use crate::error::{ExtractError, ExtractResult};
use crate::scraper::text::{
    href_last_segment, inner_text, optional_float, optional_int, parse_finish_time, parse_float,
    parse_int, selector, text_as_float, text_as_int,
};
use crate::types::RaceResultRecord;

const RESULT_TABLE: &str = "table.race_table_01";

/// Column positions of `table.race_table_01`
struct ResultColumns;

impl ResultColumns {
    const ORDER: usize = 0;
    const BRACKET: usize = 1;
    const HORSE_NUMBER: usize = 2;
    const HORSE: usize = 3;
    const SEX_AGE: usize = 4;
    const BASIS_WEIGHT: usize = 5;
    const JOCKEY: usize = 6;
    const TIME: usize = 7;
    const MARGIN: usize = 8;
    const SPEED_FIGURE: usize = 9;
    const PASSING: usize = 10;
    const LAST_PHASE: usize = 11;
    const ODDS: usize = 12;
    const POPULARITY: usize = 13;
    const HORSE_WEIGHT: usize = 14;
    // 15: training time, 16: stable comment (premium columns, not stored)
    const REMARK: usize = 17;
    const TRAINER: usize = 18;
    const OWNER: usize = 19;
    const EARNINGS: usize = 20;

    const COUNT: usize = 21;
}

/// Parser for the per-runner result table
pub struct RaceResultParser;

impl RaceResultParser {
    /// Parse raw HTML
    pub fn parse(html: &str, race_id: i64) -> ExtractResult<Vec<RaceResultRecord>> {
        let document = Html::parse_document(html);
        Self::build(&document, race_id)
    }

    /// Build one record per finisher row
    pub fn build(document: &Html, race_id: i64) -> ExtractResult<Vec<RaceResultRecord>> {
        let table = document
            .select(&selector(RESULT_TABLE))
            .next()
            .ok_or(ExtractError::missing(RESULT_TABLE))?;

        let rows: Vec<_> = table.select(&selector("tr")).collect();
        if rows.len() < 2 {
            return Err(ExtractError::invalid(
                RESULT_TABLE,
                "expected a header row and at least one runner",
                rows.len(),
            ));
        }

        let td_selector = selector("td");

        rows.iter()
            .skip(1)
            .map(|row| {
                let cells: Vec<_> = row.select(&td_selector).collect();
                Self::build_row(&cells, race_id)
            })
            .collect()
    }

    fn build_row(cells: &[ElementRef], race_id: i64) -> ExtractResult<RaceResultRecord> {
        if cells.len() != ResultColumns::COUNT {
            return Err(ExtractError::invalid(
                RESULT_TABLE,
                format!("expected {} cells per runner row", ResultColumns::COUNT),
                cells.len(),
            ));
        }

        let text = |i: usize| inner_text(&cells[i]);

        let sex_age = text(ResultColumns::SEX_AGE);
        let mut sex_age_chars = sex_age.chars();
        let sex = sex_age_chars.next().map(String::from).unwrap_or_default();
        let age = parse_int(sex_age_chars.as_str());

        let finishing_time = Some(text(ResultColumns::TIME)).filter(|t| !t.is_empty());
        let time_seconds = finishing_time.as_deref().and_then(parse_finish_time);

        let remark = Some(text(ResultColumns::REMARK)).filter(|r| !r.is_empty());

        // "[東] 鹿戸雄一": the bracket comes first
        let stable = text(ResultColumns::TRAINER)
            .chars()
            .nth(1)
            .map(String::from)
            .unwrap_or_default();

        Ok(RaceResultRecord {
            race_id,
            order_of_finish: text(ResultColumns::ORDER),
            bracket: text_as_int(&cells[ResultColumns::BRACKET]),
            horse_number: text_as_int(&cells[ResultColumns::HORSE_NUMBER]),
            horse_id: href_last_segment(&cells[ResultColumns::HORSE]),
            horse_name: text(ResultColumns::HORSE),
            sex,
            age,
            basis_weight: text_as_float(&cells[ResultColumns::BASIS_WEIGHT]),
            jockey_id: href_last_segment(&cells[ResultColumns::JOCKEY]),
            jockey_name: text(ResultColumns::JOCKEY),
            finishing_time,
            time_seconds,
            margin: text(ResultColumns::MARGIN),
            speed_figure: optional_int(&text(ResultColumns::SPEED_FIGURE)),
            passing_order: text(ResultColumns::PASSING),
            last_phase: optional_float(&text(ResultColumns::LAST_PHASE)),
            odds: text_as_float(&cells[ResultColumns::ODDS]),
            popularity: text_as_int(&cells[ResultColumns::POPULARITY]),
            horse_weight: text(ResultColumns::HORSE_WEIGHT),
            remark,
            stable,
            trainer_id: href_last_segment(&cells[ResultColumns::TRAINER]),
            owner_id: href_last_segment(&cells[ResultColumns::OWNER]),
            earnings: parse_float(&text(ResultColumns::EARNINGS)),
        })
    }
}
