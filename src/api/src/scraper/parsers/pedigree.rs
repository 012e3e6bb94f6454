//! Pedigree page parser.
//!
//! `table.blood_table` lays a five-generation tree out over 32 rows. An
//! ancestor in generation `g` spans `32 >> g` rows, so ancestor `k` of that
//! generation starts at row `k * (32 >> g)`. Cells of shallower generations
//! that start on the same row come first, which shifts the column.

use scraper::{ElementRef, Html};
use tracing::warn;

use crate::error::{ExtractError, ExtractResult};
use crate::scraper::text::{first_line, inner_text, last_path_segment, selector};
use crate::types::HorseRecord;

const BLOOD_TABLE: &str = "table.blood_table";
const HORSE_TITLE: &str = "div.horse_title h1";

pub const GENERATIONS: usize = 5;
pub const ROWS: usize = 1 << GENERATIONS;

/// Rows covered by one ancestor of `generation`
fn row_span(generation: usize) -> usize {
    ROWS >> generation
}

/// (row, column) of the cell holding ancestor `slot` of `generation`.
///
/// Generation 1 is sire (slot 0) and dam (slot 1). The sire of `(g, k)` is
/// `(g + 1, 2k)` and the dam is `(g + 1, 2k + 1)`.
pub fn cell_address(generation: usize, slot: usize) -> (usize, usize) {
    let row = slot * row_span(generation);
    let first = (1..=generation)
        .find(|&g| row % row_span(g) == 0)
        .unwrap_or(generation);
    (row, generation - first)
}

/// Parser for horse pedigree pages
pub struct PedigreeParser;

impl PedigreeParser {
    /// Parse raw HTML
    pub fn parse(html: &str, horse_id: &str) -> ExtractResult<Vec<HorseRecord>> {
        let document = Html::parse_document(html);
        Self::build(&document, horse_id)
    }

    /// Build the horse and its ancestors, root first, then by generation.
    ///
    /// A complete table yields 63 records: the root plus all 62 ancestors,
    /// 32 of them generation-5 leaves. Generations 1 to 4 are emitted as
    /// well so that every `sire_id` / `dam_id` in the result names a record
    /// of the same result.
    ///
    /// An ancestor cell without a link produces no record, and the child
    /// pointing at it gets `None` for that parent.
    pub fn build(document: &Html, horse_id: &str) -> ExtractResult<Vec<HorseRecord>> {
        let table = document
            .select(&selector(BLOOD_TABLE))
            .next()
            .ok_or(ExtractError::missing(BLOOD_TABLE))?;

        let td_selector = selector("td");
        let rows: Vec<Vec<ElementRef>> = table
            .select(&selector("tr"))
            .map(|tr| tr.select(&td_selector).collect())
            .collect();

        if rows.len() != ROWS {
            return Err(ExtractError::invalid(
                BLOOD_TABLE,
                format!("expected exactly {} rows", ROWS),
                rows.len(),
            ));
        }

        // Deepest generation first so every node can point at its parents
        let mut generations: Vec<Vec<HorseRecord>> = Vec::with_capacity(GENERATIONS);

        for generation in (1..=GENERATIONS).rev() {
            let parents = generations.last();
            let horses: Vec<HorseRecord> = (0..1 << generation)
                .map(|slot| {
                    let (id, name) = Self::ancestor(&rows, generation, slot, horse_id);
                    let (sire_id, dam_id) = match parents {
                        Some(p) => (non_empty(&p[2 * slot].id), non_empty(&p[2 * slot + 1].id)),
                        None => (None, None),
                    };
                    HorseRecord {
                        id,
                        name,
                        sire_id,
                        dam_id,
                    }
                })
                .collect();
            generations.push(horses);
        }

        let name = document
            .select(&selector(HORSE_TITLE))
            .next()
            .map(|h1| inner_text(&h1))
            .unwrap_or_else(|| {
                warn!("Horse {}: no title on pedigree page", horse_id);
                String::new()
            });

        let first = &generations[GENERATIONS - 1];
        let root = HorseRecord {
            id: horse_id.to_string(),
            name,
            sire_id: non_empty(&first[0].id),
            dam_id: non_empty(&first[1].id),
        };

        let mut horses = Vec::with_capacity(2 * ROWS - 1);
        horses.push(root);
        for generation in generations.into_iter().rev() {
            horses.extend(generation.into_iter().filter(|h| !h.id.is_empty()));
        }

        Ok(horses)
    }

    /// Id and name from the first anchor of an ancestor cell
    fn ancestor(
        rows: &[Vec<ElementRef>],
        generation: usize,
        slot: usize,
        horse_id: &str,
    ) -> (String, String) {
        let (row, column) = cell_address(generation, slot);

        let anchor = rows[row]
            .get(column)
            .and_then(|cell| cell.select(&selector("a[href]")).next());

        match anchor {
            Some(a) => (
                last_path_segment(a.value().attr("href").unwrap_or_default()),
                first_line(&a),
            ),
            None => {
                warn!(
                    "Horse {}: no ancestor link at generation {} slot {} (row {}, column {})",
                    horse_id, generation, slot, row, column
                );
                (String::new(), String::new())
            }
        }
    }
}

fn non_empty(id: &str) -> Option<String> {
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}
