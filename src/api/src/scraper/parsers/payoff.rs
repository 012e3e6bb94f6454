//! Payoff table parser.
//!
//! Each `table.pay_table_01` row is one ticket type. Its three cells hold
//! `<br>`-separated combinations, amounts and popularity ranks that line up
//! index for index. Lists of different lengths are an `InvalidStructure`.

use scraper::Html;

use crate::error::{ExtractError, ExtractResult};
use crate::scraper::text::{parse_float, parse_int, selector, split_line_break, inner_text};
use crate::types::{PayoffRecord, TicketType};

const PAY_TABLE: &str = "table.pay_table_01";

/// Parser for the payoff tables of a result page
pub struct PayoffParser;

impl PayoffParser {
    /// Parse raw HTML
    pub fn parse(html: &str, race_id: i64) -> ExtractResult<Vec<PayoffRecord>> {
        let document = Html::parse_document(html);
        Self::build(&document, race_id)
    }

    /// Build every payoff line of the page
    pub fn build(document: &Html, race_id: i64) -> ExtractResult<Vec<PayoffRecord>> {
        let tables: Vec<_> = document.select(&selector(PAY_TABLE)).collect();
        if tables.is_empty() {
            return Err(ExtractError::missing(PAY_TABLE));
        }

        let row_selector = selector("tr");
        let th_selector = selector("th");
        let td_selector = selector("td");

        let mut payoffs = Vec::new();

        for row in tables.iter().flat_map(|table| table.select(&row_selector)) {
            let Some(th) = row.select(&th_selector).next() else {
                continue;
            };
            let ticket_type = TicketType::from_label(&inner_text(&th));

            let cells: Vec<_> = row.select(&td_selector).collect();
            if cells.len() < 3 {
                return Err(ExtractError::invalid(
                    PAY_TABLE,
                    "expected 3 cells per ticket row",
                    cells.len(),
                ));
            }

            let combinations = split_line_break(&cells[0]);
            let amounts = split_line_break(&cells[1]);
            let popularities = split_line_break(&cells[2]);

            if amounts.len() != combinations.len() || popularities.len() != combinations.len() {
                return Err(ExtractError::invalid(
                    PAY_TABLE,
                    format!(
                        "{:?} row: {} combinations, {} amounts, {} popularity ranks",
                        ticket_type,
                        combinations.len(),
                        amounts.len(),
                        popularities.len()
                    ),
                    if amounts.len() != combinations.len() {
                        amounts.len()
                    } else {
                        popularities.len()
                    },
                ));
            }

            for ((combination, amount), popularity) in
                combinations.into_iter().zip(amounts).zip(popularities)
            {
                payoffs.push(PayoffRecord {
                    race_id,
                    ticket_type,
                    combination,
                    amount: parse_float(&amount),
                    popularity: parse_int(&popularity),
                });
            }
        }

        Ok(payoffs)
    }
}
