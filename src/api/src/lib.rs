//! Keiba-DB: race, payoff, result and pedigree records from db.netkeiba.com pages.
//!
//! The builders in [`scraper::parsers`] turn one parsed page into records and
//! never touch the network or disk. [`import`] and [`cli`] wire them to the
//! page store and the SQLite repository.

pub mod classification;
pub mod cli;
pub mod config;
pub mod error;
pub mod import;
pub mod scraper;
pub mod storage;
pub mod types;

pub use error::{ExtractError, ExtractResult};
pub use types::{HorseRecord, PayoffRecord, RaceRecord, RaceResultRecord, Surface, TicketType};
