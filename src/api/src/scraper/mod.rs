//! Scraper for db.netkeiba.com
//!
//! Page parsing (`parsers`, `text`) is pure; `session`, `rate_limiter` and
//! `pages` cover downloading and keeping the raw pages.

pub mod historical;
pub mod pages;
pub mod parsers;
pub mod rate_limiter;
pub mod session;
pub mod text;

pub use pages::{PageKind, PageStore};
pub use rate_limiter::RateLimiter;
pub use session::Session;

/// Base URL of the race database
pub const DB_URL: &str = "https://db.netkeiba.com";

/// Build race result URL
/// URL: https://db.netkeiba.com/race/RACEID/
pub fn race_url(db_url: &str, race_id: i64) -> String {
    format!("{}/race/{}/", db_url.trim_end_matches('/'), race_id)
}

/// Build pedigree URL
/// URL: https://db.netkeiba.com/horse/ped/HORSEID/
pub fn horse_ped_url(db_url: &str, horse_id: &str) -> String {
    format!("{}/horse/ped/{}/", db_url.trim_end_matches('/'), horse_id)
}
