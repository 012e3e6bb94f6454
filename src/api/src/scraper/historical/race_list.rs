//! Race list parser for db.netkeiba.com
//!
//! Discovers race pages in two steps:
//! - the race calendar (`/?pid=race_top`) links to one page per race day and
//!   to the previous month's calendar
//! - a race day page (`/race/list/YYYYMMDD/`) links to every race of the day

use scraper::Html;

use crate::scraper::text::selector;

/// Links found on one month of the race calendar
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarPage {
    /// Race day pages, in calendar order (site-relative hrefs)
    pub day_pages: Vec<String>,
    /// Previous month's calendar (site-relative href)
    pub previous_month: Option<String>,
}

/// Parser for race list pages
pub struct RaceListParser;

impl RaceListParser {
    /// Parse a race calendar page
    pub fn schedule_pages(html: &str) -> CalendarPage {
        let document = Html::parse_document(html);

        let day_pages = document
            .select(&selector("div.race_calendar table a"))
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect();

        let previous_month = document
            .select(&selector("div.race_calendar .rev a:last-child"))
            .filter_map(|a| a.value().attr("href"))
            .last()
            .map(str::to_string);

        CalendarPage {
            day_pages,
            previous_month,
        }
    }

    /// Parse a race day page into absolute race page URLs
    pub fn race_pages(html: &str, base_url: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        document
            .select(&selector("dl.race_top_data_info dd > a"))
            .filter_map(|a| a.value().attr("href"))
            .map(|href| absolute_url(base_url, href))
            .collect()
    }
}

/// Join a site-relative href onto the base URL. Absolute hrefs pass through.
pub fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    }
}
