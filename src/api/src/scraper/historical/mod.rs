//! Race page discovery on db.netkeiba.com
//!
//! Walks the monthly race calendar backwards:
//! - calendar page -> race day pages + previous month
//! - race day page -> race pages

pub mod race_list;

pub use race_list::{absolute_url, CalendarPage, RaceListParser};

/// Build the current month's race calendar URL
/// URL: https://db.netkeiba.com/?pid=race_top
pub fn race_calendar_url(db_url: &str) -> String {
    format!("{}/?pid=race_top", db_url.trim_end_matches('/'))
}

/// Whether a race day href belongs to the given date
/// e.g. "/race/list/20210502/" and 2021-05-02
pub fn is_day_page_for(href: &str, date: chrono::NaiveDate) -> bool {
    href.contains(&date.format("%Y%m%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_race_calendar_url() {
        assert_eq!(
            race_calendar_url("https://db.netkeiba.com"),
            "https://db.netkeiba.com/?pid=race_top"
        );
        assert_eq!(
            race_calendar_url("https://db.netkeiba.com/"),
            "https://db.netkeiba.com/?pid=race_top"
        );
    }

    #[test]
    fn test_is_day_page_for() {
        let date = NaiveDate::from_ymd_opt(2021, 5, 2).unwrap();
        assert!(is_day_page_for("/race/list/20210502/", date));
        assert!(!is_day_page_for("/race/list/20210501/", date));
    }
}
