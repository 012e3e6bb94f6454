//! Text and value extraction helpers shared by the page parsers.
//!
//! Numeric helpers never fail: text that does not parse yields zero, and the
//! `optional_*` variants yield `None` for blank cells.

use scraper::{ElementRef, Node, Selector};
use std::sync::OnceLock;

/// Compile a selector from a literal.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {:?}: {:?}", css, e))
}

/// Concatenated text of an element, trimmed
pub fn inner_text(elem: &ElementRef) -> String {
    elem.text().collect::<String>().trim().to_string()
}

pub fn parse_int(text: &str) -> i32 {
    text.trim().parse().unwrap_or(0)
}

/// Parse a decimal, ignoring thousands separators
pub fn parse_float(text: &str) -> f64 {
    text.trim().replace(',', "").parse().unwrap_or(0.0)
}

pub fn text_as_int(elem: &ElementRef) -> i32 {
    parse_int(&inner_text(elem))
}

pub fn text_as_float(elem: &ElementRef) -> f64 {
    parse_float(&inner_text(elem))
}

/// `None` for blank text, otherwise the parsed integer if it parses
pub fn optional_int(text: &str) -> Option<i32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse().ok()
}

/// `None` for blank text, otherwise the parsed decimal if it parses
pub fn optional_float(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.replace(',', "").parse().ok()
}

/// `href` of the first anchor at or below `elem`
pub fn anchor_href<'a>(elem: &ElementRef<'a>) -> Option<&'a str> {
    if elem.value().name() == "a" {
        if let Some(href) = elem.value().attr("href") {
            return Some(href);
        }
    }

    static A: OnceLock<Selector> = OnceLock::new();
    let a = A.get_or_init(|| selector("a[href]"));
    elem.select(a).next().and_then(|link| link.value().attr("href"))
}

/// Last path segment of an href: "/horse/2019104567/" -> "2019104567"
pub fn last_path_segment(href: &str) -> String {
    let trimmed = href.trim().trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(pos) => trimmed[pos + 1..].to_string(),
        None => trimmed.to_string(),
    }
}

/// Identifier taken from the first anchor below `elem`, empty when there is none
pub fn href_last_segment(elem: &ElementRef) -> String {
    anchor_href(elem).map(last_path_segment).unwrap_or_default()
}

/// Text of an element split at each `<br>`, every piece trimmed.
///
/// Blank pieces (e.g. after a trailing `<br>`) are dropped.
pub fn split_line_break(elem: &ElementRef) -> Vec<String> {
    let mut pieces = vec![String::new()];
    for node in elem.descendants() {
        match node.value() {
            Node::Element(e) if e.name() == "br" => pieces.push(String::new()),
            Node::Text(t) => {
                if let Some(piece) = pieces.last_mut() {
                    piece.push_str(t);
                }
            }
            _ => {}
        }
    }

    pieces
        .into_iter()
        .map(|piece| piece.trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Text before the first `<br>` inside the element, trimmed
pub fn first_line(elem: &ElementRef) -> String {
    let mut out = String::new();
    for node in elem.descendants() {
        match node.value() {
            Node::Element(e) if e.name() == "br" => break,
            Node::Text(t) => out.push_str(t),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Convert "m:ss.f" into seconds. A minute part of "0" contributes nothing.
pub fn parse_finish_time(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let Some((minutes, seconds)) = text.split_once(':') else {
        return text.parse().ok();
    };

    let seconds: f64 = seconds.trim().parse().ok()?;
    let minutes = minutes.trim();
    if minutes == "0" {
        return Some(seconds);
    }

    let minutes: f64 = minutes.parse().ok()?;
    Some(minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(doc: &'a Html, css: &'static str) -> ElementRef<'a> {
        doc.select(&selector(css)).next().unwrap()
    }

    #[test]
    fn test_parse_finish_time() {
        let t = parse_finish_time("1:23.4").unwrap();
        assert!((t - 83.4).abs() < 1e-9);
        assert_eq!(parse_finish_time("0:45.0"), Some(45.0));
        assert!((parse_finish_time("2:32.5").unwrap() - 152.5).abs() < 1e-9);
        assert_eq!(parse_finish_time(""), None);
        assert_eq!(parse_finish_time("abc"), None);
    }

    #[test]
    fn test_numeric_soft_miss() {
        assert_eq!(parse_int("12"), 12);
        assert_eq!(parse_int("取消"), 0);
        assert_eq!(parse_float("1,234.5"), 1234.5);
        assert_eq!(parse_float(""), 0.0);
        assert_eq!(optional_int(""), None);
        assert_eq!(optional_int("**"), None);
        assert_eq!(optional_int(" 98 "), Some(98));
        assert_eq!(optional_float("35.2"), Some(35.2));
        assert_eq!(optional_float("  "), None);
    }

    #[test]
    fn test_last_path_segment() {
        assert_eq!(last_path_segment("/horse/2019104567/"), "2019104567");
        assert_eq!(last_path_segment("/jockey/result/recent/01234/"), "01234");
        assert_eq!(last_path_segment("/owner/123456"), "123456");
        assert_eq!(last_path_segment("plain"), "plain");
    }

    #[test]
    fn test_href_last_segment_uses_first_anchor() {
        let doc = Html::parse_fragment(
            r#"<table><tr><td><span>[東]</span> <a href="/trainer/01061/">友道</a><a href="/x/9/">x</a></td></tr></table>"#,
        );
        let td = first(&doc, "td");
        assert_eq!(href_last_segment(&td), "01061");
        assert_eq!(inner_text(&td), "[東] 友道x");

        let empty = Html::parse_fragment("<table><tr><td>none</td></tr></table>");
        assert_eq!(href_last_segment(&first(&empty, "td")), "");
    }

    #[test]
    fn test_split_line_break() {
        let doc = Html::parse_fragment(
            "<table><tr><td>1 - 2<br>3 - 4<br />5 - 6<br></td></tr></table>",
        );
        assert_eq!(
            split_line_break(&first(&doc, "td")),
            vec!["1 - 2", "3 - 4", "5 - 6"]
        );
    }

    #[test]
    fn test_split_line_break_nested_markup() {
        let doc = Html::parse_fragment(
            r#"<table><tr><td><span title="a>b">5</span><br><b>2&nbsp;</b> &amp; <i>1</i><br/><span>14</span></td></tr></table>"#,
        );
        assert_eq!(
            split_line_break(&first(&doc, "td")),
            vec!["5", "2\u{a0} & 1", "14"]
        );
    }

    #[test]
    fn test_first_line() {
        let doc = Html::parse_fragment(
            r#"<div><a href="/horse/000a000082/">Sunday Silence<br>(米) 1986 青鹿毛</a></div>"#,
        );
        assert_eq!(first_line(&first(&doc, "a")), "Sunday Silence");
    }
}
