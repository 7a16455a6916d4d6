//! Parsing helpers for shell input.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};

/// Split a shell line into words. Double or single quotes group words.
pub fn split_args(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        anyhow::bail!("Unclosed quote");
    }
    if in_word {
        args.push(current);
    }
    Ok(args)
}

/// Parse "2025-03-20T09:00", "2025-03-20 09:00" or with seconds.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    anyhow::bail!(
        "Invalid date/time '{}'. Expected YYYY-MM-DDTHH:MM (e.g. 2025-03-20T09:00)",
        s
    )
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date '{}'. Expected YYYY-MM-DD", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_words() {
        assert_eq!(split_args("  list  ").unwrap(), vec!["list"]);
        assert_eq!(split_args("toggle 3").unwrap(), vec!["toggle", "3"]);
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            split_args(r#"new "Intro to Rust" --start '2025-03-20 09:00'"#).unwrap(),
            vec!["new", "Intro to Rust", "--start", "2025-03-20 09:00"]
        );
    }

    #[test]
    fn empty_quotes_make_empty_arg() {
        assert_eq!(split_args(r#"edit 1 --title """#).unwrap(), vec!["edit", "1", "--title", ""]);
    }

    #[test]
    fn unclosed_quote_is_an_error() {
        assert!(split_args(r#"new "oops"#).is_err());
    }

    #[test]
    fn parses_datetimes() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 20)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime("2025-03-20T09:30").unwrap(), expected);
        assert_eq!(parse_datetime("2025-03-20 09:30").unwrap(), expected);
        assert_eq!(parse_datetime("2025-03-20T09:30:00").unwrap(), expected);
        assert!(parse_datetime("tomorrow").is_err());
    }

    #[test]
    fn parses_dates() {
        assert_eq!(
            parse_date("2025-03-20").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
        );
        assert!(parse_date("20/03/2025").is_err());
    }
}
