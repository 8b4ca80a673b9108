//! Permissive birthdate parsing for folder-name tokens.
//!
//! Accepts the day-first notations seen in clinical folder names
//! (`12.03.1950`, `3.4.50`, `12/03/1950`, `12-03-1950`) plus ISO dates.
//! A bare digit run is never a date — six-digit case numbers must not be
//! swallowed as birthdays.

use chrono::NaiveDate;
use regex::Regex;

const FORMATS: &[&str] = &["%d.%m.%Y", "%d.%m.%y", "%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

/// Try to read `token` as a calendar date. Returns `None` for anything that
/// does not carry a separated day/month/year shape.
pub fn parse_flexible(token: &str) -> Option<NaiveDate> {
    let shape = Regex::new(r"^\d{1,4}[./-]\d{1,2}[./-]\d{1,4}$").unwrap();
    if !shape.is_match(token) {
        return None;
    }
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_german_dates() {
        assert_eq!(
            parse_flexible("12.03.1950"),
            NaiveDate::from_ymd_opt(1950, 3, 12)
        );
        assert_eq!(
            parse_flexible("3.4.1950"),
            NaiveDate::from_ymd_opt(1950, 4, 3)
        );
    }

    #[test]
    fn parses_two_digit_years() {
        assert!(parse_flexible("12.03.50").is_some());
    }

    #[test]
    fn parses_slash_dash_and_iso() {
        assert!(parse_flexible("12/03/1950").is_some());
        assert!(parse_flexible("12-03-1950").is_some());
        assert!(parse_flexible("1950-03-12").is_some());
    }

    #[test]
    fn bare_digit_runs_are_not_dates() {
        assert_eq!(parse_flexible("123456"), None);
        assert_eq!(parse_flexible("19500312"), None);
    }

    #[test]
    fn words_and_invalid_dates_rejected() {
        assert_eq!(parse_flexible("Mueller"), None);
        assert_eq!(parse_flexible("32.13.1950"), None);
        assert_eq!(parse_flexible(""), None);
    }
}
