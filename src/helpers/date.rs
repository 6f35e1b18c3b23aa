//! Date helper functions

use chrono::{DateTime, Locale, TimeZone, Utc};
use std::fmt::Display;

/// Display format: two-digit day, abbreviated month, four-digit year
const DISPLAY_FORMAT: &str = "%d %b %Y";

/// Locale used for month names in display dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLocale {
    /// Brazilian Portuguese, lowercase months ("mar")
    PtBr,
    /// English, title-case months ("Mar")
    En,
}

impl DateLocale {
    /// Pick a locale from a language tag such as `pt-BR` or `en_US`.
    /// Unknown languages fall back to pt-BR, the site's native locale.
    pub fn from_language(language: &str) -> Self {
        let lang = language.to_ascii_lowercase();
        if lang == "en" || lang.starts_with("en-") || lang.starts_with("en_") {
            DateLocale::En
        } else {
            DateLocale::PtBr
        }
    }

    pub fn chrono_locale(self) -> Locale {
        match self {
            DateLocale::PtBr => Locale::pt_BR,
            DateLocale::En => Locale::en_US,
        }
    }
}

/// Format a publication timestamp as `"dd Mon yyyy"` in the given timezone
///
/// # Examples
/// ```ignore
/// normalize_date(&ts, &chrono_tz::UTC, DateLocale::En) // -> "05 Mar 2021"
/// ```
pub fn normalize_date<Tz>(timestamp: &DateTime<Utc>, tz: &Tz, locale: DateLocale) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp
        .with_timezone(tz)
        .format_localized(DISPLAY_FORMAT, locale.chrono_locale())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_normalize_en() {
        let date = ts("2021-03-05T12:00:00Z");
        assert_eq!(normalize_date(&date, &chrono_tz::UTC, DateLocale::En), "05 Mar 2021");
    }

    #[test]
    fn test_normalize_pt_br() {
        let date = ts("2021-03-15T12:00:00Z");
        assert_eq!(
            normalize_date(&date, &chrono_tz::America::Sao_Paulo, DateLocale::PtBr),
            "15 mar 2021"
        );
        let date = ts("2020-02-01T12:00:00Z");
        assert_eq!(
            normalize_date(&date, &chrono_tz::America::Sao_Paulo, DateLocale::PtBr),
            "01 fev 2020"
        );
    }

    #[test]
    fn test_normalize_uses_timezone_day() {
        // 02:00 UTC is still the previous evening in Sao Paulo
        let date = ts("2021-01-01T02:00:00Z");
        assert_eq!(normalize_date(&date, &chrono_tz::UTC, DateLocale::En), "01 Jan 2021");
        assert_eq!(
            normalize_date(&date, &chrono_tz::America::Sao_Paulo, DateLocale::En),
            "31 Dec 2020"
        );
    }

    #[test]
    fn test_output_is_not_renormalizable_as_string() {
        let once = normalize_date(&ts("2021-03-05T12:00:00Z"), &chrono_tz::UTC, DateLocale::En);
        assert!(DateTime::parse_from_rfc3339(&once).is_err());
        let reparsed = chrono::NaiveDate::parse_from_str(&once, "%d %b %Y").unwrap();
        let again = normalize_date(
            &Utc.from_utc_datetime(&reparsed.and_hms_opt(12, 0, 0).unwrap()),
            &chrono_tz::UTC,
            DateLocale::En,
        );
        assert_eq!(once, again);
    }

    #[test]
    fn test_locale_from_language() {
        assert_eq!(DateLocale::from_language("pt-BR"), DateLocale::PtBr);
        assert_eq!(DateLocale::from_language("en"), DateLocale::En);
        assert_eq!(DateLocale::from_language("en_US"), DateLocale::En);
        assert_eq!(DateLocale::from_language("fr"), DateLocale::PtBr);
    }

    #[test]
    fn test_pt_br_month_names() {
        let months: Vec<String> = (1..=12)
            .map(|m| {
                let date = Utc.with_ymd_and_hms(2021, m, 10, 12, 0, 0).unwrap();
                normalize_date(&date, &chrono_tz::UTC, DateLocale::PtBr)
            })
            .collect();
        assert_eq!(months[0], "10 jan 2021");
        assert_eq!(months[4], "10 mai 2021");
        assert_eq!(months[11], "10 dez 2021");
    }
}
