//! `YYYY-MM-DD` dates, used for period ids and report ranges.

use crate::error::{AppError, AppResult};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_iso_date(text: &str) -> AppResult<Date> {
    Date::parse(text.trim(), ISO_DATE)
        .map_err(|e| AppError::validation(format!("invalid date '{text}': {e}")))
}

pub fn format_iso_date(date: Date) -> String {
    // The format only has numeric components, so formatting cannot fail.
    date.format(ISO_DATE)
        .unwrap_or_else(|_| format!("{}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day()))
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

// Serde adapter: `#[serde(with = "kopi_core::date::iso")]`.
time::serde::format_description!(pub iso, Date, "[year]-[month]-[day]");

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn parses_and_formats_round_trip() {
        let date = parse_iso_date("2026-01-05").unwrap();
        assert_eq!(date, Date::from_calendar_date(2026, Month::January, 5).unwrap());
        assert_eq!(format_iso_date(date), "2026-01-05");
    }

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Stamped {
        #[serde(with = "iso")]
        on: Date,
    }

    #[test]
    fn serde_adapter_uses_iso_dates() {
        let stamped = Stamped {
            on: Date::from_calendar_date(2026, Month::March, 9).unwrap(),
        };
        let text = serde_json::to_string(&stamped).unwrap();
        assert_eq!(text, r#"{"on":"2026-03-09"}"#);
        assert_eq!(serde_json::from_str::<Stamped>(&text).unwrap(), stamped);
        assert!(serde_json::from_str::<Stamped>(r#"{"on":"2026-3-9"}"#).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_iso_date("2026-13-40").is_err());
        assert!(parse_iso_date("yesterday").is_err());
    }
}
