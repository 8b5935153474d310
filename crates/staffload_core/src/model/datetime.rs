//! ISO-8601 checks for timestamps that are stored verbatim.

use chrono::{NaiveDate, NaiveTime};

/// Returns whether `value` is an ISO-8601 date or datetime.
///
/// Accepts a calendar date in extended (`YYYY-MM-DD`) or basic
/// (`YYYYMMDD`) form, optionally followed by `T` or a space and a time of
/// day: `HH`, `HH:MM`, `HH:MM:SS` or their basic forms `HHMM` / `HHMMSS`,
/// with an optional `.`/`,` fraction after the seconds and an optional
/// `Z`, `±HH`, `±HHMM` or `±HH:MM` offset. Surrounding whitespace is not
/// tolerated.
pub fn is_iso8601(value: &str) -> bool {
    if value.is_empty() || value.trim() != value || !value.is_ascii() {
        return false;
    }

    let (date, time) = match value.find(['T', ' ']) {
        Some(index) => (&value[..index], Some(&value[index + 1..])),
        None => (value, None),
    };
    if parse_date(date).is_none() {
        return false;
    }
    match time {
        Some(time) => parse_time_with_offset(time).is_some(),
        None => true,
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let (year, month, day) = match value.len() {
        10 if &value[4..5] == "-" && &value[7..8] == "-" => {
            (&value[..4], &value[5..7], &value[8..])
        }
        8 => (&value[..4], &value[4..6], &value[6..]),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(digits(year)? as i32, digits(month)?, digits(day)?)
}

fn parse_time_with_offset(value: &str) -> Option<NaiveTime> {
    let local = match value.strip_suffix('Z') {
        Some(local) => local,
        None => match value.rfind(['+', '-']) {
            Some(index) => {
                parse_offset(&value[index + 1..])?;
                &value[..index]
            }
            None => value,
        },
    };
    parse_time(local)
}

fn parse_offset(value: &str) -> Option<()> {
    let (hours, minutes) = match value.len() {
        2 => (value, "00"),
        4 => (&value[..2], &value[2..]),
        5 if &value[2..3] == ":" => (&value[..2], &value[3..]),
        _ => return None,
    };
    (digits(hours)? < 24 && digits(minutes)? < 60).then_some(())
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    let (clock, fraction) = match value.find(['.', ',']) {
        Some(index) => (&value[..index], Some(&value[index + 1..])),
        None => (value, None),
    };

    let (hour, minute, second) = match clock.len() {
        2 => (clock, "00", "00"),
        4 => (&clock[..2], &clock[2..], "00"),
        5 if &clock[2..3] == ":" => (&clock[..2], &clock[3..], "00"),
        6 => (&clock[..2], &clock[2..4], &clock[4..]),
        8 if &clock[2..3] == ":" && &clock[5..6] == ":" => {
            (&clock[..2], &clock[3..5], &clock[6..])
        }
        _ => return None,
    };

    if let Some(fraction) = fraction {
        // Fractions only follow seconds.
        if !matches!(clock.len(), 6 | 8) || !all_digits(fraction) {
            return None;
        }
    }

    NaiveTime::from_hms_opt(digits(hour)?, digits(minute)?, digits(second)?)
}

fn digits(value: &str) -> Option<u32> {
    if !all_digits(value) {
        return None;
    }
    value.parse().ok()
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::is_iso8601;

    #[test]
    fn accepts_common_iso_shapes() {
        for value in [
            "2024-01-01",
            "20240101",
            "2024-01-01T00:00:00",
            "2024-01-01 08:30:00",
            "2024-01-01T08:30",
            "2024-01-01T10",
            "20240101T000000",
            "20240101T0830",
            "2021-11-07T02:48:42Z",
            "2021-11-07T02:48:42.125",
            "2021-11-07T02:48:42,125",
            "2021-11-07T02:48:42+05:30",
            "2021-11-07T02:48:42+0530",
            "2021-11-07T02:48:42-05",
            "20211107T024842.5Z",
        ] {
            assert!(is_iso8601(value), "{value} should be accepted");
        }
    }

    #[test]
    fn rejects_non_iso_values() {
        for value in [
            "",
            "not-a-date",
            "01/02/2024",
            "2024-13-01T00:00:00",
            "2024-02-30",
            "2024-01-01T25:00:00",
            "2024-01-01T10:61",
            "2024-01-01T",
            "2024-01-01T10.5",
            "2024-01-01T10:00:00+25:00",
            "2024-01-01T10:00:00+5",
            "202401011",
            " 2024-01-01",
            "2024-01-01T00:00:00 trailing",
        ] {
            assert!(!is_iso8601(value), "{value:?} should be rejected");
        }
    }
}
