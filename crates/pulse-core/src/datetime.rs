//! ISO-8601 formatting/parsing for the wire codec's `Date` handling (§4.1).

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::CodecError;

pub fn epoch_millis_to_iso(ms: i64) -> String {
    let dt = Utc.timestamp_millis_opt(ms).single().unwrap_or_else(|| {
        Utc.timestamp_opt(0, 0).single().expect("epoch is valid")
    });
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Parse a full ISO-8601 timestamp, or, if the string matches `YYYY-MM-DD`,
/// construct a UTC-midnight instant (rejecting invalid calendar components).
pub fn iso_to_epoch_millis(s: &str) -> Result<i64, CodecError> {
    if is_plain_date_str(s) {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| invalid(s, &e.to_string()))?;
        let dt = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| invalid(s, "midnight is always valid"))?;
        return Ok(Utc.from_utc_datetime(&dt).timestamp_millis());
    }
    let dt: DateTime<Utc> = DateTime::parse_from_rfc3339(s)
        .map_err(|e| invalid(s, &e.to_string()))?
        .with_timezone(&Utc);
    Ok(dt.timestamp_millis())
}

fn is_plain_date_str(s: &str) -> bool {
    s.len() == 10 && s.as_bytes()[4] == b'-' && s.as_bytes()[7] == b'-'
}

fn invalid(s: &str, reason: &str) -> CodecError {
    CodecError::InvalidDate {
        index: 0,
        reason: format!("{s:?}: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_full_precision_iso() {
        let s = epoch_millis_to_iso(1_704_164_645_000);
        assert_eq!(s, "2024-01-02T03:04:05.000Z");
    }

    #[test]
    fn parses_date_only_as_utc_midnight() {
        let ms = iso_to_epoch_millis("2024-01-02").unwrap();
        assert_eq!(epoch_millis_to_iso(ms), "2024-01-02T00:00:00.000Z");
    }

    #[test]
    fn parses_full_iso_round_trip() {
        let ms = iso_to_epoch_millis("2024-01-02T03:04:05.000Z").unwrap();
        assert_eq!(ms, 1_704_164_645_000);
    }

    #[test]
    fn rejects_invalid_calendar_date() {
        assert!(iso_to_epoch_millis("2024-02-30").is_err());
    }
}
