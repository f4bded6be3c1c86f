//! Ledger line format: `vendor, itemId, isoTimestamp,`.
//!
//! Fields are written verbatim with no quoting, so a field containing
//! `", "` cannot be told apart from a separator. Parsing takes the vendor
//! from the front and the timestamp from the back; whatever sits between is
//! the item id.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::LedgerError;

const SEPARATOR: &str = ", ";
const TERMINATOR: char = ',';

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub vendor: String,
    pub item_id: String,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Parse a single line (newline already stripped).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Malformed`] when the line lacks the trailing
    /// comma, a separator, or an RFC 3339 timestamp.
    pub fn parse(line: &str) -> Result<Self, LedgerError> {
        let malformed = |reason: &str| LedgerError::Malformed {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let body = line
            .strip_suffix(TERMINATOR)
            .ok_or_else(|| malformed("missing trailing comma"))?;
        let (head, timestamp) = body
            .rsplit_once(SEPARATOR)
            .ok_or_else(|| malformed("missing timestamp"))?;
        let (vendor, item_id) = head
            .split_once(SEPARATOR)
            .ok_or_else(|| malformed("missing item id"))?;
        let recorded_at = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|e| malformed(&format!("bad timestamp: {e}")))?
            .with_timezone(&Utc);

        Ok(Self {
            vendor: vendor.to_string(),
            item_id: item_id.to_string(),
            recorded_at,
        })
    }
}

/// `2024-05-01T12:00:00.000Z`: UTC, millisecond precision, `Z` suffix.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn format_line(vendor: &str, item_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "{vendor}{SEPARATOR}{item_id}{SEPARATOR}{}{TERMINATOR}",
        format_timestamp(at)
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn formats_line_exactly() {
        assert_eq!(
            format_line("canadacomputers", "ABCDE12345", at()),
            "canadacomputers, ABCDE12345, 2024-05-01T12:30:05.000Z,"
        );
    }

    #[test]
    fn parses_what_it_formats() {
        let line = format_line("canadacomputers", "no-id", at());
        let entry = LedgerEntry::parse(&line).unwrap();
        assert_eq!(entry.vendor, "canadacomputers");
        assert_eq!(entry.item_id, "no-id");
        assert_eq!(entry.recorded_at, at());
    }

    #[test]
    fn item_id_containing_separator_is_kept_whole() {
        let line = format_line("v", "a, b", at());
        let entry = LedgerEntry::parse(&line).unwrap();
        assert_eq!(entry.item_id, "a, b");
    }

    #[test]
    fn rejects_torn_line() {
        let err = LedgerEntry::parse("canadacomputers, ABCDE1").unwrap_err();
        assert!(matches!(err, LedgerError::Malformed { .. }));
    }

    #[test]
    fn rejects_bad_timestamp() {
        let err = LedgerEntry::parse("v, id, yesterday,").unwrap_err();
        assert!(
            matches!(err, LedgerError::Malformed { ref reason, .. } if reason.starts_with("bad timestamp")),
            "got: {err:?}"
        );
    }
}
