//! Shared utility functions for WISE crates.

/// Date utility functions
pub mod dates {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    /// Date format used on the wire: "YYYY-MM-DD"
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Date-time format used on the wire: "YYYY-MM-DDTHH:MM:SS"
    pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// Time-of-day format used by calculator responses: "HH:MM:SS"
    pub const TIME_FORMAT: &str = "%H:%M:%S";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)?)
    }

    /// Format a NaiveDateTime as "YYYY-MM-DDTHH:MM:SS"
    pub fn format_date_time(date_time: &NaiveDateTime) -> String {
        date_time.format(DATE_TIME_FORMAT).to_string()
    }

    /// Parse a date-time string.
    ///
    /// Accepts "YYYY-MM-DDTHH:MM:SS", the same with a space instead of the
    /// `T`, and "YYYY-MM-DDTHH:MM" (seconds default to zero).
    pub fn parse_date_time(s: &str) -> anyhow::Result<NaiveDateTime> {
        let s = s.trim();
        for format in [
            DATE_TIME_FORMAT,
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M",
        ] {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(parsed);
            }
        }
        anyhow::bail!("invalid date-time: {s}")
    }

    /// Parse a time of day in "HH:MM:SS" or "HH:MM" format
    pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
        let s = s.trim();
        match NaiveTime::parse_from_str(s, TIME_FORMAT) {
            Ok(t) => Ok(t),
            Err(_) => Ok(NaiveTime::parse_from_str(s, "%H:%M")?),
        }
    }

}

/// Helpers for the pipe-delimited text the Builder speaks
pub mod fields {
    /// Field separator used inside a record line.
    pub const SEPARATOR: char = '|';

    /// Split a response buffer into fields on `|`, `\r` and `\n`.
    ///
    /// Empty fields produced by adjacent separators (for example a `\r\n`
    /// line ending) are dropped.
    pub fn split_fields(buffer: &str) -> Vec<&str> {
        buffer
            .split(['|', '\r', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Split a single record line on `|`, keeping empty fields.
    pub fn split_line(line: &str) -> Vec<&str> {
        line.trim_end_matches(['\r', '\n']).split(SEPARATOR).collect()
    }

    /// Byte offset where the first field equal to `token` starts.
    ///
    /// The end of the buffer closes the last field, so a token that has
    /// not yet been followed by a separator still counts.
    pub fn field_offset(buffer: &str, token: &str) -> Option<usize> {
        let mut start = 0;
        let ends = buffer
            .match_indices(['|', '\r', '\n'])
            .map(|(index, _)| index)
            .chain(std::iter::once(buffer.len()));
        for end in ends {
            if buffer[start..end].trim() == token {
                return Some(start);
            }
            start = end + 1;
        }
        None
    }

    /// True when the text contains a character that would break record framing.
    pub fn has_reserved(text: &str) -> bool {
        text.contains(['|', '\n', '\r'])
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_split_fields_multiline() {
            let buffer = "C-1|Spruce-Lichen Woodland\r\nC-2|Boreal Spruce\r\nCOMPLETE\r\n";
            assert_eq!(
                split_fields(buffer),
                vec![
                    "C-1",
                    "Spruce-Lichen Woodland",
                    "C-2",
                    "Boreal Spruce",
                    "COMPLETE"
                ]
            );
        }

        #[test]
        fn test_split_line_keeps_empty() {
            assert_eq!(split_line("a||c\n"), vec!["a", "", "c"]);
        }

        #[test]
        fn test_field_offset() {
            assert_eq!(field_offset("a|b\nCOMPLETE\nx", "COMPLETE"), Some(4));
            assert_eq!(field_offset("a|b\r\nCOMPLETE", "COMPLETE"), Some(5));
            assert_eq!(field_offset("a|COMPLETE|b", "COMPLETE"), Some(2));
            assert_eq!(field_offset("a|COMPLETED\n", "COMPLETE"), None);
            assert_eq!(field_offset("a|b\nCOMPL", "COMPLETE"), None);
        }

        #[test]
        fn test_has_reserved() {
            assert!(has_reserved("a|b"));
            assert!(has_reserved("a\nb"));
            assert!(!has_reserved("stream 1"));
        }
    }
}
