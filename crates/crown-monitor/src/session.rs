//! Session name timestamps.
//!
//! Session files are named by the backend at recording start, e.g.
//! `neurosity_session_20240115_093000.csv`. The embedded
//! `YYYYMMDD_HHMMSS` stamp is the only structurally meaningful part of
//! the name; everything around it is free-form.

/// Creation timestamp extracted from a session name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl SessionTimestamp {
    /// Extract the first `YYYYMMDD_HHMMSS` stamp found anywhere in `name`.
    ///
    /// The stamp must be exactly 8 digits, an underscore, then 6 digits,
    /// and the field values must be in calendar/clock range. Returns
    /// `None` when no valid stamp is present, never an error.
    pub fn parse(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        // Candidate windows are 15 bytes: 8 digits + '_' + 6 digits.
        for start in 0..bytes.len().saturating_sub(14) {
            let window = &bytes[start..start + 15];
            if window[8] != b'_' {
                continue;
            }
            if !window[..8].iter().all(u8::is_ascii_digit)
                || !window[9..].iter().all(u8::is_ascii_digit)
            {
                continue;
            }
            if let Some(stamp) = Self::from_digits(window) {
                return Some(stamp);
            }
        }
        None
    }

    /// Build a timestamp from a validated 15-byte `YYYYMMDD_HHMMSS` window.
    fn from_digits(window: &[u8]) -> Option<Self> {
        let num = |range: std::ops::Range<usize>| -> u16 {
            window[range]
                .iter()
                .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'))
        };

        let stamp = Self {
            year: num(0..4),
            month: num(4..6) as u8,
            day: num(6..8) as u8,
            hour: num(9..11) as u8,
            minute: num(11..13) as u8,
            second: num(13..15) as u8,
        };

        let in_range = (1..=12).contains(&stamp.month)
            && (1..=31).contains(&stamp.day)
            && stamp.hour < 24
            && stamp.minute < 60
            && stamp.second < 60;
        in_range.then_some(stamp)
    }
}

impl std::fmt::Display for SessionTimestamp {
    /// Renders `dd/mm/yyyy hh:mm`, the format the dashboard shows next to
    /// each session.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{:04} {:02}:{:02}",
            self.day, self.month, self.year, self.hour, self.minute
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recording_filename() {
        let stamp = SessionTimestamp::parse("rec_20240115_093000.csv").unwrap();
        assert_eq!(
            stamp,
            SessionTimestamp {
                year: 2024,
                month: 1,
                day: 15,
                hour: 9,
                minute: 30,
                second: 0,
            }
        );
        assert_eq!(stamp.to_string(), "15/01/2024 09:30");
    }

    #[test]
    fn test_parse_embedded_anywhere() {
        let stamp = SessionTimestamp::parse("neurosity_session_20231224_235959").unwrap();
        assert_eq!((stamp.year, stamp.month, stamp.day), (2023, 12, 24));
        assert_eq!((stamp.hour, stamp.minute, stamp.second), (23, 59, 59));
    }

    #[test]
    fn test_parse_rejects_out_of_range_fields() {
        assert!(SessionTimestamp::parse("rec_20241315_093000.csv").is_none()); // month 13
        assert!(SessionTimestamp::parse("rec_20240100_093000.csv").is_none()); // day 0
        assert!(SessionTimestamp::parse("rec_20240115_253000.csv").is_none()); // hour 25
        assert!(SessionTimestamp::parse("rec_20240115_096100.csv").is_none()); // minute 61
    }

    #[test]
    fn test_parse_rejects_non_stamps() {
        assert!(SessionTimestamp::parse("session.csv").is_none());
        assert!(SessionTimestamp::parse("12345678_12345").is_none()); // short time
        assert!(SessionTimestamp::parse("").is_none());
    }

    #[test]
    fn test_parse_skips_invalid_candidate_then_matches() {
        // First digit window is not a valid date; the real stamp follows.
        let stamp = SessionTimestamp::parse("v99999999_999999_20240601_120000").unwrap();
        assert_eq!((stamp.year, stamp.month, stamp.day), (2024, 6, 1));
    }

    #[test]
    fn test_ordering_matches_recency() {
        let older = SessionTimestamp::parse("a_20240101_000000").unwrap();
        let newer = SessionTimestamp::parse("b_20240102_000000").unwrap();
        assert!(newer > older);
    }
}
