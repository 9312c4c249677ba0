use std::fmt;

/// A subtitle timestamp with millisecond resolution.
///
/// Encodes as `HH:MM:SS.mmm` for cue tracks and `HH:MM:SS.cc` for styled
/// tracks. Both encodings truncate, never round. Hours are zero-padded to two
/// digits and widen past 99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    millis: u64,
}

/// Tolerance applied before truncating so that values like 3725.049 (stored as
/// 3725.04899999...) keep their written millisecond.
const FLOAT_TOLERANCE_MS: f64 = 1e-6;

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Truncate seconds to whole milliseconds. Negative and NaN inputs clamp to zero.
    pub fn from_seconds(seconds: f64) -> Self {
        let millis = (seconds * 1000.0 + FLOAT_TOLERANCE_MS).floor();
        Self {
            millis: if millis.is_nan() || millis <= 0.0 {
                0
            } else {
                millis as u64
            },
        }
    }

    pub fn as_millis(self) -> u64 {
        self.millis
    }

    pub fn as_seconds(self) -> f64 {
        self.millis as f64 / 1000.0
    }

    fn parts(self) -> (u64, u64, u64, u64) {
        let h = self.millis / 3_600_000;
        let m = (self.millis % 3_600_000) / 60_000;
        let s = (self.millis % 60_000) / 1_000;
        let ms = self.millis % 1_000;
        (h, m, s, ms)
    }

    /// Cue track encoding: `HH:MM:SS.mmm`.
    pub fn to_vtt(self) -> String {
        let (h, m, s, ms) = self.parts();
        format!("{h:02}:{m:02}:{s:02}.{ms:03}")
    }

    /// Styled track encoding: `HH:MM:SS.cc`, the first two millisecond digits.
    pub fn to_ass(self) -> String {
        let (h, m, s, ms) = self.parts();
        let cs = ms / 10;
        format!("{h:02}:{m:02}:{s:02}.{cs:02}")
    }

    /// Parse a cue track timestamp, `HH:MM:SS.mmm` or `MM:SS.mmm`.
    ///
    /// Minutes and seconds must be two digits below 60 and the fraction
    /// exactly three digits.
    pub fn parse_vtt(s: &str) -> Option<Self> {
        let (clock, frac) = s.trim().split_once('.')?;
        if frac.len() != 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let ms: u64 = frac.parse().ok()?;

        let fields: Vec<&str> = clock.split(':').collect();
        let (h, m, sec) = match fields.as_slice() {
            [h, m, s] => (parse_digits(h, None)?, parse_digits(m, Some(2))?, parse_digits(s, Some(2))?),
            [m, s] => (0, parse_digits(m, Some(2))?, parse_digits(s, Some(2))?),
            _ => return None,
        };
        if m >= 60 || sec >= 60 {
            return None;
        }

        Some(Self {
            millis: h * 3_600_000 + m * 60_000 + sec * 1_000 + ms,
        })
    }
}

/// Parse an all-digit field, optionally requiring an exact width.
fn parse_digits(field: &str, width: Option<usize>) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if width.is_some_and(|w| field.len() != w) {
        return None;
    }
    field.parse().ok()
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_vtt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_seconds_keeps_written_millis() {
        assert_eq!(Timestamp::from_seconds(3725.049).to_vtt(), "01:02:05.049");
        assert_eq!(Timestamp::from_seconds(1.001).as_millis(), 1001);
        assert_eq!(Timestamp::from_seconds(12.345).as_millis(), 12_345);
    }

    #[test]
    fn test_from_seconds_truncates() {
        assert_eq!(Timestamp::from_seconds(0.9999).as_millis(), 999);
        assert_eq!(Timestamp::from_seconds(2.0005).as_millis(), 2000);
    }

    #[test]
    fn test_from_seconds_clamps_invalid() {
        assert_eq!(Timestamp::from_seconds(-4.0).as_millis(), 0);
        assert_eq!(Timestamp::from_seconds(f64::NAN).as_millis(), 0);
    }

    #[test]
    fn test_to_vtt_zero() {
        assert_eq!(Timestamp::default().to_vtt(), "00:00:00.000");
    }

    #[test]
    fn test_to_vtt_widens_past_99_hours() {
        let ts = Timestamp::from_millis(100 * 3_600_000 + 1);
        assert_eq!(ts.to_vtt(), "100:00:00.001");
    }

    #[test]
    fn test_to_ass_truncates_to_centiseconds() {
        assert_eq!(Timestamp::from_seconds(3725.049).to_ass(), "01:02:05.04");
        assert_eq!(Timestamp::from_millis(999).to_ass(), "00:00:00.99");
        assert_eq!(Timestamp::from_millis(5).to_ass(), "00:00:00.00");
    }

    #[test]
    fn test_parse_vtt_full() {
        let ts = Timestamp::parse_vtt("01:02:05.049").unwrap();
        assert_eq!(ts.as_millis(), 3_725_049);
        assert_eq!(ts.to_ass(), "01:02:05.04");
    }

    #[test]
    fn test_parse_vtt_without_hours() {
        assert_eq!(Timestamp::parse_vtt("02:05.500").unwrap().as_millis(), 125_500);
    }

    #[test]
    fn test_parse_vtt_long_hours() {
        assert_eq!(
            Timestamp::parse_vtt("123:00:00.000").unwrap().as_millis(),
            123 * 3_600_000
        );
    }

    #[test]
    fn test_parse_vtt_rejects_malformed() {
        for bad in [
            "",
            "00:00:00",
            "00:00:00,000",
            "00:00:00.00",
            "00:60:00.000",
            "00:00:61.000",
            "0:0:0.000",
            "aa:bb:cc.ddd",
            "00:00:00:00.000",
            "00:00:00.-12",
        ] {
            assert!(Timestamp::parse_vtt(bad).is_none(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_vtt_encoding_parses_back() {
        let ts = Timestamp::from_seconds(5025.75);
        assert_eq!(Timestamp::parse_vtt(&ts.to_vtt()), Some(ts));
    }

    #[test]
    fn test_ordering() {
        assert!(Timestamp::from_millis(10) < Timestamp::from_millis(11));
    }
}
