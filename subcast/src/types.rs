use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One unit of recognized speech as returned by the transcription backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Reject times a cue could not be built from. `index` is only used in the message.
    pub(crate) fn validate(&self, index: usize) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(Error::MalformedTranscript(format!(
                "segment {index} has a non-finite time ({} -> {})",
                self.start, self.end
            )));
        }
        if self.start < 0.0 {
            return Err(Error::MalformedTranscript(format!(
                "segment {index} starts before zero ({})",
                self.start
            )));
        }
        if self.end < self.start {
            return Err(Error::MalformedTranscript(format!(
                "segment {index} ends before it starts ({} -> {})",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Complete transcription result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Wire shape of a verbose JSON response. Every field is optional so that a
/// missing one can be reported by name instead of as a generic serde error.
#[derive(Deserialize)]
struct RawTranscript {
    segments: Option<Vec<RawSegment>>,
    language: Option<String>,
    duration: Option<f64>,
}

#[derive(Deserialize)]
struct RawSegment {
    start: Option<f64>,
    end: Option<f64>,
    text: Option<String>,
}

impl Transcript {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self {
            segments,
            language: None,
            duration: None,
        }
    }

    /// Parse a verbose JSON transcription response.
    ///
    /// Unknown fields (`id`, `seek`, `tokens`, ...) are ignored. A missing
    /// `segments` array, a segment without `start`, `end` or `text`, or
    /// times that cannot form a cue fail the whole transcript.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawTranscript = serde_json::from_str(json)
            .map_err(|e| Error::MalformedTranscript(format!("invalid response body: {e}")))?;

        let raw_segments = raw
            .segments
            .ok_or_else(|| Error::MalformedTranscript("response has no `segments` array".into()))?;

        let segments = raw_segments
            .into_iter()
            .enumerate()
            .map(|(i, seg)| {
                let missing =
                    |field: &str| Error::MalformedTranscript(format!("segment {i} is missing `{field}`"));
                let segment = TranscriptSegment {
                    start: seg.start.ok_or_else(|| missing("start"))?,
                    end: seg.end.ok_or_else(|| missing("end"))?,
                    text: seg.text.ok_or_else(|| missing("text"))?,
                };
                segment.validate(i)?;
                Ok(segment)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Transcript {
            segments,
            language: raw.language,
            duration: raw.duration,
        })
    }

    /// Full text (all segments concatenated).
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Format as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A single displayable subtitle unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Cue {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERBOSE_JSON: &str = r#"{
        "task": "transcribe",
        "language": "english",
        "duration": 25.0,
        "text": "Hello there. Oh oh oh oh.",
        "segments": [
            {"id": 0, "seek": 0, "start": 0.0, "end": 3.0, "text": " Hello there.", "tokens": [1, 2]},
            {"id": 1, "seek": 300, "start": 3.0, "end": 25.0, "text": " Oh oh oh oh.", "tokens": [3]}
        ]
    }"#;

    #[test]
    fn test_from_json_verbose_response() {
        let t = Transcript::from_json(VERBOSE_JSON).unwrap();
        assert_eq!(t.segments.len(), 2);
        assert_eq!(t.segments[1], TranscriptSegment::new(3.0, 25.0, " Oh oh oh oh."));
        assert_eq!(t.language.as_deref(), Some("english"));
        assert_eq!(t.duration, Some(25.0));
    }

    #[test]
    fn test_from_json_missing_segments() {
        let err = Transcript::from_json(r#"{"text": "hi"}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedTranscript(_)));
        assert!(err.to_string().contains("segments"));
    }

    #[test]
    fn test_from_json_segment_missing_field() {
        let json = r#"{"segments": [
            {"start": 0.0, "end": 1.0, "text": "ok"},
            {"start": 1.0, "text": "no end"}
        ]}"#;
        let err = Transcript::from_json(json).unwrap_err();
        assert!(matches!(err, Error::MalformedTranscript(_)));
        assert!(err.to_string().contains("segment 1 is missing `end`"));
    }

    #[test]
    fn test_from_json_wrong_field_type() {
        let json = r#"{"segments": [{"start": "zero", "end": 1.0, "text": "x"}]}"#;
        assert!(matches!(
            Transcript::from_json(json),
            Err(Error::MalformedTranscript(_))
        ));
    }

    #[test]
    fn test_from_json_end_before_start() {
        let json = r#"{"segments": [{"start": 5.0, "end": 4.0, "text": "x"}]}"#;
        let err = Transcript::from_json(json).unwrap_err();
        assert!(err.to_string().contains("ends before it starts"));
    }

    #[test]
    fn test_from_json_negative_start() {
        let json = r#"{"segments": [{"start": -1.0, "end": 4.0, "text": "x"}]}"#;
        assert!(Transcript::from_json(json).is_err());
    }

    #[test]
    fn test_from_json_not_json() {
        assert!(matches!(
            Transcript::from_json("<html>502 Bad Gateway</html>"),
            Err(Error::MalformedTranscript(_))
        ));
    }

    #[test]
    fn test_from_json_empty_segments_is_valid() {
        let t = Transcript::from_json(r#"{"segments": []}"#).unwrap();
        assert!(t.segments.is_empty());
        assert_eq!(t.text(), "");
    }

    #[test]
    fn test_text_joins_trimmed_segments() {
        let t = Transcript::new(vec![
            TranscriptSegment::new(0.0, 1.0, " Hello "),
            TranscriptSegment::new(1.0, 2.0, "   "),
            TranscriptSegment::new(2.0, 3.0, "world"),
        ]);
        assert_eq!(t.text(), "Hello world");
    }

    #[test]
    fn test_to_json_pretty_reparses() {
        let t = Transcript::from_json(VERBOSE_JSON).unwrap();
        let json = t.to_json_pretty().unwrap();
        assert_eq!(Transcript::from_json(&json).unwrap(), t);
    }

    #[test]
    fn test_cue_duration() {
        let cue = Cue {
            start: 3.0,
            end: 13.0,
            text: "x".into(),
        };
        assert_eq!(cue.duration(), 10.0);
    }
}
