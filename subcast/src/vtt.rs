//! Line-oriented cue track (WebVTT subset) writing and parsing.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::timestamp::Timestamp;
use crate::types::Cue;

/// First line of every cue track.
pub const HEADER: &str = "WEBVTT";

/// Separator between the start and end timestamp of a timing line.
pub const TIMING_SEPARATOR: &str = "-->";

/// Serialize cues into a cue track: the header, a blank line, then one
/// `start --> end` / text / blank-line block per cue in input order.
/// `&`, `<` and `>` in cue text are written as character references.
pub fn write_cue_track(cues: &[Cue]) -> String {
    let mut out = format!("{HEADER}\n\n");
    for cue in cues {
        out.push_str(&format!(
            "{} {TIMING_SEPARATOR} {}\n",
            Timestamp::from_seconds(cue.start).to_vtt(),
            Timestamp::from_seconds(cue.end).to_vtt()
        ));
        out.push_str(&escape_text(&cue.text));
        out.push_str("\n\n");
    }
    out
}

/// Escape cue text so it can never read as markup or as a timing line.
fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Undo [`escape_text`], plus `&nbsp;`.
fn unescape_text(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

/// Write a cue track to `path`.
pub fn save_cue_track(cues: &[Cue], path: &Path) -> Result<()> {
    std::fs::write(path, write_cue_track(cues)).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), cues = cues.len(), "cue track written");
    Ok(())
}

/// One cue as read back from a cue track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueBlock {
    pub start: Timestamp,
    pub end: Timestamp,
    /// Text lines in order. Empty when the timing line had no text under it.
    pub lines: Vec<String>,
}

impl CueBlock {
    pub fn has_text(&self) -> bool {
        self.lines.iter().any(|l| !l.is_empty())
    }
}

enum State {
    /// Between cues.
    Idle,
    /// After a timing line, collecting text until a blank line.
    Text(CueBlock),
    /// After a timing line that did not parse; its text is discarded.
    Skip,
}

/// Parse a cue track.
///
/// Grammar: a `WEBVTT` header line, then blocks separated by blank lines.
/// A block starting with a timing line is a cue; its text runs to the next
/// blank line, timing line, or end of input. Inside cue text, a line holding
/// `-->` only ends the cue if it parses as timing. Blocks without a timing
/// line (identifiers, `NOTE`, `STYLE`) are ignored, as are cues whose
/// timestamps do not parse. Character references in text are decoded.
pub fn parse_cue_track(input: &str) -> Result<Vec<CueBlock>> {
    let mut lines = input.lines().enumerate();

    let header = lines
        .next()
        .map(|(_, l)| l.trim_start_matches('\u{feff}'))
        .unwrap_or_default();
    if !header.starts_with(HEADER) {
        return Err(Error::CueTrackParse {
            line: 1,
            reason: format!("expected \"{HEADER}\" header"),
        });
    }

    let mut blocks = Vec::new();
    let mut skipped = 0usize;
    let mut state = State::Idle;

    for (idx, raw) in lines {
        let line = raw.trim();

        if line.contains(TIMING_SEPARATOR) {
            let timing = parse_timing(line);
            if timing.is_none() {
                if let State::Text(block) = &mut state {
                    block.lines.push(unescape_text(line));
                    continue;
                }
            }
            if let State::Text(block) = std::mem::replace(&mut state, State::Idle) {
                blocks.push(block);
            }
            state = match timing {
                Some((start, end)) => State::Text(CueBlock {
                    start,
                    end,
                    lines: Vec::new(),
                }),
                None => {
                    warn!(line = idx + 1, timing = line, "skipping cue with unparseable timing");
                    skipped += 1;
                    State::Skip
                }
            };
            continue;
        }

        if line.is_empty() {
            if let State::Text(block) = std::mem::replace(&mut state, State::Idle) {
                blocks.push(block);
            }
            continue;
        }

        if let State::Text(block) = &mut state {
            block.lines.push(unescape_text(line));
        }
    }

    if let State::Text(block) = state {
        blocks.push(block);
    }

    debug!(cues = blocks.len(), skipped, "parsed cue track");
    Ok(blocks)
}

/// Split `start --> end [settings]` into timestamps.
fn parse_timing(line: &str) -> Option<(Timestamp, Timestamp)> {
    let (start, rest) = line.split_once(TIMING_SEPARATOR)?;
    let end = rest.split_whitespace().next()?;
    Some((Timestamp::parse_vtt(start)?, Timestamp::parse_vtt(end)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start: f64, end: f64, text: &str) -> Cue {
        Cue {
            start,
            end,
            text: text.into(),
        }
    }

    #[test]
    fn test_write_empty_track_is_header_only() {
        assert_eq!(write_cue_track(&[]), "WEBVTT\n\n");
    }

    #[test]
    fn test_write_exact_format() {
        let track = write_cue_track(&[
            cue(0.0, 3.0, "Hello there"),
            cue(3725.049, 3730.5, "Later"),
        ]);
        assert_eq!(
            track,
            "WEBVTT\n\n\
             00:00:00.000 --> 00:00:03.000\nHello there\n\n\
             01:02:05.049 --> 01:02:10.500\nLater\n\n"
        );
    }

    #[test]
    fn test_write_escapes_text() {
        let track = write_cue_track(&[cue(0.0, 1.0, "left --> right & <b>")]);
        assert_eq!(
            track,
            "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nleft --&gt; right &amp; &lt;b&gt;\n\n"
        );
    }

    #[test]
    fn test_save_writes_file() {
        let dir = std::env::temp_dir().join("subcast_test_vtt_save");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("track.vtt");

        save_cue_track(&[cue(1.0, 2.0, "one")], &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("WEBVTT\n\n00:00:01.000 --> 00:00:02.000\none\n\n"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_unwritable_path() {
        let path = Path::new("/nonexistent/dir/track.vtt");
        let err = save_cue_track(&[cue(1.0, 2.0, "one")], path).unwrap_err();
        match err {
            Error::Io { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_written_track() {
        let cues = [cue(0.0, 3.0, "Hello there"), cue(3.0, 13.0, "Chorus: Oh (singing)")];
        let blocks = parse_cue_track(&write_cue_track(&cues)).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].start, Timestamp::from_millis(3_000));
        assert_eq!(blocks[1].end, Timestamp::from_millis(13_000));
        assert_eq!(blocks[1].lines, vec!["Chorus: Oh (singing)".to_string()]);
    }

    #[test]
    fn test_parse_written_track_with_separator_in_text() {
        let cues = [
            cue(0.0, 1.0, "first"),
            cue(1.0, 2.0, "left --> right"),
            cue(2.0, 3.0, "a &amp; b"),
        ];
        let blocks = parse_cue_track(&write_cue_track(&cues)).unwrap();
        let texts: Vec<String> = blocks.iter().map(|b| b.lines.join("\n")).collect();
        assert_eq!(texts, vec!["first", "left --> right", "a &amp; b"]);
    }

    #[test]
    fn test_parse_unescaped_separator_inside_text() {
        let input = "WEBVTT\n\n\
                     00:00:00.000 --> 00:00:01.000\n\
                     left --> right\n\n\
                     00:00:01.000 --> 00:00:02.000\n\
                     next\n";
        let blocks = parse_cue_track(input).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines, vec!["left --> right".to_string()]);
        assert_eq!(blocks[1].lines, vec!["next".to_string()]);
    }

    #[test]
    fn test_parse_requires_header() {
        let err = parse_cue_track("00:00:00.000 --> 00:00:01.000\nhi\n").unwrap_err();
        assert!(matches!(err, Error::CueTrackParse { line: 1, .. }));
        assert!(matches!(
            parse_cue_track(""),
            Err(Error::CueTrackParse { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_header_with_bom_and_title() {
        let blocks = parse_cue_track("\u{feff}WEBVTT - lyrics\n\n00:01.000 --> 00:02.000\nhi\n").unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start.as_millis(), 1_000);
    }

    #[test]
    fn test_parse_timing_without_text_at_eof() {
        let blocks = parse_cue_track("WEBVTT\n\n00:00:00.000 --> 00:00:01.000").unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].has_text());
    }

    #[test]
    fn test_parse_timing_followed_by_timing() {
        let input = "WEBVTT\n\n\
                     00:00:00.000 --> 00:00:01.000\n\
                     00:00:01.000 --> 00:00:02.000\n\
                     second\n";
        let blocks = parse_cue_track(input).unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(!blocks[0].has_text());
        assert_eq!(blocks[1].lines, vec!["second".to_string()]);
    }

    #[test]
    fn test_parse_skips_identifiers_and_notes() {
        let input = "WEBVTT\n\n\
                     NOTE generated by hand\n\n\
                     intro\n\
                     00:00:00.000 --> 00:00:01.000 align:start position:10%\n\
                     hello\n";
        let blocks = parse_cue_track(input).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].end.as_millis(), 1_000);
        assert_eq!(blocks[0].lines, vec!["hello".to_string()]);
    }

    #[test]
    fn test_parse_keeps_multiline_text() {
        let input = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nfirst\nsecond\n\n";
        let blocks = parse_cue_track(input).unwrap();
        assert_eq!(blocks[0].lines, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_parse_skips_bad_timing_and_its_text() {
        let input = "WEBVTT\n\n\
                     00:00:xx.000 --> 00:00:01.000\n\
                     lost\n\n\
                     00:00:02.000 --> 00:00:03.000\n\
                     kept\n";
        let blocks = parse_cue_track(input).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, vec!["kept".to_string()]);
    }

    #[test]
    fn test_parse_crlf_line_endings() {
        let input = "WEBVTT\r\n\r\n00:00:00.000 --> 00:00:01.000\r\nhi\r\n\r\n";
        let blocks = parse_cue_track(input).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, vec!["hi".to_string()]);
    }
}
