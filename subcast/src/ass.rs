//! Cue track to styled (Advanced SubStation Alpha) track transcoding.

use std::path::Path;

use tracing::{debug, info};

use crate::config::Resolution;
use crate::error::{Error, Result};
use crate::vtt::{self, CueBlock};

/// Fade-in / fade-out override prefixed to every event's text.
pub const FADE_EFFECT: &str = r"{\fad(500,500)}";

/// Hard line break inside event text.
const LINE_BREAK: &str = r"\N";

/// Script header and the single `Default` style for a canvas size.
pub fn header(resolution: Resolution) -> String {
    let (width, height) = resolution.dimensions();
    format!(
        "[Script Info]
Title: Styled Subtitles
ScriptType: v4.00+
Collisions: Normal
PlayDepth: 0
PlayResX: {width}
PlayResY: {height}

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Nunito,72,&H00FFFFFF,&H000000FF,&H00000000,&H80000000,-1,0,0,0,100,100,0,0,1,3,2,2,20,20,100,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
"
    )
}

/// Word joiner placed after a literal backslash that would otherwise start
/// an `\N`, `\n` or `\h` escape.
const WORD_JOINER: char = '\u{2060}';

/// Make cue text inert: braces would open override blocks and a backslash
/// before `N`, `n` or `h` would break lines.
fn escape_event_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '\\' => {
                out.push('\\');
                if matches!(chars.peek(), Some('N' | 'n' | 'h')) {
                    out.push(WORD_JOINER);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Render one cue as a `Dialogue:` line, or `None` when it has no text.
pub fn dialogue_line(block: &CueBlock) -> Option<String> {
    if !block.has_text() {
        return None;
    }
    let text = block
        .lines
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| escape_event_text(l))
        .collect::<Vec<_>>()
        .join(LINE_BREAK);
    Some(format!(
        "Dialogue: 0,{},{},Default,,0,0,0,,{FADE_EFFECT}{text}",
        block.start.to_ass(),
        block.end.to_ass()
    ))
}

/// Transcode a cue track into a styled track for the given canvas.
///
/// Emits one event per cue, in order. Cues without text emit nothing.
pub fn transcode(cue_track: &str, resolution: Resolution) -> Result<String> {
    let blocks = vtt::parse_cue_track(cue_track)?;

    let mut out = header(resolution);
    let mut events = 0usize;
    for line in blocks.iter().filter_map(dialogue_line) {
        out.push_str(&line);
        out.push('\n');
        events += 1;
    }

    debug!(
        cues = blocks.len(),
        events,
        textless = blocks.len() - events,
        %resolution,
        "transcoded cue track"
    );
    Ok(out)
}

/// Read the cue track at `vtt_path`, transcode it, and write `ass_path`.
pub fn transcode_file(vtt_path: &Path, ass_path: &Path, resolution: Resolution) -> Result<()> {
    let cue_track = std::fs::read_to_string(vtt_path).map_err(|e| Error::io(vtt_path, e))?;
    let styled = transcode(&cue_track, resolution)?;
    std::fs::write(ass_path, styled).map_err(|e| Error::io(ass_path, e))?;
    info!(path = %ass_path.display(), "styled track written");
    Ok(())
}
