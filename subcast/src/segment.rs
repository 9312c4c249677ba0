use tracing::debug;

use crate::config::check_max_cue_duration;
use crate::error::Result;
use crate::normalize::normalize;
use crate::types::{Cue, TranscriptSegment};

/// Suffix appended to every chunk after the first when a segment is split.
pub const CONTINUATION_SUFFIX: &str = " (cont.)";

/// Chunk-count slack, in multiples of `max_duration`, so a span that is an
/// exact multiple up to float error does not grow a near-empty trailing chunk.
const CHUNK_EPSILON: f64 = 1e-9;

/// Turn transcript segments into display cues.
///
/// Each segment's text is normalized; segments whose text normalizes to
/// nothing are dropped. Segments no longer than `max_duration` become one cue.
/// Longer ones are split into `ceil(duration / max_duration)` contiguous cues
/// that exactly tile `[start, end)`; every chunk after the first carries
/// [`CONTINUATION_SUFFIX`]. `max_duration` must be at least
/// [`MIN_CUE_DURATION`](crate::config::MIN_CUE_DURATION).
pub fn segment(segments: &[TranscriptSegment], max_duration: f64) -> Result<Vec<Cue>> {
    check_max_cue_duration(max_duration)?;

    let mut cues = Vec::with_capacity(segments.len());
    let mut dropped = 0usize;

    for (i, seg) in segments.iter().enumerate() {
        seg.validate(i)?;

        let text = normalize(&seg.text);
        if text.is_empty() {
            dropped += 1;
            continue;
        }

        let duration = seg.end - seg.start;
        if duration <= max_duration {
            cues.push(Cue {
                start: seg.start,
                end: seg.end,
                text,
            });
            continue;
        }

        let chunks = ((duration / max_duration) - CHUNK_EPSILON).ceil().max(1.0) as usize;
        for chunk in 0..chunks {
            let start = seg.start + chunk as f64 * max_duration;
            let end = if chunk + 1 == chunks {
                seg.end
            } else {
                seg.start + (chunk + 1) as f64 * max_duration
            };
            let text = if chunk == 0 {
                text.clone()
            } else {
                format!("{text}{CONTINUATION_SUFFIX}")
            };
            cues.push(Cue { start, end, text });
        }
        debug!(segment = i, chunks, duration, "split long segment");
    }

    debug!(
        segments = segments.len(),
        cues = cues.len(),
        dropped,
        "segmented transcript"
    );
    Ok(cues)
}
