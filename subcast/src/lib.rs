//! Audio to subtitled video: transcript in, styled subtitle track and rendered video out.
//!
//! **subcast** handles the full pipeline: transcription through a remote
//! speech-to-text API, turning the transcript into bounded subtitle cues
//! (with chorus compression for repetitive lyrics), writing them as a WebVTT
//! cue track, transcoding that to an ASS track with a fade effect, and
//! compositing it with a background image and the original audio via ffmpeg.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> subcast::Result<()> {
//! use std::path::Path;
//! use subcast::{RenderOptions, Resolution, TranscribeOptions};
//!
//! let transcribe = TranscribeOptions::new("https://example.com/audio/transcriptions", "api-key");
//! let render = RenderOptions::new().resolution(Resolution::Portrait);
//!
//! let video = subcast::generate_video(
//!     Path::new("song.mp3"),
//!     Path::new("cover.png"),
//!     Path::new("song.mp4"),
//!     &transcribe,
//!     &render,
//! )
//! .await?;
//! println!("{}", video.display());
//! # Ok(())
//! # }
//! ```
//!
//! The subtitle stages are plain functions and can be used on their own:
//!
//! ```rust
//! use subcast::{segment, vtt, ass, Resolution, TranscriptSegment};
//!
//! let cues = segment(&[TranscriptSegment::new(0.0, 3.0, "la LA la")], 10.0).unwrap();
//! let track = vtt::write_cue_track(&cues);
//! let styled = ass::transcode(&track, Resolution::Landscape).unwrap();
//! assert!(styled.contains("Chorus: La (singing)"));
//! ```

pub mod ass;
pub mod config;
pub mod error;
pub mod normalize;
pub mod render;
pub mod segment;
pub mod timestamp;
#[cfg(feature = "transcribe")]
pub mod transcribe;
pub mod types;
pub mod vtt;

pub use config::{AuthScheme, RenderOptions, Resolution, TranscribeOptions};
pub use error::{Error, RenderStage, Result};
pub use normalize::normalize;
pub use render::{Ffmpeg, MediaToolchain, RenderJob};
pub use segment::segment;
pub use timestamp::Timestamp;
pub use types::{Cue, Transcript, TranscriptSegment};

use std::path::{Path, PathBuf};

use tracing::info;

/// Cue track artifact name inside the work dir.
pub const CUE_TRACK_FILE: &str = "transcription.vtt";
/// Styled track artifact name inside the work dir.
pub const STYLED_TRACK_FILE: &str = "subtitles.ass";

/// Transcribe `audio` and render it over `image` into `output` using ffmpeg.
#[cfg(feature = "transcribe")]
pub async fn generate_video(
    audio: &Path,
    image: &Path,
    output: &Path,
    transcribe_options: &TranscribeOptions,
    render_options: &RenderOptions,
) -> Result<PathBuf> {
    check_inputs(audio, image)?;

    let transcript = transcribe::transcribe_file(audio, transcribe_options).await?;

    let toolchain = Ffmpeg::from_options(render_options);
    render_transcript(&transcript, audio, image, output, render_options, &toolchain)
}

/// Render an already available transcript: segment it, write both subtitle
/// tracks into the work dir, and drive `toolchain` through the three render stages.
pub fn render_transcript(
    transcript: &Transcript,
    audio: &Path,
    image: &Path,
    output: &Path,
    options: &RenderOptions,
    toolchain: &dyn MediaToolchain,
) -> Result<PathBuf> {
    check_inputs(audio, image)?;

    let cues = segment(&transcript.segments, options.max_cue_duration)?;
    info!(
        segments = transcript.segments.len(),
        cues = cues.len(),
        "transcript segmented"
    );

    let work_dir = options.resolve_work_dir();
    std::fs::create_dir_all(&work_dir).map_err(|e| Error::io(&work_dir, e))?;
    // A caller-supplied work dir is never removed.
    let _cleanup = (options.work_dir.is_none() && !options.keep_artifacts)
        .then(|| TempDirGuard(&work_dir));

    let vtt_path = work_dir.join(CUE_TRACK_FILE);
    vtt::save_cue_track(&cues, &vtt_path)?;

    let ass_path = work_dir.join(STYLED_TRACK_FILE);
    ass::transcode_file(&vtt_path, &ass_path, options.resolution)?;

    let job = RenderJob {
        image: image.to_path_buf(),
        audio: audio.to_path_buf(),
        subtitles: ass_path,
        output: output.to_path_buf(),
        resolution: options.resolution,
        clip_duration: options.clip_duration,
        work_dir: work_dir.clone(),
    };
    render::render_video(toolchain, &job)
}

fn check_inputs(audio: &Path, image: &Path) -> Result<()> {
    if !audio.exists() {
        return Err(Error::AudioNotFound {
            path: audio.to_path_buf(),
        });
    }
    if !image.exists() {
        return Err(Error::ImageNotFound {
            path: image.to_path_buf(),
        });
    }
    Ok(())
}

/// RAII guard that removes an entire work directory when dropped.
struct TempDirGuard<'a>(&'a Path);

impl Drop for TempDirGuard<'_> {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(e) = std::fs::remove_dir_all(self.0) {
                tracing::warn!(path = %self.0.display(), error = %e, "failed to clean up work dir");
            }
        }
    }
}
