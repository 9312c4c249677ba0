//! Video rendering over an external media toolchain.
//!
//! The pipeline only talks to [`MediaToolchain`]; [`Ffmpeg`] is the real
//! implementation and shells out to the `ffmpeg` binary once per stage.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{RenderOptions, Resolution};
use crate::error::{Error, RenderStage, Result};

/// Longest stderr excerpt carried in a [`Error::RenderFailed`] message.
const MAX_STDERR_CHARS: usize = 1000;

/// The three media operations a render needs.
pub trait MediaToolchain {
    /// Loop a still image into a clip of `duration`, scaled and padded to the canvas.
    fn loop_image(
        &self,
        image: &Path,
        resolution: Resolution,
        duration: Duration,
        output: &Path,
    ) -> Result<()>;

    /// Burn a styled subtitle track onto a video.
    fn burn_subtitles(&self, video: &Path, subtitles: &Path, output: &Path) -> Result<()>;

    /// Mux an audio track into a video, trimmed to the shorter of the two.
    fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;
}

/// Inputs and artifact locations for one render.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub image: PathBuf,
    pub audio: PathBuf,
    pub subtitles: PathBuf,
    pub output: PathBuf,
    pub resolution: Resolution,
    pub clip_duration: Duration,
    /// Directory for the intermediate clips.
    pub work_dir: PathBuf,
}

/// Run loop, burn, and mux in order. The first failing stage aborts the rest.
pub fn render_video(toolchain: &dyn MediaToolchain, job: &RenderJob) -> Result<PathBuf> {
    let background = job.work_dir.join("background.mp4");
    let subtitled = job.work_dir.join("subtitled.mp4");

    info!(image = %job.image.display(), resolution = %job.resolution, "rendering background clip");
    toolchain.loop_image(&job.image, job.resolution, job.clip_duration, &background)?;

    info!(subtitles = %job.subtitles.display(), "burning subtitles");
    toolchain.burn_subtitles(&background, &job.subtitles, &subtitled)?;

    info!(audio = %job.audio.display(), "muxing audio");
    toolchain.mux_audio(&subtitled, &job.audio, &job.output)?;

    info!(output = %job.output.display(), "video ready");
    Ok(job.output.clone())
}

/// [`MediaToolchain`] backed by the `ffmpeg` command-line tool.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: PathBuf,
    preset: String,
    crf: u8,
    audio_bitrate: String,
}

impl Ffmpeg {
    pub fn from_options(options: &RenderOptions) -> Self {
        Self {
            binary: options.ffmpeg_binary.clone(),
            preset: options.preset.clone(),
            crf: options.crf,
            audio_bitrate: options.audio_bitrate.clone(),
        }
    }

    fn loop_image_args(
        image: &Path,
        resolution: Resolution,
        duration: Duration,
        output: &Path,
    ) -> Vec<OsString> {
        let (w, h) = resolution.dimensions();
        let mut args = common_args();
        args.extend(["-loop", "1", "-i"].map(OsString::from));
        args.push(image.into());
        args.extend(
            [
                "-c:v".to_string(),
                "libx264".to_string(),
                "-t".to_string(),
                format!("{:.3}", duration.as_secs_f64()),
                "-vf".to_string(),
                format!(
                    "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2"
                ),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
            ]
            .map(OsString::from),
        );
        args.push(output.into());
        args
    }

    fn burn_subtitles_args(&self, video: &Path, subtitles: &Path, output: &Path) -> Vec<OsString> {
        let mut args = common_args();
        args.push("-i".into());
        args.push(video.into());
        args.extend(
            [
                "-vf".to_string(),
                format!("ass={}", escape_filter_path(subtitles)),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-preset".to_string(),
                self.preset.clone(),
                "-crf".to_string(),
                self.crf.to_string(),
            ]
            .map(OsString::from),
        );
        args.push(output.into());
        args
    }

    fn mux_audio_args(&self, video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
        let mut args = common_args();
        args.push("-i".into());
        args.push(video.into());
        args.push("-i".into());
        args.push(audio.into());
        args.extend(
            [
                "-c:v".to_string(),
                "copy".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                self.audio_bitrate.clone(),
                "-shortest".to_string(),
            ]
            .map(OsString::from),
        );
        args.push(output.into());
        args
    }

    fn run(&self, stage: RenderStage, args: &[OsString]) -> Result<()> {
        debug!(%stage, binary = %self.binary.display(), ?args, "running ffmpeg");

        let output = Command::new(&self.binary).args(args).output().map_err(|e| {
            let message = if e.kind() == std::io::ErrorKind::NotFound {
                format!(
                    "{} not found, install with: apt install ffmpeg",
                    self.binary.display()
                )
            } else {
                format!("failed to run {}: {e}", self.binary.display())
            };
            Error::RenderFailed { stage, message }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::RenderFailed {
                stage,
                message: format!("{}: {}", output.status, stderr_tail(&stderr)),
            });
        }
        Ok(())
    }
}

impl MediaToolchain for Ffmpeg {
    fn loop_image(
        &self,
        image: &Path,
        resolution: Resolution,
        duration: Duration,
        output: &Path,
    ) -> Result<()> {
        let args = Self::loop_image_args(image, resolution, duration, output);
        self.run(RenderStage::LoopImage, &args)
    }

    fn burn_subtitles(&self, video: &Path, subtitles: &Path, output: &Path) -> Result<()> {
        let args = self.burn_subtitles_args(video, subtitles, output);
        self.run(RenderStage::BurnSubtitles, &args)
    }

    fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        let args = self.mux_audio_args(video, audio, output);
        self.run(RenderStage::MuxAudio, &args)
    }
}

fn common_args() -> Vec<OsString> {
    vec!["-nostdin".into(), "-y".into()]
}

/// Escape a path for use as a filter argument (`ass=<path>`).
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
        .replace(',', "\\,")
}

/// Last [`MAX_STDERR_CHARS`] characters of ffmpeg's stderr, where the error usually is.
fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    trimmed.chars().skip(count.saturating_sub(MAX_STDERR_CHARS)).collect()
}
