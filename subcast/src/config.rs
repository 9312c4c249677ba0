use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default longest time a single cue stays on screen, in seconds.
pub const DEFAULT_MAX_CUE_DURATION: f64 = 10.0;

/// Shortest accepted max cue duration: one centisecond, the styled track's resolution.
pub const MIN_CUE_DURATION: f64 = 0.01;

/// Canvas orientation of the rendered video.
///
/// The styled subtitle header and the ffmpeg scale/pad filter both derive
/// their canvas size from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// 1920x1080.
    #[default]
    Landscape,
    /// 1080x1920.
    Portrait,
}

impl Resolution {
    /// Canvas `(width, height)` in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::Landscape => (1920, 1080),
            Resolution::Portrait => (1080, 1920),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Resolution::Landscape => "landscape",
            Resolution::Portrait => "portrait",
        }
    }

    /// Parse from string (e.g. CLI argument). Case-insensitive.
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "landscape" => Some(Resolution::Landscape),
            "portrait" => Some(Resolution::Portrait),
            _ => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How the API key is presented to the transcription backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScheme {
    /// `api-key: <key>` header (Azure OpenAI style).
    #[default]
    ApiKeyHeader,
    /// `Authorization: Bearer <key>` (OpenAI / Groq style).
    Bearer,
}

/// Builder for transcription backend options.
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    pub api_url: String,
    pub api_key: String,
    pub auth: AuthScheme,
    /// Optional `model` form field; Azure deployments encode it in the URL instead.
    pub model: Option<String>,
    pub language: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            auth: AuthScheme::ApiKeyHeader,
            model: None,
            language: "en".into(),
            temperature: 0.2,
            timeout: Duration::from_secs(300),
        }
    }
}

impl TranscribeOptions {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn auth(mut self, auth: AuthScheme) -> Self {
        self.auth = auth;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the spoken language as an ISO-639-1 code ("en", "de").
    pub fn language(mut self, lang: &str) -> Result<Self> {
        let lang = lang.trim().to_ascii_lowercase();
        if lang.len() < 2 || lang.len() > 3 || !lang.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidOption(format!(
                "language must be a 2 or 3 letter code, got \"{lang}\""
            )));
        }
        self.language = lang;
        Ok(self)
    }

    pub fn temperature(mut self, temp: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&temp) {
            return Err(Error::InvalidOption(format!(
                "temperature must be within 0.0..=1.0, got {temp}"
            )));
        }
        self.temperature = temp;
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that the endpoint and key are present before any request is made.
    pub fn validate(&self) -> Result<()> {
        let url = self.api_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(Error::InvalidOption(format!(
                "api url must start with http:// or https://, got \"{url}\""
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::InvalidOption("api key is empty".into()));
        }
        Ok(())
    }
}

/// Builder for cue segmentation and video rendering options.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub resolution: Resolution,
    /// Longest time a single cue stays on screen, in seconds.
    pub max_cue_duration: f64,
    /// Length of the looped background clip.
    pub clip_duration: Duration,
    /// x264 preset used when burning subtitles.
    pub preset: String,
    /// x264 constant rate factor used when burning subtitles.
    pub crf: u8,
    pub audio_bitrate: String,
    pub ffmpeg_binary: PathBuf,
    /// Directory for intermediate artifacts. A fresh temp dir is used when unset.
    pub work_dir: Option<PathBuf>,
    /// Keep an auto-created work dir instead of removing it afterwards.
    pub keep_artifacts: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::Landscape,
            max_cue_duration: DEFAULT_MAX_CUE_DURATION,
            clip_duration: Duration::from_secs(194),
            preset: "slow".into(),
            crf: 18,
            audio_bitrate: "192k".into(),
            ffmpeg_binary: PathBuf::from("ffmpeg"),
            work_dir: None,
            keep_artifacts: false,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn max_cue_duration(mut self, seconds: f64) -> Result<Self> {
        check_max_cue_duration(seconds)?;
        self.max_cue_duration = seconds;
        Ok(self)
    }

    pub fn clip_duration(mut self, duration: Duration) -> Result<Self> {
        if duration.is_zero() {
            return Err(Error::InvalidOption("clip duration must be non-zero".into()));
        }
        self.clip_duration = duration;
        Ok(self)
    }

    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    pub fn crf(mut self, crf: u8) -> Result<Self> {
        if crf > 51 {
            return Err(Error::InvalidOption(format!(
                "crf must be within 0..=51, got {crf}"
            )));
        }
        self.crf = crf;
        Ok(self)
    }

    pub fn audio_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.audio_bitrate = bitrate.into();
        self
    }

    pub fn ffmpeg_binary(mut self, binary: PathBuf) -> Self {
        self.ffmpeg_binary = binary;
        self
    }

    pub fn work_dir(mut self, dir: PathBuf) -> Self {
        self.work_dir = Some(dir);
        self
    }

    pub fn keep_artifacts(mut self, keep: bool) -> Self {
        self.keep_artifacts = keep;
        self
    }

    /// Resolve the artifact directory.
    ///
    /// Without an explicit `work_dir` this is a unique directory per call so
    /// concurrent pipeline runs (even within the same process) never collide.
    pub fn resolve_work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!(
                "subcast-{}-{}",
                std::process::id(),
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_nanos()
            ))
        })
    }
}

/// Reject a max cue duration that is not finite or below [`MIN_CUE_DURATION`].
pub(crate) fn check_max_cue_duration(seconds: f64) -> Result<()> {
    if !seconds.is_finite() || seconds < MIN_CUE_DURATION {
        return Err(Error::InvalidOption(format!(
            "max cue duration must be at least {MIN_CUE_DURATION} seconds, got {seconds}"
        )));
    }
    Ok(())
}
