use std::fmt;
use std::path::{Path, PathBuf};

/// External media toolchain invocation that can fail during rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    /// Looping the background image into a base clip.
    LoopImage,
    /// Burning the styled subtitle track onto the base clip.
    BurnSubtitles,
    /// Muxing the original audio into the subtitled clip.
    MuxAudio,
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderStage::LoopImage => write!(f, "loop image"),
            RenderStage::BurnSubtitles => write!(f, "burn subtitles"),
            RenderStage::MuxAudio => write!(f, "mux audio"),
        }
    }
}

/// All errors that can occur in subcast.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed transcript: {0}")]
    MalformedTranscript(String),

    #[error("transcription failed with status {status}: {message}")]
    TranscriptionFailed { status: u16, message: String },

    #[error("malformed cue track at line {line}: {reason}")]
    CueTrackParse { line: usize, reason: String },

    #[error("render failed during {stage}: {message}")]
    RenderFailed { stage: RenderStage, message: String },

    #[error("audio file not found: {path}")]
    AudioNotFound { path: PathBuf },

    #[error("image file not found: {path}")]
    ImageNotFound { path: PathBuf },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "transcribe")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap an I/O error with the artifact path it happened on.
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
