use std::path::Path;

use reqwest::multipart;
use tracing::{debug, info};

use crate::config::{AuthScheme, TranscribeOptions};
use crate::error::{Error, Result};
use crate::types::Transcript;

/// Longest response body carried in a [`Error::TranscriptionFailed`] message.
const MAX_ERROR_BODY_CHARS: usize = 1000;

/// Send an audio file to the speech-to-text backend and parse the verbose
/// JSON transcript it returns.
pub async fn transcribe_file(path: &Path, options: &TranscribeOptions) -> Result<Transcript> {
    options.validate()?;

    if !path.exists() {
        return Err(Error::AudioNotFound {
            path: path.to_path_buf(),
        });
    }

    let audio = tokio::fs::read(path).await.map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), bytes = audio.len(), "uploading audio for transcription");

    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".into());
    let part = multipart::Part::bytes(audio)
        .file_name(file_name)
        .mime_str(mime_type(path))?;

    let mut form = multipart::Form::new()
        .part("file", part)
        .text("response_format", "verbose_json")
        .text("temperature", options.temperature.to_string())
        .text("language", options.language.clone());
    if let Some(model) = &options.model {
        form = form.text("model", model.clone());
    }

    let client = reqwest::Client::builder().timeout(options.timeout).build()?;
    let request = client.post(&options.api_url);
    let request = match options.auth {
        AuthScheme::ApiKeyHeader => request.header("api-key", &options.api_key),
        AuthScheme::Bearer => request.bearer_auth(&options.api_key),
    };

    let response = request.multipart(form).send().await?;
    let status = response.status();
    let body = response.text().await?;
    debug!(status = status.as_u16(), bytes = body.len(), "transcription response");

    let transcript = parse_response(status.as_u16(), &body)?;
    info!(segments = transcript.segments.len(), "transcription complete");
    Ok(transcript)
}

/// Turn a backend response into a transcript, or a failure carrying status and body.
pub(crate) fn parse_response(status: u16, body: &str) -> Result<Transcript> {
    if !(200..300).contains(&status) {
        let message: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
        return Err(Error::TranscriptionFailed { status, message });
    }
    Transcript::from_json(body)
}

/// Upload MIME type from the file extension.
fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp3") | Some("mpga") | Some("mpeg") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}
