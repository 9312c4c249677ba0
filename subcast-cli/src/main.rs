use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use subcast::{ass, vtt, AuthScheme, RenderOptions, Resolution, TranscribeOptions, Transcript};

#[derive(Parser)]
#[command(name = "subcast", about = "Turn an audio file into a subtitled video")]
struct Cli {
    /// Audio file to transcribe and render.
    #[arg(required_unless_present = "convert")]
    input: Option<PathBuf>,

    /// Background image for the video (required for video output).
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "video")]
    format: OutputFormat,

    /// Write output to file instead of stdout (video defaults to <input>.mp4).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Canvas orientation.
    #[arg(short, long, default_value = "landscape")]
    resolution: ResolutionArg,

    /// Transcription endpoint.
    #[arg(long, env = "SUBCAST_API_URL")]
    api_url: Option<String>,

    /// Transcription API key.
    #[arg(long, env = "SUBCAST_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Send the key as `Authorization: Bearer` instead of an `api-key` header.
    #[arg(long)]
    bearer: bool,

    /// Model name sent with the request (not needed for Azure deployments).
    #[arg(short, long)]
    model: Option<String>,

    /// Spoken language code (e.g. "en", "de").
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Sampling temperature.
    #[arg(long, default_value = "0.2")]
    temperature: f32,

    /// Use a saved transcript JSON instead of calling the API.
    #[arg(long, conflicts_with = "convert")]
    transcript: Option<PathBuf>,

    /// Convert an existing WebVTT file to ASS and exit.
    #[arg(long)]
    convert: Option<PathBuf>,

    /// Longest time a single subtitle stays on screen, in seconds.
    #[arg(long, default_value = "10.0")]
    max_duration: f64,

    /// Length of the background clip, in seconds.
    #[arg(long, default_value = "194")]
    clip_duration: u64,

    /// x264 preset for the subtitle burn-in.
    #[arg(long, default_value = "slow")]
    preset: String,

    /// x264 constant rate factor for the subtitle burn-in.
    #[arg(long, default_value = "18")]
    crf: u8,

    /// AAC bitrate of the muxed audio.
    #[arg(long, default_value = "192k")]
    audio_bitrate: String,

    /// Path to the ffmpeg binary.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Directory for intermediate artifacts (kept after the run).
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Keep the temporary work directory.
    #[arg(long)]
    keep_artifacts: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Video,
    Vtt,
    Ass,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ResolutionArg {
    Landscape,
    Portrait,
}

impl From<ResolutionArg> for Resolution {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Landscape => Resolution::Landscape,
            ResolutionArg::Portrait => Resolution::Portrait,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("subcast=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let resolution = Resolution::from(cli.resolution);

    if let Some(vtt_path) = &cli.convert {
        let track = match std::fs::read_to_string(vtt_path) {
            Ok(t) => t,
            Err(e) => fail(format!("Error reading {}: {e}", vtt_path.display())),
        };
        match ass::transcode(&track, resolution) {
            Ok(styled) => emit(cli.output.as_deref(), &styled),
            Err(e) => fail(format!("Error: {e}")),
        }
        return;
    }

    let Some(input) = cli.input.clone() else {
        fail("Error: an input audio file is required".into());
    };

    if cli.format == OutputFormat::Video && cli.image.is_none() {
        fail("Error: --image is required for video output".into());
    }

    let render_options = match build_render_options(&cli, resolution) {
        Ok(o) => o,
        Err(e) => fail(format!("Error: {e}")),
    };

    let spinner = spinner();

    let transcript = match &cli.transcript {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => Transcript::from_json(&json),
            Err(e) => fail(format!("Error reading {}: {e}", path.display())),
        },
        None => {
            let transcribe_options = match build_transcribe_options(&cli) {
                Ok(o) => o,
                Err(e) => fail(format!("Error: {e}")),
            };
            spinner.set_message(format!("Transcribing {}", input.display()));
            subcast::transcribe::transcribe_file(&input, &transcribe_options).await
        }
    };

    let transcript = match transcript {
        Ok(t) => t,
        Err(e) => {
            spinner.finish_and_clear();
            fail(format!("Error: {e}"));
        }
    };

    eprintln!(
        "Transcript ready: {} segments{}",
        transcript.segments.len(),
        transcript
            .duration
            .map(|d| format!(", {d:.1}s of audio"))
            .unwrap_or_default()
    );

    let result = match cli.format {
        OutputFormat::Json => transcript.to_json_pretty(),
        OutputFormat::Vtt => subcast::segment(&transcript.segments, render_options.max_cue_duration)
            .map(|cues| vtt::write_cue_track(&cues)),
        OutputFormat::Ass => subcast::segment(&transcript.segments, render_options.max_cue_duration)
            .and_then(|cues| ass::transcode(&vtt::write_cue_track(&cues), resolution)),
        OutputFormat::Video => {
            let image = cli.image.clone().unwrap_or_default();
            let output = cli
                .output
                .clone()
                .unwrap_or_else(|| input.with_extension("mp4"));
            spinner.set_message(format!("Rendering {}", output.display()));
            let toolchain = subcast::Ffmpeg::from_options(&render_options);
            match subcast::render_transcript(
                &transcript,
                &input,
                &image,
                &output,
                &render_options,
                &toolchain,
            ) {
                Ok(path) => {
                    spinner.finish_and_clear();
                    eprintln!("Written to {}", path.display());
                    return;
                }
                Err(e) => Err(e),
            }
        }
    };

    spinner.finish_and_clear();
    match result {
        Ok(text) => emit(cli.output.as_deref(), &text),
        Err(e) => fail(format!("Error: {e}")),
    }
}

fn build_transcribe_options(cli: &Cli) -> subcast::Result<TranscribeOptions> {
    let url = cli.api_url.clone().unwrap_or_default();
    let key = cli.api_key.clone().unwrap_or_default();
    let auth = if cli.bearer {
        AuthScheme::Bearer
    } else {
        AuthScheme::ApiKeyHeader
    };

    let mut opts = TranscribeOptions::new(url, key)
        .auth(auth)
        .language(&cli.language)?
        .temperature(cli.temperature)?;
    if let Some(model) = &cli.model {
        opts = opts.model(model.clone());
    }
    opts.validate()?;
    Ok(opts)
}

fn build_render_options(cli: &Cli, resolution: Resolution) -> subcast::Result<RenderOptions> {
    let mut opts = RenderOptions::new()
        .resolution(resolution)
        .max_cue_duration(cli.max_duration)?
        .clip_duration(Duration::from_secs(cli.clip_duration))?
        .preset(cli.preset.clone())
        .crf(cli.crf)?
        .audio_bitrate(cli.audio_bitrate.clone())
        .ffmpeg_binary(cli.ffmpeg.clone())
        .keep_artifacts(cli.keep_artifacts);
    if let Some(dir) = &cli.work_dir {
        opts = opts.work_dir(dir.clone());
    }
    Ok(opts)
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn emit(output: Option<&Path>, text: &str) {
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, text) {
                fail(format!("Error writing to {}: {e}", path.display()));
            }
            eprintln!("Written to {}", path.display());
        }
        None => print!("{text}"),
    }
}

fn fail(message: String) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}
