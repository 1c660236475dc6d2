use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use prescription_ocr_rust::{languages, logging, server, settings, speech};

#[derive(Parser, Debug)]
#[command(
    name = "prescription-ocr-rust",
    version,
    about = "Extract, translate and speak prescriptions via generative AI"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP extraction/translation service
    Serve {
        /// Address to bind
        #[arg(long = "addr", default_value = "0.0.0.0:5000")]
        addr: String,
    },
    /// Convert text to speech, save it, and optionally play it back
    Speak {
        /// Text to speak
        #[arg(short = 't', long = "text", conflicts_with = "file")]
        text: Option<String>,

        /// Text file to speak
        #[arg(short = 'f', long = "file")]
        file: Option<PathBuf>,

        /// Language name (see the languages subcommand)
        #[arg(short = 'l', long = "language", default_value = "English")]
        language: String,

        /// Output audio path (defaults next to the input file)
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,

        /// Use slow speech
        #[arg(long = "slow")]
        slow: bool,

        /// Play the audio on the local device
        #[arg(long = "play")]
        play: bool,
    },
    /// List supported languages
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match cli.command {
        Commands::Serve { addr } => {
            let settings_path = cli.read_settings.as_deref().map(Path::new);
            let settings = settings::load_settings(settings_path)?;
            server::run_server(settings, addr).await
        }
        Commands::Speak {
            text,
            file,
            language,
            out,
            slow,
            play,
        } => run_speak(text, file, language, out, slow, play).await,
        Commands::Languages => {
            for lang in languages::SUPPORTED_LANGUAGES {
                println!("{}\t{}\t{}", lang.name, lang.code, lang.tld);
            }
            Ok(())
        }
    }
}

async fn run_speak(
    text: Option<String>,
    file: Option<PathBuf>,
    language: String,
    out: Option<PathBuf>,
    slow: bool,
    play: bool,
) -> Result<()> {
    let (text, source) = match (text, file) {
        (Some(text), None) => (text, None),
        (None, Some(path)) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read text file: {}", path.display()))?;
            if content.trim().is_empty() {
                return Err(anyhow!("text file is empty"));
            }
            (content.trim().to_string(), Some(path))
        }
        _ => return Err(anyhow!("provide exactly one of --text or --file")),
    };
    let lang = languages::resolve(&language)?;

    let client = speech::SpeechClient::new();
    let request = speech::SpeechRequest {
        text,
        language: language.clone(),
        slow,
    };

    match out {
        Some(path) => {
            let size = client.synthesize_to_file(&request, &path).await?;
            println!("Audio saved: {} ({} bytes)", path.display(), size);
            if play {
                speech::play_audio(&path).await?;
            }
        }
        None if play => {
            // Play-only mode keeps the audio in memory; the player needs a
            // path, so it reads from a scratch copy that drops afterwards.
            let bytes = client.synthesize(&request).await?;
            let scratch = tempfile::Builder::new()
                .prefix("prescription-speech-")
                .suffix(".mp3")
                .tempfile()
                .with_context(|| "failed to create scratch audio file")?;
            std::fs::write(scratch.path(), &bytes)
                .with_context(|| "failed to write scratch audio file")?;
            speech::play_audio(scratch.path()).await?;
        }
        None => {
            let path = speech::default_output_path(source.as_deref(), lang);
            let size = client.synthesize_to_file(&request, &path).await?;
            println!("Audio saved: {} ({} bytes)", path.display(), size);
        }
    }
    Ok(())
}
