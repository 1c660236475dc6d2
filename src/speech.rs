use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::languages::{self, Language};

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub language: String,
    pub slow: bool,
}

/// Client for the Google Translate TTS endpoint. The language table supplies
/// both the locale code and the TLD accent hint.
pub struct SpeechClient {
    client: reqwest::Client,
}

impl SpeechClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Convert text to MP3 bytes. Unsupported languages fail before any
    /// network traffic.
    pub async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        let text = request.text.trim();
        if text.is_empty() {
            bail!("text is empty");
        }
        let language = languages::resolve(&request.language)?;
        debug!(
            "synthesizing {} characters as {} ({})",
            text.len(),
            language.name,
            language.code
        );

        let speed = if request.slow { "0.24" } else { "1" };
        let response = self
            .client
            .get(tts_url(language))
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("q", text),
                ("tl", language.code),
                ("ttsspeed", speed),
            ])
            .send()
            .await
            .with_context(|| "TTS request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("TTS endpoint error ({})", status);
        }
        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            bail!("TTS endpoint returned no audio");
        }
        Ok(bytes)
    }

    /// Synthesize and persist to `output`, creating parent directories.
    /// Returns the written size in bytes.
    pub async fn synthesize_to_file(
        &self,
        request: &SpeechRequest,
        output: &Path,
    ) -> Result<u64> {
        let bytes = self.synthesize(request).await?;
        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory: {}", parent.display())
            })?;
        }
        std::fs::write(output, &bytes)
            .with_context(|| format!("failed to write audio file: {}", output.display()))?;
        info!("audio saved: {} ({} bytes)", output.display(), bytes.len());
        Ok(bytes.len() as u64)
    }
}

impl Default for SpeechClient {
    fn default() -> Self {
        Self::new()
    }
}

fn tts_url(language: &Language) -> String {
    format!("https://translate.google.{}/translate_tts", language.tld)
}

/// `{stem}_{language}_audio.mp3` next to the source file, or a bare
/// `speech_{language}_audio.mp3` when synthesizing from inline text.
pub fn default_output_path(source: Option<&Path>, language: &Language) -> PathBuf {
    let lang = language.name.to_lowercase();
    match source {
        Some(path) => {
            let stem = path
                .file_stem()
                .and_then(|value| value.to_str())
                .unwrap_or("speech");
            let name = format!("{}_{}_audio.mp3", stem, lang);
            match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
                _ => PathBuf::from(name),
            }
        }
        None => PathBuf::from(format!("speech_{}_audio.mp3", lang)),
    }
}

/// Play an audio file on the local device. Blocks until the player exits or
/// a line arrives on stdin, in which case the player is killed.
pub async fn play_audio(path: &Path) -> Result<()> {
    let mut child = player_command(path)
        .spawn()
        .with_context(|| "failed to start audio player")?;
    println!("Playing audio: {}", path.display());
    println!("Press Enter to stop playback...");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let finished = tokio::select! {
        status = child.wait() => Some(status),
        _ = lines.next_line() => None,
    };
    match finished {
        Some(status) => {
            let status = status.with_context(|| "audio player failed")?;
            if !status.success() {
                bail!("audio player exited with {}", status);
            }
        }
        None => {
            let _ = child.kill().await;
            info!("playback interrupted");
        }
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn player_command(path: &Path) -> Command {
    let mut cmd = Command::new("afplay");
    cmd.arg(path);
    cmd.kill_on_drop(true);
    cmd
}

#[cfg(not(target_os = "macos"))]
fn player_command(path: &Path) -> Command {
    let mut cmd = Command::new("mpg123");
    cmd.arg("-q").arg(path);
    cmd.kill_on_drop(true);
    cmd
}
