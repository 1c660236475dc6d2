use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

const DEFAULT_MAX_UPLOAD_MB: usize = 16;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Gemini model id used for extraction and translation.
    pub model: String,
    /// Apply the legibility recipe to uploads before the provider call.
    pub enhance: bool,
    /// Directory for scratch copies of uploads; system temp dir when unset.
    pub scratch_dir: Option<String>,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: crate::providers::default_model().to_string(),
            enhance: true,
            scratch_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    extraction: Option<ExtractionSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtractionSettings {
    model: Option<String>,
    enhance: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    scratch_dir: Option<String>,
    max_upload_mb: Option<usize>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(extraction) = incoming.extraction {
            if let Some(model) = extraction.model
                && !model.trim().is_empty()
            {
                self.model = model;
            }
            if let Some(enhance) = extraction.enhance {
                self.enhance = enhance;
            }
        }
        if let Some(server) = incoming.server {
            if let Some(dir) = server.scratch_dir
                && !dir.trim().is_empty()
            {
                self.scratch_dir = Some(dir);
            }
            if let Some(limit) = server.max_upload_mb
                && limit > 0
            {
                self.max_upload_bytes = limit * 1024 * 1024;
            }
        }
    }

    pub fn scratch_dir(&self) -> PathBuf {
        match self.scratch_dir.as_deref() {
            Some(dir) => PathBuf::from(dir),
            None => std::env::temp_dir().join("prescription-ocr-rust"),
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".prescription-ocr-rust"))
        }
    })
}
