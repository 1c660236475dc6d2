use anyhow::Context;
use axum::extract::Multipart;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use super::ServerError;
use crate::data;
use crate::settings::Settings;

const INVALID_IMAGE_TYPE: &str =
    "invalid file type. allowed: PNG, JPG, JPEG, GIF, BMP, TIFF, WEBP";

/// A validated upload spilled to a scratch file. The scratch copy is removed
/// when this value drops, on every exit path.
pub(crate) struct ScratchUpload {
    pub(crate) filename: String,
    scratch: NamedTempFile,
}

impl ScratchUpload {
    pub(crate) fn path(&self) -> &Path {
        self.scratch.path()
    }
}

/// Receive the `file` field of a multipart upload, validate filename and
/// extension, and spill the bytes to the scratch directory. Validation runs
/// before anything touches disk.
pub(crate) async fn receive_image(
    mut multipart: Multipart,
    settings: &Settings,
) -> Result<ScratchUpload, ServerError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        ServerError::bad_request(format!("failed to read form field: {}", err))
    })? {
        if field.name() != Some("file") {
            let _ = field.bytes().await;
            continue;
        }
        let filename = field.file_name().unwrap_or("").to_string();
        if filename.is_empty() {
            return Err(ServerError::bad_request("no file selected"));
        }
        let bytes = field.bytes().await.map_err(|err| {
            ServerError::bad_request(format!("failed to read file data: {}", err))
        })?;
        upload = Some((filename, bytes.to_vec()));
    }

    let Some((filename, bytes)) = upload else {
        return Err(ServerError::bad_request("no file provided"));
    };
    let ext = validate_image_filename(&filename)?;

    let scratch = write_scratch_file(&bytes, &ext, &settings.scratch_dir())?;
    debug!(
        "upload {} spilled to {} ({} bytes)",
        filename,
        scratch.path().display(),
        bytes.len()
    );
    Ok(ScratchUpload { filename, scratch })
}

pub(crate) struct TextUpload {
    pub(crate) text: String,
    pub(crate) target_language: Option<String>,
    pub(crate) context_info: Option<String>,
}

/// Receive a `.txt` upload plus the translation form fields. The document is
/// decoded in memory; no scratch copy is needed for text.
pub(crate) async fn receive_text_document(
    mut multipart: Multipart,
) -> Result<TextUpload, ServerError> {
    let mut document: Option<(String, Vec<u8>)> = None;
    let mut target_language = None;
    let mut context_info = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        ServerError::bad_request(format!("failed to read form field: {}", err))
    })? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("").to_string();
                if filename.is_empty() {
                    return Err(ServerError::bad_request("no file selected"));
                }
                let bytes = field.bytes().await.map_err(|err| {
                    ServerError::bad_request(format!("failed to read file data: {}", err))
                })?;
                document = Some((filename, bytes.to_vec()));
            }
            Some("target_language") => {
                let value = field.text().await.map_err(|err| {
                    ServerError::bad_request(format!("failed to read target_language: {}", err))
                })?;
                if !value.trim().is_empty() {
                    target_language = Some(value);
                }
            }
            Some("context_info") => {
                let value = field.text().await.map_err(|err| {
                    ServerError::bad_request(format!("failed to read context_info: {}", err))
                })?;
                if !value.trim().is_empty() {
                    context_info = Some(value);
                }
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    let Some((filename, bytes)) = document else {
        return Err(ServerError::bad_request("no file provided"));
    };
    validate_text_filename(&filename)?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ServerError::bad_request("text file must be UTF-8"))?;
    if text.trim().is_empty() {
        return Err(ServerError::bad_request("text file is empty"));
    }

    Ok(TextUpload {
        text,
        target_language,
        context_info,
    })
}

fn validate_image_filename(filename: &str) -> Result<String, ServerError> {
    data::allowed_image_extension(filename)
        .ok_or_else(|| ServerError::bad_request(INVALID_IMAGE_TYPE))
}

fn validate_text_filename(filename: &str) -> Result<(), ServerError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase());
    if ext.as_deref() == Some("txt") {
        Ok(())
    } else {
        Err(ServerError::bad_request("invalid file type. allowed: TXT"))
    }
}

fn write_scratch_file(
    bytes: &[u8],
    ext: &str,
    dir: &Path,
) -> Result<NamedTempFile, ServerError> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create scratch dir: {}", dir.display()))
        .map_err(ServerError::from)?;
    let suffix = format!(".{}", ext);
    let file = tempfile::Builder::new()
        .prefix("prescription-upload-")
        .suffix(&suffix)
        .tempfile_in(dir)
        .with_context(|| "failed to create scratch file")
        .map_err(ServerError::from)?;
    std::fs::write(file.path(), bytes)
        .with_context(|| "failed to write scratch upload")
        .map_err(ServerError::from)?;
    Ok(file)
}
