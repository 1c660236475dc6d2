use anyhow::{Context, Result, anyhow};
use std::path::Path;

pub const PNG_MIME: &str = "image/png";

/// Upload extensions the extract gateway accepts.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

#[derive(Debug, Clone)]
pub struct DataAttachment {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub name: Option<String>,
}

/// Extract the extension of an allowed image filename. Returns `None` for
/// filenames without a dot and for extensions outside the allow-list.
pub fn allowed_image_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

pub fn load_image(path: &Path) -> Result<DataAttachment> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image file: {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|value| value.to_str())
        .map(|value| value.to_string());
    load_image_from_bytes(bytes, name)
}

pub fn load_image_from_bytes(bytes: Vec<u8>, name: Option<String>) -> Result<DataAttachment> {
    let mime = resolve_image_mime(&bytes, name.as_deref())?;
    Ok(DataAttachment { bytes, mime, name })
}

fn resolve_image_mime(bytes: &[u8], name: Option<&str>) -> Result<String> {
    if let Some(kind) = infer::get(bytes) {
        let detected = kind.mime_type();
        if detected.starts_with("image/") {
            return Ok(detected.to_string());
        }
        return Err(anyhow!("data is not an image (detected '{}')", detected));
    }

    // Some BMP/TIFF variants escape signature sniffing; trust the extension
    // as a fallback.
    if let Some(ext) = name.and_then(allowed_image_extension)
        && let Some(mime) = mime_from_extension(&ext)
    {
        return Ok(mime.to_string());
    }

    Err(anyhow!("unable to detect an image mime type"))
}

pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some(PNG_MIME),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tiff" | "tif" => Some("image/tiff"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
