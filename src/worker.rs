use crate::fetch::{Fetcher, RequestHeaders};
use crate::resolve::ResolvedResource;
use crate::Result;
use image::{ImageFormat, ImageReader};
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    WebP,
}

impl MediaFormat {
    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::Bmp => "BMP",
            Self::WebP => "WEBP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Transport error, error status or unreadable body.
    Unreachable(String),
    /// Fetched, but not a decodable image in a supported format.
    Invalid,
    /// The candidate yields no usable file name (e.g. `/gallery/?f=.png`).
    UnusableName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { url: String },
    Failure { url: String, reason: FailureReason },
}

/// Sniffs the container from magic bytes and decodes its header. The URL
/// extension plays no part here.
pub fn detect_media_format(bytes: &[u8]) -> Option<MediaFormat> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    let format = MediaFormat::from_image_format(reader.format()?)?;
    reader.into_dimensions().ok()?;
    Some(format)
}

/// Fetches one resource and writes it into `dir` only after it validated.
///
/// Per-resource problems become [`Outcome::Failure`]; only a failed write
/// is returned as an error. Bytes land in a temp file in `dir` and are
/// renamed over the target, so a partial file never carries a media name.
pub fn process_resource<F: Fetcher + ?Sized>(
    fetcher: &F,
    headers: &RequestHeaders,
    resource: &ResolvedResource,
    dir: &Path,
) -> Result<Outcome> {
    if matches!(resource.file_name.as_str(), "" | "." | "..") {
        tracing::warn!(url = %resource.url, "resource_rejected_unusable_name");
        return Ok(Outcome::Failure {
            url: resource.url.clone(),
            reason: FailureReason::UnusableName,
        });
    }

    let bytes = match fetcher.fetch(&resource.url, headers) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(url = %resource.url, error = %err, "resource_fetch_failed");
            return Ok(Outcome::Failure {
                url: resource.url.clone(),
                reason: FailureReason::Unreachable(err.to_string()),
            });
        }
    };

    let Some(format) = detect_media_format(&bytes) else {
        tracing::warn!(
            url = %resource.url,
            bytes = bytes.len(),
            "resource_rejected_not_an_image"
        );
        return Ok(Outcome::Failure {
            url: resource.url.clone(),
            reason: FailureReason::Invalid,
        });
    };

    let save_path = dir.join(&resource.file_name);
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(&bytes)?;
    staged.flush()?;
    staged.persist(&save_path).map_err(|e| e.error)?;
    tracing::info!(
        url = %resource.url,
        path = %save_path.display(),
        format = format.as_str(),
        "resource_downloaded"
    );
    Ok(Outcome::Success {
        url: resource.url.clone(),
    })
}
