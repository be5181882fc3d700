//! Saving rendered frames to image files.

use std::path::Path;

use image::RgbaImage;

/// Saves a frame to an image file.
///
/// The format follows the extension (`.png`, `.jpg`, `.jpeg`). JPEG output
/// drops the alpha channel.
///
/// # Errors
/// Returns an error if the file cannot be written or the format is unsupported.
pub fn save_image(path: impl AsRef<Path>, image: &RgbaImage) -> Result<(), ScreenshotError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => image.save_with_format(path, image::ImageFormat::Png)?,
        "jpg" | "jpeg" => {
            let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            rgb.save_with_format(path, image::ImageFormat::Jpeg)?;
        }
        _ => return Err(ScreenshotError::UnsupportedFormat(extension)),
    }
    log::info!("saved {}x{} image to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// Encodes a frame as PNG in memory.
///
/// # Errors
/// Returns an error if encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ScreenshotError> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Error type for screenshot operations.
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("Failed to save image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image data")]
    InvalidImageData,
}
