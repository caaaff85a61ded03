use image::{
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType as PngFilterType, PngEncoder},
    },
    imageops::FilterType,
    DynamicImage,
};

use super::UploadError;

/// Output encodings the pipeline produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    /// Kept as PNG so transparency survives
    Png,
}

impl ImageKind {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSettings {
    /// Target width in pixels; height follows the aspect ratio
    pub width: u32,
    pub jpeg_quality: u8,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            width: 800,
            jpeg_quality: 70,
        }
    }
}

/// Largest image the resize may produce (800 x 20000)
pub const MAX_OUTPUT_PIXELS: u64 = 16_000_000;

/// Decode, scale to the configured width and re-encode in `kind`.
///
/// CPU bound; callers run it on the blocking pool.
pub fn optimize(data: &[u8], kind: ImageKind, settings: &ImageSettings) -> Result<Vec<u8>, UploadError> {
    let decoded =
        image::load_from_memory(data).map_err(|e| UploadError::InvalidImage(e.to_string()))?;

    let (width, height) = (decoded.width() as u64, decoded.height() as u64);
    let target_width = settings.width as u64;
    let target_height = (height * target_width).div_ceil(width.max(1));
    if target_width * target_height > MAX_OUTPUT_PIXELS {
        return Err(UploadError::InvalidImage(format!(
            "{}x{} image would exceed {} pixels at {} px wide",
            width, height, MAX_OUTPUT_PIXELS, settings.width
        )));
    }

    let resized = decoded.resize(settings.width, u32::MAX, FilterType::Lanczos3);

    let mut out = Vec::with_capacity(data.len() / 2);
    match kind {
        ImageKind::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, settings.jpeg_quality))
        }
        ImageKind::Png => resized.write_with_encoder(PngEncoder::new_with_quality(
            &mut out,
            CompressionType::Best,
            PngFilterType::Adaptive,
        )),
    }
    .map_err(|e| UploadError::Processing(e.to_string()))?;

    Ok(out)
}
