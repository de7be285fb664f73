//! Dental image preprocessing.
//!
//! Pipeline: Validate → Downsize → RGB → Classify → Enhance → JPEG

mod classify;
mod enhance;

pub use classify::*;
pub use enhance::*;

use std::io::Cursor;

use dental_report_llm::EncodedImage;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Smallest accepted width and height, in pixels.
pub const MIN_DIMENSION: u32 = 200;

/// Imaging errors.
#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Unrecognized image format")]
    UnrecognizedFormat,

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image too small: {width}x{height} (minimum {} px per side)", MIN_DIMENSION)]
    TooSmall { width: u32, height: u32 },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

pub type ImagingResult<T> = Result<T, ImagingError>;

/// An enhanced image ready for analysis.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub kind: DentalImageType,
    pub width: u32,
    pub height: u32,
    /// JPEG-encoded pixels
    pub jpeg: Vec<u8>,
}

impl ProcessedImage {
    /// Base64 form for a model request.
    pub fn encoded(&self) -> EncodedImage {
        EncodedImage::jpeg(&self.jpeg)
    }
}

/// Result of preprocessing several uploads.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub images: Vec<ProcessedImage>,
    /// Uploads that failed validation or processing
    pub rejected: usize,
}

/// Validates and enhances uploaded dental images.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    max_size: (u32, u32),
    supported_formats: Vec<String>,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new((1024, 1024), vec!["jpg".into(), "jpeg".into(), "png".into()])
    }
}

impl ImagePreprocessor {
    /// Create a preprocessor. Formats are file extensions, matched case-insensitively.
    pub fn new(max_size: (u32, u32), supported_formats: Vec<String>) -> Self {
        Self {
            max_size,
            supported_formats: supported_formats
                .into_iter()
                .map(|f| f.trim().trim_start_matches('.').to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    pub fn max_size(&self) -> (u32, u32) {
        self.max_size
    }

    fn is_supported(&self, format: ImageFormat) -> bool {
        format
            .extensions_str()
            .iter()
            .any(|ext| self.supported_formats.iter().any(|f| f == ext))
    }

    /// Check format and size, returning the decoded image.
    pub fn validate(&self, bytes: &[u8]) -> ImagingResult<DynamicImage> {
        let format = image::guess_format(bytes).map_err(|_| ImagingError::UnrecognizedFormat)?;
        if !self.is_supported(format) {
            let name = format
                .extensions_str()
                .first()
                .map(|ext| ext.to_string())
                .unwrap_or_else(|| format!("{:?}", format).to_lowercase());
            return Err(ImagingError::UnsupportedFormat(name));
        }

        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| ImagingError::Decode(e.to_string()))?;

        if image.width() < MIN_DIMENSION || image.height() < MIN_DIMENSION {
            return Err(ImagingError::TooSmall {
                width: image.width(),
                height: image.height(),
            });
        }

        Ok(image)
    }

    /// Validate, downsize, classify and enhance one upload.
    pub fn process(&self, bytes: &[u8]) -> ImagingResult<ProcessedImage> {
        let mut image = self.validate(bytes)?;

        let (max_width, max_height) = self.max_size;
        if image.width() > max_width || image.height() > max_height {
            image = image.resize(max_width, max_height, FilterType::Lanczos3);
        }

        let image = DynamicImage::ImageRgb8(image.to_rgb8());
        let kind = classify(&image);
        let enhanced = DynamicImage::ImageRgb8(enhance(&image, kind).to_rgb8());

        let mut jpeg = Cursor::new(Vec::new());
        enhanced
            .write_to(&mut jpeg, ImageFormat::Jpeg)
            .map_err(|e| ImagingError::Encode(e.to_string()))?;

        tracing::debug!(
            kind = kind.as_str(),
            width = enhanced.width(),
            height = enhanced.height(),
            "preprocessed image"
        );

        Ok(ProcessedImage {
            kind,
            width: enhanced.width(),
            height: enhanced.height(),
            jpeg: jpeg.into_inner(),
        })
    }

    /// Process every upload, keeping the ones that succeed.
    pub fn process_batch<B: AsRef<[u8]>>(&self, uploads: &[B]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for (index, upload) in uploads.iter().enumerate() {
            match self.process(upload.as_ref()) {
                Ok(image) => outcome.images.push(image),
                Err(e) => {
                    tracing::warn!(index, error = %e, "rejected image");
                    outcome.rejected += 1;
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_rejects_small_image() {
        let err = ImagePreprocessor::default().validate(&png(100, 300)).unwrap_err();
        assert!(matches!(err, ImagingError::TooSmall { width: 100, height: 300 }));
    }

    #[test]
    fn test_rejects_unknown_bytes() {
        let err = ImagePreprocessor::default().validate(b"plain text").unwrap_err();
        assert!(matches!(err, ImagingError::UnrecognizedFormat));
    }

    #[test]
    fn test_rejects_unsupported_format() {
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";
        let err = ImagePreprocessor::default().validate(gif).unwrap_err();
        assert!(matches!(err, ImagingError::UnsupportedFormat(ref f) if f == "gif"));

        let png_only = ImagePreprocessor::new((1024, 1024), vec![".PNG".into()]);
        assert!(png_only.validate(&png(200, 200)).is_ok());
    }

    #[test]
    fn test_process_downsizes_and_encodes_jpeg() {
        let processed = ImagePreprocessor::default().process(&png(2100, 700)).unwrap();
        assert_eq!(processed.kind, DentalImageType::Panoramic);
        assert_eq!(processed.width, 1024);
        assert!(processed.height <= 1024);
        assert_eq!(&processed.jpeg[..2], &[0xFF, 0xD8]);
        assert!(processed.encoded().data_url().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_batch_counts_rejections() {
        let uploads = vec![png(300, 300), png(50, 50), b"junk".to_vec()];
        let outcome = ImagePreprocessor::default().process_batch(&uploads);
        assert_eq!(outcome.images.len(), 1);
        assert_eq!(outcome.rejected, 2);
    }
}
