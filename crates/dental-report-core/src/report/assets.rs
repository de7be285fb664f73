//! Logo and watermark loading.
//!
//! Asset problems never fail a document: anything that cannot be read or
//! decoded is logged and left out.

use printpdf::image_crate::{self, DynamicImage};

use crate::models::{ClinicBranding, ImageRef};

/// Share of the distance to white that every watermark pixel is moved.
const WATERMARK_FADE: f32 = 0.85;

/// Decoded branding images for one document.
#[derive(Debug, Clone, Default)]
pub struct ReportAssets {
    pub logo: Option<DynamicImage>,
    pub watermark: Option<DynamicImage>,
}

impl ReportAssets {
    /// Resolve the branding's image references.
    pub fn load(branding: &ClinicBranding) -> Self {
        Self {
            logo: branding.logo.as_ref().and_then(load_image),
            watermark: branding
                .watermark
                .as_ref()
                .and_then(load_image)
                .map(|image| fade_watermark(&image)),
        }
    }

    /// Width/height ratio of the logo.
    pub fn logo_aspect(&self) -> Option<f32> {
        self.logo.as_ref().map(aspect)
    }

    /// Width/height ratio of the watermark.
    pub fn watermark_aspect(&self) -> Option<f32> {
        self.watermark.as_ref().map(aspect)
    }
}

fn aspect(image: &DynamicImage) -> f32 {
    image.width() as f32 / image.height().max(1) as f32
}

/// Flatten onto white, then pull every channel toward white.
pub fn fade_watermark(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let faded = image_crate::RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let image_crate::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = f32::from(a) / 255.0;
        image_crate::Rgb([r, g, b].map(|c| {
            let flat = f32::from(c) * alpha + 255.0 * (1.0 - alpha);
            (flat + (255.0 - flat) * WATERMARK_FADE).round() as u8
        }))
    });
    DynamicImage::ImageRgb8(faded)
}

/// Read and decode an image reference; `None` on any failure.
pub fn load_image(reference: &ImageRef) -> Option<DynamicImage> {
    let bytes = match reference {
        ImageRef::File(path) => match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "image asset not readable, skipping");
                return None;
            }
        },
        ImageRef::Inline(bytes) => bytes.clone(),
    };

    match image_crate::load_from_memory(&bytes) {
        Ok(image) if image.width() > 0 && image.height() > 0 => Some(image),
        Ok(_) => {
            tracing::warn!("image asset has no pixels, skipping");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "image asset could not be decoded, skipping");
            None
        }
    }
}
