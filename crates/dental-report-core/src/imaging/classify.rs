//! Dental image type detection.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Kind of dental image, which selects the enhancement filters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DentalImageType {
    Panoramic,
    Periapical,
    Bitewing,
    Intraoral,
    Unknown,
}

impl DentalImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DentalImageType::Panoramic => "panoramic",
            DentalImageType::Periapical => "periapical",
            DentalImageType::Bitewing => "bitewing",
            DentalImageType::Intraoral => "intraoral",
            DentalImageType::Unknown => "unknown",
        }
    }
}

/// Luma statistics used by the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumaStats {
    pub mean: f64,
    pub std_dev: f64,
    /// Mean of the top quarter of rows
    pub top_mean: f64,
    /// Mean of the bottom quarter of rows
    pub bottom_mean: f64,
}

impl LumaStats {
    pub fn of(image: &DynamicImage) -> Self {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();
        let top_end = height / 4;
        let bottom_start = 3 * height / 4;

        let mut sum = 0f64;
        let mut sum_sq = 0f64;
        let mut top = (0f64, 0u64);
        let mut bottom = (0f64, 0u64);

        for (_, y, pixel) in luma.enumerate_pixels() {
            let v = pixel.0[0] as f64;
            sum += v;
            sum_sq += v * v;
            if y < top_end {
                top.0 += v;
                top.1 += 1;
            }
            if y >= bottom_start {
                bottom.0 += v;
                bottom.1 += 1;
            }
        }

        let n = (width as u64 * height as u64).max(1) as f64;
        let mean = sum / n;
        let variance = (sum_sq / n - mean * mean).max(0.0);
        let region_mean = |(total, count): (f64, u64)| if count == 0 { 0.0 } else { total / count as f64 };

        Self {
            mean,
            std_dev: variance.sqrt(),
            top_mean: region_mean(top),
            bottom_mean: region_mean(bottom),
        }
    }
}

/// Average per-pixel channel spread above which an image counts as colour.
const COLOUR_SPREAD: f64 = 8.0;

/// Whether the RGB channels carry real colour rather than repeated grey.
pub fn is_colour(image: &DynamicImage) -> bool {
    if !image.color().has_color() {
        return false;
    }
    let rgb = image.to_rgb8();
    let pixels = (rgb.width() as u64 * rgb.height() as u64).max(1) as f64;
    let spread: f64 = rgb
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (r.max(g).max(b) - r.min(g).min(b)) as f64
        })
        .sum();
    spread / pixels > COLOUR_SPREAD
}

/// Classify an image. Rules apply in order; the first match wins.
pub fn classify(image: &DynamicImage) -> DentalImageType {
    let aspect = image.width() as f64 / image.height().max(1) as f64;

    if aspect > 2.0 {
        return DentalImageType::Panoramic;
    }

    if aspect > 0.7 && aspect < 1.5 {
        let stats = LumaStats::of(image);
        if stats.std_dev > 40.0 {
            // Both dental arches show as dark bands at the edges.
            return if stats.top_mean < 100.0 && stats.bottom_mean < 100.0 {
                DentalImageType::Bitewing
            } else {
                DentalImageType::Periapical
            };
        }
    }

    if is_colour(image) {
        return DentalImageType::Intraoral;
    }

    DentalImageType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn banded(width: u32, height: u32, band: impl Fn(u32) -> u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, y| {
            let v = band(y);
            Rgb([v, v, v])
        }))
    }

    #[test]
    fn test_wide_is_panoramic() {
        assert_eq!(classify(&banded(900, 300, |_| 128)), DentalImageType::Panoramic);
    }

    #[test]
    fn test_dark_edges_is_bitewing() {
        let image = banded(400, 400, |y| if (100..300).contains(&y) { 220 } else { 20 });
        assert_eq!(classify(&image), DentalImageType::Bitewing);
    }

    #[test]
    fn test_bright_top_is_periapical() {
        let image = banded(400, 400, |y| if y < 200 { 230 } else { 20 });
        assert_eq!(classify(&image), DentalImageType::Periapical);
    }

    #[test]
    fn test_colour_photo_is_intraoral() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(400, 400, Rgb([200, 120, 120])));
        assert_eq!(classify(&image), DentalImageType::Intraoral);
    }

    #[test]
    fn test_flat_grey_is_unknown() {
        assert_eq!(classify(&banded(400, 400, |_| 128)), DentalImageType::Unknown);
        assert_eq!(classify(&banded(300, 400, |_| 90)), DentalImageType::Unknown);
    }

    #[test]
    fn test_luma_stats() {
        let stats = LumaStats::of(&banded(10, 8, |y| if y < 4 { 0 } else { 200 }));
        assert_eq!(stats.mean, 100.0);
        assert_eq!(stats.std_dev, 100.0);
        assert_eq!(stats.top_mean, 0.0);
        assert_eq!(stats.bottom_mean, 200.0);
    }
}
