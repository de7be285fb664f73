//! Per-type enhancement filters.

use image::{DynamicImage, RgbImage};

use super::classify::DentalImageType;

/// 3x3 sharpen kernel; `filter3x3` divides by the kernel sum (16).
const SHARPEN_KERNEL: [f32; 9] = [-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0];

/// Apply the fixed filter chain for an image type.
pub fn enhance(image: &DynamicImage, kind: DentalImageType) -> DynamicImage {
    match kind {
        DentalImageType::Panoramic => contrast(&image.grayscale(), 1.4).unsharpen(1.5, 3),
        DentalImageType::Periapical => {
            let image = contrast(&image.grayscale(), 1.5);
            sharpen(&sharpen(&image))
        }
        DentalImageType::Bitewing => contrast(&image.grayscale(), 1.3).unsharpen(1.2, 2),
        DentalImageType::Intraoral => {
            let balanced = balance_channels(image, 1.05, 0.95);
            let saturated = DynamicImage::ImageRgb8(saturate(balanced, 1.2));
            sharpen(&contrast(&saturated, 1.15))
        }
        DentalImageType::Unknown => sharpen(&contrast(image, 1.2)),
    }
}

/// Scale contrast by `factor` (1.0 leaves the image unchanged).
pub fn contrast(image: &DynamicImage, factor: f32) -> DynamicImage {
    // adjust_contrast squares ((100 + c) / 100), so take the root of the factor.
    image.adjust_contrast((factor.sqrt() - 1.0) * 100.0)
}

pub fn sharpen(image: &DynamicImage) -> DynamicImage {
    image.filter3x3(&SHARPEN_KERNEL)
}

fn scale_channel(value: u8, factor: f32) -> u8 {
    (value as f32 * factor).round().clamp(0.0, 255.0) as u8
}

/// Scale the red and blue channels independently.
pub fn balance_channels(image: &DynamicImage, red: f32, blue: f32) -> RgbImage {
    let mut rgb = image.to_rgb8();
    for pixel in rgb.pixels_mut() {
        pixel.0[0] = scale_channel(pixel.0[0], red);
        pixel.0[2] = scale_channel(pixel.0[2], blue);
    }
    rgb
}

/// Move each pixel away from its grey value by `factor`.
pub fn saturate(mut rgb: RgbImage, factor: f32) -> RgbImage {
    for pixel in rgb.pixels_mut() {
        let [r, g, b] = pixel.0.map(|c| c as f32);
        let grey = 0.299 * r + 0.587 * g + 0.114 * b;
        pixel.0 = [r, g, b].map(|c| (grey + (c - grey) * factor).round().clamp(0.0, 255.0) as u8);
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb};

    #[test]
    fn test_xray_types_become_grey() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([200, 100, 50])));
        for kind in [
            DentalImageType::Panoramic,
            DentalImageType::Periapical,
            DentalImageType::Bitewing,
        ] {
            assert!(!enhance(&image, kind).color().has_color(), "{:?}", kind);
        }
        assert!(enhance(&image, DentalImageType::Intraoral).color().has_color());
    }

    #[test]
    fn test_contrast_spreads_values() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_fn(2, 1, |x, _| {
            Luma([if x == 0 { 100 } else { 160 }])
        }));
        let out = contrast(&image, 1.4).to_luma8();
        assert!(out.get_pixel(0, 0).0[0] < 100);
        assert!(out.get_pixel(1, 0).0[0] > 160);
    }

    #[test]
    fn test_balance_channels() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([100, 100, 100])));
        let out = balance_channels(&image, 1.05, 0.95);
        assert_eq!(out.get_pixel(0, 0).0, [105, 100, 95]);
    }

    #[test]
    fn test_saturate_keeps_grey() {
        let grey = RgbImage::from_pixel(1, 1, Rgb([90, 90, 90]));
        assert_eq!(saturate(grey, 1.2).get_pixel(0, 0).0, [90, 90, 90]);
    }

    #[test]
    fn test_sharpen_keeps_flat_image() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(5, 5, Luma([77])));
        assert_eq!(sharpen(&image).to_luma8().get_pixel(2, 2).0[0], 77);
    }
}
