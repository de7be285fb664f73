//! PDF rendering of a [`ReportLayout`] with printpdf.

use printpdf::image_crate::DynamicImage;
use printpdf::{
    BuiltinFont, Color, Greyscale, Image, ImageTransform, IndirectFontRef, Line, Mm,
    PdfDocument, PdfLayerReference, Point,
};

use super::assets::ReportAssets;
use super::layout::{Element, FontStyle, ImageSlot, ReportLayout};
use super::{ReportError, ReportResult};

const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;
const TEXT_GREY: f32 = 0.1;
const BORDER_GREY: f32 = 0.55;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

fn render_error(e: impl std::fmt::Display) -> ReportError {
    ReportError::Render(e.to_string())
}

/// Draw every page of the layout and serialize the document.
pub fn render_pdf(layout: &ReportLayout, assets: &ReportAssets) -> ReportResult<Vec<u8>> {
    let width = Mm(layout.page_width);
    let height = Mm(layout.page_height);
    let (doc, first_page, first_layer) = PdfDocument::new(layout.title.as_str(), width, height, "Content");

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?,
        italic: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(render_error)?,
    };

    for (index, page) in layout.pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, "Content")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);
        layer.set_outline_color(Color::Greyscale(Greyscale::new(BORDER_GREY, None)));
        layer.set_outline_thickness(0.6);
        layer.set_fill_color(Color::Greyscale(Greyscale::new(TEXT_GREY, None)));

        for element in &page.elements {
            draw(&layer, element, &fonts, assets);
        }
    }

    let bytes = doc.save_to_bytes().map_err(render_error)?;
    tracing::debug!(pages = layout.page_count(), bytes = bytes.len(), "rendered pdf");
    Ok(bytes)
}

fn draw(layer: &PdfLayerReference, element: &Element, fonts: &Fonts, assets: &ReportAssets) {
    match element {
        Element::Text {
            x,
            y,
            size,
            role,
            text,
        } => {
            layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), fonts.get(role.font()));
        }
        Element::Rule { x1, y1, x2, y2 } => {
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), Mm(*y1)), false),
                    (Point::new(Mm(*x2), Mm(*y2)), false),
                ],
                is_closed: false,
            });
        }
        Element::Cell {
            x,
            y,
            width,
            height,
        } => {
            let (left, bottom, right, top) = (*x, *y, x + width, y + height);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(left), Mm(bottom)), false),
                    (Point::new(Mm(right), Mm(bottom)), false),
                    (Point::new(Mm(right), Mm(top)), false),
                    (Point::new(Mm(left), Mm(top)), false),
                ],
                is_closed: true,
            });
        }
        Element::Image {
            slot,
            x,
            y,
            width,
            height,
        } => {
            let source = match slot {
                ImageSlot::Logo => assets.logo.as_ref(),
                ImageSlot::Watermark => assets.watermark.as_ref(),
            };
            if let Some(source) = source {
                place_image(layer, source, *x, *y, *width, *height);
            }
        }
    }
}

fn place_image(layer: &PdfLayerReference, source: &DynamicImage, x: f32, y: f32, width: f32, height: f32) {
    // Flatten alpha; the PDF image stream carries RGB only.
    let rgb = DynamicImage::ImageRgb8(source.to_rgb8());
    let natural_width = rgb.width() as f32 / IMAGE_DPI * MM_PER_INCH;
    let natural_height = rgb.height() as f32 / IMAGE_DPI * MM_PER_INCH;

    Image::from_dynamic_image(&rgb).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            scale_x: Some(width / natural_width),
            scale_y: Some(height / natural_height),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClinicBranding, DocumentOptions, ImageRef, PatientInfo};
    use crate::report::assets::tests::png_bytes;
    use crate::report::layout::assemble;
    use crate::report::sections::parse_sections;

    #[test]
    fn test_renders_pdf_bytes() {
        let branding = ClinicBranding {
            logo: Some(ImageRef::Inline(png_bytes(60, 30))),
            watermark: Some(ImageRef::Inline(png_bytes(40, 40))),
            ..Default::default()
        };
        let assets = ReportAssets::load(&branding);
        let layout = assemble(
            &PatientInfo::new("Jane Doe"),
            &parse_sections("## Findings\nPossible cavity."),
            &branding,
            &DocumentOptions::default(),
            &assets,
            chrono::Local::now(),
        );
        assert!(layout.pages[0].has_image(ImageSlot::Logo));
        assert!(layout.pages[0].has_image(ImageSlot::Watermark));

        let bytes = render_pdf(&layout, &assets).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
