//! Text measurement and wrapping for the built-in Helvetica fonts.

/// Millimetres per PostScript point.
pub const MM_PER_PT: f32 = 0.352_778;

/// Built-in font family members used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

/// Helvetica advance widths for `' '..='~'`, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for `' '..='~'`, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width of one character in 1/1000 em. Oblique shares the upright metrics.
fn glyph_width(c: char, style: FontStyle) -> u16 {
    let table = match style {
        FontStyle::Bold => &HELVETICA_BOLD_WIDTHS,
        FontStyle::Regular | FontStyle::Italic => &HELVETICA_WIDTHS,
    };
    match c {
        ' '..='~' => table[c as usize - ' ' as usize],
        // Drawn as `?` after `pdf_safe`
        _ => table['?' as usize - ' ' as usize],
    }
}

fn em_to_mm(units: u32, font_size: f32) -> f32 {
    units as f32 / 1000.0 * font_size * MM_PER_PT
}

/// Rendered width of `text` in millimetres.
pub fn text_width_mm(text: &str, font_size: f32, style: FontStyle) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(c, style))).sum();
    em_to_mm(units, font_size)
}

/// Line height for a font size, in millimetres.
pub fn line_height_mm(font_size: f32) -> f32 {
    font_size * 1.3 * MM_PER_PT
}

/// Greedy word wrap to `width_mm`. Words wider than a line are split.
pub fn wrap_text(text: &str, width_mm: f32, font_size: f32, style: FontStyle) -> Vec<String> {
    let fits = |units: u32| em_to_mm(units, font_size) <= width_mm;
    let space = u32::from(glyph_width(' ', style));

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_units = 0u32;

    for word in text.split_whitespace() {
        let word_units: u32 = word.chars().map(|c| u32::from(glyph_width(c, style))).sum();

        if !current.is_empty() && fits(current_units + space + word_units) {
            current.push(' ');
            current.push_str(word);
            current_units += space + word_units;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_units = 0;
        }

        for c in word.chars() {
            let w = u32::from(glyph_width(c, style));
            if !current.is_empty() && !fits(current_units + w) {
                lines.push(std::mem::take(&mut current));
                current_units = 0;
            }
            current.push(c);
            current_units += w;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Wrap a block that may contain hard line breaks, keeping the breaks.
pub fn wrap_block(text: &str, width_mm: f32, font_size: f32, style: FontStyle) -> Vec<String> {
    text.lines()
        .flat_map(|line| wrap_text(line, width_mm, font_size, style))
        .collect()
}

/// Replace characters the built-in fonts cannot draw.
///
/// Output is printable ASCII. Common Latin-1 letters lose their accents.
pub fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' | '\u{00B7}' => '*',
            '\u{2610}' | '\u{00A0}' | '\t' => ' ',
            'À'..='Å' => 'A',
            'à'..='å' => 'a',
            'Ç' => 'C',
            'ç' => 'c',
            'È'..='Ë' => 'E',
            'è'..='ë' => 'e',
            'Ì'..='Ï' => 'I',
            'ì'..='ï' => 'i',
            'Ñ' => 'N',
            'ñ' => 'n',
            'Ò'..='Ö' | 'Ø' => 'O',
            'ò'..='ö' | 'ø' => 'o',
            'Ù'..='Ü' => 'U',
            'ù'..='ü' => 'u',
            'Ý' => 'Y',
            'ý' | 'ÿ' => 'y',
            ' '..='~' => c,
            _ => '?',
        })
        .collect()
}
