//! Page layout for report documents.
//!
//! [`assemble`] turns the report inputs into a [`ReportLayout`]: pages of
//! positioned elements in millimetres, y measured from the bottom edge.
//! The renderer only draws what the layout says, so everything a reader sees
//! on the page can be checked here without touching PDF bytes.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::assets::ReportAssets;
use super::sections::{paragraphs, ReportSections};
use super::text::{line_height_mm, pdf_safe, text_width_mm, wrap_block, wrap_text, MM_PER_PT};

pub use super::text::FontStyle;
use super::{DETAILED_DISCLAIMER, REGULATORY_DISCLAIMER};
use crate::models::{display_or_na, ClinicBranding, DocumentOptions, PatientInfo, ReportVariant};

const MARGIN_MM: f32 = 20.0;
const PAGE_NUMBER_BASELINE_MM: f32 = 10.0;
const FOOTER_GAP_MM: f32 = 6.0;

const TITLE_SIZE: f32 = 18.0;
const META_SIZE: f32 = 10.0;
const TIMESTAMP_SIZE: f32 = 9.0;
const REPORT_TITLE_SIZE: f32 = 14.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const NOTICE_SIZE: f32 = 9.0;
const FOOTER_SIZE: f32 = 7.0;
/// Smallest size the disclaimer shrinks to before it wraps.
const MIN_DISCLAIMER_SIZE: f32 = 5.5;

const LABEL_COLUMN_MM: f32 = 50.0;
const CELL_PAD_MM: f32 = 2.0;
const SECTION_GAP_MM: f32 = 5.0;
const PARAGRAPH_GAP_MM: f32 = 2.0;

const LOGO_HEIGHT_MM: f32 = 18.0;
const LOGO_MAX_WIDTH_MM: f32 = 70.0;

const NOTE_LINES: usize = 3;
const NOTE_LINE_SPACING_MM: f32 = 8.0;
const SIGNATURE_SPACE_MM: f32 = 15.0;
const SIGNATURE_RULE_MM: f32 = 80.0;
const DATE_RULE_MM: f32 = 50.0;

const APPROVAL_INTRO: &str = "I confirm that I have reviewed this AI-generated report and:";
const APPROVAL_OPTIONS: [&str; 3] = [
    "[ ] Approve the findings as presented",
    "[ ] Approve with modifications noted below",
    "[ ] Reject the findings",
];

/// What a piece of text is, which also decides its font.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextRole {
    ClinicName,
    Contact,
    Timestamp,
    ReportTitle,
    Heading,
    Body,
    CellLabel,
    CellValue,
    Label,
    Notice,
    ClinicFooter,
    Disclaimer,
    PageNumber,
}

impl TextRole {
    pub fn font(&self) -> FontStyle {
        match self {
            TextRole::ClinicName
            | TextRole::ReportTitle
            | TextRole::Heading
            | TextRole::CellLabel => FontStyle::Bold,
            TextRole::Notice | TextRole::Disclaimer | TextRole::ClinicFooter => FontStyle::Italic,
            _ => FontStyle::Regular,
        }
    }
}

/// Which branding image an image slot shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlot {
    Logo,
    Watermark,
}

/// One positioned drawing instruction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    /// Text with its baseline at `y`
    Text {
        x: f32,
        y: f32,
        size: f32,
        role: TextRole,
        text: String,
    },
    /// Straight line
    Rule { x1: f32, y1: f32, x2: f32, y2: f32 },
    /// Bordered rectangle, `y` at its bottom edge
    Cell { x: f32, y: f32, width: f32, height: f32 },
    /// Image scaled into the box, `y` at its bottom edge
    Image {
        slot: ImageSlot,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

impl Element {
    fn text_with_role(&self) -> Option<(&str, TextRole)> {
        match self {
            Element::Text { text, role, .. } => Some((text.as_str(), *role)),
            _ => None,
        }
    }
}

/// Elements of one page in draw order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageLayout {
    pub elements: Vec<Element>,
}

impl PageLayout {
    /// All text on the page joined with single spaces, in draw order.
    pub fn text(&self) -> String {
        self.elements
            .iter()
            .filter_map(Element::text_with_role)
            .map(|(text, _)| text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text elements with the given role.
    pub fn texts_with_role(&self, role: TextRole) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(Element::text_with_role)
            .filter(|(_, r)| *r == role)
            .map(|(text, _)| text)
            .collect()
    }

    pub fn has_image(&self, slot: ImageSlot) -> bool {
        self.elements
            .iter()
            .any(|e| matches!(e, Element::Image { slot: s, .. } if *s == slot))
    }
}

/// A fully paginated document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportLayout {
    pub title: String,
    pub page_width: f32,
    pub page_height: f32,
    pub pages: Vec<PageLayout>,
}

impl ReportLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// SHA-256 over every element except the generation timestamp.
    ///
    /// Two layouts built from the same inputs at different times share a
    /// fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.title.as_bytes());
        hasher.update(self.page_width.to_le_bytes());
        hasher.update(self.page_height.to_le_bytes());

        for (index, page) in self.pages.iter().enumerate() {
            hasher.update((index as u64).to_le_bytes());
            for element in &page.elements {
                if let Element::Text {
                    role: TextRole::Timestamp,
                    ..
                } = element
                {
                    continue;
                }
                // Element serialization cannot fail: no maps with non-string keys.
                if let Ok(bytes) = serde_json::to_vec(element) {
                    hasher.update(&bytes);
                }
            }
        }

        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct Geometry {
    page_width: f32,
    page_height: f32,
    content_top: f32,
    content_bottom: f32,
}

impl Geometry {
    fn content_width(&self) -> f32 {
        self.page_width - 2.0 * MARGIN_MM
    }

    fn right_edge(&self) -> f32 {
        self.page_width - MARGIN_MM
    }

    fn span(&self) -> f32 {
        self.content_top - self.content_bottom
    }
}

/// Footer text shared by every page.
struct Footer {
    clinic_lines: Vec<String>,
    disclaimer_size: f32,
    disclaimer_lines: Vec<String>,
}

impl Footer {
    fn new(branding: &ClinicBranding, width: f32) -> Self {
        let clinic_lines = branding
            .footer_line()
            .map(|line| wrap_text(&pdf_safe(line), width, FOOTER_SIZE, FontStyle::Italic))
            .unwrap_or_default();

        // Largest size, in tenths of a point, that keeps the disclaimer on one line.
        let one_point = text_width_mm(REGULATORY_DISCLAIMER, 1.0, FontStyle::Italic);
        let disclaimer_size = ((width / one_point * 10.0).floor() / 10.0)
            .clamp(MIN_DISCLAIMER_SIZE, FOOTER_SIZE);

        Self {
            clinic_lines,
            disclaimer_size,
            disclaimer_lines: wrap_text(
                REGULATORY_DISCLAIMER,
                width,
                disclaimer_size,
                FontStyle::Italic,
            ),
        }
    }

    /// Top of the footer area.
    fn top(&self) -> f32 {
        PAGE_NUMBER_BASELINE_MM
            + (1 + self.clinic_lines.len()) as f32 * line_height_mm(FOOTER_SIZE)
            + self.disclaimer_lines.len() as f32 * line_height_mm(self.disclaimer_size)
    }

    fn elements(&self, page_number: usize, geometry: &Geometry) -> Vec<Element> {
        let mut y = self.top();
        let mut elements = Vec::new();

        let lines = self
            .clinic_lines
            .iter()
            .map(|l| (l, FOOTER_SIZE, TextRole::ClinicFooter))
            .chain(
                self.disclaimer_lines
                    .iter()
                    .map(|l| (l, self.disclaimer_size, TextRole::Disclaimer)),
            );
        for (line, size, role) in lines {
            y -= line_height_mm(size);
            elements.push(Element::Text {
                x: MARGIN_MM,
                y,
                size,
                role,
                text: line.clone(),
            });
        }

        let label = format!("Page {}", page_number);
        elements.push(Element::Text {
            x: geometry.right_edge() - text_width_mm(&label, FOOTER_SIZE, FontStyle::Regular),
            y: PAGE_NUMBER_BASELINE_MM,
            size: FOOTER_SIZE,
            role: TextRole::PageNumber,
            text: label,
        });
        elements
    }
}

/// Top-down placement with page breaks.
struct PageCursor {
    geometry: Geometry,
    pages: Vec<Vec<Element>>,
    current: Vec<Element>,
    y: f32,
}

impl PageCursor {
    fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
            current: Vec::new(),
            y: geometry.content_top,
        }
    }

    fn remaining(&self) -> f32 {
        self.y - self.geometry.content_bottom
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = self.geometry.content_top;
    }

    /// Start a new page unless `height` fits above the footer.
    fn ensure(&mut self, height: f32) {
        if height > self.remaining() && !self.current.is_empty() {
            self.break_page();
        }
    }

    fn space(&mut self, height: f32) {
        if !self.current.is_empty() {
            self.y -= height;
        }
    }

    fn x_for(&self, text: &str, size: f32, role: TextRole, align: Align) -> f32 {
        let width = text_width_mm(text, size, role.font());
        match align {
            Align::Left => MARGIN_MM,
            Align::Center => (self.geometry.page_width - width) / 2.0,
            Align::Right => self.geometry.right_edge() - width,
        }
    }

    fn push_text(&mut self, x: f32, y: f32, size: f32, role: TextRole, text: &str) {
        if text.is_empty() {
            return;
        }
        self.current.push(Element::Text {
            x,
            y,
            size,
            role,
            text: text.to_string(),
        });
    }

    /// Place one line of already-safe text that fits the content width.
    fn line(&mut self, text: &str, size: f32, role: TextRole, align: Align) {
        let lh = line_height_mm(size);
        self.ensure(lh);
        self.y -= lh;
        let x = self.x_for(text, size, role, align);
        let y = self.y;
        self.push_text(x, y, size, role, text);
    }

    /// Wrap text to the content width and place every line.
    fn block(&mut self, text: &str, size: f32, role: TextRole, align: Align) {
        let width = self.geometry.content_width();
        for line in wrap_block(&pdf_safe(text), width, size, role.font()) {
            self.line(&line, size, role, align);
        }
    }

    fn rule(&mut self, x1: f32, x2: f32) {
        let y = self.y;
        self.current.push(Element::Rule { x1, y1: y, x2, y2: y });
    }

    fn image(&mut self, slot: ImageSlot, width: f32, height: f32) {
        self.ensure(height);
        self.y -= height;
        self.current.push(Element::Image {
            slot,
            x: (self.geometry.page_width - width) / 2.0,
            y: self.y,
            width,
            height,
        });
    }

    fn lines_fitting(&self, line_height: f32) -> usize {
        ((self.remaining() - 2.0 * CELL_PAD_MM) / line_height).floor().max(0.0) as usize
    }

    /// Two-column bordered row. Tall values continue on the next page.
    fn table_row(&mut self, label: &str, value: &str) {
        let lh = line_height_mm(BODY_SIZE);
        let value_width = self.geometry.content_width() - LABEL_COLUMN_MM;
        let mut value_lines = wrap_block(
            &pdf_safe(value),
            value_width - 2.0 * CELL_PAD_MM,
            BODY_SIZE,
            TextRole::CellValue.font(),
        );
        if value_lines.is_empty() {
            value_lines.push(String::new());
        }

        let full_height = value_lines.len() as f32 * lh + 2.0 * CELL_PAD_MM;
        if full_height <= self.geometry.span() {
            self.ensure(full_height);
        }

        let mut rest: &[String] = &value_lines;
        let mut label = label;
        while !rest.is_empty() {
            if self.lines_fitting(lh) == 0 && !self.current.is_empty() {
                self.break_page();
            }
            let take = self.lines_fitting(lh).max(1).min(rest.len());
            let (chunk, tail) = rest.split_at(take);
            self.cell_row(label, chunk, value_width);
            label = "";
            rest = tail;
        }
    }

    fn cell_row(&mut self, label: &str, lines: &[String], value_width: f32) {
        let lh = line_height_mm(BODY_SIZE);
        let height = lines.len() as f32 * lh + 2.0 * CELL_PAD_MM;
        let top = self.y;
        let bottom = top - height;
        let value_x = MARGIN_MM + LABEL_COLUMN_MM;

        self.current.push(Element::Cell {
            x: MARGIN_MM,
            y: bottom,
            width: LABEL_COLUMN_MM,
            height,
        });
        self.current.push(Element::Cell {
            x: value_x,
            y: bottom,
            width: value_width,
            height,
        });

        let first_baseline = top - CELL_PAD_MM - BODY_SIZE * MM_PER_PT;
        self.push_text(
            MARGIN_MM + CELL_PAD_MM,
            first_baseline,
            BODY_SIZE,
            TextRole::CellLabel,
            label,
        );
        for (i, line) in lines.iter().enumerate() {
            self.push_text(
                value_x + CELL_PAD_MM,
                first_baseline - i as f32 * lh,
                BODY_SIZE,
                TextRole::CellValue,
                line,
            );
        }
        self.y = bottom;
    }

    fn finish(mut self) -> Vec<Vec<Element>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Lay out a report document.
pub fn assemble(
    patient: &PatientInfo,
    sections: &ReportSections,
    branding: &ClinicBranding,
    options: &DocumentOptions,
    assets: &ReportAssets,
    generated_at: DateTime<Local>,
) -> ReportLayout {
    let (page_width, page_height) = options.page_size.dimensions_mm();
    let footer = Footer::new(branding, page_width - 2.0 * MARGIN_MM);
    let geometry = Geometry {
        page_width,
        page_height,
        content_top: page_height - MARGIN_MM,
        content_bottom: footer.top() + FOOTER_GAP_MM,
    };

    let mut cursor = PageCursor::new(geometry);
    header(&mut cursor, branding, assets, generated_at);

    cursor.space(SECTION_GAP_MM);
    cursor.block(options.variant.title(), REPORT_TITLE_SIZE, TextRole::ReportTitle, Align::Left);

    patient_table(&mut cursor, patient, options);
    findings(&mut cursor, sections);

    match options.variant {
        ReportVariant::Summary if options.include_signature_block => approval_block(&mut cursor),
        ReportVariant::Summary => {}
        ReportVariant::Detailed => {
            cursor.space(SECTION_GAP_MM);
            cursor.block(DETAILED_DISCLAIMER, NOTICE_SIZE, TextRole::Notice, Align::Left);
        }
    }

    let watermark = assets.watermark_aspect().map(|aspect| {
        let mut width = geometry.content_width() * 0.6;
        let mut height = width / aspect;
        if height > page_height * 0.5 {
            height = page_height * 0.5;
            width = height * aspect;
        }
        Element::Image {
            slot: ImageSlot::Watermark,
            x: (page_width - width) / 2.0,
            y: (page_height - height) / 2.0,
            width,
            height,
        }
    });

    let pages: Vec<PageLayout> = cursor
        .finish()
        .into_iter()
        .enumerate()
        .map(|(index, content)| {
            let mut elements = Vec::with_capacity(content.len() + 4);
            elements.extend(watermark.clone());
            elements.extend(content);
            elements.extend(footer.elements(index + 1, &geometry));
            PageLayout { elements }
        })
        .collect();

    tracing::debug!(pages = pages.len(), variant = %options.variant, "assembled report layout");

    ReportLayout {
        title: pdf_safe(options.variant.title()),
        page_width,
        page_height,
        pages,
    }
}

fn header(
    cursor: &mut PageCursor,
    branding: &ClinicBranding,
    assets: &ReportAssets,
    generated_at: DateTime<Local>,
) {
    if let Some(aspect) = assets.logo_aspect() {
        let mut height = LOGO_HEIGHT_MM;
        let mut width = height * aspect;
        if width > LOGO_MAX_WIDTH_MM {
            width = LOGO_MAX_WIDTH_MM;
            height = width / aspect;
        }
        cursor.image(ImageSlot::Logo, width, height);
        cursor.space(3.0);
    }

    cursor.block(branding.display_name(), TITLE_SIZE, TextRole::ClinicName, Align::Center);
    if let Some(contact) = branding.contact_line() {
        cursor.block(&contact, META_SIZE, TextRole::Contact, Align::Center);
    }
    if let Some(address) = branding.address_line() {
        cursor.block(address, META_SIZE, TextRole::Contact, Align::Center);
    }

    let stamp = format!(
        "Report Generated: {}",
        generated_at.format("%B %d, %Y %H:%M")
    );
    cursor.line(&stamp, TIMESTAMP_SIZE, TextRole::Timestamp, Align::Center);

    cursor.space(3.0);
    cursor.rule(MARGIN_MM, cursor.geometry.right_edge());
}

fn patient_table(cursor: &mut PageCursor, patient: &PatientInfo, options: &DocumentOptions) {
    cursor.space(SECTION_GAP_MM);
    cursor.ensure(line_height_mm(HEADING_SIZE) + line_height_mm(BODY_SIZE) + 2.0 * CELL_PAD_MM);
    cursor.line("Patient Information", HEADING_SIZE, TextRole::Heading, Align::Left);
    cursor.space(2.0);

    cursor.table_row("Name", &patient.display_name(options.anonymize));
    if options.show_patient_id && !options.anonymize {
        if let Some(id) = patient.display_patient_id() {
            cursor.table_row("Patient ID", &id);
        }
    }
    cursor.table_row("Age", &patient.display_age());
    cursor.table_row("Gender", &display_or_na(&patient.gender));
    cursor.table_row("Primary Complaint", &display_or_na(&patient.complaint));
    cursor.table_row("Medical History", &display_or_na(&patient.medical_history));
}

fn findings(cursor: &mut PageCursor, sections: &ReportSections) {
    for section in sections {
        cursor.space(SECTION_GAP_MM);
        // Keep a heading on the same page as its first line.
        cursor.ensure(line_height_mm(HEADING_SIZE) + line_height_mm(BODY_SIZE));
        cursor.block(&section.title, HEADING_SIZE, TextRole::Heading, Align::Left);

        for paragraph in paragraphs(&section.body) {
            cursor.block(paragraph, BODY_SIZE, TextRole::Body, Align::Left);
            cursor.space(PARAGRAPH_GAP_MM);
        }
    }
}

fn approval_block(cursor: &mut PageCursor) {
    let body_lh = line_height_mm(BODY_SIZE);
    let intro_lines = wrap_text(
        APPROVAL_INTRO,
        cursor.geometry.content_width(),
        BODY_SIZE,
        TextRole::Body.font(),
    );
    let height = SECTION_GAP_MM
        + line_height_mm(HEADING_SIZE)
        + (intro_lines.len() + APPROVAL_OPTIONS.len() + 1) as f32 * body_lh
        + NOTE_LINES as f32 * NOTE_LINE_SPACING_MM
        + SIGNATURE_SPACE_MM
        + line_height_mm(TIMESTAMP_SIZE);

    cursor.ensure(height);
    cursor.space(SECTION_GAP_MM);
    cursor.line("Approval", HEADING_SIZE, TextRole::Heading, Align::Left);
    for line in &intro_lines {
        cursor.line(line, BODY_SIZE, TextRole::Body, Align::Left);
    }
    for option in APPROVAL_OPTIONS {
        cursor.line(option, BODY_SIZE, TextRole::Body, Align::Left);
    }

    cursor.line("Notes:", BODY_SIZE, TextRole::Label, Align::Left);
    let right = cursor.geometry.right_edge();
    for _ in 0..NOTE_LINES {
        cursor.y -= NOTE_LINE_SPACING_MM;
        cursor.rule(MARGIN_MM, right);
    }

    cursor.y -= SIGNATURE_SPACE_MM;
    cursor.rule(MARGIN_MM, MARGIN_MM + SIGNATURE_RULE_MM);
    cursor.rule(right - DATE_RULE_MM, right);

    cursor.y -= line_height_mm(TIMESTAMP_SIZE);
    let y = cursor.y;
    cursor.push_text(MARGIN_MM, y, TIMESTAMP_SIZE, TextRole::Label, "Doctor's Signature");
    cursor.push_text(right - DATE_RULE_MM, y, TIMESTAMP_SIZE, TextRole::Label, "Date");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageSize;
    use crate::report::sections::parse_sections;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, hour, 30, 0).unwrap()
    }

    fn patient() -> PatientInfo {
        PatientInfo {
            name: "Jane Doe".into(),
            age: Some(34),
            gender: "Female".into(),
            complaint: "Tooth pain".into(),
            medical_history: "None".into(),
            patient_id: Some("P-2041".into()),
        }
    }

    fn layout(raw: &str, options: &DocumentOptions) -> ReportLayout {
        assemble(
            &patient(),
            &parse_sections(raw),
            &ClinicBranding::default(),
            options,
            &ReportAssets::default(),
            at(9),
        )
    }

    fn long_text() -> String {
        (0..120)
            .map(|i| format!("## Region {}\nObservation number {} about enamel wear.\n", i, i))
            .collect()
    }

    #[test]
    fn test_header_and_title() {
        let layout = layout("## Findings\nok", &DocumentOptions::default());
        let page = &layout.pages[0];
        assert_eq!(page.texts_with_role(TextRole::ClinicName), vec!["Dental Clinic"]);
        assert_eq!(
            page.texts_with_role(TextRole::Timestamp),
            vec!["Report Generated: March 05, 2024 09:30"]
        );
        assert!(page.text().contains("Dental AI Analysis - Summary Report"));
    }

    #[test]
    fn test_no_signature_block() {
        let options = DocumentOptions {
            include_signature_block: false,
            ..Default::default()
        };
        let text = layout("## Findings\nok", &options).pages[0].text();
        assert!(!text.contains("Doctor's Signature"));
        assert!(!text.contains("Approve the findings"));
    }

    #[test]
    fn test_signature_block() {
        let text = layout("## Findings\nok", &DocumentOptions::default()).pages[0].text();
        assert!(text.contains("I confirm that I have reviewed this AI-generated report and:"));
        assert!(text.contains("[ ] Approve with modifications noted below"));
        assert!(text.contains("Notes:"));
        assert!(text.contains("Doctor's Signature Date"));
    }

    #[test]
    fn test_disclaimer_on_every_page() {
        for variant in [ReportVariant::Summary, ReportVariant::Detailed] {
            let layout = layout(&long_text(), &DocumentOptions::for_variant(variant));
            assert!(layout.page_count() > 1);
            for (i, page) in layout.pages.iter().enumerate() {
                let text = page.text();
                assert!(text.contains(REGULATORY_DISCLAIMER), "page {}", i + 1);
                assert!(text.ends_with(&format!("Page {}", i + 1)));
            }
        }
    }

    #[test]
    fn test_content_stays_above_footer() {
        let layout = layout(&long_text(), &DocumentOptions::default());
        let footer_top = Footer::new(&ClinicBranding::default(), 175.9).top();
        for page in &layout.pages {
            for element in &page.elements {
                if let Element::Text { y, role, .. } = element {
                    if !matches!(role, TextRole::Disclaimer | TextRole::PageNumber | TextRole::ClinicFooter) {
                        assert!(*y > footer_top);
                    }
                }
            }
        }
    }

    #[test]
    fn test_detailed_notice() {
        let detailed = layout("text", &DocumentOptions::for_variant(ReportVariant::Detailed));
        let text = detailed.pages.last().unwrap().text();
        assert!(text.contains(DETAILED_DISCLAIMER));
        assert!(!text.contains("Doctor's Signature"));

        let summary = layout("text", &DocumentOptions::default());
        assert!(!summary.pages[0].text().contains("DISCLAIMER: This detailed"));
    }

    #[test]
    fn test_fingerprint_ignores_timestamp() {
        let sections = parse_sections("## Findings\nok");
        let build = |hour| {
            assemble(
                &patient(),
                &sections,
                &ClinicBranding::default(),
                &DocumentOptions::default(),
                &ReportAssets::default(),
                at(hour),
            )
        };
        assert_ne!(build(9), build(10));
        assert_eq!(build(9).fingerprint(), build(10).fingerprint());
        assert_eq!(build(9), build(9));
    }

    #[test]
    fn test_missing_values_render_na() {
        let patient = PatientInfo::new("Sam Lee");
        let layout = assemble(
            &patient,
            &parse_sections("x"),
            &ClinicBranding::default(),
            &DocumentOptions::default(),
            &ReportAssets::default(),
            at(9),
        );
        let values = layout.pages[0].texts_with_role(TextRole::CellValue);
        assert_eq!(values, vec!["Sam Lee", "N/A", "N/A", "N/A", "N/A"]);
    }

    #[test]
    fn test_empty_section_keeps_heading() {
        let layout = layout("## Empty\n\n   \n## Next\nBody", &DocumentOptions::default());
        let headings = layout.pages[0].texts_with_role(TextRole::Heading);
        assert!(headings.contains(&"Empty"));
        assert!(headings.contains(&"Next"));
    }

    #[test]
    fn test_patient_id_row() {
        let mut options = DocumentOptions::default();
        assert!(!layout("x", &options).pages[0].text().contains("P-2041"));

        options.show_patient_id = true;
        let text = layout("x", &options).pages[0].text();
        assert!(text.contains("Patient ID P-2041"));

        options.anonymize = true;
        let text = layout("x", &options).pages[0].text();
        assert!(!text.contains("P-2041"));
        assert!(!text.contains("Jane Doe"));
        assert!(text.contains("Name Anonymous"));
    }

    #[test]
    fn test_clinic_footer_is_extra_line() {
        let branding = ClinicBranding {
            footer_disclaimer: Some("Smile Co, licensed practice".into()),
            ..Default::default()
        };
        let layout = assemble(
            &patient(),
            &parse_sections("x"),
            &branding,
            &DocumentOptions::default(),
            &ReportAssets::default(),
            at(9),
        );
        let text = layout.pages[0].text();
        assert!(text.contains("Smile Co, licensed practice"));
        assert!(text.contains(REGULATORY_DISCLAIMER));
    }

    #[test]
    fn test_long_cell_value_wraps() {
        let mut patient = patient();
        patient.medical_history = "penicillin allergy ".repeat(20);
        let layout = assemble(
            &patient,
            &parse_sections("x"),
            &ClinicBranding::default(),
            &DocumentOptions::default(),
            &ReportAssets::default(),
            at(9),
        );
        let values = layout.pages[0].texts_with_role(TextRole::CellValue);
        assert!(values.len() > 5);
    }

    #[test]
    fn test_long_header_and_heading_stay_inside_margins() {
        let branding = ClinicBranding {
            clinic_name: "Riverside Family and Cosmetic Dentistry Group of Greater Springfield".into(),
            address: Some("Suite 400, 1200 Northwest Lakeshore Boulevard, Springfield Heights Medical Campus, Building C".into()),
            ..Default::default()
        };
        let raw = "## Detailed Analysis of the Upper Right Quadrant Including Molars and Premolars Region\n\
                   PERIAPICAL RADIOLUCENCY NOTED AT THE APEX OF THE LOWER LEFT FIRST MOLAR WITH WIDENED PDL SPACE";

        for page_size in [PageSize::Letter, PageSize::A4] {
            let options = DocumentOptions {
                page_size,
                ..Default::default()
            };
            let layout = assemble(
                &patient(),
                &parse_sections(raw),
                &branding,
                &options,
                &ReportAssets::default(),
                at(9),
            );
            let right_edge = layout.page_width - MARGIN_MM;

            let page = &layout.pages[0];
            assert!(page.texts_with_role(TextRole::ClinicName).len() > 1);
            assert!(page.texts_with_role(TextRole::Heading).len() > 2);

            for element in &page.elements {
                if let Element::Text { x, size, role, text, .. } = element {
                    let right = x + text_width_mm(text, *size, role.font());
                    assert!(*x >= MARGIN_MM - 0.01, "{:?} starts at {}", role, x);
                    assert!(right <= right_edge + 0.01, "{:?} ends at {}", role, right);
                }
            }
        }
    }

    #[test]
    fn test_disclaimer_is_one_text_run() {
        for page_size in [PageSize::Letter, PageSize::A4] {
            let options = DocumentOptions {
                page_size,
                ..Default::default()
            };
            let layout = layout("text", &options);
            for page in &layout.pages {
                assert_eq!(page.texts_with_role(TextRole::Disclaimer), vec![REGULATORY_DISCLAIMER]);
                let size = page.elements.iter().find_map(|e| match e {
                    Element::Text { role: TextRole::Disclaimer, size, .. } => Some(*size),
                    _ => None,
                });
                assert!(size.unwrap() >= MIN_DISCLAIMER_SIZE);
            }
        }
    }
}
