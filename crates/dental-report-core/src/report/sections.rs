//! Section parser for model answers.
//!
//! A line whose first non-whitespace character is `#` starts a new section.
//! Everything else is body text, kept verbatim.

use serde::{Deserialize, Serialize};

/// Title used for text that appears before any heading.
pub const DEFAULT_SECTION: &str = "Findings";

/// One titled block of report text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSection {
    pub title: String,
    pub body: String,
}

/// Sections in the order they were found in the source text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSections {
    entries: Vec<ReportSection>,
}

impl ReportSections {
    /// Insert a section. A repeated title replaces the body in place.
    fn insert(&mut self, title: String, body: String) {
        match self.entries.iter_mut().find(|s| s.title == title) {
            Some(existing) => existing.body = body,
            None => self.entries.push(ReportSection { title, body }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Body of the section with this title.
    pub fn get(&self, title: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.body.as_str())
    }

    /// Titles in insertion order.
    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|s| s.title.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportSection> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<ReportSection> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a ReportSections {
    type Item = &'a ReportSection;
    type IntoIter = std::slice::Iter<'a, ReportSection>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Heading text if `line` is a heading.
fn heading_title(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        Some(trimmed.trim_start_matches('#').trim())
    } else {
        None
    }
}

/// Split a model answer into ordered sections.
///
/// Never fails: input without headings becomes a single `Findings` section
/// holding the input unchanged.
pub fn parse_sections(raw: &str) -> ReportSections {
    let mut sections = ReportSections::default();
    let mut current_title = DEFAULT_SECTION.to_string();
    let mut current_lines: Vec<&str> = Vec::new();

    for line in raw.split('\n') {
        match heading_title(line) {
            Some(title) => {
                if !current_lines.is_empty() {
                    sections.insert(current_title, current_lines.join("\n"));
                    current_lines.clear();
                }
                current_title = title.to_string();
            }
            None => current_lines.push(line),
        }
    }

    if !current_lines.is_empty() {
        sections.insert(current_title, current_lines.join("\n"));
    }

    if sections.is_empty() {
        sections.insert(DEFAULT_SECTION.to_string(), raw.to_string());
    }

    tracing::debug!(sections = sections.len(), "parsed report sections");
    sections
}

/// Non-blank paragraphs of a section body, trimmed.
pub fn paragraphs(body: &str) -> impl Iterator<Item = &str> {
    body.split("\n\n").map(str::trim).filter(|p| !p.is_empty())
}
