//! Section parser tests.
//!
//! Golden cases for typical model answers plus properties over arbitrary text.

use dental_report_core::report::{parse_sections, DEFAULT_SECTION};
use proptest::prelude::*;

struct GoldenCase {
    id: &'static str,
    input: &'static str,
    expected: &'static [(&'static str, &'static str)],
}

const GOLDEN_CASES: &[GoldenCase] = &[
    GoldenCase {
        id: "two_sections",
        input: "## Findings\nPossible cavity in lower left molar.\n\n## Recommendation\nFollow-up X-ray advised.",
        expected: &[
            ("Findings", "Possible cavity in lower left molar.\n"),
            ("Recommendation", "Follow-up X-ray advised."),
        ],
    },
    GoldenCase {
        id: "preamble_goes_to_findings",
        input: "Overall healthy.\n### Caries Risk\nLow",
        expected: &[("Findings", "Overall healthy."), ("Caries Risk", "Low")],
    },
    GoldenCase {
        id: "indented_heading",
        input: "   #  Periodontal Status  \nMild recession.",
        expected: &[("Periodontal Status", "Mild recession.")],
    },
    GoldenCase {
        id: "non_alphabetical_order_kept",
        input: "# Zeta\nz\n# Alpha\na",
        expected: &[("Zeta", "z"), ("Alpha", "a")],
    },
    GoldenCase {
        id: "blank_lines_kept_as_paragraph_breaks",
        input: "## Notes\nfirst\n\nsecond",
        expected: &[("Notes", "first\n\nsecond")],
    },
    GoldenCase {
        id: "repeated_title_keeps_last_body",
        input: "## A\none\n## B\ntwo\n## A\nthree",
        expected: &[("A", "three"), ("B", "two")],
    },
    GoldenCase {
        id: "heading_only",
        input: "## Lonely",
        expected: &[("Findings", "## Lonely")],
    },
    GoldenCase {
        id: "empty",
        input: "",
        expected: &[("Findings", "")],
    },
];

#[test]
fn test_golden_cases() {
    for case in GOLDEN_CASES {
        let sections = parse_sections(case.input);
        let actual: Vec<(&str, &str)> = sections
            .iter()
            .map(|s| (s.title.as_str(), s.body.as_str()))
            .collect();
        assert_eq!(actual, case.expected, "case {}", case.id);
    }
}

#[test]
fn test_parser_is_total_on_odd_input() {
    for input in ["#", "\n\n\n", "###\n", "# \n#\n", "\r\n## A\r\nbody\r\n"] {
        let sections = parse_sections(input);
        assert!(!sections.is_empty(), "input {:?}", input);
    }
}

proptest! {
    #[test]
    fn prop_text_without_headings_is_findings(input in "[a-zA-Z0-9 .,:\n]{0,200}") {
        let sections = parse_sections(&input);
        prop_assert_eq!(sections.len(), 1);
        prop_assert_eq!(sections.get(DEFAULT_SECTION), Some(input.as_str()));
    }

    #[test]
    fn prop_headings_split_in_order(
        bodies in prop::collection::vec(
            prop::collection::vec("[a-z0-9 .,]{1,30}", 1..4),
            1..8,
        )
    ) {
        let titles: Vec<String> = (0..bodies.len()).map(|i| format!("Section {}", i)).collect();
        let raw = titles
            .iter()
            .zip(&bodies)
            .map(|(title, lines)| format!("## {}\n{}", title, lines.join("\n")))
            .collect::<Vec<_>>()
            .join("\n");

        let sections = parse_sections(&raw);
        prop_assert_eq!(sections.titles(), titles.iter().map(String::as_str).collect::<Vec<_>>());
        for (title, lines) in titles.iter().zip(&bodies) {
            let expected = lines.join("\n");
            prop_assert_eq!(sections.get(title), Some(expected.as_str()));
        }
    }
}
