//! Strategy report and slide-deck synthesis.
//!
//! Purely computational: both generators take the session identity and the
//! extracted recommendation sets and return document content. The
//! orchestrator owns writing the results to the session directory.
//!
//! Both documents have a deterministic skeleton — fixed sections and slides —
//! with only the recommendation lists and session id varying.

use std::collections::BTreeSet;

/// Narrative document title.
pub const STRATEGY_TITLE: &str = "IT Infrastructure Upgrade Strategy";

/// Slide deck title.
pub const DECK_TITLE: &str = "IT Upgrade Executive Report";

/// Fallback body for an empty hardware upgrade plan.
const NO_HARDWARE_UPGRADES: &str = "No hardware upgrades required.";

/// Fallback body for an empty software upgrade plan.
const NO_SOFTWARE_UPGRADES: &str = "No software upgrades required.";

/// Fixed constraint bullets on the closing slide.
pub const CONSTRAINT_BULLETS: [&str; 3] = [
    "Cost Optimization",
    "Geographic Accessibility",
    "Future-readiness",
];

// ---------------------------------------------------------------------------
// Narrative strategy document
// ---------------------------------------------------------------------------

/// Generate the five-section narrative strategy document.
///
/// An empty recommendation set still renders its section header; only the
/// section body falls back to the "no upgrades required" sentence.
pub fn generate_strategy_document(
    session_id: &str,
    hardware: &BTreeSet<String>,
    software: &BTreeSet<String>,
) -> String {
    let mut doc = String::new();

    doc.push_str(&format!("# {STRATEGY_TITLE}\n\n"));
    doc.push_str(&format!("Session ID: {session_id}\n\n"));

    doc.push_str("## 1. Introduction\n\n");
    doc.push_str("This document outlines the proposed target infrastructure state.\n\n");

    doc.push_str("## 2. Hardware Upgrade Plan\n\n");
    doc.push_str(&upgrade_plan_body(hardware, NO_HARDWARE_UPGRADES));

    doc.push_str("## 3. Software Upgrade Plan\n\n");
    doc.push_str(&upgrade_plan_body(software, NO_SOFTWARE_UPGRADES));

    doc.push_str("## 4. Considerations\n\n");
    doc.push_str("Cost, geographic location, and performance constraints were considered.\n\n");

    doc.push_str("## 5. Summary\n\n");
    doc.push_str(
        "The proposed architecture ensures scalability, security, and future-readiness.\n",
    );

    doc
}

/// Render an upgrade plan section body: one list item per recommendation,
/// or the fallback sentence when the set is empty.
fn upgrade_plan_body(recommendations: &BTreeSet<String>, fallback: &str) -> String {
    if recommendations.is_empty() {
        return format!("{fallback}\n\n");
    }

    let mut body = String::new();
    for rec in recommendations {
        body.push_str(&format!("- {rec}\n"));
    }
    body.push('\n');
    body
}

// ---------------------------------------------------------------------------
// Executive slide deck
// ---------------------------------------------------------------------------

/// A single content slide: a title and one body paragraph per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub title: String,
    pub body: Vec<String>,
}

/// The executive summary deck: a title slide followed by content slides.
#[derive(Debug, Clone)]
pub struct SlideDeck {
    pub title: String,
    pub subtitle: String,
    pub slides: Vec<Slide>,
}

impl SlideDeck {
    /// Render the deck as a Markdown document, one `##` heading per slide.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n{}\n\n", self.title, self.subtitle));

        for slide in &self.slides {
            out.push_str(&format!("## {}\n\n", slide.title));
            for paragraph in &slide.body {
                out.push_str(&format!("{paragraph}\n"));
            }
            out.push('\n');
        }

        out
    }
}

/// Build the executive deck: title slide, one slide per gap category, and a
/// closing slide with the fixed constraint bullets.
pub fn build_slide_deck(
    session_id: &str,
    hardware: &BTreeSet<String>,
    software: &BTreeSet<String>,
) -> SlideDeck {
    SlideDeck {
        title: DECK_TITLE.into(),
        subtitle: format!("Session: {session_id}"),
        slides: vec![
            Slide {
                title: "Hardware Upgrades".into(),
                body: hardware.iter().cloned().collect(),
            },
            Slide {
                title: "Software Upgrades".into(),
                body: software.iter().cloned().collect(),
            },
            Slide {
                title: "Constraints Considered".into(),
                body: CONSTRAINT_BULLETS.iter().map(|s| s.to_string()).collect(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recs(entries: &[&str]) -> BTreeSet<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn document_has_all_five_sections() {
        let doc = generate_strategy_document(
            "sess-1",
            &recs(&["SrvA → SrvA-v2"]),
            &recs(&["ERP-2019 → ERP-Cloud"]),
        );

        assert!(doc.contains("# IT Infrastructure Upgrade Strategy"));
        assert!(doc.contains("Session ID: sess-1"));
        assert!(doc.contains("## 1. Introduction"));
        assert!(doc.contains("## 2. Hardware Upgrade Plan"));
        assert!(doc.contains("- SrvA → SrvA-v2"));
        assert!(doc.contains("## 3. Software Upgrade Plan"));
        assert!(doc.contains("- ERP-2019 → ERP-Cloud"));
        assert!(doc.contains("## 4. Considerations"));
        assert!(doc.contains("Cost, geographic location, and performance constraints"));
        assert!(doc.contains("## 5. Summary"));
        assert!(doc.contains("scalability, security, and future-readiness"));
    }

    #[test]
    fn empty_sets_keep_section_headers_with_fallback() {
        let doc = generate_strategy_document("sess-1", &BTreeSet::new(), &BTreeSet::new());

        // The header must render even when the list is empty; only the body
        // falls back to the fixed sentence.
        assert!(doc.contains("## 2. Hardware Upgrade Plan"));
        assert!(doc.contains("No hardware upgrades required."));
        assert!(doc.contains("## 3. Software Upgrade Plan"));
        assert!(doc.contains("No software upgrades required."));
    }

    #[test]
    fn fallback_absent_when_recommendations_exist() {
        let doc =
            generate_strategy_document("sess-1", &recs(&["SrvA → SrvA-v2"]), &BTreeSet::new());
        assert!(!doc.contains("No hardware upgrades required."));
        assert!(doc.contains("No software upgrades required."));
    }

    #[test]
    fn deck_has_one_paragraph_per_recommendation() {
        let hw = recs(&["SrvA → SrvA-v2", "SrvB → SrvB-v3"]);
        let sw = recs(&["ERP-2019 → ERP-Cloud"]);
        let deck = build_slide_deck("sess-1", &hw, &sw);

        assert_eq!(deck.subtitle, "Session: sess-1");
        assert_eq!(deck.slides.len(), 3);

        let hardware_slide = &deck.slides[0];
        assert_eq!(hardware_slide.title, "Hardware Upgrades");
        assert_eq!(hardware_slide.body.len(), 2);

        let software_slide = &deck.slides[1];
        assert_eq!(software_slide.body.len(), 1);
        assert_eq!(software_slide.body[0], "ERP-2019 → ERP-Cloud");
    }

    #[test]
    fn closing_slide_carries_fixed_constraints() {
        let deck = build_slide_deck("sess-1", &BTreeSet::new(), &BTreeSet::new());
        let closing = deck.slides.last().expect("closing slide");
        assert_eq!(closing.title, "Constraints Considered");
        assert_eq!(
            closing.body,
            vec![
                "Cost Optimization".to_string(),
                "Geographic Accessibility".to_string(),
                "Future-readiness".to_string(),
            ]
        );
    }

    #[test]
    fn deck_renders_every_slide_heading() {
        let deck = build_slide_deck("sess-1", &recs(&["SrvA → SrvA-v2"]), &BTreeSet::new());
        let rendered = deck.render();

        assert!(rendered.starts_with("# IT Upgrade Executive Report"));
        assert!(rendered.contains("Session: sess-1"));
        assert!(rendered.contains("## Hardware Upgrades"));
        assert!(rendered.contains("SrvA → SrvA-v2"));
        assert!(rendered.contains("## Software Upgrades"));
        assert!(rendered.contains("## Constraints Considered"));
    }
}
