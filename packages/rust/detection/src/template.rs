//! Document-type hint from known template section titles.

use docstruct_shared::{DetectionPayload, DetectionResult};

/// A template family and the top-level section titles it ships with.
#[derive(Debug, Clone, Copy)]
pub struct TemplateProfile {
    pub document_type: &'static str,
    pub section_titles: &'static [&'static str],
}

pub const TEMPLATE_PROFILES: [TemplateProfile; 3] = [
    TemplateProfile {
        document_type: "business_plan",
        section_titles: &[
            "Executive Summary",
            "Project Description",
            "Company & Management",
            "Industry, market, and competition",
            "Marketing & Sales",
            "Financial Planning",
        ],
    },
    TemplateProfile {
        document_type: "strategy",
        section_titles: &[
            "Executive Summary",
            "Market Opportunity",
            "Project Description / Business Concept",
            "Business Model & Value Proposition",
            "Competitive Landscape",
            "Preliminary Financial Overview",
        ],
    },
    TemplateProfile {
        document_type: "upgrade",
        section_titles: &[
            "Executive Summary",
            "Project Description",
            "Innovation & Technology",
            "Impact Assessment",
            "Financial Plan",
            "Market Analysis",
            "Team & Qualifications",
            "Risk Assessment",
            "Timeline & Milestones",
        ],
    },
];

/// Score `text` against each profile and report the best fit.
///
/// Fires when more than a quarter of a profile's titles appear (and at least
/// two of them). Ties keep the earlier profile.
pub fn detect_template_hint(text: &str) -> DetectionResult {
    let lower = text.to_lowercase();

    let mut best: Option<(&TemplateProfile, f64, usize)> = None;
    for profile in &TEMPLATE_PROFILES {
        let matches = profile
            .section_titles
            .iter()
            .filter(|title| lower.contains(&title.to_lowercase()))
            .count();
        let score = matches as f64 / profile.section_titles.len() as f64;

        if best.is_none_or(|(_, best_score, _)| score > best_score) {
            best = Some((profile, score, matches));
        }
    }

    match best {
        Some((profile, score, matches)) if score > 0.25 && matches >= 2 => DetectionResult::found(
            (score + 0.3).min(0.85),
            DetectionPayload::DocumentTypeHint {
                document_type: profile.document_type.to_string(),
                match_score: (score * 100.0).round() as u32,
            },
        ),
        _ => DetectionResult::not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_template_recognized() {
        let text = "Innovation & Technology\n...\nImpact Assessment\n...\nTimeline & Milestones\n...";
        let result = detect_template_hint(text);
        assert!(result.found);
        match result.content {
            Some(DetectionPayload::DocumentTypeHint {
                document_type,
                match_score,
            }) => {
                assert_eq!(document_type, "upgrade");
                assert_eq!(match_score, 33);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
        assert!((result.confidence - (3.0 / 9.0 + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_capped() {
        let text = TEMPLATE_PROFILES[0].section_titles.join("\n");
        let result = detect_template_hint(&text);
        assert_eq!(result.confidence, 0.85);
    }

    #[test]
    fn single_title_is_not_enough() {
        let result = detect_template_hint("Executive Summary\nWe sell bread.");
        assert!(!result.found);
    }
}
