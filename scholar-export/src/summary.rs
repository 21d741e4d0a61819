//! Plain-text summary for the clipboard

use crate::host::Clipboard;
use crate::host_failure;
use scholar_core::{ResearchReport, ScholarResult, SectionKind};
use tracing::{debug, info};

/// Sections included in the clipboard summary, in order
pub const SUMMARY_SECTIONS: [SectionKind; 4] = [
    SectionKind::Summary,
    SectionKind::GeneratedHypotheses,
    SectionKind::Analysis,
    SectionKind::Conclusion,
];

/// Condense a report into plain text.
///
/// Starts with `Task: <task>` followed by the summary sections that have
/// content, each under a `<Section>:` heading. Web research, reasoning and
/// evaluation are left out.
pub fn summarize(report: &ResearchReport) -> String {
    let mut parts = vec![format!("Task: {}", report.task())];

    for kind in SUMMARY_SECTIONS {
        let paragraphs = report.text(kind);
        if paragraphs.is_empty() {
            continue;
        }
        parts.push(format!("{}:\n{}", kind.title(), paragraphs.join("\n")));
    }

    parts.join("\n\n").trim().to_string()
}

/// Put the summary of `report` on the clipboard
pub async fn copy_to_clipboard(report: &ResearchReport, clipboard: &dyn Clipboard) -> ScholarResult<()> {
    let text = summarize(report);
    debug!(chars = text.len(), "Copying summary");

    if let Err(source) = clipboard.write_text(&text).await {
        return Err(host_failure(
            "Failed to copy summary to clipboard",
            "copy_to_clipboard",
            source,
        ));
    }

    info!(task = report.task(), "Summary copied to clipboard");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_core::WebResult;

    fn full_report() -> ResearchReport {
        ResearchReport::new("Battery chemistry")
            .unwrap()
            .with_text(SectionKind::Summary, ["Solid state looks promising.", "Costs fall."])
            .with_text(SectionKind::GeneratedHypotheses, ["Sodium wins grid storage."])
            .with_web_research(vec![WebResult::new("Paper", "https://p.example", "snippet")])
            .with_text(SectionKind::Analysis, ["Supply chains matter."])
            .with_text(SectionKind::Reasoning, ["Because of cost curves."])
            .with_text(SectionKind::Evaluation, ["Moderate confidence."])
            .with_text(SectionKind::Conclusion, ["Watch sodium-ion."])
    }

    #[test]
    fn summary_layout() {
        let expected = "Task: Battery chemistry\n\n\
                        Summary:\nSolid state looks promising.\nCosts fall.\n\n\
                        Generated Hypotheses:\nSodium wins grid storage.\n\n\
                        Analysis:\nSupply chains matter.\n\n\
                        Conclusion:\nWatch sodium-ion.";
        assert_eq!(summarize(&full_report()), expected);
    }

    #[test]
    fn excluded_sections_never_appear() {
        let text = summarize(&full_report());
        for needle in ["Web Research", "https://p.example", "Reasoning", "cost curves", "Evaluation", "Moderate"] {
            assert!(!text.contains(needle), "summary leaked {needle:?}");
        }
    }

    #[test]
    fn task_only_report() {
        let report = ResearchReport::new("Lonely").unwrap();
        assert_eq!(summarize(&report), "Task: Lonely");
    }
}
