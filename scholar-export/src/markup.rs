//! HTML rendering of reports
//!
//! [`render`] is the single markup function for a report. The interactive
//! view embeds its output directly and [`PrintSnapshot`] wraps the same
//! output in a standalone document for printing, so the printed page always
//! matches what the user saw.

use crate::host::PrintHost;
use crate::host_failure;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use scholar_core::{ResearchReport, ScholarResult, SectionView, WebResult};
use tracing::info;

const PRINT_STYLESHEET: &str = "\
body { font-family: Helvetica, Arial, sans-serif; margin: 20mm; color: #000; }
h1 { font-size: 18pt; margin-bottom: 8mm; }
h2 { font-size: 14pt; margin: 6mm 0 2mm; }
p { font-size: 11pt; line-height: 1.4; margin: 0 0 2mm; }
ol.web-research li { margin-bottom: 3mm; }
a { color: #0000cc; word-break: break-all; }
@page { size: A4; margin: 0; }
";

fn web_result(record: &WebResult) -> Markup {
    html! {
        li {
            strong.title { (record.title) }
            br;
            @if record.link.starts_with("http://") || record.link.starts_with("https://") {
                a href=(record.link) target="_blank" rel="noopener noreferrer" { (record.link) }
            } @else {
                span.link { (record.link) }
            }
            p.snippet { (record.snippet) }
        }
    }
}

/// Markup for the task and every non-empty section
pub fn render(report: &ResearchReport) -> Markup {
    html! {
        article.report {
            h1.task { (report.task()) }
            @for (kind, view) in report.sections() {
                section.report-section data-section=(kind.title()) {
                    h2 { (kind.title()) }
                    @match view {
                        SectionView::Text(paragraphs) => {
                            @for paragraph in paragraphs {
                                p { (paragraph) }
                            }
                        }
                        SectionView::Web(records) => {
                            ol.web-research {
                                @for record in records {
                                    (web_result(record))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Frozen, standalone print document for one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintSnapshot {
    title: String,
    document: String,
}

impl PrintSnapshot {
    pub fn capture(report: &ResearchReport) -> Self {
        let document = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (report.task()) }
                    style { (PreEscaped(PRINT_STYLESHEET)) }
                }
                body {
                    (render(report))
                }
            }
        };

        Self {
            title: report.task().to_string(),
            document: document.into_string(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub async fn print(&self, host: &dyn PrintHost) -> ScholarResult<()> {
        if let Err(source) = host.print(&self.title, &self.document).await {
            return Err(host_failure("Failed to print report", "print", source));
        }
        info!(title = %self.title, "Report sent to printer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_core::SectionKind;

    fn report() -> ResearchReport {
        ResearchReport::new("Tides & <moons>")
            .unwrap()
            .with_text(SectionKind::Summary, ["Gravity <b>pulls</b>."])
            .with_web_research(vec![
                WebResult::new("NOAA", "https://tides.example", "Tide tables"),
                WebResult::new("Offline", "No Link", "No Description Available"),
            ])
    }

    #[test]
    fn renders_only_non_empty_sections() {
        let html = render(&report()).into_string();

        assert!(html.contains(r#"data-section="Summary""#));
        assert!(html.contains(r#"data-section="Web Research""#));
        assert!(!html.contains("Conclusion"));
        assert!(html.find("Summary").unwrap() < html.find("Web Research").unwrap());
    }

    #[test]
    fn escapes_report_text() {
        let html = render(&report()).into_string();
        assert!(html.contains("Tides &amp; &lt;moons&gt;"));
        assert!(html.contains("Gravity &lt;b&gt;pulls&lt;/b&gt;."));
    }

    #[test]
    fn only_real_links_become_anchors() {
        let html = render(&report()).into_string();
        assert!(html.contains(r#"href="https://tides.example""#));
        assert!(html.contains(r#"<span class="link">No Link</span>"#));
    }

    #[test]
    fn snapshot_embeds_view_markup() {
        let report = report();
        let snapshot = PrintSnapshot::capture(&report);

        assert!(snapshot.document().starts_with("<!DOCTYPE html>"));
        assert!(snapshot.document().contains(&render(&report).into_string()));
        assert_eq!(snapshot.title(), "Tides & <moons>");
    }
}
