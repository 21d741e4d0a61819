//! Pagination, export and host hand-off tests

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use scholar_core::{
    LayoutConfig, OverflowPolicy, ResearchReport, ScholarConfig, ScholarError, ScholarResult,
    SectionKind, WebResult,
};
use scholar_export::{
    copy_to_clipboard, Block, Clipboard, DirectorySink, DocumentExporter, ExportFormat, FileSink,
    HostError, Page, PrintHost, PrintSnapshot,
};
use scholar_session::{ResearchService, ResearchSession};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One wrapped line per word
fn narrow(overflow: OverflowPolicy) -> DocumentExporter {
    DocumentExporter::new(
        LayoutConfig {
            wrap_columns: 5,
            overflow,
            ..Default::default()
        },
        Default::default(),
    )
}

fn words(n: usize) -> String {
    vec!["lorem"; n].join(" ")
}

fn report_with(kind: SectionKind, paragraphs: Vec<String>) -> ResearchReport {
    ResearchReport::new("Layout").unwrap().with_text(kind, paragraphs)
}

fn sources(n: usize) -> ResearchReport {
    let records = (0..n)
        .map(|i| WebResult::new(format!("Source {i}"), "https://example.org", "short"))
        .collect();
    ResearchReport::new("Layout").unwrap().with_web_research(records)
}

fn blocks(pages: &[Page]) -> impl Iterator<Item = &Block> {
    pages.iter().flat_map(|page| page.blocks.iter())
}

#[test]
fn report_under_one_page_stays_on_one_page() {
    let exporter = DocumentExporter::default();
    let report = ResearchReport::new("Short")
        .unwrap()
        .with_text(SectionKind::Summary, ["One.", "Two.", "Three."])
        .with_text(SectionKind::Conclusion, ["Done."]);

    let pages = exporter.layout(&report);

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].count_headers(), 2);
    assert_eq!(pages[0].count_paragraphs(), 4);
    assert!(pages[0].footer.is_none());
}

#[test]
fn long_section_breaks_only_between_paragraphs() {
    let exporter = narrow(OverflowPolicy::ParagraphBoundary);
    let report = report_with(SectionKind::Analysis, vec!["lorem".to_string(); 40]);

    let pages = exporter.layout(&report);

    assert_eq!(pages.len(), 2);
    // header at 20, paragraphs every 7 from 30: the 35th ends at 275
    assert_eq!(pages[0].count_paragraphs(), 35);
    assert_eq!(pages[1].count_paragraphs(), 5);
    let last_on_first = pages[0].blocks.last().unwrap().placement();
    assert!(last_on_first.bottom() > 270.0);
    assert_eq!(pages[1].blocks[0].placement().y, 20.0);
}

#[test]
fn paragraph_taller_than_a_page_runs_past_the_bottom() {
    let exporter = narrow(OverflowPolicy::ParagraphBoundary);
    let report = report_with(SectionKind::Summary, vec![words(50), "tail".to_string()]);

    let pages = exporter.layout(&report);

    assert_eq!(pages.len(), 2);
    let giant = &pages[0].blocks[1];
    assert_eq!(giant.lines().len(), 50);
    assert_eq!(giant.placement().bottom(), 380.0);
    assert_eq!(pages[1].blocks[0].lines(), vec!["tail"]);
}

#[test]
fn web_records_are_not_checked_for_overflow_by_default() {
    let exporter = DocumentExporter::default();

    let pages = exporter.layout(&sources(20));

    assert_eq!(pages.len(), 1);
    assert!(pages[0].blocks.last().unwrap().placement().bottom() > 270.0);
}

#[test]
fn line_boundary_keeps_every_block_inside_capacity() {
    let exporter = narrow(OverflowPolicy::LineBoundary);
    let report = report_with(SectionKind::Summary, vec![words(50), words(30)])
        .with_web_research(
            (0..15)
                .map(|i| WebResult::new(format!("S{i}"), "x", "y"))
                .collect(),
        );

    let pages = exporter.layout(&report);

    assert!(pages.len() >= 3);
    for block in blocks(&pages) {
        assert!(block.placement().bottom() <= 270.0, "{block:?} crosses capacity");
    }
    let lines: usize = blocks(&pages)
        .filter(|b| b.is_paragraph())
        .map(|b| b.lines().len())
        .sum();
    assert_eq!(lines, 80);
    let records = blocks(&pages)
        .filter(|b| matches!(b, Block::Source { .. }))
        .count();
    assert_eq!(records, 15);
}

#[test]
fn pages_are_numbered_in_order() {
    let exporter = narrow(OverflowPolicy::LineBoundary);
    let pages = exporter.layout(&report_with(SectionKind::Summary, vec![words(200)]));

    let numbers: Vec<_> = pages.iter().map(|p| p.number).collect();
    let expected: Vec<_> = (1..=pages.len()).collect();
    assert_eq!(numbers, expected);
}

#[test]
fn every_exported_page_has_its_footer() {
    let exporter = narrow(OverflowPolicy::ParagraphBoundary);
    let report = report_with(SectionKind::Summary, vec!["lorem".to_string(); 100]);
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let artifact = exporter.export(&report, ExportFormat::Text, now).unwrap();
    let text = String::from_utf8(artifact.bytes).unwrap();
    let pages: Vec<&str> = text.split('\u{000C}').collect();

    assert_eq!(pages.len(), artifact.page_count);
    assert!(artifact.page_count >= 3);
    for (i, page) in pages.iter().enumerate() {
        let footer = page.lines().filter(|l| !l.trim().is_empty()).last().unwrap();
        assert_eq!(footer.trim(), format!("Page {} of {}", i + 1, pages.len()));
    }
}

#[test]
fn pdf_export_counts_pages() {
    let exporter = narrow(OverflowPolicy::ParagraphBoundary);
    let report = report_with(SectionKind::Summary, vec!["lorem".to_string(); 100]);
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let artifact = exporter.export(&report, ExportFormat::Pdf, now).unwrap();
    assert_eq!(artifact.mime_type, "application/pdf");
    assert!(artifact.filename.ends_with(".pdf"));

    let doc = lopdf::Document::load_mem(&artifact.bytes).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), artifact.page_count);

    let last = pages[&(artifact.page_count as u32)];
    let content = lopdf::content::Content::decode(&doc.get_page_content(last).unwrap()).unwrap();
    let footer = format!("Page {0} of {0}", artifact.page_count);
    assert!(content.operations.iter().any(|op| {
        op.operator == "Tj"
            && matches!(op.operands.first(), Some(lopdf::Object::String(bytes, _)) if bytes == footer.as_bytes())
    }));
}

#[test]
fn exports_of_same_task_get_distinct_names() {
    let exporter = DocumentExporter::default();
    let report = ResearchReport::new("AI & Robots: 2024!")
        .unwrap()
        .with_text(SectionKind::Summary, ["ok"]);

    let first = exporter
        .export(&report, ExportFormat::Pdf, Utc.timestamp_millis_opt(1_000).unwrap())
        .unwrap();
    let second = exporter
        .export(&report, ExportFormat::Pdf, Utc.timestamp_millis_opt(2_500).unwrap())
        .unwrap();

    assert!(first.filename.starts_with("AI___Robots__2024__"));
    assert_ne!(first.filename, second.filename);
    let stem = first.filename.trim_end_matches(".pdf");
    assert!(stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
}

struct FailingHost;

#[async_trait]
impl Clipboard for FailingHost {
    async fn write_text(&self, _text: &str) -> Result<(), HostError> {
        Err("clipboard permission denied".into())
    }
}

#[async_trait]
impl FileSink for FailingHost {
    async fn save(&self, _: &str, _: &str, _: &[u8]) -> Result<PathBuf, HostError> {
        Err("disk full".into())
    }
}

#[async_trait]
impl PrintHost for FailingHost {
    async fn print(&self, _: &str, _: &str) -> Result<(), HostError> {
        Err("no printer".into())
    }
}

#[derive(Default)]
struct RecordingHost {
    clipboard: Mutex<Option<String>>,
    printed: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Clipboard for RecordingHost {
    async fn write_text(&self, text: &str) -> Result<(), HostError> {
        *self.clipboard.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

#[async_trait]
impl PrintHost for RecordingHost {
    async fn print(&self, title: &str, document: &str) -> Result<(), HostError> {
        self.printed
            .lock()
            .unwrap()
            .push((title.to_string(), document.to_string()));
        Ok(())
    }
}

#[tokio::test]
async fn saves_into_directory() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let exporter = DocumentExporter::default();
    let report = report_with(SectionKind::Summary, vec!["ok".to_string()]);
    let artifact = exporter.export(&report, ExportFormat::Json, Utc::now())?;

    let path = exporter
        .save(&artifact, &DirectorySink::new(temp.path()))
        .await?;

    assert_eq!(path.file_name().unwrap().to_str(), Some(artifact.filename.as_str()));
    assert_eq!(tokio::fs::read(&path).await?, artifact.bytes);
    Ok(())
}

#[tokio::test]
async fn host_failures_become_export_errors() {
    let exporter = DocumentExporter::default();
    let report = report_with(SectionKind::Summary, vec!["ok".to_string()]);
    let artifact = exporter
        .export(&report, ExportFormat::Pdf, Utc::now())
        .unwrap();

    let saved = exporter.save(&artifact, &FailingHost).await;
    let copied = copy_to_clipboard(&report, &FailingHost).await;
    let printed = PrintSnapshot::capture(&report).print(&FailingHost).await;

    for result in [saved.map(|_| ()), copied, printed] {
        match result {
            Err(ScholarError::Export { message, .. }) => assert!(!message.is_empty()),
            other => panic!("Expected Export error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn clipboard_and_printer_receive_content() -> anyhow::Result<()> {
    let host = RecordingHost::default();
    let report = ResearchReport::new("Tides")?
        .with_text(SectionKind::Summary, ["High at noon."])
        .with_text(SectionKind::Reasoning, ["Hidden from the summary."]);

    copy_to_clipboard(&report, &host).await?;
    PrintSnapshot::capture(&report).print(&host).await?;

    let copied = host.clipboard.lock().unwrap().clone();
    assert_eq!(copied.as_deref(), Some("Task: Tides\n\nSummary:\nHigh at noon."));

    let printed = host.printed.lock().unwrap();
    assert_eq!(printed.len(), 1);
    assert_eq!(printed[0].0, "Tides");
    assert!(printed[0].1.contains("Hidden from the summary."));
    Ok(())
}

struct OkService;

#[async_trait]
impl ResearchService for OkService {
    async fn research(&self, task: &str) -> ScholarResult<ResearchReport> {
        Ok(ResearchReport::new(task)?.with_text(SectionKind::Summary, ["ok"]))
    }
}

#[tokio::test]
async fn submit_then_export_single_page() -> anyhow::Result<()> {
    let config = ScholarConfig::default();
    let mut session = ResearchSession::new(Arc::new(OkService), &config);

    let report = session.submit("X").await?;

    assert_eq!(session.store().len(), 1);
    assert_eq!(session.store().entries()[0].title, "X");
    let shown: Vec<_> = report.sections().map(|(kind, _)| kind).collect();
    assert_eq!(shown, vec![SectionKind::Summary]);

    let exporter = DocumentExporter::from_config(&config);
    let pages = exporter.layout(&report);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].count_headers(), 1);
    assert_eq!(pages[0].count_paragraphs(), 1);
    assert_eq!(pages[0].blocks.len(), 2);

    let artifact = exporter.export(&report, ExportFormat::Pdf, Utc::now())?;
    assert_eq!(artifact.page_count, 1);
    Ok(())
}

#[tokio::test]
async fn directory_sink_usable_as_trait_object() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let sink: Box<dyn FileSink> = Box::new(DirectorySink::new(temp.path().join("exports")));

    let path = sink.save("n.txt", "text/plain", b"x").await.map_err(|e| anyhow::anyhow!(e))?;

    assert!(path.starts_with(temp.path()));
    Ok(())
}
