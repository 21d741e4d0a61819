//! Document export
//!
//! Turns a report into a paginated artifact. Layout and footer stamping are
//! separate passes because the footer needs the final page count.

use crate::host::FileSink;
use crate::host_failure;
use crate::paginate::{Block, Footer, Page, Paginator};
use crate::pdf;
use chrono::{DateTime, Utc};
use scholar_core::{
    performance, ExportConfig, LayoutConfig, ResearchReport, ScholarConfig, ScholarResult,
};
use std::path::PathBuf;
use tracing::{debug, info};

/// Export formats supported by the document exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Paginated PDF document
    #[default]
    Pdf,
    /// Plain text, pages separated by form feeds
    Text,
    /// The laid-out pages as JSON
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

/// An encoded document ready to hand to a [`FileSink`]
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Replace everything but ASCII letters and digits with `_` and cap the
/// length. Falls back to `fallback` when nothing alphanumeric is left.
pub fn sanitize_filename(task: &str, max_len: usize, fallback: &str) -> String {
    let stem: String = task
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(max_len)
        .collect();

    if stem.chars().any(|c| c.is_ascii_alphanumeric()) {
        stem
    } else {
        fallback.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentExporter {
    paginator: Paginator,
    export: ExportConfig,
}

impl DocumentExporter {
    pub fn new(layout: LayoutConfig, export: ExportConfig) -> Self {
        Self {
            paginator: Paginator::new(layout),
            export,
        }
    }

    pub fn from_config(config: &ScholarConfig) -> Self {
        Self::new(config.layout.clone(), config.export.clone())
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        self.paginator.config()
    }

    /// First pass: place content, no footers
    pub fn layout(&self, report: &ResearchReport) -> Vec<Page> {
        self.paginator.paginate(report)
    }

    /// Second pass: write `Page i of N` on every page
    pub fn stamp_footers(&self, pages: &mut [Page]) {
        let layout = self.paginator.config();
        let total = pages.len();
        for (i, page) in pages.iter_mut().enumerate() {
            page.footer = Some(Footer {
                text: format!("Page {} of {}", i + 1, total),
                x: layout.page_width / 2.0,
                y: layout.page_height - layout.footer_offset,
            });
        }
    }

    /// File name for an export of `task` made at `now`
    pub fn filename(&self, task: &str, format: ExportFormat, now: DateTime<Utc>) -> String {
        let stem = sanitize_filename(task, self.export.filename_max_len, &self.export.fallback_stem);
        format!(
            "{}_{}.{}",
            stem,
            now.format("%Y%m%d_%H%M%S_%3f"),
            format.extension()
        )
    }

    pub fn export(
        &self,
        report: &ResearchReport,
        format: ExportFormat,
        now: DateTime<Utc>,
    ) -> ScholarResult<ExportArtifact> {
        let artifact = performance::measure_sync("export_document", || -> ScholarResult<ExportArtifact> {
            let mut pages = self.layout(report);
            self.stamp_footers(&mut pages);

            let bytes = match format {
                ExportFormat::Pdf => pdf::render(&pages, self.paginator.config(), report.task())?,
                ExportFormat::Text => self.render_text(&pages).into_bytes(),
                ExportFormat::Json => serde_json::to_vec_pretty(&pages)?,
            };

            Ok(ExportArtifact {
                filename: self.filename(report.task(), format, now),
                mime_type: format.mime_type(),
                bytes,
                page_count: pages.len(),
            })
        });
        let artifact = artifact?;

        info!(
            format = ?format,
            filename = %artifact.filename,
            pages = artifact.page_count,
            size = artifact.bytes.len(),
            "Exported report"
        );
        Ok(artifact)
    }

    /// Hand an artifact to the host for saving
    pub async fn save(&self, artifact: &ExportArtifact, sink: &dyn FileSink) -> ScholarResult<PathBuf> {
        match sink
            .save(&artifact.filename, artifact.mime_type, &artifact.bytes)
            .await
        {
            Ok(path) => {
                info!(path = %path.display(), "Saved export");
                Ok(path)
            }
            Err(source) => Err(host_failure("Failed to save export", "save", source)),
        }
    }

    fn render_text(&self, pages: &[Page]) -> String {
        let width = self.paginator.config().wrap_columns;
        let mut rendered = Vec::with_capacity(pages.len());

        for page in pages {
            let mut out = String::new();
            for block in &page.blocks {
                if let Block::Header { .. } = block {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                }
                for line in block.lines() {
                    out.push_str(line);
                    out.push('\n');
                }
                if let Block::Source { .. } = block {
                    out.push('\n');
                }
            }
            if let Some(footer) = &page.footer {
                out.push('\n');
                out.push_str(&format!("{:^width$}", footer.text, width = width));
                out.push('\n');
            }
            rendered.push(out);
        }

        debug!(pages = rendered.len(), "Rendered text export");
        rendered.join("\u{000C}")
    }
}
