//! Page layout for exported reports
//!
//! Walks the non-empty sections of a report in display order and places
//! headers, wrapped paragraphs and web records on A4 pages. Positions are in
//! millimetres from the top-left corner; `y` is the baseline of a block's
//! first line.
//!
//! Footers are not part of this pass, see
//! [`DocumentExporter::stamp_footers`](crate::DocumentExporter::stamp_footers).

use scholar_core::{LayoutConfig, OverflowPolicy, ResearchReport, SectionKind, SectionView, WebResult};
use serde::Serialize;
use tracing::debug;

/// Position and extent of a placed block
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub height: f32,
}

impl Placement {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Header {
        section: SectionKind,
        text: String,
        at: Placement,
    },
    Paragraph {
        section: SectionKind,
        lines: Vec<String>,
        at: Placement,
    },
    /// One web research record
    Source {
        /// 1-based position within the section
        index: usize,
        title: String,
        link_lines: Vec<String>,
        snippet_lines: Vec<String>,
        at: Placement,
    },
}

impl Block {
    pub fn placement(&self) -> Placement {
        match self {
            Block::Header { at, .. } | Block::Paragraph { at, .. } | Block::Source { at, .. } => *at,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, Block::Header { .. })
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph { .. })
    }

    /// Text lines in drawing order
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Block::Header { text, .. } => vec![text.as_str()],
            Block::Paragraph { lines, .. } => lines.iter().map(String::as_str).collect(),
            Block::Source {
                title,
                link_lines,
                snippet_lines,
                ..
            } => std::iter::once(title.as_str())
                .chain(link_lines.iter().map(String::as_str))
                .chain(snippet_lines.iter().map(String::as_str))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footer {
    pub text: String,
    /// Horizontal centre of the text
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// 1-based page number
    pub number: usize,
    pub blocks: Vec<Block>,
    pub footer: Option<Footer>,
}

impl Page {
    pub fn count_headers(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_header()).count()
    }

    pub fn count_paragraphs(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_paragraph()).count()
    }
}

/// Lays reports out on pages according to a [`LayoutConfig`]
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    config: LayoutConfig,
}

impl Paginator {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Place every non-empty section of `report`.
    ///
    /// Always returns at least one page; a report without content yields a
    /// single empty page.
    pub fn paginate(&self, report: &ResearchReport) -> Vec<Page> {
        let mut cursor = Cursor::new(&self.config);

        for (kind, view) in report.sections() {
            cursor.header(kind);
            match view {
                SectionView::Text(paragraphs) => {
                    for paragraph in paragraphs {
                        let lines = self.wrap(paragraph);
                        match self.config.overflow {
                            OverflowPolicy::ParagraphBoundary => {
                                cursor.paragraph(kind, lines);
                                cursor.break_if_full();
                            }
                            OverflowPolicy::LineBoundary => cursor.paragraph_by_line(kind, lines),
                        }
                    }
                }
                SectionView::Web(records) => {
                    for (i, record) in records.iter().enumerate() {
                        let lines = self.source_lines(record);
                        cursor.source(i + 1, record, lines);
                    }
                }
            }
            cursor.advance(self.config.section_gap);
        }

        let pages = cursor.finish();
        debug!(pages = pages.len(), task = report.task(), "Paginated report");
        pages
    }

    fn wrap(&self, text: &str) -> Vec<String> {
        let lines: Vec<String> = textwrap::wrap(text, self.config.wrap_columns)
            .into_iter()
            .map(|line| line.into_owned())
            .collect();
        if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        }
    }

    fn source_lines(&self, record: &WebResult) -> (Vec<String>, Vec<String>) {
        (self.wrap(&record.link), self.wrap(&record.snippet))
    }
}

/// Running layout state for one document
struct Cursor<'a> {
    config: &'a LayoutConfig,
    pages: Vec<Page>,
    current: Vec<Block>,
    y: f32,
}

impl<'a> Cursor<'a> {
    fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            current: Vec::new(),
            y: config.margin_top,
        }
    }

    fn line_boundary(&self) -> bool {
        self.config.overflow == OverflowPolicy::LineBoundary
    }

    fn at(&self, height: f32) -> Placement {
        Placement {
            x: self.config.margin_left,
            y: self.y,
            height,
        }
    }

    fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    /// Start a new page when something that tall would not fit and the
    /// current page already holds a block
    fn make_room(&mut self, height: f32) {
        if !self.current.is_empty() && self.y + height > self.config.page_capacity {
            self.new_page();
        }
    }

    fn break_if_full(&mut self) {
        if self.y > self.config.page_capacity {
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        let blocks = std::mem::take(&mut self.current);
        self.pages.push(Page {
            number: self.pages.len() + 1,
            blocks,
            footer: None,
        });
        self.y = self.config.margin_top;
    }

    fn header(&mut self, section: SectionKind) {
        let height = self.config.header_height;
        if self.line_boundary() {
            // keep the header with at least its first line
            self.make_room(height + self.config.line_height);
        }
        let at = self.at(height);
        self.current.push(Block::Header {
            section,
            text: section.title().to_string(),
            at,
        });
        self.advance(height);
    }

    fn paragraph(&mut self, section: SectionKind, lines: Vec<String>) {
        let height = lines.len() as f32 * self.config.line_height;
        let at = self.at(height);
        self.current.push(Block::Paragraph { section, lines, at });
        self.advance(height);
    }

    fn paragraph_by_line(&mut self, section: SectionKind, lines: Vec<String>) {
        let line_height = self.config.line_height;
        let mut chunk = Vec::new();

        for line in lines {
            let page_has_content = !self.current.is_empty() || !chunk.is_empty();
            let chunk_bottom = self.y + (chunk.len() + 1) as f32 * line_height;
            if page_has_content && chunk_bottom > self.config.page_capacity {
                if !chunk.is_empty() {
                    self.paragraph(section, std::mem::take(&mut chunk));
                }
                self.new_page();
            }
            chunk.push(line);
        }

        if !chunk.is_empty() {
            self.paragraph(section, chunk);
        }
    }

    fn source(&mut self, index: usize, record: &WebResult, lines: (Vec<String>, Vec<String>)) {
        let (link_lines, snippet_lines) = lines;
        let height = (1 + link_lines.len() + snippet_lines.len()) as f32 * self.config.line_height;
        if self.line_boundary() {
            self.make_room(height);
        }
        let at = self.at(height);
        self.current.push(Block::Source {
            index,
            title: format!("{}. {}", index, record.title),
            link_lines,
            snippet_lines,
            at,
        });
        self.advance(height + self.config.record_gap);
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        self.pages
    }
}
