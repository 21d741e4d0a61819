//! PDF rendering of laid-out pages
//!
//! Draws with the base-14 Helvetica fonts, one content stream per page.
//! Text outside Latin-1 is replaced with `?` since the standard fonts only
//! cover WinAnsi.

use crate::paginate::{Block, Page};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use scholar_core::{export_error, LayoutConfig, ScholarResult};

const MM_TO_PT: f32 = 72.0 / 25.4;
/// Average Helvetica glyph width as a fraction of the font size
const AVG_GLYPH_WIDTH: f32 = 0.5;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

/// Map `text` onto WinAnsi bytes
fn winansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| match c as u32 {
            0x0A | 0x0D | 0x09 => Some(b' '),
            code if code < 0x20 => None,
            code if code < 0x80 || (0xA0..=0xFF).contains(&code) => Some(code as u8),
            _ => Some(b'?'),
        })
        .collect()
}

struct PageContent<'a> {
    layout: &'a LayoutConfig,
    operations: Vec<Operation>,
}

impl<'a> PageContent<'a> {
    fn new(layout: &'a LayoutConfig) -> Self {
        Self {
            layout,
            operations: Vec::new(),
        }
    }

    /// Start `text` at (`x_mm`, `y_mm`), measured from the page's top-left corner
    fn text(&mut self, font: &str, size: f32, x_mm: f32, y_mm: f32, text: &str) {
        let x = x_mm * MM_TO_PT;
        let y = (self.layout.page_height - y_mm) * MM_TO_PT;
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(winansi(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn lines(&mut self, font: &str, x: f32, y: f32, lines: &[String]) {
        let size = self.layout.font_size;
        for (i, line) in lines.iter().enumerate() {
            self.text(font, size, x, y + i as f32 * self.layout.line_height, line);
        }
    }

    fn fill(&mut self, (r, g, b): (f32, f32, f32)) {
        self.operations
            .push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
    }

    fn block(&mut self, block: &Block) {
        let at = block.placement();
        let line_height = self.layout.line_height;
        match block {
            Block::Header { text, .. } => {
                let size = self.layout.header_font_size;
                self.text(BOLD, size, at.x, at.y, text);
            }
            Block::Paragraph { lines, .. } => self.lines(REGULAR, at.x, at.y, lines),
            Block::Source {
                title,
                link_lines,
                snippet_lines,
                ..
            } => {
                let size = self.layout.font_size;
                self.text(BOLD, size, at.x, at.y, title);
                let link_y = at.y + line_height;
                self.fill((0.0, 0.0, 0.8));
                self.lines(REGULAR, at.x, link_y, link_lines);
                self.fill((0.0, 0.0, 0.0));
                let snippet_y = link_y + link_lines.len() as f32 * line_height;
                self.lines(REGULAR, at.x, snippet_y, snippet_lines);
            }
        }
    }

    fn page(mut self, page: &Page) -> Content {
        for block in &page.blocks {
            self.block(block);
        }
        if let Some(footer) = &page.footer {
            let size = self.layout.font_size;
            let width_mm = footer.text.chars().count() as f32 * size * AVG_GLYPH_WIDTH / MM_TO_PT;
            self.text(REGULAR, size, footer.x - width_mm / 2.0, footer.y, &footer.text);
        }
        Content {
            operations: self.operations,
        }
    }
}

fn standard_font(doc: &mut Document, base_font: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Render `pages` into a complete PDF file
pub fn render(pages: &[Page], layout: &LayoutConfig, title: &str) -> ScholarResult<Vec<u8>> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let fonts = dictionary! {
        REGULAR => standard_font(&mut doc, "Helvetica"),
        BOLD => standard_font(&mut doc, "Helvetica-Bold"),
    };
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });
    let media_box: Vec<Object> = vec![
        0i64.into(),
        0i64.into(),
        (layout.page_width * MM_TO_PT).into(),
        (layout.page_height * MM_TO_PT).into(),
    ];

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = PageContent::new(layout)
            .page(page)
            .encode()
            .map_err(|e| export_error!(format!("Failed to encode page {}", page.number), "pdf", e))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(winansi(title)),
        "Producer" => Object::string_literal("scholar-export"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| export_error!("Failed to write PDF", "pdf", e))?;
    Ok(bytes)
}
