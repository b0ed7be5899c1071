//! Minimal PDF 1.4 writer for reports
//!
//! Uses the standard Helvetica faces with WinAnsi encoding, so no fonts are
//! embedded and output is byte-for-byte deterministic for the same document.
//! Text must be representable in Latin-1 after folding common typographic
//! punctuation; anything else is a render error.

use std::fmt::Write as _;

use crate::artifacts::document::{Block, Document};
use crate::artifacts::DocumentRenderer;
use crate::types::{AppError, Result};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const BULLET_INDENT: f32 = 14.0;
/// WinAnsi code for the bullet glyph
const BULLET: u8 = 0x95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
}

impl Face {
    fn resource(self) -> &'static str {
        match self {
            Face::Regular => "F1",
            Face::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Style {
    face: Face,
    size: f32,
    leading: f32,
    space_before: f32,
    space_after: f32,
    centered: bool,
}

const TITLE: Style = Style {
    face: Face::Bold,
    size: 18.0,
    leading: 22.0,
    space_before: 0.0,
    space_after: 20.0,
    centered: true,
};
const HEADING: Style = Style {
    face: Face::Bold,
    size: 14.0,
    leading: 18.0,
    space_before: 12.0,
    space_after: 6.0,
    centered: false,
};
const SUB_HEADING: Style = Style {
    face: Face::Bold,
    size: 12.0,
    leading: 16.0,
    space_before: 10.0,
    space_after: 4.0,
    centered: false,
};
const BODY: Style = Style {
    face: Face::Regular,
    size: 10.0,
    leading: 14.0,
    space_before: 0.0,
    space_after: 8.0,
    centered: false,
};
const BULLET_ITEM: Style = Style {
    space_after: 2.0,
    ..BODY
};

/// Renders a [`Document`] as a paginated US Letter PDF.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PdfRenderer {
    fn file_name(&self) -> &str {
        "report.pdf"
    }

    fn media_type(&self) -> &str {
        "application/pdf"
    }

    fn render(&self, document: &Document) -> Result<Vec<u8>> {
        let title = encode(&document.title)?;
        let mut layout = Layout::new();

        for block in &document.blocks {
            match block {
                Block::Title(text) => layout.paragraph(&encode(text)?, TITLE, 0.0, None),
                Block::Heading(text) => layout.paragraph(&encode(text)?, HEADING, 0.0, None),
                Block::SubHeading(text) => {
                    layout.paragraph(&encode(text)?, SUB_HEADING, 0.0, None)
                }
                Block::Paragraph(text) => layout.paragraph(&encode(text)?, BODY, 0.0, None),
                Block::Bullet(text) => {
                    layout.paragraph(&encode(text)?, BULLET_ITEM, BULLET_INDENT, Some(BULLET))
                }
                Block::Rule => layout.gap(12.0),
            }
        }

        Ok(assemble(&title, &layout.finish()))
    }
}

/// Fold typographic punctuation to ASCII and encode as WinAnsi/Latin-1.
fn encode(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let folded = match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => "'",
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => "\"",
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2212}' => "-",
            '\u{2014}' | '\u{2015}' => "--",
            '\u{2026}' => "...",
            '\u{2022}' | '\u{2023}' | '\u{25CF}' => "-",
            '\u{2009}' | '\u{200A}' | '\u{202F}' | '\t' => " ",
            '\u{200B}' | '\u{FEFF}' => "",
            _ => {
                let code = c as u32;
                if c.is_control() {
                    continue;
                }
                if code > 0xFF {
                    return Err(AppError::Render(format!(
                        "character '{}' (U+{:04X}) cannot be encoded in the PDF font",
                        c, code
                    )));
                }
                out.push(code as u8);
                continue;
            }
        };
        out.extend_from_slice(folded.as_bytes());
    }
    Ok(out)
}

struct Layout {
    pages: Vec<String>,
    current: String,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: String::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn gap(&mut self, amount: f32) {
        self.y -= amount;
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn paragraph(&mut self, text: &[u8], style: Style, indent: f32, marker: Option<u8>) {
        let lines = wrap(text, style, TEXT_WIDTH - indent);
        if lines.is_empty() {
            return;
        }

        // Skip leading space at the top of a page
        if self.y < PAGE_HEIGHT - MARGIN {
            self.y -= style.space_before;
        }

        for (i, line) in lines.iter().enumerate() {
            if self.y - style.leading < MARGIN {
                self.new_page();
            }
            self.y -= style.leading;

            let x = if style.centered {
                MARGIN + (TEXT_WIDTH - text_width(line, style)) / 2.0
            } else {
                MARGIN + indent
            };

            if let (0, Some(marker)) = (i, marker) {
                self.show(&[marker], style, MARGIN + 2.0);
            }
            self.show(line, style, x.max(MARGIN));
        }

        self.y -= style.space_after;
    }

    fn show(&mut self, text: &[u8], style: Style, x: f32) {
        let _ = writeln!(
            self.current,
            "BT /{} {} Tf {:.2} {:.2} Td ({}) Tj ET",
            style.face.resource(),
            style.size,
            x,
            self.y,
            escape(text)
        );
    }

    fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

fn glyph_width(byte: u8, face: Face) -> u16 {
    const REGULAR: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
        556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722,
        722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722,
        667, 944, 667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556,
        556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500,
        500, 334, 260, 334, 584,
    ];
    const BOLD: [u16; 95] = [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
        556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722,
        722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722,
        667, 944, 667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611,
        611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556,
        500, 389, 280, 389, 584,
    ];

    let table = match face {
        Face::Regular => &REGULAR,
        Face::Bold => &BOLD,
    };
    match byte {
        32..=126 => table[(byte - 32) as usize],
        BULLET => 350,
        // Accented Latin-1 letters are close to their base glyphs
        _ => 556,
    }
}

fn text_width(text: &[u8], style: Style) -> f32 {
    let units: u32 = text.iter().map(|&b| glyph_width(b, style.face) as u32).sum();
    units as f32 * style.size / 1000.0
}

/// Greedy word wrap; words wider than a line are split.
fn wrap(text: &[u8], style: Style, width: f32) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut line: Vec<u8> = Vec::new();

    for word in text.split(|&b| b == b' ').filter(|w| !w.is_empty()) {
        let candidate_width = if line.is_empty() {
            text_width(word, style)
        } else {
            text_width(&line, style) + text_width(b" ", style) + text_width(word, style)
        };

        if candidate_width <= width {
            if !line.is_empty() {
                line.push(b' ');
            }
            line.extend_from_slice(word);
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }

        let mut rest = word;
        while text_width(rest, style) > width {
            let mut fit = 1;
            while fit < rest.len() && text_width(&rest[..fit + 1], style) <= width {
                fit += 1;
            }
            lines.push(rest[..fit].to_vec());
            rest = &rest[fit..];
        }
        line.extend_from_slice(rest);
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// PDF literal string body. Non-ASCII bytes are octal-escaped.
fn escape(text: &[u8]) -> String {
    let mut out = String::with_capacity(text.len());
    for &b in text {
        match b {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7E => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{:03o}", b);
            }
        }
    }
    out
}

/// Write catalog, fonts, info and pages with a correct xref table.
fn assemble(title: &[u8], pages: &[String]) -> Vec<u8> {
    const CATALOG: usize = 1;
    const PAGES: usize = 2;
    const FONT_REGULAR: usize = 3;
    const FONT_BOLD: usize = 4;
    const INFO: usize = 5;
    const FIRST_PAGE: usize = 6;

    let page_ids: Vec<usize> = (0..pages.len()).map(|i| FIRST_PAGE + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<String> = vec![
        format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
        format!("<< /Title ({}) /Producer (lore) >>", escape(title)),
    ];

    for (page_id, content) in page_ids.iter().zip(pages) {
        objects.push(format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 {} 0 R /F2 {} 0 R >> >> /Contents {} 0 R >>",
            PAGES,
            PAGE_WIDTH,
            PAGE_HEIGHT,
            FONT_REGULAR,
            FONT_BOLD,
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ));
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in &offsets {
        let _ = writeln!(xref, "{:010} 00000 n ", offset);
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        CATALOG,
        INFO,
        xref_offset
    );
    out.extend_from_slice(xref.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(blocks: Vec<Block>) -> Document {
        Document {
            title: "Report".to_string(),
            blocks,
        }
    }

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_encode_folds_typography() {
        let bytes = encode("It\u{2019}s \u{201C}fine\u{201D} \u{2014} caf\u{e9}\u{2026}").unwrap();
        assert_eq!(bytes, b"It's \"fine\" -- caf\xe9...".to_vec());
    }

    #[test]
    fn test_encode_rejects_cjk() {
        let err = encode("光合作用").unwrap_err();
        assert!(matches!(err, AppError::Render(_)));
        assert!(err.to_string().contains("U+5149"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(b"a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape(&[0xe9]), "\\351");
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = b"the quick brown fox jumps over the lazy dog ".repeat(20);
        let lines = wrap(&text, BODY, 200.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width(l, BODY) <= 200.0));
    }

    #[test]
    fn test_wrap_splits_long_word() {
        let text = vec![b'm'; 200];
        let lines = wrap(&text, BODY, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), text);
    }

    #[test]
    fn test_render_structure_and_xref() {
        let pdf = PdfRenderer
            .render(&document(vec![
                Block::Title("Report".into()),
                Block::Heading("Intro".into()),
                Block::Paragraph("Hello (world)".into()),
                Block::Bullet("item".into()),
            ]))
            .unwrap();
        let text = as_text(&pdf);

        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        assert!(text.contains("(Hello \\(world\\)) Tj"));
        assert!(text.contains("/Count 1"));

        // startxref points at the xref keyword
        let start = text.rfind("startxref\n").unwrap() + "startxref\n".len();
        let offset: usize = text[start..].lines().next().unwrap().parse().unwrap();
        assert_eq!(&pdf[offset..offset + 4], b"xref");
    }

    #[test]
    fn test_headings_keep_order() {
        let pdf = PdfRenderer
            .render(&document(vec![
                Block::Title("T".into()),
                Block::Heading("First".into()),
                Block::Heading("Second".into()),
            ]))
            .unwrap();
        let text = as_text(&pdf);
        let first = text.find("(First)").unwrap();
        let second = text.find("(Second)").unwrap();
        assert!(first < second);
        assert!(text.contains("/F2 14 Tf"));
        assert!(text.contains("/F2 18 Tf"));
    }

    #[test]
    fn test_long_document_paginates() {
        let blocks = (0..200)
            .map(|i| Block::Paragraph(format!("Paragraph number {}", i)))
            .collect();
        let pdf = PdfRenderer.render(&document(blocks)).unwrap();
        let text = as_text(&pdf);
        assert!(!text.contains("/Count 1 "));
        assert!(text.contains("/Type /Page "));
    }

    #[test]
    fn test_render_is_deterministic() {
        let doc = document(vec![Block::Paragraph("same".into())]);
        assert_eq!(PdfRenderer.render(&doc).unwrap(), PdfRenderer.render(&doc).unwrap());
    }

    #[test]
    fn test_unsupported_character_fails() {
        let doc = document(vec![Block::Paragraph("emoji \u{1F600}".into())]);
        assert!(PdfRenderer.render(&doc).is_err());
    }
}
