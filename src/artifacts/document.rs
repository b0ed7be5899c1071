use crate::types::{ReportDraft, Source};

/// Layout-neutral building blocks of a rendered report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Title(String),
    Heading(String),
    SubHeading(String),
    Paragraph(String),
    Bullet(String),
    Rule,
}

/// A report flattened into blocks, in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub blocks: Vec<Block>,
}

pub const REFERENCES_HEADING: &str = "References";
pub const NO_SOURCES_TEXT: &str = "No external sources were retrieved for this report.";

impl Document {
    pub fn from_report(draft: &ReportDraft, sources: &[Source]) -> Self {
        let mut blocks = vec![Block::Title(draft.title.clone())];

        for section in &draft.sections {
            if !section.heading.is_empty() {
                blocks.push(Block::Heading(section.heading.clone()));
            }
            push_body(&mut blocks, &section.body);
        }

        blocks.push(Block::Heading(REFERENCES_HEADING.to_string()));
        if sources.is_empty() {
            blocks.push(Block::Paragraph(NO_SOURCES_TEXT.to_string()));
        } else {
            blocks.extend(
                reference_lines(sources)
                    .into_iter()
                    .map(Block::Paragraph),
            );
        }

        Self {
            title: draft.title.clone(),
            blocks,
        }
    }
}

/// `[n] Title (url)` for each source, numbered from 1.
pub fn reference_lines(sources: &[Source]) -> Vec<String> {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| match &source.url {
            Some(url) => format!("[{}] {} ({})", i + 1, source.title, url),
            None => format!("[{}] {}", i + 1, source.title),
        })
        .collect()
}

fn push_body(blocks: &mut Vec<Block>, body: &str) {
    let mut paragraph: Vec<&str> = Vec::new();

    for line in body.lines() {
        let line = line.trim();

        if line.is_empty() {
            flush_paragraph(blocks, &mut paragraph);
        } else if let Some(heading) = line
            .strip_prefix("#### ")
            .or_else(|| line.strip_prefix("### "))
        {
            flush_paragraph(blocks, &mut paragraph);
            blocks.push(Block::SubHeading(strip_emphasis(heading.trim())));
        } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            flush_paragraph(blocks, &mut paragraph);
            blocks.push(Block::Bullet(strip_emphasis(item.trim())));
        } else if matches!(line, "---" | "***" | "___") {
            flush_paragraph(blocks, &mut paragraph);
            blocks.push(Block::Rule);
        } else if is_numbered_item(line) {
            flush_paragraph(blocks, &mut paragraph);
            blocks.push(Block::Paragraph(strip_emphasis(line)));
        } else {
            paragraph.push(line);
        }
    }

    flush_paragraph(blocks, &mut paragraph);
}

fn flush_paragraph(blocks: &mut Vec<Block>, paragraph: &mut Vec<&str>) {
    if !paragraph.is_empty() {
        blocks.push(Block::Paragraph(strip_emphasis(&paragraph.join(" "))));
        paragraph.clear();
    }
}

fn is_numbered_item(line: &str) -> bool {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && line[digits..].starts_with(". ")
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace("__", "")
}
