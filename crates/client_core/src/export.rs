//! Report export for a finished analysis.
//!
//! The PDF writer lays text out with the built-in Helvetica faces, so no font
//! files are embedded. Anything outside printable ASCII is mapped to the
//! nearest ASCII form before it reaches a content stream.

use std::path::Path;

use lopdf::{
    content::{Content, Operation},
    Dictionary, Document, Object, ObjectId, Stream, StringFormat,
};
use shared::domain::DocumentAnalysis;
use tracing::info;

use crate::error::ExportError;

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;
const BODY_SIZE: i64 = 11;
const HEADING_SIZE: i64 = 14;
const TITLE_SIZE: i64 = 20;
const LIST_INDENT: i64 = 18;

pub trait ReportExporter: Send + Sync {
    /// File extension of the produced document, without the dot.
    fn extension(&self) -> &'static str;

    fn export(&self, analysis: &DocumentAnalysis) -> Result<Vec<u8>, ExportError>;
}

/// `nda.pdf` becomes `nda-analysis-report.<extension>`.
pub fn suggested_report_name(analysis: &DocumentAnalysis, extension: &str) -> String {
    let stem = Path::new(&analysis.file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .unwrap_or("document");
    format!("{stem}-analysis-report.{extension}")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReportExporter;

impl ReportExporter for PdfReportExporter {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn export(&self, analysis: &DocumentAnalysis) -> Result<Vec<u8>, ExportError> {
        if !analysis.analysis_complete {
            return Err(ExportError::Incomplete);
        }

        let pages = paginate(&report_lines(analysis));
        let bytes = render(&pages)?;
        info!(
            analysis_id = %analysis.id,
            pages = pages.len(),
            bytes = bytes.len(),
            "rendered analysis report"
        );
        Ok(bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
}

impl Face {
    fn resource_name(self) -> &'static [u8] {
        match self {
            Face::Regular => b"F1",
            Face::Bold => b"F2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    face: Face,
    size: i64,
    indent: i64,
    text: String,
    /// Extra space above the line, in points.
    gap_before: i64,
}

impl Line {
    fn height(&self) -> i64 {
        self.size + self.size / 2 + self.gap_before
    }
}

fn report_lines(analysis: &DocumentAnalysis) -> Vec<Line> {
    let mut lines = Vec::new();

    push_wrapped(&mut lines, Face::Bold, TITLE_SIZE, 0, 0, "Legal Document Analysis Report");
    let uploaded = analysis.upload_date.format("%B %-d, %Y %H:%M UTC").to_string();
    for meta in [
        format!("File: {}", analysis.file_name),
        format!("Size: {} bytes", analysis.file_size),
        format!("Uploaded: {uploaded}"),
        format!("Analysis ID: {}", analysis.id),
    ] {
        push_wrapped(&mut lines, Face::Regular, BODY_SIZE, 0, 0, &meta);
    }

    push_heading(&mut lines, "Summary");
    push_wrapped(&mut lines, Face::Regular, BODY_SIZE, 0, 0, &analysis.summary);

    push_heading(&mut lines, "Key Clauses");
    push_list(&mut lines, &analysis.key_clauses, true);

    push_heading(&mut lines, "Potential Risks");
    push_list(&mut lines, &analysis.risks, false);

    push_heading(&mut lines, "Recommended Next Steps");
    push_list(&mut lines, &analysis.next_steps, true);

    lines
}

fn push_heading(lines: &mut Vec<Line>, title: &str) {
    push_wrapped(lines, Face::Bold, HEADING_SIZE, 0, HEADING_SIZE, title);
}

fn push_list(lines: &mut Vec<Line>, items: &[String], numbered: bool) {
    if items.is_empty() {
        push_wrapped(lines, Face::Regular, BODY_SIZE, 0, 0, "None identified.");
        return;
    }
    for (index, item) in items.iter().enumerate() {
        let marker = if numbered {
            format!("{}. ", index + 1)
        } else {
            "- ".to_string()
        };
        push_wrapped(
            lines,
            Face::Regular,
            BODY_SIZE,
            LIST_INDENT,
            BODY_SIZE / 3,
            &format!("{marker}{item}"),
        );
    }
}

fn push_wrapped(
    lines: &mut Vec<Line>,
    face: Face,
    size: i64,
    indent: i64,
    gap_before: i64,
    text: &str,
) {
    let width = PAGE_WIDTH - 2 * MARGIN - indent;
    // Helvetica averages a little over half an em per glyph.
    let max_chars = ((width * 2) / size).max(1) as usize;

    for (i, text) in wrap(&to_ascii(text), max_chars).into_iter().enumerate() {
        lines.push(Line {
            face,
            size,
            indent,
            text,
            gap_before: if i == 0 { gap_before } else { 0 },
        });
    }
}

fn to_ascii(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            '\u{2022}' | '\u{00B7}' => '*',
            '\u{00A0}' | '\t' | '\n' | '\r' => ' ',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '?',
        })
        .collect()
}

fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let (head, tail) = word.split_at(max_chars);
            lines.push(head.to_string());
            word = tail;
        }
        if word.is_empty() {
            continue;
        }
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn paginate(lines: &[Line]) -> Vec<Vec<Line>> {
    let usable = PAGE_HEIGHT - 2 * MARGIN;
    let mut pages = vec![Vec::new()];
    let mut used = 0;

    for line in lines {
        let height = line.height();
        let has_content = pages.last().is_some_and(|page| !page.is_empty());
        if has_content && used + height > usable {
            pages.push(Vec::new());
            used = 0;
        }
        used += height;
        if let Some(page) = pages.last_mut() {
            page.push(line.clone());
        }
    }
    pages
}

fn page_content(lines: &[Line]) -> Content {
    let mut operations = Vec::with_capacity(lines.len() * 5);
    let mut y = PAGE_HEIGHT - MARGIN;

    for line in lines {
        y -= line.height();
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(line.face.resource_name().to_vec()),
                    Object::Integer(line.size),
                ],
            ),
            Operation::new(
                "Td",
                vec![Object::Integer(MARGIN + line.indent), Object::Integer(y)],
            ),
            Operation::new(
                "Tj",
                vec![Object::String(
                    line.text.clone().into_bytes(),
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ]);
    }
    Content { operations }
}

fn font(base_font: &str) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(base_font.as_bytes().to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ])
}

fn render(pages: &[Vec<Line>]) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font("Helvetica"));
    let bold_id = doc.add_object(font("Helvetica-Bold"));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![
            ("F1", Object::Reference(regular_id)),
            ("F2", Object::Reference(bold_id)),
        ])),
    )]));

    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(pages.len());
    for (index, lines) in pages.iter().enumerate() {
        let encoded = page_content(lines)
            .encode()
            .map_err(|err| ExportError::Encode {
                page: index + 1,
                reason: err.to_string(),
            })?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(PAGE_WIDTH),
                    Object::Integer(PAGE_HEIGHT),
                ]),
            ),
            ("Resources", Object::Reference(resources_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}
