//! Plain-text documents rendered to PDF with `pdf-writer`.
//!
//! One Helvetica font, A4 pages, fixed leading. Lines longer than the page
//! width are wrapped at word boundaries and text flows onto new pages.

use std::fs;
use std::path::Path;

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Result;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const FONT_SIZE: f32 = 10.0;
const LEADING: f32 = 14.0;
const MAX_CHARS: usize = 95;

const FONT_NAME: Name<'static> = Name(b"F1");

fn lines_per_page() -> usize {
    ((PAGE_HEIGHT - 2.0 * MARGIN) / LEADING) as usize
}

/// Break a line at spaces so no piece exceeds `MAX_CHARS`
fn wrap(line: &str) -> Vec<String> {
    if line.chars().count() <= MAX_CHARS {
        return vec![line.to_string()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split(' ') {
        let len = current.chars().count();
        if len > 0 && len + 1 + word.chars().count() > MAX_CHARS {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
        while current.chars().count() > MAX_CHARS {
            let split: String = current.chars().take(MAX_CHARS).collect();
            current = current.chars().skip(MAX_CHARS).collect();
            out.push(split);
        }
    }
    out.push(current);
    out
}

/// Single-byte text for the WinAnsi-encoded base font; anything outside
/// Latin-1 becomes `?`
fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' => out.extend_from_slice(b"    "),
            ' '..='~' => out.push(c as u8),
            c if ('\u{a0}'..='\u{ff}').contains(&c) => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

fn page_content(lines: &[String]) -> Vec<u8> {
    let mut content = Content::new();
    content.begin_text();
    content.set_font(FONT_NAME, FONT_SIZE);
    content.set_leading(LEADING);
    content.next_line(MARGIN, PAGE_HEIGHT - MARGIN);
    for line in lines {
        content.show(Str(&encode(line)));
        content.next_line_using_leading();
    }
    content.end_text();
    content.finish().to_vec()
}

/// Render text into PDF bytes
pub fn render_pdf(title: &str, text: &str) -> Vec<u8> {
    let lines: Vec<String> = text.lines().flat_map(wrap).collect();
    let mut pages: Vec<&[String]> = lines.chunks(lines_per_page()).collect();
    if pages.is_empty() {
        pages.push(&[]);
    }

    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let font_id = Ref::new(3);
    let info_id = Ref::new(4);
    // Each page takes two refs: the page itself and its content stream
    let page_ids: Vec<Ref> = (0..pages.len()).map(|i| Ref::new(5 + 2 * i as i32)).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().copied())
        .count(pages.len() as i32);
    pdf.type1_font(font_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr("ladcmd"));

    for (page_id, lines) in page_ids.iter().zip(&pages) {
        let content_id = Ref::new(page_id.get() + 1);
        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(tree_id);
        page.contents(content_id);
        page.resources().fonts().pair(FONT_NAME, font_id);
        page.finish();

        pdf.stream(content_id, &page_content(lines));
    }

    pdf.finish()
}

pub fn write_pdf(path: &Path, title: &str, text: &str) -> Result<()> {
    fs::write(path, render_pdf(title, text))?;
    Ok(())
}
