use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const DOCUMENT_PART: &str = "word/document.xml";

pub fn looks_like_zip(raw: &[u8]) -> bool {
    raw.starts_with(ZIP_MAGIC)
}

/// Body text of a DOCX package, one line per paragraph
pub fn docx_text(raw: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(raw)).context("Not a zip package")?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .with_context(|| format!("Missing {}", DOCUMENT_PART))?
        .read_to_string(&mut xml)
        .with_context(|| format!("Failed to read {}", DOCUMENT_PART))?;

    paragraphs(&xml)
}

fn paragraphs(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event().context("Malformed document XML")? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => lines.push(std::mem::take(&mut line)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => line.push('\t'),
                b"w:br" | b"w:cr" => line.push('\n'),
                b"w:p" => lines.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                line.push_str(&t.unescape().context("Malformed text run")?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}
