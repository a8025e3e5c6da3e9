use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use crate::docx;

pub struct FileReader;

impl FileReader {
    /// Read a document's raw bytes
    pub async fn read_bytes(path: &Path) -> Result<Vec<u8>> {
        fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {:?}", path))
    }
}

/// Best-effort bytes -> text. DOCX packages yield their paragraph text;
/// anything else is decoded as UTF-8 with invalid sequences dropped rather
/// than replaced. NUL bytes are removed and the result is cut to `max_chars`.
pub fn prepare_text(raw: &[u8], max_chars: usize) -> String {
    if docx::looks_like_zip(raw) {
        if let Ok(text) = docx::docx_text(raw) {
            return decode_lossy(text.as_bytes(), max_chars);
        }
    }
    decode_lossy(raw, max_chars)
}

fn decode_lossy(raw: &[u8], max_chars: usize) -> String {
    let mut text = String::with_capacity(raw.len().min(max_chars * 4));
    let mut taken = 0;

    for chunk in raw.utf8_chunks() {
        for ch in chunk.valid().chars() {
            if taken == max_chars {
                return text;
            }
            if ch == '\0' {
                continue;
            }
            text.push(ch);
            taken += 1;
        }
    }

    text
}
