//! Data-row counting without parsing.
//!
//! Counts line terminators, so a quoted field containing a newline and a
//! blank line each count as an extra row. The parsed row count can be lower.
//! Both paths skip a UTF-8 BOM, count an unterminated last line, and
//! subtract the header.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const BLOCK_SIZE: usize = 1 << 16;

/// Count data rows, header excluded. Never negative.
///
/// Tries block counting first and falls back to line iteration.
pub fn count_rows(path: &Path) -> std::io::Result<u64> {
    match count_rows_fast(path) {
        Ok(count) => Ok(count),
        Err(e) => {
            tracing::debug!(
                path = %path.display(),
                error = %e,
                "Block row count failed, iterating lines"
            );
            count_rows_by_lines(path)
        }
    }
}

/// Block-read the file and count `\n` terminators.
pub fn count_rows_fast(path: &Path) -> std::io::Result<u64> {
    let mut file = File::open(path)?;
    let mut buffer = vec![0u8; BLOCK_SIZE];
    let mut lines = 0u64;
    let mut last_byte = None;
    let mut first_block = true;

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        let mut block = &buffer[..read];
        if first_block {
            first_block = false;
            block = block.strip_prefix(UTF8_BOM).unwrap_or(block);
        }
        if let Some(&b) = block.last() {
            last_byte = Some(b);
        }
        lines += block.iter().filter(|&&b| b == b'\n').count() as u64;
    }

    if matches!(last_byte, Some(b) if b != b'\n') {
        lines += 1;
    }
    Ok(lines.saturating_sub(1))
}

/// Iterate the byte stream line by line.
pub fn count_rows_by_lines(path: &Path) -> std::io::Result<u64> {
    let mut reader = BufReader::new(File::open(path)?);
    if reader.fill_buf()?.starts_with(UTF8_BOM) {
        reader.consume(UTF8_BOM.len());
    }

    let mut lines = 0u64;
    for line in reader.split(b'\n') {
        line?;
        lines += 1;
    }
    Ok(lines.saturating_sub(1))
}
