//! Pure, deterministic splitting of a message buffer into blocks and
//! sentence/line spans.
//!
//! Spans borrow directly from the caller's buffer (`&'a [u8]`) rather than
//! copying — the Rust translation of "pointer into caller's buffer,
//! decomposer does not copy" from the design: the borrow checker keeps a
//! returned span from outliving the buffer it points into, which is a
//! stronger guarantee than the original's "valid as long as you don't free
//! the source buffer" discipline.

#[cfg(test)]
mod tests;

use crate::constants::{MAX_BLOCKS_PER_MESSAGE, MAX_FENCE_LANG_LEN, MAX_SENTENCES_PER_BLOCK};

/// Fixed list of abbreviations (and the single-letter-initial rule) that
/// suppress an otherwise-valid sentence boundary.
const ABBREVIATIONS: &[&str] = &[
    "dr", "mr", "mrs", "ms", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "inc", "ltd",
    "co", "corp", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov",
    "dec",
];

/// Whether a block held fenced code or prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// A paragraph of prose.
    Text,
    /// A fenced code region.
    Code,
}

/// A span of bytes borrowed from the original buffer, plus its offset for
/// callers that need to relate it back to the source (tests, diagnostics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    /// Byte offset of `bytes` within the original buffer.
    pub offset: usize,
    /// The span's bytes, borrowed from the original buffer.
    pub bytes: &'a [u8],
}

/// One block extracted from a message, with its sentence/line spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    /// Whether this is prose or fenced code.
    pub kind: BlockKind,
    /// The block's trimmed content.
    pub content: Span<'a>,
    /// Fence language tag, for `Code` blocks with one (≤31 bytes).
    pub lang: Option<String>,
    /// Sentence spans (`Text`) or line spans (`Code`) within `content`.
    pub statements: Vec<Span<'a>>,
}

/// Split `input` into blocks and, within each, sentence/line spans.
///
/// Deterministic and infallible: malformed input (an unclosed fence, empty
/// buffer) degrades gracefully rather than erroring. Excess blocks beyond
/// [`MAX_BLOCKS_PER_MESSAGE`] and excess statements beyond
/// [`MAX_SENTENCES_PER_BLOCK`] are dropped silently, per spec.
#[must_use]
pub fn decompose(input: &[u8]) -> Vec<Block<'_>> {
    let lines = line_spans(input);
    let mut blocks = Vec::new();
    let mut paragraph_start: Option<usize> = None; // index into `lines`
    let mut paragraph_end: Option<usize> = None;

    let mut i = 0;
    while i < lines.len() {
        if blocks.len() >= MAX_BLOCKS_PER_MESSAGE {
            break;
        }
        let (start, end) = lines[i];
        let line = &input[start..end];
        let trimmed = trim_ascii(line);

        if let Some(fence_char) = fence_opener(trimmed) {
            flush_paragraph(input, &mut paragraph_start, &mut paragraph_end, &mut blocks);
            let lang = fence_lang(trimmed, fence_char);
            let content_first_line = i + 1;
            let mut j = content_first_line;
            let mut closed_at = None;
            while j < lines.len() {
                let (s, e) = lines[j];
                if is_fence_closer(trim_ascii(&input[s..e]), fence_char) {
                    closed_at = Some(j);
                    break;
                }
                j += 1;
            }
            let (content_last_line_exclusive, next_i) = match closed_at {
                Some(close_idx) => (close_idx, close_idx + 1),
                None => (lines.len(), lines.len()),
            };
            if blocks.len() < MAX_BLOCKS_PER_MESSAGE {
                let block_span = span_covering(
                    input,
                    &lines,
                    content_first_line,
                    content_last_line_exclusive,
                );
                if let Some(content) = block_span {
                    let statements = split_code_statements(input, &lines, content_first_line, content_last_line_exclusive);
                    blocks.push(Block {
                        kind: BlockKind::Code,
                        content,
                        lang,
                        statements,
                    });
                }
            }
            i = next_i;
            continue;
        }

        if trimmed.is_empty() {
            flush_paragraph(input, &mut paragraph_start, &mut paragraph_end, &mut blocks);
            i += 1;
            continue;
        }

        if paragraph_start.is_none() {
            paragraph_start = Some(i);
        }
        paragraph_end = Some(i);
        i += 1;
    }
    flush_paragraph(input, &mut paragraph_start, &mut paragraph_end, &mut blocks);

    blocks
}

fn flush_paragraph<'a>(
    input: &'a [u8],
    start: &mut Option<usize>,
    end: &mut Option<usize>,
    blocks: &mut Vec<Block<'a>>,
) {
    if let (Some(s), Some(e)) = (start.take(), end.take()) {
        if blocks.len() < MAX_BLOCKS_PER_MESSAGE {
            if let Some(lines) = Some(line_spans(input)) {
                if let Some(content) = span_covering(input, &lines, s, e + 1) {
                    let statements = split_text_statements(content);
                    blocks.push(Block {
                        kind: BlockKind::Text,
                        content,
                        lang: None,
                        statements,
                    });
                }
            }
        }
    }
}

/// Byte ranges of each line, excluding the trailing `\n` (and `\r` if
/// present before it).
fn line_spans(input: &[u8]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (idx, &b) in input.iter().enumerate() {
        if b == b'\n' {
            let mut end = idx;
            if end > start && input[end - 1] == b'\r' {
                end -= 1;
            }
            spans.push((start, end));
            start = idx + 1;
        }
    }
    spans.push((start, input.len()));
    spans
}

/// Build a trimmed [`Span`] covering lines `[first_line, last_line_exclusive)`.
fn span_covering<'a>(
    input: &'a [u8],
    lines: &[(usize, usize)],
    first_line: usize,
    last_line_exclusive: usize,
) -> Option<Span<'a>> {
    if first_line >= last_line_exclusive || first_line >= lines.len() {
        return None;
    }
    let raw_start = lines[first_line].0;
    let raw_end = lines[last_line_exclusive - 1].1;
    if raw_start >= raw_end {
        return None;
    }
    let raw = &input[raw_start..raw_end];
    let trim_start = raw.iter().take_while(|b| b.is_ascii_whitespace()).count();
    let trim_end = raw
        .iter()
        .rev()
        .take_while(|b| b.is_ascii_whitespace())
        .count();
    if trim_start + trim_end >= raw.len() {
        return None;
    }
    let offset = raw_start + trim_start;
    let bytes = &input[offset..raw_end - trim_end];
    Some(Span { offset, bytes })
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();
    let end = bytes
        .iter()
        .rev()
        .take_while(|b| b.is_ascii_whitespace())
        .count();
    if start + end >= bytes.len() {
        &[]
    } else {
        &bytes[start..bytes.len() - end]
    }
}

/// If `line` opens a fence, returns the fence character (`` ` `` or `~`).
fn fence_opener(line: &[u8]) -> Option<u8> {
    for &ch in &[b'`', b'~'] {
        if line.len() >= 3 && line[..3].iter().all(|&b| b == ch) {
            return Some(ch);
        }
    }
    None
}

fn is_fence_closer(line: &[u8], fence_char: u8) -> bool {
    line.len() >= 3 && line.iter().all(|&b| b == fence_char)
}

fn fence_lang(opener_line: &[u8], fence_char: u8) -> Option<String> {
    let marker_len = opener_line
        .iter()
        .take_while(|&&b| b == fence_char)
        .count();
    let rest = trim_ascii(&opener_line[marker_len..]);
    if rest.is_empty() {
        return None;
    }
    let truncated = &rest[..rest.len().min(MAX_FENCE_LANG_LEN)];
    std::str::from_utf8(truncated).ok().map(str::to_string)
}

fn split_code_statements<'a>(
    input: &'a [u8],
    lines: &[(usize, usize)],
    first_line: usize,
    last_line_exclusive: usize,
) -> Vec<Span<'a>> {
    let mut out = Vec::new();
    for &(start, end) in &lines[first_line..last_line_exclusive] {
        if out.len() >= MAX_SENTENCES_PER_BLOCK {
            break;
        }
        let raw = &input[start..end];
        let trim_start = raw.iter().take_while(|b| b.is_ascii_whitespace()).count();
        let trim_end = raw
            .iter()
            .rev()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        if trim_start + trim_end >= raw.len() {
            continue;
        }
        let offset = start + trim_start;
        out.push(Span {
            offset,
            bytes: &input[offset..end - trim_end],
        });
    }
    out
}

fn is_closing_quote_or_paren(b: u8) -> bool {
    matches!(b, b'"' | b'\'' | b')' | b']')
}

fn is_opening_quote_or_paren(b: u8) -> bool {
    matches!(b, b'"' | b'\'' | b'(' | b'[')
}

/// Scans backward from `end` (exclusive) over alphanumeric/`.` bytes to
/// recover the word immediately preceding a candidate terminator, used to
/// check it against the abbreviation list.
fn word_before(text: &[u8], end: usize) -> &[u8] {
    let mut start = end;
    while start > 0 {
        let b = text[start - 1];
        if b.is_ascii_alphanumeric() || b == b'.' {
            start -= 1;
        } else {
            break;
        }
    }
    &text[start..end]
}

fn is_abbreviation(word: &[u8]) -> bool {
    if word.len() == 1 && word[0].is_ascii_alphabetic() {
        return true;
    }
    let Ok(s) = std::str::from_utf8(word) else {
        return false;
    };
    let lower = s.to_ascii_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

fn split_text_statements(block: Span<'_>) -> Vec<Span<'_>> {
    let text = block.bytes;
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < text.len() {
        let b = text[i];
        if matches!(b, b'.' | b'!' | b'?') {
            let mut j = i + 1;
            while j < text.len() && is_closing_quote_or_paren(text[j]) {
                j += 1;
            }
            let followed_by_boundary = j == text.len() || text[j].is_ascii_whitespace();
            if followed_by_boundary {
                let mut k = j;
                while k < text.len() && text[k].is_ascii_whitespace() {
                    k += 1;
                }
                let leads_into_sentence = k == text.len()
                    || text[k].is_ascii_uppercase()
                    || is_opening_quote_or_paren(text[k]);
                let word = word_before(text, i);
                if leads_into_sentence && !is_abbreviation(word) {
                    if out.len() < MAX_SENTENCES_PER_BLOCK {
                        let raw = &text[start..j];
                        let trim_start =
                            raw.iter().take_while(|b| b.is_ascii_whitespace()).count();
                        if trim_start < raw.len() {
                            out.push(Span {
                                offset: block.offset + start + trim_start,
                                bytes: &raw[trim_start..],
                            });
                        }
                    }
                    start = j;
                    i = k;
                    continue;
                }
            }
        }
        i += 1;
    }
    if start < text.len() && out.len() < MAX_SENTENCES_PER_BLOCK {
        let raw = &text[start..];
        let trim_start = raw.iter().take_while(|b| b.is_ascii_whitespace()).count();
        if trim_start < raw.len() {
            out.push(Span {
                offset: block.offset + start + trim_start,
                bytes: &raw[trim_start..],
            });
        }
    }
    out
}
