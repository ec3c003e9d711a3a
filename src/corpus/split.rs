//! Document splitting: bounded chunks with a fixed character overlap.
//!
//! Markdown headers are preferred split points so a chunk rarely starts in
//! the middle of a section; a document with no headers degrades to plain
//! character-budget splitting.

/// Split a document into chunks of at most `max_chars` characters, carrying
/// the last `overlap` characters of each chunk into the next one.
///
/// A document that fits in one chunk is returned as-is. The returned order
/// is document order; the caller derives `chunk_index` from position.
pub fn split_document(content: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    if content.len() <= max_chars {
        return vec![content.to_string()];
    }

    let sections = split_at_headers(content);

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for section in sections {
        // Oversized single section: hard-split it on the character budget.
        if section.len() > max_chars {
            if !current.trim().is_empty() {
                chunks.push(current.trim().to_string());
            }
            current = String::new();
            for piece in hard_split(&section, max_chars, overlap) {
                chunks.push(piece);
            }
            continue;
        }

        if !current.is_empty() && current.len() + section.len() + 1 > max_chars {
            let finished = current.trim().to_string();
            // Seed the next chunk with the tail of this one.
            current = format!("{}\n{}", overlap_tail(&finished, overlap), section);
            chunks.push(finished);
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(&section);
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}

/// Split content into sections, each starting at a markdown header line
/// (leading text before the first header forms its own section).
fn split_at_headers(content: &str) -> Vec<String> {
    let mut sections: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if is_header_line(line) && !current.trim().is_empty() {
            sections.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.trim().is_empty() {
        sections.push(current);
    }

    sections
}

fn is_header_line(line: &str) -> bool {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    (1..=6).contains(&hashes) && line.as_bytes().get(hashes) == Some(&b' ')
}

/// Last `overlap` characters of `text`, on a UTF-8 char boundary.
fn overlap_tail(text: &str, overlap: usize) -> &str {
    if text.len() <= overlap {
        return text;
    }
    let mut start = text.len() - overlap;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

/// Character-budget splitting for header-free or oversized sections.
fn hard_split(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut start = 0usize;

    while start < text.len() {
        let mut end = (start + max_chars).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        pieces.push(text[start..end].to_string());
        if end == text.len() {
            break;
        }
        // Step back by the overlap for the next piece
        let mut next = end.saturating_sub(overlap).max(start + 1);
        while !text.is_char_boundary(next) {
            next += 1;
        }
        start = next;
    }

    pieces
}
