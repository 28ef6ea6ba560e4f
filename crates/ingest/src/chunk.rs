//! Overlapping, size-bounded chunking.
//!
//! The splitter walks a window over the text (counted in characters, not
//! bytes). Each chunk ends at the best natural boundary inside its window:
//! a paragraph break, then a line break, then the end of a sentence, then
//! any whitespace, and only as a last resort in the middle of a word. The
//! next chunk starts at least `chunk_overlap` characters before the previous
//! end, nudged back to the start of a word when one is close by.
//!
//! Guarantees, for any input and a valid [`ChunkingConfig`]:
//!
//! - every chunk has at most `chunk_size` characters;
//! - consecutive chunks share at least `chunk_overlap` characters (the tail
//!   of one is the head of the next);
//! - the chunks cover the whole input, in order.
use crate::config::ChunkingConfig;
use crate::error::ChunkingError;
use crate::types::Chunk;

/// Splits `text` into overlapping chunks.
///
/// Text that fits in one chunk is returned unchanged as a single chunk.
/// Whitespace-only text produces no chunks.
pub fn split_text(text: &str, cfg: &ChunkingConfig) -> Result<Vec<Chunk>, ChunkingError> {
    cfg.validate()?;

    let chars: Vec<char> = text.chars().collect();
    if chars.iter().all(|c| c.is_whitespace()) {
        return Ok(Vec::new());
    }

    let len = chars.len();
    let size = cfg.chunk_size;
    let overlap = cfg.chunk_overlap;
    if len <= size {
        return Ok(vec![Chunk {
            ordinal: 0,
            char_start: 0,
            text: text.to_string(),
        }]);
    }

    // How far a chunk start may move back from `end - overlap` to land on a word.
    // Bounded so the next window always reaches past the previous end.
    let backtrack = (size - overlap) / 2;

    let mut chunks = Vec::with_capacity(len / (size - overlap) + 1);
    let mut start = 0usize;
    let mut prev_end = 0usize;
    loop {
        let hard_end = (start + size).min(len);
        let end = if hard_end == len {
            len
        } else {
            let lower = (start + overlap + 1).max(prev_end + 1).min(hard_end);
            find_break(&chars, lower, hard_end)
        };

        chunks.push(Chunk {
            ordinal: chunks.len(),
            char_start: start,
            text: chars[start..end].iter().collect(),
        });

        if end == len {
            break;
        }

        let target = end - overlap;
        let floor = (start + 1).max(target.saturating_sub(backtrack));
        prev_end = end;
        start = find_word_start(&chars, floor, target);
    }

    Ok(chunks)
}

/// Picks a chunk end in `lower..=upper`, preferring the latest position of the
/// strongest boundary kind.
fn find_break(chars: &[char], lower: usize, upper: usize) -> usize {
    let boundaries: [fn(&[char], usize) -> bool; 4] = [
        is_paragraph_break,
        is_line_break,
        is_sentence_end,
        is_word_break,
    ];
    for is_boundary in boundaries {
        if let Some(pos) = (lower..=upper).rev().find(|&pos| is_boundary(chars, pos)) {
            return pos;
        }
    }
    upper
}

/// Latest word start in `floor..=target`, or `target` when there is none.
fn find_word_start(chars: &[char], floor: usize, target: usize) -> usize {
    (floor..=target)
        .rev()
        .find(|&pos| chars[pos - 1].is_whitespace() && !chars[pos].is_whitespace())
        .unwrap_or(target)
}

fn is_paragraph_break(chars: &[char], pos: usize) -> bool {
    pos >= 2 && chars[pos - 1] == '\n' && chars[pos - 2] == '\n'
}

fn is_line_break(chars: &[char], pos: usize) -> bool {
    pos >= 1 && chars[pos - 1] == '\n'
}

fn is_sentence_end(chars: &[char], pos: usize) -> bool {
    pos >= 2 && chars[pos - 1].is_whitespace() && matches!(chars[pos - 2], '.' | '!' | '?')
}

fn is_word_break(chars: &[char], pos: usize) -> bool {
    pos >= 1 && chars[pos - 1].is_whitespace()
}
