use crate::types::ContextChunk;

/// Splits text into ordered chunks of at most `chunk_size` chars.
///
/// Within the last `lookback` chars before the size limit the chunker looks
/// for a natural boundary, preferring a paragraph break, then a line break,
/// then a sentence end, then any whitespace. The boundary stays with the
/// preceding chunk. Without a boundary the chunk is cut at the limit.
///
/// Chunks never overlap or drop text: joining them in order yields the input.
pub struct TextChunker {
    chunk_size: usize,
    lookback: usize,
}

const SENTENCE_ENDS: [&str; 3] = [". ", "! ", "? "];

impl TextChunker {
    pub fn new(chunk_size: usize, lookback: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            lookback: lookback.min(chunk_size - 1),
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<ContextChunk> {
        let mut chunks = Vec::new();
        let mut rest = text;

        while !rest.is_empty() {
            let cut = self.cut_point(rest);
            let (head, tail) = rest.split_at(cut);
            chunks.push(ContextChunk {
                index: chunks.len(),
                text: head.to_string(),
            });
            rest = tail;
        }

        chunks
    }

    /// Byte offset at which the next chunk of `rest` ends.
    fn cut_point(&self, rest: &str) -> usize {
        let limit = match rest.char_indices().nth(self.chunk_size) {
            Some((byte, _)) => byte,
            None => return rest.len(),
        };

        let window_start = rest
            .char_indices()
            .nth(self.chunk_size - self.lookback)
            .map(|(byte, _)| byte)
            .unwrap_or(limit);
        let window = &rest[window_start..limit];

        let boundary = find_last(window, &["\n\n"])
            .or_else(|| find_last(window, &["\n"]))
            .or_else(|| find_last(window, &SENTENCE_ENDS))
            .or_else(|| {
                window
                    .char_indices()
                    .rev()
                    .find(|(_, c)| c.is_whitespace())
                    .map(|(i, c)| i + c.len_utf8())
            });

        match boundary {
            Some(end) if window_start + end > 0 => window_start + end,
            _ => limit,
        }
    }
}

/// End offset of the right-most occurrence of any pattern in `window`.
fn find_last(window: &str, patterns: &[&str]) -> Option<usize> {
    patterns
        .iter()
        .filter_map(|p| window.rfind(p).map(|i| i + p.len()))
        .max()
}
