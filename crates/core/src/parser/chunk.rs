//! Line-preserving code chunking.

/// Approximate characters per token used for budgeting.
pub const CHARS_PER_TOKEN: usize = 4;

/// Token budget per chunk.
pub const TOKENS_PER_CHUNK: usize = 128;

/// Maximum characters in one chunk (128 tokens x 4 chars).
pub const MAX_CHUNK_CHARS: usize = TOKENS_PER_CHUNK * CHARS_PER_TOKEN;

/// Split `code` on line boundaries into chunks of at most [`MAX_CHUNK_CHARS`].
///
/// Lines are packed greedily. A chunk is flushed just before a line would push
/// it past the bound; a line that alone exceeds the bound becomes its own
/// oversized chunk. Joining the chunks with `'\n'` gives back `code` exactly.
pub fn split_into_chunks(code: &str) -> Vec<String> {
    if code.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    // Holds at least one line, possibly blank, once set.
    let mut current: Option<(String, usize)> = None;

    for line in code.split('\n') {
        let line_len = line.chars().count();

        if let Some((chunk, chunk_len)) = current.take() {
            if chunk_len + 1 + line_len > MAX_CHUNK_CHARS {
                chunks.push(chunk);
                current = Some((line.to_string(), line_len));
            } else {
                let mut chunk = chunk;
                chunk.push('\n');
                chunk.push_str(line);
                current = Some((chunk, chunk_len + 1 + line_len));
            }
        } else {
            current = Some((line.to_string(), line_len));
        }
    }

    if let Some((chunk, _)) = current {
        chunks.push(chunk);
    }

    chunks
}
