//! Model reply parsing: envelope unwrapping, code extraction and chunking.

pub mod chunk;
pub mod response;

pub use chunk::{split_into_chunks, MAX_CHUNK_CHARS};
pub use response::{parse, ParsedResponse};
