use std::io;

/// What can go wrong while fixing a single file. Every variant is local to
/// the file it occurred on; the batch keeps going.
#[derive(Debug, thiserror::Error)]
pub enum FixError {
    #[error("malformed container: {0}")]
    MalformedContainer(&'static str),
    #[error("unsupported metadata schema: {0}")]
    UnsupportedSchema(&'static str),
    #[error("encoding overflow: {0}")]
    EncodingOverflow(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
