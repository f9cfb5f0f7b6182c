use thiserror::Error;

#[derive(Error, Debug)]
pub enum RleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot create a zero-length file mapping")]
    EmptyCreate,
    #[error("Not an RLE file")]
    NotRle,
    #[error("Unknown node format tag {0:#04x}")]
    UnknownFormat(u8),
    #[error("No node format can shrink this input")]
    Inefficient,
    #[error("Node table exceeds the u32 count limit")]
    TableTooLarge,
    #[error("Inflated output does not match the recorded length")]
    LengthMismatch,
    #[error("Node table ends while a long node is expected")]
    TruncatedTable,
}

pub type Result<T> = std::result::Result<T, RleError>;

pub mod codec;
pub mod mapped;

pub use codec::deflate::{deflate_bytes, deflate_file};
pub use codec::inflate::{inflate_bytes, inflate_file};
