pub mod deflate;
pub mod format;
pub mod header;
pub mod inflate;
pub mod node;
pub mod runs;
pub mod table;

pub use deflate::{deflate_bytes, deflate_file};
pub use inflate::{inflate_bytes, inflate_file};
