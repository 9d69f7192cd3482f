mod allocator;
pub use allocator::*;
mod document_id;
pub use document_id::*;
