//! Configuration fragment merging

pub mod document;
pub mod fragment;
pub mod merger;

pub use document::{DocumentState, WriteOutcome, read_document, render_document, write_document};
pub use fragment::{ConfigFragment, union_entries};
pub use merger::ConfigFragmentMerger;
