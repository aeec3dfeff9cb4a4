//! Fragment concatenation and batch merge planning.

mod batch;
mod combine;

pub use batch::{batch_size, partial_merge};
pub use combine::{combine_files, combine_into, MergeError};
