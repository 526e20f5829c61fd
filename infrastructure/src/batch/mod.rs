//! Batch task files.

mod task_file;

pub use task_file::{BatchFileError, load_batch_file, parse_batch};
