//! Batch processing over a directory of part files.

mod cancel;
mod discover;
mod driver;

pub use cancel::CancellationToken;
pub use discover::find_part_files;
pub use driver::{BatchDriver, CommandInProgress};
