//! Output module for run reporting and roots files
//!
//! This module handles:
//! - Counting pages, roots and downloads over one run
//! - Printing the final summary
//! - Reading and writing roots files

mod roots;
pub mod stats;

pub use roots::{read_roots_file, RootsWriter};
pub use stats::{print_summary, RunCounters, RunSummary};
