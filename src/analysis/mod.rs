//! Analysis modules.
//!
//! This module turns accumulated per-author sentiment into the aligned
//! daily series used by the report.

pub mod aligner;

pub use aligner::*;
