//! Tweet preparation pipeline.
//!
//! Raw tweets are cleaned into a bounded rolling window, then rendered
//! per author into a text block for the sentiment prompt.

pub mod batcher;
pub mod normalizer;

pub use batcher::{render_author_block, sampling_rng, DEFAULT_SAMPLE_SIZE};
pub use normalizer::{normalize_tweets, WINDOW_DAYS};
