//! Reading History Buffer
//!
//! Provides the bounded sliding window of readings that feeds the
//! sequence predictor.

mod history;

pub use history::{ReadingHistory, DEFAULT_CAPACITY};
