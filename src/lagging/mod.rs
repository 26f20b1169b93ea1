//! Lagging indicator aggregation: parses accident codes, pulls the year's
//! records, classifies them and derives the injury rates.

pub mod assembler;
pub mod cache;
pub mod calculator;
pub mod classifier;
pub mod code;
pub mod source;

pub use assembler::LaggingEngine;
