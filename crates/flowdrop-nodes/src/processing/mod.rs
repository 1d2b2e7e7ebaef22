//! Processing nodes
//!
//! Nodes that transform text or numbers.

mod calculator;
mod concat_texts;
mod regex_extractor;
mod text_transform;

pub use calculator::{CalculatorProcessor, Operation};
pub use concat_texts::ConcatTextsProcessor;
pub use regex_extractor::RegexExtractorProcessor;
pub use text_transform::{TextTransformProcessor, Transform};

pub(crate) use regex_extractor::build_regex;
