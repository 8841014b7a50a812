//! Output formatters for analysis results

pub mod json;
pub mod text;
