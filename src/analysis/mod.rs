//! Analysis result types
//!
//! - Result types (key, sections, the complete result)
//! - Metadata and flags

pub mod metadata;
pub mod result;

pub use metadata::{AnalysisFlag, AnalysisMetadata};
pub use result::{AnalysisResult, Key, Section};
