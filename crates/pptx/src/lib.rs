//! PPTX (Office Open XML) slide reader for slide-deck validation.
//!
//! Parses .pptx files which are ZIP archives containing XML documents,
//! yielding each slide's shapes, paragraphs and text runs.

pub mod parser;

pub use parser::{PptxDocument, PptxParser};
