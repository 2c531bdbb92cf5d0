//! Core domain types, notation consistency rules, and CSV reporting
//! for slide-deck validation.

pub mod error;
pub mod notation;
pub mod report;
pub mod rules;
pub mod session;
pub mod types;
pub mod validate;

pub use error::{Error, Result};
pub use notation::{MillionNotation, NotationMatch, StyleKey, StyleSet};
pub use report::{report_filename, IssueRecord, Report, REPORT_COLUMNS};
pub use rules::{ConsistencyRule, DecimalRule, MillionRule, RuleKind};
pub use session::{AccessGate, ReportArtifact, Session};
pub use types::{Paragraph, Presentation, PresentationFormat, Shape, Slide, SlideSource, TextRun};
pub use validate::{progress_percent, run_slides, Progress, Validator};
