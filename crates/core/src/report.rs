//! Issue records and the CSV validation report.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Column header of every report, in order.
pub const REPORT_COLUMNS: [&str; 5] = ["slide", "issue", "text", "corrected", "details"];

/// One reported inconsistency occurrence on a single slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// 1-based slide number.
    pub slide: usize,
    /// Kind of issue, e.g. "Inconsistent Decimal Points".
    pub issue: String,
    /// The matched text fragment.
    pub text: String,
    /// Suggested replacement. Never filled in; written as an empty cell.
    pub corrected: Option<String>,
    /// Every style observed on the slide.
    pub details: String,
}

impl IssueRecord {
    /// Create an issue record with no correction.
    pub fn new(
        slide: usize,
        issue: impl Into<String>,
        text: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            slide,
            issue: issue.into(),
            text: text.into(),
            corrected: None,
            details: details.into(),
        }
    }
}

/// The ordered issues produced by one validation run of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Short rule name, used for the report filename.
    pub rule: String,
    /// Issues in slide order.
    pub issues: Vec<IssueRecord>,
}

impl Report {
    pub fn new(rule: impl Into<String>, issues: Vec<IssueRecord>) -> Self {
        Self {
            rule: rule.into(),
            issues,
        }
    }

    /// `<rule>_validation_report.csv`
    pub fn filename(&self) -> String {
        report_filename(&self.rule)
    }

    /// Whether the run found no issues.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Write the report as CSV. The header row is always written.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(REPORT_COLUMNS)?;
        for issue in &self.issues {
            csv_writer.serialize(issue)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Render the report into an in-memory CSV buffer.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}

/// Report filename for a rule name.
pub fn report_filename(rule: &str) -> String {
    format!("{}_validation_report.csv", rule)
}
