//! Per-user session context for interactive hosts.
//!
//! A single shared password gates access. Passing the gate marks the
//! session authenticated for its lifetime; there is no expiry.

use crate::error::{Error, Result};
use crate::report::Report;

/// The shared static password check.
#[derive(Debug, Clone)]
pub struct AccessGate {
    password: String,
}

impl AccessGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    /// Whether `attempt` matches the shared password.
    pub fn verify(&self, attempt: &str) -> bool {
        attempt == self.password
    }
}

/// A downloadable report produced by the last successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ReportArtifact {
    /// Render a report into its download form.
    pub fn from_report(report: &Report) -> Result<Self> {
        Ok(Self {
            filename: report.filename(),
            bytes: report.to_csv_bytes()?,
        })
    }
}

/// Session state passed explicitly to every host action.
#[derive(Debug, Clone, Default)]
pub struct Session {
    authenticated: bool,
    last_report: Option<ReportArtifact>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Try the gate. A failed attempt never revokes an earlier success.
    pub fn authenticate(&mut self, gate: &AccessGate, attempt: &str) -> bool {
        if gate.verify(attempt) {
            self.authenticated = true;
        } else {
            log::warn!("Rejected access attempt");
        }
        self.authenticated
    }

    /// Fail with [`Error::AccessDenied`] unless authenticated.
    pub fn require_authenticated(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(Error::AccessDenied)
        }
    }

    /// Keep a report for later download, replacing any previous one.
    pub fn store_report(&mut self, artifact: ReportArtifact) {
        self.last_report = Some(artifact);
    }

    /// The last produced report, if a run has completed.
    pub fn last_report(&self) -> Option<&ReportArtifact> {
        self.last_report.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::IssueRecord;

    #[test]
    fn test_authenticate() {
        let gate = AccessGate::new("letmein");
        let mut session = Session::new();

        assert!(!session.is_authenticated());
        assert!(matches!(session.require_authenticated(), Err(Error::AccessDenied)));

        assert!(!session.authenticate(&gate, "wrong"));
        assert!(!session.is_authenticated());

        assert!(session.authenticate(&gate, "letmein"));
        assert!(session.require_authenticated().is_ok());

        // Stays authenticated after a later bad attempt
        assert!(session.authenticate(&gate, "wrong"));
    }

    #[test]
    fn test_store_report() {
        let mut session = Session::new();
        assert!(session.last_report().is_none());

        let report = Report::new(
            "decimal",
            vec![IssueRecord::new(1, "Inconsistent Decimal Points", "1.5", "[1, 2]")],
        );
        session.store_report(ReportArtifact::from_report(&report).unwrap());

        let artifact = session.last_report().unwrap();
        assert_eq!(artifact.filename, "decimal_validation_report.csv");
        assert!(String::from_utf8_lossy(&artifact.bytes).starts_with("slide,issue,text,corrected,details"));
    }
}
