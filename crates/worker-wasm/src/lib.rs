//! WASM-compatible validation session for slide decks.
//!
//! This crate exposes the notation checks to JavaScript for use in
//! Cloudflare Workers: a password gate, an upload-and-run call with
//! per-slide progress, and the report bytes for download.

use deckcheck_core::{
    AccessGate, PresentationFormat, ReportArtifact, RuleKind, Session, Validator,
};
use deckcheck_pptx::PptxDocument;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Summary of a validation run.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Rule that was applied.
    pub rule: String,
    /// Number of slides validated.
    pub slide_count: usize,
    /// Number of issues reported.
    pub issue_count: usize,
    /// Filename to offer the report under.
    pub report_filename: String,
}

/// One user's session: authentication state and the last report.
#[wasm_bindgen]
pub struct ValidationSession {
    gate: AccessGate,
    session: Session,
}

#[wasm_bindgen]
impl ValidationSession {
    /// Create a session gated by the shared password.
    #[wasm_bindgen(constructor)]
    pub fn new(password: &str) -> ValidationSession {
        ValidationSession {
            gate: AccessGate::new(password),
            session: Session::new(),
        }
    }

    /// Try the password. Returns whether the session is now authenticated.
    pub fn authenticate(&mut self, attempt: &str) -> bool {
        self.session.authenticate(&self.gate, attempt)
    }

    #[wasm_bindgen(js_name = isAuthenticated)]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Validate an uploaded deck.
    ///
    /// # Arguments
    /// * `data` - The raw bytes of the PPTX file
    /// * `filename` - The uploaded filename (must end in `.pptx`)
    /// * `rule` - `"decimal"` or `"million"`
    /// * `on_progress` - Optional callback receiving the percentage after each slide
    ///
    /// # Returns
    /// A JavaScript object with the run summary, or throws on error.
    pub fn validate(
        &mut self,
        data: &[u8],
        filename: &str,
        rule: &str,
        on_progress: Option<js_sys::Function>,
    ) -> Result<JsValue, JsValue> {
        let summary = self
            .validate_impl(data, filename, rule, |percent| {
                if let Some(callback) = &on_progress {
                    if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from(percent)) {
                        log::warn!("Progress callback failed at {}%: {:?}", percent, err);
                    }
                }
            })
            .map_err(|e| JsValue::from_str(&e))?;

        serde_wasm_bindgen::to_value(&summary)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// CSV bytes of the last successful run, if any.
    #[wasm_bindgen(js_name = reportBytes)]
    pub fn report_bytes(&self) -> Option<Vec<u8>> {
        self.session.last_report().map(|r| r.bytes.clone())
    }

    /// Filename of the last successful run's report, if any.
    #[wasm_bindgen(js_name = reportFilename)]
    pub fn report_filename(&self) -> Option<String> {
        self.session.last_report().map(|r| r.filename.clone())
    }
}

impl ValidationSession {
    fn validate_impl<P>(
        &mut self,
        data: &[u8],
        filename: &str,
        rule: &str,
        mut on_progress: P,
    ) -> Result<ValidationSummary, String>
    where
        P: FnMut(u8),
    {
        self.session
            .require_authenticated()
            .map_err(|e| e.to_string())?;

        PresentationFormat::from_filename(filename)
            .ok_or_else(|| format!("Only .pptx uploads are accepted: {}", filename))?;

        let kind: RuleKind = rule.parse().map_err(|e: deckcheck_core::Error| e.to_string())?;

        // The upload buffer is owned by this call and dropped when it returns
        let mut document = PptxDocument::open(Cursor::new(data.to_vec()))
            .map_err(|e| format!("PPTX parsing error: {}", e))?;
        let slide_count = document.slide_paths().len();

        let report = Validator::for_kind(kind)
            .validate(&mut document, |progress| on_progress(progress.percent))
            .map_err(|e| e.to_string())?;

        let artifact = ReportArtifact::from_report(&report).map_err(|e| e.to_string())?;
        let summary = ValidationSummary {
            rule: report.rule.clone(),
            slide_count,
            issue_count: report.issues.len(),
            report_filename: artifact.filename.clone(),
        };
        self.session.store_report(artifact);

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_authentication() {
        let mut session = ValidationSession::new("secret");
        let result = session.validate_impl(b"PK\x03\x04", "deck.pptx", "decimal", |_| {});

        assert!(result.unwrap_err().contains("Access denied"));
        assert!(session.report_bytes().is_none());
    }

    #[test]
    fn test_validate_rejects_other_extensions() {
        let mut session = ValidationSession::new("secret");
        assert!(!session.authenticate("nope"));
        assert!(session.authenticate("secret"));

        let result = session.validate_impl(b"PK\x03\x04", "deck.ppt", "decimal", |_| {});
        assert!(result.unwrap_err().contains(".pptx"));
    }

    #[test]
    fn test_validate_rejects_unknown_rule() {
        let mut session = ValidationSession::new("secret");
        session.authenticate("secret");

        let result = session.validate_impl(b"PK\x03\x04", "deck.pptx", "percent", |_| {});
        assert!(result.unwrap_err().contains("Unknown validation rule"));
    }

    #[test]
    fn test_corrupt_upload_keeps_no_report() {
        let mut session = ValidationSession::new("secret");
        session.authenticate("secret");

        let result = session.validate_impl(b"garbage", "deck.pptx", "million", |_| {});
        assert!(result.unwrap_err().contains("PPTX parsing error"));
        assert!(session.report_filename().is_none());
    }
}
