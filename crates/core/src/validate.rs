//! Sequential validation driver.
//!
//! Slides are validated strictly in order, one at a time. There is no early
//! termination or retry: the first error aborts the run.

use crate::error::Result;
use crate::report::{IssueRecord, Report};
use crate::rules::{ConsistencyRule, RuleKind};
use crate::types::SlideSource;

/// Progress after a slide has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Slides validated so far.
    pub completed: usize,
    /// Total slides in the run.
    pub total: usize,
    /// Whole-number percentage, rounded down.
    pub percent: u8,
}

/// floor(100 * completed / total). An empty run is complete.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let completed = completed.min(total);
    (completed * 100 / total) as u8
}

/// Invoke `validate_slide` for every slide index `0..total` in order,
/// accumulating issues and reporting progress after each slide.
///
/// With zero slides, a single 100% update is reported.
pub fn run_slides<F, P>(total: usize, mut validate_slide: F, mut on_progress: P) -> Result<Vec<IssueRecord>>
where
    F: FnMut(usize) -> Result<Vec<IssueRecord>>,
    P: FnMut(Progress),
{
    let mut issues = Vec::new();

    if total == 0 {
        on_progress(Progress {
            completed: 0,
            total: 0,
            percent: 100,
        });
        return Ok(issues);
    }

    for index in 0..total {
        log::debug!("Validating slide {}", index + 1);
        issues.extend(validate_slide(index)?);

        let completed = index + 1;
        on_progress(Progress {
            completed,
            total,
            percent: progress_percent(completed, total),
        });
    }

    Ok(issues)
}

/// Applies one consistency rule to every slide of a deck.
pub struct Validator {
    rule: Box<dyn ConsistencyRule>,
}

impl Validator {
    /// Create a validator for a rule.
    pub fn new(rule: Box<dyn ConsistencyRule>) -> Self {
        Self { rule }
    }

    /// Create a validator for a built-in rule.
    pub fn for_kind(kind: RuleKind) -> Self {
        Self::new(kind.build())
    }

    /// Name of the rule this validator applies.
    pub fn rule_name(&self) -> &'static str {
        self.rule.name()
    }

    /// Validate every slide of `source` in order.
    pub fn validate<S, P>(&self, source: &mut S, on_progress: P) -> Result<Report>
    where
        S: SlideSource + ?Sized,
        P: FnMut(Progress),
    {
        let total = source.slide_count();
        log::debug!("Total slides: {}", total);

        let issues = run_slides(
            total,
            |index| {
                let slide = source.load_slide(index)?;
                Ok(self.rule.check_slide(&slide))
            },
            on_progress,
        )?;

        log::info!(
            "{} validation finished: {} issues across {} slides",
            self.rule.name(),
            issues.len(),
            total
        );

        Ok(Report::new(self.rule.name(), issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{Presentation, PresentationFormat, Shape, Slide};

    fn deck(slides: &[&[&str]]) -> Presentation {
        let mut presentation = Presentation::new("deck.pptx", PresentationFormat::Pptx);
        for (idx, runs) in slides.iter().enumerate() {
            let mut slide = Slide::new(idx + 1);
            slide.add_shape(Shape::from_paragraphs(runs.iter().copied()));
            presentation.add_slide(slide);
        }
        presentation
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 7), 14);
        assert_eq!(progress_percent(0, 0), 100);
    }

    #[test]
    fn test_run_slides_reports_each_slide() {
        let mut seen = Vec::new();
        let mut updates = Vec::new();

        let issues = run_slides(
            3,
            |index| {
                seen.push(index);
                Ok(vec![IssueRecord::new(index + 1, "kind", "1.5", "")])
            },
            |p| updates.push(p.percent),
        )
        .unwrap();

        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(updates, vec![33, 66, 100]);
        let slides: Vec<usize> = issues.iter().map(|i| i.slide).collect();
        assert_eq!(slides, vec![1, 2, 3]);
    }

    #[test]
    fn test_run_slides_zero_total() {
        let mut updates = Vec::new();
        let issues = run_slides(0, |_| unreachable!(), |p| updates.push(p)).unwrap();

        assert!(issues.is_empty());
        assert_eq!(
            updates,
            vec![Progress {
                completed: 0,
                total: 0,
                percent: 100
            }]
        );
    }

    #[test]
    fn test_run_slides_propagates_failure() {
        let mut updates = 0;
        let result = run_slides(
            3,
            |index| {
                if index == 1 {
                    Err(Error::XmlError("broken slide".to_string()))
                } else {
                    Ok(Vec::new())
                }
            },
            |_| updates += 1,
        );

        assert!(matches!(result, Err(Error::XmlError(_))));
        assert_eq!(updates, 1);
    }

    #[test]
    fn test_validator_decimal() {
        let mut presentation = deck(&[&["1.5", "2.5"], &["1.5", "1,50"], &[], &["3.14"]]);
        let report = Validator::for_kind(RuleKind::Decimal)
            .validate(&mut presentation, |_| {})
            .unwrap();

        assert_eq!(report.filename(), "decimal_validation_report.csv");
        assert_eq!(report.issues.len(), 2);
        assert!(report.issues.iter().all(|i| i.slide == 2));
        assert!(report.issues.iter().all(|i| i.details.contains("[1, 2]")));
    }

    #[test]
    fn test_validator_million() {
        let mut presentation = deck(&[&["5M", "5 Million"], &["7mn", "8mn"]]);
        let mut last = None;
        let report = Validator::for_kind(RuleKind::Million)
            .validate(&mut presentation, |p| last = Some(p.percent))
            .unwrap();

        assert_eq!(report.issues.len(), 2);
        assert!(report.issues.iter().all(|i| i.slide == 1));
        assert_eq!(last, Some(100));
    }

    #[test]
    fn test_validator_empty_deck() {
        let mut presentation = deck(&[]);
        let report = Validator::for_kind(RuleKind::Decimal)
            .validate(&mut presentation, |_| {})
            .unwrap();

        assert!(report.is_clean());
    }
}
