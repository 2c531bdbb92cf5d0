//! Notation consistency rules.
//!
//! Both rules share one aggregation: collect every match on a slide, gather
//! their style keys, and if more than one style co-occurs report every match.
//! Matching is per text run, so a number split across runs by inline
//! formatting is not seen.

use crate::error::Error;
use crate::notation::{MillionNotation, NotationMatch, StyleKey, StyleSet};
use crate::report::IssueRecord;
use crate::types::Slide;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Digits, a `.` or `,` separator, digits.
static DECIMAL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+[.,]\d+").unwrap());

/// A per-slide notation consistency check.
pub trait ConsistencyRule {
    /// Short name, used as the report filename prefix.
    fn name(&self) -> &'static str;

    /// Value of the `issue` column.
    fn issue_kind(&self) -> &'static str;

    /// Prefix of the `details` column, followed by the observed styles.
    fn details_label(&self) -> &'static str;

    /// Every notation match in one text run, in the order they are reported.
    fn find_matches(&self, text: &str) -> Vec<NotationMatch>;

    /// Check one slide and return its issues.
    fn check_slide(&self, slide: &Slide) -> Vec<IssueRecord> {
        let mut styles = StyleSet::new();
        let mut matches = Vec::new();

        for run in slide.text_runs() {
            let found = self.find_matches(&run.text);
            if !found.is_empty() {
                log::debug!(
                    "Slide {}: {} matches in run {:?}: {:?}",
                    slide.number,
                    self.name(),
                    run.text,
                    found.iter().map(|m| m.text.as_str()).collect::<Vec<_>>()
                );
            }
            for m in found {
                styles.insert(m.style);
                matches.push(m);
            }
        }

        log::debug!("Slide {}: {} style set {}", slide.number, self.name(), styles);

        if !styles.is_inconsistent() {
            return Vec::new();
        }

        let details = format!("{}: {}", self.details_label(), styles);
        matches
            .into_iter()
            .map(|m| {
                log::debug!("Slide {}: inconsistent notation {:?}", slide.number, m.text);
                IssueRecord::new(slide.number, self.issue_kind(), m.text, details.clone())
            })
            .collect()
    }
}

/// Flags slides that mix decimal precisions, e.g. "1.5" next to "2.25".
///
/// The style is the digit count after the separator, not the separator
/// itself: "1.5" and "1,5" are the same style.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalRule;

impl ConsistencyRule for DecimalRule {
    fn name(&self) -> &'static str {
        "decimal"
    }

    fn issue_kind(&self) -> &'static str {
        "Inconsistent Decimal Points"
    }

    fn details_label(&self) -> &'static str {
        "Found inconsistent decimal points"
    }

    fn find_matches(&self, text: &str) -> Vec<NotationMatch> {
        DECIMAL_REGEX
            .find_iter(text)
            .filter_map(|m| {
                let matched = m.as_str();
                let (_, fraction) = matched.split_once(['.', ','])?;
                Some(NotationMatch::new(
                    matched,
                    StyleKey::DecimalPlaces(fraction.chars().count()),
                ))
            })
            .collect()
    }
}

/// Flags slides that mix ways of writing "million", e.g. "5M" next to
/// "5 Million".
#[derive(Debug, Clone, Copy, Default)]
pub struct MillionRule;

impl ConsistencyRule for MillionRule {
    fn name(&self) -> &'static str {
        "million"
    }

    fn issue_kind(&self) -> &'static str {
        "Inconsistent Million Notation"
    }

    fn details_label(&self) -> &'static str {
        "Found inconsistent million notations"
    }

    fn find_matches(&self, text: &str) -> Vec<NotationMatch> {
        // Each pattern is applied independently; one run can hit several.
        MillionNotation::ALL
            .iter()
            .flat_map(|notation| {
                notation.regex().captures_iter(text).filter_map(move |caps| {
                    let m = caps.get(1).or_else(|| caps.get(0))?;
                    Some(NotationMatch::new(m.as_str(), StyleKey::Million(*notation)))
                })
            })
            .collect()
    }
}

/// Selectable rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Decimal,
    Million,
}

impl RuleKind {
    pub const ALL: [RuleKind; 2] = [RuleKind::Decimal, RuleKind::Million];

    /// Instantiate the rule.
    pub fn build(&self) -> Box<dyn ConsistencyRule> {
        match self {
            RuleKind::Decimal => Box::new(DecimalRule),
            RuleKind::Million => Box::new(MillionRule),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Decimal => "decimal",
            RuleKind::Million => "million",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "decimal" => Ok(RuleKind::Decimal),
            "million" => Ok(RuleKind::Million),
            other => Err(Error::UnknownRule(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Paragraph, Shape, TextRun};

    fn slide_with(number: usize, runs: &[&str]) -> Slide {
        let mut slide = Slide::new(number);
        slide.add_shape(Shape::from_paragraphs(runs.iter().copied()));
        slide
    }

    #[test]
    fn test_decimal_style_is_digit_count() {
        let matches = DecimalRule.find_matches("Revenue 1.5 vs 1,5 vs 2.25");
        let styles: Vec<StyleKey> = matches.iter().map(|m| m.style).collect();
        assert_eq!(
            styles,
            vec![
                StyleKey::DecimalPlaces(1),
                StyleKey::DecimalPlaces(1),
                StyleKey::DecimalPlaces(2)
            ]
        );
    }

    #[test]
    fn test_decimal_single_match_no_issues() {
        let slide = slide_with(1, &["Growth of 3.25 percent"]);
        assert!(DecimalRule.check_slide(&slide).is_empty());

        let slide = slide_with(1, &["No numbers here"]);
        assert!(DecimalRule.check_slide(&slide).is_empty());
    }

    #[test]
    fn test_decimal_same_precision_no_issues() {
        let slide = slide_with(1, &["1.5", "2.3 and 10.7", "4,1"]);
        assert!(DecimalRule.check_slide(&slide).is_empty());
    }

    #[test]
    fn test_decimal_mixed_precision_reports_every_match() {
        let slide = slide_with(4, &["Margin 1.5", "Target 1,50"]);
        let issues = DecimalRule.check_slide(&slide);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].text, "1.5");
        assert_eq!(issues[1].text, "1,50");
        for issue in &issues {
            assert_eq!(issue.slide, 4);
            assert_eq!(issue.issue, "Inconsistent Decimal Points");
            assert_eq!(issue.corrected, None);
            assert_eq!(issue.details, "Found inconsistent decimal points: [1, 2]");
        }
    }

    #[test]
    fn test_decimal_includes_majority_style_matches() {
        let slide = slide_with(1, &["1.5 2.5 3.5", "4.75"]);
        assert_eq!(DecimalRule.check_slide(&slide).len(), 4);
    }

    #[test]
    fn test_decimal_split_across_runs_not_detected() {
        let mut slide = Slide::new(1);
        slide.add_shape(Shape {
            name: None,
            paragraphs: vec![Paragraph {
                runs: vec![TextRun::new("1."), TextRun::new("50"), TextRun::new("2.5")],
            }],
        });
        // "1." + "50" is never seen as one number, leaving a single style
        assert!(DecimalRule.check_slide(&slide).is_empty());
    }

    #[test]
    fn test_million_single_variant_no_issues() {
        let slide = slide_with(1, &["5M users", "10m downloads", "3M"]);
        assert!(MillionRule.check_slide(&slide).is_empty());
    }

    #[test]
    fn test_million_mixed_variants() {
        let slide = slide_with(2, &["5M users", "5 Million downloads"]);
        let issues = MillionRule.check_slide(&slide);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].text, "5M");
        assert_eq!(issues[1].text, "5 Million");
        for issue in &issues {
            assert_eq!(issue.issue, "Inconsistent Million Notation");
            assert!(issue.details.contains(MillionNotation::Abbreviated.pattern()));
            assert!(issue.details.contains(MillionNotation::Word.pattern()));
        }
    }

    #[test]
    fn test_million_patterns_checked_per_run() {
        let matches = MillionRule.find_matches("3 m and 4mn and 7M");
        let texts: Vec<&str> = matches.iter().map(|m| m.text.as_str()).collect();
        // Pattern order, not position order
        assert_eq!(texts, vec!["7M", "4mn", "3 m"]);

        let slide = slide_with(1, &["3 m and 4mn and 7M"]);
        let issues = MillionRule.check_slide(&slide);
        assert_eq!(issues.len(), 3);
        assert!(issues[0].details.contains(MillionNotation::SpacedM.pattern()));
    }

    #[test]
    fn test_million_spaced_mn_conflicts_with_abbreviation() {
        let matches = MillionRule.find_matches("5 mn");
        assert_eq!(
            matches,
            vec![NotationMatch::new("5 m", StyleKey::Million(MillionNotation::SpacedM))]
        );

        let slide = slide_with(1, &["5M and 5 mn"]);
        let issues = MillionRule.check_slide(&slide);
        let texts: Vec<&str> = issues.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["5M", "5 m"]);
    }

    #[test]
    fn test_million_word_is_not_spaced_m() {
        let matches = MillionRule.find_matches("5 Million");
        assert_eq!(
            matches,
            vec![NotationMatch::new("5 Million", StyleKey::Million(MillionNotation::Word))]
        );
    }

    #[test]
    fn test_style_set_is_per_slide() {
        let first = slide_with(1, &["1.5"]);
        let second = slide_with(2, &["2.25"]);
        assert!(DecimalRule.check_slide(&first).is_empty());
        assert!(DecimalRule.check_slide(&second).is_empty());
    }

    #[test]
    fn test_rule_kind_parsing() {
        assert_eq!("decimal".parse::<RuleKind>().unwrap(), RuleKind::Decimal);
        assert_eq!(" Million ".parse::<RuleKind>().unwrap(), RuleKind::Million);
        assert!(matches!(
            "percent".parse::<RuleKind>(),
            Err(Error::UnknownRule(_))
        ));
        assert_eq!(RuleKind::Million.build().name(), "million");
    }
}
