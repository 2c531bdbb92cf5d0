//! Numeric notation styles and the per-slide style set.
//!
//! A style key classifies how a number is written: for decimals, the count
//! of digits after the separator; for millions, which abbreviation pattern
//! matched. Two matches with the same key are written consistently.

use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// A way of writing "million" after a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MillionNotation {
    /// `5M`
    Abbreviated,
    /// `5 Million` or `5Million`
    Word,
    /// `5mn`
    Mn,
    /// `5 m`, also the `5 m` of `5 mn`
    SpacedM,
}

static ABBREVIATED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?i){}", MillionNotation::Abbreviated.pattern())).unwrap());
static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?i){}", MillionNotation::Word.pattern())).unwrap());
static MN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?i){}", MillionNotation::Mn.pattern())).unwrap());
static SPACED_M_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?i){}", MillionNotation::SpacedM.pattern())).unwrap());

impl MillionNotation {
    /// Every variant, in the order patterns are applied to a run.
    pub const ALL: [MillionNotation; 4] = [
        MillionNotation::Abbreviated,
        MillionNotation::Word,
        MillionNotation::Mn,
        MillionNotation::SpacedM,
    ];

    /// Pattern source for this variant (matched case-insensitively).
    pub fn pattern(&self) -> &'static str {
        match self {
            MillionNotation::Abbreviated => r"\b\d+M\b",
            MillionNotation::Word => r"\b\d+\s?Million\b",
            MillionNotation::Mn => r"\b\d+mn\b",
            MillionNotation::SpacedM => r"\b(\d+\sm)n?\b",
        }
    }

    /// Compiled, case-insensitive regex for this variant.
    ///
    /// When the pattern has a capture group, the group is the reported match.
    pub fn regex(&self) -> &'static Regex {
        match self {
            MillionNotation::Abbreviated => &*ABBREVIATED_REGEX,
            MillionNotation::Word => &*WORD_REGEX,
            MillionNotation::Mn => &*MN_REGEX,
            MillionNotation::SpacedM => &*SPACED_M_REGEX,
        }
    }
}

impl fmt::Display for MillionNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

/// Classification of a single notation match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleKey {
    /// Number of digits after the decimal separator.
    DecimalPlaces(usize),
    /// Which million pattern matched.
    Million(MillionNotation),
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleKey::DecimalPlaces(places) => write!(f, "{}", places),
            StyleKey::Million(notation) => write!(f, "{}", notation),
        }
    }
}

/// A substring of a text run that matched a notation pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotationMatch {
    /// The matched text, as written.
    pub text: String,
    /// The style it was classified as.
    pub style: StyleKey,
}

impl NotationMatch {
    pub fn new(text: impl Into<String>, style: StyleKey) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Distinct styles observed on one slide.
///
/// Built fresh for every slide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSet {
    styles: BTreeSet<StyleKey>,
}

impl StyleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, style: StyleKey) {
        self.styles.insert(style);
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// More than one style co-occurs.
    pub fn is_inconsistent(&self) -> bool {
        self.styles.len() > 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleKey> {
        self.styles.iter()
    }
}

impl FromIterator<StyleKey> for StyleSet {
    fn from_iter<I: IntoIterator<Item = StyleKey>>(iter: I) -> Self {
        Self {
            styles: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for StyleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.styles.iter().map(|s| s.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_million_patterns_case_insensitive() {
        assert!(MillionNotation::Abbreviated.regex().is_match("5M"));
        assert!(MillionNotation::Abbreviated.regex().is_match("5m"));
        assert!(MillionNotation::Word.regex().is_match("5 million"));
        assert!(MillionNotation::Word.regex().is_match("5MILLION"));
        assert!(MillionNotation::Mn.regex().is_match("5MN"));
        assert!(MillionNotation::SpacedM.regex().is_match("5 M"));
    }

    #[test]
    fn test_million_patterns_anchored() {
        // The bare abbreviation must not fire inside longer words
        assert!(!MillionNotation::Abbreviated.regex().is_match("5mn"));
        assert!(!MillionNotation::Abbreviated.regex().is_match("5 Million"));
        assert!(!MillionNotation::Abbreviated.regex().is_match("5Million"));
        assert!(!MillionNotation::SpacedM.regex().is_match("5 Million"));
        assert!(!MillionNotation::Mn.regex().is_match("5 mn"));
    }

    #[test]
    fn test_spaced_m_covers_spaced_mn() {
        let caps = MillionNotation::SpacedM.regex().captures("5 mn").unwrap();
        assert_eq!(&caps[1], "5 m");
        assert!(MillionNotation::SpacedM.regex().is_match("5 m users"));
        assert!(!MillionNotation::SpacedM.regex().is_match("5 mnx"));
    }

    #[test]
    fn test_style_set_inconsistency() {
        let mut set = StyleSet::new();
        assert!(set.is_empty());
        assert!(!set.is_inconsistent());

        set.insert(StyleKey::DecimalPlaces(1));
        set.insert(StyleKey::DecimalPlaces(1));
        assert_eq!(set.len(), 1);
        assert!(!set.is_inconsistent());

        set.insert(StyleKey::DecimalPlaces(2));
        assert!(set.is_inconsistent());
    }

    #[test]
    fn test_style_set_display_sorted() {
        let set: StyleSet = [StyleKey::DecimalPlaces(3), StyleKey::DecimalPlaces(1)]
            .into_iter()
            .collect();
        assert_eq!(set.to_string(), "[1, 3]");

        let set: StyleSet = [
            StyleKey::Million(MillionNotation::Word),
            StyleKey::Million(MillionNotation::Abbreviated),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.to_string(), r"[\b\d+M\b, \b\d+\s?Million\b]");
    }
}
