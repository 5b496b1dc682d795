//! Rule set configuration for deck validation.
//!
//! A [`RuleSet`] is plain data. It can be built in code, loaded from a
//! JSON file, or both (load, then override with the builder methods).

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default limit on non-blank lines per slide.
pub const DEFAULT_MAX_CONTENT_LINES: usize = 30;

/// Structural rules a deck is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSet {
    /// Non-blank lines allowed on one slide. Also drives the renderer's
    /// "too long" banner.
    pub max_content_lines_per_slide: usize,

    pub max_heading_level1_per_slide: usize,
    pub max_heading_level2_per_slide: usize,

    /// Strings that must appear somewhere in the deck.
    pub required_substrings: Vec<String>,

    /// Strings that must appear in this order across slides.
    pub required_ordered_markers: Vec<String>,

    /// Strings that indicate a generation bug when present.
    pub forbidden_substrings: Vec<String>,

    pub first_slide_must_contain: Option<SlidePredicate>,
    pub last_slide_must_contain: Option<SlidePredicate>,

    /// Report parse defects as errors instead of warnings.
    pub escalate_parse_defects: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            max_content_lines_per_slide: DEFAULT_MAX_CONTENT_LINES,
            max_heading_level1_per_slide: 1,
            max_heading_level2_per_slide: 4,
            required_substrings: Vec::new(),
            required_ordered_markers: Vec::new(),
            forbidden_substrings: vec![
                "undefined".to_string(),
                "null".to_string(),
                "[object".to_string(),
            ],
            first_slide_must_contain: None,
            last_slide_must_contain: None,
            escalate_parse_defects: false,
        }
    }
}

impl RuleSet {
    /// Create a rule set with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a rule set from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let rules: RuleSet = serde_json::from_str(json)?;
        rules.check_patterns()?;
        Ok(rules)
    }

    /// Load a rule set from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Compile every `matches` predicate so a bad pattern is reported at
    /// load time rather than as a finding.
    pub fn check_patterns(&self) -> Result<()> {
        for predicate in [&self.first_slide_must_contain, &self.last_slide_must_contain]
            .into_iter()
            .flatten()
        {
            predicate.compile()?;
        }
        Ok(())
    }

    pub fn with_max_content_lines(mut self, lines: usize) -> Self {
        self.max_content_lines_per_slide = lines;
        self
    }

    pub fn with_max_headings(mut self, level1: usize, level2: usize) -> Self {
        self.max_heading_level1_per_slide = level1;
        self.max_heading_level2_per_slide = level2;
        self
    }

    /// Add a required substring.
    pub fn require(mut self, text: impl Into<String>) -> Self {
        self.required_substrings.push(text.into());
        self
    }

    /// Append a marker to the required ordering.
    pub fn require_in_order(mut self, marker: impl Into<String>) -> Self {
        self.required_ordered_markers.push(marker.into());
        self
    }

    /// Add a forbidden substring.
    pub fn forbid(mut self, text: impl Into<String>) -> Self {
        self.forbidden_substrings.push(text.into());
        self
    }

    /// Replace the forbidden substrings.
    pub fn with_forbidden(mut self, texts: Vec<String>) -> Self {
        self.forbidden_substrings = texts;
        self
    }

    pub fn with_first_slide(mut self, predicate: SlidePredicate) -> Self {
        self.first_slide_must_contain = Some(predicate);
        self
    }

    pub fn with_last_slide(mut self, predicate: SlidePredicate) -> Self {
        self.last_slide_must_contain = Some(predicate);
        self
    }

    pub fn with_escalated_defects(mut self, escalate: bool) -> Self {
        self.escalate_parse_defects = escalate;
        self
    }
}

/// A check on one slide's raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlidePredicate {
    /// Plain substring match.
    Contains(String),
    /// Regular expression match.
    Matches(String),
}

impl SlidePredicate {
    pub fn contains(text: impl Into<String>) -> Self {
        Self::Contains(text.into())
    }

    pub fn matches(pattern: impl Into<String>) -> Self {
        Self::Matches(pattern.into())
    }

    /// Compile a `Matches` pattern; `Contains` always succeeds.
    pub fn compile(&self) -> Result<Option<Regex>> {
        match self {
            Self::Contains(_) => Ok(None),
            Self::Matches(pattern) => Regex::new(pattern)
                .map(Some)
                .map_err(|e| Error::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Evaluate against text.
    pub fn test(&self, text: &str) -> Result<bool> {
        match self {
            Self::Contains(needle) => Ok(text.contains(needle.as_str())),
            Self::Matches(_) => Ok(self.compile()?.is_some_and(|re| re.is_match(text))),
        }
    }

    /// Human-readable description used in findings.
    pub fn describe(&self) -> String {
        match self {
            Self::Contains(needle) => format!("contain '{}'", needle),
            Self::Matches(pattern) => format!("match /{}/", pattern),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = RuleSet::default();
        assert_eq!(rules.max_content_lines_per_slide, 30);
        assert_eq!(rules.max_heading_level1_per_slide, 1);
        assert_eq!(rules.max_heading_level2_per_slide, 4);
        assert_eq!(rules.forbidden_substrings, vec!["undefined", "null", "[object"]);
        assert!(!rules.escalate_parse_defects);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let rules = RuleSet::from_json(
            r#"{
                "max_content_lines_per_slide": 25,
                "required_ordered_markers": ["Intro", "Demo"],
                "last_slide_must_contain": {"contains": "layout: end"}
            }"#,
        )
        .unwrap();

        assert_eq!(rules.max_content_lines_per_slide, 25);
        assert_eq!(rules.max_heading_level2_per_slide, 4);
        assert_eq!(rules.required_ordered_markers, vec!["Intro", "Demo"]);
        assert_eq!(
            rules.last_slide_must_contain,
            Some(SlidePredicate::contains("layout: end"))
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let err = RuleSet::from_json(r#"{"max_lines": 10}"#).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_from_json_rejects_bad_pattern() {
        let err = RuleSet::from_json(r#"{"first_slide_must_contain": {"matches": "("}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_builder_overrides() {
        let rules = RuleSet::new()
            .with_max_content_lines(12)
            .require("Questions?")
            .require_in_order("Part 1")
            .require_in_order("Part 2")
            .with_forbidden(vec![])
            .forbid("TODO");

        assert_eq!(rules.max_content_lines_per_slide, 12);
        assert_eq!(rules.required_substrings, vec!["Questions?"]);
        assert_eq!(rules.required_ordered_markers, vec!["Part 1", "Part 2"]);
        assert_eq!(rules.forbidden_substrings, vec!["TODO"]);
    }

    #[test]
    fn test_predicates() {
        assert!(SlidePredicate::contains("cover").test("layout: cover").unwrap());
        assert!(SlidePredicate::matches(r"^layout: (cover|intro)$")
            .test("layout: intro")
            .unwrap());
        assert!(!SlidePredicate::matches("^end$").test("the end").unwrap());
        assert!(SlidePredicate::matches("(").test("x").is_err());
    }
}
