//! Structural validation of a parsed deck.
//!
//! [`validate`] is a pure function of the deck and rule set. Each rule
//! contributes findings on its own and the report is sorted canonically,
//! so the order rules run in never shows up in the output.

use crate::rules::{RuleSet, SlidePredicate};
use crate::types::{Deck, ParseDefect, Slide};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Machine-readable identifier of the check that produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    EmptySlide,
    UnterminatedFence,
    MaxContentLines,
    MaxH1,
    MaxH2,
    RequiredSubstring,
    MissingOrderedMarker,
    MarkerOutOfOrder,
    ForbiddenSubstring,
    FirstSlide,
    LastSlide,
    AbsoluteMediaPath,
    InvalidPattern,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptySlide => "empty-slide",
            Self::UnterminatedFence => "unterminated-fence",
            Self::MaxContentLines => "max-content-lines",
            Self::MaxH1 => "max-h1",
            Self::MaxH2 => "max-h2",
            Self::RequiredSubstring => "required-substring",
            Self::MissingOrderedMarker => "missing-ordered-marker",
            Self::MarkerOutOfOrder => "marker-out-of-order",
            Self::ForbiddenSubstring => "forbidden-substring",
            Self::FirstSlide => "first-slide",
            Self::LastSlide => "last-slide",
            Self::AbsoluteMediaPath => "absolute-media-path",
            Self::InvalidPattern => "invalid-pattern",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem found in a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,

    /// Offending slide index; `None` for deck-level findings.
    pub slide: Option<usize>,

    pub rule: RuleId,
    pub message: String,
}

impl Finding {
    pub fn error(slide: Option<usize>, rule: RuleId, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            slide,
            rule,
            message: message.into(),
        }
    }

    pub fn warning(slide: Option<usize>, rule: RuleId, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            slide,
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slide {
            Some(index) => write!(
                f,
                "{} [{}] slide {}: {}",
                self.severity,
                self.rule,
                index + 1,
                self.message
            ),
            None => write!(f, "{} [{}] deck: {}", self.severity, self.rule, self.message),
        }
    }
}

/// Outcome of validating a deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    fn new(mut findings: Vec<Finding>) -> Self {
        // Deck-level first (None < Some), then by slide, rule, message.
        findings.sort_by(|a, b| {
            a.slide
                .cmp(&b.slide)
                .then(a.rule.cmp(&b.rule))
                .then(a.severity.cmp(&b.severity))
                .then(a.message.cmp(&b.message))
        });
        Self { findings }
    }

    /// True when at least one finding is an error.
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    /// Findings attached to one slide.
    pub fn for_slide(&self, index: usize) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.slide == Some(index))
    }

    /// Findings produced by one rule.
    pub fn by_rule(&self, rule: RuleId) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.rule == rule)
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Check a deck against a rule set.
pub fn validate(deck: &Deck, rules: &RuleSet) -> ValidationReport {
    let mut findings = Vec::new();

    check_parse_defects(deck, rules, &mut findings);
    check_slide_limits(deck, rules, &mut findings);
    check_media_paths(deck, &mut findings);
    check_required_substrings(deck, rules, &mut findings);
    check_forbidden_substrings(deck, rules, &mut findings);
    check_ordered_markers(deck, rules, &mut findings);

    if let Some(predicate) = &rules.first_slide_must_contain {
        check_boundary_slide(deck, 0, predicate, RuleId::FirstSlide, "first", &mut findings);
    }
    if let Some(predicate) = &rules.last_slide_must_contain {
        let last = deck.len().saturating_sub(1);
        check_boundary_slide(deck, last, predicate, RuleId::LastSlide, "last", &mut findings);
    }

    let report = ValidationReport::new(findings);
    log::debug!(
        "Validated {} slides: {} errors, {} warnings",
        deck.len(),
        report.error_count(),
        report.warning_count()
    );
    report
}

fn check_parse_defects(deck: &Deck, rules: &RuleSet, findings: &mut Vec<Finding>) {
    let severity = if rules.escalate_parse_defects {
        Severity::Error
    } else {
        Severity::Warning
    };

    for slide in &deck.slides {
        for defect in &slide.defects {
            let (rule, message) = match defect {
                ParseDefect::EmptySlide => (RuleId::EmptySlide, "slide is empty".to_string()),
                ParseDefect::UnterminatedFence { line } => (
                    RuleId::UnterminatedFence,
                    format!(
                        "code fence opened on line {} is never closed",
                        slide.start_line + line - 1
                    ),
                ),
            };
            findings.push(Finding {
                severity,
                slide: Some(slide.index),
                rule,
                message,
            });
        }
    }
}

fn check_slide_limits(deck: &Deck, rules: &RuleSet, findings: &mut Vec<Finding>) {
    for slide in &deck.slides {
        let lines = slide.content_line_count();
        if lines > rules.max_content_lines_per_slide {
            findings.push(Finding::error(
                Some(slide.index),
                RuleId::MaxContentLines,
                format!(
                    "{} content lines exceeds the limit of {}",
                    lines, rules.max_content_lines_per_slide
                ),
            ));
        }

        let limits = [
            (1, rules.max_heading_level1_per_slide, RuleId::MaxH1),
            (2, rules.max_heading_level2_per_slide, RuleId::MaxH2),
        ];
        for (level, max, rule) in limits {
            let count = slide.heading_count(level);
            if count > max {
                findings.push(Finding::error(
                    Some(slide.index),
                    rule,
                    format!("{} level-{} headings exceeds the limit of {}", count, level, max),
                ));
            }
        }
    }
}

fn check_media_paths(deck: &Deck, findings: &mut Vec<Finding>) {
    for slide in &deck.slides {
        for media in slide.media_refs.iter().filter(|m| !m.is_remote()) {
            if media.absolute {
                findings.push(Finding::error(
                    Some(slide.index),
                    RuleId::AbsoluteMediaPath,
                    format!("image path '{}' is absolute", media.path),
                ));
            } else if media.has_platform_separator() {
                findings.push(Finding::error(
                    Some(slide.index),
                    RuleId::AbsoluteMediaPath,
                    format!("image path '{}' uses a backslash separator", media.path),
                ));
            }
        }
    }
}

fn check_required_substrings(deck: &Deck, rules: &RuleSet, findings: &mut Vec<Finding>) {
    if rules.required_substrings.is_empty() {
        return;
    }

    // Front matter counts as part of the deck text.
    let mut text = deck
        .front_matter
        .as_ref()
        .map(|fm| fm.raw.clone())
        .unwrap_or_default();
    text.extend(deck.slides.iter().map(|s| s.raw_text.as_str()));

    for needle in &rules.required_substrings {
        if !text.contains(needle.as_str()) {
            findings.push(Finding::error(
                None,
                RuleId::RequiredSubstring,
                format!("required text '{}' not found", needle),
            ));
        }
    }
}

fn check_forbidden_substrings(deck: &Deck, rules: &RuleSet, findings: &mut Vec<Finding>) {
    for slide in &deck.slides {
        for needle in &rules.forbidden_substrings {
            if needle.is_empty() {
                continue;
            }
            if slide.raw_text.contains(needle.as_str()) {
                findings.push(Finding::error(
                    Some(slide.index),
                    RuleId::ForbiddenSubstring,
                    format!("forbidden text '{}' present", needle),
                ));
            }
        }
    }
}

/// Walk the markers in order. Each search starts at the slide where the
/// previous marker matched. A marker found only earlier than that is out of
/// order; a marker found nowhere is missing and leaves the position as is.
fn check_ordered_markers(deck: &Deck, rules: &RuleSet, findings: &mut Vec<Finding>) {
    let mut position = 0;
    let mut last_matched: Option<(&str, usize)> = None;

    for marker in &rules.required_ordered_markers {
        let contains = |slide: &&Slide| slide.raw_text.contains(marker.as_str());

        if let Some(slide) = deck.slides[position..].iter().find(contains) {
            position = slide.index;
            last_matched = Some((marker.as_str(), slide.index));
            continue;
        }

        match (deck.slides.iter().find(contains), last_matched) {
            (Some(slide), Some((previous, previous_index))) => {
                findings.push(Finding::error(
                    Some(slide.index),
                    RuleId::MarkerOutOfOrder,
                    format!(
                        "'{}' (slide {}) appears before '{}' (slide {})",
                        marker,
                        slide.number(),
                        previous,
                        previous_index + 1
                    ),
                ));
            }
            _ => {
                findings.push(Finding::error(
                    None,
                    RuleId::MissingOrderedMarker,
                    format!("ordered marker '{}' not found", marker),
                ));
            }
        }
    }
}

/// Test a predicate against a slide's source, which for the first slide
/// includes the front matter.
fn check_boundary_slide(
    deck: &Deck,
    index: usize,
    predicate: &SlidePredicate,
    rule: RuleId,
    which: &str,
    findings: &mut Vec<Finding>,
) {
    let Some(source) = deck.slide_source(index) else {
        return;
    };

    match predicate.test(&source) {
        Ok(true) => {}
        Ok(false) => findings.push(Finding::error(
            Some(index),
            rule,
            format!("{} slide must {}", which, predicate.describe()),
        )),
        Err(e) => findings.push(Finding::error(None, RuleId::InvalidPattern, e.to_string())),
    }
}
