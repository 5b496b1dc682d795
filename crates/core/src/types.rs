//! Domain types for a parsed slide deck.
//!
//! A [`Deck`] is built once by the parser and never mutated afterwards;
//! the validator and renderer only read it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The line that separates slides.
pub const SLIDE_DELIMITER: &str = "---\n";

/// The same line in a CRLF file.
pub const SLIDE_DELIMITER_CRLF: &str = "---\r\n";

/// An entire deck, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    /// Metadata block stripped from the head of the text, if any.
    pub front_matter: Option<FrontMatter>,

    /// Slides in presentation order. Never empty.
    pub slides: Vec<Slide>,

    /// Delimiter lines between consecutive slides, exactly as they appeared
    /// (`---\n` or `---\r\n`). One fewer than `slides`.
    #[serde(default)]
    pub delimiters: Vec<String>,
}

impl Deck {
    /// Number of slides.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// A parsed deck always holds at least one slide.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn first(&self) -> Option<&Slide> {
        self.slides.first()
    }

    pub fn last(&self) -> Option<&Slide> {
        self.slides.last()
    }

    /// Reassemble the original text from the front matter and slides.
    pub fn full_text(&self) -> String {
        let mut text = self
            .front_matter
            .as_ref()
            .map(|fm| fm.raw.clone())
            .unwrap_or_default();
        for (i, slide) in self.slides.iter().enumerate() {
            if i > 0 {
                let delimiter = self.delimiters.get(i - 1).map(String::as_str);
                text.push_str(delimiter.unwrap_or(SLIDE_DELIMITER));
            }
            text.push_str(&slide.raw_text);
        }
        text
    }

    /// Deck title: the front matter `title`, else the first level-1 heading.
    pub fn title(&self) -> Option<&str> {
        if let Some(title) = self.front_matter.as_ref().and_then(|fm| fm.get("title")) {
            if !title.is_empty() {
                return Some(title);
            }
        }

        self.slides
            .iter()
            .flat_map(|s| s.headings.iter())
            .find(|h| h.level == 1)
            .map(|h| h.text.as_str())
    }

    /// Source text of a slide as it appeared in the deck, with the front
    /// matter put back in front of the first slide.
    pub fn slide_source(&self, index: usize) -> Option<String> {
        let slide = self.slides.get(index)?;
        match (&self.front_matter, index) {
            (Some(fm), 0) => Some(format!("{}{}", fm.raw, slide.raw_text)),
            _ => Some(slide.raw_text.clone()),
        }
    }
}

/// Leading `key: value` metadata fenced by `---` lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Exact text of the block, fences included.
    pub raw: String,

    /// Top-level `key: value` pairs in source order.
    pub entries: Vec<(String, String)>,
}

impl FrontMatter {
    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A single slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// 0-based position in the deck.
    pub index: usize,

    /// 1-based line in the source where this slide starts.
    pub start_line: usize,

    /// Exact text between delimiters.
    pub raw_text: String,

    pub headings: Vec<Heading>,
    pub code_blocks: Vec<CodeBlock>,

    /// Verbatim directive comments such as `<!-- LIVE DEMO -->`.
    pub directives: BTreeSet<String>,

    pub embeds: Vec<Embed>,
    pub media_refs: Vec<MediaRef>,

    /// Structural problems found while parsing this slide.
    pub defects: Vec<ParseDefect>,
}

impl Slide {
    /// Create an empty slide at the given position.
    pub fn new(index: usize, start_line: usize, raw_text: impl Into<String>) -> Self {
        Self {
            index,
            start_line,
            raw_text: raw_text.into(),
            headings: Vec::new(),
            code_blocks: Vec::new(),
            directives: BTreeSet::new(),
            embeds: Vec::new(),
            media_refs: Vec::new(),
            defects: Vec::new(),
        }
    }

    /// 1-based number used in reports and rendered output.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Number of non-blank lines.
    ///
    /// The validator and renderer both measure slide length with this.
    pub fn content_line_count(&self) -> usize {
        self.raw_text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count()
    }

    /// True when the slide holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty()
    }

    /// Count headings at the given level.
    pub fn heading_count(&self, level: usize) -> usize {
        self.headings.iter().filter(|h| h.level == level).count()
    }
}

/// A `#`-style heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Number of leading hashes.
    pub level: usize,
    pub text: String,
}

/// A fenced code region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Info string after the opening fence; empty when absent.
    pub language: String,
    pub body: String,
}

/// Third-party embed tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub kind: EmbedKind,
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedKind {
    Tweet,
}

/// An image referenced from a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub path: String,
    pub kind: MediaKind,

    /// Whether the path is syntactically absolute.
    pub absolute: bool,
}

impl MediaRef {
    pub fn new(path: impl Into<String>, kind: MediaKind) -> Self {
        let path = path.into();
        let absolute = is_absolute_path(&path);
        Self {
            path,
            kind,
            absolute,
        }
    }

    /// Whether the path uses a Windows-style separator.
    pub fn has_platform_separator(&self) -> bool {
        self.path.contains('\\')
    }

    /// Whether the path points at a remote URL.
    pub fn is_remote(&self) -> bool {
        let lower = self.path.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
    }
}

/// How an image was referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// `<img src="...">`
    Html,
    /// `![alt](...)`
    Markdown,
}

/// A non-fatal problem attached to a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseDefect {
    /// The slide holds only whitespace.
    EmptySlide,

    /// A code fence opened on `line` (1-based within the slide) never closes.
    UnterminatedFence { line: usize },
}

/// Check whether a path is absolute on any common platform.
///
/// Protocol-relative and `http(s)` URLs are remote, not absolute.
pub fn is_absolute_path(path: &str) -> bool {
    if path.starts_with("//") {
        return false;
    }

    if path.starts_with('/') || path.starts_with('\\') || path.starts_with('~') {
        return true;
    }

    if path.to_ascii_lowercase().starts_with("file:") {
        return true;
    }

    // Drive letter, e.g. C:\ or C:/
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'\\' || bytes[2] == b'/')
}
