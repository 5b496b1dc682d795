//! Deck parser.
//!
//! Splits deck text into slides on `---` lines and pulls out per-slide
//! structure: headings, fenced code, directive comments, embeds, and
//! image references. Parsing never fails; malformed input yields slides
//! with recorded [`ParseDefect`]s instead.

use crate::types::{
    CodeBlock, Deck, Embed, EmbedKind, FrontMatter, Heading, MediaKind, MediaRef, ParseDefect,
    Slide, SLIDE_DELIMITER, SLIDE_DELIMITER_CRLF,
};
use regex::Regex;
use std::sync::LazyLock;

/// `# Heading` lines; the hash count is the level. A closing `#` run is
/// only dropped when whitespace separates it from the text (`C#` stays).
static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#+) (.*?)(?:[ \t]+#+)?[ \t]*$").unwrap());

/// Upper-case keyword comments such as `<!-- LIVE DEMO: ... -->`.
static DIRECTIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--\s*[A-Z][A-Z0-9_-]+(?:[ \t]+[A-Z0-9_-]+)*\b.*?-->").unwrap()
});

static TWEET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<Tweet\s+id=["']?(\d+)["']?\s*/?>"#).unwrap());

static HTML_IMAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["'][^>]*>"#).unwrap()
});

static MARKDOWN_IMAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[[^\]\n]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#).unwrap()
});

/// Top-level `key: value` line inside front matter.
static KEY_VALUE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][\w.-]*)\s*:(?:\s+(.*))?$").unwrap());

/// Parser for markdown slide decks.
#[derive(Debug, Clone, Default)]
pub struct DeckParser;

impl DeckParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse deck text into slides.
    pub fn parse(&self, text: &str) -> Deck {
        let (front_matter, body) = split_front_matter(text);

        let mut line = 1 + front_matter
            .as_ref()
            .map(|fm| fm.raw.matches('\n').count())
            .unwrap_or(0);

        let (segments, delimiters) = split_slides(body);

        let mut slides = Vec::new();
        for (index, segment) in segments.into_iter().enumerate() {
            let slide = parse_slide(index, line, segment);
            log::debug!(
                "Slide {} (line {}): {} headings, {} code blocks, {} media refs",
                slide.number(),
                slide.start_line,
                slide.headings.len(),
                slide.code_blocks.len(),
                slide.media_refs.len()
            );
            // Skip past the segment and its delimiter line.
            line += segment.matches('\n').count() + 1;
            slides.push(slide);
        }

        Deck {
            front_matter,
            slides,
            delimiters,
        }
    }
}

/// Parse deck text with the default parser.
pub fn parse(text: &str) -> Deck {
    DeckParser::new().parse(text)
}

/// Split text on delimiter lines, returning the segments and the
/// delimiters between them. Always returns at least one segment.
fn split_slides(body: &str) -> (Vec<&str>, Vec<String>) {
    let mut segments = Vec::new();
    let mut delimiters = Vec::new();
    let mut start = 0;
    let mut line_start = 0;

    loop {
        let rest = &body[line_start..];
        if let Some(delimiter) = delimiter_at(rest) {
            segments.push(&body[start..line_start]);
            delimiters.push(delimiter.to_string());
            start = line_start + delimiter.len();
            line_start = start;
            continue;
        }

        match rest.find('\n') {
            Some(offset) => line_start += offset + 1,
            None => break,
        }
    }

    segments.push(&body[start..]);
    (segments, delimiters)
}

fn delimiter_at(text: &str) -> Option<&'static str> {
    [SLIDE_DELIMITER, SLIDE_DELIMITER_CRLF]
        .into_iter()
        .find(|d| text.starts_with(d))
}

/// Detach a leading `---` fenced metadata block.
///
/// Only recognized when every line inside looks like YAML metadata and at
/// least one `key: value` entry is present; otherwise the text is left
/// alone and the leading `---` acts as an ordinary delimiter.
fn split_front_matter(text: &str) -> (Option<FrontMatter>, &str) {
    let Some(opening) = delimiter_at(text) else {
        return (None, text);
    };
    let rest = &text[opening.len()..];

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let content = line.trim_end_matches('\n').trim_end_matches('\r');

        if content == "---" {
            let end = opening.len() + offset + line.len();
            let entries = parse_entries(&rest[..offset]);
            if entries.is_empty() {
                return (None, text);
            }
            let front_matter = FrontMatter {
                raw: text[..end].to_string(),
                entries,
            };
            return (Some(front_matter), &text[end..]);
        }

        if !is_metadata_line(content) {
            return (None, text);
        }
        offset += line.len();
    }

    (None, text)
}

fn is_metadata_line(line: &str) -> bool {
    line.trim().is_empty()
        || line.starts_with([' ', '\t', '#'])
        || line.starts_with("- ")
        || KEY_VALUE_REGEX.is_match(line)
}

fn parse_entries(block: &str) -> Vec<(String, String)> {
    block
        .lines()
        .filter_map(|line| KEY_VALUE_REGEX.captures(line))
        .map(|caps| {
            let key = caps[1].to_string();
            let value = caps.get(2).map(|m| unquote(m.as_str().trim())).unwrap_or_default();
            (key, value)
        })
        .collect()
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

/// An open code fence while scanning a slide.
struct OpenFence<'a> {
    line: usize,
    language: String,
    body: Vec<&'a str>,
}

/// Extract structure from one slide segment.
fn parse_slide(index: usize, start_line: usize, raw: &str) -> Slide {
    let mut slide = Slide::new(index, start_line, raw);

    if slide.is_blank() {
        log::warn!("Slide {} (line {}) is empty", slide.number(), start_line);
        slide.defects.push(ParseDefect::EmptySlide);
    }

    // Text outside code fences; media and directives are only looked for here.
    let mut prose = String::with_capacity(raw.len());
    let mut fence: Option<OpenFence> = None;

    for (i, line) in raw.lines().enumerate() {
        if let Some(info) = line.trim_start().strip_prefix("```") {
            match fence.take() {
                Some(open) => slide.code_blocks.push(CodeBlock {
                    language: open.language,
                    body: open.body.join("\n"),
                }),
                None => {
                    fence = Some(OpenFence {
                        line: i + 1,
                        language: info.trim().to_string(),
                        body: Vec::new(),
                    })
                }
            }
            continue;
        }

        if let Some(open) = fence.as_mut() {
            open.body.push(line);
            continue;
        }

        if let Some(caps) = HEADING_REGEX.captures(line) {
            slide.headings.push(Heading {
                level: caps[1].len(),
                text: caps[2].trim().to_string(),
            });
        }

        prose.push_str(line);
        prose.push('\n');
    }

    if let Some(open) = fence {
        log::warn!(
            "Slide {}: code fence opened on line {} is never closed",
            slide.number(),
            start_line + open.line - 1
        );
        slide
            .defects
            .push(ParseDefect::UnterminatedFence { line: open.line });
    }

    slide.directives = DIRECTIVE_REGEX
        .find_iter(&prose)
        .map(|m| m.as_str().to_string())
        .collect();

    slide.embeds = TWEET_REGEX
        .captures_iter(&prose)
        .map(|caps| Embed {
            kind: EmbedKind::Tweet,
            id: caps[1].to_string(),
        })
        .collect();

    slide.media_refs = extract_media(&prose);
    slide
}

/// Collect image references from both syntaxes in source order.
fn extract_media(text: &str) -> Vec<MediaRef> {
    let html = HTML_IMAGE_REGEX.captures_iter(text).map(|caps| {
        let start = caps.get(0).map_or(0, |m| m.start());
        (start, MediaRef::new(&caps[1], MediaKind::Html))
    });
    let markdown = MARKDOWN_IMAGE_REGEX.captures_iter(text).map(|caps| {
        let start = caps.get(0).map_or(0, |m| m.start());
        (start, MediaRef::new(&caps[1], MediaKind::Markdown))
    });

    let mut found: Vec<(usize, MediaRef)> = html.chain(markdown).collect();
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, media)| media).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_two_slides() {
        let deck = parse("# Title\n\n---\n## Second\ncontent\n");

        assert_eq!(deck.len(), 2);
        assert_eq!(deck.slides[0].raw_text, "# Title\n\n");
        assert_eq!(deck.slides[1].raw_text, "## Second\ncontent\n");
        assert_eq!(deck.slides[0].start_line, 1);
        assert_eq!(deck.slides[1].start_line, 4);
    }

    #[test]
    fn test_delimiter_must_be_whole_line() {
        let deck = parse("a ---\nb\n----\nc\n");
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn test_keeps_empty_segments() {
        let deck = parse("---\n# A\n---\n---\n");

        assert_eq!(deck.len(), 4);
        assert_eq!(deck.slides[0].raw_text, "");
        assert_eq!(deck.slides[2].raw_text, "");
        assert_eq!(deck.slides[3].raw_text, "");
        assert_eq!(deck.slides[0].defects, vec![ParseDefect::EmptySlide]);
        assert!(deck.slides[1].defects.is_empty());
    }

    #[test]
    fn test_empty_input_yields_one_slide() {
        let deck = parse("");
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.slides[0].defects, vec![ParseDefect::EmptySlide]);
    }

    #[test]
    fn test_front_matter_is_detached() {
        let text = "---\ntheme: seriph\ntitle: \"Intro to Rust\"\n---\n# Welcome\n---\n# Next\n";
        let deck = parse(text);

        let fm = deck.front_matter.as_ref().expect("front matter");
        assert_eq!(fm.raw, "---\ntheme: seriph\ntitle: \"Intro to Rust\"\n---\n");
        assert_eq!(fm.get("title"), Some("Intro to Rust"));
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.slides[0].raw_text, "# Welcome\n");
        assert_eq!(deck.slides[0].start_line, 5);
        assert_eq!(deck.full_text(), text);
    }

    #[test]
    fn test_non_metadata_block_is_not_front_matter() {
        let deck = parse("---\n# Heading\n---\nbody\n");

        assert!(deck.front_matter.is_none());
        assert_eq!(deck.len(), 3);
        assert!(deck.slides[0].is_blank());
    }

    #[test]
    fn test_headings_and_levels() {
        let deck = parse("# One\n## Two ##\n### Three\n#no-space\n");
        let headings = &deck.slides[0].headings;

        assert_eq!(headings.len(), 3);
        assert_eq!(headings[0], Heading { level: 1, text: "One".into() });
        assert_eq!(headings[1], Heading { level: 2, text: "Two".into() });
        assert_eq!(headings[2].level, 3);
    }

    #[test]
    fn test_heading_keeps_attached_hash() {
        let deck = parse("# Intro to C#\n## F# basics ##\n### Closed #\n");
        let headings = &deck.slides[0].headings;

        assert_eq!(headings[0].text, "Intro to C#");
        assert_eq!(headings[1].text, "F# basics");
        assert_eq!(headings[2].text, "Closed");
    }

    #[test]
    fn test_crlf_delimiters() {
        let text = "---\r\ntitle: Win\r\n---\r\n# A\r\n---\r\n# B\r\n---\n# C\n";
        let deck = parse(text);

        assert_eq!(deck.front_matter.as_ref().and_then(|fm| fm.get("title")), Some("Win"));
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.slides[0].raw_text, "# A\r\n");
        assert_eq!(deck.slides[1].headings[0].text, "B");
        assert_eq!(deck.delimiters, vec!["---\r\n", "---\n"]);
        assert_eq!(deck.full_text(), text);
    }

    #[test]
    fn test_code_blocks_hide_headings() {
        let deck = parse("# Real\n```python\n# comment\nprint(1)\n```\n");
        let slide = &deck.slides[0];

        assert_eq!(slide.headings.len(), 1);
        assert_eq!(
            slide.code_blocks,
            vec![CodeBlock {
                language: "python".into(),
                body: "# comment\nprint(1)".into(),
            }]
        );
        assert!(slide.defects.is_empty());
    }

    #[test]
    fn test_unterminated_fence_is_a_defect() {
        let deck = parse("# A\n```\nopen\n---\n# B\n```js\nok\n```\n");

        assert_eq!(
            deck.slides[0].defects,
            vec![ParseDefect::UnterminatedFence { line: 2 }]
        );
        assert!(deck.slides[0].code_blocks.is_empty());
        assert!(deck.slides[1].defects.is_empty());
        assert_eq!(deck.slides[1].code_blocks.len(), 1);
    }

    #[test]
    fn test_directives() {
        let deck = parse("<!-- LIVE DEMO: run estimate.py -->\n<!-- speaker note -->\n");
        let directives: Vec<_> = deck.slides[0].directives.iter().cloned().collect();

        assert_eq!(directives, vec!["<!-- LIVE DEMO: run estimate.py -->"]);
    }

    #[test]
    fn test_embeds() {
        let deck = parse("<Tweet id=\"1234567890\" />\n");
        assert_eq!(
            deck.slides[0].embeds,
            vec![Embed { kind: EmbedKind::Tweet, id: "1234567890".into() }]
        );
    }

    #[test]
    fn test_media_refs_in_source_order() {
        let deck = parse(
            "![chart](./img/chart.png)\n<img src=\"/abs/photo.jpg\" width=\"300\">\n![x](img\\win.png \"t\")\n",
        );
        let media = &deck.slides[0].media_refs;

        assert_eq!(media.len(), 3);
        assert_eq!(media[0].path, "./img/chart.png");
        assert_eq!(media[0].kind, MediaKind::Markdown);
        assert!(!media[0].absolute);
        assert_eq!(media[1].path, "/abs/photo.jpg");
        assert_eq!(media[1].kind, MediaKind::Html);
        assert!(media[1].absolute);
        assert!(media[2].has_platform_separator());
    }

    #[test]
    fn test_media_inside_code_is_ignored() {
        let deck = parse("```md\n![x](/abs.png)\n```\n");
        assert!(deck.slides[0].media_refs.is_empty());
    }
}
