//! Static HTML rendering of a deck.
//!
//! Each slide's source runs through a fixed, ordered [`Pipeline`] of
//! substitution rules. Later rules rely on earlier ones having fired (list
//! items become `<li>` before runs of them get wrapped), so the order is
//! part of the contract.
//!
//! Before any rule runs, fenced code and inline code spans are moved into
//! a side table and the remaining text is HTML-escaped. Rules therefore
//! match against escaped text (`&lt;img ...&gt;`) and only the markup they
//! generate is live HTML.

use crate::rules::{RuleSet, DEFAULT_MAX_CONTENT_LINES};
use crate::types::{CodeBlock, Deck, Slide};
use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

const FENCE_OPEN: char = '\u{E000}';
const FENCE_CLOSE: char = '\u{E001}';
const SPAN_OPEN: char = '\u{E002}';
const SPAN_CLOSE: char = '\u{E003}';

/// Fenced code, matched the same way the parser toggles fences: any line
/// starting with three backticks closes an open fence.
static FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*```([^\n]*)\n((?s:.*?))^[ \t]*```[^\n]*$").unwrap()
});

static SPAN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

static FRONT_MATTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)\A---\n.*?^---[ \t\r]*$\n?").unwrap());

static TWEET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"&lt;Tweet\s+id=["']?(\d+)["']?\s*/?&gt;"#).unwrap()
});

static DIRECTIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)&lt;!--\s*([A-Z][A-Z0-9_-]+(?:[ \t]+[A-Z0-9_-]+)*)\b(.*?)--&gt;").unwrap()
});

static COMMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)&lt;!--.*?--&gt;").unwrap());

static HTML_IMAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"&lt;img\b[^\n]*?\bsrc\s*=\s*["']([^"']+)["'][^\n]*?&gt;"#).unwrap()
});

static MARKDOWN_IMAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[([^\]\n]*)\]\(\s*([^)\s]+)(?:\s+"[^"\n]*")?\s*\)"#).unwrap()
});

static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,3}) +(.*?)(?:[ \t]+#+)?[ \t]*$").unwrap());

static BOLD_STAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").unwrap());

static BOLD_UNDERSCORE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_\n]+?)__").unwrap());

static ITALIC_STAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*\n]*?)\*").unwrap());

static ITALIC_UNDERSCORE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([^_\n]+?)_\b").unwrap());

static BULLET_ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+(.*)$").unwrap());

static NUMBERED_ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(\d+)[.)][ \t]+(.*)$").unwrap());

static BULLET_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^<li>.*</li>(?:\n|\z))+").unwrap());

static NUMBERED_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)(?:^<li value="\d+">.*</li>(?:\n|\z))+"#).unwrap());

static SHIELDED_FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").unwrap());

static SHIELDED_SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E002}(\\d+)\u{E003}").unwrap());

static LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\s]+)\)").unwrap());

/// Tags that start a block-level line; stage 10 leaves these unwrapped.
const BLOCK_TAGS: &[&str] = &[
    "<h1", "<h2", "<h3", "<ul", "</ul", "<ol", "</ol", "<li", "<pre", "<figure", "<div", "<aside",
];

/// Position of a rule in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    FrontMatter = 1,
    Embeds = 2,
    Media = 3,
    Headings = 4,
    Emphasis = 5,
    Lists = 6,
    CodeBlocks = 7,
    InlineCode = 8,
    Links = 9,
    Paragraphs = 10,
}

impl Stage {
    pub fn number(self) -> u8 {
        self as u8
    }
}

/// Which slides a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the slide that opens the deck.
    FirstSlide,
    EverySlide,
}

/// Code pulled out of a slide before escaping.
#[derive(Debug, Clone, Default)]
pub struct Shielded {
    pub blocks: Vec<CodeBlock>,
    pub spans: Vec<String>,
}

type BuildFn = fn(&Captures<'_>, &Shielded) -> String;

enum Transform {
    Replace {
        pattern: &'static Regex,
        build: BuildFn,
    },
    Lines(fn(&str) -> String),
}

/// One named substitution in the pipeline.
pub struct Rule {
    name: &'static str,
    stage: Stage,
    scope: Scope,
    transform: Transform,
}

impl Rule {
    fn replace(name: &'static str, stage: Stage, pattern: &'static Regex, build: BuildFn) -> Self {
        Self {
            name,
            stage,
            scope: Scope::EverySlide,
            transform: Transform::Replace { pattern, build },
        }
    }

    fn lines(name: &'static str, stage: Stage, transform: fn(&str) -> String) -> Self {
        Self {
            name,
            stage,
            scope: Scope::EverySlide,
            transform: Transform::Lines(transform),
        }
    }

    fn first_slide_only(mut self) -> Self {
        self.scope = Scope::FirstSlide;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Apply this rule to prepared (shielded and escaped) text.
    pub fn apply(&self, text: &str, shielded: &Shielded) -> String {
        match &self.transform {
            Transform::Replace { pattern, build } => pattern
                .replace_all(text, |caps: &Captures<'_>| build(caps, shielded))
                .into_owned(),
            Transform::Lines(transform) => transform(text),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Ordered list of rules turning slide markup into HTML.
#[derive(Debug)]
pub struct Pipeline {
    rules: Vec<Rule>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline {
    /// The fixed rule order used for every rendered deck.
    pub fn standard() -> Self {
        let rules = vec![
            Rule::replace("front-matter", Stage::FrontMatter, &FRONT_MATTER_REGEX, |_, _| {
                String::new()
            })
            .first_slide_only(),
            Rule::replace("tweet", Stage::Embeds, &TWEET_REGEX, build_tweet),
            Rule::replace("directive", Stage::Embeds, &DIRECTIVE_REGEX, build_directive),
            Rule::replace("comment", Stage::Embeds, &COMMENT_REGEX, |_, _| String::new()),
            Rule::replace("html-image", Stage::Media, &HTML_IMAGE_REGEX, |caps, _| {
                media_placeholder(&caps[1], "")
            }),
            Rule::replace("markdown-image", Stage::Media, &MARKDOWN_IMAGE_REGEX, |caps, _| {
                media_placeholder(&caps[2], &caps[1])
            }),
            Rule::replace("heading", Stage::Headings, &HEADING_REGEX, |caps, _| {
                let level = caps[1].len();
                format!("<h{level}>{}</h{level}>", &caps[2])
            }),
            Rule::replace("bold", Stage::Emphasis, &BOLD_STAR_REGEX, wrap_strong),
            Rule::replace("bold-underscore", Stage::Emphasis, &BOLD_UNDERSCORE_REGEX, wrap_strong),
            Rule::replace("italic", Stage::Emphasis, &ITALIC_STAR_REGEX, wrap_em),
            Rule::replace("italic-underscore", Stage::Emphasis, &ITALIC_UNDERSCORE_REGEX, wrap_em),
            Rule::replace("bullet-item", Stage::Lists, &BULLET_ITEM_REGEX, |caps, _| {
                format!("<li>{}</li>", &caps[1])
            }),
            Rule::replace("numbered-item", Stage::Lists, &NUMBERED_ITEM_REGEX, |caps, _| {
                format!("<li value=\"{}\">{}</li>", &caps[1], &caps[2])
            }),
            Rule::replace("bullet-list", Stage::Lists, &BULLET_RUN_REGEX, |caps, _| {
                wrap_items("ul", &caps[0])
            }),
            Rule::replace("numbered-list", Stage::Lists, &NUMBERED_RUN_REGEX, |caps, _| {
                wrap_items("ol", &caps[0])
            }),
            Rule::replace("code-block", Stage::CodeBlocks, &SHIELDED_FENCE_REGEX, build_code_block),
            Rule::replace("inline-code", Stage::InlineCode, &SHIELDED_SPAN_REGEX, build_code_span),
            Rule::replace("link", Stage::Links, &LINK_REGEX, |caps, _| {
                format!("<a href=\"{}\">{}</a>", escape_quotes(&caps[2]), &caps[1])
            }),
            Rule::lines("paragraph", Stage::Paragraphs, wrap_paragraphs),
        ];

        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule by name.
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Run every rule, in order, over one slide's source.
    pub fn apply(&self, source: &str, first_slide: bool) -> String {
        let (mut text, shielded) = prepare(source);

        for rule in &self.rules {
            if rule.scope == Scope::FirstSlide && !first_slide {
                continue;
            }
            text = rule.apply(&text, &shielded);
        }

        text.trim().to_string()
    }
}

/// Shield code, then escape what remains.
pub fn prepare(source: &str) -> (String, Shielded) {
    let source: String = source
        .replace("\r\n", "\n")
        .chars()
        .filter(|c| !matches!(*c, FENCE_OPEN | FENCE_CLOSE | SPAN_OPEN | SPAN_CLOSE))
        .collect();

    let mut shielded = Shielded::default();

    let text = FENCE_REGEX.replace_all(&source, |caps: &Captures<'_>| {
        let body = caps[2].strip_suffix('\n').unwrap_or(&caps[2]);
        shielded.blocks.push(CodeBlock {
            language: caps[1].trim().to_string(),
            body: body.to_string(),
        });
        format!("{}{}{}", FENCE_OPEN, shielded.blocks.len() - 1, FENCE_CLOSE)
    });

    let text = SPAN_REGEX.replace_all(&text, |caps: &Captures<'_>| {
        shielded.spans.push(caps[1].to_string());
        format!("{}{}{}", SPAN_OPEN, shielded.spans.len() - 1, SPAN_CLOSE)
    });

    (escape_html(&text), shielded)
}

fn build_tweet(caps: &Captures<'_>, _: &Shielded) -> String {
    format!(
        "<div class=\"embed embed-tweet\" data-tweet-id=\"{id}\">Tweet {id}</div>",
        id = &caps[1]
    )
}

fn build_directive(caps: &Captures<'_>, _: &Shielded) -> String {
    let keyword = &caps[1];
    let detail = caps[2].split_whitespace().collect::<Vec<_>>().join(" ");
    let slug = keyword
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    let label = if detail.is_empty() {
        keyword.to_string()
    } else if detail.starts_with([':', ',', '.', ';']) {
        format!("{}{}", keyword, detail)
    } else {
        format!("{} {}", keyword, detail)
    };

    format!(
        "<aside class=\"directive\" data-directive=\"{}\">{}</aside>",
        inert(&slug),
        label
    )
}

/// Normalize an image path for output: forward slashes, no leading `./`.
pub fn resolve_media_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut resolved = path.as_str();
    while let Some(rest) = resolved.strip_prefix("./") {
        resolved = rest;
    }
    resolved.to_string()
}

fn media_placeholder(path: &str, alt: &str) -> String {
    let path = resolve_media_path(path);
    let alt_attr = if alt.is_empty() {
        String::new()
    } else {
        format!(" data-alt=\"{}\"", inert(alt))
    };
    let path = inert(&path);
    format!(
        "<figure class=\"media\" data-src=\"{}\"{}><span class=\"media-path\">{}</span></figure>",
        path, alt_attr, path
    )
}

fn wrap_strong(caps: &Captures<'_>, _: &Shielded) -> String {
    format!("<strong>{}</strong>", &caps[1])
}

fn wrap_em(caps: &Captures<'_>, _: &Shielded) -> String {
    format!("<em>{}</em>", &caps[1])
}

fn wrap_items(tag: &str, items: &str) -> String {
    let items = items.strip_suffix('\n').unwrap_or(items);
    format!("<{tag}>\n{items}\n</{tag}>\n")
}

fn build_code_block(caps: &Captures<'_>, shielded: &Shielded) -> String {
    let Some(block) = caps[1]
        .parse::<usize>()
        .ok()
        .and_then(|i| shielded.blocks.get(i))
    else {
        return String::new();
    };

    let class = block
        .language
        .split_whitespace()
        .next()
        .map(|lang| format!(" class=\"language-{}\"", escape_quotes(&escape_html(lang))))
        .unwrap_or_default();

    // One line per block so the paragraph stage sees a single block element.
    let body = escape_code(&block.body).replace('\n', "&#10;");
    format!("<pre><code{}>{}</code></pre>", class, body)
}

fn build_code_span(caps: &Captures<'_>, shielded: &Shielded) -> String {
    caps[1]
        .parse::<usize>()
        .ok()
        .and_then(|i| shielded.spans.get(i))
        .map(|span| format!("<code>{}</code>", escape_code(span)))
        .unwrap_or_default()
}

/// Group loose lines into `<p>` elements, leaving block lines alone.
fn wrap_paragraphs(text: &str) -> String {
    let mut output: Vec<String> = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    fn flush(paragraph: &mut Vec<&str>, output: &mut Vec<String>) {
        if !paragraph.is_empty() {
            output.push(format!("<p>{}</p>", paragraph.join("\n")));
            paragraph.clear();
        }
    }

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush(&mut paragraph, &mut output);
        } else if BLOCK_TAGS.iter().any(|tag| line.starts_with(tag)) {
            flush(&mut paragraph, &mut output);
            output.push(line.to_string());
        } else {
            paragraph.push(line);
        }
    }
    flush(&mut paragraph, &mut output);

    output.join("\n")
}

/// Escape text for HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape double quotes for attribute values built from escaped text.
fn escape_quotes(text: &str) -> String {
    text.replace('"', "&quot;")
}

/// Encode generated attribute values and placeholder text so the emphasis
/// and link stages, which run later, leave them alone.
fn inert(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => encoded.push_str("&quot;"),
            '*' => encoded.push_str("&#42;"),
            '_' => encoded.push_str("&#95;"),
            '[' => encoded.push_str("&#91;"),
            _ => encoded.push(c),
        }
    }
    encoded
}

/// Escape restored code. `[` is encoded too so the link stage, which runs
/// after code is restored, cannot reach into it.
fn escape_code(text: &str) -> String {
    escape_html(text).replace('[', "&#91;")
}

const DOCUMENT_STYLE: &str = "\
body { margin: 0; background: #f4f4f5; font-family: system-ui, sans-serif; color: #18181b; }
.deck { max-width: 960px; margin: 0 auto; padding: 2rem 1rem; }
.slide { position: relative; background: #fff; border-radius: 8px; margin: 0 0 2rem; padding: 2rem 3rem; box-shadow: 0 1px 3px rgba(0,0,0,.15); }
.slide::before { content: attr(data-slide); position: absolute; top: .5rem; right: 1rem; color: #a1a1aa; font-size: .8rem; }
.advisory { background: #fef3c7; border: 1px solid #f59e0b; padding: .5rem 1rem; margin-bottom: 1rem; font-size: .9rem; }
.directive { background: #e0f2fe; border-left: 4px solid #0284c7; padding: .5rem 1rem; }
.embed, .media { border: 1px dashed #a1a1aa; padding: 1rem; margin: 1rem 0; color: #52525b; font-family: monospace; }
pre { background: #18181b; color: #f4f4f5; padding: 1rem; overflow-x: auto; }
";

/// Renders a deck to a standalone HTML document.
#[derive(Debug)]
pub struct Renderer {
    pipeline: Pipeline,
    max_content_lines: usize,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            pipeline: Pipeline::standard(),
            max_content_lines: DEFAULT_MAX_CONTENT_LINES,
        }
    }
}

impl Renderer {
    /// Create a renderer with the standard pipeline and default length limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the length limit from a rule set, so rendered banners agree
    /// with lint findings.
    pub fn with_rules(mut self, rules: &RuleSet) -> Self {
        self.max_content_lines = rules.max_content_lines_per_slide;
        self
    }

    pub fn with_max_content_lines(mut self, lines: usize) -> Self {
        self.max_content_lines = lines;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Render the whole deck.
    pub fn render(&self, deck: &Deck) -> String {
        let title = escape_html(deck.title().unwrap_or("Slides"));

        let sections = (0..deck.len())
            .filter_map(|i| self.render_slide(deck, i))
            .collect::<Vec<_>>()
            .join("\n");

        log::debug!("Rendered {} slides", deck.len());

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n<style>\n{DOCUMENT_STYLE}</style>\n</head>\n<body>\n\
             <main class=\"deck\">\n{sections}\n</main>\n</body>\n</html>\n"
        )
    }

    /// Render one slide as a `<section>`.
    pub fn render_slide(&self, deck: &Deck, index: usize) -> Option<String> {
        let slide = deck.slides.get(index)?;
        let source = deck.slide_source(index)?;
        let content = self.pipeline.apply(&source, index == 0);

        let mut section = format!(
            "<section class=\"slide\" id=\"slide-{n}\" data-slide=\"{n}\">\n",
            n = slide.number()
        );
        if let Some(banner) = self.advisory(slide) {
            section.push_str(&banner);
            section.push('\n');
        }
        if !content.is_empty() {
            section.push_str(&content);
            section.push('\n');
        }
        section.push_str("</section>");
        Some(section)
    }

    fn advisory(&self, slide: &Slide) -> Option<String> {
        let lines = slide.content_line_count();
        (lines > self.max_content_lines).then(|| {
            format!(
                "<div class=\"advisory\">Slide {} has {} content lines (limit {})</div>",
                slide.number(),
                lines,
                self.max_content_lines
            )
        })
    }
}

/// Render a deck with the default renderer.
pub fn render(deck: &Deck) -> String {
    Renderer::new().render(deck)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run_rule(name: &str, text: &str) -> String {
        let pipeline = Pipeline::standard();
        let rule = pipeline.rule(name).expect("rule exists");
        rule.apply(text, &Shielded::default())
    }

    #[test]
    fn test_stages_are_in_order() {
        let pipeline = Pipeline::standard();
        let stages: Vec<u8> = pipeline.rules().iter().map(|r| r.stage().number()).collect();

        let mut sorted = stages.clone();
        sorted.sort();
        assert_eq!(stages, sorted);
        assert_eq!(stages.first(), Some(&1));
        assert_eq!(stages.last(), Some(&10));
        assert_eq!(pipeline.rule("front-matter").unwrap().scope(), Scope::FirstSlide);
    }

    #[test]
    fn test_prepare_escapes_and_shields() {
        let (text, shielded) = prepare("a < b & `x<y`\n```rust\nlet a = 1 < 2;\n```\n");

        assert!(text.starts_with("a &lt; b &amp; \u{E002}0\u{E003}"));
        assert!(text.contains("\u{E000}0\u{E001}"));
        assert_eq!(shielded.spans, vec!["x<y"]);
        assert_eq!(shielded.blocks[0].language, "rust");
        assert_eq!(shielded.blocks[0].body, "let a = 1 < 2;");
    }

    #[test]
    fn test_front_matter_rule() {
        assert_eq!(run_rule("front-matter", "---\ntitle: x\n---\n# Hi\n"), "# Hi\n");
        assert_eq!(run_rule("front-matter", "# Hi\n"), "# Hi\n");
    }

    #[test]
    fn test_tweet_rule() {
        assert_eq!(
            run_rule("tweet", "&lt;Tweet id=\"42\" /&gt;"),
            "<div class=\"embed embed-tweet\" data-tweet-id=\"42\">Tweet 42</div>"
        );
    }

    #[test]
    fn test_directive_and_comment_rules() {
        assert_eq!(
            run_rule("directive", "&lt;!-- LIVE DEMO: run it --&gt;"),
            "<aside class=\"directive\" data-directive=\"live-demo\">LIVE DEMO: run it</aside>"
        );
        assert_eq!(run_rule("comment", "a&lt;!-- notes --&gt;b"), "ab");
    }

    #[test]
    fn test_image_rules() {
        assert_eq!(
            run_rule("markdown-image", "![Chart](./img/chart.png)"),
            "<figure class=\"media\" data-src=\"img/chart.png\" data-alt=\"Chart\">\
             <span class=\"media-path\">img/chart.png</span></figure>"
        );
        assert_eq!(
            run_rule("html-image", "&lt;img src=\"img\\a.png\" width=\"200\" /&gt;"),
            "<figure class=\"media\" data-src=\"img/a.png\">\
             <span class=\"media-path\">img/a.png</span></figure>"
        );
    }

    #[test]
    fn test_heading_rule() {
        assert_eq!(
            run_rule("heading", "# One\n## Two ##\n### Three\n#### Four"),
            "<h1>One</h1>\n<h2>Two</h2>\n<h3>Three</h3>\n#### Four"
        );
        assert_eq!(
            run_rule("heading", "# Intro to C#\n## F# basics #"),
            "<h1>Intro to C#</h1>\n<h2>F# basics</h2>"
        );
    }

    #[test]
    fn test_emphasis_leaves_generated_attributes_alone() {
        let html = Pipeline::standard().apply("![**x** _y_](img/a_b_.png)\n", false);

        assert!(!html.contains("<strong>"), "{html}");
        assert!(!html.contains("<em>"), "{html}");
        assert!(html.contains("data-alt=\"&#42;&#42;x&#42;&#42; &#95;y&#95;\""));
        assert!(html.contains("data-src=\"img/a&#95;b&#95;.png\""));
        assert!(html.contains("<span class=\"media-path\">img/a&#95;b&#95;.png</span>"));
    }

    #[test]
    fn test_crlf_slides_render_like_lf() {
        let crlf = parse("---\r\ntitle: Win\r\n---\r\n# A\r\n- one\r\n---\r\n## B\r\n");
        let lf = parse("---\ntitle: Win\n---\n# A\n- one\n---\n## B\n");

        assert_eq!(crlf.len(), 2);
        assert_eq!(render(&crlf), render(&lf));
        assert!(!render(&crlf).contains("title: Win"));
    }

    #[test]
    fn test_emphasis_rules() {
        let text = run_rule("bold", "a **b** c");
        assert_eq!(text, "a <strong>b</strong> c");
        assert_eq!(run_rule("italic", "an *em* word"), "an <em>em</em> word");
        assert_eq!(run_rule("italic", "* item"), "* item");
        assert_eq!(run_rule("italic-underscore", "_em_ but snake_case_name"), "<em>em</em> but snake_case_name");
    }

    #[test]
    fn test_list_rules_wrap_runs() {
        let pipeline = Pipeline::standard();
        let shielded = Shielded::default();
        let mut text = "Intro\n- one\n- two\n\n1. first\n2. second\n".to_string();
        for name in ["bullet-item", "numbered-item", "bullet-list", "numbered-list"] {
            text = pipeline.rule(name).unwrap().apply(&text, &shielded);
        }

        assert_eq!(
            text,
            "Intro\n<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n\n\
             <ol>\n<li value=\"1\">first</li>\n<li value=\"2\">second</li>\n</ol>\n"
        );
    }

    #[test]
    fn test_link_rule() {
        assert_eq!(
            run_rule("link", "see [docs](https://example.com/a?b=1&amp;c=2)"),
            "see <a href=\"https://example.com/a?b=1&amp;c=2\">docs</a>"
        );
    }

    #[test]
    fn test_paragraph_rule() {
        assert_eq!(
            run_rule("paragraph", "<h1>T</h1>\nline one\nline two\n\nmore\n<ul>\n<li>x</li>\n</ul>"),
            "<h1>T</h1>\n<p>line one\nline two</p>\n<p>more</p>\n<ul>\n<li>x</li>\n</ul>"
        );
    }

    #[test]
    fn test_code_is_protected_from_markup_rules() {
        let pipeline = Pipeline::standard();
        let html = pipeline.apply(
            "```python\n# not a heading\nx = a * b * c  # [link](x)\n```\nuse `**raw**` here\n",
            false,
        );

        assert_eq!(
            html,
            "<pre><code class=\"language-python\"># not a heading&#10;x = a * b * c  # &#91;link](x)</code></pre>\n\
             <p>use <code>**raw**</code> here</p>"
        );
    }

    #[test]
    fn test_unterminated_fence_passes_through() {
        let html = Pipeline::standard().apply("```\nopen <b>\n", false);
        assert_eq!(html, "<p>```\nopen &lt;b&gt;</p>");
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = Pipeline::standard().apply("<script>alert(1)</script>\n", false);
        assert_eq!(html, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>");
    }

    #[test]
    fn test_front_matter_only_stripped_on_first_slide() {
        let deck = parse("---\ntitle: Deck <1>\n---\n# Welcome\n---\n## Next\n");
        let html = render(&deck);

        assert!(html.contains("<title>Deck &lt;1&gt;</title>"));
        assert!(!html.contains("title: Deck"));
        assert!(html.contains("<h1>Welcome</h1>"));
    }

    #[test]
    fn test_end_to_end_headings() {
        let deck = parse("# Title\n\n---\n## Second\ncontent\n");
        let html = render(&deck);

        assert_eq!(html.matches("<h1>Title</h1>").count(), 1);
        assert_eq!(html.matches("<h2>Second</h2>").count(), 1);
        let h1 = html.find("<h1>Title</h1>").unwrap();
        let h2 = html.find("<h2>Second</h2>").unwrap();
        assert!(h1 < h2);
        assert!(html.contains("<section class=\"slide\" id=\"slide-1\" data-slide=\"1\">"));
        assert!(html.contains("<section class=\"slide\" id=\"slide-2\" data-slide=\"2\">"));
        assert!(html.contains("<p>content</p>"));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn test_advisory_banner_uses_shared_threshold() {
        let long = (1..=4).map(|i| format!("line {}\n", i)).collect::<String>();
        let deck = parse(&format!("# T\n---\n{}", long));

        let html = Renderer::new().with_max_content_lines(3).render(&deck);
        assert_eq!(html.matches("class=\"advisory\"").count(), 1);
        assert!(html.contains("Slide 2 has 4 content lines (limit 3)"));

        let rules = RuleSet::new().with_max_content_lines(4);
        let html = Renderer::new().with_rules(&rules).render(&deck);
        assert_eq!(html.matches("class=\"advisory\"").count(), 0);
    }

    #[test]
    fn test_render_is_idempotent() {
        let deck = parse("# A\n- x\n- y\n---\n![i](img/a.png)\n<!-- LIVE DEMO -->\n");
        assert_eq!(render(&deck), render(&deck));
    }

    #[test]
    fn test_resolve_media_path() {
        assert_eq!(resolve_media_path("./img/a.png"), "img/a.png");
        assert_eq!(resolve_media_path("img\\b.png"), "img/b.png");
        assert_eq!(resolve_media_path("/abs/c.png"), "/abs/c.png");
    }
}
