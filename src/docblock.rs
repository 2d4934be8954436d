//! @ai:module:intent Split raw comment text into a description and an ordered list of DSL tags
//! @ai:module:layer domain
//! @ai:module:public_api Docblock, RawTag, Decorator, Tokenized, tokenize
//! @ai:module:depends_on error
//! @ai:module:stateless true

use crate::error::Origin;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TAG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z][\w-]*)(.*)$").expect("Invalid regex"));

static DECORATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((?::[A-Za-z]\w*)+)").expect("Invalid regex"));

/// Doc tags of common doc-comment dialects; any other `@word` before the first tag is prose
const FOREIGN_DOC_TAGS: &[&str] = &[
    "abstract", "access", "author", "category", "copyright", "deprecated", "example", "final",
    "global", "ignore", "inheritdoc", "internal", "license", "link", "method", "override",
    "package", "param", "property", "return", "returns", "see", "since", "static", "throws",
    "todo", "type", "uses", "var", "version",
];

/// @ai:intent Raw comment text plus where it came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Docblock {
    pub text: String,
    pub origin: Origin,
}

impl Docblock {
    pub fn new(text: impl Into<String>, origin: Origin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }
}

/// @ai:intent Colon-prefixed modifiers that can follow a tag name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decorator {
    Private,
    Public,
    Deprecated,
    Alias,
}

impl Decorator {
    /// @ai:example ("private") -> Some(Private)
    /// @ai:example ("hidden") -> None
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "private" => Some(Decorator::Private),
            "public" => Some(Decorator::Public),
            "deprecated" => Some(Decorator::Deprecated),
            "alias" => Some(Decorator::Alias),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Decorator::Private => "private",
            Decorator::Public => "public",
            Decorator::Deprecated => "deprecated",
            Decorator::Alias => "alias",
        }
    }
}

/// @ai:intent One DSL tag as written, before any tag-specific parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTag {
    /// Tag name with the DSL prefix removed (`path`, `queryparam`, ...)
    pub name: String,
    pub decorators: Vec<Decorator>,
    pub unknown_decorators: Vec<String>,
    pub content: String,
}

impl RawTag {
    pub fn has_decorator(&self, decorator: Decorator) -> bool {
        self.decorators.contains(&decorator)
    }
}

/// @ai:intent Result of tokenizing one docblock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokenized {
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub tags: Vec<RawTag>,
}

/// @ai:intent Tokenize a docblock, keeping only tags under `prefix`
/// @ai:pre prefix has no trailing dash (e.g. "api")
/// @ai:post tags are in declaration order; foreign tags and their continuation lines are dropped
/// @ai:effects pure
pub fn tokenize(docblock: &Docblock, prefix: &str) -> Tokenized {
    let dsl_prefix = format!("{}-", prefix);
    let mut description: Vec<String> = Vec::new();
    let mut tags: Vec<RawTag> = Vec::new();
    let mut seen_tag = false;
    // Continuation lines attach to the last DSL tag; `false` swallows a foreign tag's lines.
    let mut collecting = false;

    for line in docblock.text.lines().map(strip_comment_markers) {
        if let Some(captures) = TAG_LINE
            .captures(line)
            .filter(|c| seen_tag || is_tag_name(&c[1], &dsl_prefix))
        {
            seen_tag = true;
            let name = &captures[1];
            let rest = &captures[2];

            match name.strip_prefix(&dsl_prefix) {
                Some(kind) if !kind.is_empty() => {
                    tags.push(split_decorators(kind, rest));
                    collecting = true;
                }
                _ => collecting = false,
            }
            continue;
        }

        if !seen_tag {
            description.push(line.to_string());
        } else if collecting {
            if let Some(tag) = tags.last_mut() {
                tag.content.push('\n');
                tag.content.push_str(line);
            }
        }
    }

    for tag in &mut tags {
        tag.content = tag.content.trim().to_string();
    }

    let (short_description, long_description) = split_description(&description);

    Tokenized {
        short_description,
        long_description,
        tags,
    }
}

fn is_tag_name(name: &str, dsl_prefix: &str) -> bool {
    name.starts_with(dsl_prefix) || FOREIGN_DOC_TAGS.contains(&name.to_ascii_lowercase().as_str())
}

/// @ai:intent Peel the leading `:word` run off a tag's remainder
/// @ai:example ("path", ":private:alias /movies") -> decorators [Private, Alias], content "/movies"
/// @ai:effects pure
fn split_decorators(name: &str, rest: &str) -> RawTag {
    let mut decorators = Vec::new();
    let mut unknown_decorators = Vec::new();
    let mut content = rest;

    if let Some(run) = DECORATOR_RUN.find(rest) {
        for word in run.as_str().split(':').filter(|w| !w.is_empty()) {
            match Decorator::from_name(word) {
                Some(decorator) => {
                    if !decorators.contains(&decorator) {
                        decorators.push(decorator);
                    }
                }
                None => unknown_decorators.push(word.to_string()),
            }
        }
        content = &rest[run.end()..];
    }

    RawTag {
        name: name.to_string(),
        decorators,
        unknown_decorators,
        content: content.trim().to_string(),
    }
}

/// @ai:intent Remove comment delimiters so both `/** */` and line-comment text tokenizes the same
/// @ai:effects pure
fn strip_comment_markers(line: &str) -> &str {
    let mut line = line.trim();

    if let Some(rest) = line.strip_prefix("/**") {
        line = rest;
    } else if let Some(rest) = line.strip_prefix("/*") {
        line = rest;
    }
    if let Some(rest) = line.strip_suffix("*/") {
        line = rest;
    }
    for prefix in ["///", "//!", "//", "*", "#"] {
        if let Some(rest) = line.trim_start().strip_prefix(prefix) {
            line = rest;
            break;
        }
    }

    line.trim()
}

/// @ai:intent First paragraph is the short description, the remainder the long one
/// @ai:effects pure
fn split_description(lines: &[String]) -> (Option<String>, Option<String>) {
    let mut paragraphs: Vec<Vec<&str>> = vec![Vec::new()];

    for line in lines {
        if line.is_empty() {
            if paragraphs.last().map(|p| !p.is_empty()).unwrap_or(false) {
                paragraphs.push(Vec::new());
            }
        } else if let Some(paragraph) = paragraphs.last_mut() {
            paragraph.push(line);
        }
    }
    paragraphs.retain(|p| !p.is_empty());

    let mut iter = paragraphs.into_iter();
    let short = iter.next().map(|p| p.join(" "));
    let long = iter.map(|p| p.join("\n")).collect::<Vec<_>>().join("\n\n");

    (short, if long.is_empty() { None } else { Some(long) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str) -> Docblock {
        Docblock::new(text, Origin::method("MovieController", "GET"))
    }

    #[test]
    fn test_tokenize_description_and_tags() {
        let tokens = tokenize(
            &block(
                "/**\n * Get a single movie.\n *\n * Returns everything we know.\n *\n * @api-group Movies\n * @api-path /movies/{id}\n */",
            ),
            "api",
        );

        assert_eq!(tokens.short_description.as_deref(), Some("Get a single movie."));
        assert_eq!(
            tokens.long_description.as_deref(),
            Some("Returns everything we know.")
        );
        assert_eq!(tokens.tags.len(), 2);
        assert_eq!(tokens.tags[0].name, "group");
        assert_eq!(tokens.tags[0].content, "Movies");
        assert_eq!(tokens.tags[1].content, "/movies/{id}");
    }

    #[test]
    fn test_foreign_tags_are_ignored() {
        let tokens = tokenize(
            &block("@param int $id\n  continued\n@api-scope public\n@return void"),
            "api",
        );

        assert_eq!(tokens.tags.len(), 1);
        assert_eq!(tokens.tags[0].name, "scope");
        assert_eq!(tokens.tags[0].content, "public");
    }

    #[test]
    fn test_mentions_stay_in_the_description() {
        let tokens = tokenize(
            &block("Get a single movie.\n\nAsk\n@movies-team before changing this.\n@api-group Movies"),
            "api",
        );

        assert_eq!(
            tokens.long_description.as_deref(),
            Some("Ask\n@movies-team before changing this.")
        );
        assert_eq!(tokens.tags.len(), 1);
        assert_eq!(tokens.tags[0].name, "group");
    }

    #[test]
    fn test_decorators_are_chained() {
        let tokens = tokenize(&block("@api-path:private:deprecated /movies"), "api");
        let tag = &tokens.tags[0];

        assert_eq!(tag.decorators, vec![Decorator::Private, Decorator::Deprecated]);
        assert!(tag.unknown_decorators.is_empty());
        assert_eq!(tag.content, "/movies");
    }

    #[test]
    fn test_unknown_decorator_is_reported() {
        let tokens = tokenize(&block("@api-path:hidden:alias /movie"), "api");
        let tag = &tokens.tags[0];

        assert_eq!(tag.decorators, vec![Decorator::Alias]);
        assert_eq!(tag.unknown_decorators, vec!["hidden".to_string()]);
    }

    #[test]
    fn test_colon_inside_content_is_not_a_decorator() {
        let tokens = tokenize(&block("@api-vendortag tag:BUY_TICKETS"), "api");
        assert!(tokens.tags[0].decorators.is_empty());
        assert_eq!(tokens.tags[0].content, "tag:BUY_TICKETS");
    }

    #[test]
    fn test_continuation_lines_join_the_tag() {
        let tokens = tokenize(
            &block("/// @api-param rating (enum) - Rating\n///   + Members\n///     - `G`\n///     - `PG`"),
            "api",
        );

        assert_eq!(
            tokens.tags[0].content,
            "rating (enum) - Rating\n+ Members\n- `G`\n- `PG`"
        );
    }
}
