//! @ai:module:intent Scan a source file for comment blocks and the declarations they document
//! @ai:module:layer application
//! @ai:module:public_api parse_file, parse_source, ParsedSource, CommentBlock, Declaration, DeclarationKind
//! @ai:module:depends_on language, error
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::language::{detect_language, CommentStyle, Language};
use regex::Regex;
use std::path::Path;

const NOT_METHODS: &[&str] = &["if", "for", "while", "switch", "catch", "return", "match", "new"];

/// Leading keywords of statements whose call expression looks like a method signature
const STATEMENT_KEYWORDS: &[&str] = &["return", "throw", "new", "yield", "await", "else", "case"];

/// @ai:intent Consecutive comment lines with their markers removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    pub lines: Vec<String>,
    pub start_line: usize,
    pub end_line: usize,
}

impl CommentBlock {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Type,
    Method,
}

/// @ai:intent A class-like or method declaration and the comment block directly above it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    pub line: usize,
    pub doc: Option<usize>,
}

/// @ai:intent Parsed source file with extracted comments and declarations
#[derive(Debug)]
pub struct ParsedSource {
    pub comment_blocks: Vec<CommentBlock>,
    pub declarations: Vec<Declaration>,
}

/// @ai:intent Parse a source file
/// @ai:pre path exists, is readable, and has a supported extension
/// @ai:effects fs:read
pub fn parse_file(path: &Path) -> Result<ParsedSource> {
    let language = detect_language(path)
        .ok_or_else(|| Error::Config(format!("unsupported source file {}", path.display())))?;

    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(parse_source(&content, language))
}

/// @ai:intent Extract comment blocks and declarations from source text
/// @ai:post a declaration's doc is the block ending directly above it, skipping attribute lines
/// @ai:effects pure
pub fn parse_source(content: &str, language: Language) -> ParsedSource {
    let style = language.comment_style();
    let declaration = Regex::new(language.declaration_pattern()).expect("Invalid regex");
    let function = Regex::new(language.function_pattern()).expect("Invalid regex");

    let mut blocks: Vec<CommentBlock> = Vec::new();
    let mut declarations = Vec::new();
    let mut current: Option<CommentBlock> = None;
    let mut in_block_comment = false;
    // Index of a closed block that still sits directly above the code being scanned
    let mut pending_doc: Option<usize> = None;

    for (line_idx, line) in content.lines().enumerate() {
        let line_number = line_idx + 1;
        let trimmed = line.trim();

        let comment = if in_block_comment {
            let (text, closed) = block_comment_line(trimmed, &style);
            in_block_comment = !closed;
            Some(text)
        } else {
            match open_block_comment(trimmed, &style) {
                Some((text, closed)) => {
                    in_block_comment = !closed;
                    Some(text)
                }
                None => line_comment(trimmed, &style),
            }
        };

        if let Some(text) = comment {
            let block = current.get_or_insert_with(|| CommentBlock {
                lines: Vec::new(),
                start_line: line_number,
                end_line: line_number,
            });
            block.end_line = line_number;
            if let Some(text) = text {
                block.lines.push(text);
            }
            continue;
        }

        if let Some(block) = current.take() {
            blocks.push(block);
            pending_doc = Some(blocks.len() - 1);
        }

        if trimmed.is_empty() {
            pending_doc = None;
            continue;
        }
        if is_attribute(trimmed, language) {
            continue;
        }

        let doc = pending_doc.take();
        if let Some(name) = first_capture(&declaration, line) {
            declarations.push(Declaration {
                kind: DeclarationKind::Type,
                name,
                line: line_number,
                doc,
            });
        } else if is_statement(trimmed) {
            continue;
        } else if let Some(name) = first_capture(&function, line) {
            if !NOT_METHODS.contains(&name.as_str()) {
                declarations.push(Declaration {
                    kind: DeclarationKind::Method,
                    name,
                    line: line_number,
                    doc,
                });
            }
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }

    ParsedSource {
        comment_blocks: blocks,
        declarations,
    }
}

fn first_capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line).and_then(|c| {
        c.iter()
            .skip(1)
            .flatten()
            .next()
            .map(|m| m.as_str().to_string())
    })
}

/// @ai:example ("return new Response(id);") -> true
/// @ai:example ("public Response get(String id) {") -> false
fn is_statement(line: &str) -> bool {
    let first = line
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .next()
        .unwrap_or_default();
    STATEMENT_KEYWORDS.contains(&first)
}

/// @ai:intent Lines such as `#[derive]` or `@Override` that sit between a comment and its declaration
fn is_attribute(line: &str, language: Language) -> bool {
    match language {
        Language::Rust => line.starts_with("#[") || line.starts_with("#!["),
        _ => line.starts_with('@'),
    }
}

/// @ai:intent Start of a block comment; yields its text (if any) and whether it also closes
/// @ai:example ("/**") -> Some((None, false))
/// @ai:example ("/* note */") -> Some((Some("note"), true))
fn open_block_comment(line: &str, style: &CommentStyle) -> Option<(Option<String>, bool)> {
    let start = style.block_start?;
    let end = style.block_end?;
    let rest = line.strip_prefix(start)?;
    let rest = rest.trim_start_matches('*');

    match rest.strip_suffix(end) {
        Some(inner) if line.len() >= start.len() + end.len() => Some((non_empty(inner), true)),
        _ => Some((non_empty(rest), false)),
    }
}

/// @ai:intent One line inside an open block comment
fn block_comment_line(line: &str, style: &CommentStyle) -> (Option<String>, bool) {
    let (body, closed) = match style.block_end.and_then(|end| line.strip_suffix(end)) {
        Some(body) => (body, true),
        None => (line, false),
    };
    let body = body.trim();
    let body = match style.block_line_prefix {
        Some(prefix) => body.strip_prefix(prefix).unwrap_or(body),
        None => body,
    };

    // keep blank interior lines so paragraphs survive; drop the bare closing line
    if closed && body.trim().is_empty() {
        (None, true)
    } else {
        (Some(body.trim().to_string()), closed)
    }
}

fn line_comment(line: &str, style: &CommentStyle) -> Option<Option<String>> {
    style
        .line
        .iter()
        .find(|prefix| line.starts_with(*prefix))
        .map(|prefix| Some(line[prefix.len()..].trim().to_string()))
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
