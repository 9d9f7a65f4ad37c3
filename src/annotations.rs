//! Documentation-comment parsing.
//!
//! Route handlers carry free-form documentation comments in which extraction
//! strategies look for tags such as `@group`, `@bodyParam` or `@response`.
//! This module turns the raw comment text into a [`DocBlock`]: a short and a
//! long description plus an ordered list of tags. Tags the parser does not
//! recognize are preserved as-is; deciding which tags matter is the job of the
//! individual strategies.

use log::debug;

/// A parsed documentation comment.
///
/// The short description is the first paragraph of the comment body, the long
/// description is every following paragraph up to the first tag. A missing or
/// empty comment parses to an entirely empty block, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    /// First paragraph of the comment body
    pub short_description: String,
    /// Remaining paragraphs before the first tag
    pub long_description: String,
    /// All `@name content` tags, in source order
    pub tags: Vec<Tag>,
}

/// A single `@name content` tag inside a documentation comment.
///
/// Content spans from the tag name to the start of the next tag (or the end
/// of the comment); line breaks inside the content are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name without the leading `@`
    pub name: String,
    /// Free-form tag content, trimmed
    pub content: String,
}

impl DocBlock {
    /// Parses raw documentation-comment text into a `DocBlock`.
    ///
    /// Accepts both bare text and `/** ... */` framed comments with `*`
    /// gutters on each line. Lines beginning with `@tagname` start a tag whose
    /// content runs until the next tag or the end of the comment.
    ///
    /// # Arguments
    ///
    /// * `raw` - The raw comment text, or `None` when the handler has no
    ///   documentation comment
    ///
    /// # Returns
    ///
    /// Returns the parsed block. Empty or missing input yields an empty block.
    pub fn parse(raw: Option<&str>) -> DocBlock {
        let raw = match raw {
            Some(text) if !text.trim().is_empty() => text,
            _ => return DocBlock::default(),
        };

        let lines = strip_comment_framing(raw);
        debug!("Parsing doc block with {} lines", lines.len());

        let mut description_lines: Vec<String> = Vec::new();
        let mut tags: Vec<Tag> = Vec::new();

        for line in lines {
            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix('@') {
                let (name, content) = match rest.split_once(char::is_whitespace) {
                    Some((name, content)) => (name, content.trim()),
                    None => (rest, ""),
                };
                tags.push(Tag {
                    name: name.to_string(),
                    content: content.to_string(),
                });
            } else if let Some(last) = tags.last_mut() {
                // Continuation line of the current tag's content; line
                // structure is kept because @group splits on it
                if !trimmed.is_empty() {
                    if !last.content.is_empty() {
                        last.content.push('\n');
                    }
                    last.content.push_str(trimmed);
                }
            } else {
                description_lines.push(trimmed.to_string());
            }
        }

        let (short, long) = split_description(&description_lines);

        DocBlock {
            short_description: short,
            long_description: long,
            tags,
        }
    }

    /// Returns the content of the first tag with the given name, if any.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .map(|t| t.content.as_str())
    }

    /// Returns the contents of every tag with the given name, in order.
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.tags
            .iter()
            .filter(move |t| t.name.eq_ignore_ascii_case(name))
            .map(|t| t.content.as_str())
    }

    /// Returns true if a tag with the given name is present.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tag(name).is_some()
    }
}

/// Removes `/** */` framing and per-line `*` gutters from a raw comment.
fn strip_comment_framing(raw: &str) -> Vec<String> {
    let body = raw
        .trim()
        .trim_start_matches("/**")
        .trim_start_matches("/*")
        .trim_end_matches("*/");

    body.lines()
        .map(|line| {
            let line = line.trim_start();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()
        })
        .collect()
}

/// Splits description lines into (short, long) at the first blank line.
fn split_description(lines: &[String]) -> (String, String) {
    let trimmed: Vec<&str> = {
        let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
        let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
        lines[start..end].iter().map(String::as_str).collect()
    };

    match trimmed.iter().position(|l| l.is_empty()) {
        Some(split) => {
            let short = trimmed[..split].join(" ");
            let long_lines: Vec<&str> = trimmed[split..]
                .iter()
                .copied()
                .skip_while(|l| l.is_empty())
                .collect();
            (short, long_lines.join(" "))
        }
        None => (trimmed.join(" "), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(DocBlock::parse(None), DocBlock::default());
        assert_eq!(DocBlock::parse(Some("")), DocBlock::default());
        assert_eq!(DocBlock::parse(Some("   \n  ")), DocBlock::default());
    }

    #[test]
    fn test_parse_short_description_only() {
        let block = DocBlock::parse(Some("Display a listing of users."));
        assert_eq!(block.short_description, "Display a listing of users.");
        assert_eq!(block.long_description, "");
        assert!(block.tags.is_empty());
    }

    #[test]
    fn test_parse_framed_comment() {
        let raw = r#"/**
         * Show a user.
         *
         * Returns the full profile for
         * the requested user.
         *
         * @group User management
         * @authenticated
         */"#;
        let block = DocBlock::parse(Some(raw));
        assert_eq!(block.short_description, "Show a user.");
        assert_eq!(
            block.long_description,
            "Returns the full profile for the requested user."
        );
        assert_eq!(block.tags.len(), 2);
        assert_eq!(block.tags[0].name, "group");
        assert_eq!(block.tags[0].content, "User management");
        assert_eq!(block.tags[1].name, "authenticated");
        assert_eq!(block.tags[1].content, "");
    }

    #[test]
    fn test_tag_content_spans_lines() {
        let raw = "Create a user.\n@response 201 {\"id\": 1,\n\"name\": \"jane\"}";
        let block = DocBlock::parse(Some(raw));
        assert_eq!(block.tags.len(), 1);
        assert_eq!(
            block.tags[0].content,
            "201 {\"id\": 1,\n\"name\": \"jane\"}"
        );
    }

    #[test]
    fn test_unknown_tags_preserved() {
        let raw = "@customThing anything at all\n@anotherOne 42";
        let block = DocBlock::parse(Some(raw));
        assert_eq!(block.tags.len(), 2);
        assert_eq!(block.tags[0].name, "customThing");
        assert_eq!(block.tags[1].name, "anotherOne");
        assert_eq!(block.tags[1].content, "42");
    }

    #[test]
    fn test_repeated_tags_kept_in_order() {
        let raw = "@bodyParam name string required The name.\n@bodyParam age integer The age.";
        let block = DocBlock::parse(Some(raw));
        let contents: Vec<&str> = block.tags_named("bodyParam").collect();
        assert_eq!(contents.len(), 2);
        assert!(contents[0].starts_with("name"));
        assert!(contents[1].starts_with("age"));
    }

    #[test]
    fn test_tag_lookup_is_case_insensitive() {
        let block = DocBlock::parse(Some("@responseFile 404 errors/404.json"));
        assert!(block.has_tag("responsefile"));
        assert_eq!(block.tag("responseFile"), Some("404 errors/404.json"));
    }

    #[test]
    fn test_description_without_blank_line_is_all_short() {
        let raw = "First line\nsecond line";
        let block = DocBlock::parse(Some(raw));
        assert_eq!(block.short_description, "First line second line");
        assert_eq!(block.long_description, "");
    }
}
