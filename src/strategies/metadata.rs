//! Metadata extraction from doc-block tags.

use super::{StageOutput, Strategy, StrategyInput};
use crate::extractor::MetadataPatch;
use anyhow::Result;

/// Derives group, title, description and the authenticated flag from the
/// handler's doc blocks.
///
/// A method-level `@group` overrides the class-level one. The tag's first
/// line is the group name; its remaining lines are normally the group
/// description, but when the method has no short description of its own that
/// text becomes the route title instead and the group description stays
/// empty. The heuristic is awkward, and kept: generated docs must not change
/// shape depending on which implementation produced them.
pub struct MetadataFromDocBlock;

impl Strategy for MetadataFromDocBlock {
    fn name(&self) -> &'static str {
        "metadata.doc_block"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        let mut patch = MetadataPatch::default();

        let group_tag = input
            .method_doc
            .tag("group")
            .or_else(|| input.class_doc.tag("group"));

        let mut title = non_empty(&input.method_doc.short_description);

        if let Some(content) = group_tag {
            let (name, rest) = match content.split_once('\n') {
                Some((name, rest)) => (name.trim(), rest.trim().replace('\n', " ")),
                None => (content.trim(), String::new()),
            };
            patch.group_name = non_empty(name);
            if !rest.is_empty() {
                if title.is_none() {
                    title = Some(rest);
                } else {
                    patch.group_description = Some(rest);
                }
            }
        }

        patch.title = title;
        patch.description = non_empty(&input.method_doc.long_description);
        if input.method_doc.has_tag("authenticated") || input.class_doc.has_tag("authenticated") {
            patch.authenticated = Some(true);
        }

        Ok(Some(StageOutput::Metadata(patch)))
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::DocBlock;
    use crate::config::RuleSet;
    use crate::extractor::ExtractionContext;
    use crate::route::{HandlerMeta, RouteRecord};
    use crate::strategies::test_support::input_for;
    use pretty_assertions::assert_eq;

    fn route() -> RouteRecord {
        RouteRecord {
            methods: vec!["GET".to_string()],
            uri: "api/users".to_string(),
            domain: None,
            name: String::new(),
            versions: Vec::new(),
            handler: HandlerMeta {
                class_name: "UserController".to_string(),
                method_name: "index".to_string(),
                ..HandlerMeta::default()
            },
        }
    }

    fn run(class_raw: &str, method_raw: &str) -> MetadataPatch {
        let route = route();
        let class_doc = DocBlock::parse(Some(class_raw));
        let method_doc = DocBlock::parse(Some(method_raw));
        let rules = RuleSet::default();
        let ctx = ExtractionContext::default();
        let input = input_for(&route, &class_doc, &method_doc, &rules, &ctx);
        match MetadataFromDocBlock.invoke(&input).expect("invoke") {
            Some(StageOutput::Metadata(patch)) => patch,
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_method_group_overrides_class_group() {
        let patch = run(
            "@group Class group",
            "List users.\n\n@group Method group\nGroup text.",
        );
        assert_eq!(patch.group_name.as_deref(), Some("Method group"));
        assert_eq!(patch.group_description.as_deref(), Some("Group text."));
        assert_eq!(patch.title.as_deref(), Some("List users."));
    }

    #[test]
    fn test_group_description_becomes_title_without_short_description() {
        let patch = run("", "@group User management\nOperations on users.");
        assert_eq!(patch.group_name.as_deref(), Some("User management"));
        assert_eq!(patch.title.as_deref(), Some("Operations on users."));
        assert_eq!(patch.group_description, None);
    }

    #[test]
    fn test_authenticated_from_class_or_method() {
        assert_eq!(run("@authenticated", "List users.").authenticated, Some(true));
        assert_eq!(run("", "List users.\n\n@authenticated").authenticated, Some(true));
        assert_eq!(run("", "List users.").authenticated, None);
    }

    #[test]
    fn test_long_description_flows_through() {
        let patch = run("", "List users.\n\nAll users, paginated.");
        assert_eq!(patch.title.as_deref(), Some("List users."));
        assert_eq!(patch.description.as_deref(), Some("All users, paginated."));
    }
}
