//! Parameter and header strategies.
//!
//! Two families: tag-derived strategies reading `@urlParam` / `@queryParam` /
//! `@bodyParam` / `@header` from the handler's doc block, and the
//! validation-rules strategy that reads the rule declarations attached to a
//! typed request-object parameter. Which family wins is decided purely by the
//! configured stage order, not here.

use super::{StageOutput, Strategy, StrategyInput};
use crate::adapter::RuleSource;
use crate::annotations::DocBlock;
use crate::params::{parse_param_tag, ParameterSpec};
use crate::sample::SampleValueGenerator;
use anyhow::Result;
use log::debug;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Builds a parameter map from every `@<tag_name>` tag in the doc block.
///
/// `None` when the doc block carries no such tag. Parameters without an
/// explicit example get a generated one unless `No-example` forbade it.
fn params_from_tags(
    doc: &DocBlock,
    tag_name: &str,
    sampler: &Rc<RefCell<SampleValueGenerator>>,
) -> Option<BTreeMap<String, ParameterSpec>> {
    let mut params = BTreeMap::new();
    for content in doc.tags_named(tag_name) {
        let tag = match parse_param_tag(content) {
            Some(tag) => tag,
            None => continue,
        };
        let value = if tag.description.exclude_example {
            None
        } else {
            match tag.description.example.clone() {
                Some(example) => Some(example),
                None => Some(sampler.borrow_mut().generate(&tag.kind)),
            }
        };
        params.insert(
            tag.name,
            ParameterSpec {
                kind: tag.kind,
                required: tag.required,
                description: tag.description.description,
                value,
                exclude_example: tag.description.exclude_example,
            },
        );
    }
    if params.is_empty() {
        None
    } else {
        Some(params)
    }
}

/// `@urlParam` tags → URL parameters.
pub struct UrlParamsFromDocBlock {
    pub sampler: Rc<RefCell<SampleValueGenerator>>,
}

impl Strategy for UrlParamsFromDocBlock {
    fn name(&self) -> &'static str {
        "url_parameters.doc_block"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        Ok(params_from_tags(input.method_doc, "urlParam", &self.sampler)
            .map(StageOutput::Parameters))
    }
}

/// `@queryParam` tags → query parameters.
pub struct QueryParamsFromDocBlock {
    pub sampler: Rc<RefCell<SampleValueGenerator>>,
}

impl Strategy for QueryParamsFromDocBlock {
    fn name(&self) -> &'static str {
        "query_parameters.doc_block"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        Ok(params_from_tags(input.method_doc, "queryParam", &self.sampler)
            .map(StageOutput::Parameters))
    }
}

/// `@bodyParam` tags → body parameters.
pub struct BodyParamsFromDocBlock {
    pub sampler: Rc<RefCell<SampleValueGenerator>>,
}

impl Strategy for BodyParamsFromDocBlock {
    fn name(&self) -> &'static str {
        "body_parameters.doc_block"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        Ok(params_from_tags(input.method_doc, "bodyParam", &self.sampler)
            .map(StageOutput::Parameters))
    }
}

/// Body parameters derived from a request object's validation rules.
///
/// Looks through the handler's declared parameters for the first type the
/// rule source knows about, then maps each field's rule list to a type and
/// required flag and samples an example value.
pub struct BodyParamsFromValidationRules {
    pub rule_source: Rc<dyn RuleSource>,
    pub sampler: Rc<RefCell<SampleValueGenerator>>,
}

impl Strategy for BodyParamsFromValidationRules {
    fn name(&self) -> &'static str {
        "body_parameters.validation_rules"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        let rules = input.route.handler.parameters.iter().find_map(|param| {
            let declared = param.declared_type.as_deref()?;
            let rules = self.rule_source.rules_for(declared)?;
            debug!(
                "Using validation rules of '{}' for {}",
                declared,
                input.route.signature()
            );
            Some(rules)
        });

        let rules = match rules {
            Some(rules) => rules,
            None => return Ok(None),
        };

        let mut params = BTreeMap::new();
        for (name, rule_names) in rules {
            params.insert(name, self.spec_from_rules(&rule_names));
        }
        Ok(Some(StageOutput::Parameters(params)))
    }
}

impl BodyParamsFromValidationRules {
    fn spec_from_rules(&self, rule_names: &[String]) -> ParameterSpec {
        let mut kind = "string";
        let mut required = false;
        let mut email = false;

        for rule in rule_names {
            // Rules may carry arguments after a colon, e.g. `date_format:Y-m-d`
            let base = rule.split(':').next().unwrap_or_default();
            match base {
                "required" => required = true,
                "integer" | "int" => kind = "integer",
                "numeric" => kind = "number",
                "string" => kind = "string",
                "boolean" | "bool" => kind = "boolean",
                "array" => kind = "array",
                "object" | "json" => kind = "object",
                "date" | "date_format" => kind = "date",
                "email" => {
                    kind = "string";
                    email = true;
                }
                _ => {}
            }
        }

        let value = if email {
            self.sampler.borrow_mut().generate_email()
        } else {
            self.sampler.borrow_mut().generate(kind)
        };

        ParameterSpec {
            kind: kind.to_string(),
            required,
            value: Some(value),
            ..ParameterSpec::default()
        }
    }
}

/// Static headers declared in the matched rule-set.
pub struct HeadersFromRuleSet;

impl Strategy for HeadersFromRuleSet {
    fn name(&self) -> &'static str {
        "headers.rule_set"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        if input.rules.headers.is_empty() {
            return Ok(None);
        }
        Ok(Some(StageOutput::Headers(input.rules.headers.clone())))
    }
}

/// `@header <name> <value>` tags on the handler class or method.
///
/// Method-level tags override class-level ones for the same header name.
pub struct HeadersFromDocBlock;

impl Strategy for HeadersFromDocBlock {
    fn name(&self) -> &'static str {
        "headers.doc_block"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        let mut headers = BTreeMap::new();
        for doc in [input.class_doc, input.method_doc] {
            for content in doc.tags_named("header") {
                if let Some((name, value)) = content.split_once(char::is_whitespace) {
                    headers.insert(name.to_string(), value.trim().to_string());
                } else if !content.trim().is_empty() {
                    headers.insert(content.trim().to_string(), String::new());
                }
            }
        }
        if headers.is_empty() {
            return Ok(None);
        }
        Ok(Some(StageOutput::Headers(headers)))
    }
}
