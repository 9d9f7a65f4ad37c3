//! Per-route extraction pipeline.
//!
//! The extractor runs each stage's configured strategy list in order and
//! merges the contributions into an [`ExtractionContext`], then assembles the
//! final [`RouteDoc`] record consumed by the renderers.
//!
//! Merge rules: for metadata, parameters and headers every configured
//! strategy runs, and a later strategy may overwrite a field with a non-empty
//! value but can never blank out a field an earlier strategy populated. For
//! responses the strategies are additive: every contribution is appended, the
//! live-call strategy skips itself once a successful response exists, and
//! entries with empty content are filtered at the end. A strategy that errors
//! contributes nothing; only broken handler wiring fails a route.

use crate::annotations::DocBlock;
use crate::config::{DocsConfig, RouteGroupConfig, RuleSet, StrategyOverrides};
use crate::error::Result;
use crate::matcher::MatchedRoute;
use crate::params::{clean_parameters, ParameterSpec};
use crate::route::RouteRecord;
use crate::strategies::{
    Collaborators, Stage, StageOutput, Strategy, StrategyInput, StrategyRegistry,
};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Map;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Operation metadata for one route.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub group_name: String,
    pub group_description: String,
    pub title: String,
    pub description: String,
    pub authenticated: bool,
}

/// A strategy's partial metadata contribution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataPatch {
    pub group_name: Option<String>,
    pub group_description: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub authenticated: Option<bool>,
}

/// One example response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseSpec {
    pub status: u16,
    pub content: String,
}

/// Mutable accumulator for one route's pipeline run.
///
/// Built incrementally as stages execute; destroyed when the route's
/// `RouteDoc` has been assembled. Never shared across routes.
#[derive(Debug, Default)]
pub struct ExtractionContext {
    pub metadata: Metadata,
    pub url_parameters: BTreeMap<String, ParameterSpec>,
    pub query_parameters: BTreeMap<String, ParameterSpec>,
    pub body_parameters: BTreeMap<String, ParameterSpec>,
    pub headers: BTreeMap<String, String>,
    pub responses: Vec<ResponseSpec>,
}

/// The final structured documentation record for one route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDoc {
    /// Stable hash of URI and method set
    pub id: String,
    pub methods: Vec<String>,
    pub uri: String,
    /// URI with path placeholders substituted
    pub bound_uri: String,
    pub metadata: Metadata,
    pub url_parameters: BTreeMap<String, ParameterSpec>,
    pub query_parameters: BTreeMap<String, ParameterSpec>,
    pub body_parameters: BTreeMap<String, ParameterSpec>,
    pub clean_url_parameters: Map<String, serde_json::Value>,
    pub clean_query_parameters: Map<String, serde_json::Value>,
    pub clean_body_parameters: Map<String, serde_json::Value>,
    pub headers: BTreeMap<String, String>,
    pub responses: Vec<ResponseSpec>,
    #[serde(rename = "showresponse")]
    pub show_response: bool,
}

/// Outcome of a full extraction run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: usize,
    /// Route signature plus the error that failed it
    pub failed: Vec<(String, crate::error::Error)>,
}

/// Orchestrates the per-route pipeline.
pub struct Extractor {
    config: DocsConfig,
    registry: StrategyRegistry,
    /// Parsed doc blocks keyed by route identity; reused when the same route
    /// is matched by several rule groups
    doc_cache: RefCell<HashMap<String, Rc<(DocBlock, DocBlock)>>>,
    verbose: bool,
}

impl Extractor {
    pub fn new(config: DocsConfig, collaborators: &Collaborators, verbose: bool) -> Self {
        Self {
            config,
            registry: StrategyRegistry::builtin(collaborators),
            doc_cache: RefCell::new(HashMap::new()),
            verbose,
        }
    }

    /// Resolves every configured strategy list so typos fail before any route
    /// is processed.
    pub fn validate(&self, groups: &[RouteGroupConfig]) -> Result<()> {
        for stage in ALL_STAGES {
            self.registry
                .resolve(stage, stage_pick(stage)(&self.config.strategies).as_deref())?;
            for group in groups {
                self.resolve_stage(stage, &group.apply)?;
            }
        }
        Ok(())
    }

    /// Processes every matched route, collecting documentation records and a
    /// run summary. Per-route hard errors are recorded, not fatal to the run.
    pub fn process_all(&self, matched: &[MatchedRoute]) -> (Vec<RouteDoc>, RunSummary) {
        let mut docs = Vec::new();
        let mut summary = RunSummary::default();
        for entry in matched {
            match self.process_route(&entry.route, &entry.rules) {
                Ok(doc) => {
                    summary.processed += 1;
                    docs.push(doc);
                }
                Err(e) => {
                    warn!("Skipping route {}: {}", entry.route.signature(), e);
                    summary.failed.push((entry.route.signature(), e));
                }
            }
        }
        info!(
            "Extraction finished: {} processed, {} failed",
            summary.processed,
            summary.failed.len()
        );
        (docs, summary)
    }

    /// Runs the full pipeline for one route under one rule-set.
    pub fn process_route(&self, route: &RouteRecord, rules: &RuleSet) -> Result<RouteDoc> {
        route.verify_handler()?;
        debug!("Processing route {}", route.signature());

        let docs = self.doc_blocks(route);
        let (class_doc, method_doc) = (&docs.0, &docs.1);

        let mut context = ExtractionContext {
            metadata: Metadata {
                group_name: self.config.default_group.clone(),
                ..Metadata::default()
            },
            ..ExtractionContext::default()
        };

        for stage in ALL_STAGES {
            let strategies = self.resolve_stage(stage, rules)?;
            for strategy in strategies {
                let output = {
                    let input = StrategyInput {
                        route,
                        class_doc,
                        method_doc,
                        rules,
                        context: &context,
                    };
                    match strategy.invoke(&input) {
                        Ok(output) => output,
                        Err(e) => {
                            warn!(
                                "Strategy {} contributed nothing for {}: {}",
                                strategy.name(),
                                route.signature(),
                                e
                            );
                            if self.verbose {
                                warn!("{:?}", e);
                            }
                            None
                        }
                    }
                };
                if let Some(output) = output {
                    apply_output(stage, output, &mut context);
                }
            }
        }

        context.responses.retain(|r| !r.content.trim().is_empty());

        Ok(RouteDoc {
            id: route.stable_id(),
            methods: route.display_methods(),
            uri: route.uri.clone(),
            bound_uri: route.bound_uri(&rules.response_calls),
            clean_url_parameters: clean_parameters(&context.url_parameters),
            clean_query_parameters: clean_parameters(&context.query_parameters),
            clean_body_parameters: clean_parameters(&context.body_parameters),
            metadata: context.metadata,
            url_parameters: context.url_parameters,
            query_parameters: context.query_parameters,
            body_parameters: context.body_parameters,
            headers: context.headers,
            show_response: !context.responses.is_empty(),
            responses: context.responses,
        })
    }

    fn resolve_stage(&self, stage: Stage, rules: &RuleSet) -> Result<Vec<Rc<dyn Strategy>>> {
        let names = self.config.stage_override(rules, stage_pick(stage));
        self.registry.resolve(stage, names)
    }

    fn doc_blocks(&self, route: &RouteRecord) -> Rc<(DocBlock, DocBlock)> {
        let key = route.signature();
        if let Some(cached) = self.doc_cache.borrow().get(&key) {
            return cached.clone();
        }
        let parsed = Rc::new((
            DocBlock::parse(route.handler.class_doc.as_deref()),
            DocBlock::parse(route.handler.method_doc.as_deref()),
        ));
        self.doc_cache.borrow_mut().insert(key, parsed.clone());
        parsed
    }
}

const ALL_STAGES: [Stage; 6] = [
    Stage::Metadata,
    Stage::UrlParameters,
    Stage::QueryParameters,
    Stage::BodyParameters,
    Stage::Headers,
    Stage::Responses,
];

fn stage_pick(stage: Stage) -> fn(&StrategyOverrides) -> &Option<Vec<String>> {
    match stage {
        Stage::Metadata => |s| &s.metadata,
        Stage::UrlParameters => |s| &s.url_parameters,
        Stage::QueryParameters => |s| &s.query_parameters,
        Stage::BodyParameters => |s| &s.body_parameters,
        Stage::Headers => |s| &s.headers,
        Stage::Responses => |s| &s.responses,
    }
}

fn apply_output(stage: Stage, output: StageOutput, context: &mut ExtractionContext) {
    match output {
        StageOutput::Metadata(patch) => merge_metadata(&mut context.metadata, patch),
        StageOutput::Parameters(params) => {
            let target = match stage {
                Stage::UrlParameters => &mut context.url_parameters,
                Stage::QueryParameters => &mut context.query_parameters,
                _ => &mut context.body_parameters,
            };
            for (name, spec) in params {
                merge_parameter(target, name, spec);
            }
        }
        StageOutput::Headers(headers) => {
            for (name, value) in headers {
                let keep_existing = value.is_empty()
                    && context.headers.get(&name).is_some_and(|e| !e.is_empty());
                if !keep_existing {
                    context.headers.insert(name, value);
                }
            }
        }
        StageOutput::Responses(responses) => context.responses.extend(responses),
    }
}

/// Field-wise metadata merge: a later empty value never erases an earlier
/// non-empty one; a later non-empty value wins.
fn merge_metadata(metadata: &mut Metadata, patch: MetadataPatch) {
    merge_field(&mut metadata.group_name, patch.group_name);
    merge_field(&mut metadata.group_description, patch.group_description);
    merge_field(&mut metadata.title, patch.title);
    merge_field(&mut metadata.description, patch.description);
    if let Some(true) = patch.authenticated {
        metadata.authenticated = true;
    }
}

fn merge_field(existing: &mut String, new: Option<String>) {
    if let Some(new) = new {
        if !new.trim().is_empty() {
            *existing = new;
        }
    }
}

/// Merges one parameter into a stage's map.
///
/// New entries are inserted as-is. For an existing entry the fields merge
/// non-destructively: an empty description or missing value does not erase an
/// earlier one, `required` only ever tightens, and the grammar's default
/// `string` type is treated as no opinion once a concrete type is known. An
/// explicit `No-example` is an author instruction, not an empty value, and
/// does clear a previously generated example.
fn merge_parameter(
    target: &mut BTreeMap<String, ParameterSpec>,
    name: String,
    new: ParameterSpec,
) {
    match target.get_mut(&name) {
        None => {
            target.insert(name, new);
        }
        Some(existing) => {
            if !new.kind.is_empty() && (new.kind != "string" || existing.kind.is_empty()) {
                existing.kind = new.kind;
            }
            existing.required |= new.required;
            if !new.description.trim().is_empty() {
                existing.description = new.description;
            }
            if new.exclude_example {
                existing.value = None;
                existing.exclude_example = true;
            } else if new.value.is_some() {
                existing.value = new.value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResponseCallRules;
    use crate::route::{HandlerMeta, HandlerParam, RouteRecord};
    use crate::strategies::test_support::inert_collaborators;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn route(method_doc: &str) -> RouteRecord {
        RouteRecord {
            methods: vec!["POST".to_string()],
            uri: "api/users/{id}".to_string(),
            domain: None,
            name: String::new(),
            versions: Vec::new(),
            handler: HandlerMeta {
                class_name: "UserController".to_string(),
                method_name: "update".to_string(),
                method_doc: Some(method_doc.to_string()),
                parameters: vec![HandlerParam {
                    name: "request".to_string(),
                    declared_type: Some("UpdateUserRequest".to_string()),
                }],
                ..HandlerMeta::default()
            },
        }
    }

    fn extractor(config: DocsConfig) -> Extractor {
        let collaborators = inert_collaborators(config.faker_seed);
        Extractor::new(config, &collaborators, false)
    }

    #[test]
    fn test_process_route_assembles_record() {
        let doc = "Update a user.\n\n\
                   @group User management\n\
                   @urlParam id integer required The user id. Example: 7\n\
                   @bodyParam name string required The new name. Example: jane\n\
                   @response 200 {\"id\": 7, \"name\": \"jane\"}";
        let route = route(doc);
        let extractor = extractor(DocsConfig::default());
        let record = extractor
            .process_route(&route, &RuleSet::default())
            .expect("process");

        assert_eq!(record.methods, vec!["POST".to_string()]);
        assert_eq!(record.metadata.group_name, "User management");
        assert_eq!(record.metadata.title, "Update a user.");
        assert_eq!(record.url_parameters["id"].value, Some(json!(7)));
        assert_eq!(
            serde_json::Value::Object(record.clean_body_parameters.clone()),
            json!({"name": "jane"})
        );
        assert_eq!(record.responses.len(), 1);
        assert!(record.show_response);
        // No binding configured, placeholder defaults to 1
        assert_eq!(record.bound_uri, "api/users/1");
    }

    #[test]
    fn test_default_group_applies_without_group_tag() {
        let route = route("Update a user.");
        let config = DocsConfig {
            default_group: "Misc".to_string(),
            ..DocsConfig::default()
        };
        let extractor = extractor(config);
        let record = extractor
            .process_route(&route, &RuleSet::default())
            .expect("process");
        assert_eq!(record.metadata.group_name, "Misc");
        assert!(!record.show_response);
    }

    #[test]
    fn test_broken_handler_is_a_hard_error() {
        let mut broken = route("Anything.");
        broken.handler.method_name = String::new();
        let extractor = extractor(DocsConfig::default());
        let err = extractor
            .process_route(&broken, &RuleSet::default())
            .expect_err("hard error");
        assert!(matches!(err, crate::error::Error::HandlerResolution { .. }));
    }

    #[test]
    fn test_process_all_counts_failures_and_continues() {
        let good = route("Fine.");
        let mut bad = route("Broken.");
        bad.handler.class_name = String::new();
        let matched = vec![
            MatchedRoute {
                route: bad,
                rules: RuleSet::default(),
            },
            MatchedRoute {
                route: good,
                rules: RuleSet::default(),
            },
        ];
        let extractor = extractor(DocsConfig::default());
        let (docs, summary) = extractor.process_all(&matched);
        assert_eq!(docs.len(), 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed.len(), 1);
    }

    #[test]
    fn test_later_empty_does_not_erase_metadata() {
        let mut metadata = Metadata {
            title: "Keep me".to_string(),
            ..Metadata::default()
        };
        merge_metadata(
            &mut metadata,
            MetadataPatch {
                title: Some("  ".to_string()),
                description: Some("New text".to_string()),
                ..MetadataPatch::default()
            },
        );
        assert_eq!(metadata.title, "Keep me");
        assert_eq!(metadata.description, "New text");
    }

    #[test]
    fn test_later_non_empty_overwrites_metadata() {
        let mut metadata = Metadata {
            title: "Old".to_string(),
            ..Metadata::default()
        };
        merge_metadata(
            &mut metadata,
            MetadataPatch {
                title: Some("New".to_string()),
                ..MetadataPatch::default()
            },
        );
        assert_eq!(metadata.title, "New");
    }

    #[test]
    fn test_parameter_merge_preserves_earlier_value() {
        let mut target = BTreeMap::new();
        target.insert(
            "age".to_string(),
            ParameterSpec {
                kind: "integer".to_string(),
                description: "The age.".to_string(),
                value: Some(json!(12)),
                ..ParameterSpec::default()
            },
        );
        merge_parameter(
            &mut target,
            "age".to_string(),
            ParameterSpec {
                kind: "integer".to_string(),
                required: true,
                ..ParameterSpec::default()
            },
        );
        assert_eq!(target["age"].value, Some(json!(12)));
        assert_eq!(target["age"].description, "The age.");
        assert!(target["age"].required);
    }

    #[test]
    fn test_parameter_merge_keeps_concrete_kind_and_required() {
        let mut target = BTreeMap::new();
        target.insert(
            "email".to_string(),
            ParameterSpec {
                kind: "integer".to_string(),
                required: true,
                value: Some(json!(5)),
                ..ParameterSpec::default()
            },
        );
        // A plain tag without the required keyword falls back to the grammar
        // defaults; those must not downgrade an earlier concrete entry
        merge_parameter(
            &mut target,
            "email".to_string(),
            ParameterSpec {
                kind: "string".to_string(),
                required: false,
                description: "The address.".to_string(),
                ..ParameterSpec::default()
            },
        );
        assert_eq!(target["email"].kind, "integer");
        assert!(target["email"].required);
        assert_eq!(target["email"].description, "The address.");

        // An explicit non-default type still wins
        merge_parameter(
            &mut target,
            "email".to_string(),
            ParameterSpec {
                kind: "boolean".to_string(),
                ..ParameterSpec::default()
            },
        );
        assert_eq!(target["email"].kind, "boolean");
    }

    #[test]
    fn test_no_example_clears_generated_value() {
        let mut target = BTreeMap::new();
        target.insert(
            "age".to_string(),
            ParameterSpec {
                kind: "integer".to_string(),
                value: Some(json!(12)),
                ..ParameterSpec::default()
            },
        );
        merge_parameter(
            &mut target,
            "age".to_string(),
            ParameterSpec {
                kind: "integer".to_string(),
                exclude_example: true,
                ..ParameterSpec::default()
            },
        );
        assert_eq!(target["age"].value, None);
        assert!(target["age"].exclude_example);
    }

    #[test]
    fn test_empty_response_content_filtered() {
        let doc = "Ping.\n@response 204\n@response 200 {\"pong\": true}";
        let route = route(doc);
        let extractor = extractor(DocsConfig::default());
        let record = extractor
            .process_route(&route, &RuleSet::default())
            .expect("process");
        assert_eq!(record.responses.len(), 1);
        assert_eq!(record.responses[0].status, 200);
    }

    #[test]
    fn test_validate_rejects_unknown_override() {
        let config = DocsConfig {
            strategies: crate::config::StrategyOverrides {
                responses: Some(vec!["responses.bogus".to_string()]),
                ..crate::config::StrategyOverrides::default()
            },
            ..DocsConfig::default()
        };
        let extractor = extractor(config);
        assert!(extractor.validate(&[]).is_err());
    }

    #[test]
    fn test_bound_uri_uses_bindings() {
        let route = route("Update.");
        let rules = RuleSet {
            response_calls: ResponseCallRules {
                bindings: BTreeMap::from([("{id}".to_string(), "42".to_string())]),
                ..ResponseCallRules::default()
            },
            ..RuleSet::default()
        };
        let extractor = extractor(DocsConfig::default());
        let record = extractor.process_route(&route, &rules).expect("process");
        assert_eq!(record.bound_uri, "api/users/42");
    }
}
