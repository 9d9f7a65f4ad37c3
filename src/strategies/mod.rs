//! Strategy framework for the extraction pipeline.
//!
//! Each pipeline stage (metadata, url/query/body parameters, headers,
//! responses) runs an ordered list of strategies. A strategy inspects the
//! route, its parsed doc blocks, the applied rule-set and the context built
//! so far, and either contributes a partial result or returns `None` ("no
//! opinion"). Errors raised by a strategy are caught at the pipeline boundary
//! and demoted to `None`, so a broken tag or missing collaborator never takes
//! down a whole route.
//!
//! The registry maps stable names (e.g. `responses.file`) to strategy
//! instances; configuration supplies per-stage name lists that override the
//! built-in defaults, resolved once at startup so typos fail fast.

pub mod metadata;
pub mod parameters;
pub mod response_call;
pub mod responses;

use crate::adapter::{ExecutionEnvironment, RuleSource, SampleModelProvider, SerializerRegistry};
use crate::annotations::DocBlock;
use crate::config::RuleSet;
use crate::error::{Error, Result as StartupResult};
use crate::extractor::{ExtractionContext, MetadataPatch, ResponseSpec};
use crate::params::ParameterSpec;
use crate::route::RouteRecord;
use crate::sample::SampleValueGenerator;
use anyhow::Result;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

/// The six pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Metadata,
    UrlParameters,
    QueryParameters,
    BodyParameters,
    Headers,
    Responses,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Metadata => "metadata",
            Stage::UrlParameters => "url_parameters",
            Stage::QueryParameters => "query_parameters",
            Stage::BodyParameters => "body_parameters",
            Stage::Headers => "headers",
            Stage::Responses => "responses",
        }
    }
}

/// A strategy's contribution to one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Metadata(MetadataPatch),
    Parameters(BTreeMap<String, ParameterSpec>),
    Headers(BTreeMap<String, String>),
    Responses(Vec<ResponseSpec>),
}

/// Everything a strategy may consult for one route.
pub struct StrategyInput<'a> {
    pub route: &'a RouteRecord,
    /// Parsed doc block of the handler class
    pub class_doc: &'a DocBlock,
    /// Parsed doc block of the handler method
    pub method_doc: &'a DocBlock,
    pub rules: &'a RuleSet,
    /// Context accumulated by earlier stages and strategies
    pub context: &'a ExtractionContext,
}

/// A pluggable, ordered contributor to one stage's result.
pub trait Strategy {
    /// Stable registry name, e.g. `body_parameters.doc_block`.
    fn name(&self) -> &'static str;

    /// Contributes a partial result, or `None` for "no opinion".
    ///
    /// Returning an error is equivalent to `None` from the pipeline's point
    /// of view; the error is logged by the caller.
    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>>;
}

/// Shared collaborator handles injected into the built-in strategies.
///
/// Processing is single-threaded and route-by-route, so plain `Rc` handles
/// (and a `RefCell` around the sample generator) are sufficient.
#[derive(Clone)]
pub struct Collaborators {
    pub rule_source: Rc<dyn RuleSource>,
    pub model_provider: Rc<dyn SampleModelProvider>,
    pub serializers: Rc<dyn SerializerRegistry>,
    pub environment: Rc<dyn ExecutionEnvironment>,
    /// Base directory for `@responseFile` fixture paths
    pub fixtures_dir: PathBuf,
    pub sampler: Rc<RefCell<SampleValueGenerator>>,
}

/// Registry of strategy instances, keyed by stable name.
pub struct StrategyRegistry {
    by_name: BTreeMap<&'static str, Rc<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Builds the registry with every built-in strategy registered.
    pub fn builtin(collaborators: &Collaborators) -> Self {
        let strategies: Vec<Rc<dyn Strategy>> = vec![
            Rc::new(metadata::MetadataFromDocBlock),
            Rc::new(parameters::UrlParamsFromDocBlock {
                sampler: collaborators.sampler.clone(),
            }),
            Rc::new(parameters::QueryParamsFromDocBlock {
                sampler: collaborators.sampler.clone(),
            }),
            Rc::new(parameters::BodyParamsFromValidationRules {
                rule_source: collaborators.rule_source.clone(),
                sampler: collaborators.sampler.clone(),
            }),
            Rc::new(parameters::BodyParamsFromDocBlock {
                sampler: collaborators.sampler.clone(),
            }),
            Rc::new(parameters::HeadersFromRuleSet),
            Rc::new(parameters::HeadersFromDocBlock),
            Rc::new(responses::ResponseFromDocBlock),
            Rc::new(responses::ResponseFromFile {
                fixtures_dir: collaborators.fixtures_dir.clone(),
            }),
            Rc::new(responses::ResponseFromTransformer {
                model_provider: collaborators.model_provider.clone(),
                serializers: collaborators.serializers.clone(),
            }),
            Rc::new(responses::ResponseFromApiResource {
                model_provider: collaborators.model_provider.clone(),
                serializers: collaborators.serializers.clone(),
            }),
            Rc::new(response_call::ResponseCallRunner {
                environment: collaborators.environment.clone(),
            }),
        ];

        let by_name = strategies.into_iter().map(|s| (s.name(), s)).collect();
        Self { by_name }
    }

    /// Default strategy order for a stage.
    pub fn default_names(stage: Stage) -> &'static [&'static str] {
        match stage {
            Stage::Metadata => &["metadata.doc_block"],
            Stage::UrlParameters => &["url_parameters.doc_block"],
            Stage::QueryParameters => &["query_parameters.doc_block"],
            Stage::BodyParameters => {
                &["body_parameters.validation_rules", "body_parameters.doc_block"]
            }
            Stage::Headers => &["headers.rule_set", "headers.doc_block"],
            Stage::Responses => &[
                "responses.doc_block",
                "responses.file",
                "responses.transformer",
                "responses.api_resource",
                "responses.call",
            ],
        }
    }

    /// Resolves an ordered name list into strategy instances.
    ///
    /// An unknown name is a configuration error and fails the run before any
    /// route is processed.
    pub fn resolve(
        &self,
        stage: Stage,
        names: Option<&[String]>,
    ) -> StartupResult<Vec<Rc<dyn Strategy>>> {
        match names {
            Some(names) => names
                .iter()
                .map(|name| {
                    self.by_name
                        .get(name.as_str())
                        .cloned()
                        .ok_or_else(|| Error::UnknownStrategy {
                            stage: stage.as_str().to_string(),
                            name: name.clone(),
                        })
                })
                .collect(),
            None => Ok(Self::default_names(stage)
                .iter()
                .filter_map(|name| self.by_name.get(name).cloned())
                .collect()),
        }
    }
}
