//! API Doc Extractor - Structured API documentation from exported route definitions.
//!
//! This library turns a web application's route definitions and handler
//! doc-comment annotations into structured, machine-readable documentation
//! records, then renders them as Markdown and a Postman-style collection. The
//! core is a strategy-based, multi-stage pipeline: for each route, every
//! stage (metadata, URL/query/body parameters, headers, responses) runs an
//! ordered, configurable list of strategies whose partial results merge under
//! defined precedence rules.
//!
//! # Architecture
//!
//! The library is organized into several modules that work together:
//!
//! 1. [`route`] - Route records and pre-resolved handler metadata (input)
//! 2. [`config`] - YAML configuration: rule groups, strategy overrides
//! 3. [`matcher`] - Selects documentable routes per the configured rules
//! 4. [`annotations`] - Parses doc comments into descriptions and tags
//! 5. [`params`] - Parameter grammar, type normalization, clean expansion
//! 6. [`sample`] - Seeded example-value generation
//! 7. [`strategies`] - The pluggable per-stage strategy framework
//! 8. [`extractor`] - Pipeline orchestration and merge rules
//! 9. [`collection`] / [`markdown`] - Renderers for the extracted records
//! 10. [`serializer`] - Serialization and file output
//!
//! # Example Usage
//!
//! ```no_run
//! use apidoc_from_routes::{
//!     config::DocsConfig,
//!     extractor::Extractor,
//!     matcher::RouteMatcher,
//!     route::load_routes,
//!     sample::SampleValueGenerator,
//!     strategies::Collaborators,
//!     adapter::{NullEnvironment, NullModelProvider, NullSerializerRegistry, StaticRuleSource},
//! };
//! use std::cell::RefCell;
//! use std::path::{Path, PathBuf};
//! use std::rc::Rc;
//!
//! let config = DocsConfig::load(Path::new("apidoc.yaml")).unwrap();
//! let routes = load_routes(Path::new("routes.json")).unwrap();
//!
//! let collaborators = Collaborators {
//!     rule_source: Rc::new(StaticRuleSource::default()),
//!     model_provider: Rc::new(NullModelProvider),
//!     serializers: Rc::new(NullSerializerRegistry),
//!     environment: Rc::new(NullEnvironment),
//!     fixtures_dir: PathBuf::from("."),
//!     sampler: Rc::new(RefCell::new(SampleValueGenerator::new(config.faker_seed))),
//! };
//!
//! let groups = config.effective_routes();
//! let extractor = Extractor::new(config, &collaborators, false);
//! extractor.validate(&groups).unwrap();
//!
//! let matched = RouteMatcher::new(groups).match_routes(&routes);
//! let (docs, summary) = extractor.process_all(&matched);
//! println!("Documented {} routes ({} failed)", docs.len(), summary.failed.len());
//! ```
//!
//! # Embedding
//!
//! A host application that wants rule-derived body parameters, serializer
//! responses, or live response calls implements the traits in [`adapter`]
//! and passes its own collaborators instead of the inert defaults.
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod adapter;
pub mod annotations;
pub mod cli;
pub mod collection;
pub mod config;
pub mod error;
pub mod extractor;
pub mod markdown;
pub mod matcher;
pub mod params;
pub mod route;
pub mod sample;
pub mod serializer;
pub mod strategies;
