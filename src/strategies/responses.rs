//! Response strategies that read declarations from the doc block.
//!
//! Tried before the live-call runner: literal `@response` bodies, fixture
//! files via `@responseFile`, and serializer-derived responses via
//! `@transformer` / `@apiResource` tags. Collaborator failures (missing
//! fixture, serializer throwing) propagate as errors and are demoted to "no
//! contribution" at the pipeline boundary.

use super::{StageOutput, Strategy, StrategyInput};
use crate::adapter::{SampleModelProvider, SerializerRegistry};
use crate::extractor::ResponseSpec;
use anyhow::{bail, Context, Result};
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

/// Splits a response tag's content into an optional leading status code and
/// the remainder.
fn split_status(content: &str, default: u16) -> (u16, String) {
    let trimmed = content.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => match first.parse::<u16>() {
            Ok(status) => (status, rest.trim().to_string()),
            Err(_) => (default, trimmed.to_string()),
        },
        None => match trimmed.parse::<u16>() {
            Ok(status) => (status, String::new()),
            Err(_) => (default, trimmed.to_string()),
        },
    }
}

/// Literal `@response [status] <body>` tags.
pub struct ResponseFromDocBlock;

impl Strategy for ResponseFromDocBlock {
    fn name(&self) -> &'static str {
        "responses.doc_block"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        let responses: Vec<ResponseSpec> = input
            .method_doc
            .tags_named("response")
            .map(|content| {
                let (status, body) = split_status(content, 200);
                ResponseSpec {
                    status,
                    content: body,
                }
            })
            .collect();
        if responses.is_empty() {
            return Ok(None);
        }
        Ok(Some(StageOutput::Responses(responses)))
    }
}

/// `@responseFile [status] <path> [{json to merge}]` tags.
///
/// Reads the fixture file relative to the configured fixtures directory and
/// JSON-merges the optional inline object over it, inline keys winning.
pub struct ResponseFromFile {
    pub fixtures_dir: PathBuf,
}

impl Strategy for ResponseFromFile {
    fn name(&self) -> &'static str {
        "responses.file"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        let mut responses = Vec::new();
        for content in input.method_doc.tags_named("responseFile") {
            let (status, rest) = split_status(content, 200);
            let (path_part, merge_part) = match rest.find('{') {
                Some(pos) => (rest[..pos].trim(), Some(rest[pos..].trim())),
                None => (rest.trim(), None),
            };
            if path_part.is_empty() {
                bail!("@responseFile tag is missing a file path");
            }

            let path = self.fixtures_dir.join(path_part);
            debug!("Reading response fixture {}", path.display());
            let file_content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read response file {}", path.display()))?;

            let body = match merge_part {
                Some(inline) => {
                    let mut base: Value = serde_json::from_str(&file_content).with_context(
                        || format!("response file {} is not valid JSON", path.display()),
                    )?;
                    let overlay: Value = serde_json::from_str(inline)
                        .context("inline JSON after the file path is invalid")?;
                    merge_objects(&mut base, overlay);
                    serde_json::to_string(&base)?
                }
                None => file_content.trim().to_string(),
            };

            responses.push(ResponseSpec {
                status,
                content: body,
            });
        }
        if responses.is_empty() {
            return Ok(None);
        }
        Ok(Some(StageOutput::Responses(responses)))
    }
}

/// Overlays top-level keys of `overlay` onto `base`; overlay keys win.
fn merge_objects(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                base_map.insert(key, value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// `@transformer` / `@transformerCollection` (+ `@transformerModel`) tags.
///
/// Obtains a representative model instance from the host and runs it through
/// the named transformer; the serialized JSON becomes a 200 response.
pub struct ResponseFromTransformer {
    pub model_provider: Rc<dyn SampleModelProvider>,
    pub serializers: Rc<dyn SerializerRegistry>,
}

impl Strategy for ResponseFromTransformer {
    fn name(&self) -> &'static str {
        "responses.transformer"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        let (name, collection) = match input.method_doc.tag("transformer") {
            Some(name) => (name, false),
            None => match input.method_doc.tag("transformerCollection") {
                Some(name) => (name, true),
                None => return Ok(None),
            },
        };
        let model_type = input
            .method_doc
            .tag("transformerModel")
            .context("@transformer requires a @transformerModel tag")?;

        let model = self.model_provider.sample(model_type)?;
        let serialized = self.serializers.transform(name, model, collection)?;
        Ok(Some(StageOutput::Responses(vec![ResponseSpec {
            status: 200,
            content: serde_json::to_string(&serialized)?,
        }])))
    }
}

/// `@apiResource` / `@apiResourceCollection` (+ `@apiResourceModel`) tags.
pub struct ResponseFromApiResource {
    pub model_provider: Rc<dyn SampleModelProvider>,
    pub serializers: Rc<dyn SerializerRegistry>,
}

impl Strategy for ResponseFromApiResource {
    fn name(&self) -> &'static str {
        "responses.api_resource"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        let (name, collection) = match input.method_doc.tag("apiResource") {
            Some(name) => (name, false),
            None => match input.method_doc.tag("apiResourceCollection") {
                Some(name) => (name, true),
                None => return Ok(None),
            },
        };
        let model_type = input
            .method_doc
            .tag("apiResourceModel")
            .context("@apiResource requires an @apiResourceModel tag")?;

        let model = self.model_provider.sample(model_type)?;
        let serialized = self.serializers.render_resource(name, model, collection)?;
        Ok(Some(StageOutput::Responses(vec![ResponseSpec {
            status: 200,
            content: serde_json::to_string(&serialized)?,
        }])))
    }
}
